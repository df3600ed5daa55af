//! Authenticated publishing.
//!
//! # Design
//! A `Session` starts anonymous and becomes authenticated once `login`
//! stores the service's cookie. The credential lives in the value the caller
//! owns, so independent sessions never share state. Publish calls check the
//! session and validate their parameters before the transport is touched,
//! which means a rejected call neither sends a request nor opens the archive.

use kerbalstuff_core::{
    ApiClient, ApiError, CreateModParams, CreatedMod, Credential, HttpRequest, HttpResponse,
    PublishedVersion, Result, UpdateModParams,
};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::query::logged;
use crate::transport::{Transport, UreqTransport};

pub struct Session<T = UreqTransport> {
    api: ApiClient,
    transport: T,
    credential: Option<Credential>,
}

impl Session<UreqTransport> {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(ApiClient::new(&config.base_url), UreqTransport::new(config))
    }
}

impl<T: Transport> Session<T> {
    pub fn with_transport(api: ApiClient, transport: T) -> Self {
        Self {
            api,
            transport,
            credential: None,
        }
    }

    /// Resume with a cookie obtained earlier.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Log in and keep the returned cookie.
    ///
    /// A failed attempt leaves the current credential, if any, in place.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let request = self.api.build_login(username, password)?;
        let response = self.send(request)?;
        let credential = logged(self.api.parse_login(response))?;
        info!(%username, "logged in");
        self.credential = Some(credential);
        Ok(())
    }

    pub fn logout(&mut self) {
        self.credential = None;
    }

    pub fn create_mod(&self, params: &CreateModParams) -> Result<CreatedMod> {
        let credential = self.require_credential()?;
        let request = self.api.build_create_mod(credential, params)?;
        let response = self.send(request)?;
        let created = logged(self.api.parse_create_mod(response))?;
        info!(id = created.id, name = %created.name, "mod created");
        Ok(created)
    }

    pub fn update_mod(&self, params: &UpdateModParams) -> Result<PublishedVersion> {
        let credential = self.require_credential()?;
        let request = self.api.build_update_mod(credential, params)?;
        let response = self.send(request)?;
        let published = logged(self.api.parse_update_mod(response))?;
        info!(mod_id = params.mod_id, version_id = published.id, "mod updated");
        Ok(published)
    }

    fn require_credential(&self) -> Result<&Credential> {
        self.credential.as_ref().ok_or(ApiError::NotAuthenticated)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = request.method.as_str(), url = %request.path, "sending request");
        self.transport.execute(request)
    }
}
