//! Anonymous search, browse and lookup operations.

use kerbalstuff_core::{
    ApiClient, ApiError, BrowseParams, HttpRequest, HttpResponse, Mod, ModVersion, Result, User,
};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::session::Session;
use crate::transport::{Transport, UreqTransport};

/// Blocking client for the read-only half of the API.
///
/// Every call issues exactly one request; nothing is cached between calls.
pub struct KerbalStuff<T = UreqTransport> {
    api: ApiClient,
    transport: T,
    config: ClientConfig,
}

impl KerbalStuff<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(&config);
        Self::with_transport(config, transport)
    }

    /// Client configured from `KERBALSTUFF_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ClientConfig::from_env()?))
    }
}

impl Default for KerbalStuff<UreqTransport> {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl<T: Transport> KerbalStuff<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            api: ApiClient::new(&config.base_url),
            transport,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A fresh, anonymous session sharing this client's transport.
    pub fn session(&self) -> Session<&T> {
        Session::with_transport(self.api.clone(), &self.transport)
    }

    pub fn search_mods(&self, query: &str) -> Result<Vec<Mod>> {
        let response = self.send(self.api.build_search_mods(query))?;
        logged(self.api.parse_search_mods(response))
    }

    pub fn search_users(&self, query: &str) -> Result<Vec<User>> {
        let response = self.send(self.api.build_search_users(query))?;
        logged(self.api.parse_search_users(response))
    }

    pub fn get_mod(&self, id: u64) -> Result<Mod> {
        let response = self.send(self.api.build_get_mod(id)?)?;
        logged(self.api.parse_get_mod(response))
    }

    pub fn get_user(&self, username: &str) -> Result<User> {
        let response = self.send(self.api.build_get_user(username)?)?;
        logged(self.api.parse_get_user(response))
    }

    pub fn get_latest_mod_version(&self, id: u64) -> Result<ModVersion> {
        let response = self.send(self.api.build_get_latest_mod_version(id)?)?;
        logged(self.api.parse_get_latest_mod_version(response))
    }

    pub fn browse(&self, params: &BrowseParams) -> Result<Vec<Mod>> {
        let response = self.send(self.api.build_browse(params)?)?;
        logged(self.api.parse_browse(response))
    }

    /// Newest mods.
    pub fn browse_recent(&self, page: Option<u32>) -> Result<Vec<Mod>> {
        let response = self.send(self.api.build_browse_recent(page)?)?;
        logged(self.api.parse_browse(response))
    }

    pub fn browse_featured(&self, page: Option<u32>) -> Result<Vec<Mod>> {
        let response = self.send(self.api.build_browse_featured(page)?)?;
        logged(self.api.parse_browse(response))
    }

    /// Most popular mods.
    pub fn browse_top(&self, page: Option<u32>) -> Result<Vec<Mod>> {
        let response = self.send(self.api.build_browse_top(page)?)?;
        logged(self.api.parse_browse(response))
    }

    /// Absolute URL of a mod's background image, using the configured CDN.
    pub fn background_url(&self, m: &Mod) -> Option<String> {
        m.background_url(&self.config.cdn_url)
    }

    /// Absolute download URL of a version on the configured site.
    pub fn download_url(&self, version: &ModVersion) -> String {
        version.download_url(self.api.base_url())
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = request.method.as_str(), url = %request.path, "sending request");
        self.transport.execute(request)
    }
}

pub(crate) fn logged<V>(result: Result<V>) -> Result<V> {
    if let Err(ApiError::Domain { reason }) = &result {
        warn!(%reason, "service reported an error");
    }
    result
}
