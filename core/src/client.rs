//! Stateless HTTP request builder and response parser for the KerbalStuff API.
//!
//! # Design
//! `ApiClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that validates its
//! arguments and produces an `HttpRequest`, and a `parse_*` method that
//! consumes an `HttpResponse`. The caller executes the actual HTTP round-trip.
//! Authenticated builders take a `&Credential`, so a request that needs a
//! session cannot be built without one.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::multipart::{MultipartForm, ZIP_CONTENT_TYPE};
use crate::normalize::normalize;
use crate::params::{validate_id, validate_page, BrowseParams, CreateModParams, UpdateModParams};
use crate::types::{join_url, CreatedMod, Credential, Mod, ModList, ModVersion, PublishedVersion, User};

/// Public site the library talks to unless told otherwise.
pub const DEFAULT_BASE_URL: &str = "https://kerbalstuff.com";

/// Synchronous, stateless client for the KerbalStuff API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    pub fn build_search_mods(&self, query: &str) -> HttpRequest {
        HttpRequest::get(self.api(&format!("search/mod?query={}", encode_query(query))))
    }

    pub fn build_search_users(&self, query: &str) -> HttpRequest {
        HttpRequest::get(self.api(&format!("search/user?query={}", encode_query(query))))
    }

    pub fn build_get_mod(&self, id: u64) -> Result<HttpRequest, ApiError> {
        validate_id(id)?;
        Ok(HttpRequest::get(self.api(&format!("mod/{id}"))))
    }

    pub fn build_get_user(&self, username: &str) -> Result<HttpRequest, ApiError> {
        if username.is_empty() {
            return Err(ApiError::invalid("username cannot be empty"));
        }
        Ok(HttpRequest::get(self.api(&format!("user/{}", encode_segment(username)))))
    }

    pub fn build_get_latest_mod_version(&self, id: u64) -> Result<HttpRequest, ApiError> {
        validate_id(id)?;
        Ok(HttpRequest::get(self.api(&format!("mod/{id}/latest"))))
    }

    pub fn build_browse(&self, params: &BrowseParams) -> Result<HttpRequest, ApiError> {
        let (order_by, order, count) = params.validate()?;
        let page = params.page.map(|p| format!("page={p}&")).unwrap_or_default();
        Ok(HttpRequest::get(self.api(&format!(
            "browse?{page}orderby={order_by}&order={order}&count={count}"
        ))))
    }

    pub fn build_browse_recent(&self, page: Option<u32>) -> Result<HttpRequest, ApiError> {
        self.build_browse_listing("new", page)
    }

    pub fn build_browse_featured(&self, page: Option<u32>) -> Result<HttpRequest, ApiError> {
        self.build_browse_listing("featured", page)
    }

    pub fn build_browse_top(&self, page: Option<u32>) -> Result<HttpRequest, ApiError> {
        self.build_browse_listing("top", page)
    }

    fn build_browse_listing(&self, listing: &str, page: Option<u32>) -> Result<HttpRequest, ApiError> {
        validate_page(page)?;
        let path = match page {
            Some(page) => format!("browse/{listing}?page={page}"),
            None => format!("browse/{listing}"),
        };
        Ok(HttpRequest::get(self.api(&path)))
    }

    pub fn build_login(&self, username: &str, password: &str) -> Result<HttpRequest, ApiError> {
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::invalid("username and password are required"));
        }
        let form = MultipartForm::new()
            .text("username", username)
            .text("password", password);
        Ok(HttpRequest::post(self.api("login"), form))
    }

    pub fn build_create_mod(
        &self,
        credential: &Credential,
        params: &CreateModParams,
    ) -> Result<HttpRequest, ApiError> {
        params.validate()?;
        let form = MultipartForm::new()
            .text("name", &params.name)
            .text("short-description", &params.short_description)
            .text("version", &params.version)
            .text("ksp-version", &params.ksp_version)
            .text("license", &params.license)
            .file("zipball", &params.zip_path, ZIP_CONTENT_TYPE);
        Ok(HttpRequest::post(self.api("mod/create"), form).with_header("Cookie", credential.as_str()))
    }

    pub fn build_update_mod(
        &self,
        credential: &Credential,
        params: &UpdateModParams,
    ) -> Result<HttpRequest, ApiError> {
        let notify = params.validate()?;
        let form = MultipartForm::new()
            .text("version", &params.version)
            .text("changelog", &params.changelog)
            .text("ksp-version", &params.ksp_version)
            .text("notify-followers", if notify { "yes" } else { "no" })
            .file("zipball", &params.zip_path, ZIP_CONTENT_TYPE);
        Ok(
            HttpRequest::post(self.api(&format!("mod/{}/update", params.mod_id)), form)
                .with_header("Cookie", credential.as_str()),
        )
    }

    pub fn parse_search_mods(&self, response: HttpResponse) -> Result<Vec<Mod>, ApiError> {
        decode(&response)
    }

    pub fn parse_search_users(&self, response: HttpResponse) -> Result<Vec<User>, ApiError> {
        decode(&response)
    }

    pub fn parse_get_mod(&self, response: HttpResponse) -> Result<Mod, ApiError> {
        decode(&response)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        decode(&response)
    }

    pub fn parse_get_latest_mod_version(&self, response: HttpResponse) -> Result<ModVersion, ApiError> {
        decode(&response)
    }

    /// Parse any browse listing, accepting both the bare-array and the
    /// `{"result": [...]}` shapes.
    pub fn parse_browse(&self, response: HttpResponse) -> Result<Vec<Mod>, ApiError> {
        decode::<ModList>(&response).map(ModList::into_vec)
    }

    /// Extract the session cookie from a login response.
    ///
    /// Attributes such as `Path` or `HttpOnly` are dropped; multiple cookies
    /// are joined into a single `Cookie` header value.
    pub fn parse_login(&self, response: HttpResponse) -> Result<Credential, ApiError> {
        decode::<Value>(&response)?;
        let cookie = response
            .header_values("set-cookie")
            .filter_map(|value| value.split(';').next())
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        if cookie.is_empty() {
            return Err(ApiError::MissingCookie);
        }
        Ok(Credential::new(cookie))
    }

    pub fn parse_create_mod(&self, response: HttpResponse) -> Result<CreatedMod, ApiError> {
        #[derive(Deserialize)]
        struct Reply {
            id: u64,
            name: String,
            url: String,
        }

        let reply: Reply = decode(&response)?;
        Ok(CreatedMod {
            id: reply.id,
            name: reply.name,
            url: join_url(&self.base_url, &reply.url),
        })
    }

    pub fn parse_update_mod(&self, response: HttpResponse) -> Result<PublishedVersion, ApiError> {
        #[derive(Deserialize)]
        struct Reply {
            id: u64,
            url: String,
        }

        let reply: Reply = decode(&response)?;
        Ok(PublishedVersion {
            id: reply.id,
            url: join_url(&self.base_url, &reply.url),
        })
    }
}

/// JSON-decode, normalize the error envelope, then map onto `T`.
///
/// A non-2xx response still goes through the normalizer first so an error
/// envelope keeps its reason; anything else becomes `HttpError`.
fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    let value: Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(_) if !response.is_success() => return Err(http_error(response)),
        Err(e) => {
            debug!(status = response.status, error = %e, "response body is not JSON");
            return Err(ApiError::Deserialization(e.to_string()));
        }
    };
    let value = normalize(value)?;
    if !response.is_success() {
        return Err(http_error(response));
    }
    serde_json::from_value(value).map_err(|e| {
        debug!(error = %e, "response JSON does not match the expected record");
        ApiError::Deserialization(e.to_string())
    })
}

fn http_error(response: &HttpResponse) -> ApiError {
    ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    }
}

fn encode_query(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn encode_segment(value: &str) -> String {
    encode_query(value).replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::http::HttpMethod;
    use crate::params::{OrderBy, SortOrder};

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:3000")
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn credential() -> Credential {
        Credential::new("session=abc")
    }

    #[test]
    fn build_search_mods_encodes_query() {
        let req = client().build_search_mods("mech jeb&co");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/api/search/mod?query=mech+jeb%26co");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_search_users_produces_correct_request() {
        let req = client().build_search_users("jeb");
        assert_eq!(req.path, "http://localhost:3000/api/search/user?query=jeb");
    }

    #[test]
    fn build_get_mod_rejects_zero() {
        assert!(matches!(client().build_get_mod(0), Err(ApiError::InvalidArgument(_))));
        let req = client().build_get_mod(12).unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/mod/12");
    }

    #[test]
    fn build_get_user_rejects_empty_and_encodes_segment() {
        assert!(matches!(client().build_get_user(""), Err(ApiError::InvalidArgument(_))));
        let req = client().build_get_user("Bill Kerman").unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/user/Bill%20Kerman");
    }

    #[test]
    fn build_get_latest_mod_version_produces_correct_request() {
        let req = client().build_get_latest_mod_version(12).unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/mod/12/latest");
        assert!(client().build_get_latest_mod_version(0).is_err());
    }

    #[test]
    fn build_browse_with_and_without_page() {
        let params = BrowseParams::new(OrderBy::Updated, SortOrder::Desc, 30);
        let req = client().build_browse(&params).unwrap();
        assert_eq!(
            req.path,
            "http://localhost:3000/api/browse?orderby=updated&order=desc&count=30"
        );
        let req = client().build_browse(&params.page(2)).unwrap();
        assert_eq!(
            req.path,
            "http://localhost:3000/api/browse?page=2&orderby=updated&order=desc&count=30"
        );
    }

    #[test]
    fn build_browse_listings() {
        let c = client();
        assert_eq!(c.build_browse_recent(None).unwrap().path, "http://localhost:3000/api/browse/new");
        assert_eq!(
            c.build_browse_featured(Some(3)).unwrap().path,
            "http://localhost:3000/api/browse/featured?page=3"
        );
        assert_eq!(c.build_browse_top(Some(1)).unwrap().path, "http://localhost:3000/api/browse/top?page=1");
        assert!(matches!(c.build_browse_top(Some(0)), Err(ApiError::InvalidArgument(_))));
    }

    #[test]
    fn build_login_is_multipart_post() {
        let req = client().build_login("jeb", "hunter2").unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/api/login");
        let form = req.body.unwrap();
        assert_eq!(form.field("username"), Some("jeb"));
        assert_eq!(form.field("password"), Some("hunter2"));
        assert!(form.file.is_none());
    }

    #[test]
    fn build_create_mod_attaches_cookie_and_zipball() {
        let params = CreateModParams {
            name: "MechJeb".to_string(),
            short_description: "Autopilot".to_string(),
            version: "1.0".to_string(),
            ksp_version: "1.0.2".to_string(),
            license: "GPLv3".to_string(),
            zip_path: PathBuf::from("/tmp/MechJeb.zip"),
        };
        let req = client().build_create_mod(&credential(), &params).unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/mod/create");
        assert_eq!(req.header("cookie"), Some("session=abc"));
        let form = req.body.unwrap();
        assert_eq!(form.field("short-description"), Some("Autopilot"));
        assert_eq!(form.field("ksp-version"), Some("1.0.2"));
        let file = form.file.unwrap();
        assert_eq!(file.name, "zipball");
        assert_eq!(file.content_type, "application/zip");
        assert_eq!(file.path, PathBuf::from("/tmp/MechJeb.zip"));
    }

    #[test]
    fn build_update_mod_encodes_notify_flag() {
        let params = UpdateModParams {
            mod_id: 12,
            version: "1.1".to_string(),
            changelog: "* fixes".to_string(),
            ksp_version: "1.0.2".to_string(),
            notify_followers: Some(false),
            zip_path: PathBuf::from("MechJeb.zip"),
        };
        let req = client().build_update_mod(&credential(), &params).unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/mod/12/update");
        let form = req.body.unwrap();
        assert_eq!(form.field("notify-followers"), Some("no"));
        assert_eq!(form.field("changelog"), Some("* fixes"));
    }

    #[test]
    fn parse_search_mods_empty_is_ok() {
        let mods = client().parse_search_mods(ok("[]")).unwrap();
        assert!(mods.is_empty());
    }

    #[test]
    fn parse_get_mod_domain_error() {
        let err = client()
            .parse_get_mod(ok(r#"{"error":true,"reason":"Mod not found."}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Domain { ref reason } if reason == "Mod not found."));
    }

    #[test]
    fn parse_get_mod_bad_json() {
        let err = client().parse_get_mod(ok("not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_non_json_server_error() {
        let response = HttpResponse {
            status: 502,
            headers: Vec::new(),
            body: "bad gateway".to_string(),
        };
        let err = client().parse_browse(response).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 502, .. }));
    }

    #[test]
    fn parse_error_envelope_on_error_status_keeps_reason() {
        let response = HttpResponse {
            status: 404,
            headers: Vec::new(),
            body: r#"{"error":true,"reason":"User not found."}"#.to_string(),
        };
        let err = client().parse_get_user(response).unwrap_err();
        assert!(matches!(err, ApiError::Domain { ref reason } if reason == "User not found."));
    }

    #[test]
    fn parse_login_collects_cookie_pairs() {
        let response = HttpResponse {
            status: 200,
            headers: vec![
                ("Set-Cookie".to_string(), "session=abc; Path=/; HttpOnly".to_string()),
                ("set-cookie".to_string(), "remember=1; Max-Age=3600".to_string()),
            ],
            body: r#"{"error":false}"#.to_string(),
        };
        let credential = client().parse_login(response).unwrap();
        assert_eq!(credential.as_str(), "session=abc; remember=1");
    }

    #[test]
    fn parse_login_failure_and_missing_cookie() {
        let err = client()
            .parse_login(ok(r#"{"error":true,"reason":"Username or password is incorrect"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Domain { .. }));
        let err = client().parse_login(ok(r#"{"error":false}"#)).unwrap_err();
        assert!(matches!(err, ApiError::MissingCookie));
    }

    #[test]
    fn parse_create_mod_makes_url_canonical() {
        let created = client()
            .parse_create_mod(ok(r#"{"id":40,"name":"MechJeb","url":"/mod/40/MechJeb"}"#))
            .unwrap();
        assert_eq!(created.id, 40);
        assert_eq!(created.name, "MechJeb");
        assert_eq!(created.url, "http://localhost:3000/mod/40/MechJeb");
    }

    #[test]
    fn parse_update_mod_success() {
        let published = client()
            .parse_update_mod(ok(r#"{"id":81,"url":"/mod/40/MechJeb"}"#))
            .unwrap();
        assert_eq!(published.id, 81);
        assert_eq!(published.url, "http://localhost:3000/mod/40/MechJeb");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = ApiClient::new("http://localhost:3000/");
        let req = client.build_search_mods("x");
        assert_eq!(req.path, "http://localhost:3000/api/search/mod?query=x");
    }
}
