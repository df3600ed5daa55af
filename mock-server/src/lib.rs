//! Axum stand-in for the KerbalStuff API.
//!
//! Domain failures are reported the way the live service does it: status 200
//! with `{"error": true, "reason": "..."}`.

pub mod store;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

use crate::store::{ModRecord, NewMod, NewVersion, Store};

pub type Db = Arc<RwLock<Store>>;

/// Page size of the fixed listings.
pub const LISTING_PAGE_SIZE: usize = 30;

pub fn app() -> Router {
    app_with(Store::seeded())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/api/search/mod", get(search_mods))
        .route("/api/search/user", get(search_users))
        .route("/api/mod/create", post(create_mod))
        .route("/api/mod/{id}", get(get_mod))
        .route("/api/mod/{id}/latest", get(latest_version))
        .route("/api/mod/{id}/update", post(update_mod))
        .route("/api/user/{username}", get(get_user))
        .route("/api/browse", get(browse))
        .route("/api/browse/new", get(browse_new))
        .route("/api/browse/featured", get(browse_featured))
        .route("/api/browse/top", get(browse_top))
        .route("/api/login", post(login))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(reason: &str) -> Json<Value> {
    Json(json!({ "error": true, "reason": reason }))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

#[derive(Deserialize)]
pub struct BrowseQuery {
    pub page: Option<usize>,
    pub orderby: Option<String>,
    pub order: Option<String>,
    pub count: Option<usize>,
}

async fn search_mods(State(db): State<Db>, Query(q): Query<SearchQuery>) -> Json<Value> {
    let needle = q.query.to_lowercase();
    let store = db.read().await;
    let hits: Vec<Value> = store
        .mods
        .iter()
        .filter(|m| {
            m.name.to_lowercase().contains(&needle) || m.short_description.to_lowercase().contains(&needle)
        })
        .map(ModRecord::to_json)
        .collect();
    Json(Value::Array(hits))
}

async fn search_users(State(db): State<Db>, Query(q): Query<SearchQuery>) -> Json<Value> {
    let needle = q.query.to_lowercase();
    let store = db.read().await;
    let hits: Vec<Value> = store
        .accounts
        .iter()
        .filter(|a| a.username.to_lowercase().contains(&needle))
        .map(|a| store.user_json(a))
        .collect();
    Json(Value::Array(hits))
}

async fn get_mod(State(db): State<Db>, Path(id): Path<u64>) -> Json<Value> {
    match db.read().await.find_mod(id) {
        Some(m) => Json(m.to_json()),
        None => error("Mod not found."),
    }
}

async fn latest_version(State(db): State<Db>, Path(id): Path<u64>) -> Json<Value> {
    let store = db.read().await;
    let Some(m) = store.find_mod(id) else {
        return error("Mod not found.");
    };
    match m.versions.first() {
        Some(version) => Json(m.version_json(version)),
        None => error("This mod has no published versions."),
    }
}

async fn get_user(State(db): State<Db>, Path(username): Path<String>) -> Json<Value> {
    let store = db.read().await;
    match store.find_account(&username) {
        Some(account) => Json(store.user_json(account)),
        None => error("User not found."),
    }
}

async fn browse(State(db): State<Db>, Query(q): Query<BrowseQuery>) -> Json<Value> {
    let count = q.count.unwrap_or(LISTING_PAGE_SIZE);
    if count == 0 || count >= 500 {
        return error("Count must be between 1 and 499.");
    }
    let page = q.page.unwrap_or(1);
    if page == 0 {
        return error("Page must be at least 1.");
    }

    let store = db.read().await;
    let mut mods: Vec<&ModRecord> = store.mods.iter().collect();
    match q.orderby.as_deref().unwrap_or("created") {
        "name" => mods.sort_by_key(|m| m.name.to_lowercase()),
        "updated" => mods.sort_by_key(|m| m.updated),
        "created" => mods.sort_by_key(|m| m.created),
        _ => return error("Invalid orderby value."),
    }
    match q.order.as_deref().unwrap_or("asc") {
        "asc" => {}
        "desc" => mods.reverse(),
        _ => return error("Invalid order value."),
    }

    let total = mods.len();
    let pages = total.div_ceil(count).max(1);
    let result: Vec<Value> = mods
        .into_iter()
        .skip((page - 1) * count)
        .take(count)
        .map(ModRecord::to_json)
        .collect();
    Json(json!({
        "total": total,
        "count": count,
        "pages": pages,
        "page": page,
        "result": result,
    }))
}

fn listing(mods: Vec<&ModRecord>, page: Option<usize>) -> Json<Value> {
    let page = page.unwrap_or(1);
    if page == 0 {
        return error("Page must be at least 1.");
    }
    let items: Vec<Value> = mods
        .into_iter()
        .skip((page - 1) * LISTING_PAGE_SIZE)
        .take(LISTING_PAGE_SIZE)
        .map(ModRecord::to_json)
        .collect();
    Json(Value::Array(items))
}

async fn browse_new(State(db): State<Db>, Query(q): Query<PageQuery>) -> Json<Value> {
    let store = db.read().await;
    let mut mods: Vec<&ModRecord> = store.mods.iter().collect();
    mods.sort_by(|a, b| b.created.cmp(&a.created));
    listing(mods, q.page)
}

async fn browse_featured(State(db): State<Db>, Query(q): Query<PageQuery>) -> Json<Value> {
    let store = db.read().await;
    let mods: Vec<&ModRecord> = store.mods.iter().filter(|m| m.featured).collect();
    listing(mods, q.page)
}

async fn browse_top(State(db): State<Db>, Query(q): Query<PageQuery>) -> Json<Value> {
    let store = db.read().await;
    let mut mods: Vec<&ModRecord> = store.mods.iter().collect();
    mods.sort_by(|a, b| b.downloads.cmp(&a.downloads));
    listing(mods, q.page)
}

/// Text fields of a multipart request plus the size of its `zipball` part.
#[derive(Default)]
struct Form {
    fields: HashMap<String, String>,
    zipball: Option<usize>,
}

impl Form {
    fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|v| !v.trim().is_empty())
    }
}

async fn read_form(mut multipart: Multipart) -> Result<Form, String> {
    let mut form = Form::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let name = field.name().unwrap_or_default().to_string();
        if field.file_name().is_some() {
            let bytes = field.bytes().await.map_err(|e| e.to_string())?;
            if name == "zipball" && !bytes.is_empty() {
                form.zipball = Some(bytes.len());
            }
        } else {
            let value = field.text().await.map_err(|e| e.to_string())?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("session="))
        .map(str::to_string)
}

async fn login(State(db): State<Db>, multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(e) => return error(&e).into_response(),
    };
    let (Some(username), Some(password)) = (form.text("username"), form.text("password")) else {
        return error("Username and password are required.").into_response();
    };
    match db.write().await.login(username, password) {
        Some(token) => {
            info!(%username, "login");
            (
                [(header::SET_COOKIE, format!("session={token}; Path=/; HttpOnly"))],
                Json(json!({ "error": false })),
            )
                .into_response()
        }
        None => error("Username or password is incorrect").into_response(),
    }
}

async fn create_mod(State(db): State<Db>, headers: HeaderMap, multipart: Multipart) -> Json<Value> {
    let mut store = db.write().await;
    let Some(author) = session_token(&headers)
        .and_then(|token| store.session_user(&token).map(str::to_string))
    else {
        return error("You must be logged in to do that.");
    };
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(e) => return error(&e),
    };
    let fields = (
        form.text("name"),
        form.text("short-description"),
        form.text("version"),
        form.text("ksp-version"),
        form.text("license"),
        form.zipball,
    );
    let (Some(name), Some(short_description), Some(version), Some(ksp_version), Some(license), Some(zipball)) =
        fields
    else {
        return error("All fields are required.");
    };
    if store.mods.iter().any(|m| m.name.eq_ignore_ascii_case(name)) {
        return error("A mod by this name already exists.");
    }
    let id = store.create_mod(
        &author,
        NewMod {
            name: name.to_string(),
            short_description: short_description.to_string(),
            license: license.to_string(),
            version: version.to_string(),
            ksp_version: ksp_version.to_string(),
        },
    );
    let Some(created) = store.find_mod(id) else {
        return error("Mod not found.");
    };
    info!(id, %author, zipball, "mod created");
    Json(json!({ "id": id, "name": created.name, "url": created.url() }))
}

async fn update_mod(
    State(db): State<Db>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Json<Value> {
    let mut store = db.write().await;
    let Some(user) = session_token(&headers)
        .and_then(|token| store.session_user(&token).map(str::to_string))
    else {
        return error("You must be logged in to do that.");
    };
    match store.find_mod(id) {
        None => return error("Mod not found."),
        Some(m) if m.author != user => return error("You do not have permission to edit this mod."),
        Some(_) => {}
    }
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(e) => return error(&e),
    };
    let (Some(version), Some(changelog), Some(ksp_version), Some(notify), Some(zipball)) = (
        form.text("version"),
        form.text("changelog"),
        form.text("ksp-version"),
        form.text("notify-followers"),
        form.zipball,
    ) else {
        return error("All fields are required.");
    };
    let added = store.add_version(
        id,
        NewVersion {
            version: version.to_string(),
            changelog: changelog.to_string(),
            ksp_version: ksp_version.to_string(),
        },
    );
    match added {
        Ok((version_id, url)) => {
            info!(id, version_id, zipball, notify_followers = notify == "yes", "mod updated");
            Json(json!({ "id": version_id, "url": url }))
        }
        Err(reason) => error(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_reads_cookie_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "theme=dark; session=abc-123".parse().unwrap());
        assert_eq!(session_token(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn session_token_absent() {
        assert!(session_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn listing_pages_are_thirty_long() {
        let store = Store::seeded();
        let mods: Vec<&ModRecord> = store.mods.iter().collect();
        let Json(first) = listing(mods.clone(), None);
        assert_eq!(first.as_array().unwrap().len(), 3);
        let Json(second) = listing(mods, Some(2));
        assert!(second.as_array().unwrap().is_empty());
    }

    #[test]
    fn form_ignores_blank_text() {
        let mut form = Form::default();
        form.fields.insert("name".to_string(), "  ".to_string());
        assert!(form.text("name").is_none());
    }
}
