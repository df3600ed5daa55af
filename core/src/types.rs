//! Domain records for the KerbalStuff API.
//!
//! # Design
//! Field names follow Rust conventions and are mapped onto the wire names with
//! `#[serde(rename)]`. Required fields are plain types so a payload missing
//! them fails to decode; free-form text and links are `Option`. `Mod::versions`
//! stays an `Option` because "key absent" and "empty list" mean different
//! things to the service.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// One published revision of a mod.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModVersion {
    #[serde(rename = "friendly_version")]
    pub version: String,
    /// Site-relative path; see [`ModVersion::download_url`].
    pub download_path: String,
    pub id: u64,
    pub ksp_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub changelog: String,
}

impl ModVersion {
    pub fn download_url(&self, site_base: &str) -> String {
        join_url(site_base, &self.download_path)
    }
}

/// A mod hosted by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mod {
    pub id: u64,
    pub name: String,
    /// CDN-relative image path; see [`Mod::background_url`].
    pub background: Option<String>,
    pub license: Option<String>,
    pub website: Option<String>,
    #[serde(rename = "donations")]
    pub donations_link: Option<String>,
    #[serde(rename = "source_code")]
    pub source_code_link: Option<String>,
    pub author: String,
    #[serde(rename = "downloads")]
    pub download_count: u64,
    pub short_description: String,
    pub description_html: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "followers")]
    pub follower_count: u64,
    pub default_version_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<Vec<ModVersion>>,
}

impl Mod {
    /// Absolute URL of the background image, if the mod has one.
    pub fn background_url(&self, cdn_base: &str) -> Option<String> {
        self.background
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| join_url(cdn_base, path))
    }

    /// The version the service marks as default, when versions were included.
    pub fn default_version(&self) -> Option<&ModVersion> {
        self.versions
            .as_ref()?
            .iter()
            .find(|version| version.id == self.default_version_id)
    }
}

/// A user profile together with the mods they publish.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub username: String,
    #[serde(rename = "ircNick")]
    pub irc_nick: Option<String>,
    #[serde(rename = "twitterUsername")]
    pub twitter_username: Option<String>,
    #[serde(rename = "redditUsername")]
    pub reddit_username: Option<String>,
    #[serde(rename = "forumUsername")]
    pub forum_username: Option<String>,
    pub description: Option<String>,
    /// Absent and `null` both decode as empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub mods: Vec<Mod>,
}

/// Result of a successful `create_mod`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedMod {
    pub id: u64,
    pub name: String,
    /// Canonical absolute URL of the new mod page.
    pub url: String,
}

/// Result of a successful `update_mod`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedVersion {
    pub id: u64,
    /// Canonical absolute URL of the updated mod page.
    pub url: String,
}

/// Session cookie issued by `/api/login`.
///
/// `Debug` is redacted so the value never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self(cookie.into())
    }

    /// Value for a `Cookie` request header.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Browse endpoints answer with either a bare array or `{"result": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum ModList {
    Bare(Vec<Mod>),
    Wrapped { result: Vec<Mod> },
}

impl ModList {
    pub(crate) fn into_vec(self) -> Vec<Mod> {
        match self {
            ModList::Bare(mods) | ModList::Wrapped { result: mods } => mods,
        }
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
