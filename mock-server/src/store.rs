//! In-memory catalogue backing the mock KerbalStuff API.

use std::collections::HashMap;

use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct Version {
    pub id: u64,
    pub friendly_version: String,
    pub ksp_version: String,
    pub changelog: String,
}

#[derive(Clone, Debug)]
pub struct ModRecord {
    pub id: u64,
    pub name: String,
    pub author: String,
    pub short_description: String,
    pub license: String,
    pub background: Option<String>,
    pub website: Option<String>,
    pub donations: Option<String>,
    pub source_code: Option<String>,
    pub description: String,
    pub downloads: u64,
    pub followers: u64,
    pub featured: bool,
    pub created: u64,
    pub updated: u64,
    /// Newest first, matching the live service.
    pub versions: Vec<Version>,
}

impl ModRecord {
    pub fn url(&self) -> String {
        format!("/mod/{}/{}", self.id, self.name.replace(' ', "_"))
    }

    pub fn version_json(&self, version: &Version) -> Value {
        json!({
            "friendly_version": version.friendly_version,
            "download_path": format!("{}/download/{}", self.url(), version.friendly_version),
            "id": version.id,
            "ksp_version": version.ksp_version,
            "changelog": version.changelog,
        })
    }

    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "background": self.background,
            "license": self.license,
            "website": self.website,
            "donations": self.donations,
            "source_code": self.source_code,
            "author": self.author,
            "downloads": self.downloads,
            "short_description": self.short_description,
            "description_html": format!("<p>{}</p>", self.description),
            "description": self.description,
            "followers": self.followers,
            "default_version_id": self.versions.first().map(|v| v.id).unwrap_or_default(),
            "versions": self.versions.iter().map(|v| self.version_json(v)).collect::<Vec<_>>(),
        })
    }
}

#[derive(Clone, Debug)]
pub struct Account {
    pub username: String,
    pub password: String,
    pub irc_nick: Option<String>,
    pub twitter_username: Option<String>,
    pub reddit_username: Option<String>,
    pub forum_username: Option<String>,
    pub description: Option<String>,
}

/// Fields of `/api/mod/create` after validation.
pub struct NewMod {
    pub name: String,
    pub short_description: String,
    pub license: String,
    pub version: String,
    pub ksp_version: String,
}

/// Fields of `/api/mod/<id>/update` after validation.
pub struct NewVersion {
    pub version: String,
    pub changelog: String,
    pub ksp_version: String,
}

#[derive(Debug, Default)]
pub struct Store {
    pub mods: Vec<ModRecord>,
    pub accounts: Vec<Account>,
    sessions: HashMap<String, String>,
    clock: u64,
    next_mod_id: u64,
    next_version_id: u64,
}

impl Store {
    /// Two publishers with three mods between them, plus a user with none.
    pub fn seeded() -> Self {
        let mut store = Self {
            next_mod_id: 1,
            next_version_id: 1,
            ..Self::default()
        };
        store.accounts = vec![
            account("sarbian", "hunter2", Some("sarbian"), Some("MechJeb")),
            account("cybutek", "engineer", None, None),
            account("Bill Kerman", "snacks", None, None),
        ];
        store.seed_mod("MechJeb", "sarbian", "Autopilot and flight info", &["2.4.0", "2.5.1"], 48213, true);
        store.seed_mod("Kerbal Engineer Redux", "cybutek", "Flight and vessel data", &["1.0.16"], 15120, false);
        store.seed_mod("Docking Port Alignment", "sarbian", "Docking camera", &[], 902, false);
        store
    }

    fn seed_mod(
        &mut self,
        name: &str,
        author: &str,
        short_description: &str,
        versions: &[&str],
        downloads: u64,
        featured: bool,
    ) {
        let id = self.create_mod(
            author,
            NewMod {
                name: name.to_string(),
                short_description: short_description.to_string(),
                license: "MIT".to_string(),
                version: String::new(),
                ksp_version: String::new(),
            },
        );
        for version in versions {
            self.add_version(
                id,
                NewVersion {
                    version: version.to_string(),
                    changelog: format!("Release {version}"),
                    ksp_version: "0.90".to_string(),
                },
            )
            .expect("seeded versions are distinct");
        }
        if let Some(m) = self.mods.iter_mut().find(|m| m.id == id) {
            m.downloads = downloads;
            m.featured = featured;
            m.background = Some(format!("/{}.png", id));
            m.source_code = Some(format!("https://github.com/{author}/{}", name.replace(' ', "")));
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    pub fn find_mod(&self, id: u64) -> Option<&ModRecord> {
        self.mods.iter().find(|m| m.id == id)
    }

    pub fn find_account(&self, username: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.username.eq_ignore_ascii_case(username))
    }

    pub fn user_json(&self, account: &Account) -> Value {
        let mods: Vec<Value> = self
            .mods
            .iter()
            .filter(|m| m.author == account.username)
            .map(ModRecord::to_json)
            .collect();
        json!({
            "username": account.username,
            "ircNick": account.irc_nick,
            "twitterUsername": account.twitter_username,
            "redditUsername": account.reddit_username,
            "forumUsername": account.forum_username,
            "description": account.description,
            "mods": mods,
        })
    }

    /// Returns a session token when the credentials match.
    pub fn login(&mut self, username: &str, password: &str) -> Option<String> {
        let account = self
            .accounts
            .iter()
            .find(|a| a.username == username && a.password == password)?;
        let token = Uuid::new_v4().to_string();
        self.sessions.insert(token.clone(), account.username.clone());
        Some(token)
    }

    pub fn session_user(&self, token: &str) -> Option<&str> {
        self.sessions.get(token).map(String::as_str)
    }

    /// Creates the mod and, when `new.version` is set, its first version.
    pub fn create_mod(&mut self, author: &str, new: NewMod) -> u64 {
        let id = self.next_mod_id;
        self.next_mod_id += 1;
        let now = self.tick();
        self.mods.push(ModRecord {
            id,
            name: new.name,
            author: author.to_string(),
            short_description: new.short_description,
            license: new.license,
            background: None,
            website: None,
            donations: None,
            source_code: None,
            description: String::new(),
            downloads: 0,
            followers: 0,
            featured: false,
            created: now,
            updated: now,
            versions: Vec::new(),
        });
        if !new.version.is_empty() {
            self.add_version(
                id,
                NewVersion {
                    version: new.version,
                    changelog: String::new(),
                    ksp_version: new.ksp_version,
                },
            )
            .expect("fresh mod has no versions");
        }
        id
    }

    /// Prepends a version. Returns the new version id and the mod URL.
    pub fn add_version(&mut self, mod_id: u64, new: NewVersion) -> Result<(u64, String), &'static str> {
        let version_id = self.next_version_id;
        let now = self.tick();
        let m = self
            .mods
            .iter_mut()
            .find(|m| m.id == mod_id)
            .ok_or("Mod not found.")?;
        if m.versions.iter().any(|v| v.friendly_version == new.version) {
            return Err("We already have this version. Did you mistype the version number?");
        }
        m.versions.insert(
            0,
            Version {
                id: version_id,
                friendly_version: new.version,
                ksp_version: new.ksp_version,
                changelog: new.changelog,
            },
        );
        m.updated = now;
        self.next_version_id += 1;
        Ok((version_id, m.url()))
    }
}

fn account(username: &str, password: &str, irc: Option<&str>, forum: Option<&str>) -> Account {
    Account {
        username: username.to_string(),
        password: password.to_string(),
        irc_nick: irc.map(str::to_string),
        twitter_username: None,
        reddit_username: None,
        forum_username: forum.map(str::to_string),
        description: Some(format!("{username} builds rockets")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_versions_are_newest_first() {
        let store = Store::seeded();
        let mechjeb = store.find_mod(1).unwrap();
        let versions: Vec<&str> = mechjeb.versions.iter().map(|v| v.friendly_version.as_str()).collect();
        assert_eq!(versions, vec!["2.5.1", "2.4.0"]);
        assert_eq!(mechjeb.to_json()["default_version_id"], mechjeb.versions[0].id);
    }

    #[test]
    fn duplicate_version_is_rejected() {
        let mut store = Store::seeded();
        let err = store
            .add_version(
                1,
                NewVersion {
                    version: "2.5.1".to_string(),
                    changelog: String::new(),
                    ksp_version: "0.90".to_string(),
                },
            )
            .unwrap_err();
        assert!(err.contains("already have this version"));
    }

    #[test]
    fn created_mod_starts_with_its_first_version() {
        let mut store = Store::seeded();
        let id = store.create_mod(
            "sarbian",
            NewMod {
                name: "Rover Wheels".to_string(),
                short_description: "Bigger wheels".to_string(),
                license: "MIT".to_string(),
                version: "1.0".to_string(),
                ksp_version: "1.0.2".to_string(),
            },
        );
        let created = store.find_mod(id).unwrap();
        assert_eq!(created.versions.len(), 1);
        assert_eq!(created.versions[0].friendly_version, "1.0");
        assert_eq!(created.url(), format!("/mod/{id}/Rover_Wheels"));
    }

    #[test]
    fn login_issues_distinct_tokens() {
        let mut store = Store::seeded();
        let a = store.login("sarbian", "hunter2").unwrap();
        let b = store.login("sarbian", "hunter2").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.session_user(&a), Some("sarbian"));
        assert!(store.login("sarbian", "wrong").is_none());
    }

    #[test]
    fn user_json_lists_only_their_mods() {
        let store = Store::seeded();
        let json = store.user_json(store.find_account("sarbian").unwrap());
        assert_eq!(json["mods"].as_array().unwrap().len(), 2);
        assert_eq!(json["ircNick"], "sarbian");
    }
}
