//! Application settings loading from config.toml
//!
//! Server binding, media root, workflow file location and the user/team
//! directory all come from one TOML file, with the database URL taken from
//! the environment (or `.env`). Everything is loaded once at startup.

use crate::{
    core::ActingUser,
    errors::{Error, Result},
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Known users and their team memberships
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

/// HTTP server settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the server binds to
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory uploaded step files are stored under (served at /media/)
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,
    /// Path of the workflow definition file
    #[serde(default = "default_workflow_file")]
    pub workflow_file: PathBuf,
}

fn default_bind() -> String {
    "127.0.0.1:8081".to_string()
}

fn default_media_root() -> PathBuf {
    PathBuf::from("data/media")
}

fn default_workflow_file() -> PathBuf {
    PathBuf::from("workflow.toml")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            media_root: default_media_root(),
            workflow_file: default_workflow_file(),
        }
    }
}

/// Configuration for a single known user
#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    /// Stable user id, matched against the `X-User-Id` request header
    pub id: i64,
    /// Display name recorded on audit steps
    pub username: String,
    /// Teams the user belongs to, matched against transition gates
    #[serde(default)]
    pub team_ids: Vec<i64>,
}

/// Lookup table from user id to acting-user identity.
///
/// Unknown ids still act (identity is the HTTP layer's concern, authorization
/// is the workflow's), but with no team memberships, so every team-gated
/// transition rejects them.
#[derive(Debug, Default, Clone)]
pub struct UserDirectory {
    users: HashMap<i64, UserConfig>,
}

impl UserDirectory {
    /// Builds a directory from configured users.
    #[must_use]
    pub fn new(users: Vec<UserConfig>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        }
    }

    /// Resolves a user id to an acting user.
    #[must_use]
    pub fn resolve(&self, id: i64) -> ActingUser {
        self.users.get(&id).map_or_else(
            || ActingUser {
                id,
                username: format!("user-{id}"),
                team_ids: vec![],
            },
            |u| ActingUser {
                id: u.id,
                username: u.username.clone(),
                team_ids: u.team_ids.clone(),
            },
        )
    }
}

/// Loads application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads application configuration from the default location (./config.toml),
/// falling back to defaults when the file does not exist.
pub fn load_default_config() -> Result<AppConfig> {
    if Path::new("config.toml").exists() {
        load_config("config.toml")
    } else {
        Ok(AppConfig {
            server: ServerConfig::default(),
            users: vec![],
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_app_config() {
        let toml_str = r#"
            [server]
            bind = "0.0.0.0:9000"
            media_root = "/var/lib/budget-flow/media"
            workflow_file = "polio_workflow.toml"

            [[users]]
            id = 1
            username = "alice"
            team_ids = [1, 2]

            [[users]]
            id = 2
            username = "bob"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.users[1].team_ids, Vec::<i64>::new());
    }

    #[test]
    fn test_directory_resolves_known_and_unknown_users() {
        let directory = UserDirectory::new(vec![UserConfig {
            id: 7,
            username: "alice".to_string(),
            team_ids: vec![3],
        }]);

        let alice = directory.resolve(7);
        assert_eq!(alice.username, "alice");
        assert_eq!(alice.team_ids, vec![3]);

        let stranger = directory.resolve(42);
        assert_eq!(stranger.id, 42);
        assert!(stranger.team_ids.is_empty());
    }

    #[test]
    fn test_defaults_apply_when_sections_missing() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8081");
        assert_eq!(config.server.workflow_file, PathBuf::from("workflow.toml"));
        assert!(config.users.is_empty());
    }
}
