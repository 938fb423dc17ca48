use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::{expandenv, CommonConfig};

use super::PathAuthorizer;

/// Authorization related configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthzConfig {
    /// The path prefix under which the rules apply. Requests outside of it
    /// are never restricted. Trailing slashes are ignored.
    /// Defaults to `/v2`.
    #[serde(default = "AuthzConfig::default_base_path")]
    pub base_path: String,

    /// The header holding the authenticated user name, populated by the
    /// authentication layer in front of us.
    /// Defaults to `X-Authenticated-User`.
    #[serde(default = "AuthzConfig::default_user_header")]
    pub user_header: String,

    /// Users who can write to all paths. Takes precedence over
    /// `read_only_users`.
    #[serde(default)]
    pub super_users: Vec<String>,

    /// Users who can only read, even under their own sub-path.
    #[serde(default)]
    pub read_only_users: Vec<String>,
}

impl CommonConfig for AuthzConfig {
    fn complete(&mut self) -> Result<()> {
        self.base_path = expandenv("base_path", &self.base_path)?;
        self.user_header = expandenv("user_header", &self.user_header)?;
        Ok(())
    }
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            base_path: Self::default_base_path(),
            user_header: Self::default_user_header(),
            super_users: vec![],
            read_only_users: vec![],
        }
    }
}

impl AuthzConfig {
    pub fn build(&self) -> PathAuthorizer {
        PathAuthorizer::new(self)
    }

    pub fn default_base_path() -> String {
        String::from("/v2")
    }

    pub fn default_user_header() -> String {
        String::from("X-Authenticated-User")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg: AuthzConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.base_path, "/v2");
        assert_eq!(cfg.user_header, "X-Authenticated-User");
        assert!(cfg.super_users.is_empty());
        assert!(cfg.read_only_users.is_empty());
    }

    #[test]
    fn test_parse() {
        let cfg: AuthzConfig = toml::from_str(
            r#"
            base_path = "/restricted/"
            user_header = "X-User"
            super_users = ["admin-user"]
            read_only_users = ["read-only-user", "admin-user"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.base_path, "/restricted/");
        assert_eq!(cfg.user_header, "X-User");
        assert_eq!(cfg.super_users, vec!["admin-user"]);
        assert_eq!(cfg.read_only_users, vec!["read-only-user", "admin-user"]);
    }

    #[test]
    fn test_complete_accepts_anything() {
        let mut cfg = AuthzConfig {
            base_path: String::new(),
            user_header: String::from("X-User"),
            super_users: vec![String::from("both")],
            read_only_users: vec![String::from("both")],
        };
        cfg.complete().unwrap();
        assert_eq!(cfg.base_path, "");
    }
}
