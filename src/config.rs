use std::path::{Path, PathBuf};
use std::{env, fs, io};

use anyhow::{Context, Result};
use clap::Args;
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::authz::config::AuthzConfig;
use crate::logs::LogsConfig;
use crate::server::config::ServerConfig;

pub trait CommonConfig {
    fn complete(&mut self) -> Result<()>;
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub authz: AuthzConfig,

    #[serde(default)]
    pub logs: LogsConfig,
}

impl CommonConfig for Config {
    fn complete(&mut self) -> Result<()> {
        self.server.complete().context("server")?;
        self.authz.complete().context("authz")?;
        self.logs.complete().context("logs")?;
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// The config file to use. Defaults to `$PATHAUTHZ_CONFIG`, then
    /// `pathauthz.toml` in the current directory.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    const CONFIG_ENV: &str = "PATHAUTHZ_CONFIG";
    const DEFAULT_CONFIG_FILE: &str = "pathauthz.toml";

    pub fn load(&self) -> Result<Config> {
        let path = match self.config.as_ref() {
            Some(path) => path.clone(),
            None => match env::var_os(Self::CONFIG_ENV) {
                Some(path) => PathBuf::from(path),
                None => PathBuf::from(Self::DEFAULT_CONFIG_FILE),
            },
        };
        load_config(&path)
    }
}

/// Loads a config from a toml file. A missing file is not an error, the
/// defaults are used instead. The result is always completed (validated).
pub fn load_config<T>(path: &Path) -> Result<T>
where
    T: CommonConfig + DeserializeOwned + Default,
{
    let mut cfg: T = match fs::read_to_string(path) {
        Ok(s) => toml::from_str(&s)
            .with_context(|| format!("parse config file '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!(
                "Config file '{}' not found, using defaults",
                path.display()
            );
            T::default()
        }
        Err(err) => {
            return Err(err).with_context(|| format!("read config file '{}'", path.display()));
        }
    };

    cfg.complete().context("validate config")?;
    Ok(cfg)
}

/// See: [`shellexpand::full`].
pub fn expandenv(name: &str, s: impl AsRef<str>) -> Result<String> {
    let s =
        shellexpand::full(s.as_ref()).with_context(|| format!("expand env value for '{name}'"))?;
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use std::process;

    use crate::logs::LogLevel;

    use super::*;

    /// Every caller passes its own name, the pid keeps parallel test runs apart.
    fn temp_config(name: &str, content: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("pathauthz_{name}_{}.toml", process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_config() {
        let path = temp_config(
            "load",
            r#"
            [server]
            bind = "0.0.0.0:9000"
            upstream = "http://10.0.0.1:5000/"

            [authz]
            base_path = "/restricted"
            user_header = "X-User"
            super_users = ["admin-user"]
            read_only_users = ["read-only-user"]

            [logs]
            level = "debug"
            "#,
        );

        let cfg: Config = load_config(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(cfg.server.bind, "0.0.0.0:9000");
        assert_eq!(cfg.server.upstream, "http://10.0.0.1:5000");
        assert_eq!(cfg.authz.base_path, "/restricted");
        assert_eq!(cfg.authz.user_header, "X-User");
        assert_eq!(cfg.authz.super_users, vec!["admin-user"]);
        assert_eq!(cfg.authz.read_only_users, vec!["read-only-user"]);
        assert!(matches!(cfg.logs.level, LogLevel::Debug));
    }

    #[test]
    fn test_load_missing_config() {
        let path = env::temp_dir().join("pathauthz_not_exists.toml");
        let cfg: Config = load_config(&path).unwrap();

        assert_eq!(cfg.server.bind, ServerConfig::default_bind());
        assert_eq!(cfg.authz.base_path, "/v2");
        assert_eq!(cfg.authz.user_header, "X-Authenticated-User");
    }

    #[test]
    fn test_load_invalid_config() {
        let path = temp_config(
            "invalid",
            r#"
            [server]
            upstream = "ftp://10.0.0.1"
            "#,
        );
        let result: Result<Config> = load_config(&path);
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());

        let path = temp_config("malformed", "[authz\nbase_path = 1");
        let result: Result<Config> = load_config(&path);
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }
}
