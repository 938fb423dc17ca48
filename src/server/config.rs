use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::authz::Authorizer;
use crate::config::{expandenv, CommonConfig};

use super::proxy::Proxy;
use super::RestfulServer;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_bind")]
    pub bind: String,

    /// Base URL of the service receiving the authorized requests.
    #[serde(default = "ServerConfig::default_upstream")]
    pub upstream: String,

    pub keep_alive_secs: Option<u64>,

    pub workers: Option<u64>,

    #[serde(default = "ServerConfig::default_payload_limit_mib")]
    pub payload_limit_mib: usize,

    /// Timeout for a whole upstream round trip.
    #[serde(default = "ServerConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: Self::default_bind(),
            upstream: Self::default_upstream(),
            keep_alive_secs: None,
            workers: None,
            payload_limit_mib: Self::default_payload_limit_mib(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl CommonConfig for ServerConfig {
    fn complete(&mut self) -> Result<()> {
        self.bind = expandenv("bind", &self.bind)?;
        if self.bind.is_empty() {
            bail!("bind is required");
        }

        self.upstream = expandenv("upstream", &self.upstream)?;
        if self.upstream.is_empty() {
            bail!("upstream is required");
        }
        if !self.upstream.starts_with("http://") && !self.upstream.starts_with("https://") {
            bail!("upstream must be an http or https url");
        }
        self.upstream = self.upstream.trim_end_matches('/').to_string();

        if let Some(keep_alive_secs) = self.keep_alive_secs {
            if keep_alive_secs == 0 {
                bail!("keep_alive_secs must be greater than 0");
            }
        }

        if let Some(workers) = self.workers {
            if workers == 0 {
                bail!("workers must be greater than 0");
            }
        }

        if self.payload_limit_mib < Self::MIN_PAYLOAD_LIMIT_MIB
            || self.payload_limit_mib > Self::MAX_PAYLOAD_LIMIT_MIB
        {
            bail!(
                "payload_limit_mib must be in range [{}, {}]",
                Self::MIN_PAYLOAD_LIMIT_MIB,
                Self::MAX_PAYLOAD_LIMIT_MIB
            );
        }

        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than 0");
        }

        Ok(())
    }
}

impl ServerConfig {
    const MIN_PAYLOAD_LIMIT_MIB: usize = 1;
    const MAX_PAYLOAD_LIMIT_MIB: usize = 1024;

    pub fn build_server(&self, authz: Arc<dyn Authorizer>) -> Result<RestfulServer> {
        let proxy = Proxy::new(
            self.upstream.clone(),
            Duration::from_secs(self.timeout_secs),
        )
        .context("init upstream proxy")?;

        let mut srv = RestfulServer::new(self.bind.clone(), authz, proxy);
        srv.set_payload_limit_mib(self.payload_limit_mib);

        if let Some(keep_alive_secs) = self.keep_alive_secs {
            srv.set_keep_alive_secs(keep_alive_secs);
        }

        if let Some(workers) = self.workers {
            srv.set_workers(workers);
        }

        Ok(srv)
    }

    pub fn default_bind() -> String {
        String::from("127.0.0.1:8080")
    }

    pub fn default_upstream() -> String {
        String::from("http://127.0.0.1:8000")
    }

    pub fn default_payload_limit_mib() -> usize {
        10
    }

    pub fn default_timeout_secs() -> u64 {
        30
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete() {
        let mut cfg = ServerConfig {
            upstream: String::from("https://example.com/api//"),
            ..Default::default()
        };
        cfg.complete().unwrap();
        assert_eq!(cfg.upstream, "https://example.com/api");

        let invalid = [
            ServerConfig {
                bind: String::new(),
                ..Default::default()
            },
            ServerConfig {
                upstream: String::new(),
                ..Default::default()
            },
            ServerConfig {
                upstream: String::from("127.0.0.1:8000"),
                ..Default::default()
            },
            ServerConfig {
                workers: Some(0),
                ..Default::default()
            },
            ServerConfig {
                keep_alive_secs: Some(0),
                ..Default::default()
            },
            ServerConfig {
                payload_limit_mib: 0,
                ..Default::default()
            },
            ServerConfig {
                timeout_secs: 0,
                ..Default::default()
            },
        ];
        for mut cfg in invalid {
            assert!(cfg.complete().is_err(), "{cfg:?} should be invalid");
        }
    }
}
