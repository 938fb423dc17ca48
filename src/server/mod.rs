pub mod config;
pub mod proxy;

use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::from_fn;
use actix_web::web::{self, Data, PayloadConfig};
use actix_web::{App, HttpServer};
use anyhow::{Context, Result};
use log::{info, warn};

use crate::authz::middleware::authorize;
use crate::authz::Authorizer;

use self::proxy::{forward_handler, Proxy};

/// HTTP server putting the authorizer in front of the upstream service.
pub struct RestfulServer {
    authz: Arc<dyn Authorizer>,
    proxy: Arc<Proxy>,

    keep_alive_secs: Option<u64>,
    workers: Option<u64>,

    bind: String,

    payload_limit_mib: usize,
}

impl RestfulServer {
    pub fn new(bind: String, authz: Arc<dyn Authorizer>, proxy: Proxy) -> Self {
        Self {
            authz,
            proxy: Arc::new(proxy),
            keep_alive_secs: None,
            workers: None,
            bind,
            payload_limit_mib: 10,
        }
    }

    pub fn set_keep_alive_secs(&mut self, keep_alive_secs: u64) {
        self.keep_alive_secs = Some(keep_alive_secs);
    }

    pub fn set_workers(&mut self, workers: u64) {
        self.workers = Some(workers);
    }

    pub fn set_payload_limit_mib(&mut self, payload_limit_mib: usize) {
        self.payload_limit_mib = payload_limit_mib;
    }

    pub async fn run(self) -> Result<()> {
        let authz: Data<dyn Authorizer> = Data::from(self.authz.clone());
        let proxy: Data<Proxy> = Data::from(self.proxy.clone());
        let payload_limit = self.payload_limit_mib * 1024 * 1024;

        let mut srv = HttpServer::new(move || {
            App::new()
                .app_data(authz.clone())
                .app_data(proxy.clone())
                .app_data(PayloadConfig::new(payload_limit))
                .wrap(from_fn(authorize))
                .default_service(web::to(forward_handler))
        });

        if self.bind.starts_with("0.0.0.0") {
            warn!("Listening on all interfaces, make sure the identity header can only be set by the authentication layer");
        }
        info!("Binding to http://{}", self.bind);
        srv = srv.bind(&self.bind).context("bind server")?;

        if let Some(keep_alive) = self.keep_alive_secs {
            srv = srv.keep_alive(Duration::from_secs(keep_alive));
        }
        if let Some(workers) = self.workers {
            srv = srv.workers(workers as usize);
        }

        info!("Starting restful server");
        srv.run().await.context("run server")?;

        info!("Server stopped by user");
        Ok(())
    }
}
