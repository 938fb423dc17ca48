use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use log::info;
use pathauthz::authz::Authorizer;
use pathauthz::config::ConfigArgs;
use pathauthz::logs::LogLevel;

/// Start the authorizing proxy in front of the upstream service
#[derive(Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override the log level from config: error, warning, info or debug
    #[arg(short, long)]
    pub level: Option<String>,
}

impl ServeArgs {
    pub async fn run(&self) -> Result<()> {
        let mut cfg = self.config.load()?;
        if let Some(level) = self.level.as_ref() {
            cfg.logs.level = LogLevel::parse(level)
                .with_context(|| format!("unknown log level '{level}'"))?;
        }
        cfg.logs.init()?;

        info!(
            "Authorize requests under '{}' by header '{}', forward to '{}'",
            cfg.authz.base_path, cfg.authz.user_header, cfg.server.upstream
        );
        let authz: Arc<dyn Authorizer> = Arc::new(cfg.authz.build());

        let srv = cfg.server.build_server(authz)?;
        srv.run().await
    }
}
