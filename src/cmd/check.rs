use anyhow::Result;
use clap::Args;
use pathauthz::authz::AuthzRequest;
use pathauthz::config::ConfigArgs;

/// Evaluate a single request against the configured rules and print the
/// decision (pass or forbidden).
#[derive(Args)]
pub struct CheckArgs {
    /// The HTTP method, matched case-sensitively (PUT, GET, ...).
    pub method: String,

    /// The request path.
    pub path: String,

    /// Value of the identity header. Leave empty for an anonymous request.
    #[arg(short, long, default_value = "")]
    pub user: String,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl CheckArgs {
    pub fn run(&self) -> Result<()> {
        let cfg = self.config.load()?;
        let authz = cfg.authz.build();

        let decision = authz.authorize(&AuthzRequest {
            path: &self.path,
            method: &self.method,
            user: &self.user,
        });
        println!("{decision}");
        Ok(())
    }
}
