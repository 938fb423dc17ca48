use anyhow::Result;
use clap::Args;
use pathauthz::config::ConfigArgs;

/// Display the effective configuration in JSON format.
#[derive(Args)]
pub struct ShowConfigArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl ShowConfigArgs {
    pub fn run(&self) -> Result<()> {
        let cfg = self.config.load()?;
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        Ok(())
    }
}
