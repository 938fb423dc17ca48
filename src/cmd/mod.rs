use anyhow::Result;
use clap::{Parser, Subcommand};

mod check;
mod config;
mod serve;

#[derive(Parser)]
#[command(author, version, about)]
pub struct App {
    #[command(subcommand)]
    pub commands: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Serve(serve::ServeArgs),
    Check(check::CheckArgs),
    Config(config::ShowConfigArgs),
}

impl App {
    pub async fn run(&self) -> Result<()> {
        match &self.commands {
            Commands::Serve(args) => args.run().await,
            Commands::Check(args) => args.run(),
            Commands::Config(args) => args.run(),
        }
    }
}
