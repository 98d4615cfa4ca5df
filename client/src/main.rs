use std::error::Error;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;

use config::{Args, Settings, HELP, USAGE};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let Some(settings) = Settings::from_args(args, Utc::now().timestamp()) else {
        println!("{USAGE}");
        println!("{HELP}");
        return Ok(());
    };
    debug!(
        "Signing with {:?}, expiring at {}",
        settings.hashing_method, settings.expires
    );

    let token = settings
        .into_token_request()
        .generate()
        .context("Failed to generate token")?;
    println!("\nEmbed Token: \n{}", token.url);

    Ok(())
}
