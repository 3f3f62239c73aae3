//! Mint development tokens for connecting to a local server

use anyhow::{Result, bail};
use clap::Args;
use mockview_core::TokenValidator;

use crate::config::{ConfigLoader, JWT_SECRET_ENV};

/// Arguments for the token command
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// User id to embed in the token
    #[arg(short, long)]
    pub user: String,

    /// Lifetime in hours (defaults to [auth] token_ttl_hours)
    #[arg(long)]
    pub ttl_hours: Option<u64>,
}

pub fn run(args: TokenArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    if config.auth.jwt_secret.is_empty() {
        bail!("No JWT secret configured; set {JWT_SECRET_ENV} or [auth] jwt_secret");
    }

    let ttl_hours = args.ttl_hours.unwrap_or(config.auth.token_ttl_hours);
    let token = issue(&config.auth.jwt_secret, &args.user, ttl_hours)?;
    println!("{}", token);
    Ok(())
}

fn issue(secret: &str, user_id: &str, ttl_hours: u64) -> Result<String> {
    let hours = i64::try_from(ttl_hours)?;
    let token = TokenValidator::new(secret).issue(user_id, chrono::Duration::hours(hours))?;
    Ok(token)
}
