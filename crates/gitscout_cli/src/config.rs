//! Token resolution for the CLI.
//!
//! Precedence (highest to lowest):
//! 1. The `--token` flag
//! 2. The `GITSCOUT_TOKEN` environment variable
//! 3. The `GH_TOKEN` environment variable
//!
//! A `.env` file in the current directory is loaded before resolution, so
//! either variable may come from there.

use thiserror::Error;

#[derive(Debug, Error)]
#[error(
    "no API token configured; pass --token or set GITSCOUT_TOKEN (or GH_TOKEN) in the environment or a .env file"
)]
pub struct MissingToken;

/// Resolve the API token from the flag or the environment.
pub fn resolve_token(flag: Option<String>) -> Result<String, MissingToken> {
    flag.or_else(|| std::env::var("GITSCOUT_TOKEN").ok())
        .or_else(|| std::env::var("GH_TOKEN").ok())
        .filter(|token| !token.is_empty())
        .ok_or(MissingToken)
}
