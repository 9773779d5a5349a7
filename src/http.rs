use std::time::Duration;

use crate::config::WikiConfig;
use crate::Result;

const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Builds the `reqwest::Client` shared by every request of a run.
///
/// The cookie store keeps the wiki session alive between fetching the edit
/// token and posting the edit.
pub fn build_client(config: &WikiConfig) -> Result<reqwest::Client> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    if config.accept_invalid_certs {
        tracing::warn!("TLS certificate verification is disabled");
    }

    let client = reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()?;
    Ok(client)
}
