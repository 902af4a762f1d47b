//! Download token subcommands: issue, verify, link.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::path::Path;
use std::time::Duration;

use storefront_core::access::{Principal, Role};
use storefront_core::config::PluginConfig;
use storefront_core::downloads::{DownloadLink, DownloadService};
use storefront_crypto::{DownloadGrant, now_millis};

use crate::output::{open_store, print_json};

/// Token subcommand actions.
#[derive(clap::Subcommand, Debug)]
pub enum TokenAction {
    /// Sign a download token for any file ID.
    Issue {
        /// File ID to grant.
        #[arg(long)]
        file_id: String,
        /// Lifetime in seconds (defaults to the configured signed URL TTL).
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Check a token and print the grant it carries.
    Verify {
        /// Token to check.
        token: String,
    },
    /// Issue a link for a digital file stored in the database.
    Link {
        /// Digital file ID.
        file_id: String,
    },
}

/// Execute a token subcommand.
pub async fn run(
    action: TokenAction,
    config: &PluginConfig,
    db_path: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        TokenAction::Issue { file_id, ttl } => {
            print_json(&issue_token(config, &file_id, ttl, now_millis())?)
        }
        TokenAction::Verify { token } => print_json(&verify_token(config, &token, now_millis())?),
        TokenAction::Link { file_id } => {
            let db = open_store(db_path).await?;
            let service = DownloadService::from_config(db, config)?;
            let operator = Principal::new("cli", Role::Admin, None);
            print_json(&service.issue_link(Some(&operator), &file_id).await?)
        }
    }
}

/// Sign `file_id` with the configured secret.
pub fn issue_token(
    config: &PluginConfig,
    file_id: &str,
    ttl_secs: Option<u64>,
    now_ms: i64,
) -> anyhow::Result<DownloadLink> {
    let signer = config.download_signer()?;
    let ttl = ttl_secs.map_or_else(
        || config.digital_file_storage.signed_url_ttl(),
        Duration::from_secs,
    );
    let token = signer.issue_at(file_id, ttl, now_ms)?;
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    Ok(DownloadLink {
        token,
        file_id: file_id.to_string(),
        expires_at_ms: now_ms.saturating_add(ttl_ms),
    })
}

pub fn verify_token(config: &PluginConfig, token: &str, now_ms: i64) -> anyhow::Result<DownloadGrant> {
    config
        .download_signer()?
        .verify_at(token, now_ms)
        .ok_or_else(|| anyhow::anyhow!("Invalid or expired download token"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000_000;

    fn config() -> PluginConfig {
        let mut config = PluginConfig::default();
        config.digital_file_storage.signing_secret = Some("cli-secret".to_string());
        config
    }

    #[test]
    fn issued_token_verifies_until_expiry() {
        let config = config();
        let link = issue_token(&config, "file-1", Some(60), NOW).unwrap();
        assert_eq!(link.expires_at_ms, NOW + 60_000);

        let grant = verify_token(&config, &link.token, NOW + 60_000).unwrap();
        assert_eq!(grant.file_id, "file-1");
        assert!(verify_token(&config, &link.token, NOW + 60_001).is_err());
    }

    #[test]
    fn default_ttl_comes_from_config() {
        let link = issue_token(&config(), "file-1", None, NOW).unwrap();
        assert_eq!(link.expires_at_ms, NOW + 600_000);
    }

    #[test]
    fn other_secret_rejects_token() {
        let link = issue_token(&config(), "file-1", None, NOW).unwrap();
        let mut other = config();
        other.digital_file_storage.signing_secret = Some("different".to_string());
        assert!(verify_token(&other, &link.token, NOW).is_err());
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(issue_token(&PluginConfig::default(), "file-1", None, NOW).is_err());
    }
}
