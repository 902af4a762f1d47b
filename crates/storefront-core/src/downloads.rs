//! Signed download links for digital files.

use std::time::Duration;

use serde::Serialize;
use storefront_crypto::{DownloadTokenSigner, now_millis};
use tracing::{info, warn};

use crate::access::{Operation, Principal};
use crate::collections::Collection;
use crate::config::PluginConfig;
use crate::error::{Error, Result};
use crate::models::DigitalFile;
use crate::storage::StoreDatabase;

/// A freshly issued download link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub token: String,
    pub file_id: String,
    pub expires_at_ms: i64,
}

/// Issues and redeems download tokens against the store.
#[derive(Debug)]
pub struct DownloadService {
    db: StoreDatabase,
    signer: DownloadTokenSigner,
    ttl: Duration,
}

impl DownloadService {
    pub const fn new(db: StoreDatabase, signer: DownloadTokenSigner, ttl: Duration) -> Self {
        Self { db, signer, ttl }
    }

    /// Build from the resolved config's secret and TTL.
    pub fn from_config(db: StoreDatabase, config: &PluginConfig) -> Result<Self> {
        Ok(Self::new(
            db,
            config.download_signer()?,
            config.digital_file_storage.signed_url_ttl(),
        ))
    }

    pub async fn issue_link(
        &self,
        principal: Option<&Principal>,
        file_id: &str,
    ) -> Result<DownloadLink> {
        self.issue_link_at(principal, file_id, now_millis()).await
    }

    /// Issue a link for `file_id` if `principal` may read it.
    pub async fn issue_link_at(
        &self,
        principal: Option<&Principal>,
        file_id: &str,
        now_ms: i64,
    ) -> Result<DownloadLink> {
        let file = self.db.get_digital_file(file_id).await?;
        let decision = Collection::DigitalFiles
            .access()
            .evaluate(Operation::Read, principal);
        if !decision.permits(&file) {
            warn!(file_id, "Download link denied");
            return Err(Error::AccessDenied {
                collection: Collection::DigitalFiles.slug(),
                operation: Operation::Read.as_str(),
            });
        }

        let token = self.signer.issue_at(&file.id, self.ttl, now_ms)?;
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        info!(file_id, ttl_secs = self.ttl.as_secs(), "Download link issued");
        Ok(DownloadLink {
            token,
            file_id: file.id,
            expires_at_ms: now_ms.saturating_add(ttl_ms),
        })
    }

    pub async fn redeem(&self, token: &str) -> Result<DigitalFile> {
        self.redeem_at(token, now_millis()).await
    }

    /// Verify `token` and load the file it grants.
    pub async fn redeem_at(&self, token: &str, now_ms: i64) -> Result<DigitalFile> {
        let Some(grant) = self.signer.verify_at(token, now_ms) else {
            warn!("Rejected download token");
            return Err(Error::InvalidDownloadToken);
        };
        Ok(self.db.get_digital_file(&grant.file_id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::access::Role;
    use crate::config::ThemeDefaults;
    use crate::hooks::HookContext;
    use crate::models::{NewDigitalFile, NewTenant};

    const T0: i64 = 1_760_000_000_000;

    async fn setup() -> (DownloadService, DigitalFile, String) {
        let db = StoreDatabase::open_in_memory().await.unwrap();
        let tenant = db
            .create_tenant(NewTenant::new("Acme", "acme", ThemeDefaults::default()))
            .await
            .unwrap();
        let file = db
            .create_digital_file(
                NewDigitalFile {
                    tenant_id: Some(tenant.id.clone()),
                    name: "manual.pdf".to_string(),
                    file_key: Some("files/manual.pdf".to_string()),
                    ..Default::default()
                },
                &HookContext::create(None, T0),
            )
            .await
            .unwrap();
        let signer = DownloadTokenSigner::new("s3cr3t").unwrap();
        let service = DownloadService::new(db, signer, Duration::from_secs(600));
        (service, file, tenant.id)
    }

    #[tokio::test]
    async fn issue_then_redeem() {
        let (service, file, tenant) = setup().await;
        let manager = Principal::new("u", Role::Manager, Some(tenant));
        let link = service
            .issue_link_at(Some(&manager), &file.id, T0)
            .await
            .unwrap();
        assert_eq!(link.file_id, file.id);
        assert_eq!(link.expires_at_ms, T0 + 600_000);

        let redeemed = service.redeem_at(&link.token, T0 + 599_000).await.unwrap();
        assert_eq!(redeemed.id, file.id);
        assert_eq!(redeemed.name, "manual.pdf");
    }

    #[tokio::test]
    async fn expired_or_tampered_tokens_are_rejected() {
        let (service, file, _) = setup().await;
        let admin = Principal::new("a", Role::Admin, None);
        let link = service.issue_link_at(Some(&admin), &file.id, T0).await.unwrap();

        assert!(matches!(
            service.redeem_at(&link.token, T0 + 601_000).await,
            Err(Error::InvalidDownloadToken)
        ));
        assert!(matches!(
            service.redeem_at("not-a-token", T0).await,
            Err(Error::InvalidDownloadToken)
        ));
    }

    #[tokio::test]
    async fn other_tenants_and_anonymous_callers_are_denied() {
        let (service, file, _) = setup().await;
        let outsider = Principal::new("o", Role::Manager, Some("elsewhere".to_string()));
        assert!(matches!(
            service.issue_link_at(Some(&outsider), &file.id, T0).await,
            Err(Error::AccessDenied { .. })
        ));
        assert!(matches!(
            service.issue_link_at(None, &file.id, T0).await,
            Err(Error::AccessDenied { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_file_is_not_found() {
        let (service, _, _) = setup().await;
        let admin = Principal::new("a", Role::Admin, None);
        let err = service
            .issue_link_at(Some(&admin), "missing", T0)
            .await
            .expect_err("missing file");
        assert!(matches!(
            err,
            Error::Database(crate::db::DatabaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn from_config_requires_secret() {
        let db = StoreDatabase::open_in_memory().await.unwrap();
        let mut config = PluginConfig::default();
        assert!(DownloadService::from_config(db.clone(), &config).is_err());
        config.digital_file_storage.signing_secret = Some("k".to_string());
        assert!(DownloadService::from_config(db, &config).is_ok());
    }
}
