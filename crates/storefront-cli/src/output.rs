//! Shared helpers for subcommands.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use storefront_core::config::database_path;
use storefront_core::{StoreDatabase, TenantContext};

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let mut out = io::stdout();
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Open the store at `db_path`, or at the default data-dir location.
pub async fn open_store(db_path: Option<&Path>) -> anyhow::Result<StoreDatabase> {
    let path = match db_path {
        Some(path) => path.to_path_buf(),
        None => database_path()
            .ok_or_else(|| anyhow::anyhow!("No data directory found. Use --db-path <file>"))?,
    };
    tracing::debug!(path = %path.display(), "Opening store database");
    Ok(StoreDatabase::open(&path).await?)
}

/// Tenant context for `slug`, or all tenants when no slug is given.
pub async fn tenant_context(db: &StoreDatabase, slug: Option<&str>) -> anyhow::Result<TenantContext> {
    let Some(slug) = slug else {
        return Ok(TenantContext::all());
    };
    let tenant = db
        .find_tenant_by_slug(slug)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Unknown tenant '{slug}'"))?;
    Ok(TenantContext::for_tenant(tenant.id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storefront_core::config::ThemeDefaults;
    use storefront_core::models::NewTenant;

    use super::*;

    #[tokio::test]
    async fn open_store_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.db");
        let db = open_store(Some(&path)).await.unwrap();
        assert!(db.list_tenants().await.unwrap().is_empty());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn tenant_context_by_slug() {
        let db = StoreDatabase::open_in_memory().await.unwrap();
        let tenant = db
            .create_tenant(NewTenant::new("Acme", "acme", ThemeDefaults::default()))
            .await
            .unwrap();

        let ctx = tenant_context(&db, Some("acme")).await.unwrap();
        assert_eq!(ctx.current(), Some(tenant.id.as_str()));
        assert_eq!(tenant_context(&db, None).await.unwrap(), TenantContext::all());
        assert!(tenant_context(&db, Some("ghost")).await.is_err());
    }
}
