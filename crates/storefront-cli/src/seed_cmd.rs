//! Demo data seeding.

use serde_json::{Value, json};
use storefront_core::StoreDatabase;
use storefront_core::config::PluginConfig;
use storefront_core::seed::{SeedOptions, SeedReport, seed_demo_data};
use tracing::warn;

use crate::output::print_json;

/// Options for `storefront seed`.
#[derive(clap::Args, Debug)]
pub struct SeedArgs {
    /// Display name of the demo tenant.
    #[arg(long, default_value = "Demo Store")]
    pub tenant_name: String,
    /// Slug of the demo tenant.
    #[arg(long, default_value = "demo-store")]
    pub tenant_slug: String,
    /// Email of the admin user linked to the tenant.
    #[arg(long, default_value = "admin@demo.com")]
    pub admin_email: String,
    /// Number of demo products.
    #[arg(long, default_value_t = 5)]
    pub products: u32,
    /// Skip demo products entirely.
    #[arg(long)]
    pub no_products: bool,
}

impl SeedArgs {
    pub fn options(&self, config: &PluginConfig) -> SeedOptions {
        SeedOptions {
            admin_email: self.admin_email.clone(),
            product_count: self.products,
            seed_products: !self.no_products,
            tenant_name: self.tenant_name.clone(),
            tenant_slug: self.tenant_slug.clone(),
            ..SeedOptions::from_config(config)
        }
    }
}

/// Seed unless the plugin is disabled in config.
pub async fn seed(
    db: &StoreDatabase,
    args: &SeedArgs,
    config: &PluginConfig,
) -> anyhow::Result<Option<SeedReport>> {
    if config.disabled {
        warn!("Storefront is disabled; skipping seed");
        return Ok(None);
    }
    Ok(Some(seed_demo_data(db, &args.options(config)).await?))
}

/// JSON printed by `storefront seed`: the report, or a skip marker.
pub fn seed_output(report: Option<&SeedReport>) -> anyhow::Result<Value> {
    Ok(match report {
        Some(report) => serde_json::to_value(report)?,
        None => json!({ "skipped": true, "reason": "disabled" }),
    })
}

/// Execute `storefront seed`.
pub async fn run(db: &StoreDatabase, args: &SeedArgs, config: &PluginConfig) -> anyhow::Result<()> {
    let report = seed(db, args, config).await?;
    print_json(&seed_output(report.as_ref())?)
}
