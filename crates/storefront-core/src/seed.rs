//! Idempotent demo data seeding.

use serde::Serialize;
use storefront_crypto::now_millis;
use tracing::info;

use crate::access::{Principal, Role};
use crate::config::{PluginConfig, ThemeDefaults};
use crate::error::Result;
use crate::hooks::HookContext;
use crate::models::{
    Address, AddressType, NewCustomer, NewInventory, NewProduct, NewStoreSettings, NewTenant,
    Tenant, User,
};
use crate::storage::StoreDatabase;

pub const DEMO_CUSTOMER_EMAIL: &str = "customer@demo.com";
const DEMO_STOCK: i64 = 25;
const DEMO_WAREHOUSE: &str = "Main Warehouse";

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub admin_email: String,
    pub enable_inventory: bool,
    pub product_count: u32,
    pub seed_products: bool,
    pub tenant_name: String,
    pub tenant_slug: String,
    pub theme: ThemeDefaults,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            admin_email: "admin@demo.com".to_string(),
            enable_inventory: true,
            product_count: 5,
            seed_products: true,
            tenant_name: "Demo Store".to_string(),
            tenant_slug: "demo-store".to_string(),
            theme: ThemeDefaults::default(),
        }
    }
}

impl SeedOptions {
    /// Defaults with the inventory flag and theme taken from `config`.
    pub fn from_config(config: &PluginConfig) -> Self {
        Self {
            enable_inventory: config.enable_inventory_tracking,
            theme: config.theme_defaults.clone(),
            ..Self::default()
        }
    }
}

/// What a seeding run created and what was already there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub tenant_id: String,
    pub tenant_created: bool,
    pub admin_created: bool,
    pub admin_linked: bool,
    pub products_created: u32,
    pub products_existing: u32,
    pub inventory_created: u32,
    pub customer_created: bool,
    pub settings_created: bool,
}

impl SeedReport {
    /// Whether this run wrote anything.
    pub const fn created_anything(&self) -> bool {
        self.tenant_created
            || self.admin_created
            || self.admin_linked
            || self.products_created > 0
            || self.inventory_created > 0
            || self.customer_created
            || self.settings_created
    }
}

/// Find the tenant with `slug`, creating it when missing. Returns the tenant
/// and whether it was created.
pub async fn seed_tenant(
    db: &StoreDatabase,
    name: &str,
    slug: &str,
    theme: &ThemeDefaults,
) -> Result<(Tenant, bool)> {
    if let Some(existing) = db.find_tenant_by_slug(slug).await? {
        return Ok((existing, false));
    }
    let tenant = db
        .create_tenant(NewTenant::new(name, slug, theme.clone()))
        .await?;
    Ok((tenant, true))
}

pub async fn assign_user_to_tenant(db: &StoreDatabase, user_id: &str, tenant_id: &str) -> Result<User> {
    Ok(db.assign_user_to_tenant(user_id, tenant_id).await?)
}

/// Seed a demo tenant with an admin, products, a customer and store settings.
/// Running it again creates nothing new.
pub async fn seed_demo_data(db: &StoreDatabase, options: &SeedOptions) -> Result<SeedReport> {
    info!(slug = %options.tenant_slug, "Seeding ecommerce data");
    let mut report = SeedReport::default();

    let (tenant, created) =
        seed_tenant(db, &options.tenant_name, &options.tenant_slug, &options.theme).await?;
    report.tenant_id.clone_from(&tenant.id);
    report.tenant_created = created;
    info!(tenant = %tenant.name, created, "Demo tenant ready");

    let admin = match db.find_user_by_email(&options.admin_email).await? {
        Some(user) => user,
        None => {
            report.admin_created = true;
            db.create_user(&options.admin_email, Role::Admin, Some(&tenant.id))
                .await?
        }
    };
    let admin = if admin.tenant_id.is_none() {
        report.admin_linked = true;
        assign_user_to_tenant(db, &admin.id, &tenant.id).await?
    } else {
        admin
    };

    let principal = Principal::from_user(&admin);
    let ctx = HookContext::create(Some(&principal), now_millis());

    if options.seed_products {
        for i in 1..=options.product_count {
            seed_product(db, &tenant, i, options.enable_inventory, &ctx, &mut report).await?;
        }
        info!(
            created = report.products_created,
            existing = report.products_existing,
            "Demo products ready"
        );
    }

    if db.find_customer_by_email(DEMO_CUSTOMER_EMAIL).await?.is_none() {
        db.create_customer(demo_customer(&tenant.id), &ctx).await?;
        report.customer_created = true;
        info!("Created demo customer");
    }

    if db.find_store_settings(&tenant.id).await?.is_none() {
        db.create_store_settings(NewStoreSettings {
            tenant_id: tenant.id.clone(),
            theme: options.theme.clone(),
            default_currency: "USD".to_string(),
            default_locale: "en-US".to_string(),
            signed_url_ttl_secs: 600,
            storage_adapter: "s3".to_string(),
        })
        .await?;
        report.settings_created = true;
        info!("Created store settings with theme defaults");
    }

    info!(changed = report.created_anything(), "Ecommerce data seeded");
    Ok(report)
}

async fn seed_product(
    db: &StoreDatabase,
    tenant: &Tenant,
    i: u32,
    enable_inventory: bool,
    ctx: &HookContext<'_>,
    report: &mut SeedReport,
) -> Result<()> {
    let slug = format!("demo-product-{i}");
    if db.find_product_by_slug(&slug).await?.is_some() {
        report.products_existing += 1;
        return Ok(());
    }

    let step = i64::from(i) * 1000;
    let sku = format!("DEMO-{i:03}");
    let product = db
        .create_product(
            NewProduct {
                tenant_id: Some(tenant.id.clone()),
                name: format!("Demo Product {i}"),
                slug,
                product_type: if i % 2 == 0 { "digital" } else { "physical" }.to_string(),
                price: 2999 + step,
                compare_at_price: Some(3999 + step),
                status: "published".to_string(),
                sku: Some(sku.clone()),
                track_inventory: true,
                requires_shipping: i % 2 != 0,
                description: format!("This is demo product {i} for testing purposes."),
                metadata: serde_json::json!({ "featured": i <= 3 }),
            },
            ctx,
        )
        .await?;
    report.products_created += 1;

    if enable_inventory {
        db.create_inventory(
            NewInventory {
                tenant_id: Some(tenant.id.clone()),
                product_id: product.id,
                variant_id: None,
                sku,
                stock: DEMO_STOCK,
                threshold: 5,
                warehouse: Some(DEMO_WAREHOUSE.to_string()),
            },
            ctx,
        )
        .await?;
        report.inventory_created += 1;
    }
    Ok(())
}

fn demo_customer(tenant_id: &str) -> NewCustomer {
    NewCustomer {
        tenant_id: Some(tenant_id.to_string()),
        email: DEMO_CUSTOMER_EMAIL.to_string(),
        first_name: Some("Demo".to_string()),
        last_name: Some("Customer".to_string()),
        phone: Some("+1234567890".to_string()),
        addresses: vec![Address {
            name: Some("Demo Customer".to_string()),
            address_type: AddressType::Both,
            is_default: true,
            line1: "123 Main St".to_string(),
            line2: None,
            city: "New York".to_string(),
            state: Some("NY".to_string()),
            postal_code: "10001".to_string(),
            country: "US".to_string(),
        }],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::access::AccessDecision;

    #[tokio::test]
    async fn first_run_creates_demo_store() {
        let db = StoreDatabase::open_in_memory().await.unwrap();
        let report = seed_demo_data(&db, &SeedOptions::default()).await.unwrap();

        assert!(report.tenant_created);
        assert!(report.admin_created);
        assert!(!report.admin_linked);
        assert_eq!(report.products_created, 5);
        assert_eq!(report.inventory_created, 5);
        assert!(report.customer_created);
        assert!(report.settings_created);

        let tenant = db.find_tenant_by_slug("demo-store").await.unwrap().unwrap();
        assert_eq!(tenant.id, report.tenant_id);
        assert_eq!(db.count_products(&tenant.id).await.unwrap(), 5);

        let first = db.find_product_by_slug("demo-product-1").await.unwrap().unwrap();
        assert_eq!(first.price, 3999);
        assert_eq!(first.compare_at_price, Some(4999));
        assert_eq!(first.product_type, "physical");
        assert!(first.requires_shipping);
        assert_eq!(first.metadata.0["featured"], true);

        let fourth = db.find_product_by_slug("demo-product-4").await.unwrap().unwrap();
        assert_eq!(fourth.product_type, "digital");
        assert_eq!(fourth.metadata.0["featured"], false);

        let stock = db.find_inventory_by_sku("DEMO-002").await.unwrap().unwrap();
        assert_eq!(stock.stock, 25);
        assert_eq!(stock.warehouse.as_deref(), Some("Main Warehouse"));

        let settings = db.find_store_settings(&tenant.id).await.unwrap().unwrap();
        assert_eq!(settings.signed_url_ttl_secs, 600);
        assert_eq!(settings.default_locale, "en-US");
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let db = StoreDatabase::open_in_memory().await.unwrap();
        let options = SeedOptions::default();
        let first = seed_demo_data(&db, &options).await.unwrap();
        let second = seed_demo_data(&db, &options).await.unwrap();

        assert!(first.created_anything());
        assert!(!second.created_anything());
        assert_eq!(second.tenant_id, first.tenant_id);
        assert_eq!(second.products_existing, 5);
        assert_eq!(db.list_products(&AccessDecision::Allow).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn existing_admin_without_tenant_is_linked() {
        let db = StoreDatabase::open_in_memory().await.unwrap();
        db.create_user("admin@demo.com", Role::Admin, None).await.unwrap();

        let report = seed_demo_data(&db, &SeedOptions::default()).await.unwrap();
        assert!(!report.admin_created);
        assert!(report.admin_linked);
        let admin = db.find_user_by_email("admin@demo.com").await.unwrap().unwrap();
        assert_eq!(admin.tenant_id.as_deref(), Some(report.tenant_id.as_str()));
    }

    #[tokio::test]
    async fn inventory_and_products_can_be_skipped() {
        let db = StoreDatabase::open_in_memory().await.unwrap();
        let no_inventory = SeedOptions {
            enable_inventory: false,
            product_count: 2,
            ..SeedOptions::default()
        };
        let report = seed_demo_data(&db, &no_inventory).await.unwrap();
        assert_eq!(report.products_created, 2);
        assert_eq!(report.inventory_created, 0);

        let no_products = SeedOptions {
            seed_products: false,
            tenant_slug: "bare".to_string(),
            admin_email: "bare@demo.com".to_string(),
            ..SeedOptions::default()
        };
        let report = seed_demo_data(&db, &no_products).await.unwrap();
        assert_eq!(report.products_created, 0);
        assert!(report.tenant_created);
    }
}
