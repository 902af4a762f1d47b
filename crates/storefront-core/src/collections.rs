//! Collection registry and admin extension manifest.
//!
//! [`build_manifest`] turns a resolved [`PluginConfig`] into the list of
//! collections a host admin should register, each with its access rules,
//! plus the dashboard widgets, nav links and views the plugin contributes.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::access::AccessRule::{self, AdminOnly, Authenticated, Public, TenantScoped};
use crate::access::CollectionAccess;
use crate::config::PluginConfig;

/// Module path prefix of the admin client components.
pub const COMPONENT_PREFIX: &str = "storefront/client#";

const TENANT_USER_FIELDS: [&str; 2] = ["role", "tenantId"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    Tenants,
    Users,
    Products,
    Orders,
    Customers,
    DigitalFiles,
    Licenses,
    Subscriptions,
    Inventory,
    Variants,
    StoreSettings,
    ThemeConfig,
}

impl Collection {
    pub const ALL: [Self; 12] = [
        Self::Tenants,
        Self::Users,
        Self::Products,
        Self::Orders,
        Self::Customers,
        Self::DigitalFiles,
        Self::Licenses,
        Self::Subscriptions,
        Self::Inventory,
        Self::Variants,
        Self::StoreSettings,
        Self::ThemeConfig,
    ];

    pub const fn slug(self) -> &'static str {
        match self {
            Self::Tenants => "tenants",
            Self::Users => "users",
            Self::Products => "products",
            Self::Orders => "orders",
            Self::Customers => "customers",
            Self::DigitalFiles => "digital-files",
            Self::Licenses => "licenses",
            Self::Subscriptions => "subscriptions",
            Self::Inventory => "inventory",
            Self::Variants => "variants",
            Self::StoreSettings => "store-settings",
            Self::ThemeConfig => "theme-config",
        }
    }

    pub const fn title_field(self) -> &'static str {
        match self {
            Self::Tenants | Self::Products | Self::DigitalFiles | Self::ThemeConfig => "name",
            Self::Users | Self::Customers => "email",
            Self::Orders => "orderNumber",
            Self::Licenses => "licenseKey",
            Self::Subscriptions => "subscriptionId",
            Self::Inventory | Self::Variants => "sku",
            Self::StoreSettings => "defaultCurrency",
        }
    }

    pub const fn default_columns(self) -> &'static [&'static str] {
        match self {
            Self::Tenants => &["name", "slug", "status", "createdAt"],
            Self::Users => &["email", "role", "tenantId"],
            Self::Products => &["name", "type", "price", "status", "tenantId"],
            Self::Orders => &["orderNumber", "customer", "total", "status", "createdAt"],
            Self::Customers => &["email", "firstName", "lastName", "tenantId", "createdAt"],
            Self::DigitalFiles => &["name", "product", "tenantId", "createdAt"],
            Self::Licenses => &["licenseKey", "tenantId", "product", "status", "createdAt"],
            Self::Subscriptions => &["subscriptionId", "customer", "status", "tenantId", "createdAt"],
            Self::Inventory => &["sku", "stock", "tenantId", "updatedAt"],
            Self::Variants => &["sku", "product", "price", "stock", "tenantId"],
            Self::StoreSettings | Self::ThemeConfig => &[],
        }
    }

    /// Create/read/update/delete rules for this collection.
    pub const fn access(self) -> CollectionAccess {
        match self {
            Self::Tenants => CollectionAccess {
                create: AdminOnly,
                read: Public,
                update: AdminOnly,
                delete: AdminOnly,
            },
            Self::Users => CollectionAccess::uniform(Authenticated),
            Self::Products => CollectionAccess {
                create: Authenticated,
                read: AccessRule::TenantScopedOrPublic { status: "published" },
                update: TenantScoped,
                delete: TenantScoped,
            },
            Self::Variants => CollectionAccess {
                create: Authenticated,
                read: AccessRule::TenantScopedOrPublic { status: "active" },
                update: TenantScoped,
                delete: TenantScoped,
            },
            Self::Orders | Self::Customers => CollectionAccess {
                create: Public,
                read: TenantScoped,
                update: TenantScoped,
                delete: AdminOnly,
            },
            Self::DigitalFiles | Self::Licenses => CollectionAccess {
                create: Authenticated,
                read: TenantScoped,
                update: TenantScoped,
                delete: TenantScoped,
            },
            Self::Inventory | Self::Subscriptions | Self::StoreSettings | Self::ThemeConfig => {
                CollectionAccess {
                    create: Authenticated,
                    read: TenantScoped,
                    update: TenantScoped,
                    delete: AdminOnly,
                }
            }
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| format!("unknown collection '{s}'"))
    }
}

/// One registered collection as the host admin sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSpec {
    pub slug: String,
    pub use_as_title: String,
    pub default_columns: Vec<String>,
    /// Fields added on top of the collection's own schema.
    pub extra_fields: Vec<String>,
    /// `None` for host-owned collections the plugin does not govern.
    pub access: Option<CollectionAccess>,
    pub before_list: Vec<String>,
}

impl CollectionSpec {
    pub fn for_collection(collection: Collection) -> Self {
        Self {
            slug: collection.slug().to_string(),
            use_as_title: collection.title_field().to_string(),
            default_columns: collection
                .default_columns()
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
            extra_fields: Vec::new(),
            access: Some(collection.access()),
            before_list: Vec::new(),
        }
    }

    /// A collection that the host already defines.
    pub fn host(slug: impl Into<String>, use_as_title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            use_as_title: use_as_title.into(),
            default_columns: Vec::new(),
            extra_fields: Vec::new(),
            access: None,
            before_list: Vec::new(),
        }
    }

    fn with_fields(mut self, fields: &[String]) -> Self {
        self.extra_fields.extend(fields.iter().cloned());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminView {
    pub key: String,
    pub component: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminExtensions {
    pub before_dashboard: Vec<String>,
    pub before_nav_links: Vec<String>,
    pub views: Vec<AdminView>,
}

/// Everything the plugin registers with a host admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    pub collections: Vec<CollectionSpec>,
    /// Absent when the plugin is disabled.
    pub admin: Option<AdminExtensions>,
    /// Whether demo data is seeded on start-up.
    pub seed_on_init: bool,
}

impl PluginManifest {
    pub fn collection(&self, slug: &str) -> Option<&CollectionSpec> {
        self.collections.iter().find(|c| c.slug == slug)
    }

    pub fn slugs(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.slug.as_str()).collect()
    }
}

fn component(name: &str) -> String {
    format!("{COMPONENT_PREFIX}{name}")
}

/// Manifest for a host with no collections of its own.
pub fn build_manifest(config: &PluginConfig) -> PluginManifest {
    build_manifest_onto(config, Vec::new())
}

/// Append the commerce collections to `host_collections` and attach the
/// admin extensions.
pub fn build_manifest_onto(
    config: &PluginConfig,
    host_collections: Vec<CollectionSpec>,
) -> PluginManifest {
    let mut collections = host_collections;
    let variant_fields = &config.product_variant_fields;

    collections.push(CollectionSpec::for_collection(Collection::Tenants));
    ensure_tenant_aware_users(&mut collections);
    collections.push(CollectionSpec::for_collection(Collection::Products).with_fields(variant_fields));
    collections.push(CollectionSpec::for_collection(Collection::Orders));
    collections.push(CollectionSpec::for_collection(Collection::Customers));

    let optional = [
        (config.enable_digital_products, Collection::DigitalFiles),
        (config.enable_license_generation, Collection::Licenses),
        (config.enable_subscriptions, Collection::Subscriptions),
        (config.enable_inventory_tracking, Collection::Inventory),
    ];
    for (enabled, collection) in optional {
        if enabled {
            collections.push(CollectionSpec::for_collection(collection));
        }
    }

    collections.push(CollectionSpec::for_collection(Collection::Variants).with_fields(variant_fields));
    collections.push(CollectionSpec::for_collection(Collection::StoreSettings));
    collections.push(CollectionSpec::for_collection(Collection::ThemeConfig));

    if config.disabled {
        debug!("Plugin disabled, registering collections only");
        return PluginManifest {
            collections,
            admin: None,
            seed_on_init: false,
        };
    }

    for (slug, panel) in [("products", "ProductsBeforeList"), ("orders", "OrdersBeforeList")] {
        if let Some(spec) = collections.iter_mut().find(|c| c.slug == slug) {
            spec.before_list.push(component(panel));
        }
    }

    let views = [
        ("commerce-orders", "OrdersRoute", "/commerce/orders"),
        ("commerce-fulfillment", "FulfillmentRoute", "/commerce/fulfillment"),
        ("commerce-analytics", "AnalyticsRoute", "/commerce/analytics"),
        ("commerce-theme-builder", "ThemeBuilderRoute", "/commerce/theme-builder"),
    ]
    .into_iter()
    .map(|(key, name, path)| AdminView {
        key: key.to_string(),
        component: component(name),
        path: path.to_string(),
    })
    .collect();

    PluginManifest {
        collections,
        admin: Some(AdminExtensions {
            before_dashboard: vec![component("InventorySnapshot"), component("RevenueKPI")],
            before_nav_links: vec![component("TenantSwitcher")],
            views,
        }),
        seed_on_init: config.seed_demo_data,
    }
}

/// Make sure a `users` collection exists and carries `role` and `tenantId`.
pub fn ensure_tenant_aware_users(collections: &mut Vec<CollectionSpec>) {
    if let Some(users) = collections.iter_mut().find(|c| c.slug == "users") {
        for field in TENANT_USER_FIELDS {
            if !users.extra_fields.iter().any(|f| f == field) {
                users.extra_fields.push(field.to_string());
            }
        }
        return;
    }

    let mut users = CollectionSpec::for_collection(Collection::Users);
    users.extra_fields = TENANT_USER_FIELDS.iter().map(|f| (*f).to_string()).collect();
    collections.push(users);
}
