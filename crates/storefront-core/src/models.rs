//! Commerce records as stored in `SQLite`.
//!
//! Money is integer minor units (cents). JSON columns are decoded through
//! `sqlx::types::Json`.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::catalog::VariantOption;
use crate::config::ThemeDefaults;

/// Records that belong to exactly one tenant.
pub trait TenantOwned {
    fn tenant_id(&self) -> &str;

    /// Publication status, for collections that expose one to anonymous readers.
    fn status(&self) -> Option<&str> {
        None
    }
}

macro_rules! tenant_owned {
    (status: $($ty:ty),+ $(,)?) => {
        $(impl TenantOwned for $ty {
            fn tenant_id(&self) -> &str {
                &self.tenant_id
            }

            fn status(&self) -> Option<&str> {
                Some(&self.status)
            }
        })+
    };
    ($($ty:ty),+ $(,)?) => {
        $(impl TenantOwned for $ty {
            fn tenant_id(&self) -> &str {
                &self.tenant_id
            }
        })+
    };
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
    pub status: String,
    pub currency: String,
    pub timezone: String,
    pub payment_providers: Json<Vec<String>>,
    pub theme: Json<ThemeDefaults>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: String,
    pub tenant_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub slug: String,
    pub product_type: String,
    pub price: i64,
    pub compare_at_price: Option<i64>,
    pub status: String,
    pub sku: Option<String>,
    pub track_inventory: bool,
    pub requires_shipping: bool,
    pub description: String,
    pub metadata: Json<serde_json::Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Variant {
    pub id: String,
    pub tenant_id: String,
    pub product_id: String,
    pub name: String,
    pub sku: String,
    pub price: i64,
    pub compare_at_price: Option<i64>,
    pub stock: i64,
    pub allow_backorder: bool,
    pub status: String,
    pub options: Json<Vec<VariantOption>>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InventoryRecord {
    pub id: String,
    pub tenant_id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub sku: String,
    pub stock: i64,
    pub backorder: i64,
    pub incoming: i64,
    pub threshold: i64,
    pub warehouse: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Whether an address is used for shipping, billing or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    Shipping,
    Billing,
    #[default]
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub address_type: AddressType,
    #[serde(default)]
    pub is_default: bool,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: String,
    pub tenant_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub addresses: Json<Vec<Address>>,
    pub created_at: i64,
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Paid,
    Fulfilled,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Paid => "paid",
            Self::Fulfilled => "fulfilled",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "paid" => Ok(Self::Paid),
            "fulfilled" => Ok(Self::Fulfilled),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    /// Product name at the time of purchase.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: i64,
    pub price: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: String,
    pub tenant_id: String,
    pub order_number: String,
    pub customer_id: String,
    pub customer_email: String,
    pub items: Json<Vec<OrderItem>>,
    pub subtotal: i64,
    pub tax: i64,
    pub shipping: i64,
    pub discount: i64,
    pub total: i64,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
    pub fulfillment_status: Option<String>,
    pub shipping_carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: i64,
}

impl Order {
    /// Parsed status; unknown values read as `None`.
    pub fn order_status(&self) -> Option<OrderStatus> {
        self.status.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DigitalFile {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub product_id: Option<String>,
    pub file_key: Option<String>,
    pub file_url: Option<String>,
    pub version: String,
    /// Max downloads per purchase, 0 = unlimited.
    pub download_limit: i64,
    /// Days until the download link expires, 0 = never.
    pub expiry_days: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct License {
    pub id: String,
    pub tenant_id: String,
    pub order_id: String,
    pub product_id: String,
    pub customer_id: String,
    pub license_key: String,
    pub status: String,
    pub activation_count: i64,
    pub activation_limit: i64,
    pub expires_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoreSettings {
    pub id: String,
    pub tenant_id: String,
    pub theme: Json<ThemeDefaults>,
    pub default_currency: String,
    pub default_locale: String,
    pub signed_url_ttl_secs: i64,
    pub storage_adapter: String,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub created_at: i64,
}

tenant_owned!(
    InventoryRecord,
    Customer,
    Order,
    DigitalFile,
    License,
    StoreSettings,
);
tenant_owned!(status: Product, Variant);

// =========================================================================
// Drafts for inserts. `tenant_id` stays optional until the before-validate
// hooks have run; the store rejects drafts that still lack one.
// =========================================================================

#[derive(Debug, Clone, Default)]
pub struct NewTenant {
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
    pub status: String,
    pub currency: String,
    pub timezone: String,
    pub payment_providers: Vec<String>,
    pub theme: ThemeDefaults,
}

impl NewTenant {
    /// An active USD tenant on Stripe with the given theme.
    pub fn new(name: impl Into<String>, slug: impl Into<String>, theme: ThemeDefaults) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            domain: None,
            status: "active".to_string(),
            currency: "USD".to_string(),
            timezone: "America/New_York".to_string(),
            payment_providers: vec!["stripe".to_string()],
            theme,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub tenant_id: Option<String>,
    pub name: String,
    pub slug: String,
    pub product_type: String,
    pub price: i64,
    pub compare_at_price: Option<i64>,
    pub status: String,
    pub sku: Option<String>,
    pub track_inventory: bool,
    pub requires_shipping: bool,
    pub description: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Default)]
pub struct NewVariant {
    pub tenant_id: Option<String>,
    pub product_id: String,
    pub name: String,
    pub sku: String,
    pub price: Option<i64>,
    pub compare_at_price: Option<i64>,
    pub stock: i64,
    pub allow_backorder: bool,
    pub status: String,
    pub options: Vec<VariantOption>,
}

#[derive(Debug, Clone, Default)]
pub struct NewInventory {
    pub tenant_id: Option<String>,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub sku: String,
    pub stock: i64,
    pub threshold: i64,
    pub warehouse: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub tenant_id: Option<String>,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub addresses: Vec<Address>,
}

#[derive(Debug, Clone, Default)]
pub struct NewOrder {
    pub tenant_id: Option<String>,
    pub order_number: Option<String>,
    pub customer_id: String,
    pub customer_email: String,
    pub items: Vec<OrderItem>,
    pub tax: i64,
    pub shipping: i64,
    pub discount: i64,
    pub currency: String,
    pub status: OrderStatus,
}

impl NewOrder {
    pub fn subtotal(&self) -> i64 {
        self.items.iter().map(|item| item.total).sum()
    }

    pub fn total(&self) -> i64 {
        (self.subtotal() + self.tax + self.shipping - self.discount).max(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewDigitalFile {
    pub tenant_id: Option<String>,
    pub name: String,
    pub product_id: Option<String>,
    pub file_key: Option<String>,
    pub file_url: Option<String>,
    pub download_limit: i64,
    pub expiry_days: i64,
}

#[derive(Debug, Clone, Default)]
pub struct NewLicense {
    pub tenant_id: Option<String>,
    pub order_id: String,
    pub product_id: String,
    pub customer_id: String,
    pub license_key: Option<String>,
    pub activation_limit: i64,
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct NewStoreSettings {
    pub tenant_id: String,
    pub theme: ThemeDefaults,
    pub default_currency: String,
    pub default_locale: String,
    pub signed_url_ttl_secs: i64,
    pub storage_adapter: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(total: i64) -> OrderItem {
        OrderItem {
            product_id: "p".to_string(),
            name: None,
            variant: None,
            sku: None,
            quantity: 1,
            price: total,
            total,
        }
    }

    #[test]
    fn order_totals_add_up() {
        let order = NewOrder {
            items: vec![item(1000), item(550)],
            tax: 100,
            shipping: 500,
            discount: 200,
            ..Default::default()
        };
        assert_eq!(order.subtotal(), 1550);
        assert_eq!(order.total(), 1950);
    }

    #[test]
    fn order_total_never_negative() {
        let order = NewOrder {
            items: vec![item(100)],
            discount: 1000,
            ..Default::default()
        };
        assert_eq!(order.total(), 0);
    }

    #[test]
    fn order_status_round_trips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Fulfilled,
            OrderStatus::Refunded,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn address_accepts_camel_case_json() {
        let addr: Address = serde_json::from_str(
            r#"{"type":"shipping","isDefault":true,"line1":"1 Main","city":"NYC","postalCode":"10001","country":"US"}"#,
        )
        .unwrap();
        assert_eq!(addr.address_type, AddressType::Shipping);
        assert!(addr.is_default);
        assert_eq!(addr.postal_code, "10001");
    }
}
