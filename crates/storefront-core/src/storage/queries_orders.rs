//! Customer, order, digital delivery and store settings queries.

use sqlx::types::Json;
use tracing::{debug, info};

use super::queries::require_tenant;
use super::{ScopedTable, StoreDatabase, new_id, or_default};
use crate::access::AccessDecision;
use crate::db::{DatabaseError, unix_timestamp};
use crate::hooks::{BeforeValidate, HookContext};
use crate::models::{
    Customer, DigitalFile, License, NewCustomer, NewDigitalFile, NewLicense, NewOrder,
    NewStoreSettings, Order, OrderStatus, StoreSettings,
};

impl StoreDatabase {
    // =========================================================================
    // Customer queries
    // =========================================================================

    pub async fn create_customer(
        &self,
        mut draft: NewCustomer,
        ctx: &HookContext<'_>,
    ) -> Result<Customer, DatabaseError> {
        draft.before_validate(ctx);
        let tenant_id = require_tenant(draft.tenant_id)?;
        let id = new_id();

        sqlx::query(
            "INSERT INTO customers (id, tenant_id, email, first_name, last_name, phone, addresses, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&tenant_id)
        .bind(&draft.email)
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.phone)
        .bind(Json(&draft.addresses))
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        self.get_customer(&id).await
    }

    pub async fn get_customer(&self, id: &str) -> Result<Customer, DatabaseError> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Customer {id}")))
    }

    pub async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Customer>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE email = ?")
                .bind(email)
                .fetch_optional(self.pool())
                .await?,
        )
    }

    pub async fn list_customers(
        &self,
        decision: &AccessDecision,
    ) -> Result<Vec<Customer>, DatabaseError> {
        self.fetch_scoped(ScopedTable::Customers, decision).await
    }

    // =========================================================================
    // Order queries
    // =========================================================================

    /// Run create hooks (tenant, order number) and insert an order.
    /// Subtotal and total are computed from the line items, each of which
    /// must have a quantity of at least 1.
    pub async fn create_order(
        &self,
        mut draft: NewOrder,
        ctx: &HookContext<'_>,
    ) -> Result<Order, DatabaseError> {
        draft.before_validate(ctx);
        if let Some(item) = draft.items.iter().find(|item| item.quantity < 1) {
            return Err(DatabaseError::Invalid(format!(
                "quantity {} for product {} must be at least 1",
                item.quantity, item.product_id
            )));
        }
        let subtotal = draft.subtotal();
        let total = draft.total();
        let tenant_id = require_tenant(draft.tenant_id)?;
        let order_number = draft
            .order_number
            .ok_or(DatabaseError::MissingField("order_number"))?;
        let id = new_id();

        sqlx::query(
            "INSERT INTO orders (id, tenant_id, order_number, customer_id, customer_email, items, subtotal, tax, shipping, discount, total, currency, status, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&tenant_id)
        .bind(&order_number)
        .bind(&draft.customer_id)
        .bind(&draft.customer_email)
        .bind(Json(&draft.items))
        .bind(subtotal)
        .bind(draft.tax)
        .bind(draft.shipping)
        .bind(draft.discount)
        .bind(total)
        .bind(or_default(draft.currency, "USD"))
        .bind(draft.status.as_str())
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        info!(order_id = %id, %order_number, total, "Order created");
        self.get_order(&id).await
    }

    pub async fn get_order(&self, id: &str) -> Result<Order, DatabaseError> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Order {id}")))
    }

    pub async fn list_orders(&self, decision: &AccessDecision) -> Result<Vec<Order>, DatabaseError> {
        self.fetch_scoped(ScopedTable::Orders, decision).await
    }

    pub async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<Order, DatabaseError> {
        let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Order {id}")));
        }
        debug!(order_id = id, status = status.as_str(), "Order status updated");
        self.get_order(id).await
    }

    /// Record fulfillment progress. `None` leaves a column unchanged.
    pub async fn update_fulfillment(
        &self,
        id: &str,
        fulfillment_status: &str,
        carrier: Option<&str>,
        tracking_number: Option<&str>,
    ) -> Result<Order, DatabaseError> {
        let result = sqlx::query(
            "UPDATE orders SET fulfillment_status = ?, shipping_carrier = COALESCE(?, shipping_carrier), tracking_number = COALESCE(?, tracking_number) WHERE id = ?",
        )
        .bind(fulfillment_status)
        .bind(carrier)
        .bind(tracking_number)
        .bind(id)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Order {id}")));
        }
        self.get_order(id).await
    }

    // =========================================================================
    // Digital file queries
    // =========================================================================

    pub async fn create_digital_file(
        &self,
        mut draft: NewDigitalFile,
        ctx: &HookContext<'_>,
    ) -> Result<DigitalFile, DatabaseError> {
        draft.before_validate(ctx);
        let tenant_id = require_tenant(draft.tenant_id)?;
        let id = new_id();

        sqlx::query(
            "INSERT INTO digital_files (id, tenant_id, name, product_id, file_key, file_url, download_limit, expiry_days, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&tenant_id)
        .bind(&draft.name)
        .bind(&draft.product_id)
        .bind(&draft.file_key)
        .bind(&draft.file_url)
        .bind(draft.download_limit.max(0))
        .bind(if draft.expiry_days > 0 { draft.expiry_days } else { 30 })
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        self.get_digital_file(&id).await
    }

    pub async fn get_digital_file(&self, id: &str) -> Result<DigitalFile, DatabaseError> {
        sqlx::query_as::<_, DigitalFile>("SELECT * FROM digital_files WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Digital file {id}")))
    }

    pub async fn list_digital_files(
        &self,
        decision: &AccessDecision,
    ) -> Result<Vec<DigitalFile>, DatabaseError> {
        self.fetch_scoped(ScopedTable::DigitalFiles, decision).await
    }

    // =========================================================================
    // License queries
    // =========================================================================

    /// Run create hooks (tenant, license key) and insert a license.
    pub async fn create_license(
        &self,
        mut draft: NewLicense,
        ctx: &HookContext<'_>,
    ) -> Result<License, DatabaseError> {
        draft.before_validate(ctx);
        let tenant_id = require_tenant(draft.tenant_id)?;
        let license_key = draft
            .license_key
            .ok_or(DatabaseError::MissingField("license_key"))?;
        let id = new_id();

        sqlx::query(
            "INSERT INTO licenses (id, tenant_id, order_id, product_id, customer_id, license_key, activation_limit, expires_at, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&tenant_id)
        .bind(&draft.order_id)
        .bind(&draft.product_id)
        .bind(&draft.customer_id)
        .bind(&license_key)
        .bind(draft.activation_limit.max(1))
        .bind(draft.expires_at)
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        self.find_license_by_key(&license_key)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("License {license_key}")))
    }

    pub async fn find_license_by_key(&self, key: &str) -> Result<Option<License>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, License>("SELECT * FROM licenses WHERE license_key = ?")
                .bind(key)
                .fetch_optional(self.pool())
                .await?,
        )
    }

    pub async fn list_licenses(
        &self,
        decision: &AccessDecision,
    ) -> Result<Vec<License>, DatabaseError> {
        self.fetch_scoped(ScopedTable::Licenses, decision).await
    }

    /// Count one activation against an active license. Returns `false` when the
    /// license is unknown, inactive, expired or out of activations.
    pub async fn activate_license(&self, key: &str) -> Result<bool, DatabaseError> {
        self.activate_license_at(key, unix_timestamp()).await
    }

    /// [`activate_license`](Self::activate_license) with an explicit clock
    /// (unix seconds). A license expires at `expires_at`.
    pub async fn activate_license_at(&self, key: &str, now: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE licenses SET activation_count = activation_count + 1 WHERE license_key = ? AND status = 'active' AND activation_count < activation_limit AND (expires_at IS NULL OR expires_at > ?)",
        )
        .bind(key)
        .bind(now)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Store settings queries
    // =========================================================================

    pub async fn create_store_settings(
        &self,
        draft: NewStoreSettings,
    ) -> Result<StoreSettings, DatabaseError> {
        let id = new_id();

        sqlx::query(
            "INSERT INTO store_settings (id, tenant_id, theme, default_currency, default_locale, signed_url_ttl_secs, storage_adapter, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&draft.tenant_id)
        .bind(Json(&draft.theme))
        .bind(or_default(draft.default_currency, "USD"))
        .bind(or_default(draft.default_locale, "en-US"))
        .bind(if draft.signed_url_ttl_secs > 0 { draft.signed_url_ttl_secs } else { 600 })
        .bind(or_default(draft.storage_adapter, "s3"))
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        self.find_store_settings(&draft.tenant_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Store settings for {}", draft.tenant_id)))
    }

    pub async fn find_store_settings(
        &self,
        tenant_id: &str,
    ) -> Result<Option<StoreSettings>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, StoreSettings>("SELECT * FROM store_settings WHERE tenant_id = ?")
                .bind(tenant_id)
                .fetch_optional(self.pool())
                .await?,
        )
    }
}
