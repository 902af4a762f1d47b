//! Tenant, user, catalog and inventory queries.

use sqlx::types::Json;
use tracing::debug;

use super::{ScopedTable, StoreDatabase, new_id, or_default};
use crate::access::{AccessDecision, Role};
use crate::db::{DatabaseError, unix_timestamp};
use crate::hooks::{BeforeValidate, HookContext, inherit_product_price};
use crate::models::{
    InventoryRecord, NewInventory, NewProduct, NewTenant, NewVariant, Product, Tenant, User,
    Variant,
};

pub(super) fn require_tenant(tenant_id: Option<String>) -> Result<String, DatabaseError> {
    tenant_id
        .filter(|t| !t.is_empty())
        .ok_or(DatabaseError::MissingField("tenant_id"))
}

impl StoreDatabase {
    // =========================================================================
    // Tenant queries
    // =========================================================================

    /// Create a new tenant.
    pub async fn create_tenant(&self, draft: NewTenant) -> Result<Tenant, DatabaseError> {
        let id = new_id();
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO tenants (id, name, slug, domain, status, currency, timezone, payment_providers, theme, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&draft.name)
        .bind(&draft.slug)
        .bind(&draft.domain)
        .bind(or_default(draft.status, "active"))
        .bind(or_default(draft.currency, "USD"))
        .bind(or_default(draft.timezone, "America/New_York"))
        .bind(Json(&draft.payment_providers))
        .bind(Json(&draft.theme))
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        debug!(tenant_id = %id, slug = %draft.slug, "Tenant created");
        self.get_tenant(&id).await
    }

    /// Get a tenant by ID.
    pub async fn get_tenant(&self, id: &str) -> Result<Tenant, DatabaseError> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Tenant {id}")))
    }

    pub async fn find_tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE slug = ?")
                .bind(slug)
                .fetch_optional(self.pool())
                .await?,
        )
    }

    /// All tenants, oldest first. Tenants are publicly readable.
    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, Tenant>("SELECT * FROM tenants ORDER BY created_at, id")
                .fetch_all(self.pool())
                .await?,
        )
    }

    // =========================================================================
    // User queries
    // =========================================================================

    /// Create a new user.
    pub async fn create_user(
        &self,
        email: &str,
        role: Role,
        tenant_id: Option<&str>,
    ) -> Result<User, DatabaseError> {
        let id = new_id();
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO users (id, email, role, tenant_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(role.as_str())
        .bind(tenant_id)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_user(&id).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(self.pool())
                .await?,
        )
    }

    /// Link a user to a tenant.
    pub async fn assign_user_to_tenant(
        &self,
        user_id: &str,
        tenant_id: &str,
    ) -> Result<User, DatabaseError> {
        let result = sqlx::query("UPDATE users SET tenant_id = ?, updated_at = ? WHERE id = ?")
            .bind(tenant_id)
            .bind(unix_timestamp())
            .bind(user_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User {user_id}")));
        }
        debug!(user_id, tenant_id, "User assigned to tenant");
        self.get_user(user_id).await
    }

    // =========================================================================
    // Product queries
    // =========================================================================

    /// Run create hooks and insert a product.
    pub async fn create_product(
        &self,
        mut draft: NewProduct,
        ctx: &HookContext<'_>,
    ) -> Result<Product, DatabaseError> {
        draft.before_validate(ctx);
        let tenant_id = require_tenant(draft.tenant_id)?;
        let id = new_id();
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO products (id, tenant_id, name, slug, product_type, price, compare_at_price, status, sku, track_inventory, requires_shipping, description, metadata, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&tenant_id)
        .bind(&draft.name)
        .bind(&draft.slug)
        .bind(or_default(draft.product_type, "physical"))
        .bind(draft.price)
        .bind(draft.compare_at_price)
        .bind(or_default(draft.status, "draft"))
        .bind(&draft.sku)
        .bind(draft.track_inventory)
        .bind(draft.requires_shipping)
        .bind(&draft.description)
        .bind(Json(&draft.metadata))
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_product(&id).await
    }

    /// Get a product by ID.
    pub async fn get_product(&self, id: &str) -> Result<Product, DatabaseError> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Product {id}")))
    }

    pub async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = ?")
                .bind(slug)
                .fetch_optional(self.pool())
                .await?,
        )
    }

    pub async fn list_products(
        &self,
        decision: &AccessDecision,
    ) -> Result<Vec<Product>, DatabaseError> {
        self.fetch_scoped(ScopedTable::Products, decision).await
    }

    /// Number of products owned by `tenant_id`.
    pub async fn count_products(&self, tenant_id: &str) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Variant queries
    // =========================================================================

    /// Run create hooks and insert a variant. A missing price is taken from
    /// the parent product.
    pub async fn create_variant(
        &self,
        mut draft: NewVariant,
        ctx: &HookContext<'_>,
    ) -> Result<Variant, DatabaseError> {
        draft.before_validate(ctx);
        let product = self.get_product(&draft.product_id).await?;
        inherit_product_price(&mut draft, product.price);
        let tenant_id = require_tenant(draft.tenant_id)?;
        let price = draft.price.ok_or(DatabaseError::MissingField("price"))?;
        let id = new_id();

        sqlx::query(
            "INSERT INTO variants (id, tenant_id, product_id, name, sku, price, compare_at_price, stock, allow_backorder, status, options, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&tenant_id)
        .bind(&draft.product_id)
        .bind(&draft.name)
        .bind(&draft.sku)
        .bind(price)
        .bind(draft.compare_at_price)
        .bind(draft.stock)
        .bind(draft.allow_backorder)
        .bind(or_default(draft.status, "active"))
        .bind(Json(&draft.options))
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        self.get_variant(&id).await
    }

    pub async fn get_variant(&self, id: &str) -> Result<Variant, DatabaseError> {
        sqlx::query_as::<_, Variant>("SELECT * FROM variants WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Variant {id}")))
    }

    pub async fn list_variants(
        &self,
        decision: &AccessDecision,
    ) -> Result<Vec<Variant>, DatabaseError> {
        self.fetch_scoped(ScopedTable::Variants, decision).await
    }

    pub async fn variants_for_product(&self, product_id: &str) -> Result<Vec<Variant>, DatabaseError> {
        Ok(sqlx::query_as::<_, Variant>(
            "SELECT * FROM variants WHERE product_id = ? ORDER BY created_at, id",
        )
        .bind(product_id)
        .fetch_all(self.pool())
        .await?)
    }

    /// Overwrite a variant's price.
    pub async fn set_variant_price(&self, id: &str, price: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE variants SET price = ? WHERE id = ?")
            .bind(price.max(0))
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Variant {id}")));
        }
        Ok(())
    }

    // =========================================================================
    // Inventory queries
    // =========================================================================

    pub async fn create_inventory(
        &self,
        mut draft: NewInventory,
        ctx: &HookContext<'_>,
    ) -> Result<InventoryRecord, DatabaseError> {
        draft.before_validate(ctx);
        let tenant_id = require_tenant(draft.tenant_id)?;
        let id = new_id();
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO inventory (id, tenant_id, product_id, variant_id, sku, stock, threshold, warehouse, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&tenant_id)
        .bind(&draft.product_id)
        .bind(&draft.variant_id)
        .bind(&draft.sku)
        .bind(draft.stock)
        .bind(if draft.threshold > 0 { draft.threshold } else { 5 })
        .bind(&draft.warehouse)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_inventory(&id).await
    }

    pub async fn get_inventory(&self, id: &str) -> Result<InventoryRecord, DatabaseError> {
        sqlx::query_as::<_, InventoryRecord>("SELECT * FROM inventory WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Inventory {id}")))
    }

    pub async fn find_inventory_by_sku(
        &self,
        sku: &str,
    ) -> Result<Option<InventoryRecord>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, InventoryRecord>("SELECT * FROM inventory WHERE sku = ?")
                .bind(sku)
                .fetch_optional(self.pool())
                .await?,
        )
    }

    pub async fn list_inventory(
        &self,
        decision: &AccessDecision,
    ) -> Result<Vec<InventoryRecord>, DatabaseError> {
        self.fetch_scoped(ScopedTable::Inventory, decision).await
    }

    /// Add `delta` to the stock of the record with `sku`; stock never drops below zero.
    pub async fn adjust_stock(&self, sku: &str, delta: i64) -> Result<InventoryRecord, DatabaseError> {
        let result = sqlx::query(
            "UPDATE inventory SET stock = MAX(stock + ?, 0), updated_at = ? WHERE sku = ?",
        )
        .bind(delta)
        .bind(unix_timestamp())
        .bind(sku)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Inventory with SKU {sku}")));
        }
        self.find_inventory_by_sku(sku)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Inventory with SKU {sku}")))
    }
}
