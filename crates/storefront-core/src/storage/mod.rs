//! `SQLite` storage for commerce records.
//!
//! Provides persistence for tenants, users, catalog, inventory, customers,
//! orders, digital files, licenses and store settings. Listings take an
//! [`AccessDecision`](crate::access::AccessDecision) and push its filter
//! into the `WHERE` clause.

mod queries;
mod queries_orders;


use sqlx::sqlite::SqliteRow;

use crate::access::AccessDecision;
use crate::db::DatabaseError;

crate::define_database!(StoreDatabase, "Store database migrations complete");

/// Tables whose rows can be listed under an access decision.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ScopedTable {
    Products,
    Variants,
    Inventory,
    Customers,
    Orders,
    DigitalFiles,
    Licenses,
}

impl ScopedTable {
    const fn name(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Variants => "variants",
            Self::Inventory => "inventory",
            Self::Customers => "customers",
            Self::Orders => "orders",
            Self::DigitalFiles => "digital_files",
            Self::Licenses => "licenses",
        }
    }
}

impl StoreDatabase {
    /// `SELECT *` from `table`, narrowed by `decision`. `Deny` never hits the database.
    pub(crate) async fn fetch_scoped<T>(
        &self,
        table: ScopedTable,
        decision: &AccessDecision,
    ) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let filter = match decision {
            AccessDecision::Deny => return Ok(Vec::new()),
            AccessDecision::Allow => None,
            AccessDecision::Where(filter) => Some(filter),
        };

        let sql = filter.map_or_else(
            || format!("SELECT * FROM {} ORDER BY created_at, id", table.name()),
            |f| {
                format!(
                    "SELECT * FROM {} WHERE {} = ? ORDER BY created_at, id",
                    table.name(),
                    f.column()
                )
            },
        );

        let mut query = sqlx::query_as::<_, T>(&sql);
        if let Some(filter) = filter {
            query = query.bind(filter.value());
        }
        Ok(query.fetch_all(self.pool()).await?)
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn or_default(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}
