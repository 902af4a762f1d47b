//! Dashboard reports: revenue, order counts, inventory, analytics, fulfillment.
//!
//! Reports are computed over everything the operator can see, narrowed to one
//! tenant with `--tenant <slug>`.

use serde_json::Value;
use storefront_core::analytics::{
    DateRange, FulfillmentStatus, analytics_report, fulfillment_queue, inventory_snapshot,
    order_status_counts, revenue_kpis,
};
use storefront_core::db::unix_timestamp;
use storefront_core::{StoreDatabase, TenantContext};

use crate::output::{print_json, tenant_context};

/// Report subcommand actions.
#[derive(clap::Subcommand, Debug, Clone, Copy)]
pub enum ReportAction {
    /// Total revenue, order count and average order value.
    Revenue,
    /// Order counts per status.
    Orders,
    /// Low-stock and out-of-stock counts.
    Inventory,
    /// Revenue, best sellers and recent orders within a window.
    Analytics {
        /// Window: 7d, 30d or 90d.
        #[arg(long, default_value = "30d")]
        range: DateRange,
    },
    /// Paid orders waiting to be packed or shipped.
    Fulfillment {
        /// Only tasks in this state: pending, packing, shipped, delivered.
        #[arg(long)]
        status: Option<FulfillmentStatus>,
    },
}

/// Build the report for `action` as JSON.
pub async fn build(
    db: &StoreDatabase,
    action: ReportAction,
    ctx: &TenantContext,
    now: i64,
) -> anyhow::Result<Value> {
    let decision = ctx.as_decision();
    let value = match action {
        ReportAction::Revenue => {
            serde_json::to_value(revenue_kpis(&db.list_orders(&decision).await?, ctx))?
        }
        ReportAction::Orders => {
            serde_json::to_value(order_status_counts(&db.list_orders(&decision).await?, ctx))?
        }
        ReportAction::Inventory => {
            let products = db.list_products(&decision).await?;
            let inventory = db.list_inventory(&decision).await?;
            serde_json::to_value(inventory_snapshot(&products, &inventory, ctx))?
        }
        ReportAction::Analytics { range } => {
            let orders = db.list_orders(&decision).await?;
            let products = db.list_products(&decision).await?;
            serde_json::to_value(analytics_report(&orders, &products, ctx, range, now))?
        }
        ReportAction::Fulfillment { status } => {
            serde_json::to_value(fulfillment_queue(&db.list_orders(&decision).await?, ctx, status))?
        }
    };
    Ok(value)
}

/// Execute a report subcommand.
pub async fn run(db: &StoreDatabase, action: ReportAction, tenant: Option<&str>) -> anyhow::Result<()> {
    let ctx = tenant_context(db, tenant).await?;
    tracing::debug!(?action, tenant = ?ctx.current(), "Building report");
    print_json(&build(db, action, &ctx, unix_timestamp()).await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storefront_core::access::{Principal, Role};
    use storefront_core::hooks::HookContext;
    use storefront_core::models::{NewCustomer, NewOrder, OrderItem, OrderStatus};
    use storefront_core::seed::{SeedOptions, seed_demo_data};

    use super::*;

    async fn seeded() -> (StoreDatabase, String) {
        let db = StoreDatabase::open_in_memory().await.unwrap();
        let report = seed_demo_data(&db, &SeedOptions::default()).await.unwrap();
        (db, report.tenant_id)
    }

    async fn place_order(db: &StoreDatabase, tenant_id: &str, total: i64, status: OrderStatus) {
        let principal = Principal::new("m", Role::Manager, Some(tenant_id.to_string()));
        let ctx = HookContext::create(Some(&principal), 0);
        let email = format!("buyer-{total}@x.io");
        let customer = db
            .create_customer(
                NewCustomer {
                    email: email.clone(),
                    ..Default::default()
                },
                &ctx,
            )
            .await
            .unwrap();
        db.create_order(
            NewOrder {
                customer_id: customer.id,
                customer_email: email,
                items: vec![OrderItem {
                    product_id: "p".to_string(),
                    name: Some("Widget".to_string()),
                    variant: None,
                    sku: Some("W-1".to_string()),
                    quantity: 1,
                    price: total,
                    total,
                }],
                status,
                ..Default::default()
            },
            &ctx,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn revenue_covers_every_order() {
        let (db, tenant) = seeded().await;
        place_order(&db, &tenant, 1000, OrderStatus::Paid).await;
        place_order(&db, &tenant, 3000, OrderStatus::Fulfilled).await;
        place_order(&db, &tenant, 9900, OrderStatus::Pending).await;

        let value = build(&db, ReportAction::Revenue, &TenantContext::all(), unix_timestamp())
            .await
            .unwrap();
        assert_eq!(value["totalRevenue"], 13_900);
        assert_eq!(value["totalOrders"], 3);
        assert_eq!(value["completedOrders"], 2);
    }

    #[tokio::test]
    async fn inventory_report_sees_seeded_stock() {
        let (db, tenant) = seeded().await;
        let value = build(
            &db,
            ReportAction::Inventory,
            &TenantContext::for_tenant(tenant),
            unix_timestamp(),
        )
        .await
        .unwrap();
        assert_eq!(value["totalProducts"], 5);
        assert_eq!(value["outOfStock"], 0);
        assert_eq!(value["lowStock"], 0);
    }

    #[tokio::test]
    async fn other_tenant_sees_nothing() {
        let (db, tenant) = seeded().await;
        place_order(&db, &tenant, 1000, OrderStatus::Paid).await;
        let value = build(
            &db,
            ReportAction::Fulfillment { status: None },
            &TenantContext::for_tenant("someone-else"),
            unix_timestamp(),
        )
        .await
        .unwrap();
        assert_eq!(value, serde_json::json!([]));
    }

    #[tokio::test]
    async fn fulfillment_lists_paid_orders() {
        let (db, tenant) = seeded().await;
        place_order(&db, &tenant, 1000, OrderStatus::Paid).await;
        place_order(&db, &tenant, 2000, OrderStatus::Pending).await;
        let value = build(
            &db,
            ReportAction::Fulfillment {
                status: Some(FulfillmentStatus::Pending),
            },
            &TenantContext::all(),
            unix_timestamp(),
        )
        .await
        .unwrap();
        let tasks = value.as_array().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0]["items"][0]["sku"], "W-1");
    }
}
