//! Dashboard reports computed from orders, products and inventory.
//!
//! Every report first narrows its input to the explicit [`TenantContext`].
//! Amounts are minor units; averages round to the nearest cent.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{InventoryRecord, Order, OrderStatus, Product};
use crate::tenant::TenantContext;

/// Stock at or below this (but above zero) counts as low.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

const TOP_PRODUCTS: usize = 5;
const RECENT_ORDERS: usize = 10;
const SECONDS_PER_DAY: i64 = 86_400;

fn in_context<'a, T: crate::models::TenantOwned>(
    items: &'a [T],
    ctx: &'a TenantContext,
) -> impl Iterator<Item = &'a T> + 'a {
    items.iter().filter(move |item| ctx.includes(*item))
}

fn average(total: i64, count: usize) -> i64 {
    let Ok(count) = i64::try_from(count) else {
        return 0;
    };
    if count == 0 {
        return 0;
    }
    (total + count / 2).div_euclid(count)
}

fn is_completed(order: &Order) -> bool {
    matches!(
        order.order_status(),
        Some(OrderStatus::Paid | OrderStatus::Fulfilled)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueKpis {
    pub total_revenue: i64,
    pub average_order_value: i64,
    pub total_orders: usize,
    /// Orders with status `paid` or `fulfilled`.
    pub completed_orders: usize,
}

pub fn revenue_kpis(orders: &[Order], ctx: &TenantContext) -> RevenueKpis {
    let mut total_revenue = 0;
    let mut total_orders = 0;
    let mut completed_orders = 0;
    for order in in_context(orders, ctx) {
        total_revenue += order.total;
        total_orders += 1;
        if is_completed(order) {
            completed_orders += 1;
        }
    }
    RevenueKpis {
        total_revenue,
        average_order_value: average(total_revenue, total_orders),
        total_orders,
        completed_orders,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderStatusCounts {
    pub pending: usize,
    pub paid: usize,
    pub fulfilled: usize,
}

pub fn order_status_counts(orders: &[Order], ctx: &TenantContext) -> OrderStatusCounts {
    let mut counts = OrderStatusCounts::default();
    for order in in_context(orders, ctx) {
        match order.order_status() {
            Some(OrderStatus::Pending) => counts.pending += 1,
            Some(OrderStatus::Paid) => counts.paid += 1,
            Some(OrderStatus::Fulfilled) => counts.fulfilled += 1,
            _ => {}
        }
    }
    counts
}

/// Reporting window of the analytics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateRange {
    #[serde(rename = "7d")]
    Last7Days,
    #[default]
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
}

impl DateRange {
    pub const fn days(self) -> i64 {
        match self {
            Self::Last7Days => 7,
            Self::Last30Days => 30,
            Self::Last90Days => 90,
        }
    }

    /// Earliest `created_at` (unix seconds) inside the window ending at `now`.
    pub const fn cutoff(self, now: i64) -> i64 {
        now - self.days() * SECONDS_PER_DAY
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.days())
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(Self::Last7Days),
            "30d" => Ok(Self::Last30Days),
            "90d" => Ok(Self::Last90Days),
            other => Err(format!("unknown date range '{other}' (expected 7d, 30d or 90d)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub name: String,
    pub sales: i64,
    pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub order_number: String,
    pub created_at: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub range: String,
    pub total_revenue: i64,
    pub total_orders: usize,
    pub average_order_value: i64,
    pub top_products: Vec<ProductSales>,
    pub recent_orders: Vec<RecentOrder>,
}

/// Revenue, best sellers and latest orders within `range` before `now`.
pub fn analytics_report(
    orders: &[Order],
    products: &[Product],
    ctx: &TenantContext,
    range: DateRange,
    now: i64,
) -> AnalyticsReport {
    let cutoff = range.cutoff(now);
    let mut window: Vec<&Order> = in_context(orders, ctx)
        .filter(|order| order.created_at >= cutoff)
        .collect();

    let names: HashMap<&str, &str> = products
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str()))
        .collect();

    let total_revenue: i64 = window.iter().map(|o| o.total).sum();
    let mut by_product: HashMap<String, (i64, i64)> = HashMap::new();
    for item in window.iter().flat_map(|o| o.items.iter()) {
        let name = names
            .get(item.product_id.as_str())
            .map(|n| (*n).to_string())
            .or_else(|| item.name.clone().filter(|n| !n.is_empty()))
            .unwrap_or_else(|| "Unknown".to_string());
        let quantity = if item.quantity > 0 { item.quantity } else { 1 };
        let entry = by_product.entry(name).or_default();
        entry.0 += quantity;
        entry.1 += item.price * quantity;
    }

    let mut top_products: Vec<ProductSales> = by_product
        .into_iter()
        .map(|(name, (sales, revenue))| ProductSales {
            name,
            sales,
            revenue,
        })
        .collect();
    top_products.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
    top_products.truncate(TOP_PRODUCTS);

    window.sort_by_key(|o| Reverse(o.created_at));
    let total_orders = window.len();
    let recent_orders = window
        .iter()
        .take(RECENT_ORDERS)
        .map(|o| RecentOrder {
            order_number: o.order_number.clone(),
            created_at: o.created_at,
            total: o.total,
        })
        .collect();

    AnalyticsReport {
        range: range.to_string(),
        total_revenue,
        total_orders,
        average_order_value: average(total_revenue, total_orders),
        top_products,
        recent_orders,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub total_products: usize,
    /// Sum of product list prices.
    pub total_value: i64,
}

pub fn inventory_snapshot(
    products: &[Product],
    inventory: &[InventoryRecord],
    ctx: &TenantContext,
) -> InventorySnapshot {
    let mut snapshot = InventorySnapshot {
        low_stock: 0,
        out_of_stock: 0,
        total_products: 0,
        total_value: 0,
    };
    for record in in_context(inventory, ctx) {
        if record.stock == 0 {
            snapshot.out_of_stock += 1;
        } else if (1..=LOW_STOCK_THRESHOLD).contains(&record.stock) {
            snapshot.low_stock += 1;
        }
    }
    for product in in_context(products, ctx) {
        snapshot.total_products += 1;
        snapshot.total_value += product.price;
    }
    snapshot
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
    #[default]
    Pending,
    Packing,
    Shipped,
    Delivered,
}

impl FromStr for FulfillmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "packing" => Ok(Self::Packing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            other => Err(format!("unknown fulfillment status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentItem {
    pub sku: Option<String>,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentTask {
    pub order_id: String,
    pub order_number: String,
    pub created_at: i64,
    pub items: Vec<FulfillmentItem>,
    pub shipping_carrier: String,
    pub status: FulfillmentStatus,
    pub tracking_number: Option<String>,
}

/// Paid and fulfilled orders as packing tasks, optionally narrowed to one status.
pub fn fulfillment_queue(
    orders: &[Order],
    ctx: &TenantContext,
    only: Option<FulfillmentStatus>,
) -> Vec<FulfillmentTask> {
    in_context(orders, ctx)
        .filter(|order| is_completed(order))
        .map(|order| FulfillmentTask {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            created_at: order.created_at,
            items: order
                .items
                .iter()
                .map(|item| FulfillmentItem {
                    sku: item.sku.clone(),
                    quantity: item.quantity,
                })
                .collect(),
            shipping_carrier: order
                .shipping_carrier
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "Manual".to_string()),
            status: order
                .fulfillment_status
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            tracking_number: order.tracking_number.clone(),
        })
        .filter(|task| only.is_none_or(|status| task.status == status))
        .collect()
}
