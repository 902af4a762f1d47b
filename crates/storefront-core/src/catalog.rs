//! Product variant helpers: option matrices, blank variants and bulk pricing.

use serde::{Deserialize, Serialize};

use crate::models::NewVariant;

/// One `key=value` option of a variant, e.g. `size=M`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOption {
    pub key: String,
    pub value: String,
}

impl VariantOption {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An option axis and its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub key: String,
    pub values: Vec<String>,
}

impl OptionGroup {
    pub fn new(key: &str, values: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            values: values.iter().map(|v| (*v).to_string()).collect(),
        }
    }
}

/// Size S/M/L/XL by colour Black/White/Gray.
pub fn default_option_groups() -> Vec<OptionGroup> {
    vec![
        OptionGroup::new("size", &["S", "M", "L", "XL"]),
        OptionGroup::new("color", &["Black", "White", "Gray"]),
    ]
}

/// A variant being edited before it is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDraft {
    pub name: String,
    pub sku: String,
    pub price: i64,
    pub stock: i64,
    pub options: Vec<VariantOption>,
}

impl VariantDraft {
    pub fn into_new_variant(self, product_id: &str, tenant_id: Option<String>) -> NewVariant {
        NewVariant {
            tenant_id,
            product_id: product_id.to_string(),
            name: self.name,
            sku: self.sku,
            price: Some(self.price),
            stock: self.stock,
            status: "active".to_string(),
            options: self.options,
            ..NewVariant::default()
        }
    }
}

/// One draft per combination of `groups`, first group varying slowest.
///
/// An empty group list yields no variants.
pub fn generate_variants(groups: &[OptionGroup], base_price: i64) -> Vec<VariantDraft> {
    if groups.is_empty() {
        return Vec::new();
    }

    let mut combos: Vec<Vec<VariantOption>> = vec![Vec::new()];
    for group in groups {
        let key = group.key.as_str();
        let values = group.values.as_slice();
        combos = combos
            .into_iter()
            .flat_map(|prefix| {
                values.iter().map(move |value| {
                    let mut next = prefix.clone();
                    next.push(VariantOption::new(key, value.as_str()));
                    next
                })
            })
            .collect();
    }

    combos
        .into_iter()
        .map(|options| {
            let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
            VariantDraft {
                name: values.join(" - "),
                sku: variant_sku(&values),
                price: base_price,
                stock: 0,
                options,
            }
        })
        .collect()
}

fn variant_sku(values: &[&str]) -> String {
    let raw = format!("VAR-{}", values.join("-")).to_uppercase();
    raw.split_whitespace().collect::<Vec<_>>().join("-")
}

/// An empty variant at the product's base price.
pub fn blank_variant(base_price: i64, now_ms: i64) -> VariantDraft {
    VariantDraft {
        name: "New Variant".to_string(),
        sku: format!("VAR-{now_ms}"),
        price: base_price,
        stock: 0,
        options: Vec::new(),
    }
}

/// `price * (1 + percentage / 100)`, rounded to the nearest cent, floored at 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn adjust_price(price: i64, percentage: f64) -> i64 {
    let adjusted = (price as f64 * (1.0 + percentage / 100.0)).round();
    if adjusted.is_nan() || adjusted <= 0.0 {
        0
    } else {
        adjusted as i64
    }
}

pub fn bulk_adjust_prices(variants: &mut [VariantDraft], percentage: f64) {
    for variant in variants {
        variant.price = adjust_price(variant.price, percentage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_groups_yield_twelve_variants() {
        let variants = generate_variants(&default_option_groups(), 2500);
        assert_eq!(variants.len(), 12);
        assert_eq!(variants[0].name, "S - Black");
        assert_eq!(variants[0].sku, "VAR-S-BLACK");
        assert_eq!(variants[11].name, "XL - Gray");
        assert_eq!(variants[11].sku, "VAR-XL-GRAY");
        assert!(variants.iter().all(|v| v.price == 2500 && v.stock == 0));
        assert_eq!(
            variants[1].options,
            vec![VariantOption::new("size", "S"), VariantOption::new("color", "White")]
        );
    }

    #[test]
    fn sku_replaces_whitespace_runs() {
        let groups = vec![OptionGroup::new("color", &["Navy  Blue", "Off White"])];
        let variants = generate_variants(&groups, 0);
        assert_eq!(variants[0].sku, "VAR-NAVY-BLUE");
        assert_eq!(variants[1].sku, "VAR-OFF-WHITE");
        assert_eq!(variants[1].name, "Off White");
    }

    #[test]
    fn three_groups_multiply() {
        let mut groups = default_option_groups();
        groups.push(OptionGroup::new("fit", &["Slim", "Regular"]));
        assert_eq!(generate_variants(&groups, 100).len(), 24);
        assert!(generate_variants(&[], 100).is_empty());
        assert!(generate_variants(&[OptionGroup::new("x", &[])], 100).is_empty());
    }

    #[test]
    fn blank_variant_uses_timestamp_sku() {
        let v = blank_variant(1999, 1_760_000_000_123);
        assert_eq!(v.name, "New Variant");
        assert_eq!(v.sku, "VAR-1760000000123");
        assert_eq!(v.price, 1999);
        assert!(v.options.is_empty());
    }

    #[test]
    fn bulk_price_adjustment_rounds_and_floors() {
        let mut variants = generate_variants(&[OptionGroup::new("size", &["S", "M"])], 2999);
        bulk_adjust_prices(&mut variants, 10.0);
        assert!(variants.iter().all(|v| v.price == 3299));
        bulk_adjust_prices(&mut variants, -150.0);
        assert!(variants.iter().all(|v| v.price == 0));
        assert_eq!(adjust_price(1000, -12.5), 875);
        assert_eq!(adjust_price(1000, f64::NAN), 0);
    }

    #[test]
    fn draft_becomes_active_variant_without_explicit_tenant() {
        let draft = blank_variant(500, 1);
        let new = draft.into_new_variant("prod-1", None);
        assert_eq!(new.product_id, "prod-1");
        assert_eq!(new.price, Some(500));
        assert_eq!(new.status, "active");
        assert!(new.tenant_id.is_none());
    }
}
