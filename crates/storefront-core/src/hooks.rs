//! Before-validate hooks run on drafts before they are inserted.
//!
//! Hooks run when a record is created. They fill in what the caller may leave out:
//! the tenant, order numbers, license keys and inherited variant prices.

use storefront_crypto::{generate_license_key, random_base36};

use crate::access::Principal;
use crate::models::{
    NewCustomer, NewDigitalFile, NewInventory, NewLicense, NewOrder, NewProduct, NewVariant,
};

/// Length of the random suffix of an order number.
pub const ORDER_SUFFIX_LEN: usize = 9;

/// Who is creating a record, and when.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub principal: Option<&'a Principal>,
    pub now_ms: i64,
}

impl<'a> HookContext<'a> {
    pub const fn create(principal: Option<&'a Principal>, now_ms: i64) -> Self {
        Self { principal, now_ms }
    }
}

/// A draft that carries an optional tenant until hooks have run.
pub trait TenantDraft {
    fn tenant_slot(&mut self) -> &mut Option<String>;
}

pub trait BeforeValidate: TenantDraft {
    fn before_validate(&mut self, ctx: &HookContext<'_>) {
        assign_tenant(self, ctx);
    }
}

macro_rules! tenant_draft {
    ($($ty:ty),+ $(,)?) => {
        $(impl TenantDraft for $ty {
            fn tenant_slot(&mut self) -> &mut Option<String> {
                &mut self.tenant_id
            }
        })+
    };
}

tenant_draft!(
    NewProduct,
    NewVariant,
    NewInventory,
    NewCustomer,
    NewOrder,
    NewDigitalFile,
    NewLicense,
);

impl BeforeValidate for NewProduct {}
impl BeforeValidate for NewVariant {}
impl BeforeValidate for NewInventory {}
impl BeforeValidate for NewCustomer {}
impl BeforeValidate for NewDigitalFile {}

impl BeforeValidate for NewOrder {
    fn before_validate(&mut self, ctx: &HookContext<'_>) {
        assign_tenant(self, ctx);
        if self.order_number.as_deref().is_none_or(str::is_empty) {
            self.order_number = Some(order_number(ctx.now_ms));
        }
    }
}

impl BeforeValidate for NewLicense {
    fn before_validate(&mut self, ctx: &HookContext<'_>) {
        assign_tenant(self, ctx);
        if self.license_key.as_deref().is_none_or(str::is_empty) {
            self.license_key = Some(generate_license_key());
        }
    }
}

/// Give the draft the caller's tenant when it has none.
pub fn assign_tenant<D: TenantDraft + ?Sized>(draft: &mut D, ctx: &HookContext<'_>) {
    let slot = draft.tenant_slot();
    if slot.as_deref().is_some_and(|t| !t.is_empty()) {
        return;
    }
    if let Some(tenant) = ctx.principal.and_then(|p| p.tenant_id.clone()) {
        *slot = Some(tenant);
    }
}

/// `ORD-<unix millis>-<9 lowercase base36 chars>`.
pub fn order_number(now_ms: i64) -> String {
    format!("ORD-{now_ms}-{}", random_base36(ORDER_SUFFIX_LEN))
}

/// A variant without a price inherits its product's price, when that is set.
pub fn inherit_product_price(draft: &mut NewVariant, product_price: i64) {
    if draft.price.is_none() && product_price != 0 {
        draft.price = Some(product_price);
    }
}
