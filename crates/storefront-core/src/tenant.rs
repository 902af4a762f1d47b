//! Tenant resolution and the explicit "current tenant" context.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::access::{AccessDecision, Filter};
use crate::error::{Error, Result};
use crate::models::{Tenant, TenantOwned};

/// How an incoming request is mapped to a tenant slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "mode",
    rename_all = "lowercase",
    rename_all_fields = "camelCase"
)]
pub enum TenantStrategy {
    /// `acme.shop.example` resolves to `acme`.
    Subdomain {
        #[serde(default)]
        primary_domain: Option<String>,
        #[serde(default)]
        fallback_tenant_slug: Option<String>,
    },
    /// The tenant slug is carried in a request header.
    Header { header_name: String },
    /// `/<segment>/<slug>/...`, or the first path component without a segment.
    Path {
        #[serde(default)]
        segment: Option<String>,
    },
}

impl Default for TenantStrategy {
    fn default() -> Self {
        Self::Subdomain {
            primary_domain: None,
            fallback_tenant_slug: Some("default".to_string()),
        }
    }
}

/// The parts of an HTTP request that tenant resolution looks at.
#[derive(Debug, Clone, Default)]
pub struct TenantRequest {
    pub host: Option<String>,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl TenantRequest {
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }
}

impl TenantStrategy {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Header { header_name } if header_name.trim().is_empty() => Err(Error::Config(
                "tenantStrategy.headerName must not be empty".to_string(),
            )),
            Self::Path { segment: Some(s) } if s.is_empty() || s.contains('/') => Err(
                Error::Config(format!("invalid tenantStrategy.segment '{s}'")),
            ),
            _ => Ok(()),
        }
    }

    /// Resolve the tenant slug for `request`, if any.
    pub fn resolve(&self, request: &TenantRequest) -> Option<String> {
        let slug = match self {
            Self::Subdomain {
                primary_domain,
                fallback_tenant_slug,
            } => request
                .host
                .as_deref()
                .and_then(|host| subdomain_of(host, primary_domain.as_deref()))
                .or_else(|| fallback_tenant_slug.clone()),
            Self::Header { header_name } => request.header_value(header_name).map(str::to_string),
            Self::Path { segment } => path_slug(&request.path, segment.as_deref()),
        };
        debug!(?slug, "Resolved tenant");
        slug
    }
}

fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

fn subdomain_of(host: &str, primary_domain: Option<&str>) -> Option<String> {
    let host = strip_port(host.trim()).trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() || host.parse::<IpAddr>().is_ok() {
        return None;
    }

    let label = match primary_domain {
        Some(primary) => {
            let primary = primary.trim_end_matches('.').to_ascii_lowercase();
            let prefix = host.strip_suffix(&primary)?.strip_suffix('.')?;
            prefix.split('.').next()?.to_string()
        }
        None => {
            let labels: Vec<&str> = host.split('.').collect();
            if labels.len() < 3 {
                return None;
            }
            labels[0].to_string()
        }
    };

    (!label.is_empty() && label != "www").then_some(label)
}

fn path_slug(path: &str, segment: Option<&str>) -> Option<String> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut parts = path.split('/').filter(|p| !p.is_empty());
    let slug = match segment {
        Some(segment) => {
            parts.by_ref().find(|p| *p == segment)?;
            parts.next()
        }
        None => parts.next(),
    };
    slug.map(str::to_string)
}

/// The tenant a caller is currently working in. `None` means all tenants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantContext {
    current: Option<String>,
}

impl TenantContext {
    /// No tenant selected; reports cover every tenant.
    pub const fn all() -> Self {
        Self { current: None }
    }

    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            current: Some(tenant_id.into()),
        }
    }

    /// Pick the starting tenant: a previously stored selection, then the
    /// user's own tenant, then the first available one.
    pub fn initial(stored: Option<&str>, user_tenant: Option<&str>, available: &[Tenant]) -> Self {
        let current = stored
            .filter(|s| !s.is_empty())
            .or_else(|| user_tenant.filter(|s| !s.is_empty()))
            .map(str::to_string)
            .or_else(|| available.first().map(|t| t.id.clone()));
        Self { current }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Switch to `tenant_id`, which must be one of `available`.
    pub fn switch_to(&mut self, tenant_id: &str, available: &[Tenant]) -> Result<()> {
        if !available.iter().any(|t| t.id == tenant_id) {
            return Err(Error::Validation(format!("unknown tenant '{tenant_id}'")));
        }
        self.current = Some(tenant_id.to_string());
        Ok(())
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn includes<T: TenantOwned + ?Sized>(&self, record: &T) -> bool {
        self.current
            .as_deref()
            .is_none_or(|tenant| record.tenant_id() == tenant)
    }

    /// Row filter for storage queries, if a tenant is selected.
    pub fn filter(&self) -> Option<Filter> {
        self.current.clone().map(Filter::TenantEquals)
    }

    /// The selection as a storage listing decision.
    pub fn as_decision(&self) -> AccessDecision {
        self.filter().map_or(AccessDecision::Allow, AccessDecision::Where)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sqlx::types::Json;

    use super::*;
    use crate::config::ThemeDefaults;

    fn subdomain(primary: Option<&str>) -> TenantStrategy {
        TenantStrategy::Subdomain {
            primary_domain: primary.map(str::to_string),
            fallback_tenant_slug: Some("default".to_string()),
        }
    }

    fn tenant(id: &str) -> Tenant {
        Tenant {
            id: id.to_string(),
            name: id.to_string(),
            slug: id.to_string(),
            domain: None,
            status: "active".to_string(),
            currency: "USD".to_string(),
            timezone: "America/New_York".to_string(),
            payment_providers: Json(vec![]),
            theme: Json(ThemeDefaults::default()),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn subdomain_with_primary_domain() {
        let s = subdomain(Some("shop.example.com"));
        let resolve = |host: &str| s.resolve(&TenantRequest::with_host(host));
        assert_eq!(resolve("acme.shop.example.com").as_deref(), Some("acme"));
        assert_eq!(resolve("ACME.shop.example.com:8443").as_deref(), Some("acme"));
        assert_eq!(resolve("shop.example.com").as_deref(), Some("default"));
        assert_eq!(resolve("www.shop.example.com").as_deref(), Some("default"));
        assert_eq!(resolve("acme.other.com").as_deref(), Some("default"));
        assert_eq!(resolve("badshop.example.com").as_deref(), Some("default"));
    }

    #[test]
    fn subdomain_without_primary_needs_three_labels() {
        let s = subdomain(None);
        let resolve = |host: &str| s.resolve(&TenantRequest::with_host(host));
        assert_eq!(resolve("acme.example.com").as_deref(), Some("acme"));
        assert_eq!(resolve("example.com").as_deref(), Some("default"));
        assert_eq!(resolve("localhost:3000").as_deref(), Some("default"));
        assert_eq!(resolve("127.0.0.1:3000").as_deref(), Some("default"));
        assert_eq!(resolve("[::1]:3000").as_deref(), Some("default"));
    }

    #[test]
    fn subdomain_without_fallback_yields_none() {
        let s = TenantStrategy::Subdomain {
            primary_domain: None,
            fallback_tenant_slug: None,
        };
        assert_eq!(s.resolve(&TenantRequest::default()), None);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let s = TenantStrategy::Header {
            header_name: "X-Tenant".to_string(),
        };
        let req = TenantRequest::default().header("x-tenant", " acme ");
        assert_eq!(s.resolve(&req).as_deref(), Some("acme"));
        let empty = TenantRequest::default().header("X-Tenant", "  ");
        assert_eq!(s.resolve(&empty), None);
    }

    #[test]
    fn path_with_and_without_segment() {
        let with = TenantStrategy::Path {
            segment: Some("t".to_string()),
        };
        let without = TenantStrategy::Path { segment: None };
        assert_eq!(
            with.resolve(&TenantRequest::with_path("/t/acme/products?x=1")).as_deref(),
            Some("acme")
        );
        assert_eq!(with.resolve(&TenantRequest::with_path("/products")), None);
        assert_eq!(with.resolve(&TenantRequest::with_path("/t/")), None);
        assert_eq!(
            without.resolve(&TenantRequest::with_path("//acme/cart")).as_deref(),
            Some("acme")
        );
        assert_eq!(without.resolve(&TenantRequest::with_path("/")), None);
    }

    #[test]
    fn strategy_deserializes_from_plugin_options() {
        let s: TenantStrategy =
            serde_json::from_str(r#"{"mode":"header","headerName":"x-store"}"#).unwrap();
        assert_eq!(
            s,
            TenantStrategy::Header {
                header_name: "x-store".to_string()
            }
        );
        let s: TenantStrategy = serde_json::from_str(r#"{"mode":"path"}"#).unwrap();
        assert_eq!(s, TenantStrategy::Path { segment: None });
        assert!(TenantStrategy::Header {
            header_name: String::new()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn initial_context_precedence() {
        let tenants = [tenant("first"), tenant("second")];
        assert_eq!(
            TenantContext::initial(Some("stored"), Some("mine"), &tenants).current(),
            Some("stored")
        );
        assert_eq!(
            TenantContext::initial(None, Some("mine"), &tenants).current(),
            Some("mine")
        );
        assert_eq!(
            TenantContext::initial(None, None, &tenants).current(),
            Some("first")
        );
        assert_eq!(TenantContext::initial(None, None, &[]).current(), None);
    }

    #[test]
    fn switching_requires_a_known_tenant() {
        let tenants = [tenant("a"), tenant("b")];
        let mut ctx = TenantContext::for_tenant("a");
        ctx.switch_to("b", &tenants).unwrap();
        assert_eq!(ctx.current(), Some("b"));
        assert!(ctx.switch_to("zzz", &tenants).is_err());
        assert_eq!(ctx.current(), Some("b"));
        ctx.clear();
        assert_eq!(ctx, TenantContext::all());
    }

    #[test]
    fn context_filter_matches_includes() {
        let ctx = TenantContext::for_tenant("t1");
        assert_eq!(ctx.filter(), Some(Filter::TenantEquals("t1".to_string())));
        assert_eq!(TenantContext::all().filter(), None);
        assert_eq!(TenantContext::all().as_decision(), AccessDecision::Allow);
    }
}
