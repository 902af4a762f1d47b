//! Tenant-scoped access rules.
//!
//! Every collection operation carries an [`AccessRule`]. Evaluating a rule
//! for a caller yields an [`AccessDecision`]: deny, allow everything, or
//! allow only the rows matching a [`Filter`]. Storage pushes the filter into
//! its `WHERE` clause; [`AccessDecision::permits`] applies the same filter
//! to a record already in memory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{TenantOwned, User};

/// Admin-panel role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Admin,
    Manager,
    Support,
    Customer,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Support => "support",
            Self::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "support" => Ok(Self::Support),
            "customer" => Ok(Self::Customer),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
    pub tenant_id: Option<String>,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, role: Role, tenant_id: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            tenant_id,
        }
    }

    /// Build a principal from a stored user. Unknown roles get the least
    /// privileged role.
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role.parse().unwrap_or(Role::Customer),
            tenant_id: user.tenant_id.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Self; 4] = [Self::Create, Self::Read, Self::Update, Self::Delete];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Shape of a single collection/operation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum AccessRule {
    /// Anyone, including anonymous callers.
    Public,
    /// Any signed-in user.
    Authenticated,
    AdminOnly,
    /// Admins see everything, other users only their own tenant.
    TenantScoped,
    /// Tenant-scoped for users; anonymous callers see rows with `status`.
    TenantScopedOrPublic { status: &'static str },
}

/// A row predicate that storage can push into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    TenantEquals(String),
    StatusEquals(&'static str),
}

impl Filter {
    pub const fn column(&self) -> &'static str {
        match self {
            Self::TenantEquals(_) => "tenant_id",
            Self::StatusEquals(_) => "status",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::TenantEquals(tenant) => tenant,
            Self::StatusEquals(status) => status,
        }
    }

    pub fn matches<T: TenantOwned + ?Sized>(&self, record: &T) -> bool {
        match self {
            Self::TenantEquals(tenant) => record.tenant_id() == tenant,
            Self::StatusEquals(status) => record.status() == Some(*status),
        }
    }
}

/// Outcome of evaluating a rule for a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Deny,
    Allow,
    Where(Filter),
}

impl AccessDecision {
    pub const fn is_denied(&self) -> bool {
        matches!(self, Self::Deny)
    }

    /// Whether a concrete record passes this decision.
    pub fn permits<T: TenantOwned + ?Sized>(&self, record: &T) -> bool {
        match self {
            Self::Deny => false,
            Self::Allow => true,
            Self::Where(filter) => filter.matches(record),
        }
    }
}

impl AccessRule {
    pub fn evaluate(self, principal: Option<&Principal>) -> AccessDecision {
        match (self, principal) {
            (Self::Public, _) => AccessDecision::Allow,
            (Self::TenantScopedOrPublic { status }, None) => {
                AccessDecision::Where(Filter::StatusEquals(status))
            }
            (_, None) => AccessDecision::Deny,
            (Self::Authenticated, Some(_)) => AccessDecision::Allow,
            (_, Some(p)) if p.is_admin() => AccessDecision::Allow,
            (Self::AdminOnly, Some(_)) => AccessDecision::Deny,
            (Self::TenantScoped | Self::TenantScopedOrPublic { .. }, Some(p)) => {
                p.tenant_id.as_ref().map_or(AccessDecision::Deny, |tenant| {
                    AccessDecision::Where(Filter::TenantEquals(tenant.clone()))
                })
            }
        }
    }
}

/// Create/read/update/delete rules of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionAccess {
    pub create: AccessRule,
    pub read: AccessRule,
    pub update: AccessRule,
    pub delete: AccessRule,
}

impl CollectionAccess {
    pub const fn uniform(rule: AccessRule) -> Self {
        Self {
            create: rule,
            read: rule,
            update: rule,
            delete: rule,
        }
    }

    pub const fn rule(&self, operation: Operation) -> AccessRule {
        match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }

    pub fn evaluate(&self, operation: Operation, principal: Option<&Principal>) -> AccessDecision {
        self.rule(operation).evaluate(principal)
    }
}
