//! Storefront Core Library
//!
//! Multi-tenant commerce building blocks:
//! - Collection manifest and declarative access rules
//! - Tenant resolution and the current-tenant context
//! - `SQLite` storage with before-validate hooks
//! - Variant generation and price adjustment
//! - Dashboard analytics and the fulfillment queue
//! - Signed download links for digital files
//! - Configuration resolution and logging setup

pub mod access;
pub mod analytics;
pub mod catalog;
pub mod collections;
pub mod config;
pub mod db;
pub mod downloads;
pub mod error;
pub mod hooks;
pub mod models;
pub mod seed;
pub mod storage;
pub mod tenant;
pub mod tracing_init;

pub use access::{AccessDecision, AccessRule, Operation, Principal, Role};
pub use collections::{Collection, PluginManifest, build_manifest};
pub use config::PluginConfig;
pub use error::{Error, Result};
pub use storage::StoreDatabase;
pub use tenant::{TenantContext, TenantStrategy};
