//! Authorization and permission-resolution core for the Showcase catalog.
//!
//! Anonymous visitors see every category and product, without prices.
//! Authenticated principals see prices; a Super sees everything, while an
//! Admin only sees the categories and products it holds grants for.
//!
//! # Architecture Overview
//!
//! 1. **Request arrives** at the API layer
//! 2. **Session lookup** resolves a [`Principal`] (anonymous if none)
//! 3. **Role gate** ([`gate`]) checks the operation's precondition
//! 4. **AuthzEngine** filters catalog reads through the principal's grants
//! 5. **PermissionResolver** is the only writer of grants, and rewrites a
//!    principal's full set in one transaction
//!
//! Storage is reached only through the traits in [`store`]; the `database`
//! crate provides the SQLite implementation.

pub mod engine;
pub mod error;
pub mod gate;
pub mod resolver;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use engine::AuthzEngine;
pub use error::{AuthzError, Result};
pub use resolver::PermissionResolver;
pub use store::{CatalogStore, GrantTransaction, PermissionStore, Store};
pub use types::{
    AccessScope, Category, CategoryId, Grant, GrantKind, GrantSet, GrantSummary, Principal,
    PrincipalId, Product, ProductId, ProductListing, ProductView, Role,
};
