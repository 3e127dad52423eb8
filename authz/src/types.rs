//! Core authorization types for the catalog access model.
//!
//! # Security Considerations
//!
//! ## Principal Identity
//! - Principals are derived from the authenticated session only; a request
//!   without a resolvable session is `Principal::anonymous()`
//! - A principal is immutable for the duration of a request
//!
//! ## Roles
//! - `Role` is a closed set. Every gate matches it exhaustively, so adding a
//!   role is a compile error at each decision point rather than a silent allow
//! - `Anonymous` is never persisted; storage only ever holds `admin`/`super`
//!
//! ## Field-level Redaction
//! - Prices are only serialized for authenticated principals. A redacted
//!   price is absent from the output, never zero

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::AuthzError;

pub type PrincipalId = i64;
pub type CategoryId = i64;
pub type ProductId = i64;

/// The access tier of a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Unauthenticated visitor. Sees the whole catalog without prices.
    Anonymous,
    /// Sees only what its grants allow, with prices.
    Admin,
    /// Sees everything, manages grants and users.
    Super,
}

impl Role {
    /// The string stored in the principal directory, if this role is persistable.
    pub fn as_stored(&self) -> Option<&'static str> {
        match self {
            Role::Anonymous => None,
            Role::Admin => Some("admin"),
            Role::Super => Some("super"),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Anonymous => write!(f, "anonymous"),
            Role::Admin => write!(f, "admin"),
            Role::Super => write!(f, "super"),
        }
    }
}

/// Parses a persisted role. `anonymous` is rejected: it is never stored.
impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "super" => Ok(Role::Super),
            other => Err(AuthzError::InvalidArgument(format!(
                "Unknown role: {}",
                other
            ))),
        }
    }
}

/// The actor making a request.
///
/// Anonymous principals carry no id; persisted principals always do. The
/// fields are private so the two can't drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    id: Option<PrincipalId>,
    role: Role,
}

impl Principal {
    /// An unauthenticated visitor.
    pub fn anonymous() -> Self {
        Self {
            id: None,
            role: Role::Anonymous,
        }
    }

    /// A grant-scoped administrator.
    pub fn admin(id: PrincipalId) -> Self {
        Self {
            id: Some(id),
            role: Role::Admin,
        }
    }

    /// An unrestricted administrator.
    pub fn super_admin(id: PrincipalId) -> Self {
        Self {
            id: Some(id),
            role: Role::Super,
        }
    }

    /// Builds a persisted principal from a directory record.
    pub fn persisted(id: PrincipalId, role: Role) -> Self {
        match role {
            Role::Anonymous => Self::anonymous(),
            Role::Admin => Self::admin(id),
            Role::Super => Self::super_admin(id),
        }
    }

    pub fn id(&self) -> Option<PrincipalId> {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_authenticated(&self) -> bool {
        self.role != Role::Anonymous
    }

    /// Whether product prices may be shown to this principal.
    pub fn shows_price(&self) -> bool {
        self.is_authenticated()
    }
}

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
}

/// A catalog product as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub image: Option<String>,
    pub sku: String,
    pub description: String,
    pub price: f64,
}

/// A product as handed to the transport layer.
///
/// When `price` is `None` the field is left out of the serialized form
/// entirely, so a redacted price can't be confused with a zero price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub image: Option<String>,
    pub sku: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl ProductView {
    /// Converts a stored product, keeping the price only if `show_price`.
    pub fn from_product(product: Product, show_price: bool) -> Self {
        Self {
            id: product.id,
            name: product.name,
            category_id: product.category_id,
            image: product.image,
            sku: product.sku,
            description: product.description,
            price: show_price.then_some(product.price),
        }
    }
}

/// Result of a product visibility query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListing {
    pub products: Vec<ProductView>,
    pub show_price: bool,
}

/// What a grant row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantKind {
    Category,
    Product,
}

impl GrantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantKind::Category => "category",
            GrantKind::Product => "product",
        }
    }
}

impl FromStr for GrantKind {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(GrantKind::Category),
            "product" => Ok(GrantKind::Product),
            other => Err(AuthzError::InvalidArgument(format!(
                "Unknown permission type: {}",
                other
            ))),
        }
    }
}

/// A persisted permission record.
///
/// For product grants `category_id` is the product's category copied at
/// grant time. It is never re-validated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grant {
    pub principal_id: PrincipalId,
    pub category_id: Option<CategoryId>,
    pub product_id: Option<ProductId>,
    pub kind: GrantKind,
}

impl Grant {
    pub fn category(principal_id: PrincipalId, category_id: CategoryId) -> Self {
        Self {
            principal_id,
            category_id: Some(category_id),
            product_id: None,
            kind: GrantKind::Category,
        }
    }

    pub fn product(
        principal_id: PrincipalId,
        product_id: ProductId,
        cached_category: Option<CategoryId>,
    ) -> Self {
        Self {
            principal_id,
            category_id: cached_category,
            product_id: Some(product_id),
            kind: GrantKind::Product,
        }
    }
}

/// A principal's grants split by kind, de-duplicated and ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantSet {
    pub categories: BTreeSet<CategoryId>,
    pub products: BTreeSet<ProductId>,
}

impl GrantSet {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.products.is_empty()
    }
}

impl<'a> FromIterator<&'a Grant> for GrantSet {
    fn from_iter<I: IntoIterator<Item = &'a Grant>>(iter: I) -> Self {
        let mut set = GrantSet::default();
        for grant in iter {
            match grant.kind {
                GrantKind::Category => set.categories.extend(grant.category_id),
                GrantKind::Product => set.products.extend(grant.product_id),
            }
        }
        set
    }
}

/// Counts of grant rows written by a replace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantSummary {
    pub categories_granted: usize,
    pub products_granted: usize,
}

/// A principal's own view of what it may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    /// Unrestricted (Super).
    All,
    /// Limited to the listed grants (Admin).
    Scoped(GrantSet),
}

impl Serialize for AccessScope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        match self {
            AccessScope::All => {
                let mut state = serializer.serialize_struct("AccessScope", 2)?;
                state.serialize_field("role", &Role::Super)?;
                state.serialize_field("all_access", &true)?;
                state.end()
            }
            AccessScope::Scoped(grants) => {
                let mut state = serializer.serialize_struct("AccessScope", 4)?;
                state.serialize_field("role", &Role::Admin)?;
                state.serialize_field("all_access", &false)?;
                state.serialize_field("categories", &grants.categories)?;
                state.serialize_field("products", &grants.products)?;
                state.end()
            }
        }
    }
}
