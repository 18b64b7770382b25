//! Plain-data representations exchanged with callers of the service layer.
//!
//! # Responsibility
//! - Carry scalar fields plus related ids into services.
//! - Carry persisted state, with related rows resolved, out of services.
//!
//! # Invariants
//! - Passwords flow in only (`UserInsertDto`); no outgoing type carries one.
//! - Field names serialize in camelCase.

use crate::model::category::{Category, CategoryId};
use crate::model::product::{Product, ProductId};
use crate::model::role::{Role, RoleId};
use crate::model::user::{User, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: Option<CategoryId>,
    /// Ignored when the DTO only names a product's category.
    #[serde(default)]
    pub name: String,
}

impl CategoryDto {
    /// Relation entry naming an existing category by id.
    pub fn with_id(id: CategoryId) -> Self {
        Self {
            id: Some(id),
            name: String::new(),
        }
    }
}

impl From<&Category> for CategoryDto {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: Option<ProductId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub img_url: String,
    /// Publication timestamp in Unix epoch milliseconds.
    pub date: i64,
    /// Complete desired category set on input; resolved categories on output.
    #[serde(default)]
    pub categories: Vec<CategoryDto>,
}

impl ProductDto {
    /// Builds the outgoing representation from a product and its resolved
    /// categories.
    pub fn from_entity(product: &Product, categories: &[Category]) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            img_url: product.img_url.clone(),
            date: product.date,
            categories: categories.iter().map(CategoryDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDto {
    pub id: Option<RoleId>,
    #[serde(default)]
    pub authority: String,
}

impl RoleDto {
    pub fn with_id(id: RoleId) -> Self {
        Self {
            id: Some(id),
            authority: String::new(),
        }
    }
}

impl From<&Role> for RoleDto {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id,
            authority: role.authority.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Option<UserId>,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    /// Complete desired role set on input; resolved roles on output.
    #[serde(default)]
    pub roles: Vec<RoleDto>,
}

impl UserDto {
    pub fn from_entity(user: &User, roles: &[Role]) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            roles: roles.iter().map(RoleDto::from).collect(),
        }
    }
}

/// User creation input: the user fields plus the raw password.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInsertDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub password: String,
}

/// User update input. Passwords are not changed through updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateDto {
    #[serde(flatten)]
    pub user: UserDto,
}
