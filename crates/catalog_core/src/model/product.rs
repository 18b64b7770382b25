//! Product entity.
//!
//! # Invariants
//! - `categories` only holds references; category rows are resolved on read.
//! - `price` is strictly positive and `date` is never in the future.

use crate::model::category::Category;
use crate::model::relation::{Reference, RelationSet};
use crate::model::validation::ValidationError;
use crate::model::{Entity, EntityId};

pub type ProductId = EntityId;

const NAME_MIN_CHARS: usize = 5;
const NAME_MAX_CHARS: usize = 60;

/// Catalog item linked to any number of categories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Product {
    pub id: Option<ProductId>,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub img_url: String,
    /// Publication timestamp in Unix epoch milliseconds.
    pub date: i64,
    pub categories: RelationSet<Category>,
}

impl Product {
    /// Creates an entity attached to an existing row, ready for a full-field
    /// overwrite.
    pub fn attached(reference: Reference<Product>) -> Self {
        Self {
            id: Some(reference.id()),
            ..Self::default()
        }
    }

    /// Validates scalar fields against the catalog rules.
    ///
    /// `now_ms` is the reference clock for the publication date check.
    pub fn validate(&self, now_ms: i64) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();

        let name_chars = self.name.trim().chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&name_chars) {
            errors.push(
                "name",
                format!("Name must have between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"),
            );
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            errors.push("price", "Price must be positive");
        }
        if self.date > now_ms {
            errors.push("date", "Product date cannot be in the future");
        }

        errors.into_result()
    }
}

impl Entity for Product {
    const NAME: &'static str = "product";

    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::Product;

    fn valid_product() -> Product {
        Product {
            name: "Phone X".to_string(),
            price: 800.0,
            date: 1_000,
            ..Product::default()
        }
    }

    #[test]
    fn valid_product_passes() {
        assert!(valid_product().validate(2_000).is_ok());
    }

    #[test]
    fn short_name_non_positive_price_and_future_date_are_reported_together() {
        let mut product = valid_product();
        product.name = "TV".to_string();
        product.price = 0.0;
        product.date = 5_000;

        let err = product.validate(2_000).unwrap_err();
        assert!(err.has_field("name"));
        assert!(err.has_field("price"));
        assert!(err.has_field("date"));
    }

    #[test]
    fn nan_price_is_rejected() {
        let mut product = valid_product();
        product.price = f64::NAN;
        assert!(product.validate(2_000).unwrap_err().has_field("price"));
    }
}
