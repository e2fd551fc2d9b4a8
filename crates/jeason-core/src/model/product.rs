use crate::storage::{Record, Table, numeric_key};
use crate::validation::{self, FieldErrors};
use crate::{CoreError, Money, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub full_description: String,
    pub price: Money,
    /// Primary image URL. Empty when the product has no image.
    pub image: String,
    pub category: String,
    pub images: Vec<String>,
    pub specifications: BTreeMap<String, String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Record for Product {
    const TABLE: Table = Table::Products;

    fn key(&self) -> String {
        numeric_key(self.id)
    }
}

/// Admin form input for creating or editing a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    pub full_description: String,
    pub price: Money,
    pub image: String,
    pub category: String,
    pub images: Vec<String>,
    pub specifications: BTreeMap<String, String>,
}

impl ProductDraft {
    /// Check the form rules and return the cleaned-up draft.
    ///
    /// - title ≥ 3, description ≥ 10, category ≥ 2, price > 0
    /// - blank `full_description` falls back to `description`
    /// - `images` falls back to `[image]` when an image is set
    /// - specification rows with a blank key or value are dropped
    pub fn normalize(self) -> Result<ProductDraft, CoreError> {
        let mut errors = FieldErrors::new();
        validation::min_len(&mut errors, "title", &self.title, 3, "Title");
        validation::positive(&mut errors, "price", self.price, "Price");
        validation::min_len(&mut errors, "description", &self.description, 10, "Description");
        validation::min_len(&mut errors, "category", &self.category, 2, "Category");
        errors.into_result()?;

        let title = self.title.trim().to_string();
        let description = self.description.trim().to_string();
        let full_description = if self.full_description.trim().is_empty() {
            description.clone()
        } else {
            self.full_description
        };
        let image = self.image.trim().to_string();
        let mut images: Vec<String> = self
            .images
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        if images.is_empty() && !image.is_empty() {
            images.push(image.clone());
        }
        let specifications = self
            .specifications
            .into_iter()
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .collect();

        Ok(ProductDraft {
            title,
            description,
            full_description,
            price: self.price,
            image,
            category: self.category.trim().to_string(),
            images,
            specifications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            title: "Steel Rebar".to_string(),
            description: "High tensile reinforcement bar".to_string(),
            price: Money::from_major(12_000),
            category: "Rebars".to_string(),
            ..ProductDraft::default()
        }
    }

    #[test]
    fn defaults_full_description_and_images() {
        let mut input = draft();
        input.image = " https://cdn/rebar.jpg ".to_string();
        let clean = input.normalize().unwrap_or_default();
        assert_eq!(clean.full_description, clean.description);
        assert_eq!(clean.image, "https://cdn/rebar.jpg");
        assert_eq!(clean.images, vec!["https://cdn/rebar.jpg".to_string()]);
    }

    #[test]
    fn drops_blank_specifications() {
        let mut input = draft();
        input
            .specifications
            .insert(" material ".to_string(), " Carbon steel ".to_string());
        input.specifications.insert("sizes".to_string(), "  ".to_string());
        input.specifications.insert(" ".to_string(), "ignored".to_string());
        let clean = input.normalize().unwrap_or_default();
        assert_eq!(clean.specifications.len(), 1);
        assert_eq!(
            clean.specifications.get("material").map(String::as_str),
            Some("Carbon steel")
        );
    }

    #[test]
    fn reports_every_failing_field() {
        let input = ProductDraft {
            title: "AB".to_string(),
            description: "short".to_string(),
            price: Money::ZERO,
            category: "X".to_string(),
            ..ProductDraft::default()
        };
        match input.normalize() {
            Err(CoreError::Validation(fields)) => {
                assert_eq!(fields.get("title"), Some("Title must be at least 3 characters"));
                assert_eq!(fields.get("price"), Some("Price must be positive"));
                assert_eq!(
                    fields.get("description"),
                    Some("Description must be at least 10 characters")
                );
                assert_eq!(fields.get("category"), Some("Category must be at least 2 characters"));
            }
            other => unreachable!("expected validation error, got {other:?}"),
        }
    }
}
