//! # Catalog
//!
//! Product listing for the storefront and product CRUD for the admin.

use crate::storage::{Table, numeric_key};
use crate::{Backoffice, CoreError, Product, ProductDraft, Timestamp};

impl Backoffice {
    /// All products, optionally restricted to one category.
    ///
    /// The category match ignores case and surrounding whitespace. An empty
    /// filter lists everything. Results are in id order.
    pub fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>, CoreError> {
        let products: Vec<Product> = self.load_all()?;
        let wanted = category.map(str::trim).filter(|c| !c.is_empty());
        Ok(match wanted {
            Some(wanted) => products
                .into_iter()
                .filter(|p| p.category.eq_ignore_ascii_case(wanted))
                .collect(),
            None => products,
        })
    }

    /// One product by id.
    pub fn product(&self, id: u64) -> Result<Product, CoreError> {
        self.load(&numeric_key(id))?
            .ok_or_else(|| CoreError::not_found(format!("product {id}")))
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Result<Vec<String>, CoreError> {
        let mut seen: Vec<String> = Vec::new();
        for product in self.list_products(None)? {
            if !seen.iter().any(|c| c.eq_ignore_ascii_case(&product.category)) {
                seen.push(product.category);
            }
        }
        Ok(seen)
    }

    pub fn create_product(
        &self,
        draft: ProductDraft,
        now: Timestamp,
    ) -> Result<Product, CoreError> {
        let draft = draft.normalize()?;
        let id = self.next_id(Table::Products)?;
        let product = Product {
            id,
            title: draft.title,
            description: draft.description,
            full_description: draft.full_description,
            price: draft.price,
            image: draft.image,
            category: draft.category,
            images: draft.images,
            specifications: draft.specifications,
            created_at: now,
            updated_at: now,
        };
        self.save(&product)?;
        Ok(product)
    }

    /// Replace a product's fields.
    ///
    /// An empty image in the draft keeps the current image, so the edit form
    /// can be submitted without re-uploading.
    pub fn update_product(
        &self,
        id: u64,
        draft: ProductDraft,
        now: Timestamp,
    ) -> Result<Product, CoreError> {
        let draft = draft.normalize()?;
        let current = self.product(id)?;

        let image = if draft.image.is_empty() {
            current.image.clone()
        } else {
            draft.image
        };
        let images = if draft.images.is_empty() && !image.is_empty() {
            if current.images.is_empty() {
                vec![image.clone()]
            } else {
                current.images.clone()
            }
        } else {
            draft.images
        };

        let product = Product {
            id,
            title: draft.title,
            description: draft.description,
            full_description: draft.full_description,
            price: draft.price,
            image,
            category: draft.category,
            images,
            specifications: draft.specifications,
            created_at: current.created_at,
            updated_at: now,
        };
        self.save(&product)?;
        Ok(product)
    }

    pub fn delete_product(&self, id: u64) -> Result<(), CoreError> {
        if self.remove::<Product>(&numeric_key(id))? {
            Ok(())
        } else {
            Err(CoreError::not_found(format!("product {id}")))
        }
    }
}
