//! Catalog products.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::store::{Record, Store, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Product {
    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
    pub stock: u32,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub stock: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    Price,
    Stock,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub const NAMES: &'static [&'static str] = &["name", "price", "stock", "createdAt", "updatedAt"];

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::Stock => a.stock.cmp(&b.stock),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const NAMES: &'static [&'static str] = &["asc", "desc"];
}

/// Listing filter. Every criterion is optional.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub sort_by: Option<SortField>,
    pub order: SortOrder,
}

impl ProductFilter {
    fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if !same_category(product, category) {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_name = product.name.to_lowercase().contains(&needle);
            let in_description = product
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_name && !in_description {
                return false;
            }
        }
        true
    }
}

fn same_category(product: &Product, category: &str) -> bool {
    product
        .category
        .as_deref()
        .is_some_and(|c| c.eq_ignore_ascii_case(category.trim()))
}

fn store_error(err: StoreError) -> DomainError {
    match err {
        StoreError::NotFound(_) => DomainError::NotFound("Product not found".into()),
        StoreError::Duplicate(key) => DomainError::Conflict(format!("Product '{key}' already exists")),
    }
}

pub struct ProductService {
    store: Arc<dyn Store<Product>>,
}

impl ProductService {
    pub fn new(store: Arc<dyn Store<Product>>) -> Self {
        Self { store }
    }

    pub fn list(&self, filter: &ProductFilter) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .store
            .list()
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect();

        if let Some(field) = filter.sort_by {
            products.sort_by(|a, b| match filter.order {
                SortOrder::Asc => field.compare(a, b),
                SortOrder::Desc => field.compare(b, a),
            });
        }
        products
    }

    pub fn count(&self) -> usize {
        self.store.len()
    }

    pub fn get(&self, id: u64) -> Result<Product, DomainError> {
        self.store
            .get(id)
            .ok_or_else(|| DomainError::NotFound("Product not found".into()))
    }

    pub fn by_category(&self, category: &str) -> Vec<Product> {
        self.store
            .list()
            .into_iter()
            .filter(|p| same_category(p, category))
            .collect()
    }

    /// Products with at least `min_stock` units available.
    pub fn in_stock(&self, min_stock: u32) -> Vec<Product> {
        self.store
            .list()
            .into_iter()
            .filter(|p| p.stock >= min_stock)
            .collect()
    }

    pub fn create(&self, input: NewProduct) -> Result<Product, DomainError> {
        let now = Utc::now();
        let product = self
            .store
            .insert(Box::new(move |id: u64| Product {
                id,
                name: input.name,
                description: input.description,
                price: input.price,
                category: input.category,
                stock: input.stock,
                created_at: now,
                updated_at: now,
            }))
            .map_err(store_error)?;

        tracing::info!(product_id = product.id, "Product created");
        Ok(product)
    }

    pub fn update(&self, id: u64, changes: ProductChanges) -> Result<Product, DomainError> {
        let product = self
            .store
            .update(
                id,
                Box::new(move |product: &mut Product| {
                    if let Some(name) = changes.name {
                        product.name = name;
                    }
                    if let Some(description) = changes.description {
                        product.description = Some(description);
                    }
                    if let Some(price) = changes.price {
                        product.price = price;
                    }
                    if let Some(category) = changes.category {
                        product.category = Some(category);
                    }
                    if let Some(stock) = changes.stock {
                        product.stock = stock;
                    }
                    product.updated_at = Utc::now();
                }),
            )
            .map_err(store_error)?;

        tracing::info!(product_id = product.id, "Product updated");
        Ok(product)
    }

    pub fn update_stock(&self, id: u64, stock: u32) -> Result<Product, DomainError> {
        self.update(
            id,
            ProductChanges {
                stock: Some(stock),
                ..ProductChanges::default()
            },
        )
    }

    pub fn delete(&self, id: u64) -> Result<Product, DomainError> {
        let product = self.store.delete(id).map_err(store_error)?;
        tracing::info!(product_id = product.id, "Product deleted");
        Ok(product)
    }
}
