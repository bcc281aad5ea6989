//! Product catalogue
//!
//! Lives outside the admin/restaurant prefixes and pages with
//! `limit`/`skip` instead of `page`, but is sent with the admin token.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::flex;
use super::Id;
use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest, ScopedClient};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "flex::number")]
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "flex::opt_decimal")]
    pub price: Option<f64>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "flex::opt_decimal")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub stock: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub thumbnail: String,
}

/// `{ "products": [...], "total", "skip", "limit" }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    #[serde(default, deserialize_with = "flex::number")]
    pub total: u64,
    #[serde(default, deserialize_with = "flex::number")]
    pub skip: u64,
    #[serde(default, deserialize_with = "flex::number")]
    pub limit: u64,
}

impl ProductList {
    pub fn empty() -> Self {
        Self {
            products: Vec::new(),
            total: 0,
            skip: 0,
            limit: 0,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit)
    }
}

#[derive(Clone, Copy)]
pub struct ProductsApi<'a> {
    scoped: ScopedClient<'a>,
}

impl<'a> ProductsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            scoped: client.admin(),
        }
    }

    /// One page of `limit` products; pages start at 1
    pub async fn list(&self, page: u64, limit: u64) -> Result<ProductList, ApiError> {
        let skip = page.saturating_sub(1).saturating_mul(limit);
        let request = ApiRequest::builder(Method::GET, "/products")
            .param("limit", limit)
            .param("skip", skip)
            .build()?;
        self.scoped.fetch(&request).await
    }

    pub async fn get(&self, id: Id) -> Result<Product, ApiError> {
        self.scoped.get(&format!("/products/{}", id)).await
    }

    /// Full-text search. An empty query matches nothing and sends no request.
    pub async fn search(&self, query: &str) -> Result<ProductList, ApiError> {
        if query.trim().is_empty() {
            return Ok(ProductList::empty());
        }
        let request = ApiRequest::builder(Method::GET, "/products/search")
            .param("q", query)
            .build()?;
        self.scoped.fetch(&request).await
    }

    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        self.scoped.get("/products/category-list").await
    }

    pub async fn create(&self, input: &ProductInput) -> Result<Product, ApiError> {
        self.scoped.post("/products/add", input).await
    }

    pub async fn update(&self, id: Id, input: &ProductInput) -> Result<Product, ApiError> {
        self.scoped.put(&format!("/products/{}", id), input).await
    }

    pub async fn delete(&self, id: Id) -> Result<Product, ApiError> {
        self.scoped.delete(&format!("/products/{}", id)).await
    }
}
