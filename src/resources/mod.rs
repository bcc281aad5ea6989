//! Dispatcher API resources
//!
//! Response envelopes, domain records and the per-scope API facades. Every
//! facade method is a thin call into [`ScopedClient`](crate::http::ScopedClient),
//! so the refresh-and-retry policy applies uniformly.

mod admin;
mod auth;
mod flex;
mod models;
mod products;
mod restaurant;

pub use admin::AdminApi;
pub use auth::{AuthApi, Credentials};
pub use models::*;
pub use products::{Product, ProductInput, ProductList, ProductsApi};
pub use restaurant::RestaurantApi;

use serde::{Deserialize, Serialize};

/// `{ "data": ... }`, the wrapper around every dispatcher response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,

    /// Human-readable status text some endpoints include
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Paginated listing: `{ "items": [...], "pagination": {...} }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(deserialize_with = "flex::number")]
    pub page: u64,
    #[serde(deserialize_with = "flex::number")]
    pub per_page: u64,
    #[serde(deserialize_with = "flex::number")]
    pub total: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        self.pagination.total_pages()
    }

    pub fn has_next(&self) -> bool {
        self.pagination.page < self.pagination.total_pages()
    }
}

impl Pagination {
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }
}

/// Result of an image upload (`data.url`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// Image to send to an uploader endpoint
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    /// What the image is for, e.g. `profile_image` or `logo`
    pub kind: String,
}

impl ImageUpload {
    pub(crate) fn into_parts(self) -> Vec<crate::http::FormPart> {
        use crate::http::FormPart;

        vec![
            FormPart::file("file", self.file_name, self.content_type.as_deref(), self.bytes),
            FormPart::text("type", self.kind),
        ]
    }
}
