//! Object storage adapter: list/get/put/delete against a single bucket.

mod memory;
mod s3;

use std::future::Future;

use thiserror::Error;

pub use memory::{MemoryStore, WebsiteSettings};
pub use s3::S3Store;

/// Failure reported by an object store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Object store unavailable during {operation}: {message}")]
    Unavailable {
        operation: &'static str,
        message: String,
    },

    #[error("Object store rejected {operation}: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },

    #[error("Object not found: {0}")]
    NotFound(String),
}

impl StoreError {
    /// Timeouts, connection failures and interrupted transfers.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Minimal set of bucket operations the photo index is built on.
///
/// Implementations carry no business logic; key layout is owned by
/// [`crate::index::MetadataIndex`].
pub trait ObjectStore {
    /// Every key starting with `prefix`, across all listing pages.
    fn list(&self, prefix: &str) -> impl Future<Output = StoreResult<Vec<String>>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = StoreResult<Vec<u8>>> + Send;

    fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = StoreResult<()>> + Send;

    /// Enable static website hosting with the given index and error documents.
    fn configure_website(
        &self,
        index_document: &str,
        error_document: &str,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Direct public URL of an object.
    fn object_url(&self, key: &str) -> String;

    /// Public URL of the hosted website.
    fn website_url(&self) -> String;
}
