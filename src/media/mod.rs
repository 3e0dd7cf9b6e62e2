//! Media Module
//!
//! Candidate images live on an external media host; only their URLs are
//! written on-chain. The router depends on the [`MediaStore`] capability
//! trait; the production implementation is [`CloudinaryStore`].
//!
//! Failed uploads are terminal for the current request. If the ledger
//! call that follows fails, already-uploaded images are orphaned; there
//! is no compensating cleanup.

mod cloudinary;

#[cfg(test)]
pub(crate) mod fake;

pub use cloudinary::CloudinaryStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the media host.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("Media host rejected upload ({status}): {body}")]
    Upstream { status: u16, body: String },
}

/// Capability interface over the external image host.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload one image and return its hosted URL.
    async fn upload_image(&self, bytes: Vec<u8>) -> Result<String, MediaError>;
}
