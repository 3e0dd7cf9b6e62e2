//! Cloudinary-backed image store.
//!
//! Performs signed uploads against the image upload endpoint: the
//! parameter string (folder + timestamp) is hashed together with the API
//! secret and sent alongside the file. The response's `secure_url` is
//! what ends up on-chain.

use super::{MediaError, MediaStore};
use crate::config::MediaConfig;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Client for the external media host.
pub struct CloudinaryStore {
    http: reqwest::Client,
    config: MediaConfig,
}

impl CloudinaryStore {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.config.cloud_name
        )
    }

    /// SHA-256 signature over the sorted parameter string plus the secret.
    fn sign(&self, timestamp: i64) -> String {
        let to_sign = format!(
            "folder={}&timestamp={}{}",
            self.config.folder, timestamp, self.config.api_secret
        );
        hex::encode(Sha256::digest(to_sign.as_bytes()))
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload_image(&self, bytes: Vec<u8>) -> Result<String, MediaError> {
        let timestamp = chrono::Utc::now().timestamp();
        let signature = self.sign(timestamp);

        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", self.config.folder.clone())
            .text("signature", signature)
            .part("file", Part::bytes(bytes).file_name("image"));

        let response = self.http.post(self.upload_url()).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        debug!("Image uploaded to {}", uploaded.secure_url);
        Ok(uploaded.secure_url)
    }
}
