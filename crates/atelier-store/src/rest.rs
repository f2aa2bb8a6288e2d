//! Object-storage REST backend
//!
//! Speaks the bucket/object API shape used by hosted storage services:
//!
//! - `POST   {base}/storage/v1/object/{bucket}/{key}` with `x-upsert: false`
//! - `DELETE {base}/storage/v1/object/{bucket}` with `{"prefixes": [key]}`
//! - public objects under `{base}/storage/v1/object/public/{bucket}/{key}`

use crate::backend::{StorageBackend, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct RestObjectStore {
    base_url: String,
    service_key: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct RemoveRequest<'a> {
    prefixes: [&'a str; 1],
}

impl RestObjectStore {
    /// Create a backend for the service at `base_url`
    ///
    /// # Errors
    /// Returns `StorageError::Backend` if the URL or key is empty, or
    /// `StorageError::Http` if the client cannot be built.
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Result<Self, StorageError> {
        let base_url = base_url.into();
        let service_key = service_key.into();
        if base_url.trim().is_empty() {
            return Err(StorageError::Backend("storage URL is empty".to_string()));
        }
        if service_key.trim().is_empty() {
            return Err(StorageError::Backend("storage service key is empty".to_string()));
        }

        let client = Client::builder().build()?;

        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            service_key,
            client,
        })
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{key}", self.base_url)
    }

    fn bucket_url(&self, bucket: &str) -> String {
        format!("{}/storage/v1/object/{bucket}", self.base_url)
    }

    async fn rejection(response: Response, bucket: &str, key: &str) -> StorageError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT || is_duplicate_body(&body) {
            StorageError::AlreadyExists {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }
        } else {
            StorageError::Rejected {
                status: status.as_u16(),
                body,
            }
        }
    }
}

/// Some services report a duplicate key as 400 with a descriptive body
fn is_duplicate_body(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("duplicate") || lower.contains("already exists")
}

#[async_trait]
impl StorageBackend for RestObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let response = self
            .client
            .post(self.object_url(bucket, key))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::rejection(response, bucket, key).await)
        }
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{key}", self.base_url)
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(self.bucket_url(bucket))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&RemoveRequest { prefixes: [key] })
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::rejection(response, bucket, key).await)
        }
    }
}
