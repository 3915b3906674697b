// src/clients/storage.rs

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{clients::classify_provider_error, common::error::AppError};

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn download(&self, path: &str) -> Result<Vec<u8>, AppError>;
    /// URL assinada, válida por `expires_in_secs` segundos.
    async fn signed_url(&self, path: &str, expires_in_secs: u64) -> Result<String, AppError>;
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// Armazenamento de objetos em `{url}/storage/v1/object/{bucket}/{path}`.
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl StorageClient {
    pub fn new(client: Client, base_url: &str, service_key: String, bucket: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
        }
    }

    fn object_path(path: &str) -> &str {
        path.trim_start_matches('/')
    }
}

#[async_trait]
impl FileStorage for StorageClient {
    async fn download(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            Self::object_path(path)
        );

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_provider_error("storage", status, &text));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn signed_url(&self, path: &str, expires_in_secs: u64) -> Result<String, AppError> {
        let url = format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.base_url,
            self.bucket,
            Self::object_path(path)
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&json!({ "expiresIn": expires_in_secs }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_provider_error("storage", status, &text));
        }

        let signed: SignedUrlResponse = response.json().await?;
        // O provedor devolve um caminho relativo a /storage/v1
        Ok(format!("{}/storage/v1{}", self.base_url, signed.signed_url))
    }
}
