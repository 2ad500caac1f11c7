use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::config::SupabaseStorageConfig;
use crate::error::ProviderError;
use crate::traits::DocumentStore;
use crate::types::{RenderedDocument, StoredDocument};

/// Uploads through the Supabase Storage object API.
#[derive(Clone)]
pub struct SupabaseDocumentStore {
    config: SupabaseStorageConfig,
    client: Client,
}

impl SupabaseDocumentStore {
    pub fn new(config: SupabaseStorageConfig) -> Result<Self, ProviderError> {
        if config.base_url.trim().is_empty() || config.service_key.trim().is_empty() {
            return Err(ProviderError::Config(
                "supabase base_url and service_key are required".to_string(),
            ));
        }
        if config.bucket.trim().is_empty() {
            return Err(ProviderError::Config(
                "supabase bucket is empty".to_string(),
            ));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn storage_url(&self) -> String {
        format!(
            "{}/storage/v1",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/object/{}/{}",
            self.storage_url(),
            self.config.bucket,
            path.trim_start_matches('/')
        )
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/object/public/{}/{}",
            self.storage_url(),
            self.config.bucket,
            path.trim_start_matches('/')
        )
    }

    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, ProviderError> {
        let endpoint = format!(
            "{}/object/sign/{}/{}",
            self.storage_url(),
            self.config.bucket,
            path.trim_start_matches('/')
        );
        let res = self
            .client
            .post(endpoint)
            .bearer_auth(&self.config.service_key)
            .header("apikey", &self.config.service_key)
            .json(&serde_json::json!({ "expiresIn": ttl_secs }))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let parsed: SignResponse = res.json().await?;
        Ok(self.absolute_signed_url(&parsed.signed_url))
    }

    /// Signed paths come back relative to the storage API root.
    fn absolute_signed_url(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            return signed.to_string();
        }
        format!("{}/{}", self.storage_url(), signed.trim_start_matches('/'))
    }
}

#[async_trait::async_trait]
impl DocumentStore for SupabaseDocumentStore {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn put(
        &self,
        path: &str,
        document: RenderedDocument,
    ) -> Result<StoredDocument, ProviderError> {
        if path.trim().is_empty() {
            return Err(ProviderError::Config("document path is empty".to_string()));
        }

        let res = self
            .client
            .post(self.object_url(path))
            .bearer_auth(&self.config.service_key)
            .header("apikey", &self.config.service_key)
            .header("x-upsert", "true")
            .header(CONTENT_TYPE, document.content_type)
            .body(document.bytes)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let url = match self.config.signed_link_ttl_secs {
            Some(ttl) => self.signed_url(path, ttl).await?,
            None => self.public_url(path),
        };

        Ok(StoredDocument {
            provider: self.name().to_string(),
            path: path.to_string(),
            url,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(alias = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SupabaseDocumentStore {
        SupabaseDocumentStore::new(SupabaseStorageConfig::new(
            "https://proj.supabase.co/",
            "service",
        ))
        .expect("store")
    }

    #[test]
    fn object_and_public_urls() {
        let s = store();
        assert_eq!(
            s.object_url("pulse/sub-1.pdf"),
            "https://proj.supabase.co/storage/v1/object/reports/pulse/sub-1.pdf"
        );
        assert_eq!(
            s.public_url("/pulse/sub-1.pdf"),
            "https://proj.supabase.co/storage/v1/object/public/reports/pulse/sub-1.pdf"
        );
    }

    #[test]
    fn sign_response_aliases_parse() {
        let v1: SignResponse =
            serde_json::from_str(r#"{"signedURL":"/object/sign/reports/a.pdf?token=t"}"#)
                .expect("parse signedURL");
        let v2: SignResponse =
            serde_json::from_str(r#"{"signedUrl":"https://cdn.example/a.pdf"}"#)
                .expect("parse signedUrl");
        let s = store();
        assert_eq!(
            s.absolute_signed_url(&v1.signed_url),
            "https://proj.supabase.co/storage/v1/object/sign/reports/a.pdf?token=t"
        );
        assert_eq!(s.absolute_signed_url(&v2.signed_url), "https://cdn.example/a.pdf");
    }

    #[test]
    fn rejects_missing_credentials() {
        assert!(SupabaseDocumentStore::new(SupabaseStorageConfig::new("", "k")).is_err());
        let mut cfg = SupabaseStorageConfig::new("https://proj.supabase.co", "k");
        cfg.bucket = " ".to_string();
        assert!(SupabaseDocumentStore::new(cfg).is_err());
    }
}
