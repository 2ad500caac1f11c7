use reqwest::Client;
use serde::Deserialize;

use crate::config::ResendConfig;
use crate::error::ProviderError;
use crate::traits::Mailer;
use crate::types::{DeliveryReceipt, EmailMessage};

#[derive(Clone)]
pub struct ResendMailer {
    config: ResendConfig,
    client: Client,
}

impl ResendMailer {
    pub fn new(config: ResendConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Config("resend api_key is empty".to_string()));
        }
        if config.from.trim().is_empty() {
            return Err(ProviderError::Config(
                "resend sender address is empty".to_string(),
            ));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait::async_trait]
impl Mailer for ResendMailer {
    fn name(&self) -> &'static str {
        "resend"
    }

    async fn send(&self, message: EmailMessage) -> Result<DeliveryReceipt, ProviderError> {
        if message.to.trim().is_empty() {
            return Err(ProviderError::Config("email recipient is empty".to_string()));
        }

        let payload = serde_json::json!({
            "from": self.config.from,
            "to": [message.to],
            "subject": message.subject,
            "html": message.html,
        });

        let res = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let parsed: ResendResponse = res.json().await?;
        Ok(DeliveryReceipt {
            provider: self.name().to_string(),
            message_id: parsed.id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    #[serde(default)]
    id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_id_is_optional() {
        let with_id: ResendResponse =
            serde_json::from_str(r#"{"id":"49a3999c-0ce1-4ea6-ab68-afcd6dc2e794"}"#)
                .expect("parse id");
        assert_eq!(
            with_id.id.as_deref(),
            Some("49a3999c-0ce1-4ea6-ab68-afcd6dc2e794")
        );
        let empty: ResendResponse = serde_json::from_str("{}").expect("parse empty");
        assert!(empty.id.is_none());
    }

    #[test]
    fn rejects_blank_credentials() {
        assert!(ResendMailer::new(ResendConfig::new("", "a@example.com")).is_err());
        assert!(ResendMailer::new(ResendConfig::new("re_1", " ")).is_err());
    }
}
