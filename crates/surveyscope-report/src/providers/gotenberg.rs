use reqwest::Client;
use reqwest::multipart::{Form, Part};

use crate::config::GotenbergConfig;
use crate::error::ProviderError;
use crate::traits::PdfRenderer;
use crate::types::RenderedDocument;

/// Renders through a Gotenberg instance's Chromium HTML route.
#[derive(Clone)]
pub struct GotenbergPdfRenderer {
    config: GotenbergConfig,
    client: Client,
}

impl GotenbergPdfRenderer {
    pub fn new(config: GotenbergConfig) -> Result<Self, ProviderError> {
        if config.base_url.trim().is_empty() {
            return Err(ProviderError::Config(
                "gotenberg base_url is empty".to_string(),
            ));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/forms/chromium/convert/html",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl PdfRenderer for GotenbergPdfRenderer {
    fn name(&self) -> &'static str {
        "gotenberg"
    }

    async fn render(&self, html: &str) -> Result<RenderedDocument, ProviderError> {
        if html.trim().is_empty() {
            return Err(ProviderError::Config("report html is empty".to_string()));
        }

        let index = Part::text(html.to_string())
            .file_name("index.html")
            .mime_str("text/html")?;
        let form = Form::new()
            .part("files", index)
            .text("printBackground", "true")
            .text("paperWidth", self.config.paper_width_in.to_string())
            .text("paperHeight", self.config.paper_height_in.to_string());

        let res = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let bytes = res.bytes().await?;
        if !bytes.starts_with(b"%PDF") {
            return Err(ProviderError::InvalidResponse(
                "gotenberg did not return a pdf document".to_string(),
            ));
        }
        Ok(RenderedDocument::pdf(bytes.to_vec()))
    }
}
