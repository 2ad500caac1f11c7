use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{DeliveryReceipt, EmailMessage, RenderedDocument, StoredDocument};

/// Turns a self-contained HTML page into a PDF.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn render(&self, html: &str) -> Result<RenderedDocument, ProviderError>;
}

/// Keeps rendered reports and hands back a link a respondent can open.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &'static str;

    async fn put(
        &self,
        path: &str,
        document: RenderedDocument,
    ) -> Result<StoredDocument, ProviderError>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, message: EmailMessage) -> Result<DeliveryReceipt, ProviderError>;
}
