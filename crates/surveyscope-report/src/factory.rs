use std::sync::Arc;

use crate::config::{DocumentStoreConfig, MailerConfig, PdfRendererConfig};
use crate::error::ProviderError;
use crate::providers::{
    GotenbergPdfRenderer, LocalDocumentStore, ResendMailer, SupabaseDocumentStore,
};
use crate::traits::{DocumentStore, Mailer, PdfRenderer};

pub fn build_pdf_renderer(cfg: PdfRendererConfig) -> Result<Arc<dyn PdfRenderer>, ProviderError> {
    match cfg {
        PdfRendererConfig::Gotenberg(c) => Ok(Arc::new(GotenbergPdfRenderer::new(c)?)),
    }
}

pub fn build_document_store(
    cfg: DocumentStoreConfig,
) -> Result<Arc<dyn DocumentStore>, ProviderError> {
    match cfg {
        DocumentStoreConfig::Supabase(c) => Ok(Arc::new(SupabaseDocumentStore::new(c)?)),
        DocumentStoreConfig::Local(c) => Ok(Arc::new(LocalDocumentStore::new(c)?)),
    }
}

/// `None` when delivery is disabled.
pub fn build_mailer(cfg: MailerConfig) -> Result<Option<Arc<dyn Mailer>>, ProviderError> {
    match cfg {
        MailerConfig::Resend(c) => Ok(Some(Arc::new(ResendMailer::new(c)?))),
        MailerConfig::Disabled => Ok(None),
    }
}
