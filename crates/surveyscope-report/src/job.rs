use std::sync::Arc;

use surveyscope_storage::{Respondent, SurveyStore};

use crate::config::{BrandingConfig, ReportConfig};
use crate::error::ReportError;
use crate::factory::{build_document_store, build_mailer, build_pdf_renderer};
use crate::results::{SurveyResults, load_results};
use crate::template::{email_subject, render_email_html, render_report_html};
use crate::traits::{DocumentStore, Mailer, PdfRenderer};
use crate::types::{DeliveryReceipt, EmailMessage, StoredDocument};

#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub results: SurveyResults,
    pub respondent: Respondent,
}

impl ReportRequest {
    pub fn load(store: &dyn SurveyStore, submission_id: &str) -> Result<Self, ReportError> {
        let (results, submission) = load_results(store, submission_id)?;
        Ok(Self {
            results,
            respondent: submission.respondent,
        })
    }

    /// `{survey}/{submission}.pdf`, with anything outside `[A-Za-z0-9_-]`
    /// replaced so ids can never escape the survey folder.
    pub fn document_path(&self) -> String {
        format!(
            "{}/{}.pdf",
            path_segment(&self.results.survey_id),
            path_segment(&self.results.submission_id)
        )
    }
}

fn path_segment(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    pub document: StoredDocument,
    /// `None` when there was no address or no mailer configured.
    pub delivery: Option<DeliveryReceipt>,
}

/// Renders a submission's results to PDF, stores it, and mails the link.
pub struct ReportJob {
    renderer: Arc<dyn PdfRenderer>,
    documents: Arc<dyn DocumentStore>,
    mailer: Option<Arc<dyn Mailer>>,
    branding: BrandingConfig,
}

impl ReportJob {
    pub fn new(
        renderer: Arc<dyn PdfRenderer>,
        documents: Arc<dyn DocumentStore>,
        mailer: Option<Arc<dyn Mailer>>,
        branding: BrandingConfig,
    ) -> Self {
        Self {
            renderer,
            documents,
            mailer,
            branding,
        }
    }

    pub fn from_config(config: ReportConfig) -> Result<Self, ReportError> {
        Ok(Self::new(
            build_pdf_renderer(config.pdf)?,
            build_document_store(config.documents)?,
            build_mailer(config.mailer)?,
            config.branding,
        ))
    }

    pub fn from_env() -> Result<Self, ReportError> {
        Self::from_config(ReportConfig::from_env()?)
    }

    pub fn branding(&self) -> &BrandingConfig {
        &self.branding
    }

    pub async fn run(&self, request: &ReportRequest) -> Result<ReportOutcome, ReportError> {
        let results = &request.results;
        let html = render_report_html(results, &request.respondent, &self.branding);
        let rendered = self.renderer.render(&html).await?;
        tracing::info!(
            submission = %results.submission_id,
            renderer = self.renderer.name(),
            bytes = rendered.bytes.len(),
            "report rendered"
        );

        let document = self
            .documents
            .put(&request.document_path(), rendered)
            .await?;
        tracing::info!(
            submission = %results.submission_id,
            store = self.documents.name(),
            path = %document.path,
            "report stored"
        );

        let recipient = request
            .respondent
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty());
        let delivery = match (recipient, self.mailer.as_ref()) {
            (Some(to), Some(mailer)) => {
                let message = EmailMessage {
                    to: to.to_string(),
                    subject: email_subject(results),
                    html: render_email_html(
                        results,
                        &request.respondent,
                        &document.url,
                        &self.branding,
                    ),
                };
                let receipt = mailer.send(message).await?;
                tracing::info!(
                    submission = %results.submission_id,
                    mailer = mailer.name(),
                    message_id = receipt.message_id.as_deref().unwrap_or("-"),
                    "report delivered"
                );
                Some(receipt)
            }
            (None, _) => {
                tracing::warn!(
                    submission = %results.submission_id,
                    "respondent has no email; skipping delivery"
                );
                None
            }
            (Some(_), None) => {
                tracing::warn!(
                    submission = %results.submission_id,
                    "mail delivery disabled; skipping delivery"
                );
                None
            }
        };

        Ok(ReportOutcome { document, delivery })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn request(survey_id: &str, submission_id: &str) -> ReportRequest {
        ReportRequest {
            results: SurveyResults {
                survey_id: survey_id.to_string(),
                survey_title: "Pulse".to_string(),
                submission_id: submission_id.to_string(),
                categories: Vec::new(),
                category_percents: BTreeMap::new(),
                total_percent: 0.0,
                total_band: None,
            },
            respondent: Respondent::default(),
        }
    }

    #[test]
    fn document_path_is_confined_to_the_survey_folder() {
        assert_eq!(request("pulse", "sub-1").document_path(), "pulse/sub-1.pdf");
        assert_eq!(
            request("../etc", "a/b c").document_path(),
            "___etc/a_b_c.pdf"
        );
        assert_eq!(request(" ", "sub-2").document_path(), "unnamed/sub-2.pdf");
    }
}
