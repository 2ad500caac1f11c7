use std::path::PathBuf;
use std::time::Duration;

use crate::error::ProviderError;

#[derive(Debug, Clone)]
pub struct GotenbergConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub paper_width_in: f32,
    pub paper_height_in: f32,
}

impl GotenbergConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            // A4
            paper_width_in: 8.27,
            paper_height_in: 11.7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SupabaseStorageConfig {
    pub base_url: String,
    pub service_key: String,
    pub bucket: String,
    pub timeout: Duration,
    /// When set, links are signed for this many seconds instead of using the
    /// bucket's public URL.
    pub signed_link_ttl_secs: Option<u64>,
}

impl SupabaseStorageConfig {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            service_key: service_key.into(),
            bucket: "reports".to_string(),
            timeout: Duration::from_secs(15),
            signed_link_ttl_secs: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalStorageConfig {
    pub root: PathBuf,
}

impl LocalStorageConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    pub from: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl ResendConfig {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            from: from.into(),
            endpoint: "https://api.resend.com/emails".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PdfRendererConfig {
    Gotenberg(GotenbergConfig),
}

#[derive(Debug, Clone)]
pub enum DocumentStoreConfig {
    Supabase(SupabaseStorageConfig),
    Local(LocalStorageConfig),
}

#[derive(Debug, Clone)]
pub enum MailerConfig {
    Resend(ResendConfig),
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandingConfig {
    pub name: String,
    pub primary_color: String,
    pub logo_url: Option<String>,
    pub footer: Option<String>,
    pub show_category_breakdown: bool,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            name: "Survey Report".to_string(),
            primary_color: "#2f5d8a".to_string(),
            logo_url: None,
            footer: None,
            show_category_breakdown: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub pdf: PdfRendererConfig,
    pub documents: DocumentStoreConfig,
    pub mailer: MailerConfig,
    pub branding: BrandingConfig,
}

impl ReportConfig {
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let pdf = match get("SURVEYSCOPE_PDF_PROVIDER")
            .unwrap_or_else(|| "gotenberg".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "gotenberg" => {
                let base_url = get("SURVEYSCOPE_GOTENBERG_URL")
                    .unwrap_or_else(|| "http://127.0.0.1:3000".to_string());
                PdfRendererConfig::Gotenberg(GotenbergConfig::new(base_url))
            }
            other => {
                return Err(ProviderError::Config(format!(
                    "unsupported SURVEYSCOPE_PDF_PROVIDER: {other}"
                )));
            }
        };

        let storage_provider = get("SURVEYSCOPE_STORAGE_PROVIDER")
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_else(|| {
                if get("SUPABASE_URL").is_some() {
                    "supabase".to_string()
                } else {
                    "local".to_string()
                }
            });
        let documents = match storage_provider.as_str() {
            "supabase" => {
                let base_url = get("SUPABASE_URL").ok_or_else(|| {
                    ProviderError::Config("SUPABASE_URL is required for supabase storage".to_string())
                })?;
                let service_key = get("SUPABASE_SERVICE_KEY").ok_or_else(|| {
                    ProviderError::Config(
                        "SUPABASE_SERVICE_KEY is required for supabase storage".to_string(),
                    )
                })?;
                let mut cfg = SupabaseStorageConfig::new(base_url, service_key);
                if let Some(bucket) = get("SURVEYSCOPE_REPORT_BUCKET") {
                    cfg.bucket = bucket;
                }
                if let Some(raw) = get("SURVEYSCOPE_REPORT_LINK_TTL_SECS") {
                    let ttl = raw.parse::<u64>().map_err(|_| {
                        ProviderError::Config(format!(
                            "SURVEYSCOPE_REPORT_LINK_TTL_SECS must be a whole number, got {raw}"
                        ))
                    })?;
                    cfg.signed_link_ttl_secs = Some(ttl.max(1));
                }
                DocumentStoreConfig::Supabase(cfg)
            }
            "local" => DocumentStoreConfig::Local(LocalStorageConfig::new(
                get("SURVEYSCOPE_REPORT_DIR").unwrap_or_else(|| "./data/reports".to_string()),
            )),
            other => {
                return Err(ProviderError::Config(format!(
                    "unsupported SURVEYSCOPE_STORAGE_PROVIDER: {other}"
                )));
            }
        };

        let mail_provider = get("SURVEYSCOPE_MAIL_PROVIDER")
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_else(|| {
                if get("RESEND_API_KEY").is_some() {
                    "resend".to_string()
                } else {
                    "none".to_string()
                }
            });
        let mailer = match mail_provider.as_str() {
            "resend" => {
                let api_key = get("RESEND_API_KEY").ok_or_else(|| {
                    ProviderError::Config("RESEND_API_KEY is required for resend".to_string())
                })?;
                let from = get("SURVEYSCOPE_MAIL_FROM").ok_or_else(|| {
                    ProviderError::Config("SURVEYSCOPE_MAIL_FROM is required for resend".to_string())
                })?;
                MailerConfig::Resend(ResendConfig::new(api_key, from))
            }
            "none" | "disabled" | "off" => MailerConfig::Disabled,
            other => {
                return Err(ProviderError::Config(format!(
                    "unsupported SURVEYSCOPE_MAIL_PROVIDER: {other}"
                )));
            }
        };

        let defaults = BrandingConfig::default();
        let branding = BrandingConfig {
            name: get("SURVEYSCOPE_BRAND_NAME").unwrap_or(defaults.name),
            primary_color: get("SURVEYSCOPE_BRAND_COLOR").unwrap_or(defaults.primary_color),
            logo_url: get("SURVEYSCOPE_BRAND_LOGO_URL"),
            footer: get("SURVEYSCOPE_REPORT_FOOTER"),
            show_category_breakdown: get("SURVEYSCOPE_REPORT_BREAKDOWN")
                .map_or(defaults.show_category_breakdown, |v| {
                    !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no")
                }),
        };

        Ok(Self {
            pdf,
            documents,
            mailer,
            branding,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect::<HashMap<_, _>>();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_local_defaults() {
        let cfg = ReportConfig::from_lookup(lookup(&[])).expect("defaults");
        assert!(matches!(
            cfg.pdf,
            PdfRendererConfig::Gotenberg(ref g) if g.base_url == "http://127.0.0.1:3000"
        ));
        assert!(matches!(cfg.documents, DocumentStoreConfig::Local(_)));
        assert!(matches!(cfg.mailer, MailerConfig::Disabled));
        assert_eq!(cfg.branding, BrandingConfig::default());
    }

    #[test]
    fn supabase_and_resend_are_inferred_from_credentials() {
        let cfg = ReportConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://proj.supabase.co"),
            ("SUPABASE_SERVICE_KEY", "service"),
            ("SURVEYSCOPE_REPORT_LINK_TTL_SECS", "3600"),
            ("RESEND_API_KEY", "re_123"),
            ("SURVEYSCOPE_MAIL_FROM", "Reports <reports@example.com>"),
            ("SURVEYSCOPE_REPORT_BREAKDOWN", "off"),
        ]))
        .expect("config");
        match cfg.documents {
            DocumentStoreConfig::Supabase(s) => {
                assert_eq!(s.bucket, "reports");
                assert_eq!(s.signed_link_ttl_secs, Some(3600));
            }
            DocumentStoreConfig::Local(_) => panic!("expected supabase storage"),
        }
        assert!(matches!(cfg.mailer, MailerConfig::Resend(ref r) if r.api_key == "re_123"));
        assert!(!cfg.branding.show_category_breakdown);
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        let err = ReportConfig::from_lookup(lookup(&[("SURVEYSCOPE_STORAGE_PROVIDER", "supabase")]))
            .expect_err("missing url");
        assert!(err.to_string().contains("SUPABASE_URL"));

        let err = ReportConfig::from_lookup(lookup(&[("RESEND_API_KEY", "re_123")]))
            .expect_err("missing sender");
        assert!(err.to_string().contains("SURVEYSCOPE_MAIL_FROM"));

        let err = ReportConfig::from_lookup(lookup(&[("SURVEYSCOPE_PDF_PROVIDER", "wkhtml")]))
            .expect_err("unknown renderer");
        assert!(matches!(err, ProviderError::Config(_)));
    }
}
