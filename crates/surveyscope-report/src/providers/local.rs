use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::LocalStorageConfig;
use crate::error::ProviderError;
use crate::traits::DocumentStore;
use crate::types::{RenderedDocument, StoredDocument};

/// Writes reports under a directory and links to them with `file://` URLs.
/// Writes go through `tokio::fs`, so `put` needs a tokio runtime.
#[derive(Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(config: LocalStorageConfig) -> Result<Self, ProviderError> {
        fs::create_dir_all(&config.root)?;
        let root = fs::canonicalize(&config.root)?;
        Ok(Self { root })
    }

    fn target(&self, path: &str) -> Result<PathBuf, ProviderError> {
        let relative = Path::new(path);
        let safe = !path.trim().is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(ProviderError::Config(format!(
                "document path must be relative and stay inside the report dir: {path}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl DocumentStore for LocalDocumentStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn put(
        &self,
        path: &str,
        document: RenderedDocument,
    ) -> Result<StoredDocument, ProviderError> {
        let target = self.target(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &document.bytes).await?;

        Ok(StoredDocument {
            provider: self.name().to_string(),
            path: path.to_string(),
            url: format!("file://{}", target.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_inside_root_and_rejects_escapes() {
        let root = std::env::temp_dir().join(format!("surveyscope-local-{}", std::process::id()));
        let store = LocalDocumentStore::new(LocalStorageConfig::new(&root)).expect("store");

        let stored = store
            .put("pulse/sub-1.pdf", RenderedDocument::pdf(b"%PDF-1.7".to_vec()))
            .await
            .expect("put");
        assert!(stored.url.starts_with("file://"));
        assert!(stored.url.ends_with("sub-1.pdf"));
        let written = fs::read(root.join("pulse").join("sub-1.pdf")).expect("read back");
        assert_eq!(written, b"%PDF-1.7");

        let escaped = store
            .put("../outside.pdf", RenderedDocument::pdf(Vec::new()))
            .await;
        assert!(matches!(escaped, Err(ProviderError::Config(_))));

        let _ = fs::remove_dir_all(root);
    }
}
