//! File-existence probe.

use std::path::PathBuf;

use async_trait::async_trait;
use holdfast::{Check, Metadata, Scope};

/// Reports healthy once the target path exists.
#[derive(Debug, Clone)]
pub struct FileCheck {
    path: PathBuf,
}

impl FileCheck {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Check for FileCheck {
    async fn healthy(&self, _scope: &Scope) -> anyhow::Result<()> {
        tokio::fs::metadata(&self.path).await?;
        Ok(())
    }

    fn metadata(&self) -> Option<Metadata> {
        let mut md = Metadata::new();
        md.set("type", "file");
        md.set("target", self.path.display().to_string());
        Some(md)
    }
}
