//! Lookup of files bundled under the templates root.

use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("template {name} not found at {}", path.display())]
  NotFound { name: String, path: PathBuf },
}

/// Resolves paths inside the bundled templates directory.
///
/// Every lookup re-checks the filesystem; nothing is cached.
#[derive(Debug, Clone)]
pub struct TemplateResolver {
  root: PathBuf,
}

impl TemplateResolver {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Join `segments` under the root and verify the result exists.
  pub fn resolve(&self, segments: &[&str]) -> Result<PathBuf, TemplateError> {
    let path = segments.iter().fold(self.root.clone(), |acc, seg| acc.join(seg));
    debug!(template = %segments.join("/"), path = %path.display(), "resolving template");

    if path.exists() {
      Ok(path)
    } else {
      Err(TemplateError::NotFound {
        name: segments.join("/"),
        path,
      })
    }
  }
}
