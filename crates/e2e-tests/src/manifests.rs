//! Manifest template rendering.
//!
//! The deployment manifests are checked in as templates with `{{name}}`
//! placeholders. Rendering substitutes the per-run values and writes the
//! result to a temp file that kubectl consumes; the file is deleted when the
//! handle goes out of scope.

use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Manifest rendering errors. All of these are fatal to the run.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read template {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write rendered manifest: {0}")]
    Write(#[from] std::io::Error),

    #[error("template {path} still contains a placeholder after rendering: {remainder}")]
    Unresolved { path: PathBuf, remainder: String },
}

/// Values substituted into the manifest templates.
#[derive(Debug, Clone)]
pub struct TemplateValues {
    pub cluster: String,
    pub location: String,
    pub namespace: String,
    pub project_id: String,
}

impl TemplateValues {
    fn substitutions(&self) -> [(&'static str, &str); 4] {
        [
            ("{{cluster}}", &self.cluster),
            ("{{location}}", &self.location),
            ("{{namespace}}", &self.namespace),
            ("{{project_id}}", &self.project_id),
        ]
    }
}

/// A rendered manifest backed by a temp file.
///
/// The file is removed when this handle drops, after kubectl has consumed it.
#[derive(Debug)]
pub struct RenderedManifest {
    file: NamedTempFile,
}

impl RenderedManifest {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Render `template` with `values` into a fresh temp file.
///
/// Fails if the template cannot be read, the temp file cannot be written, or
/// any `{{...}}` placeholder survives substitution (a typo in the template
/// would otherwise reach the cluster).
pub fn render(template: &Path, values: &TemplateValues) -> Result<RenderedManifest, ManifestError> {
    let mut contents =
        std::fs::read_to_string(template).map_err(|source| ManifestError::Read {
            path: template.to_path_buf(),
            source,
        })?;

    for (placeholder, value) in values.substitutions() {
        contents = contents.replace(placeholder, value);
    }

    if let Some(start) = contents.find("{{") {
        let remainder: String = contents[start..].chars().take(40).collect();
        return Err(ManifestError::Unresolved {
            path: template.to_path_buf(),
            remainder,
        });
    }

    let file = NamedTempFile::with_prefix("e2e-")?;
    std::fs::write(file.path(), contents)?;
    debug!(template = %template.display(), rendered = %file.path().display(), "rendered manifest");

    Ok(RenderedManifest { file })
}
