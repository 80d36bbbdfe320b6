// SPDX-License-Identifier: AGPL-3.0-or-later
//! SSP Pipeline - per-document normalization steps
//!
//! A pipeline takes Pandoc JSON files through an ordered list of steps:
//! - Normalize: decode and reduce to typed blocks
//! - Resolve images: look image references up in the asset collection
//! - Resolve links: find the published file each wikilink points at

pub mod config;
pub mod logging;

pub use config::{PathsConfig, PipelineConfig, PipelineStep, StepsConfig};
pub use logging::{init_tracing, LoggingConfig};

use serde::{Deserialize, Serialize};
use ssp_core::{
    AssetResolver, Block, Diagnostic, DiagnosticKind, Normalize, NormalizeError, NormalizeExt,
    NormalizedDocument, Normalizer, WikilinkError, WikilinkResolver,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, info_span, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    #[error("Normalization failed: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Unresolved cross-reference: {0}")]
    Link(#[from] WikilinkError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// A wikilink target and the published file it resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLink {
    pub target: String,
    /// Relative to the output root
    pub path: PathBuf,
}

/// Result of running the pipeline on one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub source: PathBuf,
    pub document: NormalizedDocument,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<ResolvedLink>,
}

impl PipelineOutput {
    /// Pretty JSON for the rendering stage
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Per-file results of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outputs: Vec<PipelineOutput>,
    pub failures: Vec<(PathBuf, PipelineError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Diagnostics across all successful documents
    pub fn diagnostic_count(&self) -> usize {
        self.outputs
            .iter()
            .map(|output| output.document.diagnostics.len())
            .sum()
    }
}

/// Pipeline executor
pub struct Pipeline {
    config: PipelineConfig,
    assets: AssetResolver,
    links: WikilinkResolver,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            assets: AssetResolver::new(&config.paths.assets_root),
            links: WikilinkResolver::new(&config.paths.output_root),
            config,
        })
    }

    /// Load configuration from a TOML file and build the pipeline
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Self::new(PipelineConfig::load(path)?)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn has_step(&self, step: PipelineStep) -> bool {
        self.config.pipeline.steps.contains(&step)
    }

    /// Run the configured steps on one Pandoc JSON file
    pub fn run(&self, source: &Path) -> Result<PipelineOutput> {
        let span = info_span!("document", source = %source.display());
        let _enter = span.enter();

        let mut normalizer = Normalizer::new(self.config.parse.clone());
        if self.has_step(PipelineStep::ResolveImages) {
            normalizer = normalizer.with_assets(&self.assets);
        }
        let mut document = normalizer.normalize_file(source)?;

        let links = if self.has_step(PipelineStep::ResolveLinks) {
            self.resolve_links(&mut document)?
        } else {
            Vec::new()
        };

        info!(
            blocks = document.blocks.len(),
            diagnostics = document.diagnostics.len(),
            links = links.len(),
            "document normalized"
        );

        Ok(PipelineOutput {
            source: source.to_path_buf(),
            document,
            links,
        })
    }

    /// Like [`Pipeline::run`] for Pandoc JSON text that has no source file
    pub fn run_str(&self, input: &str) -> Result<NormalizedDocument> {
        let mut normalizer = Normalizer::new(self.config.parse.clone());
        if self.has_step(PipelineStep::ResolveImages) {
            normalizer = normalizer.with_assets(&self.assets);
        }
        let mut document = normalizer.normalize_str(input)?;
        if self.has_step(PipelineStep::ResolveLinks) {
            self.resolve_links(&mut document)?;
        }
        Ok(document)
    }

    /// Run every source in order, collecting per-file results
    pub fn run_batch<P: AsRef<Path>>(&self, sources: &[P]) -> BatchReport {
        let mut report = BatchReport::default();
        for source in sources {
            let source = source.as_ref();
            match self.run(source) {
                Ok(output) => report.outputs.push(output),
                Err(err) => {
                    warn!(source = %source.display(), error = %err, "document failed");
                    report.failures.push((source.to_path_buf(), err));
                }
            }
        }
        info!(
            succeeded = report.outputs.len(),
            failed = report.failures.len(),
            "batch finished"
        );
        report
    }

    /// Resolve every wikilink block; the first unresolved target fails the
    /// document
    fn resolve_links(&self, document: &mut NormalizedDocument) -> Result<Vec<ResolvedLink>> {
        let format = self.config.pipeline.link_format;
        let mut links = Vec::new();
        let mut ambiguous = Vec::new();

        for (i, block) in document.blocks.iter().enumerate() {
            let Block::Wikilink { target, .. } = block else {
                continue;
            };
            let resolution = self.links.resolve(target, format)?;
            if resolution.is_ambiguous() {
                ambiguous.push(Diagnostic {
                    kind: DiagnosticKind::Ambiguous,
                    tag: Some("Wikilink".to_string()),
                    location: format!("/output/blocks/{i}"),
                    message: format!(
                        "'{target}' matched {} files, using {}",
                        resolution.alternatives.len() + 1,
                        resolution.path.display()
                    ),
                });
            }
            links.push(ResolvedLink {
                target: target.clone(),
                path: resolution.path,
            });
        }

        document.diagnostics.extend(ambiguous);
        Ok(links)
    }
}
