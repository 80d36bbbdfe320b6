// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pipeline configuration loaded from TOML
//!
//! Every section is optional; missing sections and keys take their defaults.

use crate::logging::LoggingConfig;
use crate::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use ssp_core::{OutputFormat, ParseConfig};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub parse: ParseConfig,
    pub pipeline: StepsConfig,
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Normalize must run first, exactly once
    pub fn validate(&self) -> Result<()> {
        match self.pipeline.steps.first() {
            Some(PipelineStep::Normalize) => {}
            Some(step) => {
                return Err(PipelineError::InvalidConfig(format!(
                    "first step must be normalize, got {step}"
                )))
            }
            None => return Err(PipelineError::InvalidConfig("no steps configured".to_string())),
        }

        let mut seen = Vec::with_capacity(self.pipeline.steps.len());
        for step in &self.pipeline.steps {
            if seen.contains(step) {
                return Err(PipelineError::InvalidConfig(format!(
                    "step {step} listed more than once"
                )));
            }
            seen.push(*step);
        }
        Ok(())
    }
}

/// Filesystem roots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Asset collection (`{assets_root}/images/global/...`)
    pub assets_root: PathBuf,
    /// Published output that wikilinks resolve into
    pub output_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("assets"),
            output_root: PathBuf::from("published"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    /// Decode and reduce to blocks
    Normalize,
    /// Look image references up in the asset collection
    ResolveImages,
    /// Resolve wikilinks against the published output
    ResolveLinks,
}

impl PipelineStep {
    pub const ALL: [PipelineStep; 3] = [
        PipelineStep::Normalize,
        PipelineStep::ResolveImages,
        PipelineStep::ResolveLinks,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normalize => "normalize",
            Self::ResolveImages => "resolve_images",
            Self::ResolveLinks => "resolve_links",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[pipeline]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepsConfig {
    pub steps: Vec<PipelineStep>,
    /// Output flavour wikilinks point into
    pub link_format: OutputFormat,
}

impl Default for StepsConfig {
    fn default() -> Self {
        Self {
            steps: PipelineStep::ALL.to_vec(),
            link_format: OutputFormat::Pdf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ssp_core::AssetKind;

    #[test]
    fn test_full_config() {
        let config = PipelineConfig::from_toml_str(
            r#"
[paths]
assets_root = "/srv/ssp/assets"
output_root = "/srv/ssp/published/web"

[parse]
emit_title = false
image_subset = "diagrams"

[pipeline]
steps = ["normalize", "resolve_links"]
link_format = "web"

[logging]
level = "debug"
"#,
        )
        .unwrap();

        assert_eq!(config.paths.assets_root, PathBuf::from("/srv/ssp/assets"));
        assert!(!config.parse.emit_title);
        assert!(config.parse.fallback_walk);
        assert_eq!(
            config.parse.image_subset,
            AssetKind::Other("diagrams".to_string())
        );
        assert_eq!(
            config.pipeline.steps,
            vec![PipelineStep::Normalize, PipelineStep::ResolveLinks]
        );
        assert_eq!(config.pipeline.link_format, OutputFormat::Web);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.pipeline.steps, PipelineStep::ALL.to_vec());
        assert_eq!(config.paths.output_root, PathBuf::from("published"));
    }

    #[test]
    fn test_normalize_must_come_first() {
        let err = PipelineConfig::from_toml_str(
            r#"
[pipeline]
steps = ["resolve_images", "normalize"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("first step must be normalize"));
    }

    #[test]
    fn test_duplicate_and_empty_steps_rejected() {
        for steps in [r#"steps = []"#, r#"steps = ["normalize", "normalize"]"#] {
            let content = format!("[pipeline]\n{steps}\n");
            assert!(matches!(
                PipelineConfig::from_toml_str(&content),
                Err(PipelineError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_unknown_step_is_parse_error() {
        let result = PipelineConfig::from_toml_str(
            r#"
[pipeline]
steps = ["normalize", "render_pdf"]
"#,
        );
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }
}
