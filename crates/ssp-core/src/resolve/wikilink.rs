// SPDX-License-Identifier: AGPL-3.0-or-later
//! Wikilink parsing and resolution against published output
//!
//! `[[SOP-200]]` and `[[SOP-200|Safety procedure]]` refer to other documents
//! by id. Resolution looks for the published file in the output tree.

use super::stays_below_root;
use crate::ast::Block;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WikilinkError {
    #[error("invalid wikilink syntax '{raw}': {reason}")]
    Syntax { raw: String, reason: String },

    #[error("wikilink target '{target}' not found under {}", .root.display())]
    NotFound { target: String, root: PathBuf },
}

/// Parsed `[[target|display]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wikilink {
    pub target: String,
    pub display_text: Option<String>,
}

impl Wikilink {
    pub fn into_block(self) -> Block {
        Block::Wikilink {
            target: self.target,
            display_text: self.display_text,
        }
    }
}

impl FromStr for Wikilink {
    type Err = WikilinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wikilink(s)
    }
}

/// Parse wikilink syntax.
///
/// The text must be wrapped in `[[` and `]]` and the inner content must not be
/// blank. The first `|` separates target from display text.
pub fn parse_wikilink(raw: &str) -> Result<Wikilink, WikilinkError> {
    let syntax = |reason: &str| WikilinkError::Syntax {
        raw: raw.to_string(),
        reason: reason.to_string(),
    };

    let inner = raw
        .strip_prefix("[[")
        .and_then(|rest| rest.strip_suffix("]]"))
        .ok_or_else(|| syntax("not wrapped in [[...]]"))?
        .trim();
    if inner.is_empty() {
        return Err(syntax("empty wikilink"));
    }

    let (target, display_text) = match inner.split_once('|') {
        Some((target, display)) => {
            let display = display.trim();
            (target.trim(), (!display.is_empty()).then(|| display.to_string()))
        }
        None => (inner, None),
    };
    if target.is_empty() {
        return Err(syntax("missing target"));
    }

    Ok(Wikilink {
        target: target.to_string(),
        display_text,
    })
}

/// Published output flavour a link points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pdf,
    Web,
}

impl OutputFormat {
    /// File extension for this format
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Web => "html",
        }
    }
}

/// A resolved link target, relative to the output root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkResolution {
    pub path: PathBuf,
    /// Other candidates that matched the same pattern (ambiguous glob)
    pub alternatives: Vec<PathBuf>,
}

impl LinkResolution {
    pub fn is_ambiguous(&self) -> bool {
        !self.alternatives.is_empty()
    }
}

/// Resolves wikilink targets inside a published output tree
#[derive(Debug, Clone)]
pub struct WikilinkResolver {
    output_root: PathBuf,
}

impl WikilinkResolver {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    /// Resolve a target to a path relative to the output root.
    ///
    /// Tries `{target}.{ext}`, then `{target}*.{ext}` in the root directory,
    /// then `*{target}*.{ext}` anywhere below it. Multiple matches resolve to
    /// the lexicographically first one. A target already carrying the
    /// extension is probed without it. Targets that would leave the output
    /// root (absolute, `..`) are a syntax error.
    pub fn resolve(&self, target: &str, format: OutputFormat) -> Result<LinkResolution, WikilinkError> {
        if !stays_below_root(target) {
            return Err(WikilinkError::Syntax {
                raw: target.to_string(),
                reason: "target leaves the output root".to_string(),
            });
        }

        let suffix = format!(".{}", format.extension());
        let stem = target
            .strip_suffix(&suffix)
            .filter(|stem| !stem.is_empty())
            .unwrap_or(target);

        self.locate(stem, &suffix)
            .ok_or_else(|| WikilinkError::NotFound {
                target: target.to_string(),
                root: self.output_root.clone(),
            })
    }

    fn locate(&self, target: &str, suffix: &str) -> Option<LinkResolution> {
        let exact = PathBuf::from(format!("{target}{suffix}"));
        if self.output_root.join(&exact).is_file() {
            return Some(LinkResolution {
                path: exact,
                alternatives: Vec::new(),
            });
        }

        let mut globbed = self.prefix_matches(target, suffix);
        if !globbed.is_empty() {
            let path = globbed.remove(0);
            if !globbed.is_empty() {
                warn!(
                    link_target = target,
                    chosen = %path.display(),
                    others = globbed.len(),
                    "ambiguous wikilink target"
                );
            }
            return Some(LinkResolution {
                path,
                alternatives: globbed,
            });
        }

        let found = WalkDir::new(&self.output_root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .find(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.ends_with(suffix) && name.contains(target))
            });
        let entry = found?;
        let relative = entry.path().strip_prefix(&self.output_root).ok()?;
        Some(LinkResolution {
            path: relative.to_path_buf(),
            alternatives: Vec::new(),
        })
    }

    /// Files directly in the output root matching `{target}*{suffix}`, sorted
    fn prefix_matches(&self, target: &str, suffix: &str) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.output_root) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(target) && name.ends_with(suffix))
            .collect();
        names.sort();
        names.into_iter().map(PathBuf::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"%PDF").unwrap();
    }

    #[test]
    fn test_parse_with_display() {
        assert_eq!(
            parse_wikilink("[[SOP-100|Intro]]").unwrap(),
            Wikilink {
                target: "SOP-100".to_string(),
                display_text: Some("Intro".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_without_display() {
        let link: Wikilink = "[[SOP-100]]".parse().unwrap();
        assert_eq!(link.target, "SOP-100");
        assert_eq!(link.display_text, None);
    }

    #[test]
    fn test_parse_trims_around_pipe() {
        let link = parse_wikilink("[[ SOP-200 | Safety procedure ]]").unwrap();
        assert_eq!(link.target, "SOP-200");
        assert_eq!(link.display_text.as_deref(), Some("Safety procedure"));
    }

    #[test]
    fn test_parse_rejects_bad_syntax() {
        for raw in ["not-a-link", "[[SOP-100]", "[SOP-100]]", "[[   ]]", "[[|Intro]]"] {
            let err = parse_wikilink(raw).unwrap_err();
            assert!(matches!(err, WikilinkError::Syntax { .. }), "{raw}");
        }
    }

    #[test]
    fn test_resolve_exact_match() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "SOP-100.pdf");
        touch(dir.path(), "SOP-100-v2.pdf");

        let resolver = WikilinkResolver::new(dir.path());
        let resolution = resolver.resolve("SOP-100", OutputFormat::Pdf).unwrap();
        assert_eq!(resolution.path, PathBuf::from("SOP-100.pdf"));
        assert!(!resolution.is_ambiguous());
    }

    #[test]
    fn test_resolve_glob_picks_first_lexically() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "SOP-100_Safety_v2.html");
        touch(dir.path(), "SOP-100_Safety_v1.html");

        let resolver = WikilinkResolver::new(dir.path());
        let resolution = resolver.resolve("SOP-100", OutputFormat::Web).unwrap();
        assert_eq!(resolution.path, PathBuf::from("SOP-100_Safety_v1.html"));
        assert_eq!(
            resolution.alternatives,
            vec![PathBuf::from("SOP-100_Safety_v2.html")]
        );
    }

    #[test]
    fn test_resolve_recursive() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "sop/2024/Final-SOP-300.pdf");

        let resolver = WikilinkResolver::new(dir.path());
        let resolution = resolver.resolve("SOP-300", OutputFormat::Pdf).unwrap();
        assert_eq!(resolution.path, Path::new("sop/2024/Final-SOP-300.pdf"));
    }

    #[test]
    fn test_resolve_respects_format_extension() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "SOP-100.html");

        let resolver = WikilinkResolver::new(dir.path());
        let err = resolver.resolve("SOP-100", OutputFormat::Pdf).unwrap_err();
        assert_eq!(
            err,
            WikilinkError::NotFound {
                target: "SOP-100".to_string(),
                root: dir.path().to_path_buf(),
            }
        );
    }

    #[test]
    fn test_resolve_target_with_extension() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "SOP-100.pdf");
        touch(dir.path(), "SOP-100-v2.pdf");

        let resolver = WikilinkResolver::new(dir.path());
        let resolution = resolver.resolve("SOP-100.pdf", OutputFormat::Pdf).unwrap();
        assert_eq!(resolution.path, PathBuf::from("SOP-100.pdf"));
        assert!(!resolution.is_ambiguous());

        // the extension only counts when it matches the requested format
        assert!(matches!(
            resolver.resolve("SOP-100.pdf", OutputFormat::Web),
            Err(WikilinkError::NotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_refuses_targets_outside_the_root() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        touch(outside.path(), "secret.pdf");
        touch(dir.path(), "published/SOP-1.pdf");

        let resolver = WikilinkResolver::new(dir.path().join("published"));
        let absolute = outside.path().join("secret").to_string_lossy().into_owned();
        for target in [absolute.as_str(), "../published/SOP-1", "sub/../../secret"] {
            let err = resolver.resolve(target, OutputFormat::Pdf).unwrap_err();
            assert!(matches!(err, WikilinkError::Syntax { .. }), "{target}");
        }
    }

    #[test]
    fn test_resolve_missing_root_is_not_found() {
        let resolver = WikilinkResolver::new("/nonexistent/published/pdf");
        assert!(matches!(
            resolver.resolve("SOP-1", OutputFormat::Pdf),
            Err(WikilinkError::NotFound { .. })
        ));
    }
}
