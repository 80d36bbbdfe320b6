// SPDX-License-Identifier: AGPL-3.0-or-later
//! Normalizer and asset lookup traits

use crate::ast::NormalizedDocument;
use crate::pandoc::PandocDocument;
use crate::resolve::{AssetKind, ResolveError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Error type for document-level failures.
///
/// Anything below the root (unknown tags, short positional content) is
/// recovered and reported as a diagnostic instead.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid Pandoc AST: {message}")]
    Structure { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NormalizeError {
    pub(crate) fn structure(message: impl Into<String>) -> Self {
        Self::Structure {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NormalizeError>;

/// Configuration for normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Emit the metadata title as a leading level-1 heading
    pub emit_title: bool,
    /// When the top-level walk yields nothing, collect paragraphs and lists
    /// from anywhere in the tree
    pub fallback_walk: bool,
    /// Asset subset that image references are looked up in
    pub image_subset: AssetKind,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            emit_title: true,
            fallback_walk: true,
            image_subset: AssetKind::Images,
        }
    }
}

/// Lookup of referenced assets (images) by name
pub trait AssetLookup {
    /// Resolve `name` inside the `kind` subset of an asset collection
    fn locate(&self, name: &str, kind: &AssetKind) -> std::result::Result<PathBuf, ResolveError>;
}

/// Normalizer trait: reduce a Pandoc document to blocks
pub trait Normalize {
    /// Normalize an already decoded document
    fn normalize(&self, doc: &PandocDocument) -> NormalizedDocument;

    /// Decode Pandoc JSON text and normalize it
    fn normalize_str(&self, input: &str) -> Result<NormalizedDocument> {
        let doc = PandocDocument::from_json_str(input)?;
        Ok(self.normalize(&doc))
    }
}

/// Extension trait for streaming operations (not dyn-compatible)
pub trait NormalizeExt: Normalize {
    /// Normalize from a reader
    fn normalize_reader<R: Read>(&self, reader: R) -> Result<NormalizedDocument> {
        let value: serde_json::Value = serde_json::from_reader(reader)?;
        let doc = PandocDocument::from_value(value)?;
        Ok(self.normalize(&doc))
    }

    /// Normalize a Pandoc JSON file
    fn normalize_file(&self, path: &Path) -> Result<NormalizedDocument> {
        let file = File::open(path)?;
        self.normalize_reader(BufReader::new(file))
    }
}

// Blanket implementation
impl<T: Normalize> NormalizeExt for T {}
