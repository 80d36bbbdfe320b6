// SPDX-License-Identifier: AGPL-3.0-or-later
//! SSP Core - Pandoc AST normalizer
//!
//! This crate provides:
//! - A total decoder for the Pandoc JSON AST
//! - A flat, typed block model (headings, paragraphs, lists, tables, code,
//!   callouts, images, wikilinks) with recoverable diagnostics
//! - Asset and wikilink resolution against the filesystem

pub mod ast;
pub mod normalize;
pub mod pandoc;
pub mod resolve;
pub mod traits;

pub use ast::{
    Block, CalloutType, ColumnAlignment, Diagnostic, DiagnosticKind, ListKind,
    NormalizedDocument,
};
pub use normalize::Normalizer;
pub use pandoc::PandocDocument;
pub use resolve::{
    parse_wikilink, AssetKind, AssetResolver, LinkResolution, OutputFormat, ResolveError,
    Wikilink, WikilinkError, WikilinkResolver,
};
pub use traits::{AssetLookup, Normalize, NormalizeError, NormalizeExt, ParseConfig, Result};

use std::io::Read;
use std::path::Path;

/// Normalize Pandoc JSON text
pub fn parse_str(input: &str, config: &ParseConfig) -> Result<NormalizedDocument> {
    Normalizer::new(config.clone()).normalize_str(input)
}

/// Normalize an already parsed JSON value
pub fn parse_value(value: serde_json::Value, config: &ParseConfig) -> Result<NormalizedDocument> {
    let doc = PandocDocument::from_value(value)?;
    Ok(Normalizer::new(config.clone()).normalize(&doc))
}

/// Normalize Pandoc JSON read from `reader`
pub fn parse_reader<R: Read>(reader: R, config: &ParseConfig) -> Result<NormalizedDocument> {
    Normalizer::new(config.clone()).normalize_reader(reader)
}

/// Normalize a Pandoc JSON file
pub fn parse_file(path: &Path, config: &ParseConfig) -> Result<NormalizedDocument> {
    Normalizer::new(config.clone()).normalize_file(path)
}
