// SPDX-License-Identifier: AGPL-3.0-or-later
//! Filesystem resolution of referenced assets and cross-references

pub mod assets;
pub mod wikilink;

pub use assets::{AssetKind, AssetResolver, ResolveError};
pub use wikilink::{
    parse_wikilink, LinkResolution, OutputFormat, Wikilink, WikilinkError, WikilinkResolver,
};

use std::path::{Component, Path};

/// A reference that stays below whatever root it is joined onto: no root,
/// drive prefix or `..` components
pub(crate) fn stays_below_root(reference: &str) -> bool {
    Path::new(reference)
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
