// SPDX-License-Identifier: AGPL-3.0-or-later
//! Asset resolution against the `assets/` collection
//!
//! An asset collection is laid out as `{root}/{subset}/{scope}/...` where
//! the scope is one of `global`, `doc` or `project`, with files placed
//! directly under `{root}/{subset}` also accepted.

use super::stays_below_root;
use crate::traits::AssetLookup;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

/// Scopes searched inside a subset, in priority order
const SCOPES: [&str; 3] = ["global", "doc", "project"];

/// Asset subset (subdirectory of the collection root)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetKind {
    Images,
    Fonts,
    Web,
    Other(String),
}

impl AssetKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Images => "images",
            Self::Fonts => "fonts",
            Self::Web => "web",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl From<String> for AssetKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "images" => Self::Images,
            "fonts" => Self::Fonts,
            "web" => Self::Web,
            _ => Self::Other(name),
        }
    }
}

impl From<AssetKind> for String {
    fn from(kind: AssetKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("asset '{name}' not found in {} locations", .searched.len())]
    NotFound { name: String, searched: Vec<PathBuf> },
}

/// Resolves asset names against a collection root
#[derive(Debug, Clone)]
pub struct AssetResolver {
    root: PathBuf,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The four directories searched for a subset, in priority order
    pub fn candidate_roots(&self, kind: &AssetKind) -> Vec<PathBuf> {
        let subset = self.root.join(kind.as_str());
        SCOPES
            .iter()
            .map(|scope| subset.join(scope))
            .chain(std::iter::once(subset.clone()))
            .collect()
    }

    /// Resolve `name` to a file path.
    ///
    /// Direct candidates are tried first (`global`, `doc`, `project`, then
    /// the subset itself). After that each candidate root is searched
    /// recursively for a file with the same file name, visiting entries in
    /// lexicographic order. The returned path is absolute when the root is.
    /// Names that would leave the collection (absolute, `..`) are never found.
    pub fn resolve(&self, name: &str, kind: &AssetKind) -> Result<PathBuf, ResolveError> {
        if !stays_below_root(name) {
            trace!(name, "asset reference leaves the collection");
            return Err(ResolveError::NotFound {
                name: name.to_string(),
                searched: Vec::new(),
            });
        }

        let roots = self.candidate_roots(kind);
        let mut searched = Vec::with_capacity(roots.len() * 2);

        for root in &roots {
            let candidate = root.join(name);
            trace!(candidate = %candidate.display(), "probing asset");
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(candidate);
        }

        if let Some(file_name) = Path::new(name).file_name() {
            for root in roots.iter().filter(|root| root.is_dir()) {
                let found = WalkDir::new(root)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name);
                if let Some(entry) = found {
                    return Ok(entry.into_path());
                }
                searched.push(root.join("**").join(file_name));
            }
        }

        Err(ResolveError::NotFound {
            name: name.to_string(),
            searched,
        })
    }
}

impl AssetLookup for AssetResolver {
    fn locate(&self, name: &str, kind: &AssetKind) -> Result<PathBuf, ResolveError> {
        self.resolve(name, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn test_doc_scope_found_when_others_missing() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("images/global")).unwrap();
        fs::create_dir_all(dir.path().join("images/project")).unwrap();
        let expected = touch(dir.path(), "images/doc/diagram.png");

        let resolver = AssetResolver::new(dir.path());
        assert_eq!(resolver.resolve("diagram.png", &AssetKind::Images), Ok(expected));
    }

    #[test]
    fn test_global_wins_over_doc() {
        let dir = TempDir::new().unwrap();
        let global = touch(dir.path(), "images/global/logo.png");
        touch(dir.path(), "images/doc/logo.png");

        let resolver = AssetResolver::new(dir.path());
        assert_eq!(resolver.resolve("logo.png", &AssetKind::Images), Ok(global));
    }

    #[test]
    fn test_direct_subset_location() {
        let dir = TempDir::new().unwrap();
        let direct = touch(dir.path(), "fonts/Inter.ttf");

        let resolver = AssetResolver::new(dir.path());
        assert_eq!(resolver.resolve("Inter.ttf", &AssetKind::Fonts), Ok(direct));
    }

    #[test]
    fn test_recursive_search_is_lexicographic() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "images/project/zeta/shot.png");
        let first = touch(dir.path(), "images/project/alpha/shot.png");

        let resolver = AssetResolver::new(dir.path());
        assert_eq!(resolver.resolve("shot.png", &AssetKind::Images), Ok(first));
    }

    #[test]
    fn test_recursive_search_matches_file_name_of_nested_reference() {
        let dir = TempDir::new().unwrap();
        let nested = touch(dir.path(), "images/doc/SOP-200/flow.png");

        let resolver = AssetResolver::new(dir.path());
        assert_eq!(
            resolver.resolve("screenshots/flow.png", &AssetKind::Images),
            Ok(nested)
        );
    }

    #[test]
    fn test_not_found_lists_searched_locations() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("images/global")).unwrap();

        let resolver = AssetResolver::new(dir.path());
        let err = resolver
            .resolve("missing.png", &AssetKind::Images)
            .unwrap_err();
        let ResolveError::NotFound { name, searched } = err;
        assert_eq!(name, "missing.png");
        // four direct candidates plus the recursive search of the existing roots
        assert_eq!(searched.len(), 6);
    }

    #[test]
    fn test_names_outside_the_collection_are_not_found() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let foreign = touch(outside.path(), "evil.png");
        touch(dir.path(), "images/global/evil.png");

        let resolver = AssetResolver::new(dir.path().join("assets"));
        let absolute = foreign.to_string_lossy().into_owned();
        for name in [
            absolute.as_str(),
            "../../../images/global/evil.png",
            "doc/../../evil.png",
        ] {
            let err = resolver.resolve(name, &AssetKind::Images).unwrap_err();
            assert_eq!(
                err,
                ResolveError::NotFound {
                    name: name.to_string(),
                    searched: Vec::new(),
                }
            );
        }
    }

    #[test]
    fn test_asset_kind_string_roundtrip() {
        assert_eq!(AssetKind::from("web".to_string()), AssetKind::Web);
        assert_eq!(
            AssetKind::from("icons".to_string()),
            AssetKind::Other("icons".to_string())
        );
        assert_eq!(String::from(AssetKind::Images), "images");
    }
}
