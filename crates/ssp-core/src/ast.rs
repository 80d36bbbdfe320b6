// SPDX-License-Identifier: AGPL-3.0-or-later
//! Normalized block model
//!
//! This is the output side of the normalizer: a flat sequence of typed blocks
//! with all inline formatting reduced to plain text. Renderers consume these
//! blocks; nothing here knows about HTML, CSS or page layout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Block-level content after normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Heading with level 1-6
    Heading {
        level: u8,
        text: String,
        id: Option<String>,
    },

    /// Plain paragraph
    Paragraph { text: String },

    /// Ordered or unordered list.
    ///
    /// Nested lists are flattened into `items`: each nested entry carries two
    /// spaces of indent per depth and its own bullet or number prefix.
    List {
        kind: ListKind,
        items: Vec<String>,
        start_number: Option<u32>,
    },

    /// Table. Rows are not padded to the header width.
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        caption: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        alignments: Vec<ColumnAlignment>,
    },

    /// Code block with optional language
    CodeBlock {
        code: String,
        language: Option<String>,
    },

    /// Admonition detected from a `> [!TYPE]` blockquote
    Callout {
        callout_type: CalloutType,
        title: Option<String>,
        content: String,
    },

    /// Image reference, resolved against the asset collection when possible
    Image {
        path: String,
        alt_text: Option<String>,
        caption: Option<String>,
    },

    /// Internal cross-reference (`[[target|display]]`)
    Wikilink {
        target: String,
        display_text: Option<String>,
    },
}

impl Block {
    /// Build a heading, clamping the level into 1..=6
    pub fn heading(level: i64, text: impl Into<String>, id: Option<String>) -> Self {
        Block::Heading {
            level: level.clamp(1, 6) as u8,
            text: text.into(),
            id,
        }
    }

    /// Text content of this block as a single string.
    ///
    /// Used when a block has to be folded into a list item, and for counting.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Heading { text, .. } | Block::Paragraph { text } => text.clone(),
            Block::List { items, .. } => items.join("\n"),
            Block::Table {
                headers,
                rows,
                caption,
                ..
            } => {
                let mut lines = Vec::with_capacity(rows.len() + 2);
                if let Some(caption) = caption {
                    lines.push(caption.clone());
                }
                if !headers.is_empty() {
                    lines.push(headers.join(" | "));
                }
                lines.extend(rows.iter().map(|row| row.join(" | ")));
                lines.join("\n")
            }
            Block::CodeBlock { code, .. } => code.clone(),
            Block::Callout {
                callout_type,
                content,
                ..
            } => {
                if content.is_empty() {
                    callout_type.to_string()
                } else {
                    format!("{callout_type}: {content}")
                }
            }
            Block::Image { path, alt_text, .. } => {
                alt_text.clone().unwrap_or_else(|| path.clone())
            }
            Block::Wikilink {
                target,
                display_text,
            } => display_text.clone().unwrap_or_else(|| target.clone()),
        }
    }

    /// Count words in this block
    pub fn word_count(&self) -> usize {
        match self {
            Block::Image { alt_text, .. } => alt_text
                .as_deref()
                .map_or(0, |alt| alt.split_whitespace().count()),
            _ => self.plain_text().split_whitespace().count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Ordered,
    Unordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnAlignment {
    Left,
    Center,
    Right,
    Default,
}

impl ColumnAlignment {
    /// Map a Pandoc alignment tag (`AlignLeft`, ...) to an alignment
    pub fn from_pandoc_tag(tag: &str) -> Self {
        match tag {
            "AlignLeft" => Self::Left,
            "AlignCenter" => Self::Center,
            "AlignRight" => Self::Right,
            _ => Self::Default,
        }
    }
}

/// Recognized admonition markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CalloutType {
    Warning,
    Danger,
    Note,
    Tip,
    Info,
    Caution,
}

impl CalloutType {
    pub const ALL: [Self; 6] = [
        Self::Warning,
        Self::Danger,
        Self::Note,
        Self::Tip,
        Self::Info,
        Self::Caution,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::Danger => "DANGER",
            Self::Note => "NOTE",
            Self::Tip => "TIP",
            Self::Info => "INFO",
            Self::Caution => "CAUTION",
        }
    }
}

impl fmt::Display for CalloutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the callout markers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown callout type: {0}")]
pub struct UnknownCalloutType(pub String);

impl FromStr for CalloutType {
    type Err = UnknownCalloutType;

    /// Case-insensitive lookup
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCalloutType(s.to_string()))
    }
}

/// Category of a recovered problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A node was unsupported or malformed and was skipped
    BlockSkip,
    /// An asset or link target could not be found
    NotFound,
    /// Wikilink delimiter syntax was malformed
    Syntax,
    /// Resolution succeeded but more than one candidate matched
    Ambiguous,
}

/// A recovered problem, with enough context to log it meaningfully
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Pandoc tag of the offending node, when there is one
    pub tag: Option<String>,
    /// JSON-pointer-like location in the input (`/blocks/3/c/0`)
    pub location: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{} [{}]: {}", self.location, tag, self.message),
            None => write!(f, "{}: {}", self.location, self.message),
        }
    }
}

/// Result of normalizing one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedDocument {
    /// Title declared in the document metadata
    pub title: Option<String>,
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl NormalizedDocument {
    /// Count words in the document
    pub fn word_count(&self) -> usize {
        self.blocks.iter().map(Block::word_count).sum()
    }

    /// Wikilink blocks in document order
    pub fn wikilinks(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Wikilink {
                target,
                display_text,
            } => Some((target.as_str(), display_text.as_deref())),
            _ => None,
        })
    }

    /// Diagnostics of one kind
    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_heading_clamps_level() {
        assert!(matches!(Block::heading(0, "a", None), Block::Heading { level: 1, .. }));
        assert!(matches!(Block::heading(9, "a", None), Block::Heading { level: 6, .. }));
        assert!(matches!(Block::heading(3, "a", None), Block::Heading { level: 3, .. }));
    }

    #[test]
    fn test_callout_type_from_str_ignores_case() {
        assert_eq!("warning".parse::<CalloutType>(), Ok(CalloutType::Warning));
        assert_eq!("Tip".parse::<CalloutType>(), Ok(CalloutType::Tip));
        assert!("IMPORTANT".parse::<CalloutType>().is_err());
    }

    #[test]
    fn test_block_serializes_with_type_tag() {
        let block = Block::Callout {
            callout_type: CalloutType::Danger,
            title: None,
            content: "High voltage".to_string(),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "callout");
        assert_eq!(json["callout_type"], "DANGER");
    }

    #[test]
    fn test_plain_text_of_callout_and_table() {
        let callout = Block::Callout {
            callout_type: CalloutType::Note,
            title: None,
            content: "Read this".to_string(),
        };
        assert_eq!(callout.plain_text(), "NOTE: Read this");

        let table = Block::Table {
            headers: vec!["a".into(), "b".into()],
            rows: vec![vec!["1".into()]],
            caption: None,
            alignments: Vec::new(),
        };
        assert_eq!(table.plain_text(), "a | b\n1");
    }

    #[test]
    fn test_word_count() {
        let doc = NormalizedDocument {
            title: None,
            blocks: vec![
                Block::Paragraph {
                    text: "Hello world this is a test".to_string(),
                },
                Block::Image {
                    path: "assets/images/global/logo.png".to_string(),
                    alt_text: None,
                    caption: None,
                },
            ],
            diagnostics: Vec::new(),
        };
        assert_eq!(doc.word_count(), 6);
    }
}
