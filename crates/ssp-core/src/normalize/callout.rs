// SPDX-License-Identifier: AGPL-3.0-or-later
//! Callout detection for `> [!TYPE]` blockquotes

use crate::ast::{Block, CalloutType};
use crate::normalize::inline::reduce;
use crate::pandoc::Node;
use once_cell::sync::Lazy;
use regex::Regex;

/// `[!TYPE]` at the very start, then the rest of the paragraph.
/// Dot matches newlines so soft breaks after the marker stay in the content.
static CALLOUT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\[!(WARNING|DANGER|NOTE|TIP|INFO|CAUTION)\]\s*(.*)").unwrap()
});

/// Classify a blockquote's children as a callout.
///
/// Returns `None` when the first child is not paragraph-like or does not
/// start with a recognized marker.
pub fn detect(children: &[Node]) -> Option<Block> {
    let first = children.first()?.paragraph_inlines()?;
    let text = reduce(first);
    let captures = CALLOUT_MARKER.captures(&text)?;

    let callout_type = captures.get(1)?.as_str().parse::<CalloutType>().ok()?;
    let remainder = captures.get(2).map_or("", |m| m.as_str()).trim();

    let mut lines = Vec::with_capacity(children.len());
    if !remainder.is_empty() {
        lines.push(remainder.to_string());
    }
    lines.extend(
        children[1..]
            .iter()
            .filter_map(Node::paragraph_inlines)
            .map(reduce),
    );

    Some(Block::Callout {
        callout_type,
        title: None,
        content: lines.join("\n"),
    })
}
