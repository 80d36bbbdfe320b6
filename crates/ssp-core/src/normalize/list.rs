// SPDX-License-Identifier: AGPL-3.0-or-later
//! List flattening
//!
//! A top-level list becomes one `Block::List`. Nested lists are folded into
//! the parent's items with an indent and marker per depth, so `A` with a
//! nested `B` yields the items `"A"` and `"  • B"`. Other blocks inside an
//! item (quotes, callouts, code) go through the generic block handler and
//! contribute their text as indented items.

use super::Walk;
use crate::ast::{Block, ListKind};
use crate::normalize::inline::reduce;
use crate::pandoc::Node;

const INDENT: &str = "  ";
const BULLET: &str = "•";

impl Walk<'_> {
    pub(crate) fn list(
        &mut self,
        kind: ListKind,
        start: i64,
        items: &[Vec<Node>],
        location: &str,
    ) -> Block {
        let mut lines = Vec::new();
        self.flatten(kind, start, items, 0, &items_location(kind, location), &mut lines);

        Block::List {
            kind,
            items: lines,
            start_number: match kind {
                ListKind::Ordered => u32::try_from(start).ok(),
                ListKind::Unordered => None,
            },
        }
    }

    fn flatten(
        &mut self,
        kind: ListKind,
        start: i64,
        items: &[Vec<Node>],
        depth: usize,
        location: &str,
        lines: &mut Vec<String>,
    ) {
        for (i, item) in items.iter().enumerate() {
            let number = start.saturating_add(i64::try_from(i).unwrap_or(i64::MAX));
            let item_location = format!("{location}/{i}");
            let mut text = Vec::new();
            let mut nested = Vec::new();

            for (j, node) in item.iter().enumerate() {
                let node_location = format!("{item_location}/{j}");
                match node {
                    Node::Para(inlines) | Node::Plain(inlines) => {
                        let part = reduce(inlines);
                        let part = part.trim();
                        if !part.is_empty() {
                            text.push(part.to_string());
                        }
                    }
                    Node::BulletList(sub) => self.flatten(
                        ListKind::Unordered,
                        1,
                        sub,
                        depth + 1,
                        &items_location(ListKind::Unordered, &node_location),
                        &mut nested,
                    ),
                    Node::OrderedList { start, items: sub } => self.flatten(
                        ListKind::Ordered,
                        *start,
                        sub,
                        depth + 1,
                        &items_location(ListKind::Ordered, &node_location),
                        &mut nested,
                    ),
                    other => {
                        let mut blocks = Vec::new();
                        self.block(other, &node_location, &mut blocks);
                        nested.extend(
                            blocks
                                .iter()
                                .map(Block::plain_text)
                                .filter(|text| !text.trim().is_empty())
                                .map(|text| indent_lines(&text, depth + 1)),
                        );
                    }
                }
            }

            lines.push(format!("{}{}", marker(kind, depth, number), text.join(" ")));
            lines.append(&mut nested);
        }
    }
}

/// Location of the item array inside a list node
fn items_location(kind: ListKind, location: &str) -> String {
    match kind {
        ListKind::Unordered => format!("{location}/c"),
        ListKind::Ordered => format!("{location}/c/1"),
    }
}

/// Prefix for an item; top-level items carry none, the renderer adds it
fn marker(kind: ListKind, depth: usize, number: i64) -> String {
    if depth == 0 {
        return String::new();
    }
    let indent = INDENT.repeat(depth);
    match kind {
        ListKind::Unordered => format!("{indent}{BULLET} "),
        ListKind::Ordered => format!("{indent}{number}. "),
    }
}

fn indent_lines(text: &str, depth: usize) -> String {
    let indent = INDENT.repeat(depth);
    text.lines()
        .map(|line| format!("{indent}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
