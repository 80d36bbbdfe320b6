// SPDX-License-Identifier: AGPL-3.0-or-later
//! Table decoding and extraction
//!
//! Pandoc has two table encodings. Since API 1.21 (Pandoc 2.10) a table is
//! `[attr, caption, colspecs, thead, tbodies, tfoot]` with attributed rows
//! and cells. Older output uses `[caption, aligns, widths, headers, rows]`
//! where cells are bare block lists. Both decode into [`TableNode`].

use crate::ast::{Block, ColumnAlignment};
use crate::normalize::inline::reduce_paragraphs;
use crate::pandoc::{decode_alignment, decode_blocks, decode_caption, decode_inlines, Node, Shape};
use serde_json::Value;

/// Table content with the positional structure resolved
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableNode {
    pub caption: Vec<Node>,
    pub alignments: Vec<ColumnAlignment>,
    pub head: Vec<Row>,
    pub bodies: Vec<TableBody>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableBody {
    /// Intermediate head rows
    pub head: Vec<Row>,
    pub rows: Vec<Row>,
}

pub type Row = Vec<Cell>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub content: Vec<Node>,
}

impl TableNode {
    /// Decode a table's positional content in either layout
    pub fn decode(parts: &[Value]) -> Shape<Self> {
        match parts.first() {
            // Modern tables start with an attr triple whose first element is the id
            Some(Value::Array(attr)) if matches!(attr.first(), Some(Value::String(_))) => {
                Self::decode_modern(parts)
            }
            Some(_) => Self::decode_legacy(parts),
            None => Err("empty table".to_string()),
        }
    }

    fn decode_modern(parts: &[Value]) -> Shape<Self> {
        let [_attr, caption, colspecs, thead, tbodies, ..] = parts else {
            return Err(format!(
                "expected at least 5 positional elements, found {}",
                parts.len()
            ));
        };

        let alignments = array(colspecs, "column specs")?
            .iter()
            .map(|spec| {
                spec.as_array()
                    .and_then(|spec| spec.first())
                    .map_or(ColumnAlignment::Default, decode_alignment)
            })
            .collect();

        // thead: [attr, rows]
        let head = match thead.as_array().map(Vec::as_slice) {
            Some([_, rows, ..]) => decode_rows(rows)?,
            _ => return Err("table head is not [attr, rows]".to_string()),
        };

        // tbody: [attr, row_head_columns, head_rows, body_rows]
        let bodies = array(tbodies, "table bodies")?
            .iter()
            .map(|body| -> Shape<TableBody> {
                match body.as_array().map(Vec::as_slice) {
                    Some([_, _, head, rows, ..]) => Ok(TableBody {
                        head: decode_rows(head)?,
                        rows: decode_rows(rows)?,
                    }),
                    _ => Err("table body has fewer than 4 elements".to_string()),
                }
            })
            .collect::<Shape<Vec<_>>>()?;

        Ok(Self {
            caption: decode_caption(caption),
            alignments,
            head,
            bodies,
        })
    }

    fn decode_legacy(parts: &[Value]) -> Shape<Self> {
        let [caption, aligns, _widths, headers, rows, ..] = parts else {
            return Err(format!(
                "expected 5 positional elements, found {}",
                parts.len()
            ));
        };

        let caption = decode_inlines(caption);
        let caption = if caption.is_empty() {
            Vec::new()
        } else {
            vec![Node::Plain(caption)]
        };
        let alignments = array(aligns, "alignments")?
            .iter()
            .map(decode_alignment)
            .collect();
        let header = legacy_row(headers)?;
        let rows = array(rows, "rows")?
            .iter()
            .map(legacy_row)
            .collect::<Shape<Vec<_>>>()?;

        Ok(Self {
            caption,
            alignments,
            head: if header.is_empty() { Vec::new() } else { vec![header] },
            bodies: vec![TableBody {
                head: Vec::new(),
                rows,
            }],
        })
    }
}

fn array<'a>(value: &'a Value, what: &str) -> Shape<&'a [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| format!("{what} are not an array"))
}

/// Rows `[[attr, [cell]]]` with cells `[attr, align, rowspan, colspan, blocks]`
fn decode_rows(rows: &Value) -> Shape<Vec<Row>> {
    array(rows, "rows")?
        .iter()
        .map(|row| -> Shape<Row> {
            let Some([_, cells, ..]) = row.as_array().map(Vec::as_slice) else {
                return Err("table row is not [attr, cells]".to_string());
            };
            array(cells, "cells")?
                .iter()
                .map(|cell| match cell.as_array().map(Vec::as_slice) {
                    Some([_, _, _, _, blocks, ..]) => Ok(Cell {
                        content: decode_blocks(blocks),
                    }),
                    _ => Err("table cell has fewer than 5 elements".to_string()),
                })
                .collect()
        })
        .collect()
}

/// Legacy row: a bare list of cells, each a block list
fn legacy_row(row: &Value) -> Shape<Row> {
    Ok(array(row, "cells")?
        .iter()
        .map(|cell| Cell {
            content: decode_blocks(cell),
        })
        .collect())
}

/// Extract a table block.
///
/// Only the first header row is kept. Body rows from every body group are
/// concatenated in order, intermediate head rows first. Rows are left ragged.
pub fn extract(table: &TableNode) -> Block {
    let caption = reduce_paragraphs(&table.caption);
    let headers = table
        .head
        .first()
        .map(|row| row_text(row))
        .unwrap_or_default();
    let rows = table
        .bodies
        .iter()
        .flat_map(|body| body.head.iter().chain(&body.rows))
        .map(|row| row_text(row))
        .collect();

    Block::Table {
        headers,
        rows,
        caption: (!caption.is_empty()).then_some(caption),
        alignments: table.alignments.clone(),
    }
}

fn row_text(row: &[Cell]) -> Vec<String> {
    row.iter().map(|cell| reduce_paragraphs(&cell.content)).collect()
}
