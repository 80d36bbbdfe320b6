// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pandoc JSON AST input model
//!
//! Pandoc encodes every node as `{"t": Tag, "c": content}` where the shape of
//! `c` depends on the tag. Decoding into these enums is total: unknown tags
//! become `Unknown`, block nodes with too little positional content become
//! [`Node::Malformed`], and missing inline text reads as the empty string.
//! Only the document root can fail to decode.

use crate::ast::ColumnAlignment;
use crate::normalize::table::TableNode;
use crate::traits::{NormalizeError, Result};
use serde_json::{Map, Value};

/// Outcome of decoding a positional payload; the error is a short reason
pub(crate) type Shape<T> = std::result::Result<T, String>;

/// Decoded Pandoc document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PandocDocument {
    /// `pandoc-api-version`, when present
    pub api_version: Vec<u64>,
    /// `meta.title`, when present
    pub title: Option<MetaValue>,
    pub blocks: Vec<Node>,
}

impl PandocDocument {
    /// Decode from Pandoc JSON text
    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Decode from an already parsed JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        let root = match value {
            Value::Object(root) => root,
            other => {
                return Err(NormalizeError::structure(format!(
                    "root must be an object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let blocks = match root.get("blocks") {
            Some(Value::Array(blocks)) => blocks.iter().map(decode_block).collect(),
            Some(other) => {
                return Err(NormalizeError::structure(format!(
                    "'blocks' must be an array, got {}",
                    json_kind(other)
                )))
            }
            None => return Err(NormalizeError::structure("missing 'blocks' key")),
        };

        let api_version = root
            .get("pandoc-api-version")
            .and_then(Value::as_array)
            .map(|parts| parts.iter().filter_map(Value::as_u64).collect())
            .unwrap_or_default();

        let title = root
            .get("meta")
            .and_then(Value::as_object)
            .and_then(|meta| meta.get("title"))
            .map(decode_meta);

        Ok(Self {
            api_version,
            title,
            blocks,
        })
    }
}

/// Metadata value; only the variants a title can take are distinguished
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    String(String),
    Inlines(Vec<Inline>),
    Blocks(Vec<Node>),
    Other,
}

/// Block-level node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Header {
        level: i64,
        id: Option<String>,
        content: Vec<Inline>,
    },
    Para(Vec<Inline>),
    Plain(Vec<Inline>),
    /// Each item is the item's block list, unwrapped
    BulletList(Vec<Vec<Node>>),
    OrderedList {
        start: i64,
        items: Vec<Vec<Node>>,
    },
    CodeBlock {
        classes: Vec<String>,
        code: String,
    },
    BlockQuote(Vec<Node>),
    Table(Box<TableNode>),
    Div {
        classes: Vec<String>,
        content: Vec<Node>,
    },
    Figure {
        caption: Vec<Node>,
        content: Vec<Node>,
    },
    /// Tag not modelled here (RawBlock, HorizontalRule, ...)
    Unknown { tag: String },
    /// Known tag whose content did not have the expected shape
    Malformed { tag: String, reason: String },
}

impl Node {
    /// The Pandoc tag this node was decoded from
    pub fn tag(&self) -> &str {
        match self {
            Node::Header { .. } => "Header",
            Node::Para(_) => "Para",
            Node::Plain(_) => "Plain",
            Node::BulletList(_) => "BulletList",
            Node::OrderedList { .. } => "OrderedList",
            Node::CodeBlock { .. } => "CodeBlock",
            Node::BlockQuote(_) => "BlockQuote",
            Node::Table(_) => "Table",
            Node::Div { .. } => "Div",
            Node::Figure { .. } => "Figure",
            Node::Unknown { tag } | Node::Malformed { tag, .. } => tag.as_str(),
        }
    }

    /// Inline content of a paragraph-like node
    pub fn paragraph_inlines(&self) -> Option<&[Inline]> {
        match self {
            Node::Para(inlines) | Node::Plain(inlines) => Some(inlines),
            _ => None,
        }
    }
}

/// Inline node
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Str(String),
    Space,
    SoftBreak,
    LineBreak,
    Emph(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikeout(Vec<Inline>),
    Superscript(Vec<Inline>),
    Subscript(Vec<Inline>),
    Underline(Vec<Inline>),
    SmallCaps(Vec<Inline>),
    Code(String),
    Link {
        classes: Vec<String>,
        content: Vec<Inline>,
        url: String,
        title: String,
    },
    Image {
        alt: Vec<Inline>,
        url: String,
        title: String,
    },
    Unknown(String),
}

impl Inline {
    pub fn str(text: impl Into<String>) -> Self {
        Inline::Str(text.into())
    }

    /// Whitespace-only inline (spaces and breaks)
    pub fn is_blank(&self) -> bool {
        match self {
            Inline::Space | Inline::SoftBreak | Inline::LineBreak => true,
            Inline::Str(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

/// Pandoc attribute triple `[id, [classes], [[key, value]]]`
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Attr {
    pub id: Option<String>,
    pub classes: Vec<String>,
}

pub(crate) fn decode_attr(value: &Value) -> Attr {
    let Some(parts) = value.as_array() else {
        return Attr::default();
    };
    let id = parts
        .first()
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string);
    let classes = parts
        .get(1)
        .and_then(Value::as_array)
        .map(|classes| {
            classes
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Attr { id, classes }
}

/// Split a node object into its tag and content
fn tag_and_content(value: &Value) -> Option<(&str, Option<&Value>)> {
    let object: &Map<String, Value> = value.as_object()?;
    let tag = object.get("t")?.as_str()?;
    Some((tag, object.get("c")))
}

/// Content as a positional array with at least `min` elements
fn positional<'a>(content: Option<&'a Value>, min: usize) -> Shape<&'a [Value]> {
    match content {
        Some(Value::Array(parts)) if parts.len() >= min => Ok(parts),
        Some(Value::Array(parts)) => Err(format!(
            "expected at least {min} positional elements, found {}",
            parts.len()
        )),
        Some(other) => Err(format!("expected an array, got {}", json_kind(other))),
        None => Err("missing content".to_string()),
    }
}

pub(crate) fn decode_blocks(value: &Value) -> Vec<Node> {
    value
        .as_array()
        .map(|blocks| blocks.iter().map(decode_block).collect())
        .unwrap_or_default()
}

pub(crate) fn decode_block(value: &Value) -> Node {
    let Some((tag, content)) = tag_and_content(value) else {
        return Node::Malformed {
            tag: "unknown".to_string(),
            reason: "node is not a tagged object".to_string(),
        };
    };

    let decoded = match tag {
        "Header" => decode_header(content),
        "Para" => Ok(Node::Para(content.map(decode_inlines).unwrap_or_default())),
        "Plain" => Ok(Node::Plain(content.map(decode_inlines).unwrap_or_default())),
        "BulletList" => positional(content, 0).map(|items| Node::BulletList(decode_items(items))),
        "OrderedList" => decode_ordered_list(content),
        "CodeBlock" => decode_code_block(content),
        "BlockQuote" => positional(content, 0)
            .map(|blocks| Node::BlockQuote(blocks.iter().map(decode_block).collect())),
        "Table" => positional(content, 0)
            .and_then(TableNode::decode)
            .map(|table| Node::Table(Box::new(table))),
        "Div" => positional(content, 2).map(|parts| Node::Div {
            classes: decode_attr(&parts[0]).classes,
            content: decode_blocks(&parts[1]),
        }),
        "Figure" => positional(content, 3).map(|parts| Node::Figure {
            caption: decode_caption(&parts[1]),
            content: decode_blocks(&parts[2]),
        }),
        other => Ok(Node::Unknown {
            tag: other.to_string(),
        }),
    };

    decoded.unwrap_or_else(|reason| Node::Malformed {
        tag: tag.to_string(),
        reason,
    })
}

fn decode_header(content: Option<&Value>) -> Shape<Node> {
    let parts = positional(content, 3)?;
    let level = parts[0]
        .as_i64()
        .ok_or_else(|| "heading level is not an integer".to_string())?;
    Ok(Node::Header {
        level,
        id: decode_attr(&parts[1]).id,
        content: decode_inlines(&parts[2]),
    })
}

fn decode_ordered_list(content: Option<&Value>) -> Shape<Node> {
    let parts = positional(content, 2)?;
    let start = parts[0]
        .as_array()
        .and_then(|attrs| attrs.first())
        .and_then(Value::as_i64)
        .unwrap_or(1);
    let items = parts[1]
        .as_array()
        .ok_or_else(|| "list items are not an array".to_string())?;
    Ok(Node::OrderedList {
        start,
        items: decode_items(items),
    })
}

fn decode_code_block(content: Option<&Value>) -> Shape<Node> {
    let parts = positional(content, 2)?;
    let code = parts[1]
        .as_str()
        .ok_or_else(|| "code is not a string".to_string())?;
    Ok(Node::CodeBlock {
        classes: decode_attr(&parts[0]).classes,
        code: code.to_string(),
    })
}

/// List items are `[blocks]`, but some producers wrap them once more as
/// `[[blocks]]`. Both are accepted.
fn decode_items(items: &[Value]) -> Vec<Vec<Node>> {
    items
        .iter()
        .map(|item| match item.as_array().map(Vec::as_slice) {
            Some([inner @ Value::Array(_), ..]) => decode_blocks(inner),
            Some(blocks) => blocks.iter().map(decode_block).collect(),
            None => Vec::new(),
        })
        .collect()
}

/// Caption `[short, [blocks]]`
pub(crate) fn decode_caption(value: &Value) -> Vec<Node> {
    value
        .as_array()
        .and_then(|parts| parts.get(1))
        .map(decode_blocks)
        .unwrap_or_default()
}

fn decode_meta(value: &Value) -> MetaValue {
    match tag_and_content(value) {
        Some(("MetaInlines", Some(content))) => MetaValue::Inlines(decode_inlines(content)),
        Some(("MetaString", Some(Value::String(text)))) => MetaValue::String(text.clone()),
        Some(("MetaBlocks", Some(content))) => MetaValue::Blocks(decode_blocks(content)),
        _ => MetaValue::Other,
    }
}

pub(crate) fn decode_inlines(value: &Value) -> Vec<Inline> {
    value
        .as_array()
        .map(|inlines| inlines.iter().map(decode_inline).collect())
        .unwrap_or_default()
}

fn decode_inline(value: &Value) -> Inline {
    let Some((tag, content)) = tag_and_content(value) else {
        return Inline::Unknown("unknown".to_string());
    };
    let wrapped = || content.map(decode_inlines).unwrap_or_default();

    match tag {
        "Str" => Inline::Str(content.and_then(Value::as_str).unwrap_or_default().to_string()),
        "Space" => Inline::Space,
        "SoftBreak" => Inline::SoftBreak,
        "LineBreak" => Inline::LineBreak,
        "Emph" => Inline::Emph(wrapped()),
        "Strong" => Inline::Strong(wrapped()),
        "Strikeout" => Inline::Strikeout(wrapped()),
        "Superscript" => Inline::Superscript(wrapped()),
        "Subscript" => Inline::Subscript(wrapped()),
        "Underline" => Inline::Underline(wrapped()),
        "SmallCaps" => Inline::SmallCaps(wrapped()),
        "Code" => {
            let code = match content {
                Some(Value::Array(parts)) => parts.get(1).and_then(Value::as_str),
                Some(Value::String(code)) => Some(code.as_str()),
                _ => None,
            };
            Inline::Code(code.unwrap_or_default().to_string())
        }
        "Link" => {
            let parts = content.and_then(Value::as_array);
            let part = |i: usize| parts.and_then(|p| p.get(i));
            let (url, title) = decode_target(part(2));
            Inline::Link {
                classes: part(0).map(decode_attr).unwrap_or_default().classes,
                content: part(1).map(decode_inlines).unwrap_or_default(),
                url,
                title,
            }
        }
        "Image" => {
            let parts = content.and_then(Value::as_array);
            let part = |i: usize| parts.and_then(|p| p.get(i));
            let (url, title) = decode_target(part(2));
            Inline::Image {
                alt: part(1).map(decode_inlines).unwrap_or_default(),
                url,
                title,
            }
        }
        other => Inline::Unknown(other.to_string()),
    }
}

/// Link target `[url, title]`
fn decode_target(value: Option<&Value>) -> (String, String) {
    let parts = value.and_then(Value::as_array);
    let text = |i: usize| {
        parts
            .and_then(|p| p.get(i))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    (text(0), text(1))
}

pub(crate) fn decode_alignment(value: &Value) -> ColumnAlignment {
    tag_and_content(value)
        .map(|(tag, _)| ColumnAlignment::from_pandoc_tag(tag))
        .unwrap_or(ColumnAlignment::Default)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
