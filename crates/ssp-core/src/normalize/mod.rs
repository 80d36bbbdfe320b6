// SPDX-License-Identifier: AGPL-3.0-or-later
//! Block dispatch: Pandoc nodes to normalized blocks
//!
//! The walk is best-effort. Unsupported or malformed nodes are skipped with a
//! diagnostic and the walk carries on; only a bad document root is an error,
//! and that is caught while decoding.

pub mod callout;
pub mod inline;
mod list;
pub mod table;

use crate::ast::{Block, Diagnostic, DiagnosticKind, ListKind, NormalizedDocument};
use crate::pandoc::{Inline, MetaValue, Node, PandocDocument};
use crate::resolve::parse_wikilink;
use crate::traits::{AssetLookup, Normalize, ParseConfig};
use inline::{reduce, reduce_paragraphs};
use tracing::debug;

/// Pandoc document normalizer
pub struct Normalizer<'a> {
    config: ParseConfig,
    assets: Option<&'a dyn AssetLookup>,
}

impl<'a> Normalizer<'a> {
    pub fn new(config: ParseConfig) -> Self {
        Self {
            config,
            assets: None,
        }
    }

    /// Resolve image references through `assets`
    pub fn with_assets(mut self, assets: &'a dyn AssetLookup) -> Self {
        self.assets = Some(assets);
        self
    }
}

impl Default for Normalizer<'_> {
    fn default() -> Self {
        Self::new(ParseConfig::default())
    }
}

impl Normalize for Normalizer<'_> {
    fn normalize(&self, doc: &PandocDocument) -> NormalizedDocument {
        let mut walk = Walk {
            config: &self.config,
            assets: self.assets,
            diagnostics: Vec::new(),
        };

        let mut blocks = Vec::new();
        walk.blocks(&doc.blocks, "/blocks", &mut blocks);

        if blocks.is_empty() && self.config.fallback_walk && !doc.blocks.is_empty() {
            debug!("top-level walk produced no blocks, collecting nested content");
            walk.collect_nested(&doc.blocks, "/blocks", &mut blocks);
        }

        let title = doc
            .title
            .as_ref()
            .map(meta_text)
            .filter(|title| !title.is_empty());
        if let (Some(title), true) = (&title, self.config.emit_title) {
            blocks.insert(0, Block::heading(1, title.clone(), None));
        }

        NormalizedDocument {
            title,
            blocks,
            diagnostics: walk.diagnostics,
        }
    }
}

fn meta_text(value: &MetaValue) -> String {
    let text = match value {
        MetaValue::String(text) => text.clone(),
        MetaValue::Inlines(inlines) => reduce(inlines),
        MetaValue::Blocks(blocks) => reduce_paragraphs(blocks),
        MetaValue::Other => String::new(),
    };
    text.trim().to_string()
}

/// Per-call walk state
pub(crate) struct Walk<'n> {
    config: &'n ParseConfig,
    assets: Option<&'n dyn AssetLookup>,
    diagnostics: Vec<Diagnostic>,
}

impl Walk<'_> {
    fn blocks(&mut self, nodes: &[Node], location: &str, out: &mut Vec<Block>) {
        for (i, node) in nodes.iter().enumerate() {
            self.block(node, &format!("{location}/{i}"), out);
        }
    }

    /// Generic block handler; pushes zero or more blocks for `node`
    pub(crate) fn block(&mut self, node: &Node, location: &str, out: &mut Vec<Block>) {
        match node {
            Node::Header { level, id, content } => {
                out.push(Block::heading(*level, reduce(content), id.clone()));
            }
            Node::Para(inlines) | Node::Plain(inlines) => {
                out.extend(self.paragraph(inlines, location));
            }
            Node::BulletList(items) => {
                out.push(self.list(ListKind::Unordered, 1, items, location));
            }
            Node::OrderedList { start, items } => {
                out.push(self.list(ListKind::Ordered, *start, items, location));
            }
            Node::CodeBlock { classes, code } => out.push(Block::CodeBlock {
                code: code.clone(),
                language: classes.first().cloned(),
            }),
            Node::BlockQuote(children) => match callout::detect(children) {
                Some(callout) => out.push(callout),
                None => self.blocks(children, &format!("{location}/c"), out),
            },
            Node::Table(table) => out.push(table::extract(table)),
            Node::Figure { caption, content } => self.figure(caption, content, location, out),
            Node::Div { .. } | Node::Unknown { .. } => {
                self.skip(node.tag(), location, format!("unsupported block type: {}", node.tag()));
            }
            Node::Malformed { tag, reason } => {
                self.skip(tag, location, format!("malformed {tag} block: {reason}"));
            }
        }
    }

    /// Paragraph-like node. Standalone images and wikilinks get their own
    /// block kinds; blank paragraphs are dropped.
    fn paragraph(&mut self, inlines: &[Inline], location: &str) -> Option<Block> {
        let visible: Vec<&Inline> = inlines.iter().filter(|inline| !inline.is_blank()).collect();
        match visible.as_slice() {
            [Inline::Image { alt, url, title }] => {
                let alt_text = non_empty(reduce(alt));
                let caption = figure_caption(title, alt_text.as_deref());
                return Some(self.image(url, alt_text, caption, location));
            }
            [Inline::Link {
                classes,
                content,
                url,
                title,
            }] if classes.iter().any(|c| c == "wikilink") || title == "wikilink" => {
                let display_text = non_empty(reduce(content)).filter(|display| display != url);
                return Some(Block::Wikilink {
                    target: url.clone(),
                    display_text,
                });
            }
            _ => {}
        }

        let text = reduce(inlines);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(embed) = trimmed.strip_prefix('!').and_then(single_wikilink) {
            match parse_wikilink(embed) {
                Ok(link) => return Some(self.image(&link.target, link.display_text, None, location)),
                Err(err) => self.record(DiagnosticKind::Syntax, Some("Para"), location, err.to_string()),
            }
        } else if let Some(raw) = single_wikilink(trimmed) {
            match parse_wikilink(raw) {
                Ok(link) => return Some(link.into_block()),
                Err(err) => self.record(DiagnosticKind::Syntax, Some("Para"), location, err.to_string()),
            }
        }

        Some(Block::Paragraph { text })
    }

    /// Pandoc 3 figure: the first image inside becomes an image block
    /// captioned with the figure caption
    fn figure(&mut self, caption: &[Node], content: &[Node], location: &str, out: &mut Vec<Block>) {
        let image = content
            .iter()
            .filter_map(Node::paragraph_inlines)
            .flatten()
            .find_map(|inline| match inline {
                Inline::Image { alt, url, .. } => Some((alt, url)),
                _ => None,
            });

        match image {
            Some((alt, url)) => {
                let caption = non_empty(reduce_paragraphs(caption));
                let block = self.image(url, non_empty(reduce(alt)), caption, location);
                out.push(block);
            }
            None => self.blocks(content, &format!("{location}/c/2"), out),
        }
    }

    fn image(
        &mut self,
        url: &str,
        alt_text: Option<String>,
        caption: Option<String>,
        location: &str,
    ) -> Block {
        Block::Image {
            path: self.resolve_image(url, location),
            alt_text,
            caption,
        }
    }

    /// Resolved path, or the reference itself when it cannot be resolved
    fn resolve_image(&mut self, url: &str, location: &str) -> String {
        let Some(assets) = self.assets else {
            return url.to_string();
        };
        if is_external(url) {
            return url.to_string();
        }
        match assets.locate(url, &self.config.image_subset) {
            Ok(path) => path.to_string_lossy().into_owned(),
            Err(err) => {
                self.record(DiagnosticKind::NotFound, Some("Image"), location, err.to_string());
                url.to_string()
            }
        }
    }

    /// Fallback: paragraphs and lists from anywhere in the tree, in order
    fn collect_nested(&mut self, nodes: &[Node], location: &str, out: &mut Vec<Block>) {
        for (i, node) in nodes.iter().enumerate() {
            let location = format!("{location}/{i}");
            match node {
                Node::Para(inlines) | Node::Plain(inlines) => {
                    out.extend(self.paragraph(inlines, &location));
                }
                Node::BulletList(items) => {
                    out.push(self.list(ListKind::Unordered, 1, items, &location));
                }
                Node::OrderedList { start, items } => {
                    out.push(self.list(ListKind::Ordered, *start, items, &location));
                }
                Node::BlockQuote(children) => {
                    self.collect_nested(children, &format!("{location}/c"), out);
                }
                Node::Div { content, .. } => {
                    self.collect_nested(content, &format!("{location}/c/1"), out);
                }
                Node::Figure { content, .. } => {
                    self.collect_nested(content, &format!("{location}/c/2"), out);
                }
                _ => {}
            }
        }
    }

    fn skip(&mut self, tag: &str, location: &str, message: String) {
        self.record(DiagnosticKind::BlockSkip, Some(tag), location, message);
    }

    fn record(&mut self, kind: DiagnosticKind, tag: Option<&str>, location: &str, message: String) {
        debug!(?kind, location, tag = tag.unwrap_or_default(), "{message}");
        self.diagnostics.push(Diagnostic {
            kind,
            tag: tag.map(str::to_string),
            location: location.to_string(),
            message,
        });
    }
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `[[...]]` holding exactly one link
fn single_wikilink(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("[[")?.strip_suffix("]]")?;
    (!inner.contains("[[") && !inner.contains("]]")).then_some(text)
}

/// Pandoc marks implicit figures with a `fig:` title prefix; the caption is
/// the remainder, or the alt text when the remainder is empty
fn figure_caption(title: &str, alt_text: Option<&str>) -> Option<String> {
    let rest = title.strip_prefix("fig:")?.trim();
    if rest.is_empty() {
        alt_text.map(str::to_string)
    } else {
        Some(rest.to_string())
    }
}

fn is_external(url: &str) -> bool {
    ["http://", "https://", "data:"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}
