// SPDX-License-Identifier: AGPL-3.0-or-later
//! Inline-to-text reduction
//!
//! Formatting is dropped and content kept. Tags without a textual reading
//! (math, citations, raw inlines, notes) contribute nothing.

use crate::pandoc::{Inline, Node};

/// Reduce a sequence of inline nodes to plain text
pub fn reduce(inlines: &[Inline]) -> String {
    let mut output = String::new();
    push_inlines(&mut output, inlines);
    output
}

/// Space-joined text of the paragraph-like blocks; other blocks are ignored
pub fn reduce_paragraphs(blocks: &[Node]) -> String {
    blocks
        .iter()
        .filter_map(Node::paragraph_inlines)
        .map(|inlines| reduce(inlines).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_inlines(output: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        push_inline(output, inline);
    }
}

fn push_inline(output: &mut String, inline: &Inline) {
    match inline {
        Inline::Str(text) => output.push_str(text),
        Inline::Space => output.push(' '),
        Inline::SoftBreak | Inline::LineBreak => output.push('\n'),
        Inline::Emph(content)
        | Inline::Strong(content)
        | Inline::Strikeout(content)
        | Inline::Superscript(content)
        | Inline::Subscript(content)
        | Inline::Underline(content)
        | Inline::SmallCaps(content) => push_inlines(output, content),
        Inline::Code(code) => output.push_str(code),
        // href is handled at block level for images and wikilinks
        Inline::Link { content, .. } => push_inlines(output, content),
        Inline::Image { alt, .. } => push_inlines(output, alt),
        Inline::Unknown(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_words_joined_by_space() {
        let inlines = vec![Inline::str("a"), Inline::Space, Inline::str("b")];
        assert_eq!(reduce(&inlines), "a b");
    }

    #[test]
    fn test_breaks_become_newlines() {
        let inlines = vec![
            Inline::str("one"),
            Inline::SoftBreak,
            Inline::str("two"),
            Inline::LineBreak,
            Inline::str("three"),
        ];
        assert_eq!(reduce(&inlines), "one\ntwo\nthree");
    }

    #[test]
    fn test_formatting_is_unwrapped() {
        let inlines = vec![
            Inline::Strong(vec![
                Inline::str("very"),
                Inline::Space,
                Inline::Emph(vec![Inline::str("important")]),
            ]),
            Inline::Space,
            Inline::Code("rm -rf".to_string()),
        ];
        assert_eq!(reduce(&inlines), "very important rm -rf");
    }

    #[test]
    fn test_link_and_image_keep_their_text() {
        let inlines = vec![
            Inline::Link {
                classes: Vec::new(),
                content: vec![Inline::str("docs")],
                url: "https://example.com".to_string(),
                title: String::new(),
            },
            Inline::Space,
            Inline::Image {
                alt: vec![Inline::str("logo")],
                url: "logo.png".to_string(),
                title: String::new(),
            },
        ];
        assert_eq!(reduce(&inlines), "docs logo");
    }

    #[test]
    fn test_reduce_paragraphs_skips_other_blocks() {
        let blocks = vec![
            Node::Para(vec![Inline::str("one")]),
            Node::CodeBlock {
                classes: Vec::new(),
                code: "skipped".to_string(),
            },
            Node::Plain(vec![Inline::str("two"), Inline::Space]),
            Node::Para(Vec::new()),
        ];
        assert_eq!(reduce_paragraphs(&blocks), "one two");
    }

    #[test]
    fn test_unknown_inlines_are_dropped() {
        let inlines = vec![
            Inline::str("x"),
            Inline::Unknown("Math".to_string()),
            Inline::str("y"),
        ];
        assert_eq!(reduce(&inlines), "xy");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn word_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9]{1,12}"
    }

    proptest! {
        // Property: words separated by Space reduce to a space-joined string
        #[test]
        fn prop_space_joined_words(words in prop::collection::vec(word_strategy(), 1..8)) {
            let mut inlines = Vec::new();
            for (i, word) in words.iter().enumerate() {
                if i > 0 {
                    inlines.push(Inline::Space);
                }
                inlines.push(Inline::str(word.clone()));
            }
            prop_assert_eq!(reduce(&inlines), words.join(" "));
        }

        // Property: wrapping in formatting never changes the text
        #[test]
        fn prop_wrapping_is_transparent(words in prop::collection::vec(word_strategy(), 0..5)) {
            let plain: Vec<Inline> = words.iter().cloned().map(Inline::Str).collect();
            let wrapped = vec![Inline::Emph(vec![Inline::Strong(plain.clone())])];
            prop_assert_eq!(reduce(&wrapped), reduce(&plain));
        }
    }
}
