//! Inlining orchestrator
//!
//! Ties the parsers, matcher, index and merger together. The pipeline for
//! one call: extract `<style>` content, parse the CSS, split rules into
//! inlineable and preserved buckets, match rules to elements, merge the
//! winning declarations into each element's inline style, then splice the
//! results back into the original string by byte offset.
//!
//! Input defects never surface as errors; the worst outcome is that some
//! styles are not inlined.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::css::{parse_css, Declaration, ParsedCss, Rule};
use crate::error::InlineError;
use crate::html::{extract_styles, Document, ElementId};
use crate::index::ElementIndex;
use crate::matcher::{has_pseudo, matches};
use crate::selector::{parse_selector, Selector};
use crate::specificity::Specificity;
use crate::style::StyleAttribute;

/// Inlines CSS from the document's own `<style>` blocks.
///
/// The blocks are removed from the output; rules that cannot be inlined
/// (pseudo selectors, preserved at-rules) come back in a single
/// regenerated `<style>` block.
pub fn inline(html: &str) -> String {
    inline_with_css(html, None)
}

/// Like [`inline`], with extra CSS supplied out-of-band and merged in
/// after the document's own styles.
pub fn inline_with_css(html: &str, additional_css: Option<&str>) -> String {
    if html.is_empty() {
        return String::new();
    }

    let (cleaned, extracted) = extract_styles(html);

    let mut all_css = String::new();
    if !extracted.trim().is_empty() {
        all_css.push_str(&extracted);
    }
    if let Some(extra) = additional_css {
        if !extra.trim().is_empty() {
            all_css.push_str(extra);
        }
    }
    if all_css.is_empty() {
        return html.to_string();
    }

    let parsed = parse_css(&all_css);
    let (inlineable, preserved_rules) = partition_rules(&parsed);

    let doc = Document::parse(&cleaned);
    let result = match apply_rules(&cleaned, &doc, &inlineable) {
        Ok(result) => result,
        Err(err) => {
            log::error!("inlining aborted: {}", err);
            return html.to_string();
        }
    };

    let mut preserved_css = String::new();
    for rule in preserved_rules.iter().copied() {
        preserved_css.push_str(&rule.to_string());
        preserved_css.push('\n');
    }
    for at_rule in &parsed.preserved_at_rules {
        preserved_css.push_str(at_rule);
        preserved_css.push('\n');
    }

    if preserved_css.is_empty() {
        result
    } else {
        insert_style_block(&result, &preserved_css)
    }
}

/// Inlines only the supplied CSS, leaving any `<style>` blocks already in
/// `html` untouched. Pseudo rules in `css` are dropped, not preserved.
pub fn inline_additional_only(html: &str, css: &str) -> String {
    if html.is_empty() || css.trim().is_empty() {
        return html.to_string();
    }
    let doc = Document::parse(html);
    inline_additional_only_with_tree(html, &doc, css)
}

/// [`inline_additional_only`] against a tree the caller already parsed
/// from this exact `html` string.
pub fn inline_additional_only_with_tree(html: &str, doc: &Document, css: &str) -> String {
    if html.is_empty() || css.trim().is_empty() {
        return html.to_string();
    }

    let parsed = parse_css(css);
    let (inlineable, _) = partition_rules(&parsed);
    if inlineable.is_empty() {
        return html.to_string();
    }

    match apply_rules(html, doc, &inlineable) {
        Ok(result) => result,
        Err(err) => {
            log::error!("inlining aborted: {}", err);
            html.to_string()
        }
    }
}

/// Splits parsed rules into inlineable rules (selector parses, no pseudo
/// parts) and rules preserved for the output `<style>` block. Rules whose
/// selector does not parse are dropped.
fn partition_rules(parsed: &ParsedCss) -> (Vec<(Selector, &Rule)>, Vec<&Rule>) {
    let mut inlineable = Vec::new();
    let mut preserved = Vec::new();
    for rule in &parsed.rules {
        match parse_selector(&rule.selector_text) {
            Some(selector) if has_pseudo(&selector) => preserved.push(rule),
            Some(selector) => inlineable.push((selector, rule)),
            None => {
                log::debug!("dropping rule with unparsable selector: {}", rule.selector_text);
            }
        }
    }
    (inlineable, preserved)
}

/// One matched rule recorded against an element, pending merge.
struct AppliedStyle<'a> {
    specificity: Specificity,
    order: usize,
    declarations: &'a [Declaration],
}

/// Matches every rule against the tree and splices the merged styles back
/// into `html`. `html` must be the exact string `doc` was parsed from.
fn apply_rules(html: &str, doc: &Document, rules: &[(Selector, &Rule)]) -> Result<String, InlineError> {
    let index = ElementIndex::build(doc);

    let mut applied: BTreeMap<ElementId, Vec<AppliedStyle<'_>>> = BTreeMap::new();
    for (order, (selector, rule)) in rules.iter().enumerate() {
        for candidate in index.candidates(selector) {
            if matches(selector, doc, candidate) {
                applied.entry(candidate).or_default().push(AppliedStyle {
                    specificity: selector.specificity(),
                    order,
                    declarations: &rule.declarations,
                });
            }
        }
    }

    let mut edits = Vec::new();
    for (id, mut styles) in applied {
        // Lower specificity and earlier rules merge first, so later and
        // more specific ones win ties.
        styles.sort_by_key(|s| (s.specificity, s.order));

        let element = doc.element(id);
        let mut merged = match element.style_range {
            Some((start, end)) => StyleAttribute::parse(&html[start..end]),
            None => StyleAttribute::new(),
        };
        for style in &styles {
            for declaration in style.declarations {
                merged.merge(declaration);
            }
        }
        if merged.is_empty() {
            continue;
        }
        let serialized = merged.serialize();

        match element.style_range {
            Some((start, end)) => {
                // An unquoted attribute value cannot hold the spaces and
                // semicolons of the merged style, so the replacement
                // brings its own quotes.
                let quoted =
                    start > 0 && matches!(html.as_bytes()[start - 1], b'"' | b'\'');
                let replacement = if quoted {
                    serialized
                } else {
                    let mut quoted_value = String::with_capacity(serialized.len() + 2);
                    quoted_value.push('"');
                    quoted_value.push_str(&serialized);
                    quoted_value.push('"');
                    quoted_value
                };
                edits.push(Edit {
                    start,
                    end,
                    replacement,
                });
            }
            None => {
                let pos = style_insert_position(html, element.tag_start, element.tag_end);
                let mut replacement = String::with_capacity(serialized.len() + 10);
                replacement.push_str(" style=\"");
                replacement.push_str(&serialized);
                replacement.push('"');
                edits.push(Edit {
                    start: pos,
                    end: pos,
                    replacement,
                });
            }
        }
    }

    if edits.is_empty() {
        return Ok(html.to_string());
    }
    log::debug!("inlining styles into {} elements", edits.len());
    splice(html, edits)
}

/// Insertion point for a new `style` attribute: just before the closing
/// `>`, stepping back over the `/` and padding of a self-closing tag.
fn style_insert_position(html: &str, tag_start: usize, tag_end: usize) -> usize {
    let bytes = html.as_bytes();
    let mut pos = tag_end - 1;
    if pos > 0 && bytes[pos - 1] == b'/' {
        pos -= 1;
        while pos > tag_start && bytes[pos - 1] == b' ' {
            pos -= 1;
        }
    }
    pos
}

struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

/// Applies non-overlapping `(start, end, replacement)` edits in a single
/// forward pass.
fn splice(html: &str, mut edits: Vec<Edit>) -> Result<String, InlineError> {
    edits.sort_by_key(|e| e.start);

    let mut out = String::with_capacity(html.len() + edits.len() * 16);
    let mut cursor = 0;
    for edit in &edits {
        if edit.start < cursor {
            return Err(InlineError::OverlappingEdits {
                first_end: cursor,
                second_start: edit.start,
            });
        }
        out.push_str(&html[cursor..edit.start]);
        out.push_str(&edit.replacement);
        cursor = edit.end;
    }
    out.push_str(&html[cursor..]);
    Ok(out)
}

/// Inserts a `<style>` block before `</head>`, falling back to just after
/// the `<body ...>` tag, then to prepending.
fn insert_style_block(html: &str, css: &str) -> String {
    let mut block = String::with_capacity(css.len() + 32);
    block.push_str("<style type=\"text/css\">\n");
    block.push_str(css);
    block.push_str("</style>\n");

    if let Some(head_close) = find_ignore_case(html, "</head>") {
        let mut out = String::with_capacity(html.len() + block.len());
        out.push_str(&html[..head_close]);
        out.push_str(&block);
        out.push_str(&html[head_close..]);
        return out;
    }

    if let Some(body_start) = find_ignore_case(html, "<body") {
        if let Some(gt) = html[body_start..].find('>') {
            let after_body = body_start + gt + 1;
            let mut out = String::with_capacity(html.len() + block.len() + 1);
            out.push_str(&html[..after_body]);
            out.push('\n');
            out.push_str(&block);
            out.push_str(&html[after_body..]);
            return out;
        }
    }

    let mut out = block;
    out.push_str(html);
    out
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let pattern = needle.as_bytes();
    let mut i = 0;
    while i + pattern.len() <= bytes.len() {
        if bytes[i..i + pattern.len()].eq_ignore_ascii_case(pattern) {
            return Some(i);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_basic_rule() {
        let html = "<html><head><style>p { color: red }</style></head><body><p>x</p></body></html>";
        let out = inline(html);
        assert!(out.contains(r#"<p style="color: red;">x</p>"#), "{}", out);
        assert!(!out.contains("<style>"), "{}", out);
    }

    #[test]
    fn test_inline_without_css_is_identity() {
        let html = "<p>x</p>";
        assert_eq!(inline(html), html);
    }

    #[test]
    fn test_inline_empty_input() {
        assert_eq!(inline(""), "");
    }

    #[test]
    fn test_inline_merges_into_existing_attribute() {
        let html = r#"<style>p { margin: 0 }</style><p style="color: red">x</p>"#;
        let out = inline(html);
        assert!(out.contains(r#"style="color: red; margin: 0;""#), "{}", out);
    }

    #[test]
    fn test_existing_important_resists_rule() {
        let html = r#"<style>p { color: blue }</style><p style="color: red !important">x</p>"#;
        let out = inline(html);
        assert!(out.contains("color: red !important;"), "{}", out);
        assert!(!out.contains("blue"), "{}", out);
    }

    #[test]
    fn test_specificity_orders_merge() {
        let html = r#"<style>.a { color: blue } p { color: red }</style><p class="a">x</p>"#;
        let out = inline(html);
        // The class rule outranks the type rule despite coming first.
        assert!(out.contains("color: blue;"), "{}", out);
    }

    #[test]
    fn test_source_order_breaks_ties() {
        let html = "<style>p { color: red } p { color: blue }</style><p>x</p>";
        let out = inline(html);
        assert!(out.contains("color: blue;"), "{}", out);
    }

    #[test]
    fn test_pseudo_rule_preserved_in_style_block() {
        let html =
            "<html><head><style>a:hover { color: green } a { color: red }</style></head><body><a>x</a></body></html>";
        let out = inline(html);
        assert!(out.contains(r#"<a style="color: red;">x</a>"#), "{}", out);
        assert!(out.contains("<style type=\"text/css\">"), "{}", out);
        assert!(out.contains("a:hover { color: green; }"), "{}", out);
        let style_pos = out.find("<style").unwrap();
        let head_pos = out.find("</head>").unwrap();
        assert!(style_pos < head_pos);
    }

    #[test]
    fn test_at_rule_preserved() {
        let html = "<html><head><style>@media (max-width: 600px) { p { font-size: 10px } }</style></head><body><p>x</p></body></html>";
        let out = inline(html);
        assert!(out.contains("@media (max-width: 600px)"), "{}", out);
        assert!(!out.contains(r#"<p style"#), "{}", out);
    }

    #[test]
    fn test_style_block_falls_back_to_body() {
        let html = "<body><style>a:hover { color: red }</style><p>x</p></body>";
        let out = inline(html);
        assert!(out.starts_with("<body>\n<style type=\"text/css\">"), "{}", out);
    }

    #[test]
    fn test_style_block_prepended_without_head_or_body() {
        let html = "<style>a:hover { color: red }</style><p>x</p>";
        let out = inline(html);
        assert!(out.starts_with("<style type=\"text/css\">"), "{}", out);
    }

    #[test]
    fn test_insert_into_self_closing_tag() {
        let html = "<style>img { border: 0 }</style><img src=\"a.png\" />";
        let out = inline(html);
        assert!(out.contains(r#"<img src="a.png" style="border: 0;" />"#), "{}", out);
    }

    #[test]
    fn test_additional_css_combined() {
        let html = "<style>p { color: red }</style><p>x</p>";
        let out = inline_with_css(html, Some("p { margin: 0 }"));
        assert!(out.contains("color: red; margin: 0;"), "{}", out);
    }

    #[test]
    fn test_additional_only_keeps_style_blocks() {
        let html = "<head><style>p { color: red }</style></head><body><p>x</p></body>";
        let out = inline_additional_only(html, "p { margin: 0 }");
        assert!(out.contains("<style>p { color: red }</style>"), "{}", out);
        assert!(out.contains(r#"<p style="margin: 0;">x</p>"#), "{}", out);
        assert!(!out.contains("color: red;\""), "{}", out);
    }

    #[test]
    fn test_additional_only_drops_pseudo_rules() {
        let html = "<p>x</p>";
        let out = inline_additional_only(html, "p:hover { color: red }");
        assert_eq!(out, html);
    }

    #[test]
    fn test_additional_only_with_shared_tree() {
        let html = "<div><p>x</p></div>";
        let doc = Document::parse(html);
        let out = inline_additional_only_with_tree(html, &doc, "p { color: red }");
        assert!(out.contains(r#"<p style="color: red;">x</p>"#), "{}", out);
    }

    #[test]
    fn test_splice_rejects_overlap() {
        let edits = alloc::vec![
            Edit {
                start: 0,
                end: 5,
                replacement: String::from("a"),
            },
            Edit {
                start: 3,
                end: 8,
                replacement: String::from("b"),
            },
        ];
        assert!(matches!(
            splice("0123456789", edits),
            Err(InlineError::OverlappingEdits { .. })
        ));
    }

    #[test]
    fn test_splice_forward_rebuild() {
        let edits = alloc::vec![
            Edit {
                start: 8,
                end: 9,
                replacement: String::from("Y"),
            },
            Edit {
                start: 2,
                end: 4,
                replacement: String::from("X"),
            },
        ];
        assert_eq!(splice("abcdefghij", edits).unwrap(), "abXefghYj");
    }

    #[test]
    fn test_unparsable_selector_skipped() {
        let html = "<style>>>> { color: red } p { margin: 0 }</style><p>x</p>";
        let out = inline(html);
        assert!(out.contains(r#"<p style="margin: 0;">x</p>"#), "{}", out);
    }

    #[test]
    fn test_idempotent_when_fully_inlined() {
        let html = "<style>p { color: red }</style><p>x</p>";
        let once = inline(html);
        assert_eq!(inline(&once), once);
    }
}
