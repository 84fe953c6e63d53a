//! CSS text parser
//!
//! Parses raw stylesheet text into `(selector text, declarations)` rules plus
//! a list of preserved at-rule blocks:
//!
//! - Regular rules (`selector { declarations }`) become [`Rule`] values
//! - Comments (`/* ... */`) are stripped
//! - Block at-rules (`@media`, `@keyframes`, `@font-face`, vendor-prefixed
//!   keyframes) are kept verbatim so the inliner can re-emit them in a
//!   `<style>` block
//! - Statement at-rules (`@import`, `@charset`) are dropped; they are
//!   irrelevant to inlining
//!
//! The parser never fails: malformed fragments are skipped and a
//! structurally broken rule aborts the remaining input with a partial result
//! rather than looping.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// A single CSS property declaration, e.g. `color: red !important`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Property name, lower-cased.
    pub property: String,
    /// Property value with surrounding whitespace and `!important` removed.
    pub value: String,
    /// Whether `!important` was specified.
    pub important: bool,
}

impl Declaration {
    /// Parses one declaration like `"color: red !important"`.
    ///
    /// Returns `None` for text with no colon, an empty property name, or an
    /// empty value. A space between `!` and `important` is tolerated.
    pub fn parse(text: &str) -> Option<Declaration> {
        let colon = text.find(':')?;
        let property = text[..colon].trim().to_ascii_lowercase();
        if property.is_empty() {
            return None;
        }

        let mut value = text[colon + 1..].trim();
        let mut important = false;

        let tail_is_important = value.len() >= 10
            && value.as_bytes()[value.len() - 10..].eq_ignore_ascii_case(b"!important");
        if tail_is_important {
            important = true;
            value = value[..value.len() - 10].trim_end();
        } else if let Some(bang) = value.rfind('!') {
            if value[bang + 1..].trim().eq_ignore_ascii_case("important") {
                important = true;
                value = value[..bang].trim_end();
            }
        }

        if value.is_empty() {
            return None;
        }

        Some(Declaration {
            property,
            value: value.to_string(),
            important,
        })
    }
}

impl core::fmt::Display for Declaration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.property, self.value)?;
        if self.important {
            write!(f, " !important")?;
        }
        Ok(())
    }
}

/// A CSS rule: raw selector text plus its declarations in source order.
///
/// The selector text may contain commas (a selector list). Rules that parse
/// to zero declarations are never constructed; see [`parse_css`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    /// Raw selector text as written in the stylesheet.
    pub selector_text: String,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
}

impl core::fmt::Display for Rule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {{ ", self.selector_text)?;
        for (i, decl) in self.declarations.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{};", decl)?;
        }
        write!(f, " }}")
    }
}

/// Result of parsing stylesheet text: inlineable rules and at-rule blocks
/// preserved verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedCss {
    /// Regular rules in source order.
    pub rules: Vec<Rule>,
    /// Raw text of preserved block at-rules, in source order.
    pub preserved_at_rules: Vec<String>,
}

/// Parses CSS text into rules and preserved at-rules.
///
/// Tolerant by construction: unparsable fragments are skipped, and a rule
/// whose brace structure is broken ends parsing early with whatever was
/// recovered so far.
pub fn parse_css(css: &str) -> ParsedCss {
    let mut result = ParsedCss::default();
    if css.trim().is_empty() {
        return result;
    }

    let stripped = strip_comments(css);
    let bytes = stripped.as_bytes();
    let len = bytes.len();
    let mut pos = 0;

    while pos < len {
        pos = skip_whitespace(bytes, pos);
        if pos >= len {
            break;
        }

        if bytes[pos] == b'@' {
            pos = parse_at_rule(&stripped, pos, &mut result.preserved_at_rules);
        } else {
            pos = parse_rule(&stripped, pos, &mut result.rules);
        }
    }

    log::debug!(
        "parsed css: {} rules, {} preserved at-rules",
        result.rules.len(),
        result.preserved_at_rules.len()
    );
    result
}

/// Parses a semicolon-separated declaration list (the inside of `{ ... }`).
///
/// Shared with the inline `style` attribute parser; the split is aware of
/// `url(...)` parentheses and quoted strings, so `;` inside them does not
/// terminate a declaration.
pub fn parse_declarations(body: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    for part in split_declarations(body) {
        if let Some(decl) = Declaration::parse(part) {
            declarations.push(decl);
        }
    }
    declarations
}

/// Splits on top-level `;`, ignoring separators inside `()` and quoted
/// strings. Empty pieces are dropped.
pub(crate) fn split_declarations(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let bytes = text.as_bytes();
    let mut depth: u32 = 0;
    let mut in_single = false;
    let mut in_double = false;
    let mut start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\'' if !in_double => in_single = !in_single,
            b'"' if !in_single => in_double = !in_double,
            b'(' if !in_single && !in_double => depth += 1,
            b')' if !in_single && !in_double => depth = depth.saturating_sub(1),
            b';' if depth == 0 && !in_single && !in_double => {
                let part = text[start..i].trim();
                if !part.is_empty() {
                    parts.push(part);
                }
                start = i + 1;
            }
            _ => {}
        }
    }

    let last = text[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// Removes `/* ... */` comments. An unterminated comment swallows the rest
/// of the input.
fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(open) = rest.find("/*") {
        out.push_str(&rest[..open]);
        match rest[open + 2..].find("*/") {
            Some(close) => rest = &rest[open + 2 + close + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Handles an at-rule at `pos`. Block at-rules are preserved verbatim;
/// statement at-rules are consumed and dropped. Returns the next scan
/// position.
fn parse_at_rule(css: &str, pos: usize, preserved: &mut Vec<String>) -> usize {
    let bytes = css.as_bytes();
    let len = bytes.len();

    let name_start = pos + 1;
    let mut name_end = name_start;
    while name_end < len
        && !bytes[name_end].is_ascii_whitespace()
        && bytes[name_end] != b'{'
        && bytes[name_end] != b';'
    {
        name_end += 1;
    }
    let name = css[name_start..name_end].to_ascii_lowercase();

    let is_block = matches!(name.as_str(), "media" | "keyframes" | "font-face")
        || name.starts_with("-webkit-keyframes")
        || name.starts_with("-moz-keyframes");

    if is_block {
        let Some(brace_start) = find_from(css, "{", name_end) else {
            return len;
        };
        let Some(brace_end) = find_matching_brace(css, brace_start) else {
            log::warn!("unmatched brace in @{} block, dropping remainder", name);
            return len;
        };
        preserved.push(css[pos..=brace_end].trim().to_string());
        brace_end + 1
    } else {
        // Statement at-rule (@import, @charset): nothing to inline.
        match find_from(css, ";", pos) {
            Some(semi) => semi + 1,
            None => len,
        }
    }
}

/// Parses a regular rule at `pos`, appending it if any declaration parsed.
/// Returns the next scan position; a malformed brace structure returns the
/// end of input so the caller stops.
fn parse_rule(css: &str, pos: usize, rules: &mut Vec<Rule>) -> usize {
    let len = css.len();

    let Some(brace_start) = find_from(css, "{", pos) else {
        return len;
    };

    let selector = css[pos..brace_start].trim();
    if selector.is_empty() {
        return brace_start + 1;
    }

    let Some(brace_end) = find_matching_brace(css, brace_start) else {
        log::warn!(
            "unmatched brace after selector `{}`, dropping remainder",
            selector
        );
        return len;
    };

    let declarations = parse_declarations(&css[brace_start + 1..brace_end]);
    if !declarations.is_empty() {
        rules.push(Rule {
            selector_text: selector.to_string(),
            declarations,
        });
    }

    brace_end + 1
}

/// Finds the `}` matching the `{` at `open_pos`, skipping braces nested
/// inside quoted strings.
fn find_matching_brace(css: &str, open_pos: usize) -> Option<usize> {
    let bytes = css.as_bytes();
    let mut depth = 1;
    let mut in_single = false;
    let mut in_double = false;

    for (i, &b) in bytes.iter().enumerate().skip(open_pos + 1) {
        match b {
            b'\'' if !in_double => in_single = !in_single,
            b'"' if !in_single => in_double = !in_double,
            b'{' if !in_single && !in_double => depth += 1,
            b'}' if !in_single && !in_double => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack[from..].find(needle).map(|i| from + i)
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}
