//! Tolerant HTML scanner and element tree
//!
//! A single forward pass over the raw bytes builds a flat arena of
//! elements. Every element records the byte offsets of its opening tag and
//! of its `style` attribute value, so the inliner can splice edits back
//! into the original string without reserializing the document.
//!
//! The scanner never rejects input. Unclosed tags, stray close tags and
//! unterminated comments all degrade to "parse what we can".

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Index of an element in a [`Document`] arena.
///
/// Ids are assigned in document order during parsing, so comparing two ids
/// compares document positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    /// The synthetic document root. It has no tag position and is never
    /// matched by selectors.
    pub const ROOT: ElementId = ElementId(0);

    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One parsed element.
#[derive(Clone, Debug)]
pub struct Element {
    /// Tag name, lowercase.
    pub tag_name: String,
    /// Attributes in source order, names lowercase, values as written.
    pub attributes: Vec<(String, String)>,
    /// Whitespace-split tokens of the `class` attribute.
    pub classes: Vec<String>,
    /// Parent element, `None` only for the root.
    pub parent: Option<ElementId>,
    /// Child elements in document order.
    pub children: Vec<ElementId>,
    /// This element's position within `parent.children`.
    pub index_in_parent: usize,
    /// Byte offset of the opening `<`.
    pub tag_start: usize,
    /// Byte offset one past the closing `>` of the opening tag.
    pub tag_end: usize,
    /// Byte range of the `style` attribute value, excluding quotes.
    pub style_range: Option<(usize, usize)>,
}

impl Element {
    fn root() -> Element {
        Element {
            tag_name: "#document".to_string(),
            attributes: Vec::new(),
            classes: Vec::new(),
            parent: None,
            children: Vec::new(),
            index_in_parent: 0,
            tag_start: 0,
            tag_end: 0,
            style_range: None,
        }
    }

    /// Looks up an attribute value by lowercase name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The `id` attribute value, if present.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Whether the `class` attribute contains `name` as a full token.
    pub fn has_class(&self, name: &str) -> bool {
        self.classes.iter().any(|c| c == name)
    }
}

/// A parsed document: the original text plus a flat arena of elements.
#[derive(Clone, Debug)]
pub struct Document {
    elements: Vec<Element>,
}

/// Tags that never take a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Tags whose content is raw text until the matching close tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script"];

impl Document {
    /// Parses `html` into an element arena.
    pub fn parse(html: &str) -> Document {
        let mut parser = HtmlParser {
            input: html,
            pos: 0,
            elements: alloc::vec![Element::root()],
            stack: alloc::vec![ElementId::ROOT],
        };
        parser.run();
        Document {
            elements: parser.elements,
        }
    }

    /// Borrow an element by id.
    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    /// Number of elements including the synthetic root.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True when the document holds no real elements.
    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 1
    }

    /// Iterates all real elements (skipping the root) in document order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, e)| (ElementId(i), e))
    }

    /// Previous sibling of `id`, if any.
    pub fn previous_sibling(&self, id: ElementId) -> Option<ElementId> {
        let element = self.element(id);
        let parent = self.element(element.parent?);
        if element.index_in_parent == 0 {
            return None;
        }
        parent.children.get(element.index_in_parent - 1).copied()
    }

    /// Whether `ancestor` lies on the path from `id` to the root.
    pub fn is_descendant_of(&self, id: ElementId, ancestor: ElementId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Walks ancestors of `id` from parent to root, excluding the root.
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut current = self.element(id).parent;
        core::iter::from_fn(move || {
            let next = current.filter(|&p| p != ElementId::ROOT)?;
            current = self.element(next).parent;
            Some(next)
        })
    }

}

/// Removes every `<style>...</style>` region from `html` and concatenates
/// their trimmed contents, each followed by a newline.
///
/// Returns `(cleaned_html, css)`. An unterminated block is left in place.
pub fn extract_styles(html: &str) -> (String, String) {
    let mut cleaned = String::with_capacity(html.len());
    let mut css = String::new();

    let mut copied = 0;
    let mut search = 0;
    loop {
        let Some(style_start) = find_ignore_case(html, search, "<style") else {
            cleaned.push_str(&html[copied..]);
            break;
        };

        // "<styles>" and other longer tag names are ordinary markup.
        match html.as_bytes().get(style_start + 6) {
            Some(&b) if b.is_ascii_whitespace() || b == b'>' || b == b'/' => {}
            _ => {
                search = style_start + 1;
                continue;
            }
        }

        let open_end = find_from(html, style_start, '>');
        let close_start =
            open_end.and_then(|e| find_ignore_case(html, e + 1, "</style"));
        let close_end = close_start.and_then(|s| find_from(html, s, '>'));

        let (Some(open_end), Some(close_start), Some(close_end)) =
            (open_end, close_start, close_end)
        else {
            cleaned.push_str(&html[copied..]);
            break;
        };

        cleaned.push_str(&html[copied..style_start]);
        let content = html[open_end + 1..close_start].trim();
        if !content.is_empty() {
            css.push_str(content);
            css.push('\n');
        }
        copied = close_end + 1;
        search = copied;
    }

    (cleaned, css)
}

/// Byte offset of `needle` (ASCII case-insensitive) in `haystack`, at or
/// after `from`.
fn find_ignore_case(haystack: &str, from: usize, needle: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let pattern = needle.as_bytes();
    let mut i = from;
    while i + pattern.len() <= bytes.len() {
        if bytes[i..i + pattern.len()].eq_ignore_ascii_case(pattern) {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Byte offset of `</tag` (ASCII case-insensitive) in `haystack`.
fn find_close_tag(haystack: &str, tag: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let mut i = 0;
    while i + tag.len() + 2 <= bytes.len() {
        if bytes[i] == b'<' && bytes[i + 1] == b'/' {
            let name = &haystack[i + 2..i + 2 + tag.len()];
            if name.eq_ignore_ascii_case(tag) {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

struct HtmlParser<'a> {
    input: &'a str,
    pos: usize,
    elements: Vec<Element>,
    stack: Vec<ElementId>,
}

impl<'a> HtmlParser<'a> {
    fn run(&mut self) {
        while self.pos < self.input.len() {
            let Some(lt) = find_from(self.input, self.pos, '<') else {
                break;
            };
            self.pos = lt;

            if self.skip_special_tag() {
                continue;
            }

            let bytes = self.input.as_bytes();
            match bytes.get(self.pos + 1) {
                Some(b'/') => self.handle_close_tag(),
                Some(c) if c.is_ascii_alphabetic() => self.handle_open_tag(),
                _ => {
                    // Stray '<' in text, step over it.
                    self.pos += 1;
                }
            }
        }
    }

    /// Skips comments, doctype, CDATA and processing instructions.
    /// Returns true when something was consumed.
    fn skip_special_tag(&mut self) -> bool {
        let rest = &self.input[self.pos..];
        let terminator = if rest.starts_with("<!--") {
            "-->"
        } else if rest.starts_with("<![CDATA[") {
            "]]>"
        } else if starts_with_ignore_case(rest, "<!doctype") || rest.starts_with("<!") {
            ">"
        } else if rest.starts_with("<?") {
            "?>"
        } else {
            return false;
        };

        match rest.find(terminator) {
            Some(end) => self.pos += end + terminator.len(),
            None => self.pos = self.input.len(),
        }
        true
    }

    fn handle_open_tag(&mut self) {
        let tag_start = self.pos;
        let Some(tag_end) = self.find_tag_end(tag_start) else {
            // Unterminated tag, drop the rest of the input.
            self.pos = self.input.len();
            return;
        };

        // Contents between "<" and ">", minus a self-closing slash.
        let mut inner = &self.input[tag_start + 1..tag_end];
        let self_closing = inner.ends_with('/');
        if self_closing {
            inner = &inner[..inner.len() - 1];
        }

        let name_len = inner
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(inner.len());
        let tag_name = inner[..name_len].to_ascii_lowercase();

        // Attribute offsets are relative to the text after the tag name.
        let attr_base = tag_start + 1 + name_len;
        let (attributes, style_range) = parse_attributes(&inner[name_len..], attr_base);

        let classes = attributes
            .iter()
            .find(|(n, _)| n == "class")
            .map(|(_, v)| v.split_ascii_whitespace().map(String::from).collect())
            .unwrap_or_default();

        let parent = *self.stack.last().unwrap_or(&ElementId::ROOT);
        let id = ElementId(self.elements.len());
        let index_in_parent = self.elements[parent.0].children.len();
        self.elements[parent.0].children.push(id);
        self.elements.push(Element {
            tag_name: tag_name.clone(),
            attributes,
            classes,
            parent: Some(parent),
            children: Vec::new(),
            index_in_parent,
            tag_start,
            tag_end: tag_end + 1,
            style_range,
        });

        self.pos = tag_end + 1;

        if self_closing || VOID_ELEMENTS.contains(&tag_name.as_str()) {
            return;
        }

        if RAW_TEXT_ELEMENTS.contains(&tag_name.as_str()) {
            // Raw text runs to the matching close tag; markup inside is
            // not parsed.
            match find_close_tag(&self.input[self.pos..], &tag_name) {
                Some(off) => self.pos += off,
                None => self.pos = self.input.len(),
            }
            return;
        }

        self.stack.push(id);
    }

    fn handle_close_tag(&mut self) {
        let start = self.pos;
        let Some(gt) = find_from(self.input, start, '>') else {
            self.pos = self.input.len();
            return;
        };
        let name = self.input[start + 2..gt].trim().to_ascii_lowercase();
        self.pos = gt + 1;
        self.pop_until_tag(&name);
    }

    /// Pops open elements until one matching `name` is closed. A close tag
    /// with no matching open element is ignored.
    fn pop_until_tag(&mut self, name: &str) {
        let found = self
            .stack
            .iter()
            .rposition(|&id| self.elements[id.0].tag_name == name);
        if let Some(depth) = found {
            if depth == 0 {
                return; // never pop the root
            }
            self.stack.truncate(depth);
        }
    }

    /// Finds the closing `>` of the tag opening at `start`, skipping over
    /// quoted attribute values.
    fn find_tag_end(&self, start: usize) -> Option<usize> {
        let bytes = self.input.as_bytes();
        let mut i = start + 1;
        let mut quote: Option<u8> = None;
        while i < bytes.len() {
            let c = bytes[i];
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None if c == b'"' || c == b'\'' => quote = Some(c),
                None if c == b'>' => return Some(i),
                None => {}
            }
            i += 1;
        }
        None
    }
}

/// Parses the attribute portion of an open tag.
///
/// `base` is the absolute byte offset of `text[0]` in the document, used to
/// record the absolute range of the `style` attribute value.
fn parse_attributes(text: &str, base: usize) -> (Vec<(String, String)>, Option<(usize, usize)>) {
    let bytes = text.as_bytes();
    let mut attributes = Vec::new();
    let mut style_range = None;
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && bytes[i] != b'='
        {
            i += 1;
        }
        if i == name_start {
            i += 1;
            continue;
        }
        let name = text[name_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        if i >= bytes.len() || bytes[i] != b'=' {
            // Boolean attribute.
            attributes.push((name, String::new()));
            continue;
        }
        i += 1; // consume '='
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let (value_start, value_end) = if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'')
        {
            let quote = bytes[i];
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i] != quote {
                i += 1;
            }
            let end = i;
            if i < bytes.len() {
                i += 1; // closing quote
            }
            (start, end)
        } else {
            let start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            (start, i)
        };

        if name == "style" {
            style_range = Some((base + value_start, base + value_end));
        }
        attributes.push((name, text[value_start..value_end].to_string()));
    }

    (attributes, style_range)
}

fn find_from(haystack: &str, from: usize, needle: char) -> Option<usize> {
    haystack[from..].find(needle).map(|i| from + i)
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack.len() >= prefix.len() && haystack[..prefix.len()].eq_ignore_ascii_case(prefix)
}
