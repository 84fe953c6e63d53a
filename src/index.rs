//! Candidate lookup index
//!
//! Full-tree matching of every selector against every element is wasteful
//! on large documents, so elements are bucketed by tag name, class and id
//! up front. For each selector only the rightmost compound matters: any
//! element the whole selector matches must satisfy it, so its most
//! selective part narrows the candidate set before real matching runs.

extern crate alloc;

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::html::{Document, ElementId};
use crate::selector::{Selector, SimpleSelector};

/// Per-document lookup tables keyed by tag name, class and id.
pub struct ElementIndex {
    by_tag: BTreeMap<String, Vec<ElementId>>,
    by_class: BTreeMap<String, Vec<ElementId>>,
    by_id: BTreeMap<String, Vec<ElementId>>,
    all: Vec<ElementId>,
}

impl ElementIndex {
    /// Builds the index in one pass over the arena.
    pub fn build(doc: &Document) -> ElementIndex {
        let mut by_tag: BTreeMap<String, Vec<ElementId>> = BTreeMap::new();
        let mut by_class: BTreeMap<String, Vec<ElementId>> = BTreeMap::new();
        let mut by_id: BTreeMap<String, Vec<ElementId>> = BTreeMap::new();
        let mut all = Vec::new();

        for (id, element) in doc.iter() {
            all.push(id);
            by_tag.entry(element.tag_name.clone()).or_default().push(id);
            for class in &element.classes {
                by_class.entry(class.clone()).or_default().push(id);
            }
            if let Some(id_value) = element.id() {
                by_id.entry(id_value.to_string()).or_default().push(id);
            }
        }

        ElementIndex {
            by_tag,
            by_class,
            by_id,
            all,
        }
    }

    /// Elements that could possibly match `selector`, in document order.
    ///
    /// This is an over-approximation: every true match is included, but
    /// candidates still need to be run through the matcher.
    pub fn candidates(&self, selector: &Selector) -> Vec<ElementId> {
        match selector {
            Selector::List(members) => {
                let mut union = BTreeSet::new();
                for member in members {
                    union.extend(self.candidates(member));
                }
                union.into_iter().collect()
            }
            // Only the rightmost compound constrains the matched element.
            Selector::Complex { right, .. } => self.candidates(right),
            Selector::Compound(parts) => self.candidates_for_parts(parts),
            Selector::Simple(part) => self.candidates_for_parts(core::slice::from_ref(part)),
        }
    }

    /// Narrows by the most selective part available: id, then class, then
    /// tag. Attribute and pseudo parts do not narrow.
    fn candidates_for_parts(&self, parts: &[SimpleSelector]) -> Vec<ElementId> {
        for part in parts {
            if let SimpleSelector::Id(id_value) = part {
                return self.by_id.get(id_value).cloned().unwrap_or_default();
            }
        }
        for part in parts {
            if let SimpleSelector::Class(name) = part {
                return self.by_class.get(name).cloned().unwrap_or_default();
            }
        }
        for part in parts {
            if let SimpleSelector::Type(tag) = part {
                return self.by_tag.get(tag).cloned().unwrap_or_default();
            }
        }
        self.all.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parse_selector;

    fn tags(doc: &Document, ids: &[ElementId]) -> Vec<String> {
        ids.iter().map(|&id| doc.element(id).tag_name.clone()).collect()
    }

    #[test]
    fn test_candidates_by_tag() {
        let doc = Document::parse("<div><p>a</p><span>b</span><p>c</p></div>");
        let index = ElementIndex::build(&doc);
        let sel = parse_selector("p").unwrap();
        assert_eq!(tags(&doc, &index.candidates(&sel)), ["p", "p"]);
    }

    #[test]
    fn test_candidates_by_id_beats_class_and_tag() {
        let html = r#"<p class="a">1</p><p class="a" id="x">2</p>"#;
        let doc = Document::parse(html);
        let index = ElementIndex::build(&doc);
        let sel = parse_selector("p.a#x").unwrap();
        let candidates = index.candidates(&sel);
        assert_eq!(candidates.len(), 1);
        assert_eq!(doc.element(candidates[0]).id(), Some("x"));
    }

    #[test]
    fn test_candidates_by_class() {
        let html = r#"<p class="a">1</p><span class="a b">2</span><em>3</em>"#;
        let doc = Document::parse(html);
        let index = ElementIndex::build(&doc);
        let sel = parse_selector(".a").unwrap();
        assert_eq!(index.candidates(&sel).len(), 2);
        let sel = parse_selector(".b").unwrap();
        assert_eq!(tags(&doc, &index.candidates(&sel)), ["span"]);
    }

    #[test]
    fn test_complex_uses_rightmost_compound() {
        let html = "<div><p>a</p></div><p>b</p>";
        let doc = Document::parse(html);
        let index = ElementIndex::build(&doc);
        let sel = parse_selector("div p").unwrap();
        // Both p elements are candidates; the matcher filters later.
        assert_eq!(tags(&doc, &index.candidates(&sel)), ["p", "p"]);
    }

    #[test]
    fn test_universal_returns_all() {
        let doc = Document::parse("<div><p>a</p></div>");
        let index = ElementIndex::build(&doc);
        let sel = parse_selector("*").unwrap();
        assert_eq!(index.candidates(&sel).len(), 2);
    }

    #[test]
    fn test_attribute_only_returns_all() {
        let doc = Document::parse("<div><a href=\"#\">x</a></div>");
        let index = ElementIndex::build(&doc);
        let sel = parse_selector("[href]").unwrap();
        assert_eq!(index.candidates(&sel).len(), 2);
    }

    #[test]
    fn test_list_unions_without_duplicates() {
        let html = r#"<p class="a">1</p><span>2</span>"#;
        let doc = Document::parse(html);
        let index = ElementIndex::build(&doc);
        let sel = parse_selector("p, .a, span").unwrap();
        // p matches both arms but appears once, in document order.
        assert_eq!(tags(&doc, &index.candidates(&sel)), ["p", "span"]);
    }

    #[test]
    fn test_missing_key_yields_empty() {
        let doc = Document::parse("<div>x</div>");
        let index = ElementIndex::build(&doc);
        let sel = parse_selector("#nope").unwrap();
        assert!(index.candidates(&sel).is_empty());
    }
}
