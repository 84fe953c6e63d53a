//! Selector matching against the element tree
//!
//! Matching is purely structural; pseudo-classes and pseudo-elements never
//! match here because inline styles cannot express dynamic state. Rules
//! whose selectors contain pseudo parts are kept in a preserved `<style>`
//! block instead, which [`has_pseudo`] detects.

extern crate alloc;

use crate::html::{Document, ElementId};
use crate::selector::{AttrOperator, Combinator, Selector, SimpleSelector};

/// Whether `selector` matches the element `id` in `doc`.
///
/// The synthetic document root never matches.
pub fn matches(selector: &Selector, doc: &Document, id: ElementId) -> bool {
    if id == ElementId::ROOT {
        return false;
    }
    match selector {
        Selector::List(members) => members.iter().any(|m| matches(m, doc, id)),
        Selector::Complex {
            left,
            combinator,
            right,
        } => matches(right, doc, id) && matches_combinator(left, *combinator, doc, id),
        Selector::Compound(parts) => parts.iter().all(|p| matches_simple(p, doc, id)),
        Selector::Simple(part) => matches_simple(part, doc, id),
    }
}

/// Whether any part of `selector` is a pseudo-class or pseudo-element.
pub fn has_pseudo(selector: &Selector) -> bool {
    match selector {
        Selector::List(members) => members.iter().any(has_pseudo),
        Selector::Complex { left, right, .. } => has_pseudo(left) || has_pseudo(right),
        Selector::Compound(parts) => parts.iter().any(is_pseudo_part),
        Selector::Simple(part) => is_pseudo_part(part),
    }
}

fn is_pseudo_part(part: &SimpleSelector) -> bool {
    matches!(
        part,
        SimpleSelector::PseudoClass { .. } | SimpleSelector::PseudoElement(_)
    )
}

fn matches_combinator(
    left: &Selector,
    combinator: Combinator,
    doc: &Document,
    id: ElementId,
) -> bool {
    match combinator {
        Combinator::Descendant => doc.ancestors(id).any(|a| matches(left, doc, a)),
        Combinator::Child => {
            let parent = doc.element(id).parent;
            parent.is_some_and(|p| matches(left, doc, p))
        }
        Combinator::AdjacentSibling => {
            doc.previous_sibling(id).is_some_and(|s| matches(left, doc, s))
        }
        Combinator::GeneralSibling => {
            let mut current = doc.previous_sibling(id);
            while let Some(sibling) = current {
                if matches(left, doc, sibling) {
                    return true;
                }
                current = doc.previous_sibling(sibling);
            }
            false
        }
    }
}

fn matches_simple(part: &SimpleSelector, doc: &Document, id: ElementId) -> bool {
    let element = doc.element(id);
    match part {
        SimpleSelector::Universal => true,
        SimpleSelector::Type(tag) => element.tag_name == *tag,
        SimpleSelector::Class(name) => element.has_class(name),
        SimpleSelector::Id(id_value) => element.id() == Some(id_value.as_str()),
        SimpleSelector::Attribute {
            name,
            operator,
            value,
        } => {
            let Some(actual) = element.attribute(name) else {
                return false;
            };
            match operator {
                None => true,
                Some(op) => attr_matches(*op, actual, value),
            }
        }
        SimpleSelector::PseudoClass { .. } | SimpleSelector::PseudoElement(_) => false,
    }
}

fn attr_matches(op: AttrOperator, actual: &str, expected: &str) -> bool {
    match op {
        AttrOperator::Equals => actual == expected,
        AttrOperator::Includes => {
            !expected.is_empty() && actual.split_ascii_whitespace().any(|w| w == expected)
        }
        AttrOperator::DashMatch => {
            actual == expected
                || (actual.len() > expected.len()
                    && actual.starts_with(expected)
                    && actual.as_bytes()[expected.len()] == b'-')
        }
        AttrOperator::Prefix => !expected.is_empty() && actual.starts_with(expected),
        AttrOperator::Suffix => !expected.is_empty() && actual.ends_with(expected),
        AttrOperator::Substring => !expected.is_empty() && actual.contains(expected),
    }
}
