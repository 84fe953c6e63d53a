//! Inline style attribute parsing, merging and serialization

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use crate::css::{split_declarations, Declaration};

/// An ordered set of declarations from a `style` attribute.
///
/// Property order is first-seen: merging an already-present property
/// updates it in place without moving it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleAttribute {
    declarations: Vec<Declaration>,
}

impl StyleAttribute {
    /// An empty attribute.
    pub fn new() -> StyleAttribute {
        StyleAttribute::default()
    }

    /// Parses a `style` attribute value. Malformed entries are dropped.
    pub fn parse(value: &str) -> StyleAttribute {
        let declarations = split_declarations(value)
            .into_iter()
            .filter_map(Declaration::parse)
            .collect();
        StyleAttribute { declarations }
    }

    /// The declarations in first-seen property order.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// True when no declarations are present.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Value of `property`, if declared.
    pub fn get(&self, property: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.property == property)
    }

    /// Merges one incoming declaration.
    ///
    /// An existing `!important` declaration only yields to an incoming
    /// `!important` one. Callers apply rules in ascending priority order,
    /// so the plain case is last-write-wins.
    pub fn merge(&mut self, incoming: &Declaration) {
        match self
            .declarations
            .iter_mut()
            .find(|d| d.property == incoming.property)
        {
            Some(existing) => {
                if existing.important && !incoming.important {
                    return;
                }
                existing.value = incoming.value.clone();
                existing.important = incoming.important;
            }
            None => self.declarations.push(incoming.clone()),
        }
    }

    /// Merges every declaration of `other`, in order.
    pub fn merge_all(&mut self, other: &StyleAttribute) {
        for declaration in &other.declarations {
            self.merge(declaration);
        }
    }

    /// Serializes to `prop: value;` pairs separated by single spaces.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for declaration in &self.declarations {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&declaration.property);
            out.push_str(": ");
            out.push_str(&declaration.value);
            if declaration.important {
                out.push_str(" !important");
            }
            out.push(';');
        }
        out
    }
}

impl core::fmt::Display for StyleAttribute {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.serialize())
    }
}
