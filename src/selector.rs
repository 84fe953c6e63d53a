//! CSS selector AST and recursive-descent parser
//!
//! Grammar (simplified):
//!
//! ```text
//!   selector-list     = complex-selector (',' complex-selector)*
//!   complex-selector  = compound-selector (combinator compound-selector)*
//!   combinator        = ' ' | '>' | '+' | '~'
//!   compound-selector = simple-selector+
//!   simple-selector   = type | universal | class | id | attribute | pseudo
//! ```
//!
//! Parsing is all-or-nothing per selector string: any syntax error yields
//! `None`, and callers treat an unparsable selector as "never matches".

extern crate alloc;

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::specificity::Specificity;

/// Combinator joining two compound selectors in a complex selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: matches any strict descendant.
    Descendant,
    /// `>`: matches direct children only.
    Child,
    /// `+`: matches the immediately following sibling.
    AdjacentSibling,
    /// `~`: matches any following sibling.
    GeneralSibling,
}

/// Attribute selector comparison operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrOperator {
    /// `=` exact value match.
    Equals,
    /// `~=` whitespace-separated word match.
    Includes,
    /// `|=` exact value or `value-` prefix.
    DashMatch,
    /// `^=` prefix match.
    Prefix,
    /// `$=` suffix match.
    Suffix,
    /// `*=` substring match.
    Substring,
}

impl AttrOperator {
    fn as_str(self) -> &'static str {
        match self {
            AttrOperator::Equals => "=",
            AttrOperator::Includes => "~=",
            AttrOperator::DashMatch => "|=",
            AttrOperator::Prefix => "^=",
            AttrOperator::Suffix => "$=",
            AttrOperator::Substring => "*=",
        }
    }
}

/// A single simple selector part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimpleSelector {
    /// `*`, matches any element.
    Universal,
    /// Type selector (`div`, `p`); tag name stored lowercase.
    Type(String),
    /// Class selector (`.red`), without the leading dot.
    Class(String),
    /// ID selector (`#main`), without the leading hash.
    Id(String),
    /// Attribute selector (`[href]`, `[data-x^="ab"]`).
    Attribute {
        /// Attribute name, lowercase.
        name: String,
        /// Comparison operator, or `None` for a presence-only check.
        operator: Option<AttrOperator>,
        /// Value to compare against; empty when `operator` is `None`.
        value: String,
    },
    /// Pseudo-class (`:hover`, `:nth-child(2)`). Never matched for inlining.
    PseudoClass {
        /// Pseudo-class name, lowercase, without the colon.
        name: String,
        /// Argument of a functional pseudo-class, if any.
        argument: Option<String>,
    },
    /// Pseudo-element (`::before`). Never matched for inlining.
    PseudoElement(String),
}

impl SimpleSelector {
    /// Specificity contribution of this part.
    pub fn specificity(&self) -> Specificity {
        match self {
            SimpleSelector::Universal => Specificity::ZERO,
            SimpleSelector::Id(_) => Specificity::new(1, 0, 0),
            SimpleSelector::Class(_)
            | SimpleSelector::Attribute { .. }
            | SimpleSelector::PseudoClass { .. } => Specificity::new(0, 1, 0),
            SimpleSelector::Type(_) | SimpleSelector::PseudoElement(_) => {
                Specificity::new(0, 0, 1)
            }
        }
    }
}

impl core::fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SimpleSelector::Universal => write!(f, "*"),
            SimpleSelector::Type(tag) => write!(f, "{}", tag),
            SimpleSelector::Class(name) => write!(f, ".{}", name),
            SimpleSelector::Id(id) => write!(f, "#{}", id),
            SimpleSelector::Attribute {
                name,
                operator,
                value,
            } => match operator {
                None => write!(f, "[{}]", name),
                Some(op) => write!(f, "[{}{}\"{}\"]", name, op.as_str(), value),
            },
            SimpleSelector::PseudoClass { name, argument } => match argument {
                Some(arg) => write!(f, ":{}({})", name, arg),
                None => write!(f, ":{}", name),
            },
            SimpleSelector::PseudoElement(name) => write!(f, "::{}", name),
        }
    }
}

/// A parsed CSS selector tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// Comma-separated alternatives (`h1, h2, h3`).
    List(Vec<Selector>),
    /// Two selectors joined by a combinator (`div > p`).
    Complex {
        /// Constraint on the ancestor/sibling side.
        left: Box<Selector>,
        /// The tree relationship between `left` and `right`.
        combinator: Combinator,
        /// Requirement on the target element itself.
        right: Box<Selector>,
    },
    /// Combinator-free chain of simple selectors (`div.red#main`).
    Compound(Vec<SimpleSelector>),
    /// A lone simple selector.
    Simple(SimpleSelector),
}

impl Selector {
    /// Computes the specificity of this selector.
    ///
    /// A selector list takes the max over its members since each member is
    /// matched independently; compounds and complex selectors sum their
    /// parts' contributions.
    pub fn specificity(&self) -> Specificity {
        match self {
            Selector::List(members) => members
                .iter()
                .map(Selector::specificity)
                .max()
                .unwrap_or(Specificity::ZERO),
            Selector::Complex { left, right, .. } => {
                left.specificity().add(right.specificity())
            }
            Selector::Compound(parts) => parts
                .iter()
                .fold(Specificity::ZERO, |acc, p| acc.add(p.specificity())),
            Selector::Simple(part) => part.specificity(),
        }
    }
}

impl core::fmt::Display for Selector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Selector::List(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
            Selector::Complex {
                left,
                combinator,
                right,
            } => {
                let comb = match combinator {
                    Combinator::Descendant => " ",
                    Combinator::Child => " > ",
                    Combinator::AdjacentSibling => " + ",
                    Combinator::GeneralSibling => " ~ ",
                };
                write!(f, "{}{}{}", left, comb, right)
            }
            Selector::Compound(parts) => {
                for part in parts {
                    write!(f, "{}", part)?;
                }
                Ok(())
            }
            Selector::Simple(part) => write!(f, "{}", part),
        }
    }
}

/// Parses a selector string into a [`Selector`] tree.
///
/// Returns `None` for blank or syntactically invalid input; callers must
/// treat that as "this rule never matches, skip it".
pub fn parse_selector(selector_text: &str) -> Option<Selector> {
    let trimmed = selector_text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut parser = SelectorParser {
        input: trimmed,
        pos: 0,
    };
    parser.parse_selector_list()
}

struct SelectorParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> SelectorParser<'a> {
    fn parse_selector_list(&mut self) -> Option<Selector> {
        let mut members = Vec::new();
        members.push(self.parse_complex_selector()?);

        while self.pos < self.input.len() {
            self.skip_whitespace();
            if self.peek() == Some(b',') {
                self.pos += 1;
                self.skip_whitespace();
                members.push(self.parse_complex_selector()?);
            } else {
                break;
            }
        }

        if members.len() == 1 {
            members.pop()
        } else {
            Some(Selector::List(members))
        }
    }

    fn parse_complex_selector(&mut self) -> Option<Selector> {
        let mut left = self.parse_compound_selector()?;

        while self.pos < self.input.len() {
            let saved = self.pos;
            let Some(combinator) = self.parse_combinator() else {
                break;
            };

            // A trailing combinator before ',' / ')' / end belongs to the
            // list syntax, not to this selector.
            match self.peek() {
                None | Some(b',') | Some(b')') => {
                    self.pos = saved;
                    break;
                }
                _ => {}
            }

            let right = self.parse_compound_selector()?;
            left = Selector::Complex {
                left: Box::new(left),
                combinator,
                right: Box::new(right),
            };
        }

        Some(left)
    }

    fn parse_combinator(&mut self) -> Option<Combinator> {
        let had_whitespace = self.skip_whitespace();

        match self.peek() {
            Some(b'>') => {
                self.pos += 1;
                self.skip_whitespace();
                Some(Combinator::Child)
            }
            Some(b'+') => {
                self.pos += 1;
                self.skip_whitespace();
                Some(Combinator::AdjacentSibling)
            }
            Some(b'~') => {
                self.pos += 1;
                self.skip_whitespace();
                Some(Combinator::GeneralSibling)
            }
            Some(c) if had_whitespace && c != b',' && c != b')' => Some(Combinator::Descendant),
            _ => None,
        }
    }

    fn parse_compound_selector(&mut self) -> Option<Selector> {
        let mut parts = Vec::new();

        while let Some(c) = self.peek() {
            match c {
                b'.' | b'#' | b'[' | b':' => parts.push(self.parse_simple_selector()?),
                b'*' => {
                    self.pos += 1;
                    parts.push(SimpleSelector::Universal);
                }
                c if is_ident_start(c) => parts.push(self.parse_type_selector()?),
                _ => break,
            }
        }

        if parts.is_empty() {
            return None;
        }
        if parts.len() == 1 {
            parts.pop().map(Selector::Simple)
        } else {
            Some(Selector::Compound(parts))
        }
    }

    fn parse_simple_selector(&mut self) -> Option<SimpleSelector> {
        match self.peek()? {
            b'.' => {
                self.pos += 1;
                Some(SimpleSelector::Class(self.parse_identifier()?))
            }
            b'#' => {
                self.pos += 1;
                Some(SimpleSelector::Id(self.parse_identifier()?))
            }
            b'[' => self.parse_attribute_selector(),
            b':' => self.parse_pseudo_selector(),
            _ => self.parse_type_selector(),
        }
    }

    fn parse_type_selector(&mut self) -> Option<SimpleSelector> {
        if self.peek() == Some(b'*') {
            self.pos += 1;
            return Some(SimpleSelector::Universal);
        }
        let name = self.parse_identifier()?;
        Some(SimpleSelector::Type(name.to_ascii_lowercase()))
    }

    fn parse_attribute_selector(&mut self) -> Option<SimpleSelector> {
        self.pos += 1; // consume '['
        self.skip_whitespace();

        let name = self.parse_identifier()?.to_ascii_lowercase();
        self.skip_whitespace();

        if self.peek() == Some(b']') {
            self.pos += 1;
            return Some(SimpleSelector::Attribute {
                name,
                operator: None,
                value: String::new(),
            });
        }

        let operator = self.parse_attr_operator();
        self.skip_whitespace();
        let value = self.parse_attr_value();
        self.skip_whitespace();

        if self.peek() == Some(b']') {
            self.pos += 1;
        }

        Some(SimpleSelector::Attribute {
            name,
            operator: Some(operator),
            value,
        })
    }

    /// Reads an attribute operator; anything unrecognized falls back to `=`.
    fn parse_attr_operator(&mut self) -> AttrOperator {
        let Some(c) = self.peek() else {
            return AttrOperator::Equals;
        };

        if c == b'=' {
            self.pos += 1;
            return AttrOperator::Equals;
        }

        if self.input.as_bytes().get(self.pos + 1) == Some(&b'=') {
            let op = match c {
                b'~' => AttrOperator::Includes,
                b'|' => AttrOperator::DashMatch,
                b'^' => AttrOperator::Prefix,
                b'$' => AttrOperator::Suffix,
                b'*' => AttrOperator::Substring,
                _ => return AttrOperator::Equals,
            };
            self.pos += 2;
            return op;
        }

        AttrOperator::Equals
    }

    fn parse_attr_value(&mut self) -> String {
        let Some(quote) = self.peek() else {
            return String::new();
        };

        if quote == b'"' || quote == b'\'' {
            self.pos += 1;
            let start = self.pos;
            while self.peek().is_some_and(|c| c != quote) {
                self.advance_char();
            }
            let value = self.input[start..self.pos].to_string();
            if self.peek().is_some() {
                self.pos += 1; // closing quote
            }
            return value;
        }

        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c != b']' && !c.is_ascii_whitespace())
        {
            self.advance_char();
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_pseudo_selector(&mut self) -> Option<SimpleSelector> {
        self.pos += 1; // consume first ':'

        if self.peek() == Some(b':') {
            self.pos += 1;
            let name = self.parse_identifier()?.to_ascii_lowercase();
            return Some(SimpleSelector::PseudoElement(name));
        }

        let name = self.parse_identifier()?.to_ascii_lowercase();

        let mut argument = None;
        if self.peek() == Some(b'(') {
            self.pos += 1;
            let start = self.pos;
            let mut depth = 1;
            while let Some(c) = self.peek() {
                match c {
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                self.advance_char();
            }
            argument = Some(self.input[start..self.pos].trim().to_string());
            if self.peek().is_some() {
                self.pos += 1; // consume ')'
            }
        }

        Some(SimpleSelector::PseudoClass { name, argument })
    }

    /// Reads a CSS identifier, honoring `\x` escapes. Returns `None` when no
    /// identifier characters are present, which invalidates the whole parse.
    fn parse_identifier(&mut self) -> Option<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_ident_char(c) {
                self.pos += 1;
            } else if c == b'\\' && self.pos + 1 < self.input.len() {
                self.pos += 1;
                self.advance_char();
            } else if c >= 0x80 {
                // Non-ASCII characters are valid in CSS identifiers.
                self.advance_char();
            } else {
                break;
            }
        }

        if self.pos == start {
            return None;
        }
        Some(self.input[start..self.pos].to_string())
    }

    /// Skips ASCII whitespace; returns whether anything was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Advances past one UTF-8 scalar, keeping `pos` on a char boundary.
    fn advance_char(&mut self) {
        let mut next = self.pos + 1;
        while next < self.input.len() && !self.input.is_char_boundary(next) {
            next += 1;
        }
        self.pos = next.min(self.input.len());
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'-'
}

fn is_ident_char(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}
