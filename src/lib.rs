//! mailcss -- CSS inliner for HTML email
//!
//! Rewrites an HTML document so that every element carries its computed
//! styles in an inline `style` attribute, for clients that ignore
//! `<style>` blocks. Rules that cannot be inlined (pseudo-classes,
//! pseudo-elements, `@media` and friends) are preserved in a regenerated
//! `<style>` block instead.
//!
//! The whole pipeline is tolerant: malformed CSS fragments and broken
//! markup are skipped, never raised to the caller.
//!
//! # Features
//!
//! - `std` (default) -- std error trait integration; disable for `no_std`
//!   targets with an allocator
//!
//! # Usage
//!
//! ```
//! let html = "<html><head><style>p { color: red }</style></head>\
//!             <body><p>Hello</p></body></html>";
//! let inlined = mailcss::inline(html);
//! assert!(inlined.contains(r#"<p style="color: red;">Hello</p>"#));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![deny(clippy::large_enum_variant, clippy::large_stack_arrays, clippy::redundant_clone)]
#![warn(
    clippy::box_collection,
    clippy::needless_collect,
    clippy::map_clone,
    clippy::implicit_clone,
    clippy::inefficient_to_string
)]

extern crate alloc;

pub mod css;
pub mod error;
pub mod html;
pub mod index;
pub mod inliner;
pub mod matcher;
pub mod selector;
pub mod specificity;
pub mod style;

// Re-export key types for convenience
pub use css::{parse_css, Declaration, ParsedCss, Rule};
pub use error::InlineError;
pub use html::{extract_styles, Document, Element, ElementId};
pub use index::ElementIndex;
pub use inliner::{
    inline, inline_additional_only, inline_additional_only_with_tree, inline_with_css,
};
pub use matcher::{has_pseudo, matches};
pub use selector::{parse_selector, AttrOperator, Combinator, Selector, SimpleSelector};
pub use specificity::Specificity;
pub use style::StyleAttribute;
