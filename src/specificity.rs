//! CSS specificity arithmetic
//!
//! Specificity is the `(a, b, c)` weight that decides which of several
//! matching rules wins a property conflict: `a` counts ID selectors, `b`
//! counts class, attribute, and pseudo-class selectors, `c` counts type and
//! pseudo-element selectors. Comparison is lexicographic, most significant
//! component first.

/// Specificity of a CSS selector as an `(ids, classes, types)` tuple.
///
/// The derived ordering is lexicographic with the ID count most significant,
/// which is exactly CSS's comparison rule. Inline `style` attributes are not
/// represented here; they win by construction of the merge order in the
/// inliner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity {
    /// Number of ID selectors.
    pub ids: u32,
    /// Number of class, attribute, and pseudo-class selectors.
    pub classes: u32,
    /// Number of type and pseudo-element selectors.
    pub types: u32,
}

impl Specificity {
    /// Zero specificity, the weight of `*` and the starting accumulator.
    pub const ZERO: Specificity = Specificity {
        ids: 0,
        classes: 0,
        types: 0,
    };

    /// Creates a specificity from its three components.
    pub const fn new(ids: u32, classes: u32, types: u32) -> Self {
        Specificity { ids, classes, types }
    }

    /// Componentwise sum, used when accumulating compound and complex
    /// selectors.
    pub const fn add(self, other: Specificity) -> Specificity {
        Specificity {
            ids: self.ids + other.ids,
            classes: self.classes + other.classes,
            types: self.types + other.types,
        }
    }
}

impl core::fmt::Display for Specificity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({},{},{})", self.ids, self.classes, self.types)
    }
}
