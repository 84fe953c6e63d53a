//! Error types

extern crate alloc;

/// Errors raised while splicing inline styles back into the document.
///
/// Parsing itself never fails; this only covers internal consistency
/// checks on the computed edits.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum InlineError {
    /// Two computed edits overlap in the source text, so applying them
    /// would corrupt the output.
    OverlappingEdits {
        /// End offset of the earlier edit.
        first_end: usize,
        /// Start offset of the later edit.
        second_start: usize,
    },
}

impl core::fmt::Display for InlineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InlineError::OverlappingEdits {
                first_end,
                second_start,
            } => write!(
                f,
                "overlapping edits: range ending at {} collides with range starting at {}",
                first_end, second_start
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InlineError {}
