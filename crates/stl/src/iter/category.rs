//! Iterator category tags
//!
//! Each traversal capability is a zero-sized tag type. Algorithms are
//! implemented once per tag (see [`algorithm`](super::algorithm)), and the
//! cursor's declared `Category` picks the implementation at compile time.
//!
//! The refinement chain `Input <- Forward <- Bidirectional <- RandomAccess`
//! is expressed through the marker traits [`InputTag`], [`ForwardTag`] and
//! [`BidirectionalTag`]. Output is a separate, write-only category.

use core::fmt;

/// Runtime name of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Input,
    Output,
    Forward,
    Bidirectional,
    RandomAccess,
}

impl CategoryKind {
    /// Whether this category provides every capability of `other`
    pub const fn refines(self, other: Self) -> bool {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => a >= b,
            (None, None) => true,
            _ => false,
        }
    }

    /// Position in the input refinement chain; `None` for output
    const fn rank(self) -> Option<u8> {
        match self {
            Self::Input => Some(0),
            Self::Forward => Some(1),
            Self::Bidirectional => Some(2),
            Self::RandomAccess => Some(3),
            Self::Output => None,
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Forward => "forward",
            Self::Bidirectional => "bidirectional",
            Self::RandomAccess => "random access",
        };
        f.write_str(name)
    }
}

/// A category tag type
pub trait IteratorCategory: Copy + Default + fmt::Debug + 'static {
    const KIND: CategoryKind;
}

/// Single-pass read traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InputIteratorTag;

/// Single-pass write traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OutputIteratorTag;

/// Multi-pass forward traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ForwardIteratorTag;

/// Forward traversal plus stepping back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BidirectionalIteratorTag;

/// Constant-time jumps and distances
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RandomAccessIteratorTag;

impl IteratorCategory for InputIteratorTag {
    const KIND: CategoryKind = CategoryKind::Input;
}
impl IteratorCategory for OutputIteratorTag {
    const KIND: CategoryKind = CategoryKind::Output;
}
impl IteratorCategory for ForwardIteratorTag {
    const KIND: CategoryKind = CategoryKind::Forward;
}
impl IteratorCategory for BidirectionalIteratorTag {
    const KIND: CategoryKind = CategoryKind::Bidirectional;
}
impl IteratorCategory for RandomAccessIteratorTag {
    const KIND: CategoryKind = CategoryKind::RandomAccess;
}

/// Tags offering at least input traversal
pub trait InputTag: IteratorCategory {}
/// Tags offering at least forward traversal
pub trait ForwardTag: InputTag {}
/// Tags offering at least bidirectional traversal
pub trait BidirectionalTag: ForwardTag {}

impl InputTag for InputIteratorTag {}
impl InputTag for ForwardIteratorTag {}
impl InputTag for BidirectionalIteratorTag {}
impl InputTag for RandomAccessIteratorTag {}

impl ForwardTag for ForwardIteratorTag {}
impl ForwardTag for BidirectionalIteratorTag {}
impl ForwardTag for RandomAccessIteratorTag {}

impl BidirectionalTag for BidirectionalIteratorTag {}
impl BidirectionalTag for RandomAccessIteratorTag {}

#[cfg(test)]
mod tests {
    use super::*;

    fn needs_forward<T: ForwardTag>() -> CategoryKind {
        T::KIND
    }

    #[test]
    fn test_refinement() {
        use CategoryKind::*;
        assert!(RandomAccess.refines(Input));
        assert!(RandomAccess.refines(Bidirectional));
        assert!(Bidirectional.refines(Forward));
        assert!(!Forward.refines(Bidirectional));
        assert!(!Input.refines(Forward));
        assert!(!Output.refines(Input));
        assert!(!RandomAccess.refines(Output));
        assert!(Output.refines(Output));
    }

    #[test]
    fn test_marker_traits() {
        assert_eq!(needs_forward::<RandomAccessIteratorTag>(), CategoryKind::RandomAccess);
        assert_eq!(needs_forward::<ForwardIteratorTag>(), CategoryKind::Forward);
        assert_eq!(CategoryKind::Bidirectional.to_string(), "bidirectional");
    }
}
