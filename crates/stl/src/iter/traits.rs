//! Iterator traits record
//!
//! Every [`Cursor`] gets the full set of associated types through a blanket
//! impl; raw pointers are cursors, so they are covered with the
//! random-access category and `T` as value type. [`traits_of`] turns the
//! associated types into a runtime record for inspection and diagnostics.

use core::any::type_name;
use core::fmt;

use super::category::{CategoryKind, IteratorCategory};
use super::cursor::Cursor;

/// Associated types describing a cursor
pub trait IteratorTraits {
    type Category: IteratorCategory;
    type Value;
    type Difference;
    type Pointer;
    type Reference<'a>
    where
        Self: 'a;
}

impl<I: Cursor> IteratorTraits for I {
    type Category = I::Category;
    type Value = I::Value;
    type Difference = isize;
    type Pointer = *const I::Value;
    type Reference<'a>
        = &'a I::Value
    where
        Self: 'a;
}

/// Category of `I`, resolved at compile time
#[inline]
pub const fn category_of<I: IteratorTraits>() -> CategoryKind {
    <I::Category as IteratorCategory>::KIND
}

/// Runtime description of a cursor's associated types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraitsRecord {
    pub category: CategoryKind,
    pub value_type: &'static str,
    pub difference_type: &'static str,
    pub pointer_type: &'static str,
    pub value_size: usize,
}

impl fmt::Display for TraitsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cursor over {} ({} bytes, difference {})",
            self.category, self.value_type, self.value_size, self.difference_type
        )
    }
}

/// Builds the traits record of `I`
pub fn traits_of<I: IteratorTraits>() -> TraitsRecord {
    TraitsRecord {
        category: category_of::<I>(),
        value_type: type_name::<I::Value>(),
        difference_type: type_name::<I::Difference>(),
        pointer_type: type_name::<I::Pointer>(),
        value_size: core::mem::size_of::<I::Value>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::adapters::InputOnly;

    #[test]
    fn test_pointer_traits() {
        let record = traits_of::<*const u32>();
        assert_eq!(record.category, CategoryKind::RandomAccess);
        assert_eq!(record.value_type, "u32");
        assert_eq!(record.difference_type, "isize");
        assert_eq!(record.pointer_type, "*const u32");
        assert_eq!(record.value_size, 4);
        assert!(record.to_string().starts_with("random access cursor over u32"));
    }

    #[test]
    fn test_adapter_downgrades_category() {
        assert_eq!(category_of::<*mut u8>(), CategoryKind::RandomAccess);
        assert_eq!(category_of::<InputOnly<*const u8>>(), CategoryKind::Input);
    }
}
