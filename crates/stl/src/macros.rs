//! Public macros for nebula-stl

/// Build an [`AllocatorConfig`](crate::AllocatorConfig), defaulting the
/// fields not named
///
/// # Examples
/// ```
/// use nebula_stl::{FreeListAllocator, allocator_config};
///
/// let config = allocator_config! {
///     max_bytes: 256,
///     refill_batch: 32,
/// };
/// let pool = FreeListAllocator::with_config(config)?;
/// assert_eq!(pool.size_classes().count(), 32);
/// # Ok::<(), nebula_stl::StlError>(())
/// ```
#[macro_export]
macro_rules! allocator_config {
    ($($field:ident: $value:expr),* $(,)?) => {{
        $crate::config::AllocatorConfig {
            $($field: $value,)*
            ..Default::default()
        }
    }};
}

/// Build a [`Deque`](crate::Deque) from a list of elements
///
/// # Examples
/// ```
/// use nebula_stl::deque;
///
/// let d = deque![1, 2, 3];
/// assert_eq!(d.len(), 3);
/// assert_eq!(d[2], 3);
///
/// let zeros = deque![0u8; 4];
/// assert_eq!(zeros.len(), 4);
/// ```
#[macro_export]
macro_rules! deque {
    () => {
        $crate::deque::Deque::new()
    };
    ($elem:expr; $n:expr) => {
        $crate::deque::Deque::from_elem($n, &$elem)
    };
    ($($x:expr),+ $(,)?) => {{
        let mut deque = $crate::deque::Deque::new();
        $(deque.push_back($x);)+
        deque
    }};
}

#[cfg(test)]
mod tests {
    use crate::config::AllocatorConfig;

    #[test]
    fn test_allocator_config_macro_defaults() {
        let config = allocator_config! { refill_batch: 5 };
        assert_eq!(config.refill_batch, 5);
        assert_eq!(config.align, AllocatorConfig::default().align);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deque_macro() {
        let d: crate::Deque<i32> = deque![];
        assert!(d.is_empty());
        let d = deque!["x"; 3];
        assert_eq!(d.iter().copied().collect::<Vec<_>>(), ["x", "x", "x"]);
    }
}
