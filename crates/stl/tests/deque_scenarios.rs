//! Deque storage behaviour under allocation pressure

use nebula_stl::prelude::*;
use pretty_assertions::assert_eq;

type Tracked = TrackedAllocator<SystemAllocator>;

fn tracked() -> Tracked {
    TrackedAllocator::new(SystemAllocator::new())
}

/// Map plus buffers currently held by the deque
fn live_allocations(alloc: &Tracked) -> usize {
    alloc.allocation_count() - alloc.deallocation_count()
}

fn assert_buffer_span<T, A: Allocator>(deque: &Deque<T, A>) {
    let span = deque.end().node() - deque.begin().node() + 1;
    assert_eq!(deque.allocated_buffers(), span);
}

#[test]
fn test_push_back_then_pop_front_settles_on_one_buffer() {
    let alloc = tracked();
    {
        let mut deque = Deque::new_in(&alloc);
        let initial_map = deque.map_size();

        for i in 0..10_000i32 {
            deque.push_back(i);
        }
        assert_eq!(deque.len(), 10_000);
        assert_buffer_span(&deque);
        let grown_map = deque.map_size();
        assert!(grown_map >= initial_map);

        for i in 0..10_000i32 {
            assert_eq!(deque.pop_front(), Some(i));
        }
        assert!(deque.is_empty());
        assert_eq!(deque.allocated_buffers(), 1);
        assert_eq!(deque.map_size(), grown_map);
        assert_eq!(live_allocations(&alloc), 2);
    }
    assert!(!alloc.has_leaks());
    assert_eq!(alloc.allocation_count(), alloc.deallocation_count());
}

#[test]
fn test_clear_keeps_exactly_one_buffer() {
    let alloc = tracked();
    let mut deque = Deque::new_in(&alloc);
    for i in 0..5_000u64 {
        deque.push_front(i);
    }
    assert!(deque.allocated_buffers() > 1);

    deque.clear();
    assert_eq!(deque.len(), 0);
    assert_eq!(deque.allocated_buffers(), 1);
    assert_eq!(live_allocations(&alloc), 2);

    deque.push_back(1);
    deque.push_front(0);
    assert_eq!(deque.iter().copied().collect::<Vec<_>>(), [0, 1]);
}

#[test]
fn test_alternating_ends_recentre_instead_of_growing() {
    let alloc = tracked();
    let mut deque: Deque<[u8; 512], _> = Deque::new_in(&alloc);
    assert_eq!(deque.buffer_len(), 1);

    for round in 0..50u8 {
        for _ in 0..6 {
            deque.push_back([round; 512]);
        }
        for _ in 0..6 {
            deque.pop_front();
        }
        assert_buffer_span(&deque);
    }
    assert!(deque.map_size() <= 18);
}

#[test]
fn test_deque_on_free_list_pool() {
    let config = AllocatorConfig::default().with_max_bytes(512);
    let pool = FreeListAllocator::with_config(config).unwrap();
    {
        let mut deque: Deque<u8, _> = Deque::new_in(&pool);
        deque.extend(0..=255);
        assert_eq!(deque[200], 200);

        // Whole 512-byte buffers fit the largest size class
        let mut tiny: Deque<[u8; 64], _> = Deque::new_in(&pool);
        for i in 0..40u8 {
            tiny.push_back([i; 64]);
        }
        assert_eq!(tiny.buffer_len(), 8);
    }
    let stats = pool.stats().unwrap();
    assert_eq!(stats.live_blocks(), 0);
    assert!(stats.refills > 0);
}

#[test]
fn test_failed_insert_leaves_contents_and_storage() {
    let alloc = TrackedAllocator::with_limit(SystemAllocator::new(), 4096);
    let mut deque: Deque<u32, _> = Deque::try_new_in(&alloc).unwrap();
    for i in 0..200 {
        deque.try_push_back(i).unwrap();
    }
    let before: Vec<u32> = deque.iter().copied().collect();
    let buffers = deque.allocated_buffers();

    let err = deque.insert_n(100, 5_000, &7).unwrap_err();
    assert_eq!(err.code(), "STL:ALLOC:OOM");
    assert_eq!(deque.iter().copied().collect::<Vec<_>>(), before);
    assert_eq!(deque.allocated_buffers(), buffers);
    assert_buffer_span(&deque);
}

#[test]
fn test_length_limit_is_checked_before_mutation() {
    let mut deque: Deque<u64> = Deque::new();
    deque.push_back(1);
    let err = deque.insert_n(0, usize::MAX, &0).unwrap_err();
    assert_eq!(err.code(), "STL:CONTAINER:LENGTH");
    assert_eq!(deque.len(), 1);
    assert!(Deque::<u64, DefaultAllocator>::from_elem_in(usize::MAX, &0, DefaultAllocator::new()).is_err());
}

#[test]
fn test_stack_and_queue_share_a_pool_across_threads() {
    use std::sync::Arc;

    let shared = Arc::new(SharedAllocator::new());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                let mut queue = Queue::new_in(Arc::clone(&shared));
                let mut stack = Stack::new_in(shared);
                for i in 0..500u32 {
                    queue.push(t * 1000 + i);
                    stack.push(i);
                }
                (queue.pop(), stack.pop())
            })
        })
        .collect();

    for (t, handle) in handles.into_iter().enumerate() {
        let (front, top) = handle.join().unwrap();
        assert_eq!(front, Some(t as u32 * 1000));
        assert_eq!(top, Some(499));
    }
    assert_eq!(shared.stats().unwrap().live_blocks(), 0);
}
