//! Deque checked against `VecDeque` and against its shifting rule

use std::collections::VecDeque;

use nebula_stl::Deque;
use proptest::prelude::*;

/// 64-byte element: eight per buffer, so short runs still cross buffers
#[derive(Debug, Clone, PartialEq)]
struct Wide {
    key: u32,
    _pad: [u8; 60],
}

impl Wide {
    fn new(key: u32) -> Self {
        Self { key, _pad: [0; 60] }
    }
}

#[derive(Debug, Clone)]
enum Op {
    PushBack(u32),
    PushFront(u32),
    PopBack,
    PopFront,
    Insert(usize, u32),
    InsertN(usize, usize, u32),
    Erase(usize),
    EraseRange(usize, usize),
    Truncate(usize),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<u32>().prop_map(Op::PushBack),
        4 => any::<u32>().prop_map(Op::PushFront),
        2 => Just(Op::PopBack),
        2 => Just(Op::PopFront),
        2 => (any::<usize>(), any::<u32>()).prop_map(|(i, v)| Op::Insert(i, v)),
        1 => (any::<usize>(), 0usize..40, any::<u32>()).prop_map(|(i, n, v)| Op::InsertN(i, n, v)),
        2 => any::<usize>().prop_map(Op::Erase),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::EraseRange(a, b)),
        1 => any::<usize>().prop_map(Op::Truncate),
        1 => Just(Op::Clear),
    ]
}

fn apply(deque: &mut Deque<Wide>, model: &mut VecDeque<u32>, op: Op) {
    let len = model.len();
    match op {
        Op::PushBack(v) => {
            deque.push_back(Wide::new(v));
            model.push_back(v);
        }
        Op::PushFront(v) => {
            deque.push_front(Wide::new(v));
            model.push_front(v);
        }
        Op::PopBack => assert_eq!(deque.pop_back().map(|w| w.key), model.pop_back()),
        Op::PopFront => assert_eq!(deque.pop_front().map(|w| w.key), model.pop_front()),
        Op::Insert(i, v) => {
            let i = i % (len + 1);
            deque.insert(i, Wide::new(v)).unwrap();
            model.insert(i, v);
        }
        Op::InsertN(i, n, v) => {
            let i = i % (len + 1);
            deque.insert_n(i, n, &Wide::new(v)).unwrap();
            for _ in 0..n {
                model.insert(i, v);
            }
        }
        Op::Erase(i) => {
            if len == 0 {
                assert!(deque.erase(i).is_err());
            } else {
                let i = i % len;
                assert_eq!(deque.erase(i).unwrap().key, model.remove(i).unwrap());
            }
        }
        Op::EraseRange(a, b) => {
            let (a, b) = (a % (len + 1), b % (len + 1));
            let (first, last) = (a.min(b), a.max(b));
            deque.erase_range(first, last).unwrap();
            model.drain(first..last);
        }
        Op::Truncate(n) => {
            let n = n % (len + 2);
            deque.truncate(n);
            model.truncate(n);
        }
        Op::Clear => {
            deque.clear();
            model.clear();
        }
    }
}

/// Addresses of every element, front to back
fn addresses<T>(deque: &Deque<T>) -> Vec<*const T> {
    deque.iter().map(|v| v as *const T).collect()
}

fn filled(len: usize, front_pushes: usize) -> Deque<Wide> {
    let mut deque = Deque::new();
    for i in 0..len - front_pushes {
        deque.push_back(Wide::new(i as u32));
    }
    for i in 0..front_pushes {
        deque.push_front(Wide::new(1000 + i as u32));
    }
    deque
}

proptest! {
    #[test]
    fn prop_matches_vec_deque(ops in proptest::collection::vec(op(), 1..120)) {
        let mut deque = Deque::new();
        let mut model = VecDeque::new();

        for op in ops {
            apply(&mut deque, &mut model, op);

            prop_assert_eq!(deque.len(), model.len());
            prop_assert!(deque.iter().map(|w| w.key).eq(model.iter().copied()));
            prop_assert!(deque.iter().rev().map(|w| w.key).eq(model.iter().rev().copied()));

            let span = deque.end().node() - deque.begin().node() + 1;
            prop_assert_eq!(deque.allocated_buffers(), span);
        }
    }

    #[test]
    fn prop_erase_moves_shorter_side(
        (len, front_pushes, index) in (1usize..100)
            .prop_flat_map(|len| (Just(len), 0..=len, 0..len))
    ) {
        let mut deque = filled(len, front_pushes);
        let before = addresses(&deque);

        deque.erase(index).unwrap();
        let after = addresses(&deque);

        let mut moved = 0;
        for (k, &addr) in before.iter().enumerate() {
            let now = match k {
                k if k < index => after[k],
                k if k > index => after[k - 1],
                _ => continue,
            };
            if now != addr {
                moved += 1;
            }
        }
        prop_assert_eq!(moved, index.min(len - index - 1));
    }

    #[test]
    fn prop_insert_moves_shorter_side(
        (len, front_pushes, index) in (0usize..100)
            .prop_flat_map(|len| (Just(len), 0..=len, 0..=len))
    ) {
        let mut deque = filled(len, front_pushes);
        let before = addresses(&deque);

        deque.insert(index, Wide::new(u32::MAX)).unwrap();
        let after = addresses(&deque);

        let moved = before
            .iter()
            .enumerate()
            .filter(|&(k, &addr)| {
                let now = if k < index { after[k] } else { after[k + 1] };
                now != addr
            })
            .count();
        prop_assert_eq!(moved, index.min(len - index));
        prop_assert_eq!(deque[index].key, u32::MAX);
    }
}
