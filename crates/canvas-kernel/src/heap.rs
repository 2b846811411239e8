//! Binary min-heap keyed by a caller-supplied scoring function.
//!
//! The heap is a flat vector read as a complete binary tree: the children of
//! index `i` sit at `2i + 1` and `2i + 2`. Lower scores pop first. Entries are
//! located by identity (see [`Identity`]) for removal and rescoring, which is
//! a linear scan.
//!
//! Scores may change while an entry sits in the heap, as long as the caller
//! reports it through [`BinaryHeap::rescore_element`]. Rescoring only moves an
//! entry toward the root, so it is correct for decreased scores. After a score
//! increase call [`BinaryHeap::rebuild`] instead.

use std::rc::Rc;
use std::sync::Arc;

/// Identity comparison for heap entries.
///
/// Shared pointers compare by address, not by the value they point to, so two
/// equal-looking nodes stay distinguishable. Plain integer handles compare by
/// value.
pub trait Identity {
    fn is_same(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Identity for Rc<T> {
    fn is_same(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Identity for Arc<T> {
    fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Identity for &T {
    fn is_same(&self, other: &Self) -> bool {
        std::ptr::eq(*self, *other)
    }
}

macro_rules! impl_identity_by_value {
    ($($ty:ty),*) => {
        $(
            impl Identity for $ty {
                fn is_same(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_identity_by_value!(u16, u32, u64, usize, i32, i64);

/// Min-heap over `T`, ordered by `score`.
///
/// Entries with equal scores pop in no particular order.
pub struct BinaryHeap<T, F>
where
    F: Fn(&T) -> f64,
{
    content: Vec<T>,
    score: F,
}

impl<T, F> BinaryHeap<T, F>
where
    F: Fn(&T) -> f64,
{
    /// Create an empty heap ordered by `score`.
    pub fn new(score: F) -> Self {
        Self {
            content: Vec::new(),
            score,
        }
    }

    /// Insert a value.
    pub fn push(&mut self, value: T) {
        self.content.push(value);
        self.sift_up(self.content.len() - 1);
    }

    /// Remove and return the lowest-scored value.
    pub fn pop(&mut self) -> Option<T> {
        let last = self.content.pop()?;
        if self.content.is_empty() {
            return Some(last);
        }
        let head = std::mem::replace(&mut self.content[0], last);
        self.sift_down(0);
        Some(head)
    }

    /// The lowest-scored value, without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.content.first()
    }

    /// Number of entries.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Restore heap order for every entry. O(n).
    pub fn rebuild(&mut self) {
        for i in (0..self.content.len() / 2).rev() {
            self.sift_down(i);
        }
    }

    /// Move the entry at `n` toward the root while it scores below its parent.
    fn sift_up(&mut self, mut n: usize) {
        let score = (self.score)(&self.content[n]);
        while n > 0 {
            let parent = ((n + 1) >> 1) - 1;
            if score < (self.score)(&self.content[parent]) {
                self.content.swap(n, parent);
                n = parent;
            } else {
                break;
            }
        }
    }

    /// Move the entry at `n` toward the leaves while a child scores below it.
    fn sift_down(&mut self, mut n: usize) {
        let length = self.content.len();
        let score = (self.score)(&self.content[n]);
        loop {
            let right = (n + 1) << 1;
            let left = right - 1;

            let mut swap = None;
            let mut swap_score = score;
            if left < length {
                let left_score = (self.score)(&self.content[left]);
                if left_score < score {
                    swap = Some(left);
                    swap_score = left_score;
                }
            }
            if right < length {
                let right_score = (self.score)(&self.content[right]);
                if right_score < swap_score {
                    swap = Some(right);
                }
            }

            match swap {
                Some(child) => {
                    self.content.swap(n, child);
                    n = child;
                }
                None => break,
            }
        }
    }
}

impl<T, F> BinaryHeap<T, F>
where
    T: Identity,
    F: Fn(&T) -> f64,
{
    fn position(&self, value: &T) -> Option<usize> {
        self.content.iter().position(|entry| entry.is_same(value))
    }

    /// Remove `value` and return the stored entry. No-op when absent.
    pub fn remove(&mut self, value: &T) -> Option<T> {
        let i = self.position(value)?;
        let last = self.content.pop()?;
        if i == self.content.len() {
            // Removed entry was the tail
            return Some(last);
        }

        let removed = std::mem::replace(&mut self.content[i], last);
        // The tail had no ordering relation to slot `i`, but comparing with
        // the removed score tells which single direction can be violated.
        if (self.score)(&self.content[i]) < (self.score)(&removed) {
            self.sift_up(i);
        } else {
            self.sift_down(i);
        }
        Some(removed)
    }

    /// Reorder `value` after its score decreased. No-op when absent.
    ///
    /// Only sifts toward the root: an increased score is left where it is.
    pub fn rescore_element(&mut self, value: &T) {
        if let Some(i) = self.position(value) {
            self.sift_up(i);
        }
    }
}

impl<T, F> std::fmt::Debug for BinaryHeap<T, F>
where
    T: std::fmt::Debug,
    F: Fn(&T) -> f64,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryHeap")
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn drain<T, F: Fn(&T) -> f64>(heap: &mut BinaryHeap<T, F>) -> Vec<T> {
        std::iter::from_fn(|| heap.pop()).collect()
    }

    fn assert_heap_order<T, F: Fn(&T) -> f64>(heap: &BinaryHeap<T, F>) {
        let scores: Vec<f64> = heap.content.iter().map(|v| (heap.score)(v)).collect();
        for i in 1..scores.len() {
            let parent = ((i + 1) >> 1) - 1;
            assert!(scores[parent] <= scores[i], "parent {parent} > child {i}: {scores:?}");
        }
    }

    #[test]
    fn test_pop_in_score_order() {
        let mut heap = BinaryHeap::new(|v: &u32| *v as f64);
        for v in [5, 3, 8, 1, 4] {
            heap.push(v);
        }
        assert_eq!(heap.size(), 5);
        assert_eq!(drain(&mut heap), vec![1, 3, 4, 5, 8]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_pop_empty() {
        let mut heap = BinaryHeap::new(|v: &u32| *v as f64);
        assert_eq!(heap.pop(), None);
        assert_eq!(heap.peek(), None);
        heap.push(7);
        assert_eq!(heap.pop(), Some(7));
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn test_pop_non_decreasing_for_many_values() {
        let mut heap = BinaryHeap::new(|v: &i64| *v as f64);
        // Deterministic scramble of 0..200 with duplicates
        let values: Vec<i64> = (0..200).map(|i| (i * 37 + 11) % 97).collect();
        for &v in &values {
            heap.push(v);
            assert_heap_order(&heap);
        }
        let popped = drain(&mut heap);
        assert_eq!(popped.len(), values.len());
        assert!(popped.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_peek_is_minimum() {
        let mut heap = BinaryHeap::new(|v: &u32| *v as f64);
        heap.push(9);
        heap.push(2);
        heap.push(6);
        assert_eq!(heap.peek(), Some(&2));
        assert_eq!(heap.size(), 3);
    }

    #[test]
    fn test_remove_restores_size() {
        let mut heap = BinaryHeap::new(|v: &Rc<f64>| **v);
        for s in [4.0, 9.0, 1.0, 7.0] {
            heap.push(Rc::new(s));
        }
        let before = heap.size();
        let x = Rc::new(3.0);
        heap.push(x.clone());
        let removed = heap.remove(&x).unwrap();
        assert!(Rc::ptr_eq(&removed, &x));
        assert_eq!(heap.size(), before);
        assert_heap_order(&heap);

        let drained = drain(&mut heap);
        assert!(drained.iter().all(|v| !Rc::ptr_eq(v, &x)));
        assert_eq!(drained.iter().map(|v| **v).collect::<Vec<_>>(), vec![1.0, 4.0, 7.0, 9.0]);
    }

    #[test]
    fn test_remove_uses_identity_not_value() {
        let mut heap = BinaryHeap::new(|v: &Rc<f64>| **v);
        let a = Rc::new(5.0);
        let b = Rc::new(5.0);
        heap.push(a.clone());
        heap.push(b.clone());
        let removed = heap.remove(&b).unwrap();
        assert!(Rc::ptr_eq(&removed, &b));
        assert!(heap.position(&a).is_some());
        assert!(heap.position(&b).is_none());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut heap = BinaryHeap::new(|v: &usize| *v as f64);
        heap.push(1);
        heap.push(2);
        assert_eq!(heap.remove(&42), None);
        assert_eq!(heap.size(), 2);
    }

    #[test]
    fn test_remove_tail_and_head() {
        let mut heap = BinaryHeap::new(|v: &usize| *v as f64);
        for v in [1, 2, 3] {
            heap.push(v);
        }
        // 3 is stored last
        assert_eq!(heap.remove(&3), Some(3));
        assert_eq!(heap.remove(&1), Some(1));
        assert_eq!(drain(&mut heap), vec![2]);
    }

    #[test]
    fn test_remove_from_middle_sifts_up() {
        // Tail moves into a deeper branch where it is smaller than the new parent
        let mut heap = BinaryHeap::new(|v: &usize| *v as f64);
        for v in [0, 10, 1, 11, 12, 2, 3] {
            heap.push(v);
        }
        assert_heap_order(&heap);
        heap.remove(&11);
        assert_heap_order(&heap);
        assert_eq!(drain(&mut heap), vec![0, 1, 2, 3, 10, 12]);
    }

    #[test]
    fn test_rescore_after_decrease() {
        let nodes: Vec<Rc<Cell<f64>>> = [10.0, 20.0, 30.0, 40.0]
            .into_iter()
            .map(|s| Rc::new(Cell::new(s)))
            .collect();
        let mut heap = BinaryHeap::new(|n: &Rc<Cell<f64>>| n.get());
        for n in &nodes {
            heap.push(n.clone());
        }

        nodes[3].set(1.0);
        heap.rescore_element(&nodes[3]);
        assert!(Rc::ptr_eq(heap.peek().unwrap(), &nodes[3]));
        assert_heap_order(&heap);
    }

    #[test]
    fn test_rescore_does_not_correct_increase() {
        let nodes: Vec<Rc<Cell<f64>>> = [1.0, 2.0, 3.0]
            .into_iter()
            .map(|s| Rc::new(Cell::new(s)))
            .collect();
        let mut heap = BinaryHeap::new(|n: &Rc<Cell<f64>>| n.get());
        for n in &nodes {
            heap.push(n.clone());
        }

        nodes[0].set(100.0);
        heap.rescore_element(&nodes[0]);
        // Still at the root: rescoring never sifts toward the leaves
        assert!(Rc::ptr_eq(heap.peek().unwrap(), &nodes[0]));

        heap.rebuild();
        assert!(Rc::ptr_eq(heap.peek().unwrap(), &nodes[1]));
        assert_heap_order(&heap);
    }

    #[test]
    fn test_rescore_missing_is_noop() {
        let mut heap = BinaryHeap::new(|v: &u64| *v as f64);
        heap.push(3);
        heap.rescore_element(&9);
        assert_eq!(heap.size(), 1);
    }

    #[test]
    fn test_reference_identity() {
        let values = [3.0_f64, 1.0, 2.0];
        let mut heap = BinaryHeap::new(|v: &&f64| **v);
        for v in &values {
            heap.push(v);
        }
        assert_eq!(heap.remove(&&values[1]), Some(&values[1]));
        assert_eq!(drain(&mut heap), vec![&2.0, &3.0]);
    }
}
