//! A min-queue whose priorities are read live.
//!
//! # Why not `BinaryHeap`
//!
//! The path search keys its frontier by "best distance found so far", and
//! those distances change after an item has been enqueued.  A heap would
//! need a decrease-key step; here the metric is evaluated on every
//! dequeue/peek instead, so mutating whatever the metric reads reorders the
//! queue for free.  The cost is an O(n) scan per dequeue, which is fine for
//! frontiers of a few hundred planning vertices.
//!
//! Ties go to the element enqueued first.

/// A min-priority container keyed by a caller-supplied metric.
///
/// `metric` may read shared state through interior mutability (e.g. a
/// `RefCell<HashMap<..>>` of distances); it is called afresh on every
/// comparison.
pub struct PriorityQueue<T, M> {
    elements: Vec<T>,
    metric:   M,
}

impl<T: PartialOrd + Clone> PriorityQueue<T, fn(&T) -> T> {
    /// A queue ordered by the elements themselves.
    pub fn by_value() -> Self {
        Self::new(T::clone)
    }
}

impl<T, K, M> PriorityQueue<T, M>
where
    M: Fn(&T) -> K,
    K: PartialOrd,
{
    pub fn new(metric: M) -> Self {
        Self { elements: Vec::new(), metric }
    }

    /// Add `item`.  Equal items are independent entries.
    pub fn enqueue(&mut self, item: T) {
        self.elements.push(item);
    }

    /// The item with the smallest metric (earliest inserted among equals).
    pub fn peek(&self) -> Option<&T> {
        self.next_index().map(|i| &self.elements[i])
    }

    /// Remove and return the item [`peek`](Self::peek) would return.
    pub fn dequeue(&mut self) -> Option<T> {
        let index = self.next_index()?;
        Some(self.elements.remove(index))
    }

    /// Remove the earliest-inserted occurrence of `item`.
    ///
    /// Returns `false` (and leaves the queue untouched) if `item` is absent.
    pub fn delete(&mut self, item: &T) -> bool
    where
        T: PartialEq,
    {
        match self.elements.iter().position(|e| e == item) {
            Some(index) => {
                self.elements.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn next_index(&self) -> Option<usize> {
        let mut best: Option<(usize, K)> = None;
        for (i, element) in self.elements.iter().enumerate() {
            let key = (self.metric)(element);
            // Strict `<` keeps the earliest index among equal keys.
            match &best {
                Some((_, best_key)) if !(key < *best_key) => {}
                _ => best = Some((i, key)),
            }
        }
        best.map(|(i, _)| i)
    }
}
