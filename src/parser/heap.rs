//! Indexed max-heap over `RefEdge::total_size` (spec §4.3): supports
//! identity-based `remove` in O(log n) because each edge remembers its own
//! slot via `RefEdge::heap_index`.

use super::edge_pool::{EdgePool, EdgeId, NULL_EDGE};

pub struct EdgeHeap {
    data: Vec<EdgeId>,
}

impl EdgeHeap {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn insert(&mut self, pool: &mut EdgePool, id: EdgeId) {
        let index = self.data.len();
        self.data.push(id);
        pool.get_mut(id).heap_index = index as u32;
        self.sift_up(pool, index);
    }

    /// Remove `id` from the heap by identity. No-op if it isn't resident.
    pub fn remove(&mut self, pool: &mut EdgePool, id: EdgeId) {
        let index = pool.get(id).heap_index;
        if index == NULL_EDGE {
            return;
        }
        self.remove_at(pool, index as usize);
    }

    /// Pop and return the root (largest `total_size`), or `None` if empty.
    pub fn remove_worst(&mut self, pool: &mut EdgePool) -> Option<EdgeId> {
        if self.data.is_empty() {
            return None;
        }
        let root = self.data[0];
        self.remove_at(pool, 0);
        Some(root)
    }

    fn remove_at(&mut self, pool: &mut EdgePool, index: usize) {
        pool.get_mut(self.data[index]).heap_index = NULL_EDGE;
        let last = self.data.len() - 1;
        if index != last {
            self.data.swap(index, last);
            pool.get_mut(self.data[index]).heap_index = index as u32;
        }
        self.data.pop();
        if index < self.data.len() && !self.sift_down(pool, index) {
            self.sift_up(pool, index);
        }
    }

    fn total_size(&self, pool: &EdgePool, index: usize) -> u32 {
        pool.get(self.data[index]).total_size
    }

    fn swap(&mut self, pool: &mut EdgePool, a: usize, b: usize) {
        self.data.swap(a, b);
        pool.get_mut(self.data[a]).heap_index = a as u32;
        pool.get_mut(self.data[b]).heap_index = b as u32;
    }

    fn sift_up(&mut self, pool: &mut EdgePool, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.total_size(pool, index) > self.total_size(pool, parent) {
                self.swap(pool, index, parent);
                index = parent;
            } else {
                break;
            }
        }
    }

    /// Returns whether any swap was performed.
    fn sift_down(&mut self, pool: &mut EdgePool, mut index: usize) -> bool {
        let mut moved = false;
        loop {
            let left = 2 * index + 1;
            let right = 2 * index + 2;
            let mut largest = index;
            if left < self.data.len() && self.total_size(pool, left) > self.total_size(pool, largest) {
                largest = left;
            }
            if right < self.data.len() && self.total_size(pool, right) > self.total_size(pool, largest) {
                largest = right;
            }
            if largest == index {
                break;
            }
            self.swap(pool, index, largest);
            index = largest;
            moved = true;
        }
        moved
    }
}

impl Default for EdgeHeap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_worst_returns_largest() {
        let mut pool = EdgePool::with_capacity(16);
        let mut heap = EdgeHeap::new();
        for total in [10u32, 50, 30, 5, 90, 20] {
            let id = pool.create(0, 1, 2, total, NULL_EDGE).unwrap();
            heap.insert(&mut pool, id);
        }
        let mut out = Vec::new();
        while let Some(id) = heap.remove_worst(&mut pool) {
            out.push(pool.get(id).total_size);
        }
        assert_eq!(out, vec![90, 50, 30, 20, 10, 5]);
    }

    #[test]
    fn remove_by_identity() {
        let mut pool = EdgePool::with_capacity(16);
        let mut heap = EdgeHeap::new();
        let ids: Vec<_> = [10u32, 50, 30, 5, 90, 20]
            .iter()
            .map(|&total| {
                let id = pool.create(0, 1, 2, total, NULL_EDGE).unwrap();
                heap.insert(&mut pool, id);
                id
            })
            .collect();
        // remove the "90" edge (ids[4]) out of order
        heap.remove(&mut pool, ids[4]);
        assert_eq!(heap.len(), 5);
        let mut out = Vec::new();
        while let Some(id) = heap.remove_worst(&mut pool) {
            out.push(pool.get(id).total_size);
        }
        assert_eq!(out, vec![50, 30, 20, 10, 5]);
    }
}
