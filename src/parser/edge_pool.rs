//! RefEdge arena (spec §4.3): a fixed-capacity free-list pool of parse-graph
//! edges, each carrying a `source` link to its predecessor and a refcount so
//! a whole dead lineage can be torn down in one `release` call.

pub type EdgeId = u32;

/// Sentinel meaning "no edge" — used for `source` (root edges), and by the
/// heap/offset-map modules for "not present".
pub const NULL_EDGE: EdgeId = u32::MAX;

#[derive(Clone, Copy, Debug)]
pub struct RefEdge {
    pub pos: u32,
    pub offset: u32,
    pub length: u32,
    pub total_size: u32,
    pub source: EdgeId,
    pub refcount: u32,
    /// position in the owning heap's backing array, or `NULL_EDGE` if not
    /// currently heap-resident. Maintained by `parser::heap::EdgeHeap`.
    pub heap_index: u32,
}

pub struct EdgePool {
    slots: Vec<Option<RefEdge>>,
    free_list: Vec<EdgeId>,
    edge_count: u32,
    cleaned_edges: u32,
}

impl EdgePool {
    pub fn with_capacity(capacity: u32) -> Self {
        let free_list: Vec<EdgeId> = (0..capacity).rev().collect();
        Self {
            slots: vec![None; capacity as usize],
            free_list,
            edge_count: 0,
            cleaned_edges: 0,
        }
    }

    pub fn edge_count(&self) -> u32 {
        self.edge_count
    }

    pub fn cleaned_edges(&self) -> u32 {
        self.cleaned_edges
    }

    pub fn is_full(&self) -> bool {
        self.free_list.is_empty()
    }

    pub fn get(&self, id: EdgeId) -> &RefEdge {
        self.slots[id as usize].as_ref().expect("dangling edge id")
    }

    pub fn get_mut(&mut self, id: EdgeId) -> &mut RefEdge {
        self.slots[id as usize].as_mut().expect("dangling edge id")
    }

    /// Allocate a new edge from the free list. Returns `None` if the arena
    /// is full; callers evict via the heap before this happens in practice.
    pub fn create(
        &mut self,
        pos: u32,
        offset: u32,
        length: u32,
        total_size: u32,
        source: EdgeId,
    ) -> Option<EdgeId> {
        let id = self.free_list.pop()?;
        if source != NULL_EDGE {
            self.get_mut(source).refcount += 1;
        }
        self.slots[id as usize] = Some(RefEdge {
            pos,
            offset,
            length,
            total_size,
            source,
            refcount: 1,
            heap_index: NULL_EDGE,
        });
        self.edge_count += 1;
        Some(id)
    }

    /// Return `id`'s slot to the free list. Caller must have already
    /// unlinked it from any heap/map it was registered in.
    pub fn destroy(&mut self, id: EdgeId, clean: bool) {
        self.slots[id as usize] = None;
        self.free_list.push(id);
        self.edge_count -= 1;
        if clean {
            self.cleaned_edges += 1;
        }
    }

    /// Decrement `id`'s refcount; when it (or any ancestor it drags down to
    /// zero) hits zero, destroy it and continue up the former `source`
    /// chain. Heap/map membership must be cleared by the caller first —
    /// this only frees arena slots.
    pub fn release(&mut self, id: EdgeId) {
        let mut cur = id;
        while cur != NULL_EDGE {
            let edge = self.get_mut(cur);
            edge.refcount -= 1;
            if edge.refcount > 0 {
                break;
            }
            let parent = edge.source;
            self.destroy(cur, true);
            cur = parent;
        }
    }
}
