//! Graph-search LZ parser (spec §4.6): explores candidate `(offset,length)`
//! factorizations position by position, scoring each with a `Coder` cost
//! oracle, and keeps only the frontier the heap/offset-map machinery can
//! afford under a fixed `RefEdge` arena.

pub mod edge_pool;
pub mod heap;
pub mod offset_map;

use crate::lz_coder::{encode_reference, Coder, LzCoderState};
use crate::matcher::MatchFinder;
use crate::suffix::SuffixArray;
use edge_pool::{EdgeId, EdgePool, NULL_EDGE};
use heap::EdgeHeap;
use offset_map::OffsetMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LzSymbol {
    Literal { pos: u32 },
    Reference { pos: u32, offset: u32, length: u32 },
}

pub struct LZParseResult {
    pub symbols: Vec<LzSymbol>,
}

pub struct ParseParams {
    pub length_margin: u32,
    pub match_patience: u32,
    pub max_same_length: u32,
    pub skip_length: u32,
    pub references: u32,
    pub parity_mask: u32,
}

/// Edge-arena high-water marks for a single `parse` call, surfaced so the
/// pack driver can log them without reaching into the parser internals.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParseStats {
    pub max_edge_count: u32,
    pub cleaned_edges: u32,
}

struct Parser<'a> {
    data: &'a [u8],
    n: u32,
    pool: EdgePool,
    heap: EdgeHeap,
    edges_to_pos: Vec<OffsetMap>,
    best_for_offset: OffsetMap,
    best: EdgeId,
    literal_size: Vec<u32>,
    params: &'a ParseParams,
    max_edge_count: u32,
}

impl<'a> Parser<'a> {
    fn new(data: &'a [u8], params: &'a ParseParams) -> Self {
        let n = data.len() as u32;
        Self {
            data,
            n,
            pool: EdgePool::with_capacity(params.references),
            heap: EdgeHeap::new(),
            edges_to_pos: (0..=n).map(|_| OffsetMap::new()).collect(),
            best_for_offset: OffsetMap::new(),
            best: NULL_EDGE,
            literal_size: Vec::new(),
            params,
            max_edge_count: 0,
        }
    }

    fn stats(&self) -> ParseStats {
        ParseStats {
            max_edge_count: self.max_edge_count,
            cleaned_edges: self.pool.cleaned_edges(),
        }
    }

    /// Cumulative cost of encoding `data[0..i)` as all-literals from the
    /// initial state, for every prefix length `i`.
    fn compute_literal_size<C: Coder>(&mut self, coder: &mut C) {
        let mut cum = vec![0u32; self.n as usize + 1];
        let mut state = LzCoderState::default();
        for (i, &byte) in self.data.iter().enumerate() {
            let cost = crate::lz_coder::encode_literal(coder, byte, &mut state, self.params.parity_mask);
            cum[i + 1] = cum[i] + cost;
        }
        self.literal_size = cum;
    }

    fn source_pos_offset(&self, source: EdgeId) -> (u32, u32) {
        if source == NULL_EDGE {
            (0, 0)
        } else {
            let e = self.pool.get(source);
            (e.pos, e.offset)
        }
    }

    fn synth_state(&self, source: EdgeId, pos: u32) -> LzCoderState {
        let (source_pos, source_offset) = self.source_pos_offset(source);
        LzCoderState {
            after_first: pos > 0,
            prev_was_ref: pos == source_pos,
            parity: pos % 2,
            last_offset: source_offset,
        }
    }

    /// Walk `id`'s ancestor chain, decrementing refcounts and destroying
    /// (and removing from the heap) any edge this drops to zero.
    fn release_chain(&mut self, id: EdgeId) {
        let mut cur = id;
        while cur != NULL_EDGE {
            let refcount = {
                let edge = self.pool.get_mut(cur);
                edge.refcount -= 1;
                edge.refcount
            };
            if refcount > 0 {
                break;
            }
            let parent = self.pool.get(cur).source;
            self.heap.remove(&mut self.pool, cur);
            self.pool.destroy(cur, true);
            cur = parent;
        }
    }

    /// Remove `id` from whichever map currently indexes it (pending arrival
    /// in `edges_to_pos`, or durable residency in `best_for_offset`).
    fn unindex(&mut self, id: EdgeId) {
        let edge = self.pool.get(id);
        let (pos, offset) = (edge.pos, edge.offset);
        if self.edges_to_pos[pos as usize].get(offset) == Some(id) {
            self.edges_to_pos[pos as usize].remove(offset);
        } else if self.best_for_offset.get(offset) == Some(id) {
            self.best_for_offset.remove(offset);
        }
    }

    fn evict_worst(&mut self, protect_source: EdgeId) {
        let mut skipped = Vec::new();
        while let Some(id) = self.heap.remove_worst(&mut self.pool) {
            if id == self.best || id == protect_source {
                skipped.push(id);
                continue;
            }
            self.unindex(id);
            self.release_chain(id);
            break;
        }
        for id in skipped {
            self.heap.insert(&mut self.pool, id);
        }
    }

    fn try_create(
        &mut self,
        source: EdgeId,
        pos: u32,
        offset: u32,
        length: u32,
        coder: &mut impl Coder,
    ) -> Option<EdgeId> {
        if self.pool.is_full() {
            self.evict_worst(source);
            if self.pool.is_full() {
                return None;
            }
        }
        let n = self.n as usize;
        let pre = match source {
            NULL_EDGE => self.literal_size[pos as usize],
            s => self.pool.get(s).total_size - (self.literal_size[n] - self.literal_size[pos as usize]),
        };
        let mut state = self.synth_state(source, pos);
        let edge_cost = encode_reference(coder, offset, length, &mut state, self.params.parity_mask);
        let new_pos = pos + length;
        let post = self.literal_size[n] - self.literal_size[new_pos as usize];
        let total_size = pre + edge_cost + post;

        let id = self.pool.create(new_pos, offset, length, total_size, source)?;
        self.max_edge_count = self.max_edge_count.max(self.pool.edge_count());
        self.heap.insert(&mut self.pool, id);
        self.insert_pending(new_pos, offset, id);
        Some(id)
    }

    fn insert_pending(&mut self, new_pos: u32, offset: u32, id: EdgeId) {
        match self.edges_to_pos[new_pos as usize].get(offset) {
            None => {
                self.edges_to_pos[new_pos as usize].insert(offset, id);
            }
            Some(existing) => {
                if self.pool.get(id).total_size < self.pool.get(existing).total_size {
                    self.edges_to_pos[new_pos as usize].insert(offset, id);
                    self.heap.remove(&mut self.pool, existing);
                    self.release_chain(existing);
                } else {
                    self.heap.remove(&mut self.pool, id);
                    self.release_chain(id);
                }
            }
        }
    }

    /// Drain the edges ending exactly at `pos`, folding each into
    /// `best_for_offset` (per-offset champion) and the running global
    /// `best` (cheapest overall).
    fn drain(&mut self, pos: u32) {
        let drained: Vec<(u32, EdgeId)> = self.edges_to_pos[pos as usize].iter().collect();
        self.edges_to_pos[pos as usize].clear();
        for (offset, id) in drained {
            self.heap.remove(&mut self.pool, id);
            let keep = match self.best_for_offset.get(offset) {
                None => true,
                Some(existing) => self.pool.get(id).total_size < self.pool.get(existing).total_size,
            };
            if !keep {
                self.release_chain(id);
                continue;
            }
            if let Some(existing) = self.best_for_offset.get(offset) {
                self.release_chain(existing);
            }
            self.best_for_offset.insert(offset, id);
            self.heap.insert(&mut self.pool, id);

            let is_better = match self.best {
                NULL_EDGE => true,
                b => {
                    let (bt, bo) = (self.pool.get(b).total_size, self.pool.get(b).offset);
                    let nt = self.pool.get(id).total_size;
                    nt < bt || (nt == bt && offset < bo)
                }
            };
            if is_better {
                self.best = id;
            }
        }
    }

    fn drop_open_lineages(&mut self, from_pos: u32, through_pos: u32) {
        let offsets: Vec<(u32, EdgeId)> = self.best_for_offset.iter().collect();
        self.best_for_offset.clear();
        for (_, id) in offsets {
            self.heap.remove(&mut self.pool, id);
            self.release_chain(id);
        }
        for pos in (from_pos + 1)..=through_pos.min(self.n) {
            let entries: Vec<(u32, EdgeId)> = self.edges_to_pos[pos as usize].iter().collect();
            self.edges_to_pos[pos as usize].clear();
            for (_, id) in entries {
                self.heap.remove(&mut self.pool, id);
                self.release_chain(id);
            }
        }
    }

    fn run<C: Coder>(&mut self, sa: &SuffixArray, coder: &mut C) -> LZParseResult {
        self.compute_literal_size(coder);
        let mut finder = MatchFinder::new(self.data, sa, self.params.match_patience, self.params.max_same_length);

        let mut pos: u32 = 1;
        while pos <= self.n {
            self.drain(pos);

            if pos < self.n {
                finder.begin_matching(pos as usize);
                let mut max_match_length: u32 = 0;
                let mut skip_triggered = false;
                let mut matches_by_length: Vec<(usize, usize)> = Vec::new();
                while let Some((match_pos, match_length)) = finder.next_match() {
                    matches_by_length.push((match_pos, match_length));
                }

                for &(match_pos, raw_length) in &matches_by_length {
                    let offset = (pos as usize - match_pos) as u32;
                    let match_length = (raw_length as u32).min(self.n - pos);
                    if match_length < 2 {
                        continue;
                    }
                    max_match_length = max_match_length.max(match_length);
                    if match_length >= self.params.skip_length {
                        skip_triggered = true;
                    }
                    let min_len = match_length.saturating_sub(self.params.length_margin).max(2);
                    let mut length = min_len;
                    while length <= match_length {
                        self.try_create(self.best, pos, offset, length, coder);
                        if let Some(alt) = self.best_for_offset.get(offset) {
                            let alt_offset = self.pool.get(alt).offset;
                            let best_offset = if self.best == NULL_EDGE { u32::MAX } else { self.pool.get(self.best).offset };
                            if alt != self.best && alt_offset != best_offset {
                                self.try_create(alt, pos, offset, length, coder);
                            }
                        }
                        length += 1;
                    }
                }

                if skip_triggered {
                    let target = pos + max_match_length;
                    if target <= self.n && !self.edges_to_pos[target as usize].is_empty() {
                        self.drop_open_lineages(pos, target);
                        self.best = NULL_EDGE;
                        pos = target;
                        continue;
                    }
                }
            }
            pos += 1;
        }

        self.extract()
    }

    fn extract(&self) -> LZParseResult {
        let mut triples: Vec<(u32, u32, u32)> = Vec::new();
        let mut cur = self.best;
        while cur != NULL_EDGE {
            let e = self.pool.get(cur);
            triples.push((e.pos, e.offset, e.length));
            cur = e.source;
        }
        triples.reverse();

        let mut symbols = Vec::new();
        let mut at: u32 = 0;
        for (end_pos, offset, length) in triples {
            let start_pos = end_pos - length;
            while at < start_pos {
                symbols.push(LzSymbol::Literal { pos: at });
                at += 1;
            }
            symbols.push(LzSymbol::Reference { pos: start_pos, offset, length });
            at = end_pos;
        }
        while at < self.n {
            symbols.push(LzSymbol::Literal { pos: at });
            at += 1;
        }
        LZParseResult { symbols }
    }
}

pub fn parse<C: Coder>(data: &[u8], sa: &SuffixArray, coder: &mut C, params: &ParseParams) -> LZParseResult {
    let mut parser = Parser::new(data, params);
    parser.run(sa, coder)
}

/// Like `parse`, but also returns edge-arena high-water marks for logging.
pub fn parse_with_stats<C: Coder>(
    data: &[u8],
    sa: &SuffixArray,
    coder: &mut C,
    params: &ParseParams,
) -> (LZParseResult, ParseStats) {
    let mut parser = Parser::new(data, params);
    let result = parser.run(sa, coder);
    (result, parser.stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::SizeMeasuringCoder;
    use crate::entropy::counting::CountingCoder;

    fn default_params() -> ParseParams {
        ParseParams {
            length_margin: 2,
            match_patience: 500,
            max_same_length: 8,
            skip_length: 1000,
            references: 10_000,
            parity_mask: 0,
        }
    }

    fn symbols_reconstruct(data: &[u8], result: &LZParseResult) -> Vec<u8> {
        let mut out = Vec::new();
        for sym in &result.symbols {
            match *sym {
                LzSymbol::Literal { pos } => out.push(data[pos as usize]),
                LzSymbol::Reference { offset, length, .. } => {
                    let start = out.len() - offset as usize;
                    for i in 0..length as usize {
                        let b = out[start + i];
                        out.push(b);
                    }
                }
            }
        }
        out
    }

    #[test]
    fn parses_literal_only_input() {
        let data = b"abcdefgh";
        let sa = SuffixArray::build(data);
        let counting = CountingCoder::new();
        let mut coder = SizeMeasuringCoder::from_counts(&counting);
        let params = default_params();
        let result = parse(data, &sa, &mut coder, &params);
        assert_eq!(symbols_reconstruct(data, &result), data);
    }

    #[test]
    fn parses_repetitive_input_using_references() {
        let data = b"abcabcabcabcabcabcabc";
        let sa = SuffixArray::build(data);
        let counting = CountingCoder::new();
        let mut coder = SizeMeasuringCoder::from_counts(&counting);
        let params = default_params();
        let result = parse(data, &sa, &mut coder, &params);
        assert_eq!(symbols_reconstruct(data, &result), data);
        assert!(result.symbols.iter().any(|s| matches!(s, LzSymbol::Reference { .. })));
    }

    #[test]
    fn empty_input_produces_no_symbols() {
        let data: &[u8] = b"";
        let sa = SuffixArray::build(data);
        let counting = CountingCoder::new();
        let mut coder = SizeMeasuringCoder::from_counts(&counting);
        let params = default_params();
        let result = parse(data, &sa, &mut coder, &params);
        assert!(result.symbols.is_empty());
    }
}
