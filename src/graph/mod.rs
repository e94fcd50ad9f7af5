//! Partial-order graphs and the topological fill driver.
//!
//! A graph is an arena of nodes listed in topological order; edges are index
//! lists on both endpoints. Filling the graph aligns one query against every
//! node, seeding each node's kernel run with the lane maximum of its
//! predecessors' saved last columns, so a node's matrix behaves as if its
//! sequence were appended to the best-scoring path leading into it.

use crate::{
    alignment::{AlignError, Alignment, Direction, LaneWidth, MASK_LEN_MIN, Profile, SATURATED, ScoreSize, Seed},
    data::{ScoringMatrix, encode_with},
};
use foldhash::fast::RandomState;
use std::collections::HashMap;

/// One reference segment in a partial-order graph.
pub struct Node {
    id:        String,
    seq:       Vec<u8>,
    codes:     Vec<u8>,
    prev:      Vec<usize>,
    next:      Vec<usize>,
    alignment: Option<Alignment>,
}

impl Node {
    /// Creates a node from an ASCII sequence, keeping both the text and its
    /// integer-coded copy.
    pub fn new(id: impl Into<String>, seq: &[u8], nt_table: &[u8; 128]) -> Node {
        Node {
            id:        id.into(),
            seq:       seq.to_vec(),
            codes:     encode_with(nt_table, seq),
            prev:      Vec::new(),
            next:      Vec::new(),
            alignment: None,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The node's sequence as ASCII text.
    #[inline]
    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    /// The node's sequence as integer codes.
    #[inline]
    pub fn codes(&self) -> &[u8] {
        &self.codes
    }

    #[inline]
    pub fn predecessors(&self) -> &[usize] {
        &self.prev
    }

    #[inline]
    pub fn successors(&self) -> &[usize] {
        &self.next
    }

    /// The node's alignment from the most recent fill, if any.
    #[inline]
    pub fn alignment(&self) -> Option<&Alignment> {
        self.alignment.as_ref()
    }

    /// Drops the node's alignment record so the graph can be refilled.
    #[inline]
    pub fn clear_alignment(&mut self) {
        self.alignment = None;
    }
}

/// A DAG of reference segments. Nodes must be added in a topological order:
/// every edge goes from an already-added node to a later one.
#[derive(Default)]
pub struct Graph {
    nodes: Vec<Node>,
    ids:   HashMap<String, usize, RandomState>,
}

impl Graph {
    pub fn new() -> Graph {
        Graph {
            nodes: Vec::new(),
            ids:   HashMap::default(),
        }
    }

    /// Appends a node, returning its index.
    pub fn add_node(&mut self, node: Node) -> usize {
        let idx = self.nodes.len();
        self.ids.insert(node.id.clone(), idx);
        self.nodes.push(node);
        idx
    }

    /// Records the edge `from -> to` on both endpoints.
    pub fn add_edge(&mut self, from: usize, to: usize) {
        self.nodes[from].next.push(to);
        self.nodes[to].prev.push(from);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    #[inline]
    pub fn node_mut(&mut self, idx: usize) -> &mut Node {
        &mut self.nodes[idx]
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Index of the node with the given id, if present.
    #[inline]
    pub fn node_by_id(&self, id: &str) -> Option<usize> {
        self.ids.get(id).copied()
    }

    /// In-degree tally in list order: every node's predecessors must all be
    /// scheduled before the node's own turn comes up.
    fn validate_order(&self) -> Result<(), AlignError> {
        let mut pending: Vec<usize> = self.nodes.iter().map(|n| n.prev.len()).collect();
        for (idx, node) in self.nodes.iter().enumerate() {
            if pending[idx] != 0 {
                return Err(AlignError::CyclicGraph);
            }
            for &next in &node.next {
                pending[next] -= 1;
            }
        }
        Ok(())
    }

    /// Aligns `read_text` against every node in topological order, leaving
    /// each node's alignment record populated.
    ///
    /// The traversal starts on the 8-bit kernel. The first node to saturate
    /// drops the byte profile, rewinds to the first node, and refills the
    /// whole graph in 16-bit lanes; the stripe count therefore stays uniform
    /// across the graph, and at most one escalation can occur per fill.
    pub fn fill(
        &mut self, read_text: &[u8], nt_table: &[u8; 128], matrix: &ScoringMatrix, gap_open: u8, gap_extend: u8,
        mask_len: usize,
    ) -> Result<(), AlignError> {
        self.validate_order()?;
        if mask_len < MASK_LEN_MIN {
            eprintln!("graphsw: mask_len < {MASK_LEN_MIN} suppresses second-best alignment reporting");
        }

        let read_codes = encode_with(nt_table, read_text);
        let mut profile = Profile::new(&read_codes, matrix, ScoreSize::Both);
        let mut width = LaneWidth::Byte;

        let mut i = 0;
        while i < self.nodes.len() {
            let seed = {
                let preds: Vec<&Alignment> = self.nodes[i]
                    .prev
                    .iter()
                    .filter_map(|&p| self.nodes[p].alignment.as_ref())
                    .collect();
                Seed::from_predecessors(width, profile.seg_len(width), &preds)?
            };

            let alignment = profile.fill_once(
                &self.nodes[i].codes,
                Direction::Forward,
                gap_open,
                gap_extend,
                mask_len,
                Some(&seed),
                width,
            )?;
            let score = alignment.score;
            self.nodes[i].alignment = Some(alignment);

            if width == LaneWidth::Byte && score == SATURATED {
                profile.drop_byte();
                width = LaneWidth::Word;
                i = 0;
                continue;
            }
            i += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::NT_TABLE;
    use rand::RngExt;
    use rand_xoshiro::{Xoshiro256PlusPlus, rand_core::SeedableRng};

    const GAP_OPEN: u8 = 3;
    const GAP_EXTEND: u8 = 1;

    fn chain_graph(segments: &[&[u8]]) -> Graph {
        let mut g = Graph::new();
        for (i, &seg) in segments.iter().enumerate() {
            let idx = g.add_node(Node::new(format!("n{i}"), seg, &NT_TABLE));
            if idx > 0 {
                g.add_edge(idx - 1, idx);
            }
        }
        g
    }

    fn linear_score(read_text: &[u8], ref_text: &[u8]) -> Alignment {
        let matrix = ScoringMatrix::dna(2, 2);
        let read = encode_with(&NT_TABLE, read_text);
        let reference = encode_with(&NT_TABLE, ref_text);
        let profile = Profile::new(&read, &matrix, ScoreSize::Both);
        profile.align(&reference, GAP_OPEN, GAP_EXTEND, 15, None).unwrap()
    }

    #[test]
    fn chain_matches_linear_reference() {
        let matrix = ScoringMatrix::dna(2, 2);
        let segments: [&[u8]; 3] = [b"ACG", b"T", b"ACGT"];
        let mut g = chain_graph(&segments);
        g.fill(b"ACGTACGT", &NT_TABLE, &matrix, GAP_OPEN, GAP_EXTEND, 15).unwrap();

        let last = g.node(2).alignment().unwrap();
        let linear = linear_score(b"ACGTACGT", b"ACGTACGT");
        assert_eq!(last.score, linear.score);
        assert_eq!(last.score, 16);
        assert_eq!(last.ref_end, 3); // within the final node
        assert_eq!(last.read_end, 7);
    }

    #[test]
    fn diamond_takes_the_best_branch() {
        let matrix = ScoringMatrix::dna(2, 2);
        let mut g = Graph::new();
        let n0 = g.add_node(Node::new("start", b"AC", &NT_TABLE));
        let n1 = g.add_node(Node::new("alt_gt", b"GT", &NT_TABLE));
        let n2 = g.add_node(Node::new("alt_gg", b"GG", &NT_TABLE));
        let n3 = g.add_node(Node::new("end", b"ACGT", &NT_TABLE));
        g.add_edge(n0, n1);
        g.add_edge(n0, n2);
        g.add_edge(n1, n3);
        g.add_edge(n2, n3);

        g.fill(b"ACGTACGT", &NT_TABLE, &matrix, GAP_OPEN, GAP_EXTEND, 15).unwrap();

        // The AC -> GT -> ACGT path spells the query exactly.
        let last = g.node(n3).alignment().unwrap();
        assert_eq!(last.score, 16);
        assert_eq!(last.read_end, 7);
    }

    #[test]
    fn back_edge_is_rejected() {
        let matrix = ScoringMatrix::dna(2, 2);
        let segments: [&[u8]; 2] = [b"ACG", b"TTT"];
        let mut g = chain_graph(&segments);
        g.add_edge(1, 0);
        assert!(matches!(
            g.fill(b"ACGT", &NT_TABLE, &matrix, GAP_OPEN, GAP_EXTEND, 15),
            Err(AlignError::CyclicGraph)
        ));
    }

    #[test]
    fn saturating_fill_escalates_and_rewinds() {
        let matrix = ScoringMatrix::dna(2, 2);
        let long_a = vec![b'A'; 100];
        let mut g = chain_graph(&[&long_a[..], &long_a[..]]);
        let read = vec![b'A'; 200];

        g.fill(&read, &NT_TABLE, &matrix, GAP_OPEN, GAP_EXTEND, 15).unwrap();

        // Both nodes end up refilled in 16-bit lanes after the rewind.
        for idx in 0..g.len() {
            assert_eq!(g.node(idx).alignment().unwrap().width(), Some(LaneWidth::Word));
        }
        assert_eq!(g.node(0).alignment().unwrap().score, 200);
        assert_eq!(g.node(1).alignment().unwrap().score, 400);
        assert_eq!(g.node(1).alignment().unwrap().read_end, 199);
    }

    #[test]
    fn random_chains_match_linear_alignment() {
        let matrix = ScoringMatrix::dna(2, 2);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0x6a5);
        let bases = [b'A', b'C', b'G', b'T', b'N'];

        for _ in 0..40 {
            let read: Vec<u8> = (0..rng.random_range(1..=40)).map(|_| bases[rng.random_range(0..5)]).collect();
            let reference: Vec<u8> = (0..rng.random_range(3..=60)).map(|_| bases[rng.random_range(0..5)]).collect();

            // Split the reference into a chain of up to three segments.
            let cut_a = rng.random_range(1..reference.len());
            let cut_b = rng.random_range(cut_a..reference.len());
            let segments = [&reference[..cut_a], &reference[cut_a..cut_b], &reference[cut_b..]];
            let mut g = chain_graph(&segments);

            g.fill(&read, &NT_TABLE, &matrix, GAP_OPEN, GAP_EXTEND, 15).unwrap();

            let graph_best = (0..g.len())
                .filter_map(|i| g.node(i).alignment())
                .map(|a| a.score)
                .max()
                .unwrap();
            assert_eq!(graph_best, linear_score(&read, &reference).score);
        }
    }

    #[test]
    fn refill_replaces_prior_records() {
        let matrix = ScoringMatrix::dna(2, 2);
        let segments: [&[u8]; 1] = [b"ACGT"];
        let mut g = chain_graph(&segments);
        g.fill(b"ACGT", &NT_TABLE, &matrix, GAP_OPEN, GAP_EXTEND, 15).unwrap();
        assert_eq!(g.node(0).alignment().unwrap().score, 8);

        g.fill(b"TTTT", &NT_TABLE, &matrix, GAP_OPEN, GAP_EXTEND, 15).unwrap();
        assert_eq!(g.node(0).alignment().unwrap().score, 2);

        g.node_mut(0).clear_alignment();
        assert!(g.node(0).alignment().is_none());
    }

    #[test]
    fn node_lookup_by_id() {
        let segments: [&[u8]; 2] = [b"AC", b"GT"];
        let g = chain_graph(&segments);
        assert_eq!(g.node_by_id("n1"), Some(1));
        assert_eq!(g.node_by_id("missing"), None);
    }
}
