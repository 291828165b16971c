
use log::trace;
use rustc_hash::FxHashMap as HashMap;

use crate::banded_aligner::{Alignment, AlignmentOp};

/// Index of the synthetic source node that every consensus path starts from.
pub const START_NODE: usize = 0;
/// Index of the synthetic sink node that every consensus path ends at.
pub const END_NODE: usize = 1;

/// A single symbol observation column in the alignment graph.
#[derive(Clone, Debug)]
pub struct PoaNode {
    /// The symbol stored at this node
    symbol: u8,
    /// Total weight of the sequences whose alignment passed through this node
    weight: u64,
    /// Nodes with an edge into this node
    predecessors: Vec<usize>,
    /// Nodes this node has an edge to
    successors: Vec<usize>,
    /// Alternative nodes holding a different symbol at the same alignment column
    aligned_alternatives: Vec<usize>
}

impl PoaNode {
    fn new(symbol: u8, weight: u64) -> PoaNode {
        PoaNode {
            symbol,
            weight,
            predecessors: vec![],
            successors: vec![],
            aligned_alternatives: vec![]
        }
    }

    // getters
    pub fn symbol(&self) -> u8 {
        self.symbol
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    pub fn predecessors(&self) -> &[usize] {
        &self.predecessors
    }

    pub fn successors(&self) -> &[usize] {
        &self.successors
    }

    pub fn aligned_alternatives(&self) -> &[usize] {
        &self.aligned_alternatives
    }
}

/// The partial-order alignment graph: a DAG of symbol nodes with weighted edges.
/// Nodes live in an arena and are addressed by dense indices; the graph only ever grows.
/// A maintained topological order over the real nodes drives both the aligner and the
/// consensus extraction, and every inserted edge points forward in that order.
#[derive(Clone, Debug)]
pub struct PoaGraph {
    /// Node arena; indices are stable for the life of the graph
    nodes: Vec<PoaNode>,
    /// Edge weights keyed by (from, to)
    edge_weights: HashMap<(usize, usize), u64>,
    /// All real nodes in topological order
    topo_order: Vec<usize>,
    /// Position of each node in `topo_order`; the synthetic nodes carry no rank
    topo_rank: Vec<usize>
}

impl PoaGraph {
    /// Creates a graph seeded from the first weighted sequence: one node per symbol,
    /// linearly chained with edges of the sequence's weight, bracketed by the synthetic
    /// start and end nodes.
    /// # Arguments
    /// * `sequence` - the seeding sequence, must be non-empty
    /// * `weight` - the observation weight of the seeding sequence
    pub fn seeded(sequence: &[u8], weight: u64) -> PoaGraph {
        assert!(!sequence.is_empty());

        let mut graph = PoaGraph {
            nodes: vec![PoaNode::new(0, 0), PoaNode::new(0, 0)],
            edge_weights: Default::default(),
            topo_order: vec![],
            topo_rank: vec![usize::MAX, usize::MAX]
        };

        let mut prev = START_NODE;
        for &symbol in sequence.iter() {
            let node = graph.push_node(symbol, weight);
            graph.splice_into_order(node, graph.topo_order.len());
            graph.add_or_increment_edge(prev, node, weight);
            prev = node;
        }
        graph.add_or_increment_edge(prev, END_NODE, weight);
        graph
    }

    /// Appends a node to the arena without placing it in the topological order yet.
    fn push_node(&mut self, symbol: u8, weight: u64) -> usize {
        let index = self.nodes.len();
        self.nodes.push(PoaNode::new(symbol, weight));
        self.topo_rank.push(usize::MAX);
        index
    }

    /// Splices a node into the topological order at the given position and
    /// refreshes the ranks of everything it shifted.
    fn splice_into_order(&mut self, node: usize, position: usize) {
        self.topo_order.insert(position, node);
        for rank in position..self.topo_order.len() {
            self.topo_rank[self.topo_order[rank]] = rank;
        }
    }

    /// Creates the edge if absent, otherwise adds to its weight.
    /// # Arguments
    /// * `from` - the source node
    /// * `to` - the target node
    /// * `weight` - the weight to add
    pub fn add_or_increment_edge(&mut self, from: usize, to: usize, weight: u64) {
        debug_assert!(
            from == START_NODE || to == END_NODE || self.topo_rank[from] < self.topo_rank[to],
            "edge ({from}, {to}) would violate the topological order"
        );

        if let Some(edge_weight) = self.edge_weights.get_mut(&(from, to)) {
            *edge_weight += weight;
        } else {
            self.edge_weights.insert((from, to), weight);
            self.nodes[from].successors.push(to);
            self.nodes[to].predecessors.push(from);
        }
    }

    /// Adds weight to an existing node.
    pub fn increment_node_weight(&mut self, node: usize, weight: u64) {
        self.nodes[node].weight += weight;
    }

    /// Merges an alignment into the graph with the aligned sequence's weight.
    /// Matches increment existing node and edge weights, mismatches reuse or create an
    /// alternative node at the same column, insertions create fresh nodes spliced in
    /// after the previous node, and deletions skip graph nodes untouched.
    /// # Arguments
    /// * `sequence` - the sequence that was aligned
    /// * `weight` - the observation weight of that sequence
    /// * `alignment` - the alignment produced against this graph
    pub fn integrate_alignment(&mut self, sequence: &[u8], weight: u64, alignment: &Alignment) {
        let mut prev = START_NODE;
        for &op in alignment.ops().iter() {
            match op {
                AlignmentOp::Match { node, seq_pos } => {
                    debug_assert_eq!(self.nodes[node].symbol, sequence[seq_pos]);
                    self.increment_node_weight(node, weight);
                    self.add_or_increment_edge(prev, node, weight);
                    prev = node;
                }
                AlignmentOp::Mismatch { node, seq_pos } => {
                    let symbol = sequence[seq_pos];
                    debug_assert_ne!(self.nodes[node].symbol, symbol);

                    let existing = self.nodes[node]
                        .aligned_alternatives
                        .iter()
                        .copied()
                        .find(|&alt| self.nodes[alt].symbol == symbol);

                    let target = match existing {
                        Some(alt) => {
                            // this symbol was already observed at the column, accumulate on it
                            self.increment_node_weight(alt, weight);
                            alt
                        }
                        None => {
                            let alt = self.push_node(symbol, weight);
                            self.splice_into_order(alt, self.topo_rank[node]);

                            // link the new alternative into the column's alignment ring
                            let mut ring = self.nodes[node].aligned_alternatives.clone();
                            ring.push(node);
                            for &member in ring.iter() {
                                self.nodes[member].aligned_alternatives.push(alt);
                            }
                            self.nodes[alt].aligned_alternatives = ring;
                            alt
                        }
                    };
                    self.add_or_increment_edge(prev, target, weight);
                    prev = target;
                }
                AlignmentOp::Insertion { seq_pos } => {
                    let node = self.push_node(sequence[seq_pos], weight);
                    let position = if prev == START_NODE {
                        0
                    } else {
                        self.topo_rank[prev] + 1
                    };
                    self.splice_into_order(node, position);
                    self.add_or_increment_edge(prev, node, weight);
                    prev = node;
                }
                AlignmentOp::Deletion { node: _ } => {
                    // the sequence skips this node, nothing to record
                }
            }
        }
        self.add_or_increment_edge(prev, END_NODE, weight);

        trace!("graph after merge: {} nodes, {} edges", self.num_nodes(), self.num_edges());
    }

    /// Extracts the consensus: the maximum-total-edge-weight path from start to end,
    /// found with one relaxation pass over the topological order. On equal path weight
    /// the earlier-created node wins, keeping the output reproducible.
    /// Returns the symbols along the winning path and the path's total weight.
    pub fn heaviest_path(&self) -> (Vec<u8>, u64) {
        let mut best_score: Vec<Option<u64>> = vec![None; self.nodes.len()];
        let mut best_pred: Vec<usize> = vec![usize::MAX; self.nodes.len()];
        best_score[START_NODE] = Some(0);

        for &node in self.topo_order.iter().chain(std::iter::once(&END_NODE)) {
            let mut best: Option<(u64, usize)> = None;
            for &pred in self.nodes[node].predecessors.iter() {
                let Some(pred_score) = best_score[pred] else {
                    continue;
                };
                let candidate = pred_score + self.edge_weight(pred, node);
                let better = match best {
                    None => true,
                    Some((score, chosen)) => candidate > score || (candidate == score && pred < chosen)
                };
                if better {
                    best = Some((candidate, pred));
                }
            }
            if let Some((score, pred)) = best {
                best_score[node] = Some(score);
                best_pred[node] = pred;
            }
        }

        // the seeded graph always connects start to end
        let path_weight = best_score[END_NODE].unwrap();
        let mut consensus = vec![];
        let mut current = best_pred[END_NODE];
        while current != START_NODE {
            consensus.push(self.nodes[current].symbol);
            current = best_pred[current];
        }
        consensus.reverse();

        (consensus, path_weight)
    }

    /// Returns the weight of an edge, or 0 if the edge does not exist.
    pub fn edge_weight(&self, from: usize, to: usize) -> u64 {
        self.edge_weights.get(&(from, to)).copied().unwrap_or(0)
    }

    // getters
    pub fn node(&self, index: usize) -> &PoaNode {
        &self.nodes[index]
    }

    /// The number of real (non-synthetic) nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len() - 2
    }

    pub fn num_edges(&self) -> usize {
        self.edge_weights.len()
    }

    pub fn topo_order(&self) -> &[usize] {
        &self.topo_order
    }

    /// The position of a real node in the topological order.
    pub fn rank_of(&self, node: usize) -> usize {
        self.topo_rank[node]
    }
}
