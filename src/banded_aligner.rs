
use itertools::Itertools;
use log::trace;
use std::cmp::Reverse;

use crate::poa_config::PoaConfig;
use crate::poa_graph::{PoaGraph, END_NODE, START_NODE};

/// Sentinel for DP cells that no admissible path has reached.
const NEG_INF: i32 = i32::MIN / 2;

const MAT_M: u8 = 0;
const MAT_D: u8 = 1;
const MAT_I: u8 = 2;

/// One step of an alignment between a sequence and the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignmentOp {
    /// Sequence symbol aligned to a node holding the same symbol
    Match { node: usize, seq_pos: usize },
    /// Sequence symbol aligned to a node holding a different symbol
    Mismatch { node: usize, seq_pos: usize },
    /// Sequence symbol with no corresponding graph node
    Insertion { seq_pos: usize },
    /// Graph node skipped by the sequence
    Deletion { node: usize }
}

/// A scored alignment of one sequence against the graph, consumed by the graph merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alignment {
    /// The operations in sequence/graph order
    ops: Vec<AlignmentOp>,
    /// The total alignment score under the scoring scheme that produced it
    score: i32
}

impl Alignment {
    /// Constructor
    pub fn new(ops: Vec<AlignmentOp>, score: i32) -> Alignment {
        Alignment {
            ops,
            score
        }
    }

    // Getters
    pub fn ops(&self) -> &[AlignmentOp] {
        &self.ops
    }

    pub fn score(&self) -> i32 {
        self.score
    }
}

/// Computes a best-scoring global alignment of one sequence against the current graph.
/// The dynamic program walks the graph nodes in topological order (one DP row per node,
/// one column per sequence position) and scores cells with match/mismatch plus affine gaps.
/// Admissible cells are restricted to a band around the corridor spanned by the
/// start-corner and end-corner diagonals, so the final cell stays reachable for any
/// band width and admissible sets grow with it. The branch limit caps how many
/// predecessor edges are scored per node, heaviest first.
pub struct BandedAligner<'a> {
    /// The graph being aligned against
    graph: &'a PoaGraph,
    /// Banding, branching, and scoring knobs
    config: &'a PoaConfig
}

impl<'a> BandedAligner<'a> {
    /// Creates a new aligner against the current graph state.
    pub fn new(graph: &'a PoaGraph, config: &'a PoaConfig) -> BandedAligner<'a> {
        BandedAligner {
            graph,
            config
        }
    }

    /// Aligns a sequence against the graph and returns the scored alignment.
    /// # Arguments
    /// * `sequence` - the sequence to align, must be non-empty and pre-validated
    pub fn align(&self, sequence: &[u8]) -> Alignment {
        debug_assert!(!sequence.is_empty());

        let band = i64::try_from(self.config.band_width).unwrap_or(i64::MAX);
        match self.align_banded(sequence, band) {
            Some(alignment) => alignment,
            // a narrow band can disconnect the corners when the graph carries long skip
            // edges, in which case we redo the fill exhaustively
            None => self.align_banded(sequence, i64::MAX).unwrap()
        }
    }

    /// Runs one banded DP fill and traceback. Returns None if no admissible path
    /// connects the corners under this band.
    fn align_banded(&self, sequence: &[u8], band: i64) -> Option<Alignment> {
        let graph = self.graph;
        let topo = graph.topo_order();
        let n_rows = topo.len();
        let cols = sequence.len();
        let width = cols + 1;
        let size = (n_rows + 1) * width;

        let match_score = self.config.match_score;
        let mismatch_penalty = self.config.mismatch_penalty;
        let gap_open = self.config.gap_open;
        let gap_extend = self.config.gap_extend;

        // score matrices: M consumes a node and a symbol, D consumes a node only,
        // I consumes a symbol only; row 0 is the synthetic start
        let mut m_scores = vec![NEG_INF; size];
        let mut d_scores = vec![NEG_INF; size];
        let mut i_scores = vec![NEG_INF; size];
        let mut trace_m = vec![(0u32, MAT_M); size];
        let mut trace_d = vec![(0u32, MAT_M); size];
        let mut trace_i = vec![MAT_M; size];

        m_scores[0] = 0;
        for j in 1..width {
            i_scores[j] = gap_open + (j as i32 - 1) * gap_extend;
            trace_i[j] = if j == 1 { MAT_M } else { MAT_I };
        }

        for (rank_index, &node) in topo.iter().enumerate() {
            let row = rank_index + 1;
            let symbol = graph.node(node).symbol();
            let pred_rows = self.predecessor_rows(node);
            let (lo, hi) = band_window(row, n_rows, cols, band);

            for j in lo..=hi {
                let cell = row * width + j;

                // gap in the sequence: consume this node from a predecessor row
                for &p in pred_rows.iter() {
                    let pred_cell = p * width + j;
                    if m_scores[pred_cell] > NEG_INF {
                        let candidate = m_scores[pred_cell] + gap_open;
                        if candidate > d_scores[cell] {
                            d_scores[cell] = candidate;
                            trace_d[cell] = (p as u32, MAT_M);
                        }
                    }
                    if d_scores[pred_cell] > NEG_INF {
                        let candidate = d_scores[pred_cell] + gap_extend;
                        if candidate > d_scores[cell] {
                            d_scores[cell] = candidate;
                            trace_d[cell] = (p as u32, MAT_D);
                        }
                    }
                }

                if j > 0 {
                    // gap in the graph: consume a symbol within this row
                    let left_cell = cell - 1;
                    if m_scores[left_cell] > NEG_INF {
                        let candidate = m_scores[left_cell] + gap_open;
                        if candidate > i_scores[cell] {
                            i_scores[cell] = candidate;
                            trace_i[cell] = MAT_M;
                        }
                    }
                    if i_scores[left_cell] > NEG_INF {
                        let candidate = i_scores[left_cell] + gap_extend;
                        if candidate > i_scores[cell] {
                            i_scores[cell] = candidate;
                            trace_i[cell] = MAT_I;
                        }
                    }

                    // diagonal: consume this node and a symbol from a predecessor row
                    let substitution = if symbol == sequence[j - 1] {
                        match_score
                    } else {
                        mismatch_penalty
                    };
                    for &p in pred_rows.iter() {
                        let pred_cell = p * width + (j - 1);
                        for (matrix, score) in [
                            (MAT_M, m_scores[pred_cell]),
                            (MAT_D, d_scores[pred_cell]),
                            (MAT_I, i_scores[pred_cell])
                        ] {
                            if score > NEG_INF {
                                let candidate = score + substitution;
                                if candidate > m_scores[cell] {
                                    m_scores[cell] = candidate;
                                    trace_m[cell] = (p as u32, matrix);
                                }
                            }
                        }
                    }
                }
            }
        }

        // the alignment must consume the whole sequence and stop on a node that some
        // observed sequence terminated at
        let mut end_state: Option<(i32, usize, u8)> = None;
        let end_rows: Vec<usize> = graph.node(END_NODE).predecessors()
            .iter()
            .map(|&p| self.dp_row(p))
            .sorted_unstable()
            .collect();
        for &row in end_rows.iter() {
            let cell = row * width + cols;
            for (matrix, score) in [
                (MAT_M, m_scores[cell]),
                (MAT_D, d_scores[cell]),
                (MAT_I, i_scores[cell])
            ] {
                if score > NEG_INF && end_state.map_or(true, |(best, _r, _mat)| score > best) {
                    end_state = Some((score, row, matrix));
                }
            }
        }
        let (score, end_row, end_matrix) = end_state?;

        // traceback from the end corner
        let mut ops = vec![];
        let mut row = end_row;
        let mut j = cols;
        let mut matrix = end_matrix;
        while row > 0 || j > 0 {
            let cell = row * width + j;
            match matrix {
                MAT_M => {
                    let node = topo[row - 1];
                    let seq_pos = j - 1;
                    if graph.node(node).symbol() == sequence[seq_pos] {
                        ops.push(AlignmentOp::Match { node, seq_pos });
                    } else {
                        ops.push(AlignmentOp::Mismatch { node, seq_pos });
                    }
                    let (pred, prev_matrix) = trace_m[cell];
                    row = pred as usize;
                    j -= 1;
                    matrix = prev_matrix;
                }
                MAT_D => {
                    ops.push(AlignmentOp::Deletion { node: topo[row - 1] });
                    let (pred, prev_matrix) = trace_d[cell];
                    row = pred as usize;
                    matrix = prev_matrix;
                }
                _ => {
                    ops.push(AlignmentOp::Insertion { seq_pos: j - 1 });
                    matrix = trace_i[cell];
                    j -= 1;
                }
            }
        }
        ops.reverse();

        trace!("alignment score {} over {} ops", score, ops.len());
        Some(Alignment::new(ops, score))
    }

    /// Maps a node's predecessors to DP rows, keeping only the heaviest `branch_limit`
    /// branches when the limit is set. Rows come back sorted so ties resolve toward the
    /// earliest predecessor.
    fn predecessor_rows(&self, node: usize) -> Vec<usize> {
        let predecessors = self.graph.node(node).predecessors();
        let limit = self.config.branch_limit;
        let rows: Vec<usize> = if limit > 0 && predecessors.len() > limit {
            predecessors.iter()
                .copied()
                .sorted_unstable_by_key(|&p| (Reverse(self.graph.edge_weight(p, node)), self.dp_row(p)))
                .take(limit)
                .map(|p| self.dp_row(p))
                .collect()
        } else {
            predecessors.iter().map(|&p| self.dp_row(p)).collect()
        };
        rows.into_iter().sorted_unstable().collect()
    }

    /// DP row of a node: the synthetic start maps to row 0, real nodes to rank + 1.
    fn dp_row(&self, node: usize) -> usize {
        if node == START_NODE {
            0
        } else {
            self.graph.rank_of(node) + 1
        }
    }
}

/// The admissible column window for one DP row: a band around the corridor between the
/// start-corner diagonal and the end-corner diagonal, clamped to the sequence.
fn band_window(row: usize, n_rows: usize, cols: usize, band: i64) -> (usize, usize) {
    let start_diagonal = row as i64;
    let end_diagonal = row as i64 + cols as i64 - n_rows as i64;
    let lo = start_diagonal.min(end_diagonal).saturating_sub(band).max(0);
    let hi = start_diagonal.max(end_diagonal).saturating_add(band).min(cols as i64);
    (lo as usize, hi as usize)
}
