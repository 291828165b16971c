
/*!
This module provides access to the ConsensusPoa, which generates the single best consensus for a set of weighted sequences.

# Example usage
```rust
use braid_con::consensus::ConsensusPoa;

let sequences = [
    (b"ACCGT".to_vec(), 2), // this should be the consensus
    (b"ACGT".to_vec(), 1)
];

// add all the sequences with their weights
let mut poa: ConsensusPoa = Default::default();
for (s, w) in sequences.iter() {
    poa.add_sequence(s, *w).unwrap();
}

// run consensus and check the results
let consensus = poa.consensus().unwrap();
assert_eq!(consensus.sequence(), b"ACCGT");
assert_eq!(consensus.scores(), &[0, 1]);
```
*/

use log::debug;

use crate::banded_aligner::BandedAligner;
use crate::errors::ConsensusError;
use crate::poa_config::PoaConfig;
use crate::poa_graph::PoaGraph;
use crate::sequence_alignment::wfa_ed;

/// The symbol alphabet accepted by the consensus engine
pub const NUCLEOTIDES: &[u8; 4] = b"ACGT";

/// Contains a final consensus result
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Consensus {
    /// The generated consensus
    sequence: Vec<u8>,
    /// Total edge weight along the winning graph path
    path_weight: u64,
    /// Vector of the edit distances from the consensus to each input sequence
    scores: Vec<usize>
}

impl Consensus {
    /// Constructor
    pub fn new(sequence: Vec<u8>, path_weight: u64, scores: Vec<usize>) -> Consensus {
        Consensus {
            sequence,
            path_weight,
            scores
        }
    }

    // Getters
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn path_weight(&self) -> u64 {
        self.path_weight
    }

    pub fn scores(&self) -> &[usize] {
        &self.scores
    }
}

/// Core utility that will generate a consensus sequence from weighted observations.
/// The first sequence seeds a partial-order alignment graph, every later sequence is
/// aligned against the graph with a banded DP and merged in input order, and the
/// consensus is the heaviest start-to-end path through the final graph.
#[derive(Debug, Default)]
pub struct ConsensusPoa<'a> {
    /// Contains all the sequences that have been added to this consensus so far.
    sequences: Vec<&'a [u8]>,
    /// Observation weight for each sequence, parallel to `sequences`.
    weights: Vec<u64>,
    /// The config for this consensus run
    config: PoaConfig
}

impl<'a> ConsensusPoa<'a> {
    /// Creates a new instance of ConsensusPoa and performs sanity checks.
    /// # Arguments
    /// * `config` - the banding, branching, and scoring parameters
    /// # Errors
    /// * if the scoring scheme is inconsistent
    pub fn with_config(config: PoaConfig) -> Result<ConsensusPoa<'a>, ConsensusError> {
        config.validate()?;
        Ok(ConsensusPoa {
            sequences: vec![],
            weights: vec![],
            config
        })
    }

    /// Adds a new weighted sequence to the list.
    /// A rejected sequence is not stored, so the engine state is unchanged on error.
    /// # Arguments
    /// * `sequence` - the new sequence to add
    /// * `weight` - the observation weight, must be >= 1
    /// # Errors
    /// * if the sequence is empty, contains a non-nucleotide symbol, or has zero weight
    pub fn add_sequence(&mut self, sequence: &'a [u8], weight: u64) -> Result<(), ConsensusError> {
        let index = self.sequences.len();
        if sequence.is_empty() {
            return Err(ConsensusError::EmptySequence { index });
        }
        if let Some(&symbol) = sequence.iter().find(|&&s| !NUCLEOTIDES.contains(&s)) {
            return Err(ConsensusError::InvalidSymbol { index, symbol });
        }
        if weight == 0 {
            return Err(ConsensusError::ZeroWeight { index });
        }

        self.sequences.push(sequence);
        self.weights.push(weight);
        Ok(())
    }

    /// The core function that gets called after adding all the sequences we care about.
    /// All failure classes are checked up front, so no partial graph state survives an error.
    /// # Errors
    /// * if no sequences were added
    /// * if the config fails validation
    /// * if the cumulative weights could overflow during merging
    pub fn consensus(&self) -> Result<Consensus, ConsensusError> {
        self.config.validate()?;
        if self.sequences.is_empty() {
            return Err(ConsensusError::EmptyInput);
        }
        self.check_weight_capacity()?;

        if self.sequences.len() == 1 {
            // nothing to align, the lone sequence is its own consensus
            let sequence = self.sequences[0].to_vec();
            let path_weight = self.weights[0] * (sequence.len() as u64 + 1);
            return Ok(Consensus::new(sequence, path_weight, vec![0]));
        }

        let mut graph = PoaGraph::seeded(self.sequences[0], self.weights[0]);
        debug!("seeded graph from sequence 0: {} nodes", graph.num_nodes());

        for (index, (&sequence, &weight)) in self.sequences.iter().zip(self.weights.iter()).enumerate().skip(1) {
            let alignment = BandedAligner::new(&graph, &self.config).align(sequence);
            debug!("aligned sequence {} with score {}", index, alignment.score());
            graph.integrate_alignment(sequence, weight, &alignment);
        }
        debug!("final graph: {} nodes, {} edges", graph.num_nodes(), graph.num_edges());

        let (sequence, path_weight) = graph.heaviest_path();
        let scores = self.sequences.iter().map(|&s| wfa_ed(&sequence, s)).collect();
        Ok(Consensus::new(sequence, path_weight, scores))
    }

    /// Upper-bounds every weight the merge or the path search can produce and verifies
    /// it fits the weight type, so later arithmetic cannot wrap.
    fn check_weight_capacity(&self) -> Result<(), ConsensusError> {
        let total_weight = self.weights.iter()
            .try_fold(0u64, |acc, &w| acc.checked_add(w))
            .ok_or(ConsensusError::WeightOverflow)?;
        let total_len: u64 = self.sequences.iter().map(|s| s.len() as u64).sum();

        // any node, edge, or path weight is bounded by total_weight * (total_len + 1)
        total_weight.checked_mul(total_len + 1)
            .map(|_| ())
            .ok_or(ConsensusError::WeightOverflow)
    }

    // getters
    pub fn sequences(&self) -> &[&'a [u8]] {
        &self.sequences
    }

    pub fn weights(&self) -> &[u64] {
        &self.weights
    }

    pub fn config(&self) -> &PoaConfig {
        &self.config
    }
}

/// Single-call entry point: computes the consensus of weighted sequences with the given
/// band width and branch limit, using default scoring.
/// # Arguments
/// * `sequences` - the weighted sequences, in merge order
/// * `band_width` - the DP band parameter; very large values make banding a no-op
/// * `branch_limit` - the per-column branch bound; 0 disables the limit
/// # Errors
/// * if validation of the sequences or parameters fails
/// # Examples
/// ```rust
/// use braid_con::consensus::compute_consensus;
///
/// let consensus = compute_consensus(&[(b"ACCGT", 2), (b"ACGT", 1)], 30, 14).unwrap();
/// assert_eq!(&consensus, b"ACCGT");
/// ```
pub fn compute_consensus(
    sequences: &[(&[u8], u64)],
    band_width: usize,
    branch_limit: usize
) -> Result<Vec<u8>, ConsensusError> {
    let config = PoaConfig {
        band_width,
        branch_limit,
        ..Default::default()
    };

    let mut poa = ConsensusPoa::with_config(config)?;
    for &(sequence, weight) in sequences.iter() {
        poa.add_sequence(sequence, weight)?;
    }
    Ok(poa.consensus()?.sequence().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    use itertools::Itertools;
    use std::path::PathBuf;

    use crate::poa_config::PoaConfigBuilder;

    #[derive(Debug, serde::Deserialize)]
    struct PanelRecord {
        role: String,
        weight: u64,
        sequence: String
    }

    /// Loads a read panel from a csv file: `read` rows carry the weighted inputs and the
    /// single `consensus` row carries the expected output.
    fn load_panel_csv(filename: &std::path::Path) -> (Vec<(Vec<u8>, u64)>, Vec<u8>) {
        let mut reads = vec![];
        let mut expected = vec![];
        let mut csv_reader = csv::ReaderBuilder::new()
            .from_path(filename)
            .unwrap();
        for row in csv_reader.deserialize() {
            let record: PanelRecord = row.unwrap();
            match record.role.as_str() {
                "read" => reads.push((record.sequence.into_bytes(), record.weight)),
                "consensus" => expected = record.sequence.into_bytes(),
                other => panic!("unknown row role: {other}")
            }
        }
        assert!(!expected.is_empty());
        (reads, expected)
    }

    fn as_weighted(reads: &[(Vec<u8>, u64)]) -> Vec<(&[u8], u64)> {
        reads.iter().map(|(s, w)| (s.as_slice(), *w)).collect()
    }

    #[test]
    fn test_single_sequence() {
        let sequence = b"ACGTACGTACGT";
        let mut poa = ConsensusPoa::default();
        poa.add_sequence(sequence, 7).unwrap();

        let consensus = poa.consensus().unwrap();
        assert_eq!(consensus.sequence(), sequence);
        assert_eq!(consensus.scores(), &[0]);
        assert_eq!(consensus.path_weight(), 7 * (sequence.len() as u64 + 1));

        // the band plays no role for a single sequence
        assert_eq!(compute_consensus(&[(sequence, 3)], 0, 0).unwrap(), sequence.to_vec());
    }

    #[test]
    fn test_empty_input() {
        let poa = ConsensusPoa::default();
        assert_eq!(poa.consensus(), Err(ConsensusError::EmptyInput));
    }

    #[test]
    fn test_rejects_bad_sequences() {
        let mut poa = ConsensusPoa::default();
        assert_eq!(
            poa.add_sequence(b"", 1),
            Err(ConsensusError::EmptySequence { index: 0 })
        );
        assert_eq!(
            poa.add_sequence(b"ACGNACGT", 1),
            Err(ConsensusError::InvalidSymbol { index: 0, symbol: b'N' })
        );
        assert_eq!(
            poa.add_sequence(b"ACGT", 0),
            Err(ConsensusError::ZeroWeight { index: 0 })
        );

        // nothing was stored by the rejected calls
        assert!(poa.sequences().is_empty());
    }

    #[test]
    fn test_rejects_bad_scoring() {
        let config = PoaConfigBuilder::default()
            .mismatch_penalty(1)
            .build()
            .unwrap();
        assert_eq!(
            ConsensusPoa::with_config(config).err(),
            Some(ConsensusError::InvalidParameter("mismatch penalty must be negative"))
        );
    }

    #[test]
    fn test_rejects_weight_overflow() {
        let mut poa = ConsensusPoa::default();
        poa.add_sequence(b"ACGT", u64::MAX).unwrap();
        poa.add_sequence(b"ACGT", 1).unwrap();
        assert_eq!(poa.consensus(), Err(ConsensusError::WeightOverflow));

        // a single enormous weight also trips the capacity bound before any merge
        let mut poa = ConsensusPoa::default();
        poa.add_sequence(b"ACGT", u64::MAX).unwrap();
        assert_eq!(poa.consensus(), Err(ConsensusError::WeightOverflow));
    }

    #[test]
    fn test_weight_dominance() {
        // the symbol with more supporting weight at the divergent column wins
        let heavy_g = compute_consensus(&[(b"AAGAA", 2), (b"AATAA", 1)], 30, 14).unwrap();
        assert_eq!(&heavy_g, b"AAGAA");

        let heavy_t = compute_consensus(&[(b"AAGAA", 1), (b"AATAA", 2)], 30, 14).unwrap();
        assert_eq!(&heavy_t, b"AATAA");
    }

    #[test]
    fn test_order_insensitivity() {
        // equal weights, one dominant path: merge order must not matter
        let sequences = [b"ACGTACGT".as_slice(), b"ACGTACGT".as_slice(), b"ACGAACGT".as_slice()];
        for permutation in sequences.iter().permutations(sequences.len()) {
            let weighted: Vec<(&[u8], u64)> = permutation.into_iter().map(|&s| (s, 1)).collect();
            let consensus = compute_consensus(&weighted, 30, 14).unwrap();
            assert_eq!(&consensus, b"ACGTACGT");
        }
    }

    #[test]
    fn test_indel_majority() {
        let sequences: Vec<(&[u8], u64)> = vec![
            (b"ACGTACGTACGT".as_slice(), 1),
            (b"ACGTACCGTACGT".as_slice(), 1), // C insertion, supported twice
            (b"ACGTACCGTACGT".as_slice(), 1),
            (b"ACGTCGTACGT".as_slice(), 1) // A deletion
        ];
        let consensus = compute_consensus(&sequences, 30, 14).unwrap();
        assert_eq!(&consensus, b"ACGTACCGTACGT");
    }

    #[test]
    fn test_band_zero_identical_reads() {
        let weighted: Vec<(&[u8], u64)> = vec![(b"ACGTACGTACGT".as_slice(), 1); 3];
        let consensus = compute_consensus(&weighted, 0, 0).unwrap();
        assert_eq!(&consensus, b"ACGTACGTACGT");
    }

    #[test_log::test]
    fn test_eight_read_panel() {
        let (reads, expected) = load_panel_csv(&PathBuf::from("./tests/panel_eight_reads.csv"));
        let weighted = as_weighted(&reads);

        let banded = compute_consensus(&weighted, 30, 14).unwrap();
        assert_eq!(banded, expected);

        // a practically unbounded band must reproduce the banded result exactly
        let exhaustive = compute_consensus(&weighted, 1_000_000_000, 14).unwrap();
        assert_eq!(banded, exhaustive);
    }

    #[test]
    fn test_eight_read_panel_scores() {
        let (reads, expected) = load_panel_csv(&PathBuf::from("./tests/panel_eight_reads.csv"));

        let config = PoaConfigBuilder::default()
            .band_width(30)
            .branch_limit(14)
            .build()
            .unwrap();
        let mut poa = ConsensusPoa::with_config(config).unwrap();
        for (sequence, weight) in reads.iter() {
            poa.add_sequence(sequence, *weight).unwrap();
        }

        let consensus = poa.consensus().unwrap();
        assert_eq!(consensus.sequence(), expected.as_slice());
        // the weight-5 read is the consensus itself
        assert_eq!(consensus.scores()[3], 0);
        assert!(consensus.path_weight() > 0);
    }

    #[test]
    fn test_determinism() {
        let (reads, _expected) = load_panel_csv(&PathBuf::from("./tests/panel_eight_reads.csv"));
        let weighted = as_weighted(&reads);

        let first = compute_consensus(&weighted, 30, 14).unwrap();
        let second = compute_consensus(&weighted, 30, 14).unwrap();
        assert_eq!(first, second);
    }

    #[test_log::test]
    fn test_generated_band_equivalence() {
        let (_truth, dataset) = crate::example_gen::generate_weighted_test(200, 8, 0.01, 3);
        let weighted = as_weighted(&dataset);

        let banded = compute_consensus(&weighted, 30, 14).unwrap();
        let exhaustive = compute_consensus(&weighted, 1_000_000_000, 14).unwrap();
        assert_eq!(banded, exhaustive);
    }
}
