
/*!
# braid_con
This library builds a single consensus sequence from a set of weighted, noisy reads of the same region using banded partial-order alignment.

Key benefits:
* Weighted inputs: each read carries an observation count that drives the consensus
* Banded dynamic programming keeps the alignment cost proportional to the band, and a practically unbounded band reproduces the exhaustive result
* Deterministic: fixed input order and parameters give byte-identical output

Performance notes:
* Compute scales with read length times band width per merged read
* Merges happen strictly in input order, so the engine is single-threaded by design

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

/// Banded dynamic-programming alignment of a sequence against the graph
pub mod banded_aligner;
/// Main functionality for the consensus component
pub mod consensus;
/// Error taxonomy for the consensus engine
pub mod errors;
/// Utility for generating examples
pub mod example_gen;
/// Configuration for the banded POA consensus algorithm
pub mod poa_config;
/// The partial-order alignment graph, merge logic, and consensus extraction
pub mod poa_graph;
/// Basic pair-wise alignment utilities
pub mod sequence_alignment;
