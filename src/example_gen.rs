
use rand::distributions::Uniform;
use rand::{Rng, SeedableRng};

use crate::consensus::NUCLEOTIDES;

/// Creates a weighted test set we can verify is working
/// # Arguments
/// * `seq_len` - the length of the underlying consensus sequence
/// * `num_samples` - the number of noisy samples to generate from the consensus
/// * `error_rate` - overall error rate, assumes mismatch, insertion, and deletion are equally likely sub-components of this error rate
/// * `max_weight` - sample weights are drawn uniformly from 1..=max_weight
pub fn generate_weighted_test(seq_len: usize, num_samples: usize, error_rate: f64, max_weight: u64) -> (Vec<u8>, Vec<(Vec<u8>, u64)>) {
    assert!((0.0..=1.0).contains(&error_rate));
    assert!(max_weight >= 1);

    let alphabet_size = NUCLEOTIDES.len() as u8;
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let base_distribution = Uniform::new(0, alphabet_size);
    let basem1_distribution = Uniform::new(0, alphabet_size - 1);
    let error_distribution = Uniform::new(0.0, 1.0);
    let error_type_distribution = Uniform::new(0, 3);
    let weight_distribution = Uniform::new_inclusive(1, max_weight);

    let consensus_indices: Vec<u8> = (0..seq_len)
        .map(|_i| rng.sample(base_distribution))
        .collect();

    let samples: Vec<(Vec<u8>, u64)> = (0..num_samples)
        .map(|_i| {
            let mut seq = vec![];
            let mut con_index = 0;
            while con_index < consensus_indices.len() {
                let c = consensus_indices[con_index];
                let is_error = rng.sample(error_distribution) < error_rate;
                if is_error {
                    let error_type = rng.sample(error_type_distribution);
                    match error_type {
                        0 => {
                            // substition
                            let sub_offset = rng.sample(basem1_distribution);
                            let alt_c = (c + 1 + sub_offset) % alphabet_size;
                            seq.push(NUCLEOTIDES[alt_c as usize]);
                            con_index += 1;
                        },
                        1 => {
                            // deletion
                            con_index += 1;
                        },
                        2 => {
                            //insertion
                            let s = rng.sample(base_distribution);
                            seq.push(NUCLEOTIDES[s as usize]);
                        },
                        _ => panic!("no impl")
                    }
                } else {
                    seq.push(NUCLEOTIDES[c as usize]);
                    con_index += 1;
                }
            }
            (seq, rng.sample(weight_distribution))
        })
        .collect();

    let consensus: Vec<u8> = consensus_indices.iter()
        .map(|&c| NUCLEOTIDES[c as usize])
        .collect();

    (consensus, samples)
}
