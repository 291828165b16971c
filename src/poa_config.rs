
/*!
Contains configuration information for the banded POA consensus algorithm.
Typical usage is to the use the builder to construct the config, e.g.
```
use braid_con::poa_config::{PoaConfig, PoaConfigBuilder};
let config: PoaConfig = PoaConfigBuilder::default()
    .band_width(30)
    .branch_limit(14)
    .build()
    .unwrap();
```
*/

use crate::errors::ConsensusError;

/**
Contains configuration information for the banded POA consensus algorithm.
Typical usage is to the use the builder to construct the config, e.g.
```
use braid_con::poa_config::{PoaConfig, PoaConfigBuilder};
let config: PoaConfig = PoaConfigBuilder::default()
    .band_width(30)
    .branch_limit(14)
    .build()
    .unwrap();
```
*/
#[derive(derive_builder::Builder, Clone, Debug)]
#[builder(default)]
pub struct PoaConfig {
    /// Maximum distance from the corner-to-corner diagonal corridor that a DP cell may occupy.
    /// Cells outside the band are treated as unreachable.
    pub band_width: usize,
    /// Maximum number of predecessor branches scored per DP column, heaviest edges first.
    /// A value of 0 disables the limit.
    pub branch_limit: usize,
    /// Score for aligning a sequence symbol to a graph node with the same symbol
    pub match_score: i32,
    /// Penalty for aligning a sequence symbol to a graph node with a different symbol
    pub mismatch_penalty: i32,
    /// Penalty for opening a gap in either the sequence or the graph
    pub gap_open: i32,
    /// Penalty for extending an open gap by one symbol
    pub gap_extend: i32
}

impl Default for PoaConfig {
    fn default() -> Self {
        Self {
            // low-noise reads rarely drift more than a handful of diagonals
            band_width: 64,
            // in-degrees stay small for near-identical inputs, so this is effectively exact
            branch_limit: 16,
            // scoring constants where exact matches dominate any edit
            match_score: 2,
            mismatch_penalty: -4,
            gap_open: -4,
            gap_extend: -2
        }
    }
}

impl PoaConfig {
    /// Checks the scoring scheme for internal consistency.
    /// # Errors
    /// * if the match score is not positive
    /// * if any penalty is not negative, or gap-extend is harsher than gap-open
    pub fn validate(&self) -> Result<(), ConsensusError> {
        if self.match_score <= 0 {
            return Err(ConsensusError::InvalidParameter("match score must be positive"));
        }
        if self.mismatch_penalty >= 0 {
            return Err(ConsensusError::InvalidParameter("mismatch penalty must be negative"));
        }
        if self.gap_open >= 0 {
            return Err(ConsensusError::InvalidParameter("gap-open penalty must be negative"));
        }
        if self.gap_extend >= 0 {
            return Err(ConsensusError::InvalidParameter("gap-extend penalty must be negative"));
        }
        if self.gap_extend < self.gap_open {
            return Err(ConsensusError::InvalidParameter("gap-extend penalty must not be harsher than gap-open"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PoaConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn test_builder_overrides() {
        let config: PoaConfig = PoaConfigBuilder::default()
            .band_width(30)
            .branch_limit(14)
            .build()
            .unwrap();
        assert_eq!(config.band_width, 30);
        assert_eq!(config.branch_limit, 14);
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_scoring() {
        let config: PoaConfig = PoaConfigBuilder::default()
            .match_score(0)
            .build()
            .unwrap();
        assert_eq!(config.validate(), Err(ConsensusError::InvalidParameter("match score must be positive")));

        let config: PoaConfig = PoaConfigBuilder::default()
            .gap_open(-2)
            .gap_extend(-4)
            .build()
            .unwrap();
        assert_eq!(
            config.validate(),
            Err(ConsensusError::InvalidParameter("gap-extend penalty must not be harsher than gap-open"))
        );
    }
}
