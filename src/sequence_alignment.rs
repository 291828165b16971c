
use std::cmp::max;

/// Returns the full end-to-end edit distance between two symbol slices by using a version of WFA.
/// # Arguments
/// * `v1` - the first slice
/// * `v2` - the second slice
/// # Examples
/// ```rust
/// use braid_con::sequence_alignment::wfa_ed;
/// assert_eq!(wfa_ed(b"ACGTACGT", b"ACGTACGT"), 0);
/// assert_eq!(wfa_ed(b"ACGTACGT", b"ACGAACGT"), 1);
/// assert_eq!(wfa_ed(b"ACGTACGT", b"ACTACG"), 2);
/// ```
pub fn wfa_ed(v1: &[u8], v2: &[u8]) -> usize {
    //we need the lengths to know where we are in the slices
    let l1 = v1.len();
    let l2 = v2.len();

    //stores the next indices that should be compared
    let mut curr_wf: Vec<(usize, usize)> = vec![(0, 0)];
    let mut next_wf: Vec<(usize, usize)> = vec![(0, 0); 3];
    let mut edits = 0;

    //main idea is to iterate until we're at the end of BOTH slices, this is guaranteed because i and j monotonically increase
    loop {
        //during each iteration, we go over all wavefronts; at iteration e, there are 2*e+1 current wavefronts that will generate 2*(e+1)+1 wavefronts
        //"e" in this context corresponds to the edit distance "edits"
        for (wf_index, &wf) in curr_wf.iter().enumerate() {
            let mut i = wf.0;
            let mut j = wf.1;

            // as long as the symbols match, keep moving along the diagonal
            while i < l1 && j < l2 && v1[i] == v2[j] {
                i += 1;
                j += 1;
            }

            if i == l1 && j == l2 {
                //we found the end, return the number of edits required to get here
                return edits;
            } else if i == l1 {
                //push the wavefront, but i cannot increase
                next_wf[wf_index] = max(next_wf[wf_index], (i, j));
                next_wf[wf_index + 1] = max(next_wf[wf_index + 1], (i, j + 1));
                next_wf[wf_index + 2] = max(next_wf[wf_index + 2], (i, j + 1));
            } else if j == l2 {
                //push the wavefront, but j cannot increase
                next_wf[wf_index] = max(next_wf[wf_index], (i + 1, j));
                next_wf[wf_index + 1] = max(next_wf[wf_index + 1], (i + 1, j));
                next_wf[wf_index + 2] = max(next_wf[wf_index + 2], (i, j));
            } else {
                //v1 and v2 do not match at i, j; add mismatch, insert, and del to the next wavefront
                next_wf[wf_index] = max(next_wf[wf_index], (i + 1, j)); //v2 has a deletion relative to v1
                next_wf[wf_index + 1] = max(next_wf[wf_index + 1], (i + 1, j + 1)); //v2 has a mismatch relative to v1
                next_wf[wf_index + 2] = max(next_wf[wf_index + 2], (i, j + 1)); //v2 has an insertion relative to v1
            }
        }

        //we finished this wave, increment the edit count and generate the buffer for the next wavefront
        edits += 1;
        curr_wf = next_wf;
        next_wf = vec![(0, 0); 3 + 2 * edits];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical() {
        assert_eq!(wfa_ed(b"ACGTACGTACGT", b"ACGTACGTACGT"), 0);
        assert_eq!(wfa_ed(b"", b""), 0);
    }

    #[test]
    fn test_single_edits() {
        let sequence = b"ACGTACGTACGT";
        assert_eq!(wfa_ed(sequence, b"ACGTACCTACGT"), 1); // mismatch
        assert_eq!(wfa_ed(sequence, b"ACGTACCGTACGT"), 1); // insertion
        assert_eq!(wfa_ed(sequence, b"ACGTACTACGT"), 1); // deletion
    }

    #[test]
    fn test_compound_edits() {
        //second slice has 2 separate deletions, 1 2bp insertion, and 1 mismatch
        let v1 = b"AACGGATCAAGCTTACCAGTATTTACGT";
        let v2 = b"AACGGACAAAAGCTTACCTGTATTACGT";
        assert_eq!(wfa_ed(v1, v2), 5);
    }

    #[test]
    fn test_length_asymmetry() {
        // one big deletion in the middle
        assert_eq!(wfa_ed(b"ATTTTTTTTTTAAAAAAAAAA", b"AAAAAAAAAAA"), 10);
        // everything is an insertion relative to the empty slice
        assert_eq!(wfa_ed(b"", b"ACGT"), 4);
    }
}
