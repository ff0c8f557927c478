//! Built-in example codes for demos, tests and simulation fallbacks.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{ColPtr, MatrixIndex};

/// Column pointers of the 3x7 hand matrix
/// `H = [1 0 1 0 1 0 1; 0 1 1 0 0 1 1; 0 0 0 1 1 1 1]`.
pub const HAND_3X7_COLPTR: [ColPtr; 8] = [0, 1, 2, 4, 5, 7, 9, 12];

/// Row indices of the 3x7 hand matrix.
pub const HAND_3X7_ROWVAL: [MatrixIndex; 12] = [0, 1, 0, 1, 2, 0, 2, 1, 2, 0, 1, 2];

/// A single-pair rate-adaption schedule for the 3x7 hand matrix.
pub const HAND_3X7_RATE_ADAPTION: [MatrixIndex; 2] = [0, 1];

/// Column pointers of a degenerate 5x10 matrix whose left half is the
/// identity; useful for exercising accessors without any decoding.
pub const DIAGONAL_5X10_COLPTR: [ColPtr; 11] = [0, 1, 2, 3, 4, 5, 5, 5, 5, 5, 5];

/// Row indices of the degenerate 5x10 matrix.
pub const DIAGONAL_5X10_ROWVAL: [MatrixIndex; 5] = [0, 1, 2, 3, 4];

/// A two-pair rate-adaption schedule for the 5x10 matrix.
pub const DIAGONAL_5X10_RATE_ADAPTION: [MatrixIndex; 4] = [0, 1, 3, 4];

/// Build a random column-regular CSC pair with `col_degree` ones per column.
///
/// Row positions are drawn from an evenly balanced pool so that every row
/// receives close to `n_cols * col_degree / n_rows` entries, then shuffled
/// by a `ChaCha8Rng` seeded from `seed`. The same seed always produces the
/// same matrix. No girth conditioning is attempted, so small matrices can
/// contain short cycles.
///
/// # Panics
///
/// Panics if `col_degree` is zero or exceeds `n_rows`, or if `n_rows`
/// exceeds `n_cols`.
pub fn random_regular_code(
    n_rows: usize,
    n_cols: usize,
    col_degree: usize,
    seed: u64,
) -> (Vec<ColPtr>, Vec<MatrixIndex>) {
    assert!(col_degree >= 1 && col_degree <= n_rows, "column degree must be in [1, n_rows]");
    assert!(n_rows <= n_cols, "parity-check matrices need at least as many columns as rows");

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let total = n_cols * col_degree;

    // balanced pool: each row index appears ceil(total / n_rows) times at most
    let mut pool: Vec<MatrixIndex> = (0..total).map(|k| (k % n_rows) as MatrixIndex).collect();
    pool.shuffle(&mut rng);

    let mut colptr: Vec<ColPtr> = Vec::with_capacity(n_cols + 1);
    let mut rowval: Vec<MatrixIndex> = Vec::with_capacity(total);
    colptr.push(0);

    let mut consumed = 0usize;
    for _ in 0..n_cols {
        let mut rows_in_col: Vec<MatrixIndex> = Vec::with_capacity(col_degree);
        for _ in 0..col_degree {
            // check whether the remaining pool still offers a row unused in
            // this column
            let mut probe = consumed;
            while probe < total && rows_in_col.contains(&pool[probe]) {
                probe += 1;
            }
            if probe == total {
                // pool exhausted for this column; fall back to a fresh draw
                loop {
                    let row = rng.gen_range(0..n_rows) as MatrixIndex;
                    if !rows_in_col.contains(&row) {
                        rows_in_col.push(row);
                        break;
                    }
                }
            } else {
                loop {
                    let pick = consumed + rng.gen_range(0..total - consumed);
                    if !rows_in_col.contains(&pool[pick]) {
                        pool.swap(pick, consumed);
                        rows_in_col.push(pool[consumed]);
                        consumed += 1;
                        break;
                    }
                }
            }
        }
        rows_in_col.sort_unstable();
        rowval.extend_from_slice(&rows_in_col);
        colptr.push(rowval.len() as ColPtr);
    }

    (colptr, rowval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse_matrix::Mod2Csc;

    #[test]
    fn test_hand_matrix_constants_are_valid() {
        let h = Mod2Csc::new(HAND_3X7_COLPTR.to_vec(), HAND_3X7_ROWVAL.to_vec()).unwrap();
        assert_eq!(h.n_rows(), 3);
        assert_eq!(h.n_cols(), 7);
    }

    #[test]
    fn test_diagonal_matrix_constants_are_valid() {
        let h = Mod2Csc::new(DIAGONAL_5X10_COLPTR.to_vec(), DIAGONAL_5X10_ROWVAL.to_vec()).unwrap();
        assert_eq!(h.n_rows(), 5);
        assert_eq!(h.n_cols(), 10);
        assert_eq!(h.num_nonzero(), 5);
    }

    #[test]
    fn test_random_regular_code_shape() {
        let (colptr, rowval) = random_regular_code(64, 192, 3, 7);
        let h = Mod2Csc::new(colptr, rowval).unwrap();
        assert_eq!(h.n_rows(), 64);
        assert_eq!(h.n_cols(), 192);
        assert_eq!(h.num_nonzero(), 192 * 3);

        // every column has exactly three distinct rows
        for col in 0..192 {
            let start = h.colptr()[col] as usize;
            let end = h.colptr()[col + 1] as usize;
            assert_eq!(end - start, 3);
            let rows = &h.rowval()[start..end];
            assert!(rows.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_random_regular_code_is_deterministic() {
        let a = random_regular_code(32, 96, 3, 1234);
        let b = random_regular_code(32, 96, 3, 1234);
        assert_eq!(a, b);
        let c = random_regular_code(32, 96, 3, 1235);
        assert_ne!(a, c);
    }
}
