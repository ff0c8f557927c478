//! Belief-propagation (sum-product) decoder over the current Tanner graph.
//!
//! Messages live on the graph edges and are stored twice: `msg_v` holds the
//! variable-to-check direction, shaped like the check-node adjacency, and
//! `msg_c` holds the check-to-variable direction, shaped like the
//! variable-node adjacency. Each update writes into the *other* side's store
//! by walking per-node cursors, so that slot order always mirrors the
//! consumer's adjacency order.

use crate::bit::Bit;
use crate::sparse_matrix::mulvec;
use crate::MatrixIndex;

/// Why a decode call stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// The hard decision reproduced the given syndrome.
    Converged,
    /// The iteration budget ran out without a syndrome match.
    IterationLimit,
    /// A NaN appeared in the variable-to-check messages.
    Diverged,
}

/// Outcome of a decode call.
///
/// Non-convergence is an ordinary result, not an error: callers routinely
/// retry with a longer syndrome and treat failure as part of the protocol.
#[derive(Debug, Clone, Copy)]
pub struct DecodeResult {
    pub status: DecodeStatus,
    /// Iterations actually performed (at most the configured maximum).
    pub iterations: usize,
}

impl DecodeResult {
    pub fn converged(&self) -> bool {
        self.status == DecodeStatus::Converged
    }
}

/// Edge message stores for one decode call, reshaped from the adjacency.
struct MessageStore {
    /// Variable-to-check messages, one list per check row.
    msg_v: Vec<Vec<f64>>,
    /// Check-to-variable messages, one list per variable column.
    msg_c: Vec<Vec<f64>>,
}

impl MessageStore {
    fn new(
        check_to_var: &[Vec<MatrixIndex>],
        var_to_check: &[Vec<MatrixIndex>],
        llrs: &[f64],
    ) -> Self {
        let msg_v = check_to_var
            .iter()
            .map(|vars| vars.iter().map(|&v| llrs[v as usize]).collect())
            .collect();
        let msg_c = var_to_check
            .iter()
            .map(|checks| vec![0.0; checks.len()])
            .collect();
        Self { msg_v, msg_c }
    }
}

fn saturate(messages: &mut [Vec<f64>], vsat: f64) {
    for row in messages.iter_mut() {
        for value in row.iter_mut() {
            *value = value.clamp(-vsat, vsat);
        }
    }
}

/// Check-node half of one iteration (tanh rule).
///
/// For row `r` with parity `s_r`, the outgoing message on edge `k` is
/// `log((1 + q) / (1 - q))` with `q = P_r / tanh(0.5 * msg_v[r][k])` and
/// `P_r = (1 - 2 s_r) * prod_k tanh(0.5 * msg_v[r][k])`. A divisor of
/// exactly zero falls back to the signed product over the other edges.
fn check_node_update<B: Bit>(
    store: &mut MessageStore,
    check_to_var: &[Vec<MatrixIndex>],
    syndrome: &[B],
) {
    let mut cursor = vec![0usize; store.msg_c.len()];

    for (row, vars) in check_to_var.iter().enumerate() {
        let sign = if syndrome[row].to_bool() { -1.0 } else { 1.0 };
        let degree = vars.len();

        let mut product = sign;
        for k in 0..degree {
            product *= (0.5 * store.msg_v[row][k]).tanh();
        }

        for k in 0..degree {
            let divisor = (0.5 * store.msg_v[row][k]).tanh();
            let q = if divisor == 0.0 {
                let mut partial = sign;
                for other in 0..degree {
                    if other != k {
                        partial *= (0.5 * store.msg_v[row][other]).tanh();
                    }
                }
                partial
            } else {
                product / divisor
            };
            let message = ((1.0 + q) / (1.0 - q)).ln();

            let var = vars[k] as usize;
            store.msg_c[var][cursor[var]] = message;
            cursor[var] += 1;
        }
    }
}

/// Variable-node half of one iteration (extrinsic sums).
fn var_node_update(store: &mut MessageStore, var_to_check: &[Vec<MatrixIndex>], llrs: &[f64]) {
    let mut cursor = vec![0usize; store.msg_v.len()];

    for (var, checks) in var_to_check.iter().enumerate() {
        let total: f64 = llrs[var] + store.msg_c[var].iter().sum::<f64>();
        for k in 0..checks.len() {
            let message = total - store.msg_c[var][k];
            let row = checks[k] as usize;
            store.msg_v[row][cursor[row]] = message;
            cursor[row] += 1;
        }
    }
}

/// Posterior hard decision: bit is one iff the LLR total goes negative.
fn hard_decision<B: Bit>(store: &MessageStore, llrs: &[f64], out: &mut Vec<B>) {
    out.clear();
    out.extend(llrs.iter().enumerate().map(|(var, &llr)| {
        let total: f64 = llr + store.msg_c[var].iter().sum::<f64>();
        B::from_bool(total < 0.0)
    }));
}

/// Run sum-product decoding against the given bipartite adjacency.
///
/// `out` receives the hard decision of the last completed iteration, also
/// when the decoder fails. Inputs are assumed length-checked by the caller.
pub(crate) fn sum_product_decode<B: Bit>(
    check_to_var: &[Vec<MatrixIndex>],
    var_to_check: &[Vec<MatrixIndex>],
    llrs: &[f64],
    syndrome: &[B],
    out: &mut Vec<B>,
    max_iterations: usize,
    vsat: f64,
) -> DecodeResult
where
    B: PartialEq,
{
    let mut store = MessageStore::new(check_to_var, var_to_check, llrs);
    let mut candidate_syndrome: Vec<B> = Vec::with_capacity(syndrome.len());

    out.clear();
    out.resize(llrs.len(), B::from_bool(false));

    for iteration in 0..max_iterations {
        check_node_update(&mut store, check_to_var, syndrome);
        saturate(&mut store.msg_c, vsat);

        var_node_update(&mut store, var_to_check, llrs);
        saturate(&mut store.msg_v, vsat);

        hard_decision(&store, llrs, out);

        // early termination on syndrome match
        mulvec(check_to_var, out, &mut candidate_syndrome);
        if candidate_syndrome == syndrome {
            return DecodeResult {
                status: DecodeStatus::Converged,
                iterations: iteration + 1,
            };
        }

        for row in &store.msg_v {
            if row.iter().any(|value| value.is_nan()) {
                tracing::debug!(iteration, "decoder diverged (NaN message)");
                return DecodeResult {
                    status: DecodeStatus::Diverged,
                    iterations: iteration + 1,
                };
            }
        }
    }

    DecodeResult {
        status: DecodeStatus::IterationLimit,
        iterations: max_iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_graph() -> (Vec<Vec<MatrixIndex>>, Vec<Vec<MatrixIndex>>) {
        let check_to_var = vec![vec![0, 2, 4, 6], vec![1, 2, 5, 6], vec![3, 4, 5, 6]];
        let var_to_check = crate::rate_adaption::transpose(&check_to_var, 7);
        (check_to_var, var_to_check)
    }

    fn bsc_llrs(received: &[u8], p: f64) -> Vec<f64> {
        let vlog = ((1.0 - p) / p).ln();
        received
            .iter()
            .map(|&bit| vlog * (1.0 - 2.0 * f64::from(bit)))
            .collect()
    }

    #[test]
    fn test_noiseless_word_converges_immediately() {
        let (check_to_var, var_to_check) = small_graph();
        let x = [1u8, 1, 1, 1, 0, 0, 0];
        let mut syndrome = Vec::new();
        mulvec(&check_to_var, &x, &mut syndrome);

        let llrs = bsc_llrs(&x, 0.05);
        let mut decoded = Vec::new();
        let result =
            sum_product_decode(&check_to_var, &var_to_check, &llrs, &syndrome, &mut decoded, 50, 100.0);

        assert!(result.converged());
        assert_eq!(result.iterations, 1);
        assert_eq!(decoded, x.to_vec());
    }

    #[test]
    fn test_single_flip_corrected() {
        let (check_to_var, var_to_check) = small_graph();
        let x = [1u8, 1, 1, 1, 0, 0, 0];
        let mut syndrome = Vec::new();
        mulvec(&check_to_var, &x, &mut syndrome);

        let noised = [1u8, 1, 1, 1, 0, 0, 1];
        let llrs = bsc_llrs(&noised, 1.0 / 7.0);
        let mut decoded = Vec::new();
        let result =
            sum_product_decode(&check_to_var, &var_to_check, &llrs, &syndrome, &mut decoded, 50, 100.0);

        assert!(result.converged());
        assert_eq!(decoded, x.to_vec());
    }

    #[test]
    fn test_iteration_limit_reported() {
        // a degree-zero check (as produced by a fully eliminating row pair)
        // always encodes to zero, so parity one for it is unsatisfiable
        let check_to_var = vec![vec![0, 2, 4, 6], vec![1, 2, 5, 6], vec![3, 4, 5, 6], vec![]];
        let var_to_check = crate::rate_adaption::transpose(&check_to_var, 7);
        let syndrome = [0u8, 0, 0, 1];
        let llrs = vec![20.0; 7];
        let mut decoded = Vec::new();
        let result =
            sum_product_decode(&check_to_var, &var_to_check, &llrs, &syndrome, &mut decoded, 5, 100.0);

        assert_eq!(result.status, DecodeStatus::IterationLimit);
        assert_eq!(result.iterations, 5);
        assert_eq!(decoded.len(), 7);
    }

    #[test]
    fn test_infinite_llrs_do_not_poison_output() {
        let (check_to_var, var_to_check) = small_graph();
        let llrs = vec![
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
        ];
        let syndrome = [0u8, 1, 0];
        let mut decoded = Vec::new();
        let result =
            sum_product_decode(&check_to_var, &var_to_check, &llrs, &syndrome, &mut decoded, 10, 100.0);

        assert_eq!(decoded.len(), 7);
        assert!(decoded.iter().all(|&b| b == 0 || b == 1));
        if result.converged() {
            let mut check = Vec::new();
            mulvec(&check_to_var, &decoded, &mut check);
            assert_eq!(check, syndrome.to_vec());
        }
    }

    #[test]
    fn test_zero_llr_takes_fallback_branch() {
        let (check_to_var, var_to_check) = small_graph();
        let x = [1u8, 1, 1, 1, 0, 0, 0];
        let mut syndrome = Vec::new();
        mulvec(&check_to_var, &x, &mut syndrome);

        // an erased position (LLR exactly zero) exercises the zero-divisor
        // fallback in the check-node update
        let mut llrs = bsc_llrs(&x, 0.05);
        llrs[6] = 0.0;
        let mut decoded = Vec::new();
        let result =
            sum_product_decode(&check_to_var, &var_to_check, &llrs, &syndrome, &mut decoded, 50, 100.0);

        assert!(result.converged());
        assert_eq!(decoded, x.to_vec());
    }
}
