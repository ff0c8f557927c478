//! Public façade combining the mother matrix, rate adaption and decoding.

use crate::bit::Bit;
use crate::decoder::{sum_product_decode, DecodeResult};
use crate::rate_adaption::{combine_rows, transpose, RateAdaptionSchedule, ScheduleError};
use crate::sparse_matrix::{mulvec, CscError, Mod2Csc};
use crate::{LdpcError, MatrixIndex};

/// Default iteration budget for belief propagation.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Default saturation bound for decoder messages.
pub const DEFAULT_VSAT: f64 = 100.0;

/// A binary LDPC code with optional rate adaption.
///
/// The mother matrix, its derived adjacency and the schedule are fixed at
/// construction; the only mutable state is the current number of applied
/// rate-adaption steps together with the adjacency derived for it.
///
/// Encoding and the fixed-rate decode entry point take `&self` and can be
/// shared across threads; [`set_rate`] and [`decode_infer_rate`] rebuild the
/// derived adjacency and need exclusive access.
///
/// [`set_rate`]: RateAdaptiveCode::set_rate
/// [`decode_infer_rate`]: RateAdaptiveCode::decode_infer_rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateAdaptiveCode {
    mother_csc: Option<Mod2Csc>,
    mother_check_to_var: Vec<Vec<MatrixIndex>>,
    schedule: Option<RateAdaptionSchedule>,
    n_mother_rows: usize,
    n_cols: usize,
    current_steps: usize,
    check_to_var: Vec<Vec<MatrixIndex>>,
    var_to_check: Vec<Vec<MatrixIndex>>,
}

impl RateAdaptiveCode {
    /// Build a code without rate adaption from a validated CSC matrix.
    pub fn from_csc(matrix: Mod2Csc) -> Self {
        let mother_check_to_var = matrix.check_node_adjacency();
        let n_mother_rows = matrix.n_rows();
        let n_cols = matrix.n_cols();
        let check_to_var = mother_check_to_var.clone();
        let var_to_check = transpose(&check_to_var, n_cols);
        Self {
            mother_csc: Some(matrix),
            mother_check_to_var,
            schedule: None,
            n_mother_rows,
            n_cols,
            current_steps: 0,
            check_to_var,
            var_to_check,
        }
    }

    /// Build a rate-adaptive code from a validated CSC matrix, a schedule
    /// and an initial number of applied steps.
    pub fn with_rate_adaption(
        matrix: Mod2Csc,
        schedule: RateAdaptionSchedule,
        initial_steps: usize,
    ) -> Result<Self, LdpcError> {
        schedule.validate_for(matrix.n_rows())?;
        let mut code = Self::from_csc(matrix);
        code.schedule = Some(schedule);
        code.set_rate(initial_steps)?;
        Ok(code)
    }

    /// Build a code from a pre-materialised check-node adjacency, e.g. one
    /// produced by expanding a quasi-cyclic description.
    ///
    /// The column count is inferred as one plus the largest variable index;
    /// rows are sorted and deduplicated on ingestion.
    pub fn from_check_adjacency(
        mut check_to_var: Vec<Vec<MatrixIndex>>,
        schedule: Option<RateAdaptionSchedule>,
        initial_steps: usize,
    ) -> Result<Self, LdpcError> {
        let n_mother_rows = check_to_var.len();
        let max_var = check_to_var.iter().flatten().max().copied();
        let n_cols = match max_var {
            Some(var) => var as usize + 1,
            None => return Err(CscError::EmptyMatrix.into()),
        };
        if n_mother_rows > n_cols {
            return Err(CscError::MoreRowsThanCols {
                n_rows: n_mother_rows,
                n_cols,
            }
            .into());
        }
        for row in check_to_var.iter_mut() {
            row.sort_unstable();
            row.dedup();
        }

        if let Some(schedule) = &schedule {
            schedule.validate_for(n_mother_rows)?;
        }

        let mut code = Self {
            mother_csc: None,
            mother_check_to_var: check_to_var.clone(),
            schedule,
            n_mother_rows,
            n_cols,
            current_steps: 0,
            check_to_var,
            var_to_check: Vec::new(),
        };
        code.var_to_check = transpose(&code.check_to_var, n_cols);
        code.set_rate(initial_steps)?;
        Ok(code)
    }

    /// Re-derive the current adjacency for `steps` applied pair
    /// combinations. `steps = 0` restores the mother matrix verbatim.
    pub fn set_rate(&mut self, steps: usize) -> Result<(), LdpcError> {
        let max = self.max_ra_steps();
        if steps > max {
            return Err(ScheduleError::StepsOutOfRange {
                requested: steps,
                max,
            }
            .into());
        }

        self.check_to_var = if steps == 0 {
            self.mother_check_to_var.clone()
        } else if let Some(schedule) = &self.schedule {
            combine_rows(&self.mother_check_to_var, schedule, steps)
        } else {
            // max_ra_steps() is zero without a schedule, so steps > 0 was
            // rejected above
            self.mother_check_to_var.clone()
        };
        self.var_to_check = transpose(&self.check_to_var, self.n_cols);
        self.current_steps = steps;
        tracing::debug!(steps, rows = self.check_to_var.len(), "rate changed");
        Ok(())
    }

    // ------------------------------------------------------------ observers

    /// Row count of the current (possibly rate-adapted) matrix.
    pub fn current_rows(&self) -> usize {
        self.check_to_var.len()
    }

    /// Row count of the mother matrix, ignoring rate adaption.
    pub fn mother_rows(&self) -> usize {
        self.n_mother_rows
    }

    pub fn cols(&self) -> usize {
        self.n_cols
    }

    /// Largest number of rate-adaption steps the schedule supports.
    pub fn max_ra_steps(&self) -> usize {
        self.schedule.as_ref().map_or(0, |s| s.max_steps())
    }

    /// Number of currently applied rate-adaption steps.
    pub fn current_ra_steps(&self) -> usize {
        self.current_steps
    }

    /// Check-node adjacency at the current rate (one sorted variable list
    /// per check row).
    pub fn check_node_adjacency(&self) -> &[Vec<MatrixIndex>] {
        &self.check_to_var
    }

    /// Variable-node adjacency at the current rate (one sorted check list
    /// per variable).
    pub fn var_node_adjacency(&self) -> &[Vec<MatrixIndex>] {
        &self.var_to_check
    }

    // ------------------------------------------------------------- encoding

    /// Syndrome at the mother rate: `out` gets one bit per mother row.
    pub fn encode_mother<B: Bit>(&self, input: &[B], out: &mut Vec<B>) -> Result<(), LdpcError> {
        self.check_input_len(input.len())?;
        mulvec(&self.mother_check_to_var, input, out);
        Ok(())
    }

    /// Syndrome at the current rate: `out` gets one bit per current row.
    pub fn encode_at_current_rate<B: Bit>(
        &self,
        input: &[B],
        out: &mut Vec<B>,
    ) -> Result<(), LdpcError> {
        self.check_input_len(input.len())?;
        mulvec(&self.check_to_var, input, out);
        Ok(())
    }

    /// Syndrome of a chosen length without touching the current rate.
    ///
    /// Encodes at the mother rate and then applies the schedule to the
    /// resulting bits, so the object's rate state is left untouched.
    /// `syndrome_length` must lie in `[mother_rows - max_ra_steps,
    /// mother_rows]`.
    pub fn encode_with_length<B: Bit>(
        &self,
        input: &[B],
        out: &mut Vec<B>,
        syndrome_length: usize,
    ) -> Result<(), LdpcError> {
        self.check_input_len(input.len())?;
        let steps = self.steps_for_length(syndrome_length)?;

        let mut mother_syndrome = Vec::with_capacity(self.n_mother_rows);
        mulvec(&self.mother_check_to_var, input, &mut mother_syndrome);
        if steps == 0 {
            *out = mother_syndrome;
            return Ok(());
        }
        match &self.schedule {
            Some(schedule) => {
                crate::rate_adaption::adapt_syndrome(&mother_syndrome, schedule, steps, out);
                Ok(())
            }
            // steps_for_length only returns nonzero steps with a schedule
            None => Err(ScheduleError::StepsOutOfRange {
                requested: steps,
                max: 0,
            }
            .into()),
        }
    }

    // ------------------------------------------------------------- decoding

    /// Belief-propagation decoding against the current rate.
    ///
    /// `llrs` carries one log-likelihood ratio per variable node and
    /// `syndrome` must match the current row count. `out` receives the hard
    /// decision of the last iteration even when decoding fails; whether it
    /// is a valid solution is reported in the returned [`DecodeResult`],
    /// never as an error.
    pub fn decode_at_current_rate<B: Bit + PartialEq>(
        &self,
        llrs: &[f64],
        syndrome: &[B],
        out: &mut Vec<B>,
        max_iterations: usize,
        vsat: f64,
    ) -> Result<DecodeResult, LdpcError> {
        self.check_input_len(llrs.len())?;
        if syndrome.len() != self.current_rows() {
            return Err(LdpcError::InvalidInputLength {
                expected: self.current_rows(),
                actual: syndrome.len(),
            });
        }
        Ok(sum_product_decode(
            &self.check_to_var,
            &self.var_to_check,
            llrs,
            syndrome,
            out,
            max_iterations,
            vsat,
        ))
    }

    /// Decode, inferring the rate from the syndrome length.
    ///
    /// If the syndrome length differs from the current row count, the rate
    /// is changed to `mother_rows - syndrome_length` steps first (mutating
    /// the object); a matching length decodes without mutation.
    pub fn decode_infer_rate<B: Bit + PartialEq>(
        &mut self,
        llrs: &[f64],
        syndrome: &[B],
        out: &mut Vec<B>,
        max_iterations: usize,
        vsat: f64,
    ) -> Result<DecodeResult, LdpcError> {
        self.check_input_len(llrs.len())?;
        if syndrome.len() != self.current_rows() {
            let steps = self.steps_for_length(syndrome.len())?;
            self.set_rate(steps)?;
        }
        self.decode_at_current_rate(llrs, syndrome, out, max_iterations, vsat)
    }

    // -------------------------------------------------------------- helpers

    fn check_input_len(&self, actual: usize) -> Result<(), LdpcError> {
        if actual != self.n_cols {
            return Err(LdpcError::InvalidInputLength {
                expected: self.n_cols,
                actual,
            });
        }
        Ok(())
    }

    /// Map a requested syndrome length to a number of adaption steps,
    /// rejecting lengths outside `[mother_rows - max_ra_steps, mother_rows]`.
    fn steps_for_length(&self, syndrome_length: usize) -> Result<usize, LdpcError> {
        let min = self.n_mother_rows - self.max_ra_steps();
        if syndrome_length < min || syndrome_length > self.n_mother_rows {
            return Err(LdpcError::UnsupportedRate {
                requested: syndrome_length,
                min,
                max: self.n_mother_rows,
            });
        }
        Ok(self.n_mother_rows - syndrome_length)
    }
}

/// Log-likelihood ratios for a binary symmetric channel.
///
/// Maps each received bit to `log((1 - p) / p) * (1 - 2 * bit)`: a received
/// zero becomes a positive LLR, a received one a negative LLR, both with the
/// confidence implied by the flip probability `p`.
pub fn llrs_bsc<B: Bit>(received: &[B], flip_probability: f64) -> Vec<f64> {
    let vlog = ((1.0 - flip_probability) / flip_probability).ln();
    received
        .iter()
        .map(|&bit| if bit.to_bool() { -vlog } else { vlog })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_code() -> RateAdaptiveCode {
        let matrix = Mod2Csc::new(
            vec![0, 1, 2, 4, 5, 7, 9, 12],
            vec![0, 1, 0, 1, 2, 0, 2, 1, 2, 0, 1, 2],
        )
        .unwrap();
        RateAdaptiveCode::from_csc(matrix)
    }

    fn small_ra_code(initial_steps: usize) -> RateAdaptiveCode {
        let matrix = Mod2Csc::new(
            vec![0, 1, 2, 4, 5, 7, 9, 12],
            vec![0, 1, 0, 1, 2, 0, 2, 1, 2, 0, 1, 2],
        )
        .unwrap();
        let schedule = RateAdaptionSchedule::new(vec![0, 1]).unwrap();
        RateAdaptiveCode::with_rate_adaption(matrix, schedule, initial_steps).unwrap()
    }

    #[test]
    fn test_observers() {
        let code = small_code();
        assert_eq!(code.mother_rows(), 3);
        assert_eq!(code.current_rows(), 3);
        assert_eq!(code.cols(), 7);
        assert_eq!(code.max_ra_steps(), 0);
        assert_eq!(code.current_ra_steps(), 0);
    }

    #[test]
    fn test_encode_mother() {
        let code = small_code();
        let x = [1u8, 1, 1, 1, 0, 0, 0];
        let mut syndrome = Vec::new();
        code.encode_mother(&x, &mut syndrome).unwrap();
        assert_eq!(syndrome, vec![0, 0, 1]);
    }

    #[test]
    fn test_encode_rejects_wrong_length() {
        let code = small_code();
        let mut syndrome = Vec::new();
        let err = code.encode_mother(&[1u8, 0], &mut syndrome).unwrap_err();
        assert!(matches!(
            err,
            LdpcError::InvalidInputLength { expected: 7, actual: 2 }
        ));
    }

    #[test]
    fn test_set_rate_changes_row_count() {
        let mut code = small_ra_code(0);
        assert_eq!(code.current_rows(), 3);
        code.set_rate(1).unwrap();
        assert_eq!(code.current_rows(), 2);
        assert_eq!(code.current_ra_steps(), 1);
        code.set_rate(0).unwrap();
        assert_eq!(code.check_node_adjacency(), small_code().check_node_adjacency());
    }

    #[test]
    fn test_set_rate_rejects_excess_steps() {
        let mut code = small_ra_code(0);
        assert!(matches!(
            code.set_rate(2),
            Err(LdpcError::InvalidSchedule(ScheduleError::StepsOutOfRange {
                requested: 2,
                max: 1
            }))
        ));
    }

    #[test]
    fn test_initial_steps_applied() {
        let code = small_ra_code(1);
        assert_eq!(code.current_rows(), 2);
        assert_eq!(
            code.check_node_adjacency(),
            &[vec![3, 4, 5, 6], vec![0, 1, 4, 5]]
        );
    }

    #[test]
    fn test_max_initial_steps_accepted() {
        let code = small_ra_code(1);
        assert_eq!(code.current_ra_steps(), code.max_ra_steps());
    }

    #[test]
    fn test_encode_with_length_matches_mother_and_adapted() {
        let code = small_ra_code(0);
        let x = [1u8, 1, 1, 1, 0, 0, 0];

        let mut mother = Vec::new();
        code.encode_mother(&x, &mut mother).unwrap();
        let mut full = Vec::new();
        code.encode_with_length(&x, &mut full, 3).unwrap();
        assert_eq!(full, mother);

        let mut short = Vec::new();
        code.encode_with_length(&x, &mut short, 2).unwrap();
        assert_eq!(short, vec![1, 0]);
        // the object's rate state is untouched
        assert_eq!(code.current_ra_steps(), 0);
        assert_eq!(code.current_rows(), 3);
    }

    #[test]
    fn test_encode_with_length_rejects_out_of_range() {
        let code = small_ra_code(0);
        let x = [1u8, 1, 1, 1, 0, 0, 0];
        let mut out = Vec::new();
        assert!(matches!(
            code.encode_with_length(&x, &mut out, 1),
            Err(LdpcError::UnsupportedRate { requested: 1, min: 2, max: 3 })
        ));
        assert!(matches!(
            code.encode_with_length(&x, &mut out, 4),
            Err(LdpcError::UnsupportedRate { requested: 4, .. })
        ));
    }

    #[test]
    fn test_equality_tracks_rate_state() {
        let a = small_ra_code(0);
        let mut b = small_ra_code(1);
        assert_ne!(a, b);
        b.set_rate(0).unwrap();
        assert_eq!(a, b);
        // codes with and without a schedule never compare equal
        assert_ne!(small_code(), a);
    }

    #[test]
    fn test_from_check_adjacency() {
        let code = RateAdaptiveCode::from_check_adjacency(
            vec![vec![0, 2, 4, 6], vec![1, 2, 5, 6], vec![3, 4, 5, 6]],
            None,
            0,
        )
        .unwrap();
        assert_eq!(code.mother_rows(), 3);
        assert_eq!(code.cols(), 7);
        assert_eq!(code.check_node_adjacency(), small_code().check_node_adjacency());
    }

    #[test]
    fn test_llrs_bsc_signs() {
        let llrs = llrs_bsc(&[0u8, 1, 0], 0.1);
        assert!(llrs[0] > 0.0);
        assert!(llrs[1] < 0.0);
        assert_eq!(llrs[0], -llrs[1]);
    }
}
