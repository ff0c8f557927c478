//! Readers for the on-disk matrix and rate-adaption formats.
//!
//! Three formats are understood:
//!
//! - `.cscmat` (text): optional `#` comment lines, one metadata line
//!   (ignored), a line of integers for the column pointers, a blank line,
//!   and a line of integers for the row indices. Integers are decimal or
//!   `0x`-prefixed hex, separated by spaces.
//! - `bincsc.json`: a JSON object with `"format": "BINCSCJSON"`, `"colptr"`
//!   and `"rowval"` integer arrays. Quasi-cyclic variants carry a different
//!   format tag and are rejected here rather than expanded.
//! - Rate-adaption CSV: one `a,b` row-index pair per line, flattened into
//!   the schedule in file order.
//!
//! Every failure carries the offending file path and a reason.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::code::RateAdaptiveCode;
use crate::rate_adaption::RateAdaptionSchedule;
use crate::sparse_matrix::Mod2Csc;
use crate::{ColPtr, LdpcError, MatrixIndex};

#[derive(Error, Debug)]
#[error("failed to parse '{path}': {reason}")]
pub struct ParseError {
    pub path: PathBuf,
    pub reason: String,
}

impl ParseError {
    fn new(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Parse one ASCII integer, decimal or `0x`-prefixed hex.
fn parse_int(token: &str) -> Result<u32, String> {
    let parsed = if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        token.parse::<u32>()
    };
    parsed.map_err(|e| format!("invalid integer '{token}': {e}"))
}

/// Parse a line of separator-delimited integers, trimming surrounding
/// whitespace.
fn parse_separated_ints(line: &str, separator: char) -> Result<Vec<u32>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err("expected a line of integers, found an empty line".into());
    }
    trimmed
        .split(separator)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(parse_int)
        .collect()
}

fn parse_cscmat_str(content: &str) -> Result<(Vec<ColPtr>, Vec<MatrixIndex>), String> {
    let mut lines = content
        .lines()
        .skip_while(|line| line.trim_start().starts_with('#'));

    // metadata line (dimensions etc.), not interpreted
    if lines.next().is_none() {
        return Err("missing metadata line".into());
    }

    let mut data_lines = lines.filter(|line| !line.trim().is_empty());
    let colptr_line = data_lines
        .next()
        .ok_or("missing column pointer line")?;
    let rowval_line = data_lines.next().ok_or("missing row index line")?;
    if data_lines.next().is_some() {
        return Err("unexpected extra data after the row index line".into());
    }

    let colptr = parse_separated_ints(colptr_line, ' ')?;
    let rowval = parse_separated_ints(rowval_line, ' ')?;
    Ok((colptr, rowval))
}

/// Read the `colptr` / `rowval` pair of a `.cscmat` file.
pub fn read_matrix_from_cscmat(
    path: impl AsRef<Path>,
) -> Result<(Vec<ColPtr>, Vec<MatrixIndex>), ParseError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ParseError::new(path, e.to_string()))?;
    parse_cscmat_str(&content).map_err(|reason| ParseError::new(path, reason))
}

#[derive(Deserialize)]
struct BinCscJson {
    format: String,
    colptr: Vec<u64>,
    rowval: Vec<u64>,
}

fn parse_bincsc_json_str(content: &str) -> Result<(Vec<ColPtr>, Vec<MatrixIndex>), String> {
    let parsed: BinCscJson = serde_json::from_str(content).map_err(|e| e.to_string())?;
    if parsed.format != "BINCSCJSON" {
        return Err(format!(
            "unsupported format tag '{}' (expected 'BINCSCJSON')",
            parsed.format
        ));
    }
    let narrow = |values: Vec<u64>, what: &str| -> Result<Vec<u32>, String> {
        values
            .into_iter()
            .map(|v| u32::try_from(v).map_err(|_| format!("{what} entry {v} exceeds u32")))
            .collect()
    };
    Ok((
        narrow(parsed.colptr, "colptr")?,
        narrow(parsed.rowval, "rowval")?,
    ))
}

/// Read the `colptr` / `rowval` pair of a `bincsc.json` file.
pub fn read_matrix_from_bincsc_json(
    path: impl AsRef<Path>,
) -> Result<(Vec<ColPtr>, Vec<MatrixIndex>), ParseError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ParseError::new(path, e.to_string()))?;
    parse_bincsc_json_str(&content).map_err(|reason| ParseError::new(path, reason))
}

fn parse_rate_adaption_str(content: &str) -> Result<Vec<MatrixIndex>, String> {
    let mut rows_to_combine = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let pair = parse_separated_ints(line, ',')
            .map_err(|e| format!("line {}: {e}", line_no + 1))?;
        if pair.len() != 2 {
            return Err(format!(
                "line {}: expected two comma-separated row indices, found {}",
                line_no + 1,
                pair.len()
            ));
        }
        rows_to_combine.push(pair[0]);
        rows_to_combine.push(pair[1]);
    }
    if rows_to_combine.is_empty() {
        return Err("file contains no row pairs".into());
    }
    Ok(rows_to_combine)
}

/// Read a flattened pair list from a rate-adaption CSV file.
pub fn read_rate_adaption_from_csv(
    path: impl AsRef<Path>,
) -> Result<Vec<MatrixIndex>, ParseError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ParseError::new(path, e.to_string()))?;
    parse_rate_adaption_str(&content).map_err(|reason| ParseError::new(path, reason))
}

/// Load a code from a `.cscmat` file, optionally wiring in a rate-adaption
/// schedule from a CSV file.
pub fn load_code(
    cscmat_path: impl AsRef<Path>,
    rate_adaption_path: Option<&Path>,
) -> Result<RateAdaptiveCode, LdpcError> {
    let (colptr, rowval) = read_matrix_from_cscmat(cscmat_path)?;
    let matrix = Mod2Csc::new(colptr, rowval)?;
    match rate_adaption_path {
        None => Ok(RateAdaptiveCode::from_csc(matrix)),
        Some(path) => {
            let rows_to_combine = read_rate_adaption_from_csv(path)?;
            let schedule = RateAdaptionSchedule::new(rows_to_combine)?;
            RateAdaptiveCode::with_rate_adaption(matrix, schedule, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_CSCMAT: &str = "\
# toy matrix
# H = [1 0 1 0 1 0 1; 0 1 1 0 0 1 1; 0 0 0 1 1 1 1]
3 7 12

0 1 2 4 5 7 9 12

0 1 0 1 2 0 2 1 2 0 1 2
";

    #[test]
    fn test_parse_cscmat() {
        let (colptr, rowval) = parse_cscmat_str(SMALL_CSCMAT).unwrap();
        assert_eq!(colptr, vec![0, 1, 2, 4, 5, 7, 9, 12]);
        assert_eq!(rowval, vec![0, 1, 0, 1, 2, 0, 2, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_parse_cscmat_hex_values() {
        let content = "# c\nmeta\n0x0 0x1 0x2\n\n0x0 0x1\n";
        let (colptr, rowval) = parse_cscmat_str(content).unwrap();
        assert_eq!(colptr, vec![0, 1, 2]);
        assert_eq!(rowval, vec![0, 1]);
    }

    #[test]
    fn test_parse_cscmat_rejects_garbage() {
        assert!(parse_cscmat_str("").is_err());
        assert!(parse_cscmat_str("# only comments\n").is_err());
        assert!(parse_cscmat_str("meta\n0 1 x\n\n0\n").is_err());
        // trailing extra data line
        assert!(parse_cscmat_str("meta\n0 1\n\n0\n\n99\n").is_err());
    }

    #[test]
    fn test_parse_bincsc_json() {
        let content = r#"{"format":"BINCSCJSON","colptr":[0,1,2],"rowval":[0,1]}"#;
        let (colptr, rowval) = parse_bincsc_json_str(content).unwrap();
        assert_eq!(colptr, vec![0, 1, 2]);
        assert_eq!(rowval, vec![0, 1]);
    }

    #[test]
    fn test_parse_bincsc_json_rejects_qc_variant() {
        let content = r#"{"format":"QCCSCJSON","colptr":[0],"rowval":[0]}"#;
        let err = parse_bincsc_json_str(content).unwrap_err();
        assert!(err.contains("unsupported format tag"));
    }

    #[test]
    fn test_parse_rate_adaption_csv() {
        let rows = parse_rate_adaption_str("0,1\n3,4\n").unwrap();
        assert_eq!(rows, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_parse_rate_adaption_rejects_triples() {
        assert!(parse_rate_adaption_str("0,1,2\n").is_err());
        assert!(parse_rate_adaption_str("\n\n").is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = read_matrix_from_cscmat("/nonexistent/code.cscmat").unwrap_err();
        assert_eq!(err.path, PathBuf::from("/nonexistent/code.cscmat"));
    }
}
