//! Whitespace separated numeric tables, the common denominator of VASPKIT's `*.dat` outputs.

use std::{
    path::Path,
    str::FromStr,
};

use log::debug;
use ndarray::{
    Array2,
    s,
};

use crate::{
    error::{
        ExtractError,
        ExtractResult,
        read_to_string,
    },
    types::{
        Matrix,
        Vector,
    },
};


#[derive(Clone, Debug)]
pub struct NumericTable {
    /// First non-comment line if it is not numeric, e.g. `Energy  s  py  pz  px  tot`
    pub header: Option<String>,
    pub data:   Matrix<f64>,
}


pub(crate) fn parse_row(line: &str, lineno: usize) -> ExtractResult<Vec<f64>> {
    line.split_whitespace()
        .map(|tok| tok.parse::<f64>()
             .map_err(|_| ExtractError::MalformedRow {
                 line: lineno,
                 reason: format!("`{}` is not a number", tok),
             }))
        .collect()
}


/// A header only names columns: letters other than the exponent marker, and no number.
fn looks_like_header(line: &str) -> bool {
    line.chars().any(|c| c.is_alphabetic() && c != 'e' && c != 'E')
        && line.split_whitespace().all(|tok| tok.parse::<f64>().is_err())
}


impl NumericTable {
    pub fn from_file(path: &(impl AsRef<Path> + ?Sized)) -> ExtractResult<Self> {
        read_to_string(path)?.parse()
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    pub fn column(&self, icol: usize) -> Vector<f64> {
        self.data.column(icol).to_owned()
    }

    /// Columns `1..` as a `[nrows, ncols-1]` matrix.
    pub fn tail_columns(&self) -> Matrix<f64> {
        self.data.slice(s![.., 1..]).to_owned()
    }
}


impl FromStr for NumericTable {
    type Err = ExtractError;

    fn from_str(txt: &str) -> ExtractResult<Self> {
        let mut header: Option<String> = None;
        let mut rows: Vec<Vec<f64>> = vec![];

        for (i, line) in txt.lines().enumerate() {
            let lineno = i + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            match parse_row(trimmed, lineno) {
                Ok(row) => {
                    if let Some(first) = rows.first() {
                        if first.len() != row.len() {
                            return Err(ExtractError::MalformedRow {
                                line: lineno,
                                reason: format!("expect {} columns, found {}", first.len(), row.len()),
                            });
                        }
                    }
                    rows.push(row);
                },
                Err(e) => {
                    if rows.is_empty() && header.is_none() && looks_like_header(trimmed) {
                        debug!("Treat line {} as table header: {:?}", lineno, trimmed);
                        header = Some(trimmed.to_owned());
                    } else {
                        return Err(e);
                    }
                },
            }
        }

        if rows.is_empty() {
            return Err(ExtractError::Empty("numeric rows"));
        }

        let nrow = rows.len();
        let ncol = rows[0].len();
        let data = Array2::from_shape_fn((nrow, ncol), |(i, j)| rows[i][j]);

        Ok(Self { header, data })
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_with_comments_and_header() {
        let txt = "\
# written by vaspkit
Energy   TDOS
-1.0   0.5

 0.0   1.0E+00
 1.0   0.25
";
        let table: NumericTable = txt.parse().unwrap();
        assert_eq!(table.header.as_deref(), Some("Energy   TDOS"));
        assert_eq!(table.nrows(), 3);
        assert_eq!(table.ncols(), 2);
        assert_eq!(table.column(1).to_vec(), vec![0.5, 1.0, 0.25]);
        assert_eq!(table.tail_columns().shape(), &[3, 1]);
    }

    #[test]
    fn test_ragged_row() {
        let txt = "0.0 1.0\n1.0 2.0 3.0\n";
        let ret = txt.parse::<NumericTable>();
        assert!(matches!(ret, Err(ExtractError::MalformedRow { line: 2, .. })));
    }

    #[test]
    fn test_malformed_row_after_data() {
        let txt = "0.0 1.0\n1.0 abc\n";
        assert!(matches!(txt.parse::<NumericTable>(), Err(ExtractError::MalformedRow { line: 2, .. })));
    }

    #[test]
    fn test_malformed_first_row() {
        let ret = "0.0 1,5\n0.1 2.0\n".parse::<NumericTable>();
        assert!(matches!(ret, Err(ExtractError::MalformedRow { line: 1, .. })));

        // exponent markers alone do not make a header
        let ret = "1.0e 2.0E\n0.1 2.0\n".parse::<NumericTable>();
        assert!(matches!(ret, Err(ExtractError::MalformedRow { line: 1, .. })));
    }

    #[test]
    fn test_letter_typo_in_first_row() {
        let ret = "-3.0 1.O\n-2.0 2.0\n".parse::<NumericTable>();
        assert!(matches!(ret, Err(ExtractError::MalformedRow { line: 1, .. })));

        assert!(looks_like_header("Energy  s  py  pz  px  tot"));
        assert!(!looks_like_header("-3.0 1.O"));
        assert!(!looks_like_header("-3.0 1.0E+00"));
    }

    #[test]
    fn test_empty_table() {
        assert!(matches!("# nothing\n\n".parse::<NumericTable>(), Err(ExtractError::Empty(_))));
    }
}
