use std::{
    path::Path,
    str::FromStr,
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
    vasp_parsers::table::NumericTable,
};


/// Band structure reformatted by VASPKIT, i.e. `REFORMATTED_BAND.dat`.
///
/// The first column is the position along the k-path, the rest are eigenvalues of each band,
/// already shifted by the Fermi level.
#[derive(Clone, Debug)]
pub struct BandStructure {
    pub kpath: Vector<f64>,
    pub eigs:  Matrix<f64>,     // [ikpoint, iband]
}


impl BandStructure {
    pub fn from_file(path: &(impl AsRef<Path> + ?Sized)) -> ExtractResult<Self> {
        read_to_string(path)?.parse()
    }

    pub fn nkpoints(&self) -> usize {
        self.eigs.nrows()
    }

    pub fn nbands(&self) -> usize {
        self.eigs.ncols()
    }
}


impl FromStr for BandStructure {
    type Err = ExtractError;

    fn from_str(txt: &str) -> ExtractResult<Self> {
        let table: NumericTable = txt.parse()?;
        if table.ncols() < 2 {
            return Err(ExtractError::MissingField("band energies"));
        }

        Ok(Self {
            kpath: table.column(0),
            eigs:  table.tail_columns(),
        })
    }
}
