//! Total and projected density of states reformatted by VASPKIT, i.e. `TDOS.dat` and
//! `PDOS_USER.dat` / `PDOS_<elem>.dat`.

use std::{
    fmt,
    path::Path,
    str::FromStr,
};

use log::warn;
use ndarray::Array1;

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


/// First column is energy, the rest are densities.
#[derive(Clone, Debug)]
pub struct DosTable {
    pub energies: Vector<f64>,
    pub columns:  Matrix<f64>,  // [ienergy, icolumn]
}


impl DosTable {
    pub fn from_file(path: &(impl AsRef<Path> + ?Sized)) -> ExtractResult<Self> {
        read_to_string(path)?.parse()
    }

    /// Total number of columns in the file, energy column included.
    pub fn ncols(&self) -> usize {
        self.columns.ncols() + 1
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    /// Column `icol` of the file, `icol = 0` is the energy.
    pub fn column(&self, icol: usize) -> Vector<f64> {
        if icol == 0 {
            self.energies.clone()
        } else {
            self.columns.column(icol - 1).to_owned()
        }
    }

    /// Total DOS is the first density column.
    pub fn total(&self) -> Vector<f64> {
        self.column(1)
    }
}


impl FromStr for DosTable {
    type Err = ExtractError;

    fn from_str(txt: &str) -> ExtractResult<Self> {
        let table: NumericTable = txt.parse()?;
        if table.ncols() < 2 {
            return Err(ExtractError::MissingField("density column"));
        }

        Ok(Self {
            energies: table.column(0),
            columns:  table.tail_columns(),
        })
    }
}


/// Column arrangement of a projected DOS file, told apart only by the column count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnLayout {
    /// energy, s↑, s↓, py↑, py↓, pz↑, pz↓, px↑, px↓, ...
    SpinPolarized,
    /// energy, s, py, pz, px, ...
    NonSpin,
    /// Neither of the above, the channels are zero-filled.
    Unrecognized(usize),
}


impl ColumnLayout {
    pub fn detect(ncols: usize) -> ExtractResult<Self> {
        if ncols >= 8 {
            Ok(Self::SpinPolarized)
        } else if ncols >= 5 {
            Ok(Self::NonSpin)
        } else {
            Err(ExtractError::UnrecognizedLayout(ncols))
        }
    }

    /// Columns of s, py, pz and px in the file, if the layout is recognized.
    pub fn channel_columns(self) -> Option<[usize; 4]> {
        match self {
            Self::SpinPolarized   => Some([1, 3, 5, 7]),
            Self::NonSpin         => Some([1, 2, 3, 4]),
            Self::Unrecognized(_) => None,
        }
    }
}


impl fmt::Display for ColumnLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpinPolarized   => write!(f, "spin polarized"),
            Self::NonSpin         => write!(f, "non spin polarized"),
            Self::Unrecognized(n) => write!(f, "unrecognized ({} columns)", n),
        }
    }
}


#[derive(Clone, Debug)]
pub struct PdosChannels {
    pub layout: ColumnLayout,
    pub s:      Vector<f64>,
    pub py:     Vector<f64>,
    pub pz:     Vector<f64>,
    pub px:     Vector<f64>,
}


impl PdosChannels {
    pub const NAMES: [&'static str; 5] = ["s", "py", "pz", "px", "p"];

    /// Best-effort channel selection. An unrecognized layout gives zero-filled channels of the
    /// right length instead of an error.
    pub fn from_table(table: &DosTable) -> Self {
        let layout = match ColumnLayout::detect(table.ncols()) {
            Ok(layout) => layout,
            Err(e) => {
                warn!("{}, all orbital channels are filled with zeros.", e);
                ColumnLayout::Unrecognized(table.ncols())
            },
        };

        match layout.channel_columns() {
            Some([is, ipy, ipz, ipx]) => Self {
                layout,
                s:  table.column(is),
                py: table.column(ipy),
                pz: table.column(ipz),
                px: table.column(ipx),
            },
            None => {
                let zeros = Array1::<f64>::zeros(table.len());
                Self {
                    layout,
                    s:  zeros.clone(),
                    py: zeros.clone(),
                    pz: zeros.clone(),
                    px: zeros,
                }
            },
        }
    }

    pub fn p(&self) -> Vector<f64> {
        &self.py + &self.pz + &self.px
    }

    /// Channels in the order of `NAMES`.
    pub fn channels(&self) -> Vec<(&'static str, Vector<f64>)> {
        Self::NAMES.iter()
            .copied()
            .zip([self.s.clone(), self.py.clone(), self.pz.clone(), self.px.clone(), self.p()])
            .collect()
    }
}
