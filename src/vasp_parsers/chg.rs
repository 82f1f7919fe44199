//! Volumetric data files of VASP (LOCPOT, CHGCAR), only the first data block is read.

use std::{
    path::Path,
    str::FromStr,
};

use ndarray::{
    Array3,
    Axis as NdAxis,
};

use crate::{
    error::{
        ExtractError,
        ExtractResult,
        read_to_string,
    },
    types::{
        Axis,
        Cube,
        Vector,
    },
    vasp_parsers::poscar::Poscar,
};


#[derive(Clone, Debug)]
pub struct Potential {
    pub pos:   Poscar,
    pub ngrid: [usize; 3],
    pub data:  Cube<f64>,    // [ix, iy, iz]
}


impl Potential {
    pub fn from_file(path: &(impl AsRef<Path> + ?Sized)) -> ExtractResult<Self> {
        read_to_string(path)?.parse()
    }

    /// Average over the plane perpendicular to `axis`.
    pub fn planar_average(&self, axis: Axis) -> Vector<f64> {
        planar_average(&self.data, axis)
    }

    /// Length of the lattice vector along `axis`, in Angstrom.
    pub fn axis_length(&self, axis: Axis) -> f64 {
        self.pos.lattice_lengths()[axis.index()]
    }
}


pub fn planar_average(data: &Cube<f64>, axis: Axis) -> Vector<f64> {
    let (first, second) = match axis {
        Axis::X => (2, 1),
        Axis::Y => (2, 0),
        Axis::Z => (1, 0),
    };
    let n = data.len_of(NdAxis(first)) * data.len_of(NdAxis(second));
    data.sum_axis(NdAxis(first))
        .sum_axis(NdAxis(second))
        / n as f64
}


impl FromStr for Potential {
    type Err = ExtractError;

    fn from_str(txt: &str) -> ExtractResult<Self> {
        let mut it = txt.lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l));

        let pos = Poscar::from_lines(&mut it)?;

        let (lineno, line) = it.by_ref()
            .find(|(_, l)| !l.trim().is_empty())
            .ok_or(ExtractError::MissingField("grid size"))?;
        let ngrid = line.split_whitespace()
            .map(|x| x.parse::<usize>())
            .collect::<Result<Vec<usize>, _>>()
            .ok()
            .filter(|v| v.len() == 3)
            .ok_or_else(|| ExtractError::MalformedRow {
                line: lineno,
                reason: format!("invalid grid size: {:?}", line.trim()),
            })?;
        let ngrid = [ngrid[0], ngrid[1], ngrid[2]];
        let ntot = ngrid[0] * ngrid[1] * ngrid[2];

        let mut values = Vec::with_capacity(ntot);
        'outer: for (lineno, line) in it {
            for tok in line.split_whitespace() {
                if values.len() == ntot {
                    break 'outer;
                }
                let v = tok.parse::<f64>()
                    .map_err(|_| ExtractError::MalformedRow {
                        line: lineno,
                        reason: format!("`{}` is not a number", tok),
                    })?;
                values.push(v);
            }
        }

        if values.len() < ntot {
            return Err(ExtractError::MalformedRow {
                line: txt.lines().count(),
                reason: format!("expect {} grid values, found {}", ntot, values.len()),
            });
        }

        // x runs fastest in file
        let data = Array3::from_shape_vec((ngrid[2], ngrid[1], ngrid[0]), values)
            .map_err(|e| ExtractError::MalformedRow { line: lineno, reason: e.to_string() })?
            .permuted_axes([2, 1, 0]);

        Ok(Self { pos, ngrid, data })
    }
}
