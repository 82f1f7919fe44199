//! Orbital projected band structure written by VASPKIT, e.g. `PBAND_C.dat`.
//!
//! ```text
//! #K-Path          Energy      s      py      pz      px     tot
//! # Band-Index    1
//!    0.00000  -19.87010  0.438  0.000  0.000  0.000  0.438
//!    0.02713  -19.86320  0.437  0.000  0.000  0.000  0.437
//!
//! # Band-Index    2
//!    ...
//! ```

use std::{
    path::Path,
    str::FromStr,
};

use indexmap::IndexMap;
use log::debug;
use ndarray::{
    Array1,
    Array2,
};
use regex::Regex;

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
    vasp_parsers::table::parse_row,
};


const DEFAULT_ORBITALS: &[&str] = &[
    "s", "py", "pz", "px", "dxy", "dyz", "dz2", "dxz", "dx2", "tot",
];


#[derive(Clone, Debug)]
pub struct ProjectedBand {
    /// Band index written in the file, counts from 1.
    pub index:    usize,
    pub kpath:    Vector<f64>,
    pub energies: Vector<f64>,
    pub weights:  Matrix<f64>,  // [ikpoint, iorbital]
}


#[derive(Clone, Debug)]
pub struct ProjectedBands {
    pub orbitals: Vec<String>,
    pub bands:    Vec<ProjectedBand>,
}


struct RawSection {
    index: usize,
    rows:  Vec<(usize, Vec<f64>)>,   // (line number, values)
}


impl RawSection {
    fn into_band(self, nweights: usize) -> ExtractResult<ProjectedBand> {
        let nrow = self.rows.len();
        let mut kpath = Array1::<f64>::zeros(nrow);
        let mut energies = Array1::<f64>::zeros(nrow);
        let mut weights = Array2::<f64>::zeros((nrow, nweights));

        for (i, (lineno, row)) in self.rows.iter().enumerate() {
            if row.len() != nweights + 2 {
                return Err(ExtractError::MalformedRow {
                    line: *lineno,
                    reason: format!("expect {} columns in band {}, found {}", nweights + 2, self.index, row.len()),
                });
            }
            kpath[i] = row[0];
            energies[i] = row[1];
            weights.row_mut(i).iter_mut()
                .zip(row[2..].iter())
                .for_each(|(w, v)| *w = *v);
        }

        Ok(ProjectedBand { index: self.index, kpath, energies, weights })
    }
}


impl ProjectedBands {
    pub fn from_file(path: &(impl AsRef<Path> + ?Sized)) -> ExtractResult<Self> {
        read_to_string(path)?.parse()
    }

    pub fn nbands(&self) -> usize {
        self.bands.len()
    }

    /// Average orbital weights of all the samples satisfying `|k - k_target| < k_range` and
    /// `|E - e_ref| < e_range`, expressed as percentages of their sum.
    ///
    /// The `tot` column is excluded from both the result and the sum.
    pub fn orbital_contributions(&self, k_target: f64, k_range: f64,
                                 e_ref: f64, e_range: f64) -> ExtractResult<IndexMap<String, f64>> {
        let selected = self.orbitals.iter()
            .enumerate()
            .filter(|(_, name)| !name.eq_ignore_ascii_case("tot"))
            .map(|(i, _)| i)
            .collect::<Vec<usize>>();

        let mut sums = vec![0.0f64; selected.len()];
        let mut nsample = 0usize;

        for band in self.bands.iter() {
            for (ik, (&k, &e)) in band.kpath.iter().zip(band.energies.iter()).enumerate() {
                if (k - k_target).abs() >= k_range || (e - e_ref).abs() >= e_range {
                    continue;
                }
                nsample += 1;
                for (s, &iorb) in sums.iter_mut().zip(selected.iter()) {
                    *s += band.weights[[ik, iorb]];
                }
            }
        }

        if nsample == 0 {
            return Err(ExtractError::Empty("band samples inside the selected k and energy window"));
        }

        let means = sums.into_iter()
            .map(|s| s / nsample as f64)
            .collect::<Vec<f64>>();
        let total: f64 = means.iter().sum();
        if total == 0.0 {
            return Err(ExtractError::Empty("orbital weight inside the selected k and energy window"));
        }

        Ok(selected.into_iter()
           .zip(means)
           .map(|(i, m)| (self.orbitals[i].clone(), 100.0 * m / total))
           .collect())
    }
}


impl FromStr for ProjectedBands {
    type Err = ExtractError;

    fn from_str(txt: &str) -> ExtractResult<Self> {
        let marker = Regex::new(r"^#\s*Band-Index\s+(\d+)").expect("valid regex");

        let mut header: Option<Vec<String>> = None;
        let mut sections: Vec<RawSection> = vec![];

        for (i, line) in txt.lines().enumerate() {
            let lineno = i + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(cap) = marker.captures(line) {
                let index = cap[1].parse::<usize>()
                    .map_err(|e| ExtractError::MalformedRow { line: lineno, reason: e.to_string() })?;
                sections.push(RawSection { index, rows: vec![] });
                continue;
            }

            if line.starts_with('#') {
                if line.contains("K-Path") && header.is_none() {
                    header = Some(line.trim_start_matches('#')
                                  .split_whitespace()
                                  .skip(2)
                                  .map(str::to_owned)
                                  .collect());
                }
                continue;
            }

            if !line.starts_with(|c: char| c.is_ascii_digit()) {
                debug!("PBAND: skip line {}: {:?}", lineno, line);
                continue;
            }

            let row = parse_row(line, lineno)?;
            if sections.is_empty() {
                sections.push(RawSection { index: 1, rows: vec![] });
            }
            if let Some(sec) = sections.last_mut() {
                sec.rows.push((lineno, row));
            }
        }

        sections.retain(|s| !s.rows.is_empty());
        let ncols = sections.first()
            .map(|s| s.rows[0].1.len())
            .ok_or(ExtractError::Empty("projected band rows"))?;
        if ncols < 3 {
            return Err(ExtractError::MissingField("orbital weights"));
        }
        let nweights = ncols - 2;

        let orbitals = match header {
            Some(names) if names.len() == nweights => names,
            _ => (0 .. nweights)
                .map(|i| DEFAULT_ORBITALS.get(i)
                     .map(|s| s.to_string())
                     .unwrap_or_else(|| format!("w{}", i + 1)))
                .collect(),
        };

        let bands = sections.into_iter()
            .map(|s| s.into_band(nweights))
            .collect::<ExtractResult<Vec<_>>>()?;

        Ok(Self { orbitals, bands })
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: &str = "\
#K-Path          Energy      s      py      pz      px     tot
# Band-Index    1
   0.00000   -1.00000  0.400  0.000  0.100  0.000  0.500
   1.00000   -0.50000  0.200  0.000  0.200  0.000  0.400

# Band-Index    2
   0.00000    0.50000  0.000  0.100  0.300  0.000  0.400
   1.00000    3.00000  0.000  0.000  0.900  0.000  0.900
";

    #[test]
    fn test_parse_pband() {
        let pb: ProjectedBands = SAMPLE.parse().unwrap();
        assert_eq!(pb.orbitals, vec!["s", "py", "pz", "px", "tot"]);
        assert_eq!(pb.nbands(), 2);
        assert_eq!(pb.bands[1].index, 2);
        assert_eq!(pb.bands[1].energies.to_vec(), vec![0.5, 3.0]);
        assert_eq!(pb.bands[0].weights[[1, 2]], 0.2);
    }

    #[test]
    fn test_default_orbital_names() {
        let pb: ProjectedBands = "0.0 -1.0 0.1 0.2 0.3 0.4\n0.1 -0.9 0.1 0.2 0.3 0.4\n".parse().unwrap();
        assert_eq!(pb.orbitals, vec!["s", "py", "pz", "px"]);
        assert_eq!(pb.bands.len(), 1);
        assert_eq!(pb.bands[0].index, 1);
    }

    #[test]
    fn test_ragged_section() {
        let txt = "# Band-Index 1\n0.0 -1.0 0.1 0.2\n0.1 -1.0 0.1\n";
        assert!(matches!(txt.parse::<ProjectedBands>(), Err(ExtractError::MalformedRow { line: 3, .. })));
    }

    #[test]
    fn test_orbital_contributions() {
        let pb: ProjectedBands = SAMPLE.parse().unwrap();

        // |E| < 2 keeps three samples, k = 1.0 of band 2 is out of the energy window
        let contrib = pb.orbital_contributions(0.5, 2.0, 0.0, 2.0).unwrap();
        assert_eq!(contrib.keys().collect::<Vec<_>>(), vec!["s", "py", "pz", "px"]);
        // means: s = 0.6/3, py = 0.1/3, pz = 0.6/3, px = 0
        assert_relative_eq!(contrib["s"],  100.0 * 0.6 / 1.3, epsilon = 1e-10);
        assert_relative_eq!(contrib["py"], 100.0 * 0.1 / 1.3, epsilon = 1e-10);
        assert_relative_eq!(contrib["px"], 0.0);

        assert!(pb.orbital_contributions(10.0, 1.0, 0.0, 2.0).is_err());
    }

    #[test]
    fn test_zero_weights_in_window() {
        let txt = "\
#K-Path          Energy      s      py      pz      px     tot
# Band-Index    1
   0.00000   -0.10000  0.000  0.000  0.000  0.000  0.000
   1.00000    0.20000  0.000  0.000  0.000  0.000  0.000
";
        let pb: ProjectedBands = txt.parse().unwrap();
        let ret = pb.orbital_contributions(0.5, 2.0, 0.0, 1.0);
        assert!(matches!(ret, Err(ExtractError::Empty(_))));
    }
}
