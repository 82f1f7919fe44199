//! High symmetry points written by VASPKIT, usually named `KLABELS`:
//!
//! ```text
//! K-Label    K-Coordinate in band-structure plots
//! GAMMA              0.000
//! M                  1.475
//! K                  2.327
//! GAMMA              4.030
//!
//! * Give the label for each high symmetry point in KPOINTS (KPATH.in) file. Otherwise, they will be identified as 'Undefined' in KLABELS file
//! ```

use std::{
    path::Path,
    str::FromStr,
};

use log::debug;

use crate::error::{
    ExtractError,
    ExtractResult,
    read_to_string,
};


const HEADER_MARKERS: &[&str] = &["K-Label", "Coordinate"];


#[derive(Clone, Debug, Default, PartialEq)]
pub struct KLabels {
    pub labels: Vec<String>,
    pub coords: Vec<f64>,
}


impl KLabels {
    pub fn from_file(path: &(impl AsRef<Path> + ?Sized)) -> ExtractResult<Self> {
        read_to_string(path)?.parse()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels.iter()
            .map(String::as_str)
            .zip(self.coords.iter().copied())
    }

    /// First point whose label equals one of `candidates`, ignoring case.
    pub fn find<S: AsRef<str>>(&self, candidates: &[S]) -> Option<(&str, f64)> {
        self.iter()
            .find(|(l, _)| candidates.iter().any(|c| c.as_ref().eq_ignore_ascii_case(l)))
    }

    /// Labels ready to be used as axis ticks, Gamma point rendered as 'Γ'.
    pub fn display_labels(&self) -> Vec<String> {
        self.labels.iter()
            .map(|l| match l.to_ascii_lowercase().as_str() {
                "gamma" | "g" => "Γ".to_owned(),
                _ => l.clone(),
            })
            .collect()
    }
}


impl FromStr for KLabels {
    type Err = ExtractError;

    /// Never fails, malformed lines are skipped and an empty result is valid.
    fn from_str(txt: &str) -> ExtractResult<Self> {
        let mut lines = txt.lines().enumerate().peekable();

        if let Some((_, first)) = lines.peek() {
            if HEADER_MARKERS.iter().any(|m| first.contains(m)) {
                lines.next();
            }
        }

        let mut ret = Self::default();
        for (i, line) in lines {
            let tokens = line.split_whitespace().collect::<Vec<_>>();
            if tokens.len() < 2 {
                continue;
            }

            let label = tokens[0].replace('\\', "");
            match tokens[tokens.len() - 1].parse::<f64>() {
                Ok(coord) => {
                    ret.labels.push(label);
                    ret.coords.push(coord);
                },
                Err(_) => debug!("KLABELS: skip line {}: {:?}", i + 1, line),
            }
        }

        Ok(ret)
    }
}
