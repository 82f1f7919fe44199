use std::{
    path::Path,
    str::FromStr,
};

use regex::Regex;

use crate::error::{
    ExtractError,
    ExtractResult,
    read_to_string,
};


/// The few scalars of OUTCAR needed by the post-processing commands.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcar {
    pub efermi:  Option<f64>,
    pub toten:   Vec<f64>,     // free energy TOTEN of each ionic step
}


impl Outcar {
    pub fn from_file(path: &(impl AsRef<Path> + ?Sized)) -> ExtractResult<Self> {
        read_to_string(path)?.parse()
    }

    /// TOTEN of the last ionic step.
    pub fn final_toten(&self) -> Option<f64> {
        self.toten.last().copied()
    }

    pub fn efermi(&self) -> ExtractResult<f64> {
        self.efermi.ok_or(ExtractError::MissingField("E-fermi"))
    }

    fn parse_toten(context: &str) -> Vec<f64> {
        Regex::new(r"free  energy   TOTEN  = \s*([-+]?[0-9]+[.]?[0-9]*([eE][-+]?[0-9]+)?) eV")
            .expect("valid regex")
            .captures_iter(context)
            .filter_map(|x| x[1].parse::<f64>().ok())
            .collect()
    }

    /// The last E-fermi, the earlier ones belong to unconverged ionic steps.
    fn parse_efermi(context: &str) -> Option<f64> {
        Regex::new(r" E-fermi : \s+([-+]?[0-9]+[.]?[0-9]*)")
            .expect("valid regex")
            .captures_iter(context)
            .last()
            .and_then(|x| x[1].parse::<f64>().ok())
    }
}


impl FromStr for Outcar {
    type Err = ExtractError;

    fn from_str(context: &str) -> ExtractResult<Self> {
        let ret = Self {
            efermi:  Self::parse_efermi(context),
            toten:   Self::parse_toten(context),
        };

        if ret.efermi.is_none() && ret.toten.is_empty() {
            return Err(ExtractError::Empty("neither E-fermi nor TOTEN in OUTCAR"));
        }
        Ok(ret)
    }
}
