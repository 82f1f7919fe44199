//! `FERMI_ENERGY` file written by VASPKIT. Its content varies between versions, from a bare
//! number to a commented line like `# E-fermi : -2.3164 eV`, so it is parsed permissively.

use std::path::Path;

use log::warn;
use regex::Regex;

use crate::error::{
    ExtractResult,
    read_to_string,
};


pub fn read_fermi_energy(content: &str) -> f64 {
    let content = content.trim();

    if let Ok(v) = content.parse::<f64>() {
        return v;
    }

    let number = Regex::new(r"[-+]?\d*\.\d+|\d+").expect("valid regex");
    if let Some(v) = number.find(content).and_then(|m| m.as_str().parse::<f64>().ok()) {
        return v;
    }

    if let Some(v) = content.lines().last().and_then(|l| l.trim().parse::<f64>().ok()) {
        return v;
    }

    warn!("Cannot extract Fermi energy from {:?}, 0.0 eV is used instead.", content);
    0.0
}


/// Missing file is reported as an error, the caller decides the fallback value.
pub fn fermi_from_file(path: &(impl AsRef<Path> + ?Sized)) -> ExtractResult<f64> {
    Ok(read_fermi_energy(&read_to_string(path)?))
}
