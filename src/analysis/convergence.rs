//! Convergence sweeps: one calculation per parameter value, one scalar extracted from each.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use log::{
    info,
    warn,
};
use rayon::prelude::*;
use serde::{
    Serialize,
    Deserialize,
};

use crate::error::ExtractResult;


#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Two neighbouring parameters give values closer than the threshold.
    #[default]
    Adjacent,
    /// The value is closer than the threshold to the one of the largest parameter.
    Reference,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Adjacent  => write!(f, "adjacent"),
            Criterion::Reference => write!(f, "reference"),
        }
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct SweepPoint {
    pub parameter: f64,
    /// `None` marks a calculation whose result is missing or unreadable.
    pub value:     Option<f64>,
}


/// Directory of one calculation, `{}` in `pattern` is replaced by the parameter value.
///
/// `format_parameter(300.0) == "300"`, `format_parameter(0.97) == "0.97"`.
pub fn sweep_dir(root: &Path, pattern: &str, parameter: f64) -> PathBuf {
    root.join(pattern.replace("{}", &format_parameter(parameter)))
}


pub fn format_parameter(parameter: f64) -> String {
    format!("{}", parameter)
}


/// Run `extract` on each parameter's directory, in parallel. Failures become missing values.
///
/// The result is sorted by parameter, ascending.
pub fn collect_sweep<F>(root: &Path, pattern: &str, parameters: &[f64], extract: F) -> Vec<SweepPoint>
where
    F: Fn(&Path) -> ExtractResult<f64> + Sync,
{
    let mut points = parameters.par_iter()
        .map(|&parameter| {
            let dir = sweep_dir(root, pattern, parameter);
            let value = match extract(&dir) {
                Ok(v) => {
                    info!("Parameter {:>8}: {:.6} from {:?}", format_parameter(parameter), v, dir);
                    Some(v)
                },
                Err(e) => {
                    warn!("Parameter {:>8}: no result, {}", format_parameter(parameter), e);
                    None
                },
            };
            SweepPoint { parameter, value }
        })
        .collect::<Vec<SweepPoint>>();

    points.sort_by(|a, b| a.parameter.total_cmp(&b.parameter));
    points
}


/// Index of the first converged point, scanning from the smallest parameter.
///
/// Points must be sorted by parameter. `None` means not converged in the tested range.
pub fn find_convergence(points: &[SweepPoint], threshold: f64, criterion: Criterion) -> Option<usize> {
    match criterion {
        Criterion::Adjacent => {
            points.windows(2)
                .position(|w| match (w[0].value, w[1].value) {
                    (Some(a), Some(b)) => (b - a).abs() < threshold,
                    _ => false,
                })
                .map(|i| i + 1)
        },
        Criterion::Reference => {
            let reference = points.iter().rev().find_map(|p| p.value)?;
            points.iter()
                .position(|p| p.value.map_or(false, |v| (v - reference).abs() < threshold))
        },
    }
}


/// Differences used by `criterion` at each point, for reporting.
///
/// For `Adjacent` the first point has no difference, for `Reference` the point itself is
/// compared with the reference value.
pub fn differences(points: &[SweepPoint], criterion: Criterion) -> Vec<Option<f64>> {
    match criterion {
        Criterion::Adjacent => {
            std::iter::once(None)
                .chain(points.windows(2)
                       .map(|w| match (w[0].value, w[1].value) {
                           (Some(a), Some(b)) => Some((b - a).abs()),
                           _ => None,
                       }))
                .take(points.len())
                .collect()
        },
        Criterion::Reference => {
            let reference = points.iter().rev().find_map(|p| p.value);
            points.iter()
                .map(|p| match (p.value, reference) {
                    (Some(v), Some(r)) => Some((v - r).abs()),
                    _ => None,
                })
                .collect()
        },
    }
}
