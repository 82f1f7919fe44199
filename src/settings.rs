//! Layered settings of rsband.
//!
//! Sources are merged in order, later ones win:
//!
//! 1. built-in defaults;
//! 2. `<config_dir>/rsband/config.toml` of current user, e.g. `~/.config/rsband/config.toml`;
//! 3. `./rsband.toml`;
//! 4. the file passed with `--config`;
//! 5. environment variables prefixed with `RSBAND_`, nested keys joined by `__`, e.g.
//!    `RSBAND_CONVERGENCE__THRESHOLD=0.002`.
//!
//! Command line flags override all of them.

use std::path::{
    Path,
    PathBuf,
};

use anyhow::{
    bail,
    Context,
};
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{
        Env,
        Format,
        Serialized,
        Toml,
    },
};
use log::debug;
use serde::{
    Serialize,
    Deserialize,
};

use crate::{
    analysis::convergence::Criterion,
    types::{
        Axis,
        Result,
    },
};


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    /// Parameter values, one calculation directory each.
    pub values:    Vec<f64>,
    /// Directory name of each calculation, `{}` is replaced by the value.
    pub pattern:   String,
    /// Only used by the total energy sweeps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criterion: Option<Criterion>,
}


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Convergence {
    /// Energy threshold in eV.
    pub threshold: f64,
    pub encut:     Sweep,
    pub kpoints:   Sweep,
    pub lattice:   Sweep,
}


impl Default for Convergence {
    fn default() -> Self {
        Self {
            threshold: 0.001,
            encut: Sweep {
                values:    vec![200.0, 250.0, 300.0, 350.0, 400.0, 450.0, 500.0, 550.0],
                pattern:   "Encut_{}".to_owned(),
                criterion: Some(Criterion::Adjacent),
            },
            kpoints: Sweep {
                values:    vec![3.0, 5.0, 7.0, 9.0, 11.0, 13.0, 15.0],
                pattern:   "KPOINTS_{}".to_owned(),
                criterion: Some(Criterion::Reference),
            },
            lattice: Sweep {
                values:    vec![0.97, 0.98, 0.99, 1.0, 1.01, 1.02, 1.03],
                pattern:   "Scale_{}".to_owned(),
                criterion: None,
            },
        }
    }
}


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dirac {
    /// Number of k-points taken on each side of the target point.
    pub half_window:   usize,
    /// Number of bands closest to the Fermi level.
    pub nbands:        usize,
    /// Energy window for the orbital contributions, in eV relative to the Fermi level.
    pub energy_window: [f64; 2],
    /// Labels of KLABELS accepted as the target point, case insensitive.
    pub labels:        Vec<String>,
}


impl Default for Dirac {
    fn default() -> Self {
        Self {
            half_window:   50,
            nbands:        2,
            energy_window: [-1.0, 1.0],
            labels:        ["K", "K$", "K1", "K2"].iter().map(|s| s.to_string()).collect(),
        }
    }
}


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pband {
    /// Samples with `|k - k_target| < k_range` are averaged.
    pub k_range: f64,
    /// Samples with `|E| < e_range` are averaged.
    pub e_range: f64,
}


impl Default for Pband {
    fn default() -> Self {
        Self { k_range: 2.0, e_range: 2.0 }
    }
}


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workfunc {
    /// Fractional bounds of the vacuum region along `axis`.
    pub vacuum_region: [f64; 2],
    pub axis:          Axis,
}


impl Default for Workfunc {
    fn default() -> Self {
        Self {
            vacuum_region: [0.6, 0.9],
            axis:          Axis::Z,
        }
    }
}


#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub convergence: Convergence,
    pub dirac:       Dirac,
    pub pband:       Pband,
    pub workfunc:    Workfunc,
}


impl Settings {
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "rsband")
            .map(|d| d.config_dir().join("config.toml"))
    }

    /// Every source but the built-in defaults is optional, except `extra` which must exist
    /// when given.
    pub fn figment(extra: Option<&Path>) -> Result<Figment> {
        let mut fig = Figment::from(Serialized::defaults(Settings::default()));

        if let Some(user) = Self::user_config_path() {
            debug!("Looking for user settings in {:?}", user);
            fig = fig.merge(Toml::file(user));
        }
        fig = fig.merge(Toml::file("rsband.toml"));

        if let Some(path) = extra {
            if !path.is_file() {
                bail!("Settings file {:?} not found.", path);
            }
            fig = fig.merge(Toml::file(path));
        }

        Ok(fig.merge(Env::prefixed("RSBAND_").split("__")))
    }

    pub fn load(extra: Option<&Path>) -> Result<Self> {
        Self::figment(extra)?
            .extract()
            .context("Invalid settings")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .context("Cannot render settings as TOML")
    }
}
