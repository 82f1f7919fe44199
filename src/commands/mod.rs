pub mod common;
pub mod sweep;

pub mod band;
pub mod pband;
pub mod dirac;
pub mod dos;
pub mod workfunc;
pub mod encut;
pub mod kpoints;
pub mod lattice;
pub mod config;
