pub mod table;
pub mod klabels;
pub mod band;
pub mod pband;
pub mod dos;
pub mod fermi;
pub mod outcar;
pub mod poscar;
pub mod chg;
