use std::sync::OnceLock;
use clap::{
    Parser,
    builder::styling::{
        AnsiColor,
        Effects,
        Styles,
    },
};
use enum_dispatch::enum_dispatch;

use crate::{
    types::Result,
    commands::{
        band::Band,
        pband::Pband,
        dirac::Dirac,
        dos::Dos,
        workfunc::Workfunc,
        encut::Encut,
        kpoints::Kpoints,
        lattice::Lattice,
        config::Config,
    },
};


pub fn get_style() -> Styles {
    static INSTANCE: OnceLock<Styles> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        Styles::styled()
            .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
            .usage(AnsiColor::Green.on_default()   | Effects::BOLD)
            .literal(AnsiColor::Green.on_default() | Effects::BOLD)
            .placeholder(AnsiColor::BrightBlue.on_default())
            .error(AnsiColor::BrightRed.on_default())
            .valid(AnsiColor::BrightYellow.on_default())
    }).to_owned()
}


#[enum_dispatch]
pub trait OptProcess {
    fn process(&self) -> Result<()>;
}


#[enum_dispatch(OptProcess)]
#[derive(Debug, Parser)]
#[command(name = "rsband",
            about = r"Post-process VASP and VASPKIT outputs: bands, DOS, work function and convergence tests.",
            version,
            styles = get_style()
            )]
enum Opt {
    Band,

    Pband,

    Dirac,

    Dos,

    Workfunc,

    Encut,

    Kpoints,

    Lattice,

    Config,
}


pub fn run() -> Result<()> {
    Opt::parse().process()
}
