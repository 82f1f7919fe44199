use std::path::PathBuf;

use clap::Args;

use crate::{
    types::Result,
    OptProcess,
    commands::sweep::{
        ConvergenceArgs,
        EnergySweep,
        SweepArgs,
    },
};


#[derive(Debug, Args)]
/// Check the convergence of total energy against ENCUT.
///
/// Each calculation lives in its own directory, e.g. `Encut_300/OUTCAR`. The final TOTEN of
/// each OUTCAR is compared, missing or broken calculations are reported and skipped.
pub struct Encut {
    #[command(flatten)]
    sweep: SweepArgs,

    #[command(flatten)]
    conv: ConvergenceArgs,

    #[arg(long, default_value = "encut.html")]
    /// Write the plot to html and view it in the web browser.
    htmlout: PathBuf,

    #[arg(long, default_value = "encut.txt")]
    /// Write the raw plot data as txt file in order to replot it with more advanced tools.
    txtout: PathBuf,

    #[arg(long)]
    /// Open default browser to see the plot immediately.
    show: bool,
}


impl OptProcess for Encut {
    fn process(&self) -> Result<()> {
        let (sweep, conv) = self.sweep.resolve(|c| &c.encut)?;
        let (threshold, criterion) = self.conv.resolve(&sweep, &conv);

        EnergySweep {
            name:    "ENCUT",
            unit:    "eV",
            htmlout: &self.htmlout,
            txtout:  &self.txtout,
            show:    self.show,
        }.run(&self.sweep.root, &sweep, threshold, criterion)?;

        Ok(())
    }
}
