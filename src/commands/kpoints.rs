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
/// Check the convergence of total energy against k-point density.
///
/// Each calculation lives in its own directory, e.g. `KPOINTS_9/OUTCAR`. By default every
/// energy is compared with the one of the densest mesh.
pub struct Kpoints {
    #[command(flatten)]
    sweep: SweepArgs,

    #[command(flatten)]
    conv: ConvergenceArgs,

    #[arg(long, default_value = "kpoints.html")]
    /// Write the plot to html and view it in the web browser.
    htmlout: PathBuf,

    #[arg(long, default_value = "kpoints.txt")]
    /// Write the raw plot data as txt file in order to replot it with more advanced tools.
    txtout: PathBuf,

    #[arg(long)]
    /// Open default browser to see the plot immediately.
    show: bool,
}


impl OptProcess for Kpoints {
    fn process(&self) -> Result<()> {
        let (sweep, conv) = self.sweep.resolve(|c| &c.kpoints)?;
        let (threshold, criterion) = self.conv.resolve(&sweep, &conv);

        EnergySweep {
            name:    "KPOINTS",
            unit:    "k-mesh",
            htmlout: &self.htmlout,
            txtout:  &self.txtout,
            show:    self.show,
        }.run(&self.sweep.root, &sweep, threshold, criterion)?;

        Ok(())
    }
}
