use std::path::PathBuf;

use anyhow::{
    Context,
    anyhow,
};
use clap::Args;
use colored::Colorize;
use log::info;
use ndarray::Array1;
use plotly::{
    Layout,
    Plot,
    Scatter,
    common::{
        Mode,
        Title,
    },
};

use crate::{
    types::{
        Result,
        Axis,
    },
    OptProcess,
    analysis::vacuum_level,
    commands::common::{
        SettingsArgs,
        hline,
        save_plot,
        vrect,
        write_array_to_txt,
    },
    vasp_parsers::{
        chg::Potential,
        outcar::Outcar,
    },
};


#[derive(Debug, Args)]
/// Calculate work-function from LOCPOT file, OUTCAR is also needed to get the Fermi level.
///
/// The potential is averaged over the plane perpendicular to the selected axis. The vacuum
/// level is the mean of this average inside the vacuum region, given in fractional coordinates.
pub struct Workfunc {
    #[arg(default_value = "LOCPOT")]
    /// LOCPOT file path. Turn on 'LVHAR' in INCAR to get the electro-static potential saved it.
    locpot: PathBuf,

    #[arg(long, default_value = "OUTCAR")]
    /// OUTCAR file path. This file is needed to get the E-fermi level.
    outcar: PathBuf,

    #[arg(long, value_enum, ignore_case = true)]
    /// Averaging direction. e.g. if 'z' is provided, the XoY plane is averaged. Default is 'z'.
    axis: Option<Axis>,

    #[arg(long, num_args = 2)]
    /// Fractional bounds of the vacuum region along the axis, e.g. `--vacuum 0.6 0.9`.
    vacuum: Option<Vec<f64>>,

    #[arg(long, default_value = "workfunc.html")]
    /// Write the plot to html and view it in the web browser.
    htmlout: PathBuf,

    #[arg(long, default_value = "workfunc.txt")]
    /// Write the raw plot data as txt file in order to replot it with more advanced tools.
    txtout: PathBuf,

    #[arg(long)]
    /// Open default browser to see the plot immediately.
    show: bool,

    #[command(flatten)]
    settings: SettingsArgs,
}


impl OptProcess for Workfunc {
    fn process(&self) -> Result<()> {
        let settings = self.settings.load()?.workfunc;
        let axis = self.axis.unwrap_or(settings.axis);
        let region = match self.vacuum.as_deref() {
            Some(&[lo, hi]) => [lo, hi],
            _ => settings.vacuum_region,
        };

        let mut locpot: Result<Potential> = Err(anyhow!(""));
        let mut outcar: Result<Outcar> = Err(anyhow!(""));

        rayon::scope(|s| {
            s.spawn(|_| {
                info!("Reading electro-static potential data from {:?}", &self.locpot);
                locpot = Potential::from_file(&self.locpot).map_err(Into::into);
            });
            s.spawn(|_| {
                info!("Reading {:?}", &self.outcar);
                outcar = Outcar::from_file(&self.outcar).map_err(Into::into);
            });
        });

        let locpot = locpot.with_context(|| format!("Parse file {:?} failed.", self.locpot))?;
        let outcar = outcar.with_context(|| format!("Parse file {:?} failed.", self.outcar))?;

        let efermi = outcar.efermi()
            .with_context(|| format!("No E-fermi in {:?}", self.outcar))?;
        info!("Grid size: {:?}, E-fermi: {} eV", locpot.ngrid, efermi);

        let potential = locpot.planar_average(axis);
        let n = potential.len();
        let axislen = locpot.axis_length(axis);
        let frac = Array1::linspace(0.0, 1.0, n);
        let distance = &frac * axislen;

        let vacuum = vacuum_level(frac.as_slice().unwrap_or(&[]),
                                  potential.as_slice().unwrap_or(&[]), region)
            .with_context(|| format!("Invalid vacuum region {:?} for {} grid points", region, n))?;
        let workfunc = vacuum - efermi;

        println!(" Vacuum level in region {:?} along {}: {} eV\n E-fermi: {} eV\n Work function: {} eV",
                 region, axis,
                 format!("{:.6}", vacuum).bright_blue(),
                 format!("{:.6}", efermi).bright_blue(),
                 format!("{:.6}", workfunc).bright_cyan());

        info!("Writing raw plot data to {:?}", self.txtout);
        write_array_to_txt(&self.txtout, vec![&distance, &frac, &potential],
                           "Distance(A)  Fractional  Potential(eV)")?;

        let trace = Scatter::new(distance.to_vec(), potential.to_vec())
            .mode(Mode::Lines)
            .name("Planar averaged potential");

        let mut plot = Plot::new();
        plot.add_trace(trace);

        let mut layout = Layout::new()
            .title(Title::with_text(&format!("Work function along {} axis: {:.4} eV", axis, workfunc)))
            .y_axis(plotly::layout::Axis::new()
                    .title(Title::with_text("Electrostatic potential (eV)"))
                    .zero_line(true))
            .x_axis(plotly::layout::Axis::new()
                    .title(Title::with_text("Distance (Å)"))
                    .zero_line(true));
        layout.add_shape(vrect(region[0] * axislen, region[1] * axislen));
        layout.add_shape(hline(efermi, "red"));
        layout.add_shape(hline(vacuum, "green"));
        plot.set_layout(layout);

        save_plot(&plot, &self.htmlout, self.show);

        Ok(())
    }
}
