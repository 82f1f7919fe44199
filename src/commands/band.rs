use std::path::PathBuf;

use clap::Args;
use log::info;
use plotly::{
    Layout,
    Plot,
    Scatter,
    common::{
        Marker,
        Mode,
        Title,
    },
};

use crate::{
    types::Result,
    OptProcess,
    commands::common::{
        hline,
        kpath_axis,
        read_klabels_or_empty,
        save_plot,
    },
    vasp_parsers::band::BandStructure,
};


#[derive(Debug, Args)]
/// Plot the band structure reformatted by VASPKIT, with high symmetry points as ticks.
///
/// The energies are expected to be already shifted to the Fermi level.
pub struct Band {
    #[arg(default_value = "REFORMATTED_BAND.dat")]
    /// Band structure file, the first column is the k-path, the others are band energies.
    bandfile: PathBuf,

    #[arg(long, default_value = "KLABELS")]
    /// High symmetry points file written by VASPKIT, optional.
    klabels: PathBuf,

    #[arg(long, num_args = 2, default_values_t = vec![-20.0, 20.0], allow_negative_numbers = true)]
    /// Energy range of the plot, in eV.
    erange: Vec<f64>,

    #[arg(long, default_value = "band.html")]
    /// Write the plot to html and view it in the web browser.
    htmlout: PathBuf,

    #[arg(long)]
    /// Open default browser to see the plot immediately.
    show: bool,
}


impl OptProcess for Band {
    fn process(&self) -> Result<()> {
        info!("Reading band structure from {:?}", self.bandfile);
        let band = BandStructure::from_file(&self.bandfile)?;
        info!("Found {} k-points and {} bands", band.nkpoints(), band.nbands());

        let klabels = read_klabels_or_empty(&self.klabels);

        let kpath = band.kpath.to_vec();
        let mut plot = Plot::new();
        for (iband, eig) in band.eigs.columns().into_iter().enumerate() {
            let trace = Scatter::new(kpath.clone(), eig.to_vec())
                .mode(Mode::Markers)
                .marker(Marker::new().size(3).color("black"))
                .name(&format!("Band {}", iband + 1))
                .show_legend(false);
            plot.add_trace(trace);
        }

        let (shapes, x_axis) = kpath_axis(&klabels);
        let mut layout = Layout::new()
            .title(Title::with_text("Band structure"))
            .x_axis(x_axis.range(vec![band.kpath[0], band.kpath[band.nkpoints() - 1]]))
            .y_axis(plotly::layout::Axis::new()
                    .title(Title::with_text("E-E<sub>f</sub> (eV)"))
                    .range(self.erange.clone()));
        for s in shapes {
            layout.add_shape(s);
        }
        layout.add_shape(hline(0.0, "red"));
        plot.set_layout(layout);

        save_plot(&plot, &self.htmlout, self.show);

        Ok(())
    }
}
