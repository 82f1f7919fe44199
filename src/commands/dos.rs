use std::path::{
    Path,
    PathBuf,
};

use anyhow::bail;
use clap::Args;
use log::{
    info,
    warn,
};
use ndarray::Array1;
use plotly::{
    Layout,
    Plot,
    Scatter,
    common::{
        Line,
        Mode,
        Title,
    },
};

use crate::{
    types::Result,
    OptProcess,
    commands::common::{
        save_plot,
        vline,
        write_array_to_txt,
    },
    vasp_parsers::{
        dos::{
            DosTable,
            PdosChannels,
        },
        fermi::fermi_from_file,
    },
};


#[derive(Debug, Args)]
/// Plot total and orbital projected DOS reformatted by VASPKIT.
///
/// The PDOS layout is guessed from its column count: 8 columns or more are spin polarized
/// (only spin up channels are taken), 5 to 7 columns are non spin polarized.
pub struct Dos {
    #[arg(long, default_value = "TDOS.dat")]
    /// Total DOS file.
    tdos: PathBuf,

    #[arg(long, default_value = "PDOS_USER.dat")]
    /// Projected DOS file, columns are `energy s py pz px ...`.
    pdos: PathBuf,

    #[arg(long, default_value = "FERMI_ENERGY")]
    /// File holding the Fermi energy, 0.0 eV is used if it is missing.
    fermi: PathBuf,

    #[arg(long, num_args = 2, allow_negative_numbers = true)]
    /// Energy range of the plot, in eV. The whole range is shown if omitted.
    erange: Option<Vec<f64>>,

    #[arg(long, default_value = "dos.html")]
    /// Write the plot to html and view it in the web browser.
    htmlout: PathBuf,

    #[arg(long, default_value = "dos.txt")]
    /// Write the raw plot data as txt file in order to replot it with more advanced tools.
    txtout: PathBuf,

    #[arg(long)]
    /// Open default browser to see the plot immediately.
    show: bool,
}


fn read_optional(path: &Path, what: &str) -> Option<DosTable> {
    match DosTable::from_file(path) {
        Ok(t) => {
            info!("Read {} with {} samples and {} columns from {:?}", what, t.len(), t.ncols(), path);
            Some(t)
        },
        Err(e) => {
            warn!("Cannot read {}: {}", what, e);
            None
        },
    }
}


impl OptProcess for Dos {
    fn process(&self) -> Result<()> {
        let efermi = match fermi_from_file(&self.fermi) {
            Ok(e) => e,
            Err(e) => {
                warn!("{}, Fermi energy is set to 0.0 eV.", e);
                0.0
            },
        };
        info!("Fermi energy: {} eV", efermi);

        let tdos = read_optional(&self.tdos, "total DOS");
        let pdos = read_optional(&self.pdos, "projected DOS");
        if tdos.is_none() && pdos.is_none() {
            bail!("Neither {:?} nor {:?} is readable.", self.tdos, self.pdos);
        }
        let channels = pdos.as_ref().map(|p| {
            let c = PdosChannels::from_table(p);
            info!("PDOS layout: {}", c.layout);
            c
        });

        let mut plot = Plot::new();
        let mut columns: Vec<Array1<f64>> = vec![];
        let mut header: Vec<String> = vec![];

        if let Some(t) = tdos.as_ref() {
            let total = t.total();
            plot.add_trace(Scatter::new(t.energies.to_vec(), total.to_vec())
                           .mode(Mode::Lines)
                           .line(Line::new().color("black"))
                           .name("Total DOS"));
            columns.push(t.energies.clone());
            columns.push(total);
            header.push("Energy(eV)".to_owned());
            header.push("TDOS".to_owned());
        }

        if let (Some(p), Some(c)) = (pdos.as_ref(), channels) {
            let aligned = columns.first().map_or(true, |e| e.len() == p.len());
            if columns.is_empty() {
                columns.push(p.energies.clone());
                header.push("Energy(eV)".to_owned());
            }
            for (name, y) in c.channels() {
                plot.add_trace(Scatter::new(p.energies.to_vec(), y.to_vec())
                               .mode(Mode::Lines)
                               .name(&format!("{}-orbital", name)));
                if aligned {
                    columns.push(y);
                    header.push(name.to_owned());
                }
            }
            if !aligned {
                warn!("TDOS and PDOS have different energy grids, PDOS is not written to {:?}", self.txtout);
            }
        }

        info!("Writing raw plot data to {:?}", self.txtout);
        write_array_to_txt(&self.txtout, columns.iter().collect(), &header.join("  "))?;

        let mut x_axis = plotly::layout::Axis::new()
            .title(Title::with_text("Energy (eV)"));
        if let Some(&[lo, hi]) = self.erange.as_deref() {
            x_axis = x_axis.range(vec![lo, hi]);
        }
        let mut layout = Layout::new()
            .title(Title::with_text("Density of states"))
            .x_axis(x_axis)
            .y_axis(plotly::layout::Axis::new()
                    .title(Title::with_text("DOS (states/eV)")));
        layout.add_shape(vline(efermi, "red"));
        plot.set_layout(layout);

        save_plot(&plot, &self.htmlout, self.show);

        Ok(())
    }
}
