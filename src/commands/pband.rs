use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use colored::Colorize;
use log::info;
use plotly::{
    Bar,
    Layout,
    Plot,
    Scatter,
    common::{
        Line,
        Marker,
        Mode,
        Title,
    },
};

use crate::{
    types::Result,
    OptProcess,
    analysis::{
        TargetSource,
        locate_target,
    },
    commands::common::{
        SettingsArgs,
        hline,
        kpath_axis,
        read_klabels_or_empty,
        save_plot,
    },
    vasp_parsers::{
        klabels::KLabels,
        pband::ProjectedBands,
    },
};


const COLORS: &[&str] = &["red", "green", "purple", "blue", "orange", "brown", "teal", "olive", "gray"];


#[derive(Debug, Args)]
/// Plot orbital projected bands (`PBAND_*.dat` of VASPKIT) and compute the orbital
/// contributions around a high symmetry point.
///
/// Marker size of each orbital is proportional to its weight.
pub struct Pband {
    #[arg(default_value = "PBAND_C.dat")]
    /// Projected band file, sections are separated by `# Band-Index N` lines.
    pbandfile: PathBuf,

    #[arg(long, default_value = "KLABELS")]
    /// High symmetry points file written by VASPKIT, optional.
    klabels: PathBuf,

    #[arg(long, num_args = 1..)]
    /// Labels accepted as the target point, e.g. `--labels K H`. Read from settings if omitted.
    labels: Option<Vec<String>>,

    #[arg(long)]
    /// Samples within this distance to the target point along the k-path are averaged.
    k_range: Option<f64>,

    #[arg(long)]
    /// Samples within this distance to the Fermi level are averaged, in eV.
    e_range: Option<f64>,

    #[arg(long, default_value_t = 20.0)]
    /// Marker size of an orbital with weight 1.0.
    scale: f64,

    #[arg(long, num_args = 2, default_values_t = vec![-20.0, 10.0], allow_negative_numbers = true)]
    /// Energy range of the plot, in eV.
    erange: Vec<f64>,

    #[arg(long, default_value = "pband.html")]
    /// Write the projected band plot to html.
    htmlout: PathBuf,

    #[arg(long, default_value = "pband_contrib.html")]
    /// Write the bar chart of orbital contributions to html.
    contribout: PathBuf,

    #[arg(long)]
    /// Open default browser to see the plots immediately.
    show: bool,

    #[command(flatten)]
    settings: SettingsArgs,
}


impl Pband {
    fn plot_bands(&self, pband: &ProjectedBands, klabels: &KLabels) {
        let mut plot = Plot::new();

        for band in pband.bands.iter() {
            plot.add_trace(Scatter::new(band.kpath.to_vec(), band.energies.to_vec())
                           .mode(Mode::Lines)
                           .line(Line::new().color("black").width(0.5))
                           .opacity(0.3)
                           .name(&format!("Band {}", band.index))
                           .show_legend(false));
        }

        for (iorb, name) in pband.orbitals.iter().enumerate() {
            if name.eq_ignore_ascii_case("tot") {
                continue;
            }
            let color = COLORS[iorb % COLORS.len()];

            let mut x = vec![];
            let mut y = vec![];
            let mut size = vec![];
            for band in pband.bands.iter() {
                x.extend(band.kpath.iter().copied());
                y.extend(band.energies.iter().copied());
                size.extend(band.weights.column(iorb).iter()
                            .map(|w| (w.max(0.0) * self.scale).round() as usize));
            }

            plot.add_trace(Scatter::new(x, y)
                           .mode(Mode::Markers)
                           .marker(Marker::new().size_array(size).color(color).opacity(0.7))
                           .name(name));
        }

        let (shapes, x_axis) = kpath_axis(klabels);
        let mut layout = Layout::new()
            .title(Title::with_text("Orbital-projected band structure"))
            .x_axis(x_axis)
            .y_axis(plotly::layout::Axis::new()
                    .title(Title::with_text("E-E<sub>f</sub> (eV)"))
                    .range(self.erange.clone()));
        for s in shapes {
            layout.add_shape(s);
        }
        layout.add_shape(hline(0.0, "red"));
        plot.set_layout(layout);

        save_plot(&plot, &self.htmlout, self.show);
    }
}


impl OptProcess for Pband {
    fn process(&self) -> Result<()> {
        let settings = self.settings.load()?;
        let labels = self.labels.clone().unwrap_or(settings.dirac.labels);
        let k_range = self.k_range.unwrap_or(settings.pband.k_range);
        let e_range = self.e_range.unwrap_or(settings.pband.e_range);

        info!("Reading projected bands from {:?}", self.pbandfile);
        let pband = ProjectedBands::from_file(&self.pbandfile)?;
        info!("Found {} bands with orbitals {:?}", pband.nbands(), pband.orbitals);

        let klabels = read_klabels_or_empty(&self.klabels);
        self.plot_bands(&pband, &klabels);

        let kpath = pband.bands.first()
            .map(|b| b.kpath.to_vec())
            .unwrap_or_default();
        let (k_target, source) = locate_target(&klabels, &kpath, &labels);

        let contrib = pband.orbital_contributions(k_target, k_range, 0.0, e_range)
            .with_context(|| format!("No sample within {} of k = {:.4} and {} eV of the Fermi level.",
                                     k_range, k_target, e_range))?;

        let mut output = String::new();
        let at = match source {
            TargetSource::Label(l) => l,
            TargetSource::Midpoint => "k-path midpoint".to_owned(),
        };
        output.push_str(&format!(" Orbital contributions around {} (k = {:.4}, |dk| < {}, |E| < {} eV)\n",
                                 at.bright_green(), k_target, k_range, e_range));
        for (name, pct) in contrib.iter() {
            output.push_str(&format!("  {:>6}: {:>8}\n", name, format!("{:.2}%", pct).bright_cyan()));
        }
        println!("{}", output);

        let names = contrib.keys().cloned().collect::<Vec<String>>();
        let values = contrib.values().copied().collect::<Vec<f64>>();
        let mut plot = Plot::new();
        plot.add_trace(Bar::new(names, values).name("contribution"));
        plot.set_layout(Layout::new()
                        .title(Title::with_text("Orbital contributions"))
                        .x_axis(plotly::layout::Axis::new().title(Title::with_text("Orbitals")))
                        .y_axis(plotly::layout::Axis::new().title(Title::with_text("Contribution (%)"))));
        save_plot(&plot, &self.contribout, self.show);

        Ok(())
    }
}
