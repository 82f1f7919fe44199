use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use colored::Colorize;
use indexmap::IndexMap;
use itertools::Itertools;
use log::{
    info,
    warn,
};
use ndarray::{
    Array1,
    s,
};
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
    analysis::{
        TargetSource,
        channel_contributions,
        closest_bands,
        locate_target,
        nearest_index,
        trapz_window,
        window_range,
    },
    commands::common::{
        SettingsArgs,
        hline,
        read_klabels_or_empty,
        save_plot,
        vline,
        vrect,
        write_array_to_txt,
    },
    vasp_parsers::{
        band::BandStructure,
        dos::{
            DosTable,
            PdosChannels,
        },
    },
};


#[derive(Debug, Args)]
/// Analyze the bands crossing the Fermi level around a high symmetry point, e.g. the
/// Dirac cone of graphene at K.
///
/// The bands closest to the Fermi level at the target point are plotted in a window of
/// k-points around it. If TDOS and PDOS files are available, the orbital contributions
/// near the Fermi level are integrated as well.
pub struct Dirac {
    #[arg(default_value = "REFORMATTED_BAND.dat")]
    /// Band structure file, the first column is the k-path, the others are band energies.
    bandfile: PathBuf,

    #[arg(long, default_value = "KLABELS")]
    /// High symmetry points file written by VASPKIT, optional.
    klabels: PathBuf,

    #[arg(long, default_value = "TDOS.dat")]
    /// Total DOS file, optional.
    tdos: PathBuf,

    #[arg(long, default_value = "PDOS_USER.dat")]
    /// Projected DOS file, optional.
    pdos: PathBuf,

    #[arg(long, num_args = 1..)]
    /// Labels accepted as the target point, e.g. `--labels K H`. Read from settings if omitted.
    labels: Option<Vec<String>>,

    #[arg(long)]
    /// Number of k-points taken on each side of the target point.
    half_window: Option<usize>,

    #[arg(long)]
    /// Number of bands closest to the Fermi level to analyze.
    nbands: Option<usize>,

    #[arg(long, num_args = 2, allow_negative_numbers = true)]
    /// Energy window of the orbital contributions, in eV, e.g. `--ewindow -1 1`.
    ewindow: Option<Vec<f64>>,

    #[arg(long, default_value = "dirac_cone.html")]
    /// Write the band plot to html.
    htmlout: PathBuf,

    #[arg(long, default_value = "dirac_cone.txt")]
    /// Write the raw band data in the window as txt file.
    txtout: PathBuf,

    #[arg(long, default_value = "dos_contributions.html")]
    /// Write the DOS plot with the integrated window to html.
    doshtml: PathBuf,

    #[arg(long)]
    /// Open default browser to see the plots immediately.
    show: bool,

    #[command(flatten)]
    settings: SettingsArgs,
}


impl Dirac {
    fn dos_contributions(&self, ewindow: [f64; 2]) -> Result<()> {
        let tdos = DosTable::from_file(&self.tdos)
            .with_context(|| format!("Cannot read total DOS from {:?}", self.tdos))?;
        let pdos = DosTable::from_file(&self.pdos)
            .with_context(|| format!("Cannot read projected DOS from {:?}", self.pdos))?;
        info!("Read {} TDOS samples and {} PDOS samples", tdos.len(), pdos.len());

        let channels = PdosChannels::from_table(&pdos);
        info!("PDOS layout: {}", channels.layout);
        let channels = channels.channels()
            .into_iter()
            .map(|(n, v)| (n, v.to_vec()))
            .collect::<Vec<_>>();

        let total = tdos.total().to_vec();
        let etot = tdos.energies.to_vec();
        let epdos = pdos.energies.to_vec();
        let contrib: IndexMap<String, f64> = channel_contributions(
            &total, &etot, &channels, &epdos, ewindow[0], ewindow[1])?;

        let mut output = String::new();
        output.push_str(&format!(" DOS integral within [{}, {}] eV: {:.4}\n", ewindow[0], ewindow[1],
                                 trapz_window(&total, &etot, ewindow[0], ewindow[1])));
        for (name, pct) in contrib.iter() {
            output.push_str(&format!("  {:>6}-orbital: {:>8}\n", name, format!("{:.2}%", pct).bright_cyan()));
        }
        println!("{}", output);

        let mut plot = Plot::new();
        plot.add_trace(Scatter::new(etot, total)
                       .mode(Mode::Lines)
                       .line(Line::new().color("black"))
                       .name("Total DOS"));
        for (name, y) in channels.into_iter() {
            plot.add_trace(Scatter::new(epdos.clone(), y)
                           .mode(Mode::Lines)
                           .name(&format!("{}-orbital", name)));
        }

        let mut layout = Layout::new()
            .title(Title::with_text("Density of states and orbital contributions"))
            .x_axis(plotly::layout::Axis::new()
                    .title(Title::with_text("E-E<sub>f</sub> (eV)"))
                    .range(vec![-5.0, 5.0]))
            .y_axis(plotly::layout::Axis::new()
                    .title(Title::with_text("DOS (states/eV)")));
        layout.add_shape(vrect(ewindow[0], ewindow[1]));
        layout.add_shape(vline(0.0, "red"));
        plot.set_layout(layout);

        save_plot(&plot, &self.doshtml, self.show);
        Ok(())
    }
}


impl OptProcess for Dirac {
    fn process(&self) -> Result<()> {
        let settings = self.settings.load()?.dirac;
        let labels = self.labels.clone().unwrap_or(settings.labels);
        let half_window = self.half_window.unwrap_or(settings.half_window);
        let nbands = self.nbands.unwrap_or(settings.nbands);
        let ewindow = match self.ewindow.as_deref() {
            Some(&[lo, hi]) => [lo, hi],
            _ => settings.energy_window,
        };

        info!("Reading band structure from {:?}", self.bandfile);
        let band = BandStructure::from_file(&self.bandfile)?;
        let klabels = read_klabels_or_empty(&self.klabels);

        let kpath = band.kpath.to_vec();
        let (k_target, source) = locate_target(&klabels, &kpath, &labels);
        let ik = nearest_index(&kpath, k_target)
            .context("Empty k-path")?;
        let range = window_range(ik, half_window, band.nkpoints());

        let eigs_at_k = band.eigs.row(ik).to_vec();
        let ibands = closest_bands(&eigs_at_k, 0.0, nbands);
        info!("Bands closest to the Fermi level at k-point #{}: [{}]", ik + 1,
              ibands.iter().map(|i| i + 1).join(", "));

        let mut output = String::new();
        let at = match &source {
            TargetSource::Label(l) => l.clone(),
            TargetSource::Midpoint => "k-path midpoint".to_owned(),
        };
        output.push_str(&format!(" Target point {} at k = {:.4}, nearest sample #{} at k = {:.4}\n",
                                 at.bright_green(), k_target, ik + 1, kpath[ik]));
        for &ib in ibands.iter() {
            output.push_str(&format!("  Band {:4}: E = {} eV\n", ib + 1,
                                     format!("{:9.4}", eigs_at_k[ib]).bright_blue()));
        }
        if let &[b0, b1] = ibands.as_slice() {
            output.push_str(&format!("  Gap between the two bands at target: {} eV",
                                     format!("{:.4}", (eigs_at_k[b0] - eigs_at_k[b1]).abs()).bright_cyan()));
        }
        println!("{}", output);

        let kwin = band.kpath.slice(s![range.clone()]).to_owned();
        let cols = ibands.iter()
            .map(|&ib| band.eigs.slice(s![range.clone(), ib]).to_owned())
            .collect::<Vec<Array1<f64>>>();

        let mut data = vec![&kwin];
        data.extend(cols.iter());
        let header = std::iter::once("k-path".to_owned())
            .chain(ibands.iter().map(|ib| format!("Band_{}", ib + 1)))
            .join("  ");
        info!("Writing raw data to {:?}", self.txtout);
        write_array_to_txt(&self.txtout, data, &header)?;

        let mut plot = Plot::new();
        for (ib, col) in ibands.iter().zip(cols.iter()) {
            plot.add_trace(Scatter::new(kwin.to_vec(), col.to_vec())
                           .mode(Mode::Lines)
                           .name(&format!("Band {}", ib + 1)));
        }
        let mut layout = Layout::new()
            .title(Title::with_text(&format!("Band structure near {}", at)))
            .x_axis(plotly::layout::Axis::new().title(Title::with_text("k-path")))
            .y_axis(plotly::layout::Axis::new().title(Title::with_text("E-E<sub>f</sub> (eV)")));
        layout.add_shape(hline(0.0, "red"));
        layout.add_shape(vline(k_target, "gray"));
        plot.set_layout(layout);
        save_plot(&plot, &self.htmlout, self.show);

        if let Err(e) = self.dos_contributions(ewindow) {
            warn!("Orbital contributions skipped: {:#}", e);
        }

        Ok(())
    }
}
