use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
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
        DashType,
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
        convergence::collect_sweep,
        parabola_minimum,
        polyfit2,
        polyval2,
    },
    commands::{
        common::{
            save_plot,
            vline,
            write_array_to_txt,
        },
        sweep::{
            SweepArgs,
            lattice_constant_in,
            toten_in,
        },
    },
};


#[derive(Debug, Args)]
/// Find the optimal lattice constant from a scale factor sweep.
///
/// Each calculation lives in its own directory, e.g. `Scale_0.98/{OUTCAR,CONTCAR}`. Total
/// energy is fitted against the lattice constant `|a1| * scale` with a parabola.
pub struct Lattice {
    #[command(flatten)]
    sweep: SweepArgs,

    #[arg(long, default_value = "lattice.html")]
    /// Write the plot to html and view it in the web browser.
    htmlout: PathBuf,

    #[arg(long, default_value = "lattice.txt")]
    /// Write the raw plot data as txt file in order to replot it with more advanced tools.
    txtout: PathBuf,

    #[arg(long)]
    /// Open default browser to see the plot immediately.
    show: bool,
}


/// Quadratic fit of the energies, with the optimum if the parabola opens upwards.
#[derive(Clone, Debug, PartialEq)]
pub struct LatticeFit {
    pub coeffs:  [f64; 3],
    pub optimum: Option<(f64, f64)>,    // (lattice constant, energy)
}


/// Fit needs more than three points.
pub fn fit_lattice(lattice: &[f64], energies: &[f64]) -> Option<LatticeFit> {
    if lattice.len() <= 3 {
        return None;
    }
    let coeffs = polyfit2(lattice, energies)?;
    let optimum = parabola_minimum(&coeffs).map(|a| (a, polyval2(&coeffs, a)));
    Some(LatticeFit { coeffs, optimum })
}


impl OptProcess for Lattice {
    fn process(&self) -> Result<()> {
        let (sweep, _) = self.sweep.resolve(|c| &c.lattice)?;
        let root = &self.sweep.root;

        info!("Reading lattice sweep {:?} in {:?}", sweep.pattern, root);
        let energies = collect_sweep(root, &sweep.pattern, &sweep.values, toten_in);
        let lattices = collect_sweep(root, &sweep.pattern, &sweep.values, lattice_constant_in);

        let mut output = String::new();
        output.push_str(&format!(" {:>8} {:>14} {:>16}\n", "Scale", "Lattice(A)", "TOTEN(eV)"));

        let mut valid: Vec<(f64, f64, f64)> = vec![];
        for (e, a) in energies.iter().zip(lattices.iter()) {
            match (a.value, e.value) {
                (Some(a_), Some(e_)) => {
                    output.push_str(&format!(" {:>8} {:>14.4} {:>16.6}\n", e.parameter, a_, e_));
                    valid.push((e.parameter, a_, e_));
                },
                _ => {
                    output.push_str(&format!(" {:>8} {:>14} {:>16}\n", e.parameter, "--", "--"));
                },
            }
        }

        let scales = valid.iter().map(|v| v.0).collect::<Array1<f64>>();
        let consts = valid.iter().map(|v| v.1).collect::<Array1<f64>>();
        let toten  = valid.iter().map(|v| v.2).collect::<Array1<f64>>();

        let fit = fit_lattice(consts.as_slice().unwrap_or(&[]), toten.as_slice().unwrap_or(&[]));
        match fit.as_ref().map(|f| f.optimum) {
            Some(Some((a, e))) => output.push_str(&format!(" Optimal lattice constant: {} A, E = {:.6} eV",
                                                         format!("{:.4}", a).bright_cyan(), e)),
            Some(None) => output.push_str(&format!(" The quadratic fit has {}", "no minimum".bright_yellow())),
            None => {
                warn!("Only {} valid points, more than 3 are needed for the quadratic fit.", valid.len());
                output.push_str(&format!(" {}", "Not enough points to fit".bright_yellow()));
            },
        }
        println!("{}", output);

        if valid.is_empty() {
            warn!("No valid calculation found, nothing to write.");
            return Ok(());
        }

        info!("Writing raw data to {:?}", self.txtout);
        write_array_to_txt(&self.txtout, vec![&scales, &consts, &toten], "Scale  Lattice(A)  TOTEN(eV)")?;

        let mut plot = Plot::new();
        plot.add_trace(Scatter::new(consts.to_vec(), toten.to_vec())
                       .mode(Mode::LinesMarkers)
                       .marker(Marker::new().size(8))
                       .name("TOTEN"));

        let mut layout = Layout::new()
            .title(Title::with_text("Lattice constant optimization"))
            .x_axis(plotly::layout::Axis::new().title(Title::with_text("Lattice Constant (Å)")))
            .y_axis(plotly::layout::Axis::new().title(Title::with_text("Total Energy (eV)")));

        if let Some(fit) = fit {
            let (lo, hi) = consts.iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
            let x = Array1::linspace(lo, hi, 100);
            let y = x.mapv(|a| polyval2(&fit.coeffs, a));
            plot.add_trace(Scatter::new(x.to_vec(), y.to_vec())
                           .mode(Mode::Lines)
                           .line(Line::new().dash(DashType::Dash))
                           .name("Quadratic fit"));
            if let Some((a, _)) = fit.optimum {
                layout.add_shape(vline(a, "red"));
            }
        }
        plot.set_layout(layout);

        save_plot(&plot, &self.htmlout, self.show);

        Ok(())
    }
}
