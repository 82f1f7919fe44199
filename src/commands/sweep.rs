//! Pieces shared by the convergence sweep commands.

use std::path::{
    Path,
    PathBuf,
};

use anyhow::bail;
use clap::Args;
use colored::Colorize;
use log::info;
use ndarray::Array1;
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
    analysis::convergence::{
        Criterion,
        SweepPoint,
        collect_sweep,
        differences,
        find_convergence,
    },
    commands::common::{
        SettingsArgs,
        save_plot,
        vline,
        write_array_to_txt,
    },
    error::{
        ExtractError,
        ExtractResult,
    },
    settings::{
        Convergence,
        Sweep,
    },
    types::Result,
    vasp_parsers::{
        outcar::Outcar,
        poscar::Poscar,
    },
};


#[derive(Debug, Args)]
pub struct SweepArgs {
    #[arg(long, default_value = ".")]
    /// Directory holding one sub-directory per calculation.
    pub root: PathBuf,

    #[arg(long, value_delimiter = ',', num_args = 1..)]
    /// Parameter values of the sweep, e.g. `--values 200,250,300`. Read from settings if omitted.
    pub values: Option<Vec<f64>>,

    #[arg(long)]
    /// Name of each calculation directory, `{}` is replaced by the parameter value.
    pub pattern: Option<String>,

    #[command(flatten)]
    pub settings: SettingsArgs,
}


impl SweepArgs {
    /// Merge the command line over the settings, `pick` selects the sweep in the settings.
    pub fn resolve(&self, pick: impl Fn(&Convergence) -> &Sweep) -> Result<(Sweep, Convergence)> {
        let settings = self.settings.load()?;
        let mut sweep = pick(&settings.convergence).clone();

        if let Some(values) = self.values.as_ref() {
            sweep.values = values.clone();
        }
        if let Some(pattern) = self.pattern.as_ref() {
            sweep.pattern = pattern.clone();
        }
        if sweep.values.is_empty() {
            bail!("No parameter value given for the sweep {:?}.", sweep.pattern);
        }

        Ok((sweep, settings.convergence))
    }
}


#[derive(Debug, Args)]
pub struct ConvergenceArgs {
    #[arg(long)]
    /// Convergence threshold of total energy in eV.
    pub threshold: Option<f64>,

    #[arg(long, value_enum, ignore_case = true)]
    /// `adjacent`: two neighbouring values differ less than the threshold.
    /// `reference`: the value differs less than the threshold from the one of the largest parameter.
    pub criterion: Option<Criterion>,
}


impl ConvergenceArgs {
    pub fn resolve(&self, sweep: &Sweep, conv: &Convergence) -> (f64, Criterion) {
        (
            self.threshold.unwrap_or(conv.threshold),
            self.criterion.or(sweep.criterion).unwrap_or_default(),
        )
    }
}


/// Final TOTEN in `dir/OUTCAR`.
pub fn toten_in(dir: &Path) -> ExtractResult<f64> {
    Outcar::from_file(&dir.join("OUTCAR"))?
        .final_toten()
        .ok_or(ExtractError::MissingField("free  energy   TOTEN"))
}


/// Lattice constant `|a1| * scale` of `dir/CONTCAR`.
pub fn lattice_constant_in(dir: &Path) -> ExtractResult<f64> {
    Ok(Poscar::from_file(&dir.join("CONTCAR"))?.lattice_constant())
}


fn to_column(values: impl Iterator<Item = Option<f64>>) -> Array1<f64> {
    values.map(|v| v.unwrap_or(f64::NAN)).collect()
}


fn fmt_opt(v: Option<f64>, prec: usize) -> String {
    match v {
        Some(v) => format!("{:.*}", prec, v),
        None    => "--".to_owned(),
    }
}


/// Total energy sweep: read, find convergence, print the table, write txt and html.
pub struct EnergySweep<'a> {
    pub name:    &'a str,
    pub unit:    &'a str,
    pub htmlout: &'a Path,
    pub txtout:  &'a Path,
    pub show:    bool,
}


impl EnergySweep<'_> {
    pub fn run(&self, root: &Path, sweep: &Sweep, threshold: f64, criterion: Criterion) -> Result<Option<SweepPoint>> {
        info!("Reading {} sweep {:?} in {:?}", self.name, sweep.pattern, root);
        let points = collect_sweep(root, &sweep.pattern, &sweep.values, toten_in);

        let iconv = find_convergence(&points, threshold, criterion);
        let diffs = differences(&points, criterion);

        self.print_table(&points, &diffs, iconv, threshold, criterion);

        let params = points.iter().map(|p| p.parameter).collect::<Array1<f64>>();
        let energies = to_column(points.iter().map(|p| p.value));
        let diffcol = to_column(diffs.iter().copied());
        info!("Writing raw data to {:?}", self.txtout);
        write_array_to_txt(self.txtout, vec![&params, &energies, &diffcol],
                           &format!("{}({})  TOTEN(eV)  dE(eV, {})", self.name, self.unit, criterion))?;

        self.plot(&points, iconv);

        Ok(iconv.map(|i| points[i].clone()))
    }

    fn print_table(&self, points: &[SweepPoint], diffs: &[Option<f64>],
                   iconv: Option<usize>, threshold: f64, criterion: Criterion) {
        let mut output = String::new();
        output.push_str(&format!(" {:>10} {:>18} {:>14}\n",
                                 format!("{}({})", self.name, self.unit), "TOTEN(eV)", "dE(eV)"));
        for (i, (p, d)) in points.iter().zip(diffs.iter()).enumerate() {
            let line = format!(" {:>10} {:>18} {:>14}",
                               p.parameter, fmt_opt(p.value, 6), fmt_opt(*d, 6));
            if Some(i) == iconv {
                output.push_str(&format!("{}\n", line.bright_green()));
            } else {
                output.push_str(&format!("{}\n", line));
            }
        }

        match iconv {
            Some(i) => output.push_str(&format!(" {} converged at {} {} ({} criterion, dE < {} eV)",
                                                self.name, format!("{}", points[i].parameter).bright_cyan(),
                                                self.unit, criterion, threshold)),
            None => output.push_str(&format!(" {} did {} within tested range (threshold = {} eV)",
                                             self.name, "not converge".bright_yellow(), threshold)),
        }

        println!("{}", output);
    }

    fn plot(&self, points: &[SweepPoint], iconv: Option<usize>) {
        let (x, y): (Vec<f64>, Vec<f64>) = points.iter()
            .filter_map(|p| p.value.map(|v| (p.parameter, v)))
            .unzip();

        let trace = Scatter::new(x, y)
            .mode(Mode::LinesMarkers)
            .marker(Marker::new().size(8))
            .name("TOTEN");

        let mut plot = Plot::new();
        plot.add_trace(trace);

        let mut layout = Layout::new()
            .title(Title::with_text(&format!("{} convergence test", self.name)))
            .x_axis(plotly::layout::Axis::new()
                    .title(Title::with_text(&format!("{} ({})", self.name, self.unit))))
            .y_axis(plotly::layout::Axis::new()
                    .title(Title::with_text("Total Energy (eV)")));
        if let Some(i) = iconv {
            layout.add_shape(vline(points[i].parameter, "red"));
        }
        plot.set_layout(layout);

        save_plot(&plot, self.htmlout, self.show);
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fmt_opt() {
        assert_eq!(fmt_opt(Some(-1.5), 3), "-1.500");
        assert_eq!(fmt_opt(None, 3), "--");
    }

    #[test]
    fn test_to_column() {
        let col = to_column(vec![Some(1.0), None].into_iter());
        assert_eq!(col[0], 1.0);
        assert!(col[1].is_nan());
    }
}
