use std::{
    fs,
    io::{
        BufWriter,
        Write,
    },
    path::{
        Path,
        PathBuf,
    },
};

use anyhow::{
    bail,
    Context,
};
use clap::Args;
use log::{
    info,
    warn,
};
use ndarray::Array1;
use plotly::{
    Plot,
    common::{
        DashType,
        Title,
    },
    layout::{
        Shape,
        ShapeLayer,
        ShapeLine,
        ShapeType,
    },
};

use crate::{
    settings::Settings,
    types::Result,
    vasp_parsers::klabels::KLabels,
};


/// Write columns as whitespace separated text, `comment` becomes the first line after a `#`.
///
/// All the columns must have the same non-zero length. `NaN` marks a missing value.
pub fn write_array_to_txt(file_name: &(impl AsRef<Path> + ?Sized), ys: Vec<&Array1<f64>>, comment: &str) -> Result<()> {
    let nrow = ys.first().context("At least one data set is needed")?.len();

    if nrow == 0 || !ys.iter().all(|y| y.len() == nrow) {
        bail!("[WRT_ARRAY]: input data with zero length or they don't have consistent lengths");
    }

    let file_name = file_name.as_ref();
    let f = fs::File::create(file_name)
        .with_context(|| format!("Cannot create {:?}", file_name))?;
    let mut f = BufWriter::new(f);

    writeln!(f, "# {}", comment.trim())?;
    for irow in 0 .. nrow {
        for y in ys.iter() {
            write!(f, "  {:15.6}", y[irow])?;
        }
        writeln!(f)?;
    }
    f.flush()?;

    Ok(())
}


#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[arg(long)]
    /// Extra settings file in TOML, merged over the user's and `./rsband.toml`.
    ///
    /// Run `rsband config` to see all the available keys.
    pub config: Option<PathBuf>,
}

impl SettingsArgs {
    pub fn load(&self) -> Result<Settings> {
        Settings::load(self.config.as_deref())
    }
}


/// Dashed vertical line spanning the whole plot height.
pub fn vline(x: f64, color: &'static str) -> Shape {
    Shape::new()
        .shape_type(ShapeType::Line)
        .x_ref("x")
        .y_ref("paper")
        .x0(x)
        .x1(x)
        .y0(0.0)
        .y1(1.0)
        .line(ShapeLine::new().color(color).width(1.0).dash(DashType::Dash))
}


/// Dashed horizontal line spanning the whole plot width.
pub fn hline(y: f64, color: &'static str) -> Shape {
    Shape::new()
        .shape_type(ShapeType::Line)
        .x_ref("paper")
        .y_ref("y")
        .x0(0.0)
        .x1(1.0)
        .y0(y)
        .y1(y)
        .line(ShapeLine::new().color(color).width(1.0).dash(DashType::Dash))
}


/// Shaded band `x0 <= x <= x1`, drawn below the traces.
pub fn vrect(x0: f64, x1: f64) -> Shape {
    Shape::new()
        .shape_type(ShapeType::Rect)
        .x_ref("x")
        .y_ref("paper")
        .x0(x0)
        .x1(x1)
        .y0(0.0)
        .y1(1.0)
        .fill_color("gray")
        .opacity(0.2)
        .layer(ShapeLayer::Below)
        .line(ShapeLine::new().width(0.0))
}


/// KLABELS is optional for plots, a broken or missing one only drops the ticks.
pub fn read_klabels_or_empty(path: &Path) -> KLabels {
    match KLabels::from_file(path) {
        Ok(k) => {
            info!("Read {} high symmetry points from {:?}", k.len(), path);
            k
        },
        Err(e) => {
            warn!("Cannot read high symmetry points: {}", e);
            KLabels::default()
        },
    }
}


/// Vertical lines at high symmetry points and the x axis with their labels as ticks.
pub fn kpath_axis(klabels: &KLabels) -> (Vec<Shape>, plotly::layout::Axis) {
    let shapes = klabels.coords.iter()
        .map(|&x| vline(x, "gray"))
        .collect::<Vec<_>>();

    let mut axis = plotly::layout::Axis::new()
        .title(Title::with_text("k-path"));
    if !klabels.is_empty() {
        axis = axis.tick_values(klabels.coords.clone())
            .tick_text(klabels.display_labels());
    }

    (shapes, axis)
}


pub fn save_plot(plot: &Plot, htmlout: &Path, show: bool) {
    info!("Writing to {:?}", htmlout);
    plot.write_html(htmlout);

    if show {
        plot.show();
    }
}
