//! Numeric reductions shared by the commands. Everything here works on samples as they are,
//! no interpolation is performed.

pub mod convergence;

use std::ops::Range;

use log::{
    info,
    warn,
};

use indexmap::IndexMap;

use crate::{
    error::{
        ExtractError,
        ExtractResult,
    },
    vasp_parsers::klabels::KLabels,
};


/// Index of the sample closest to `target`, the first one wins a tie.
pub fn nearest_index(xs: &[f64], target: f64) -> Option<usize> {
    xs.iter()
        .map(|x| (x - target).abs())
        .enumerate()
        .fold(None, |acc: Option<(usize, f64)>, (i, d)| match acc {
            Some((_, dmin)) if dmin <= d => acc,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}


/// Rows `center - half_width ..= center + half_width`, clipped to `0 .. len`.
pub fn window_range(center: usize, half_width: usize, len: usize) -> Range<usize> {
    let start = center.saturating_sub(half_width).min(len);
    let end = center.saturating_add(half_width).saturating_add(1).min(len);
    start .. end
}


/// Indices of the `count` values closest to `reference`, closest first.
pub fn closest_bands(row: &[f64], reference: f64, count: usize) -> Vec<usize> {
    let mut idx = (0 .. row.len()).collect::<Vec<usize>>();
    idx.sort_by(|&a, &b| {
        let da = (row[a] - reference).abs();
        let db = (row[b] - reference).abs();
        da.total_cmp(&db)
    });
    idx.truncate(count);
    idx
}


#[derive(Clone, Debug, PartialEq)]
pub enum TargetSource {
    Label(String),
    Midpoint,
}


/// Position on the k-path to look at: the first high symmetry point named as one of
/// `candidates`, or the middle of the path.
pub fn locate_target<S: AsRef<str>>(klabels: &KLabels, kpath: &[f64], candidates: &[S]) -> (f64, TargetSource) {
    let midpoint = match (kpath.first(), kpath.last()) {
        (Some(a), Some(b)) => (a + b) / 2.0,
        _ => 0.0,
    };

    if klabels.is_empty() {
        warn!("No valid high symmetry point available, the midpoint of k-path {:.4} is used.", midpoint);
        return (midpoint, TargetSource::Midpoint);
    }

    match klabels.find(candidates) {
        Some((label, coord)) => {
            info!("Found high symmetry point {:?} at {:.4}", label, coord);
            (coord, TargetSource::Label(label.to_owned()))
        },
        None => {
            warn!("None of the labels {:?} found in high symmetry points, the midpoint of k-path {:.4} is used.",
                  candidates.iter().map(|c| c.as_ref()).collect::<Vec<_>>(), midpoint);
            (midpoint, TargetSource::Midpoint)
        },
    }
}


/// Trapezoidal integral of `y` over `x`.
pub fn trapz(y: &[f64], x: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
        .sum()
}


/// Trapezoidal integral restricted to the samples with `lo <= x <= hi`.
pub fn trapz_window(y: &[f64], x: &[f64], lo: f64, hi: f64) -> f64 {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x.iter()
        .zip(y.iter())
        .filter(|(&x, _)| x >= lo && x <= hi)
        .map(|(&x, &y)| (x, y))
        .unzip();
    trapz(&ys, &xs)
}


/// Percentage of the total integral carried by each channel inside `[lo, hi]`.
///
/// `total` is sampled on `x_total`, all the channels on `x_channels`.
pub fn channel_contributions<S: AsRef<str>>(total: &[f64], x_total: &[f64],
                                            channels: &[(S, Vec<f64>)], x_channels: &[f64],
                                            lo: f64, hi: f64) -> ExtractResult<IndexMap<String, f64>> {
    let denom = trapz_window(total, x_total, lo, hi);
    if denom == 0.0 {
        return Err(ExtractError::Empty("total DOS inside the energy window"));
    }

    Ok(channels.iter()
       .map(|(name, y)| {
           let part = trapz_window(y, x_channels, lo, hi);
           (name.as_ref().to_owned(), 100.0 * part / denom)
       })
       .collect())
}


/// Mean of `potential` between the samples nearest to the fractional bounds of `region`,
/// the upper one excluded. `coords` are the fractional positions of the samples.
pub fn vacuum_level(coords: &[f64], potential: &[f64], region: [f64; 2]) -> ExtractResult<f64> {
    let start = nearest_index(coords, region[0]).ok_or(ExtractError::Empty("potential"))?;
    let end = nearest_index(coords, region[1]).ok_or(ExtractError::Empty("potential"))?;
    let end = end.min(potential.len());

    if end <= start {
        return Err(ExtractError::Empty("grid points inside the vacuum region"));
    }

    let slice = &potential[start .. end];
    Ok(slice.iter().sum::<f64>() / slice.len() as f64)
}


/// Least-squares fit of `y = c[0] x^2 + c[1] x + c[2]`, highest power first.
///
/// Returns `None` with less than three points or when the points are degenerate.
pub fn polyfit2(x: &[f64], y: &[f64]) -> Option<[f64; 3]> {
    let n = x.len().min(y.len());
    if n < 3 {
        return None;
    }

    // shift x for a better conditioned system, undone at the end
    let x0 = x[..n].iter().sum::<f64>() / n as f64;
    let mut s = [0.0f64; 5];    // sum of t^k
    let mut t = [0.0f64; 3];    // sum of y t^k
    for (&xi, &yi) in x[..n].iter().zip(y[..n].iter()) {
        let ti = xi - x0;
        let mut p = 1.0;
        for k in 0 .. 5 {
            s[k] += p;
            if k < 3 {
                t[k] += yi * p;
            }
            p *= ti;
        }
    }

    // normal equations for (c, b, a) of y = a t^2 + b t + c
    let m = [[s[0], s[1], s[2]],
             [s[1], s[2], s[3]],
             [s[2], s[3], s[4]]];
    let det = crate::types::det33(&m);
    if det.abs() < f64::EPSILON * s[4].abs().max(1.0) {
        return None;
    }

    let solve = |col: usize| {
        let mut mm = m;
        for row in 0 .. 3 {
            mm[row][col] = t[row];
        }
        crate::types::det33(&mm) / det
    };
    let (c, b, a) = (solve(0), solve(1), solve(2));

    // back to powers of x
    Some([a, b - 2.0 * a * x0, a * x0 * x0 - b * x0 + c])
}


/// Position of the extremum of `c[0] x^2 + c[1] x + c[2]`, only if it is a minimum.
pub fn parabola_minimum(c: &[f64; 3]) -> Option<f64> {
    if c[0] > 0.0 {
        Some(-c[1] / (2.0 * c[0]))
    } else {
        None
    }
}


pub fn polyval2(c: &[f64; 3], x: f64) -> f64 {
    (c[0] * x + c[1]) * x + c[2]
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use crate::vasp_parsers::band::BandStructure;

    #[test]
    fn test_nearest_index() {
        let xs = [0.0, 0.5, 1.0, 1.5, 2.0];
        assert_eq!(nearest_index(&xs, 1.1), Some(2));
        assert_eq!(nearest_index(&xs, -3.0), Some(0));
        assert_eq!(nearest_index(&xs, 9.0), Some(4));
        assert_eq!(nearest_index(&xs, 0.25), Some(0));
        assert_eq!(nearest_index(&[], 0.25), None);
    }

    #[test]
    fn test_window_range() {
        assert_eq!(window_range(10, 3, 100), 7 .. 14);
        assert_eq!(window_range(10, 3, 100).len(), 7);
        assert_eq!(window_range(0, 50, 20), 0 .. 20);
        assert_eq!(window_range(19, 5, 20), 14 .. 20);
        assert_eq!(window_range(1, 5, 20), 0 .. 7);
        assert_eq!(window_range(0, 0, 0), 0 .. 0);
    }

    #[test]
    fn test_closest_bands() {
        let row = [-3.0, 0.0, 2.5, -0.4, 1.0];
        assert_eq!(closest_bands(&row, 0.0, 2), vec![1, 3]);
        assert_eq!(closest_bands(&row, 2.0, 3), vec![2, 4, 1]);
        assert_eq!(closest_bands(&row, 0.0, 10).len(), 5);
        // ties keep column order
        assert_eq!(closest_bands(&[1.0, -1.0, 1.0], 0.0, 2), vec![0, 1]);
    }

    #[test]
    fn test_band_zero_at_target_is_selected() {
        let band: BandStructure = "\
0.0  -3.0  -1.5   2.0
1.0  -2.5  -0.8   1.5
2.0  -2.0   0.0   1.2
3.0  -2.5  -0.8   1.5
4.0  -3.0  -1.5   2.0
".parse().unwrap();
        let kpath = band.kpath.to_vec();

        let ik = nearest_index(&kpath, 2.1).unwrap();
        assert_eq!(ik, 2);
        let sel = closest_bands(&band.eigs.row(ik).to_vec(), 0.0, 2);
        assert_eq!(sel, vec![1, 2]);

        // first and last samples clip
        assert_eq!(window_range(0, 2, kpath.len()), 0 .. 3);
        assert_eq!(window_range(4, 2, kpath.len()), 2 .. 5);
    }

    #[test]
    fn test_locate_target() {
        let kpath = [0.0, 1.0, 2.0, 3.0, 4.0];
        let kl: KLabels = "GAMMA 0.0\nM 1.5\nK 2.5\nGAMMA 4.0\n".parse().unwrap();
        assert_eq!(locate_target(&kl, &kpath, &["K"]), (2.5, TargetSource::Label("K".to_owned())));
        assert_eq!(locate_target(&kl, &kpath, &["H"]), (2.0, TargetSource::Midpoint));
        assert_eq!(locate_target(&KLabels::default(), &kpath, &["K"]), (2.0, TargetSource::Midpoint));
    }

    #[test]
    fn test_trapz() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 2.0, 3.0];
        assert_relative_eq!(trapz(&y, &x), 4.5);
        assert_relative_eq!(trapz_window(&y, &x, 0.5, 2.0), 1.5);
        assert_eq!(trapz(&[1.0], &[0.0]), 0.0);
    }

    #[test]
    fn test_channel_contributions() {
        let x = [-2.0, -1.0, 0.0, 1.0, 2.0];
        let total = [9.0, 4.0, 4.0, 4.0, 9.0];
        let channels = vec![
            ("s",  vec![0.0, 1.0, 1.0, 1.0, 0.0]),
            ("pz", vec![0.0, 3.0, 3.0, 3.0, 0.0]),
        ];
        let ret = channel_contributions(&total, &x, &channels, &x, -1.0, 1.0).unwrap();
        assert_eq!(ret.keys().collect::<Vec<_>>(), vec!["s", "pz"]);
        assert_relative_eq!(ret["s"], 25.0);
        assert_relative_eq!(ret["pz"], 75.0);

        let zeros = [0.0; 5];
        assert!(channel_contributions(&zeros, &x, &channels, &x, -1.0, 1.0).is_err());
    }

    #[test]
    fn test_vacuum_level() {
        let coords = (0 .. 11).map(|i| i as f64 / 10.0).collect::<Vec<f64>>();
        let pot = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 4.0, 4.0, 5.0, 9.0, 9.0];
        // samples 6, 7, 8
        assert_relative_eq!(vacuum_level(&coords, &pot, [0.6, 0.9]).unwrap(), 13.0 / 3.0);
        assert!(vacuum_level(&coords, &pot, [0.9, 0.6]).is_err());
        assert!(vacuum_level(&coords, &pot, [0.61, 0.62]).is_err());
        assert!(vacuum_level(&[], &[], [0.6, 0.9]).is_err());
    }

    #[test]
    fn test_polyfit2() {
        let x = [2.40, 2.43, 2.46, 2.49, 2.52];
        let y = x.iter()
            .map(|x| 3.0 * (x - 2.467) * (x - 2.467) - 18.5)
            .collect::<Vec<f64>>();

        let c = polyfit2(&x, &y).unwrap();
        assert_relative_eq!(c[0], 3.0, epsilon = 1e-8);
        assert_relative_eq!(parabola_minimum(&c).unwrap(), 2.467, epsilon = 1e-8);
        assert_relative_eq!(polyval2(&c, 2.467), -18.5, epsilon = 1e-8);

        assert!(polyfit2(&x[..2], &y[..2]).is_none());
        assert!(polyfit2(&[1.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).is_none());
        assert_eq!(parabola_minimum(&[-1.0, 0.0, 0.0]), None);
    }
}
