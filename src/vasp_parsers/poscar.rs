use std::{
    path::Path,
    str::FromStr,
};

use crate::{
    error::{
        ExtractError,
        ExtractResult,
        read_to_string,
    },
    types::{
        Mat33,
        MatX3,
        det33,
        norm3,
    },
};


/// POSCAR/CONTCAR, also the header of CHGCAR and LOCPOT.
#[derive(Clone, Debug, PartialEq)]
pub struct Poscar {
    pub comment:       String,
    /// Universal scaling factor, a negative value in file is already converted.
    pub scale:         f64,
    /// Lattice vectors as written in file, without scaling.
    pub cell:          Mat33<f64>,
    pub ion_types:     Vec<String>,
    pub ions_per_type: Vec<usize>,
    pub direct:        bool,
    pub positions:     MatX3<f64>,
    pub constraints:   Option<MatX3<bool>>,
}


fn next_line<'a, I>(it: &mut I, what: &'static str) -> ExtractResult<(usize, &'a str)>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    it.next().ok_or(ExtractError::MissingField(what))
}


fn parse_floats(line: &str, lineno: usize, n: usize) -> ExtractResult<Vec<f64>> {
    let v = line.split_whitespace()
        .take(n)
        .map(|x| x.parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|e| ExtractError::MalformedRow { line: lineno, reason: e.to_string() })?;
    if v.len() < n {
        return Err(ExtractError::MalformedRow {
            line: lineno,
            reason: format!("expect {} numbers, found {}", n, v.len()),
        });
    }
    Ok(v)
}


fn parse_counts(line: &str, lineno: usize) -> ExtractResult<Vec<usize>> {
    line.split_whitespace()
        .map(|x| x.parse::<usize>())
        .collect::<Result<Vec<usize>, _>>()
        .map_err(|e| ExtractError::MalformedRow { line: lineno, reason: e.to_string() })
}


impl Poscar {
    pub fn from_file(path: &(impl AsRef<Path> + ?Sized)) -> ExtractResult<Self> {
        read_to_string(path)?.parse()
    }

    pub fn scaled_cell(&self) -> Mat33<f64> {
        let s = self.scale;
        let c = &self.cell;
        [[c[0][0] * s, c[0][1] * s, c[0][2] * s],
         [c[1][0] * s, c[1][1] * s, c[1][2] * s],
         [c[2][0] * s, c[2][1] * s, c[2][2] * s]]
    }

    /// Lengths of a, b and c in Angstrom.
    pub fn lattice_lengths(&self) -> [f64; 3] {
        let cell = self.scaled_cell();
        [norm3(&cell[0]), norm3(&cell[1]), norm3(&cell[2])]
    }

    /// Length of the first lattice vector, i.e. `a`.
    pub fn lattice_constant(&self) -> f64 {
        self.lattice_lengths()[0]
    }

    /// Parse a POSCAR block from numbered lines, consuming exactly the lines it needs.
    pub(crate) fn from_lines<'a, I>(it: &mut I) -> ExtractResult<Self>
    where
        I: Iterator<Item = (usize, &'a str)>,
    {
        let (_, comment) = next_line(it, "POSCAR comment")?;

        let (lineno, line) = next_line(it, "scaling factor")?;
        let raw_scale = parse_floats(line, lineno, 1)?[0];

        let mut cell = [[0.0f64; 3]; 3];
        for row in cell.iter_mut() {
            let (lineno, line) = next_line(it, "lattice vectors")?;
            let v = parse_floats(line, lineno, 3)?;
            row.copy_from_slice(&v);
        }

        let scale = if raw_scale < 0.0 {
            (raw_scale.abs() / det33(&cell).abs()).cbrt()
        } else {
            raw_scale
        };

        // VASP 4 format has no element symbols line
        let (lineno, line) = next_line(it, "ion types or counts")?;
        let (ion_types, ions_per_type) = match parse_counts(line, lineno) {
            Ok(counts) => (vec![], counts),
            Err(_) => {
                let types = line.split_whitespace().map(str::to_owned).collect::<Vec<_>>();
                let (lineno, line) = next_line(it, "ions per type")?;
                (types, parse_counts(line, lineno)?)
            },
        };

        if !ion_types.is_empty() && ion_types.len() != ions_per_type.len() {
            return Err(ExtractError::MalformedRow {
                line: lineno,
                reason: "numbers of ion types and counts differ".to_owned(),
            });
        }

        let (_, mut line) = next_line(it, "coordinate mode")?;
        let selective = line.trim_start().starts_with(['s', 'S']);
        if selective {
            line = next_line(it, "coordinate mode")?.1;
        }
        let direct = !line.trim_start().starts_with(['c', 'C', 'k', 'K']);

        let nions: usize = ions_per_type.iter().sum();
        let mut positions = Vec::with_capacity(nions);
        let mut constraints = Vec::with_capacity(nions);
        for _ in 0 .. nions {
            let (lineno, line) = next_line(it, "ion positions")?;
            let v = parse_floats(line, lineno, 3)?;
            positions.push([v[0], v[1], v[2]]);

            if selective {
                let flags = line.split_whitespace()
                    .skip(3)
                    .take(3)
                    .map(|x| x.starts_with(['t', 'T']))
                    .collect::<Vec<bool>>();
                if flags.len() < 3 {
                    return Err(ExtractError::MalformedRow {
                        line: lineno,
                        reason: "missing selective dynamics flags".to_owned(),
                    });
                }
                constraints.push([flags[0], flags[1], flags[2]]);
            }
        }

        Ok(Self {
            comment: comment.trim().to_owned(),
            scale,
            cell,
            ion_types,
            ions_per_type,
            direct,
            positions,
            constraints: if selective { Some(constraints) } else { None },
        })
    }
}


impl FromStr for Poscar {
    type Err = ExtractError;

    fn from_str(txt: &str) -> ExtractResult<Self> {
        let mut it = txt.lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l));
        Self::from_lines(&mut it)
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    const GRAPHENE: &str = "\
C2 graphene
   1.00000000000000
     2.4677000000000000    0.0000000000000000    0.0000000000000000
    -1.2338500000000000    2.1370999000000000    0.0000000000000000
     0.0000000000000000    0.0000000000000000   20.0000000000000000
   C
     2
Selective dynamics
Direct
  0.0000000000000000  0.0000000000000000  0.5000000000000000   T   T   F
  0.3333333333333333  0.6666666666666667  0.5000000000000000   T   T   F
";

    #[test]
    fn test_read_poscar() {
        let pos: Poscar = GRAPHENE.parse().unwrap();
        assert_eq!(pos.comment, "C2 graphene");
        assert_eq!(pos.ion_types, vec!["C"]);
        assert_eq!(pos.positions.len(), 2);
        assert!(pos.direct);
        assert_eq!(pos.constraints.as_ref().unwrap()[1], [true, true, false]);
        assert_relative_eq!(pos.lattice_constant(), 2.4677, epsilon = 1e-12);
    }

    #[test]
    fn test_scale_factor() {
        let txt = GRAPHENE.replacen("1.00000000000000", "1.02", 1);
        let pos: Poscar = txt.parse().unwrap();
        assert_relative_eq!(pos.lattice_constant(), 2.4677 * 1.02, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_scale_is_volume() {
        let txt = "\
cubic
  -8.0
  1.0 0.0 0.0
  0.0 1.0 0.0
  0.0 0.0 1.0
  1
Cartesian
  0.0 0.0 0.0
";
        let pos: Poscar = txt.parse().unwrap();
        assert!(pos.ion_types.is_empty());
        assert!(!pos.direct);
        assert_relative_eq!(pos.scale, 2.0, epsilon = 1e-12);
        assert_relative_eq!(pos.lattice_constant(), 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_truncated_poscar() {
        let txt = GRAPHENE.lines().take(8).collect::<Vec<_>>().join("\n");
        assert!(matches!(txt.parse::<Poscar>(), Err(ExtractError::MissingField(_))));
    }
}
