use std::{
    fs,
    path::PathBuf,
};

use approx::assert_relative_eq;
use ndarray::Array1;
use tempdir::TempDir;

use rsband::{
    Result,
    analysis::{
        TargetSource,
        channel_contributions,
        closest_bands,
        locate_target,
        nearest_index,
        vacuum_level,
        window_range,
        convergence::{
            Criterion,
            collect_sweep,
            differences,
            find_convergence,
        },
    },
    commands::{
        lattice::fit_lattice,
        sweep::{
            lattice_constant_in,
            toten_in,
        },
    },
    types::Axis,
    vasp_parsers::{
        band::BandStructure,
        chg::Potential,
        dos::{
            DosTable,
            PdosChannels,
        },
        klabels::KLabels,
        outcar::Outcar,
        pband::ProjectedBands,
    },
};


macro_rules! get_fpath_in_current_dir {
    ($fname:expr) => {{
        let mut path = PathBuf::from(file!());
        path.pop();
        path.push($fname);
        path
    }}
}


fn write_outcar(dir: &std::path::Path, toten: f64) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("OUTCAR"), format!(
            " E-fermi :  -2.0000     XC(G=0):  -7.5422     alpha+bet : -4.5618\n  free  energy   TOTEN  = {:20.8} eV\n",
            toten)).unwrap();
}


#[test]
fn test_dirac_point_of_fixture() -> Result<()> {
    let band = BandStructure::from_file(&get_fpath_in_current_dir!("REFORMATTED_BAND.dat"))?;
    let klabels = KLabels::from_file(&get_fpath_in_current_dir!("KLABELS"))?;
    let kpath = band.kpath.to_vec();

    let (k_target, source) = locate_target(&klabels, &kpath, &["K", "K1"]);
    assert_eq!(source, TargetSource::Label("K".to_owned()));
    assert_relative_eq!(k_target, 1.6);

    let ik = nearest_index(&kpath, k_target).unwrap();
    assert_eq!(ik, 8);
    assert_eq!(window_range(ik, 3, band.nkpoints()), 5 .. 12);
    assert_eq!(window_range(ik, 50, band.nkpoints()), 0 .. 15);

    let row = band.eigs.row(ik).to_vec();
    let ibands = closest_bands(&row, 0.0, 2);
    assert_eq!(ibands, vec![1, 2]);
    assert_relative_eq!((row[ibands[0]] - row[ibands[1]]).abs(), 0.1, epsilon = 1e-10);
    Ok(())
}


#[test]
fn test_missing_label_falls_back_to_midpoint() -> Result<()> {
    let band = BandStructure::from_file(&get_fpath_in_current_dir!("REFORMATTED_BAND.dat"))?;
    let klabels = KLabels::from_file(&get_fpath_in_current_dir!("KLABELS"))?;

    let (k, source) = locate_target(&klabels, &band.kpath.to_vec(), &["H"]);
    assert_eq!(source, TargetSource::Midpoint);
    assert_relative_eq!(k, 1.4);

    let (k, source) = locate_target(&KLabels::default(), &band.kpath.to_vec(), &["K"]);
    assert_eq!(source, TargetSource::Midpoint);
    assert_relative_eq!(k, 1.4);
    Ok(())
}


#[test]
fn test_pband_contributions_near_k() -> Result<()> {
    let pband = ProjectedBands::from_file(&get_fpath_in_current_dir!("PBAND_C.dat"))?;
    let contrib = pband.orbital_contributions(1.6, 2.0, 0.0, 2.0)?;

    assert_eq!(contrib.keys().collect::<Vec<_>>(), vec!["s", "py", "pz", "px"]);
    assert_relative_eq!(contrib["s"], 10.0, epsilon = 1e-8);
    assert_relative_eq!(contrib["py"], 0.0);
    assert_relative_eq!(contrib["pz"], 80.0, epsilon = 1e-8);
    assert_relative_eq!(contrib["px"], 10.0, epsilon = 1e-8);

    assert!(pband.orbital_contributions(1.6, 2.0, 20.0, 1.0).is_err());
    Ok(())
}


#[test]
fn test_dos_contributions() -> Result<()> {
    let tdos = DosTable::from_file(&get_fpath_in_current_dir!("TDOS.dat"))?;
    let pdos = DosTable::from_file(&get_fpath_in_current_dir!("PDOS_USER.dat"))?;
    let channels = PdosChannels::from_table(&pdos)
        .channels()
        .into_iter()
        .map(|(n, v)| (n, v.to_vec()))
        .collect::<Vec<_>>();

    let contrib = channel_contributions(&tdos.total().to_vec(), &tdos.energies.to_vec(),
                                        &channels, &pdos.energies.to_vec(), -1.0, 1.0)?;
    assert_relative_eq!(contrib["s"], 25.0, epsilon = 1e-8);
    assert_relative_eq!(contrib["pz"], 50.0, epsilon = 1e-8);
    assert_relative_eq!(contrib["p"], 75.0, epsilon = 1e-8);

    // no sample inside the window
    assert!(channel_contributions(&tdos.total().to_vec(), &tdos.energies.to_vec(),
                                  &channels, &pdos.energies.to_vec(), 10.0, 11.0).is_err());
    Ok(())
}


#[test]
fn test_work_function_of_fixture() -> Result<()> {
    let pot = Potential::from_file(&get_fpath_in_current_dir!("LOCPOT"))?;
    let efermi = Outcar::from_file(&get_fpath_in_current_dir!("OUTCAR"))?.efermi()?;

    let avg = pot.planar_average(Axis::Z);
    let frac = Array1::linspace(0.0, 1.0, avg.len());
    let vacuum = vacuum_level(frac.as_slice().unwrap(), avg.as_slice().unwrap(), [0.6, 0.9])?;

    assert_relative_eq!(vacuum, 5.0);
    assert_relative_eq!(vacuum - efermi, 7.0);
    assert!(vacuum_level(frac.as_slice().unwrap(), avg.as_slice().unwrap(), [0.9, 0.6]).is_err());
    Ok(())
}


#[test]
fn test_encut_sweep_tree() {
    let dir = TempDir::new("rsband_encut").unwrap();
    let energies = [(200.0, -10.0), (250.0, -10.5), (300.0, -10.6), (350.0, -10.6005), (400.0, -10.6006)];
    for (encut, e) in energies.iter() {
        write_outcar(&dir.path().join(format!("Encut_{}", encut)), *e);
    }

    let params = [400.0, 200.0, 250.0, 300.0, 350.0, 450.0];
    let points = collect_sweep(dir.path(), "Encut_{}", &params, toten_in);
    assert_eq!(points.iter().map(|p| p.parameter).collect::<Vec<_>>(),
               vec![200.0, 250.0, 300.0, 350.0, 400.0, 450.0]);
    assert_eq!(points[5].value, None);
    assert_relative_eq!(points[0].value.unwrap(), -10.0);

    assert_eq!(find_convergence(&points, 0.001, Criterion::Adjacent), Some(3));
    assert_eq!(find_convergence(&points, 0.001, Criterion::Reference), Some(2));
    assert_eq!(find_convergence(&points, 1e-6, Criterion::Adjacent), None);

    let diffs = differences(&points, Criterion::Adjacent);
    assert_eq!(diffs[0], None);
    assert_relative_eq!(diffs[1].unwrap(), 0.5, epsilon = 1e-8);
    assert_eq!(diffs[5], None);
}


#[test]
fn test_lattice_sweep_tree() {
    let dir = TempDir::new("rsband_lattice").unwrap();
    let contcar = fs::read_to_string(get_fpath_in_current_dir!("CONTCAR")).unwrap();
    let scales = [0.97, 0.98, 0.99, 1.0, 1.01, 1.02, 1.03];

    for &s in scales.iter() {
        let sub = dir.path().join(format!("Scale_{}", s));
        let a = 2.4677 * s;
        write_outcar(&sub, 3.0 * (a - 2.47) * (a - 2.47) - 18.0);
        fs::write(sub.join("CONTCAR"), contcar.replacen("1.00000000000000", &format!("{}", s), 1)).unwrap();
    }

    let energies = collect_sweep(dir.path(), "Scale_{}", &scales, toten_in);
    let lattices = collect_sweep(dir.path(), "Scale_{}", &scales, lattice_constant_in);
    assert!(energies.iter().chain(lattices.iter()).all(|p| p.value.is_some()));
    assert_relative_eq!(lattices[0].value.unwrap(), 2.4677 * 0.97, epsilon = 1e-10);

    let a = lattices.iter().filter_map(|p| p.value).collect::<Vec<_>>();
    let e = energies.iter().filter_map(|p| p.value).collect::<Vec<_>>();
    let fit = fit_lattice(&a, &e).unwrap();
    let (a0, e0) = fit.optimum.unwrap();
    assert_relative_eq!(a0, 2.47, epsilon = 1e-4);
    assert_relative_eq!(e0, -18.0, epsilon = 1e-4);
}
