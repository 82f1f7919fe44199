use std::path::PathBuf;

use approx::assert_relative_eq;
use rsband::{
    ExtractResult,
    types::Axis,
    vasp_parsers::{
        band::BandStructure,
        chg::Potential,
        dos::{
            ColumnLayout,
            DosTable,
            PdosChannels,
        },
        fermi::fermi_from_file,
        klabels::KLabels,
        outcar::Outcar,
        pband::ProjectedBands,
        poscar::Poscar,
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


#[test]
fn test_read_klabels() -> ExtractResult<()> {
    let kl = KLabels::from_file(&get_fpath_in_current_dir!("KLABELS"))?;
    assert_eq!(kl.labels, vec!["GAMMA", "M", "K", "GAMMA"]);
    assert_eq!(kl.coords, vec![0.0, 1.0, 1.6, 2.8]);
    assert_eq!(kl.find(&["K", "K1"]), Some(("K", 1.6)));
    Ok(())
}


#[test]
fn test_read_band() -> ExtractResult<()> {
    let band = BandStructure::from_file(&get_fpath_in_current_dir!("REFORMATTED_BAND.dat"))?;
    assert_eq!(band.nkpoints(), 15);
    assert_eq!(band.nbands(), 4);
    assert_relative_eq!(band.kpath[8], 1.6);
    assert_relative_eq!(band.eigs[[8, 1]], -0.05);
    assert_relative_eq!(band.eigs[[8, 2]], 0.05);
    Ok(())
}


#[test]
fn test_read_pband() -> ExtractResult<()> {
    let pband = ProjectedBands::from_file(&get_fpath_in_current_dir!("PBAND_C.dat"))?;
    assert_eq!(pband.orbitals, vec!["s", "py", "pz", "px", "tot"]);
    assert_eq!(pband.nbands(), 2);
    assert_eq!(pband.bands[1].index, 2);
    assert_eq!(pband.bands[1].kpath.len(), 15);
    assert_relative_eq!(pband.bands[1].weights[[3, 2]], 0.8);
    Ok(())
}


#[test]
fn test_read_dos() -> ExtractResult<()> {
    let tdos = DosTable::from_file(&get_fpath_in_current_dir!("TDOS.dat"))?;
    assert_eq!(tdos.len(), 13);
    assert_eq!(tdos.ncols(), 2);
    assert_relative_eq!(tdos.energies[0], -3.0);

    let pdos = DosTable::from_file(&get_fpath_in_current_dir!("PDOS_USER.dat"))?;
    assert_eq!(pdos.ncols(), 6);
    let channels = PdosChannels::from_table(&pdos);
    assert_eq!(channels.layout, ColumnLayout::NonSpin);
    assert_relative_eq!(channels.pz[0], 0.5);
    assert_relative_eq!(channels.p()[0], 0.75);
    Ok(())
}


#[test]
fn test_read_fermi_file() -> ExtractResult<()> {
    assert_eq!(fermi_from_file(&get_fpath_in_current_dir!("FERMI_ENERGY"))?, -2.3164);
    assert!(fermi_from_file(&get_fpath_in_current_dir!("NOT_EXIST")).is_err());
    Ok(())
}


#[test]
fn test_read_outcar() -> ExtractResult<()> {
    let outcar = Outcar::from_file(&get_fpath_in_current_dir!("OUTCAR"))?;
    assert_eq!(outcar.toten, vec![-18.44501302, -18.45008837]);
    assert_eq!(outcar.final_toten(), Some(-18.45008837));
    assert_eq!(outcar.efermi()?, -2.0);
    Ok(())
}


#[test]
fn test_read_contcar() -> ExtractResult<()> {
    let pos = Poscar::from_file(&get_fpath_in_current_dir!("CONTCAR"))?;
    assert_eq!(pos.positions.len(), 2);
    assert_relative_eq!(pos.lattice_constant(), 2.4677, epsilon = 1e-12);
    Ok(())
}


#[test]
fn test_read_locpot() -> ExtractResult<()> {
    let pot = Potential::from_file(&get_fpath_in_current_dir!("LOCPOT"))?;
    assert_eq!(pot.ngrid, [1, 1, 10]);
    assert_relative_eq!(pot.axis_length(Axis::Z), 20.0);

    let avg = pot.planar_average(Axis::Z);
    assert_eq!(avg.len(), 10);
    assert_relative_eq!(avg[0], -10.0);
    assert_relative_eq!(avg[9], 5.0);
    Ok(())
}
