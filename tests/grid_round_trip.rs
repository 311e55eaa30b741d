use boxmesh::grid::{parse_grid, write_grid_file};
use boxmesh::load::{load_mesh, AutoApprove, LoadConfig, LoadOutcome, Remesher};
use boxmesh::prelude::*;

use std::path::{Path, PathBuf};

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("boxmesh-grid-{}-{}", tag, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn nuclei() -> Vec<Nucleus> {
    vec![
        Nucleus { x: 0.5, y: 0.5, z: 0.5, charge: 8 },
        Nucleus { x: 1.5, y: 1.0, z: 0.5, charge: 1 },
    ]
}

fn write_chem_file(path: &Path, nuclei: &[Nucleus]) {
    let mut text = String::from("MolecularOrbitals 5\nPrimitives 30\n");
    text.push_str(&format!("Nuclei {}\n", nuclei.len()));
    for nucleus in nuclei {
        text.push_str(&format!(
            "{} {} {} {}\n",
            nucleus.x, nucleus.y, nucleus.z, nucleus.charge
        ));
    }
    std::fs::write(path, text).unwrap();
}

/// labelled hexahedral sample on a uniform 5x5x5 vertex grid
fn sample() -> (Domain, Mesh) {
    let domain = Domain::new([0.; 3], [2.; 3], [5, 5, 5]);
    let mut mesh = mesh_box(&domain, MeshKind::Hexahedral).unwrap();
    if let MeshBody::Hexahedral(body) = &mut mesh.body {
        for (index, hexahedron) in body.hexahedra.iter_mut().enumerate() {
            hexahedron.label = if index < 32 { 3 } else { 2 };
        }
    }
    (domain, mesh)
}

#[test]
fn grid_file_round_trip_recovers_the_discretization() {
    let dir = scratch_dir("roundtrip");
    let (domain, mesh) = sample();

    let path = dir.join("case.cube");
    write_grid_file(&domain, &nuclei(), &mesh, &path).unwrap();

    let grid = parse_grid(&std::fs::read(&path).unwrap()).unwrap();

    // cell counts are one less than vertex counts, and the half-step origin
    // correction cancels on the way back
    assert_eq!(grid.domain.points, domain.points);
    for axis in 0..3 {
        assert!((grid.domain.min[axis] - domain.min[axis]).abs() < 1.0e-14);
        assert!((grid.domain.max[axis] - domain.max[axis]).abs() < 1.0e-14);
        assert!((grid.domain.step[axis] - domain.step[axis]).abs() < 1.0e-14);
    }
    assert_eq!(grid.nuclei, nuclei());
}

#[test]
fn grid_to_mesh_conversion_recovers_the_labels() {
    let dir = scratch_dir("labels");
    let (domain, mesh) = sample();

    let cube = dir.join("case.cube");
    write_grid_file(&domain, &nuclei(), &mesh, &cube).unwrap();
    let chem = dir.join("case.chem");
    write_chem_file(&chem, &nuclei());

    let (recovered, converted) = read_grid_file(&cube, &chem, MeshKind::Hexahedral).unwrap();
    assert_eq!(recovered.points, domain.points);

    let original = mesh.hex_body().unwrap();
    let rebuilt = converted.hex_body().unwrap();
    assert_eq!(original.hexahedra.len(), rebuilt.hexahedra.len());
    for (a, b) in original.hexahedra.iter().zip(rebuilt.hexahedra.iter()) {
        assert_eq!(a.label, b.label);
        assert_eq!(a.p1, b.p1);
        assert_eq!(a.p8, b.p8);
    }
}

#[test]
fn grid_conversion_fails_on_incompatible_chemistry() {
    let dir = scratch_dir("chem-mismatch");
    let (domain, mesh) = sample();

    let cube = dir.join("case.cube");
    write_grid_file(&domain, &nuclei(), &mesh, &cube).unwrap();

    let mut displaced = nuclei();
    displaced[1].x += 0.25;
    let chem = dir.join("case.chem");
    write_chem_file(&chem, &displaced);

    let result = read_grid_file(&cube, &chem, MeshKind::Hexahedral);
    assert!(result.is_err());
}

struct NoRemesh;

impl Remesher for NoRemesh {
    fn remesh(&self, _path: &Path) -> Result<(), Error> {
        Ok(())
    }
}

#[test]
fn orchestration_converts_a_cube_input_to_the_default_mesh_name() {
    let dir = scratch_dir("orchestrate");
    let (domain, mesh) = sample();

    let cube = dir.join("case.cube");
    write_grid_file(&domain, &nuclei(), &mesh, &cube).unwrap();
    let chem = dir.join("case.chem");
    write_chem_file(&chem, &nuclei());

    let mut config = LoadConfig {
        domain: Domain::new([0.; 3], [1.; 3], [3, 3, 3]),
        kind: MeshKind::Hexahedral,
        info_path: dir.join("case.info"),
        mesh_path: Some(cube),
        chem_path: chem,
        interactive: false,
    };

    let outcome = load_mesh(&mut config, &NoRemesh, &AutoApprove).unwrap();
    let loaded = match outcome {
        LoadOutcome::Loaded(mesh) => mesh,
        LoadOutcome::Declined => panic!("unexpected decline"),
    };

    // the discretization parameters were taken over from the grid header
    assert_eq!(config.domain.points, [5, 5, 5]);
    assert_eq!(config.mesh_path, Some(dir.join("case.mesh")));
    assert!(dir.join("case.mesh").exists());

    // and the persisted mesh file reloads to the converted mesh
    let reloaded = read_mesh_file(&dir.join("case.mesh"), MeshKind::Hexahedral).unwrap();
    assert_eq!(reloaded, loaded);
}
