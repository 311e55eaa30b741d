use boxmesh::prelude::*;

use std::path::PathBuf;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("boxmesh-roundtrip-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

#[test]
fn hexahedral_mesh_survives_a_file_round_trip() {
    let domain = Domain::new([0.; 3], [3.; 3], [4, 4, 4]);
    let mesh = mesh_box(&domain, MeshKind::Hexahedral).unwrap();

    let path = scratch("hex.mesh");
    write_mesh_file(&domain, &mesh, &path, None).unwrap();
    let reloaded = read_mesh_file(&path, MeshKind::Hexahedral).unwrap();

    // positions compare bit-for-bit after the fixed-precision print
    assert_eq!(reloaded, mesh);
}

#[test]
fn tetrahedral_mesh_survives_a_file_round_trip() {
    let domain = Domain::new([-1.0, 0.0, 2.0], [1.0, 3.0, 4.5], [5, 4, 6]);
    let mesh = mesh_box(&domain, MeshKind::Tetrahedral).unwrap();

    let path = scratch("tet.mesh");
    write_mesh_file(&domain, &mesh, &path, None).unwrap();
    let reloaded = read_mesh_file(&path, MeshKind::Tetrahedral).unwrap();

    assert_eq!(reloaded, mesh);
}

#[test]
fn repeated_save_load_cycles_are_byte_stable() {
    let domain = Domain::new([0.; 3], [1.; 3], [4, 4, 4]);
    let mesh = mesh_box(&domain, MeshKind::Tetrahedral).unwrap();

    let first = scratch("cycle1.mesh");
    write_mesh_file(&domain, &mesh, &first, None).unwrap();
    let once = read_mesh_file(&first, MeshKind::Tetrahedral).unwrap();

    let second = scratch("cycle2.mesh");
    write_mesh_file(&domain, &once, &second, None).unwrap();
    let twice = read_mesh_file(&second, MeshKind::Tetrahedral).unwrap();

    assert_eq!(once, twice);
    assert_eq!(
        std::fs::read(&first).unwrap(),
        std::fs::read(&second).unwrap()
    );
}

#[test]
fn out_of_range_vertex_reference_is_rejected_not_read() {
    let text = "MeshVersionFormatted 2\n\nDimension 3\n\
        \nVertices\n4\n\
        0. 0. 0. 145 \n1. 0. 0. 125 \n0. 1. 0. 345 \n0. 0. 1. 146 \n\
        \nTriangles\n1\n1 2 3 5 \n\
        \nTetrahedra\n1\n1 2 3 5 0 \n\
        \nEnd";

    let path = scratch("bad-ref.mesh");
    std::fs::write(&path, text).unwrap();
    let result = read_mesh_file(&path, MeshKind::Tetrahedral);
    assert!(result.is_err());

    let zero = text.replace("1 2 3 5 0", "0 2 3 4 0");
    std::fs::write(&path, zero).unwrap();
    let result = read_mesh_file(&path, MeshKind::Tetrahedral);
    assert!(result.is_err());
}

#[test]
fn only_the_mesh_extension_is_accepted() {
    let path = scratch("grid.cube");
    std::fs::write(&path, "not a mesh").unwrap();
    assert!(read_mesh_file(&path, MeshKind::Hexahedral).is_err());

    let domain = Domain::new([0.; 3], [1.; 3], [3, 3, 3]);
    let mesh = mesh_box(&domain, MeshKind::Hexahedral).unwrap();
    assert!(write_mesh_file(&domain, &mesh, &path, None).is_err());
}
