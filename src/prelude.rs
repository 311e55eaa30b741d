//! Common traits and types that are useful for working with `boxmesh`
#![allow(unused_imports)]

pub use crate::chem::{check_chemical_compatibility, Nucleus};
pub use crate::discretize::{label_point, mesh_box, mesh_box_declared, MeshCounts};
pub use crate::domain::Domain;
pub use crate::files::FileKind;
pub use crate::grid::{parse_grid, read_grid_file, write_grid, write_grid_file, CellScalars};
pub use crate::load::{load_mesh, Confirm, LoadConfig, LoadOutcome, Remesher};
pub use crate::mesh::{
    Adjacency, Edge, HexBody, Hexahedron, Mesh, MeshBody, MeshKind, Point, Quadrilateral,
    TetBody, Tetrahedron, Triangle, Vector,
};
pub use crate::parse::{parse_mesh, read_mesh_file};
pub use crate::write_mesh::{write_mesh, write_mesh_file};
pub use crate::Error;
