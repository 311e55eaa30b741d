#![doc = include_str!("../README.md")]

pub mod chem;
pub mod discretize;
pub mod domain;
pub mod files;
pub mod grid;
pub mod load;
pub mod mesh;
pub mod parse;
pub mod prelude;
mod utils;
pub mod write_mesh;

pub use mesh::{Adjacency, Edge, Hexahedron, Point, Quadrilateral, Tetrahedron, Triangle, Vector};
pub use mesh::{HexBody, Mesh, MeshBody, MeshKind, TetBody};

pub use chem::{check_chemical_compatibility, Nucleus};
pub use discretize::{label_point, mesh_box, MeshCounts};
pub use domain::Domain;
pub use files::FileKind;
pub use grid::{read_grid_file, write_grid_file};
pub use load::{load_mesh, AutoApprove, CommandRemesher, Confirm, LoadConfig};
pub use load::{LoadOutcome, Remesher, StdinConfirm};
pub use parse::read_mesh_file;
pub use write_mesh::{write_mesh, write_mesh_file};

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Could not open `{path}`: {source}")]
    Open {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("Error while handling a file name or extension: {0}")]
    File(#[from] files::FileError),
    #[error("Error while parsing a mesh file: {0}")]
    MeshParse(#[from] parse::MeshParseError),
    #[error("Error while writing a mesh file: {0}")]
    MeshWrite(#[from] write_mesh::MeshWriteError),
    #[error("Error while handling a grid file: {0}")]
    Grid(#[from] grid::GridError),
    #[error("Error while checking chemistry data: {0}")]
    Chem(#[from] chem::ChemError),
    #[error("Inconsistent discretization: {0}")]
    Domain(#[from] domain::DomainError),
    #[error("Inconsistent mesh structure: {0}")]
    Discretize(#[from] discretize::DiscretizeError),
    #[error("The external remesher failed on `{path}`: {reason}")]
    Remesh {
        path: std::path::PathBuf,
        reason: String,
    },
    #[error("Could not read an answer from the confirmation prompt")]
    Prompt,
}
