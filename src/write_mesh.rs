//! Serializing a mesh into the `.mesh` interchange format.
//!
//! The writer re-validates everything the reader would check: vertex
//! coordinates must sit inside the computational box, vertex references must
//! stay in bounds, and a structured grid must agree with the discretization
//! parameters. Whatever happens, the emitted stream is terminated with the
//! `End` marker so a failed write still leaves a syntactically closed file.

use crate::domain::{Domain, DomainError};
use crate::files::{self, FileKind};
use crate::mesh::{Adjacency, HexBody, Mesh, MeshBody, MeshKind, TetBody};
use crate::utils::format_e8;
use crate::Error;

use std::io::Write;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum MeshWriteError {
    #[error("expecting a positive number of {entity} instead of zero")]
    EmptyBlock { entity: &'static str },
    #[error(
        "the coordinates ({x}, {y}, {z}) of the {index}-th vertex do not belong to the \
         computational box [{x_min}, {x_max}] x [{y_min}, {y_max}] x [{z_min}, {z_max}]"
    )]
    VertexOutsideBox {
        index: usize,
        x: f64,
        y: f64,
        z: f64,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
        z_min: f64,
        z_max: f64,
    },
    #[error(
        "the {slot} vertex of the {index}-th {entity} is referred to as {value}, which \
         should be a positive integer not (strictly) greater than the total number of \
         vertices {vertices}"
    )]
    VertexRefOutOfBounds {
        entity: &'static str,
        index: usize,
        slot: &'static str,
        value: usize,
        vertices: usize,
    },
    #[error("expecting {expected} vertices instead of {actual} for the structured grid")]
    VertexCountMismatch { expected: usize, actual: usize },
    #[error("expecting at least {expected} quadrilaterals instead of {actual}")]
    TooFewQuadrilaterals { expected: usize, actual: usize },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("io failure while writing mesh data: {0}")]
    Io(#[from] std::io::Error),
}

/// write a mesh to any [`Write`] sink
///
/// `adjacencies` optionally drives the export-only relabeling of hexahedra
/// around an interface: a `hexout` carrying label 3 is exported with label 2
/// and a `hexin` carrying label 2 with label 3, so the written labels reflect
/// the topological sidedness without the in-memory mesh ever being touched.
pub fn write_mesh<W: Write>(
    mut writer: W,
    domain: &Domain,
    mesh: &Mesh,
    adjacencies: Option<&[Adjacency]>,
) -> Result<(), MeshWriteError> {
    let result = write_mesh_inner(&mut writer, domain, mesh, adjacencies);
    if result.is_err() {
        // leave a closed, if incomplete, document behind
        let _ = write!(writer, "\nEnd");
    }
    result
}

/// write a mesh to the file at `path` (created or truncated)
pub fn write_mesh_file(
    domain: &Domain,
    mesh: &Mesh,
    path: &Path,
    adjacencies: Option<&[Adjacency]>,
) -> Result<(), Error> {
    FileKind::expect(path, FileKind::Mesh)?;

    log::info!("opening {} for writing", path.display());
    let file = std::fs::File::create(path).map_err(|source| Error::Open {
        path: path.into(),
        source,
    })?;
    let mut writer = std::io::BufWriter::new(file);

    write_mesh(&mut writer, domain, mesh, adjacencies)?;
    writer.flush().map_err(MeshWriteError::from)?;
    Ok(())
}

/// derive the output path for a mesh write the way the orchestration does
///
/// An explicit `.mesh` name is kept, an explicit `.cube` name has its
/// extension swapped, and a missing name falls back to the `.info` companion
/// name with the extension substituted.
pub fn resolve_mesh_output(
    explicit: Option<&Path>,
    info: &Path,
) -> Result<std::path::PathBuf, Error> {
    Ok(files::resolve_mesh_output(explicit, info)?)
}

fn write_mesh_inner<W: Write>(
    writer: &mut W,
    domain: &Domain,
    mesh: &Mesh,
    adjacencies: Option<&[Adjacency]>,
) -> Result<(), MeshWriteError> {
    write!(writer, "MeshVersionFormatted 2\n\nDimension 3\n")?;

    let nver = mesh.vertices.len();
    if nver < 1 {
        return Err(MeshWriteError::EmptyBlock { entity: "vertices" });
    }

    write!(writer, "\nVertices\n{}\n", nver)?;
    for (index, vertex) in mesh.vertices.iter().enumerate() {
        let outside = vertex.x > domain.max[0]
            || vertex.x < domain.min[0]
            || vertex.y > domain.max[1]
            || vertex.y < domain.min[1]
            || vertex.z > domain.max[2]
            || vertex.z < domain.min[2];
        if outside {
            return Err(MeshWriteError::VertexOutsideBox {
                index: index + 1,
                x: vertex.x,
                y: vertex.y,
                z: vertex.z,
                x_min: domain.min[0],
                x_max: domain.max[0],
                y_min: domain.min[1],
                y_max: domain.max[1],
                z_min: domain.min[2],
                z_max: domain.max[2],
            });
        }
        write!(
            writer,
            "{} {} {} {} \n",
            format_e8(vertex.x),
            format_e8(vertex.y),
            format_e8(vertex.z),
            vertex.label
        )?;
    }

    match &mesh.body {
        MeshBody::Hexahedral(body) => {
            write_hex_blocks(writer, domain, body, nver, adjacencies)?
        }
        MeshBody::Tetrahedral(body) => write_tet_blocks(writer, mesh, body, nver)?,
    }

    write!(writer, "\nEnd")?;
    Ok(())
}

fn check_ref(
    value: usize,
    nver: usize,
    entity: &'static str,
    index: usize,
    slot: &'static str,
) -> Result<usize, MeshWriteError> {
    if value < 1 || value > nver {
        Err(MeshWriteError::VertexRefOutOfBounds {
            entity,
            index,
            slot,
            value,
            vertices: nver,
        })
    } else {
        Ok(value)
    }
}

/// export labels for the hexahedra, with the interface relabeling applied
///
/// This mirrors the two-phase sentinel bookkeeping of the adjacency
/// labelling: the first pass marks the affected cells, the output pass maps
/// the marks. Working on a copy keeps the canonical labels intact on every
/// path.
fn export_hex_labels(body: &HexBody, adjacencies: Option<&[Adjacency]>) -> Vec<i32> {
    let mut labels: Vec<i32> = body.hexahedra.iter().map(|h| h.label).collect();

    if let Some(pairs) = adjacencies {
        for pair in pairs {
            match labels.get_mut(pair.hexout.wrapping_sub(1)) {
                Some(label) if *label == 3 => *label = -3,
                Some(_) => {}
                None => log::warn!(
                    "adjacency pair references hexahedron {} which does not exist",
                    pair.hexout
                ),
            }
            match labels.get_mut(pair.hexin.wrapping_sub(1)) {
                Some(label) if *label == 2 => *label = -2,
                Some(_) => {}
                None => log::warn!(
                    "adjacency pair references hexahedron {} which does not exist",
                    pair.hexin
                ),
            }
        }
    }

    for label in labels.iter_mut() {
        *label = match *label {
            -3 => 2,
            -2 => 3,
            other => other,
        };
    }

    labels
}

fn write_hex_blocks<W: Write>(
    writer: &mut W,
    domain: &Domain,
    body: &HexBody,
    nver: usize,
    adjacencies: Option<&[Adjacency]>,
) -> Result<(), MeshWriteError> {
    // the grid must still agree with the discretization parameters
    domain.validate(MeshKind::Hexahedral)?;

    let [nx, ny, nz] = domain.points;
    if nver != nx * ny * nz {
        return Err(MeshWriteError::VertexCountMismatch {
            expected: nx * ny * nz,
            actual: nver,
        });
    }

    // downstream processing may append quadrilaterals but never drop any
    let least = 2 * ((nx - 1) * (ny - 1) + (nx - 1) * (nz - 1) + (ny - 1) * (nz - 1));
    if body.quadrilaterals.len() < least {
        return Err(MeshWriteError::TooFewQuadrilaterals {
            expected: least,
            actual: body.quadrilaterals.len(),
        });
    }

    write!(writer, "\nQuadrilaterals\n{}\n", body.quadrilaterals.len())?;
    for (k, quadrilateral) in body.quadrilaterals.iter().enumerate() {
        let refs = [
            quadrilateral.p1,
            quadrilateral.p2,
            quadrilateral.p3,
            quadrilateral.p4,
        ];
        for (slot, value) in ["first", "second", "third", "fourth"].into_iter().zip(refs) {
            check_ref(value, nver, "quadrilateral", k + 1, slot)?;
        }
        write!(
            writer,
            "{} {} {} {} {} \n",
            quadrilateral.p1, quadrilateral.p2, quadrilateral.p3, quadrilateral.p4,
            quadrilateral.label
        )?;
    }

    let labels = export_hex_labels(body, adjacencies);
    write!(writer, "\nHexahedra\n{}\n", body.hexahedra.len())?;
    for (k, hexahedron) in body.hexahedra.iter().enumerate() {
        let refs = [
            hexahedron.p1,
            hexahedron.p2,
            hexahedron.p3,
            hexahedron.p4,
            hexahedron.p5,
            hexahedron.p6,
            hexahedron.p7,
            hexahedron.p8,
        ];
        let slots = [
            "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth",
        ];
        for (slot, value) in slots.into_iter().zip(refs) {
            check_ref(value, nver, "hexahedron", k + 1, slot)?;
        }
        write!(
            writer,
            "{} {} {} {} {} {} {} {} {} \n",
            hexahedron.p1,
            hexahedron.p2,
            hexahedron.p3,
            hexahedron.p4,
            hexahedron.p5,
            hexahedron.p6,
            hexahedron.p7,
            hexahedron.p8,
            labels[k]
        )?;
    }

    Ok(())
}

fn write_tet_blocks<W: Write>(
    writer: &mut W,
    mesh: &Mesh,
    body: &TetBody,
    nver: usize,
) -> Result<(), MeshWriteError> {
    if body.triangles.is_empty() {
        return Err(MeshWriteError::EmptyBlock { entity: "triangles" });
    }

    write!(writer, "\nTriangles\n{}\n", body.triangles.len())?;
    for (k, triangle) in body.triangles.iter().enumerate() {
        let refs = [triangle.p1, triangle.p2, triangle.p3];
        for (slot, value) in ["first", "second", "third"].into_iter().zip(refs) {
            check_ref(value, nver, "triangle", k + 1, slot)?;
        }
        write!(
            writer,
            "{} {} {} {} \n",
            triangle.p1, triangle.p2, triangle.p3, triangle.label
        )?;
    }

    if !body.edges.is_empty() {
        write!(writer, "\nEdges\n{}\n", body.edges.len())?;
        for (k, edge) in body.edges.iter().enumerate() {
            check_ref(edge.p1, nver, "edge", k + 1, "first")?;
            check_ref(edge.p2, nver, "edge", k + 1, "second")?;
            write!(writer, "{} {} {} \n", edge.p1, edge.p2, edge.label)?;
        }

        write!(writer, "\nRidges\n{}\n", body.edges.len())?;
        for k in 0..body.edges.len() {
            write!(writer, "{} \n", k + 1)?;
        }
    }

    if body.corners != 8 {
        log::warn!(
            "the number of corners should be 8 (the corners of the computational box) \
             instead of {}",
            body.corners
        );
    }

    // the corner blocks are only emitted when the vertex labels actually
    // designate the eight box corners
    if mesh.corner_vertices() == 8 {
        write!(writer, "\nCorners\n8\n")?;
        for (index, vertex) in mesh.vertices.iter().enumerate() {
            if vertex.label > 100 {
                write!(writer, "{} \n", index + 1)?;
            }
        }
        write!(writer, "\nRequiredVertices\n8\n")?;
        for (index, vertex) in mesh.vertices.iter().enumerate() {
            if vertex.label > 100 {
                write!(writer, "{} \n", index + 1)?;
            }
        }
    }

    if body.tetrahedra.is_empty() {
        return Err(MeshWriteError::EmptyBlock { entity: "tetrahedra" });
    }

    write!(writer, "\nTetrahedra\n{}\n", body.tetrahedra.len())?;
    for (k, tetrahedron) in body.tetrahedra.iter().enumerate() {
        let refs = [
            tetrahedron.p1,
            tetrahedron.p2,
            tetrahedron.p3,
            tetrahedron.p4,
        ];
        for (slot, value) in ["first", "second", "third", "fourth"].into_iter().zip(refs) {
            check_ref(value, nver, "tetrahedron", k + 1, slot)?;
        }
        write!(
            writer,
            "{} {} {} {} {} \n",
            tetrahedron.p1, tetrahedron.p2, tetrahedron.p3, tetrahedron.p4, tetrahedron.label
        )?;
    }

    if !body.normals.is_empty() {
        write!(writer, "\nNormals\n{}\n", body.normals.len())?;
        for normal in &body.normals {
            write!(
                writer,
                "{} {} {} \n",
                format_e8(normal.x),
                format_e8(normal.y),
                format_e8(normal.z)
            )?;
        }

        write!(writer, "\nNormalAtVertices\n{}\n", body.normals.len())?;
        for (k, normal) in body.normals.iter().enumerate() {
            check_ref(normal.p, nver, "normal vector", k + 1, "owning")?;
            write!(writer, "{} {} \n", normal.p, k + 1)?;
        }
    }

    if !body.tangents.is_empty() {
        write!(writer, "\nTangents\n{}\n", body.tangents.len())?;
        for (k, tangent) in body.tangents.iter().enumerate() {
            check_ref(tangent.p, nver, "tangent vector", k + 1, "owning")?;
            write!(
                writer,
                "{} {} {} \n",
                format_e8(tangent.x),
                format_e8(tangent.y),
                format_e8(tangent.z)
            )?;
        }

        write!(writer, "\nTangentAtVertices\n{}\n", body.tangents.len())?;
        for (k, tangent) in body.tangents.iter().enumerate() {
            write!(writer, "{} {} \n", tangent.p, k + 1)?;
        }
    }

    Ok(())
}
