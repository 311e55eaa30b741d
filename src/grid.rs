//! Reading and writing the `.cube` volumetric grid format.
//!
//! The grid format is cell-centred: its header counts cells and places the
//! origin at the centre of the first cell, while the mesh formats count
//! vertices sitting on cell corners. Reading therefore adds one to every axis
//! count and shifts the origin back by half a step; writing performs the
//! inverse.
//!
//! The per-cell scalar list at the end of the file is optional. When present
//! it is kept as an [`Array3`] and mapped onto element labels (`2` for a zero
//! background cell, `3` for a nonzero foreground cell); when absent all
//! labels default to zero with a warning.

use crate::chem::{check_chemical_compatibility, Nucleus};
use crate::discretize::{mesh_box_declared, MeshCounts};
use crate::domain::{Domain, DomainError, AXIS_NAMES};
use crate::files::{self, FileKind};
use crate::mesh::{Mesh, MeshBody, MeshKind};
use crate::parse::{ScanError, Scanner};
use crate::Error;

use derive_more::{Constructor, Deref, DerefMut, Into};
use ndarray::Array3;

use std::io::Write;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("{0}")]
    Scan(#[from] ScanError),
    #[error("expecting a positive number of nuclei instead of {count}")]
    BadNucleusCount { count: i64 },
    #[error(
        "expecting at least two cells along {axis} instead of {cells} (so that each face \
         of the box keeps at least one normal/tangent vector)"
    )]
    AxisTooCoarse { axis: &'static str, cells: i64 },
    #[error("only orthogonal bases are supported: the {axis} step vector has a nonzero off-diagonal component {value}")]
    NonAxisAlignedStep { axis: &'static str, value: f64 },
    #[error("expecting a positive step along {axis} instead of {value}")]
    NonPositiveStep { axis: &'static str, value: f64 },
    #[error(
        "the charge (={charge}) of the {index}-th nucleus must be a positive integer \
         not (strictly) greater than one hundred"
    )]
    ChargeOutOfRange { index: usize, charge: i64 },
    #[error(
        "the charge of the {index}-th nucleus read as a float (={float}) should equal \
         its integer value (={integer})"
    )]
    ChargeEchoMismatch {
        index: usize,
        integer: i64,
        float: f64,
    },
    #[error("while reading the {index}-th cell scalar: {source}")]
    ScalarRead { index: usize, source: ScanError },
    #[error("the {count} cell scalars do not fill a {x} x {y} x {z} grid")]
    ScalarShape {
        count: usize,
        x: usize,
        y: usize,
        z: usize,
    },
    #[error("a grid file cannot be written from a tetrahedral mesh")]
    TetrahedralWriteUnsupported,
    #[error("expecting {expected} hexahedra instead of {actual} for the grid being written")]
    HexahedronCountMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("io failure while writing grid data: {0}")]
    Io(#[from] std::io::Error),
}

/// the per-cell scalar field carried by a grid file
#[derive(Deref, DerefMut, Into, Constructor, Clone, PartialEq, Debug)]
pub struct CellScalars(Array3<f64>);

/// everything a grid file describes, before conversion to a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct GridData {
    pub domain: Domain,
    pub nuclei: Vec<Nucleus>,
    pub scalars: Option<CellScalars>,
}

/// parse the grid grammar out of raw bytes
pub fn parse_grid(input: &[u8]) -> Result<GridData, GridError> {
    let mut scanner = Scanner::new(input);

    // two free-text header lines
    scanner.skip_line("the first grid header line")?;
    scanner.skip_line("the second grid header line")?;

    let count = scanner.read_int("the number of nuclei")?;
    if count < 1 {
        return Err(GridError::BadNucleusCount { count });
    }
    let nnucl = count as usize;

    let mut origin = [0.0; 3];
    for value in origin.iter_mut() {
        *value = scanner.read_f64("an origin coordinate")?;
    }

    let mut cells = [0usize; 3];
    let mut step = [0.0; 3];
    for axis in 0..3 {
        let declared = scanner.read_int("a cell count")?;
        if declared < 2 {
            return Err(GridError::AxisTooCoarse {
                axis: AXIS_NAMES[axis],
                cells: declared,
            });
        }
        cells[axis] = declared as usize;

        for component in 0..3 {
            let value = scanner.read_f64("a step component")?;
            if component == axis {
                if value <= 0.0 {
                    return Err(GridError::NonPositiveStep {
                        axis: AXIS_NAMES[axis],
                        value,
                    });
                }
                step[axis] = value;
            } else if value != 0.0 {
                return Err(GridError::NonAxisAlignedStep {
                    axis: AXIS_NAMES[axis],
                    value,
                });
            }
        }
    }

    // grid values sit at cell centres; mesh vertices sit on cell corners
    let mut min = [0.0; 3];
    let mut max = [0.0; 3];
    let mut points = [0usize; 3];
    for axis in 0..3 {
        min[axis] = origin[axis] - 0.5 * step[axis];
        max[axis] = min[axis] + cells[axis] as f64 * step[axis];
        points[axis] = cells[axis] + 1;
    }
    let domain = Domain::new(min, max, points);

    let mut nuclei = Vec::with_capacity(nnucl);
    for index in 0..nnucl {
        let charge = scanner.read_int("a nucleus charge")?;
        if !(1..=100).contains(&charge) {
            return Err(GridError::ChargeOutOfRange {
                index: index + 1,
                charge,
            });
        }

        let echo = scanner.read_f64("the charge echoed as a float")?;
        if echo != charge as f64 {
            return Err(GridError::ChargeEchoMismatch {
                index: index + 1,
                integer: charge,
                float: echo,
            });
        }

        let x = scanner.read_f64("a nucleus coordinate")?;
        let y = scanner.read_f64("a nucleus coordinate")?;
        let z = scanner.read_f64("a nucleus coordinate")?;
        nuclei.push(Nucleus {
            x,
            y,
            z,
            charge: charge as i32,
        });
    }

    let scalars = if scanner.at_end() {
        log::warn!(
            "no cell scalars saved in the grid file, element labels will default to zero"
        );
        None
    } else {
        let total = cells[0] * cells[1] * cells[2];
        let mut values = Vec::with_capacity(total);
        for index in 0..total {
            let value = scanner
                .read_f64("a cell scalar")
                .map_err(|source| GridError::ScalarRead {
                    index: index + 1,
                    source,
                })?;
            values.push(value);
        }
        let array = Array3::from_shape_vec((cells[0], cells[1], cells[2]), values).map_err(
            |_| GridError::ScalarShape {
                count: total,
                x: cells[0],
                y: cells[1],
                z: cells[2],
            },
        )?;
        Some(CellScalars::new(array))
    };

    Ok(GridData {
        domain,
        nuclei,
        scalars,
    })
}

/// read a `.cube` file, validate its nuclei against the chemistry file, and
/// convert it into a freshly discretized mesh
pub fn read_grid_file(
    path: &Path,
    chem_path: &Path,
    kind: MeshKind,
) -> Result<(Domain, Mesh), Error> {
    FileKind::expect(path, FileKind::Cube)?;

    log::info!("opening {} for reading", path.display());
    let buffer = std::fs::read(path).map_err(|source| Error::Open {
        path: path.into(),
        source,
    })?;

    let grid = parse_grid(&buffer)?;

    check_chemical_compatibility(chem_path, &grid.nuclei)?;

    let counts = MeshCounts::expected(kind, grid.domain.points);
    let mut mesh = mesh_box_declared(&grid.domain, kind, &counts)?;

    if let Some(scalars) = &grid.scalars {
        apply_cell_labels(&mut mesh, scalars);
    }

    let tally = MeshCounts::of_mesh(&mesh);
    match kind {
        MeshKind::Tetrahedral => log::info!(
            "mesh data successfully loaded: {} vertices, {} tetrahedra and {} boundary \
             triangles ({} corners, {} edges, {} tangent and {} normal vectors)",
            tally.vertices,
            tally.tetrahedra,
            tally.triangles,
            tally.corners,
            tally.edges,
            tally.tangents,
            tally.normals
        ),
        MeshKind::Hexahedral => log::info!(
            "mesh data successfully loaded: {} vertices, {} hexahedra and {} boundary \
             quadrilaterals",
            tally.vertices,
            tally.hexahedra,
            tally.quadrilaterals
        ),
    }

    Ok((grid.domain, mesh))
}

/// map each cell scalar onto the element labels: background (zero) cells get
/// label 2, foreground cells label 3
fn apply_cell_labels(mesh: &mut Mesh, scalars: &CellScalars) {
    match &mut mesh.body {
        MeshBody::Hexahedral(body) => {
            for (hexahedron, value) in body.hexahedra.iter_mut().zip(scalars.iter()) {
                hexahedron.label = if *value == 0.0 { 2 } else { 3 };
            }
        }
        MeshBody::Tetrahedral(body) => {
            // six tetrahedra share each cell
            let flat: Vec<f64> = scalars.iter().copied().collect();
            for (index, tetrahedron) in body.tetrahedra.iter_mut().enumerate() {
                tetrahedron.label = if flat[index / 6] == 0.0 { 2 } else { 3 };
            }
        }
    }
}

/// derive the output path for a grid write: an explicit `.cube` name, a
/// `.mesh` name with the extension swapped, or the `.info` companion default
pub fn resolve_grid_output(
    explicit: Option<&Path>,
    info: &Path,
) -> Result<std::path::PathBuf, Error> {
    Ok(files::resolve_grid_output(explicit, info)?)
}

/// write the grid representation of a hexahedral mesh to any [`Write`] sink
pub fn write_grid<W: Write>(
    mut writer: W,
    domain: &Domain,
    nuclei: &[Nucleus],
    mesh: &Mesh,
) -> Result<(), GridError> {
    let body = match &mesh.body {
        MeshBody::Hexahedral(body) => body,
        MeshBody::Tetrahedral(_) => return Err(GridError::TetrahedralWriteUnsupported),
    };

    if nuclei.is_empty() {
        return Err(GridError::BadNucleusCount { count: 0 });
    }

    domain.validate(MeshKind::Hexahedral)?;

    let [cx, cy, cz] = domain.cells();
    let total = cx * cy * cz;
    if body.hexahedra.len() != total {
        return Err(GridError::HexahedronCountMismatch {
            expected: total,
            actual: body.hexahedra.len(),
        });
    }

    let mut float = ryu::Buffer::new();

    // header: cell-centred origin, then (cell count, step vector) per axis
    write!(writer, "CubeFile\nNew grid\n    {}", nuclei.len())?;
    for axis in 0..3 {
        write!(
            writer,
            "    {}",
            crate::utils::format_e8(domain.min[axis] + 0.5 * domain.step[axis])
        )?;
    }
    writeln!(writer)?;
    for axis in 0..3 {
        write!(writer, "    {}", domain.cells()[axis])?;
        for component in 0..3 {
            let value = if component == axis { domain.step[axis] } else { 0.0 };
            write!(writer, "    {}", float.format(value))?;
        }
        writeln!(writer)?;
    }

    for (index, nucleus) in nuclei.iter().enumerate() {
        if !(1..=100).contains(&nucleus.charge) {
            return Err(GridError::ChargeOutOfRange {
                index: index + 1,
                charge: nucleus.charge as i64,
            });
        }
        write!(writer, "    {}", nucleus.charge)?;
        write!(writer, "    {}", float.format(nucleus.charge as f64))?;
        write!(writer, "    {}", crate::utils::format_e8(nucleus.x))?;
        write!(writer, "    {}", crate::utils::format_e8(nucleus.y))?;
        write!(writer, "    {}", crate::utils::format_e8(nucleus.z))?;
        writeln!(writer)?;
    }

    // the flat scalar list, six values per line, from the label magnitudes
    for (index, hexahedron) in body.hexahedra.iter().enumerate() {
        if index % 6 == 0 {
            writeln!(writer)?;
        }
        let value = match hexahedron.label.abs() {
            2 => 0.0,
            3 => 1.0,
            _ => 0.0,
        };
        write!(writer, "    {}", float.format(value))?;
    }

    Ok(())
}

/// write the grid representation of a hexahedral mesh to the file at `path`
pub fn write_grid_file(
    domain: &Domain,
    nuclei: &[Nucleus],
    mesh: &Mesh,
    path: &Path,
) -> Result<(), Error> {
    FileKind::expect(path, FileKind::Cube)?;

    log::info!("opening {} for writing", path.display());
    let file = std::fs::File::create(path).map_err(|source| Error::Open {
        path: path.into(),
        source,
    })?;
    let mut writer = std::io::BufWriter::new(file);

    write_grid(&mut writer, domain, nuclei, mesh)?;
    writer.flush().map_err(GridError::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretize::mesh_box;

    const GRID_FILE: &str = "CubeFile\nNew grid\n\
        \x20   1    2.50000000e-01    2.50000000e-01    2.50000000e-01\n\
        \x20   2    0.5    0.0    0.0\n\
        \x20   2    0.0    0.5    0.0\n\
        \x20   2    0.0    0.0    0.5\n\
        \x20   8    8.0    0.0    0.0    0.5\n\
        \n    1.0    0.0    0.0    1.0    0.0    0.0\n\
        \n    0.0    1.0\n";

    #[test]
    fn header_is_shifted_to_vertex_coordinates() {
        let grid = parse_grid(GRID_FILE.as_bytes()).unwrap();
        assert_eq!(grid.domain.points, [3, 3, 3]);
        assert_eq!(grid.domain.min, [0.0, 0.0, 0.0]);
        assert_eq!(grid.domain.max, [1.0, 1.0, 1.0]);
        assert_eq!(grid.nuclei.len(), 1);
        assert_eq!(grid.nuclei[0].charge, 8);

        let scalars = grid.scalars.unwrap();
        assert_eq!(scalars.shape(), &[2, 2, 2]);
        assert_eq!(scalars[[0, 0, 0]], 1.0);
        assert_eq!(scalars[[0, 0, 1]], 0.0);
    }

    #[test]
    fn missing_scalars_is_tolerated() {
        // keep the header and nuclei, drop the scalar list
        let truncated: String = GRID_FILE
            .lines()
            .take(7)
            .map(|l| format!("{}\n", l))
            .collect();
        let grid = parse_grid(truncated.as_bytes()).unwrap();
        assert!(grid.scalars.is_none());
    }

    #[test]
    fn skewed_step_vectors_are_rejected() {
        let input = GRID_FILE.replace("    2    0.5    0.0    0.0", "    2    0.5    0.1    0.0");
        let result = parse_grid(input.as_bytes());
        assert!(matches!(
            result,
            Err(GridError::NonAxisAlignedStep { axis: "x", .. })
        ));
    }

    #[test]
    fn charge_echo_must_match() {
        let input = GRID_FILE.replace("    8    8.0", "    8    9.0");
        let result = parse_grid(input.as_bytes());
        assert!(matches!(
            result,
            Err(GridError::ChargeEchoMismatch { integer: 8, .. })
        ));
    }

    #[test]
    fn short_scalar_list_is_fatal() {
        let input = GRID_FILE.replace("\n    0.0    1.0\n", "\n    0.0\n");
        let result = parse_grid(input.as_bytes());
        assert!(matches!(result, Err(GridError::ScalarRead { index: 8, .. })));
    }

    #[test]
    fn grid_write_then_parse_recovers_the_domain() {
        let domain = Domain::new([0.0; 3], [2.0; 3], [5, 5, 5]);
        let mut mesh = mesh_box(&domain, MeshKind::Hexahedral).unwrap();
        if let MeshBody::Hexahedral(body) = &mut mesh.body {
            for (index, hexahedron) in body.hexahedra.iter_mut().enumerate() {
                hexahedron.label = if index % 2 == 0 { 2 } else { 3 };
            }
        }
        let nuclei = [Nucleus { x: 1.0, y: 1.0, z: 1.0, charge: 6 }];

        let mut buffer = Vec::new();
        write_grid(&mut buffer, &domain, &nuclei, &mesh).unwrap();
        let grid = parse_grid(&buffer).unwrap();

        assert_eq!(grid.domain.points, domain.points);
        for axis in 0..3 {
            assert!((grid.domain.min[axis] - domain.min[axis]).abs() < 1.0e-14);
            assert!((grid.domain.max[axis] - domain.max[axis]).abs() < 1.0e-14);
            assert!((grid.domain.step[axis] - domain.step[axis]).abs() < 1.0e-14);
        }
        assert_eq!(grid.nuclei[0], nuclei[0]);

        // background/foreground alternation survives the trip
        let scalars = grid.scalars.unwrap();
        let values: Vec<f64> = scalars.iter().copied().collect();
        assert_eq!(values[0], 0.0);
        assert_eq!(values[1], 1.0);
    }

    #[test]
    fn tetrahedral_grid_write_is_refused() {
        let domain = Domain::new([0.0; 3], [2.0; 3], [3, 3, 3]);
        let mesh = mesh_box(&domain, MeshKind::Tetrahedral).unwrap();
        let nuclei = [Nucleus { x: 1.0, y: 1.0, z: 1.0, charge: 6 }];

        let mut buffer = Vec::new();
        let result = write_grid(&mut buffer, &domain, &nuclei, &mesh);
        assert!(matches!(result, Err(GridError::TetrahedralWriteUnsupported)));
    }
}
