//! Discretization parameters of the rectangular computational domain.
//!
//! A [`Domain`] stores the bounding box, the per-axis vertex counts, and the
//! per-axis step sizes. The step is redundant with the other two
//! (`step = (max - min) / (points - 1)`) and the redundancy is checked to a
//! tight absolute tolerance whenever a structured grid is expected.

use crate::mesh::{Mesh, MeshKind};

pub(crate) const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];

/// tolerance used when comparing a stored step against the recomputed one
pub(crate) const STEP_TOLERANCE: f64 = 1.0e-16;

/// tolerance used when checking vertex positions against the lattice
pub(crate) const LATTICE_TOLERANCE: f64 = 1.0e-14;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error(
        "incorrect discretization along {axis}: expecting points > 2 (got {points}), \
         min < max (got [{min}, {max}]), and step == {expected:.18} (got {step:.18})"
    )]
    BadAxis {
        axis: &'static str,
        points: usize,
        min: f64,
        max: f64,
        step: f64,
        expected: f64,
    },
    #[error("expecting at least 9 (=3x3x3) vertices instead of {0}")]
    TooFewVertices(usize),
    #[error(
        "empty bounding box recovered from the mesh vertices: \
         [{x_min}, {x_max}] x [{y_min}, {y_max}] x [{z_min}, {z_max}]"
    )]
    EmptyBoundingBox {
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
        z_min: f64,
        z_max: f64,
    },
    #[error(
        "the vertex count {vertices} is not divisible by the detected slab size {slab}, \
         so no (nx, ny, nz) grid layout fits the mesh"
    )]
    IrregularGrid { vertices: usize, slab: usize },
    #[error("the detected grid ({nx} x {ny} x {nz}) needs at least 3 points per axis")]
    GridTooCoarse { nx: usize, ny: usize, nz: usize },
    #[error(
        "vertex {index} does not sit on the detected lattice: expecting {expected:.18} \
         instead of {actual:.18} for its {axis} coordinate"
    )]
    OffLattice {
        index: usize,
        axis: &'static str,
        expected: f64,
        actual: f64,
    },
    #[error(
        "no hexahedral grid structure was found in the vertex description, \
         which a hexahedral mesh requires"
    )]
    NotAGrid,
}

/// bounding box and per-axis resolution of the computational domain
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub min: [f64; 3],
    pub max: [f64; 3],
    pub step: [f64; 3],
    pub points: [usize; 3],
}

impl Domain {
    /// build a domain from its box and vertex counts, deriving the steps
    pub fn new(min: [f64; 3], max: [f64; 3], points: [usize; 3]) -> Domain {
        let mut step = [0.; 3];
        for axis in 0..3 {
            step[axis] = (max[axis] - min[axis]) / (points[axis] as f64 - 1.0);
        }
        Domain {
            min,
            max,
            step,
            points,
        }
    }

    pub fn nx(&self) -> usize {
        self.points[0]
    }

    pub fn ny(&self) -> usize {
        self.points[1]
    }

    pub fn nz(&self) -> usize {
        self.points[2]
    }

    /// number of grid cells along each axis
    pub fn cells(&self) -> [usize; 3] {
        [self.nx() - 1, self.ny() - 1, self.nz() - 1]
    }

    /// the exact step implied by the box extent and the point count
    pub fn spacing(&self, axis: usize) -> f64 {
        (self.max[axis] - self.min[axis]) / (self.points[axis] as f64 - 1.0)
    }

    /// check the per-axis invariants
    ///
    /// Every axis needs at least 3 points (so each face keeps one strictly
    /// interior normal/tangent) and a non-empty extent. For the hexahedral
    /// kind the stored step must additionally match the recomputed one to
    /// [`STEP_TOLERANCE`]; a tetrahedral mesh may have been through the
    /// external remesher, after which the stored step is only advisory.
    pub fn validate(&self, kind: MeshKind) -> Result<(), DomainError> {
        for axis in 0..3 {
            let expected = self.spacing(axis);
            let step_ok = match kind {
                MeshKind::Hexahedral => (self.step[axis] - expected).abs() < STEP_TOLERANCE,
                MeshKind::Tetrahedral => true,
            };
            if self.points[axis] < 3 || self.min[axis] >= self.max[axis] || !step_ok {
                return Err(DomainError::BadAxis {
                    axis: AXIS_NAMES[axis],
                    points: self.points[axis],
                    min: self.min[axis],
                    max: self.max[axis],
                    step: self.step[axis],
                    expected,
                });
            }
        }
        Ok(())
    }

    /// recover the discretization parameters from a loaded mesh
    ///
    /// The bounding box is always recomputed from the vertices. If the vertex
    /// ordering exhibits the structured layout (the first run of vertices
    /// varies only in `z`, with uniform spacing), the per-axis counts and
    /// steps are inferred from the coordinate runs and every vertex is
    /// checked against the implied lattice to [`LATTICE_TOLERANCE`]. A
    /// hexahedral mesh without that structure is an error; a tetrahedral mesh
    /// simply keeps its previous resolution parameters.
    pub fn from_mesh(&self, mesh: &Mesh, kind: MeshKind) -> Result<Domain, DomainError> {
        let vertices = &mesh.vertices;
        if vertices.len() < 9 {
            return Err(DomainError::TooFewVertices(vertices.len()));
        }

        let mut min = [vertices[0].x, vertices[0].y, vertices[0].z];
        let mut max = min;
        for vertex in &vertices[1..] {
            for (axis, value) in [vertex.x, vertex.y, vertex.z].into_iter().enumerate() {
                if value < min[axis] {
                    min[axis] = value;
                } else if value > max[axis] {
                    max[axis] = value;
                }
            }
        }

        if min[0] >= max[0] || min[1] >= max[1] || min[2] >= max[2] {
            return Err(DomainError::EmptyBoundingBox {
                x_min: min[0],
                x_max: max[0],
                y_min: min[1],
                y_max: max[1],
                z_min: min[2],
                z_max: max[2],
            });
        }

        log::debug!(
            "bounding box recovered from the mesh: [{}, {}] x [{}, {}] x [{}, {}]",
            min[0],
            max[0],
            min[1],
            max[1],
            min[2],
            max[2]
        );

        if !grid_structure_detected(vertices) {
            return match kind {
                MeshKind::Hexahedral => Err(DomainError::NotAGrid),
                MeshKind::Tetrahedral => {
                    log::debug!("no hexahedral grid structure found in the mesh");
                    Ok(Domain {
                        min,
                        max,
                        step: self.step,
                        points: self.points,
                    })
                }
            };
        }

        // the fastest-varying axis is z: count how long y stays constant,
        // then how long x stays constant, and divide out the run lengths
        let total = vertices.len();
        let mut i = 0;
        loop {
            i += 1;
            if i >= total || (vertices[i].y - vertices[i - 1].y).abs() >= STEP_TOLERANCE {
                break;
            }
        }
        let nz = i;

        let mut i = 0;
        loop {
            i += 1;
            if i >= total || (vertices[i].x - vertices[i - 1].x).abs() >= STEP_TOLERANCE {
                break;
            }
        }
        if i % nz != 0 {
            return Err(DomainError::IrregularGrid {
                vertices: total,
                slab: i,
            });
        }
        let ny = i / nz;

        if total % i != 0 {
            return Err(DomainError::IrregularGrid {
                vertices: total,
                slab: i,
            });
        }
        let nx = total / i;

        if nx < 3 || ny < 3 || nz < 3 {
            return Err(DomainError::GridTooCoarse { nx, ny, nz });
        }

        let updated = Domain::new(min, max, [nx, ny, nz]);

        // confirm the guessed layout by replaying the lattice formula
        for i in 0..nx {
            for j in 0..ny {
                for k in 0..nz {
                    let index = (i * ny + j) * nz + k;
                    let vertex = &vertices[index];
                    let expected = [
                        min[0] + i as f64 * updated.step[0],
                        min[1] + j as f64 * updated.step[1],
                        min[2] + k as f64 * updated.step[2],
                    ];
                    let actual = [vertex.x, vertex.y, vertex.z];
                    for axis in 0..3 {
                        if (actual[axis] - expected[axis]).abs() >= LATTICE_TOLERANCE {
                            return Err(DomainError::OffLattice {
                                index: index + 1,
                                axis: AXIS_NAMES[axis],
                                expected: expected[axis],
                                actual: actual[axis],
                            });
                        }
                    }
                }
            }
        }

        log::debug!(
            "discretization parameters updated: steps ({}, {}, {}) with ({} x {} x {}) points",
            updated.step[0],
            updated.step[1],
            updated.step[2],
            nx,
            ny,
            nz
        );

        Ok(updated)
    }
}

/// the first three vertices reveal a structured layout when they share x and
/// y and advance by a constant z step
fn grid_structure_detected(vertices: &[crate::mesh::Point]) -> bool {
    let delta_x = (vertices[1].x - vertices[0].x).abs();
    let delta_y = (vertices[1].y - vertices[0].y).abs();
    let delta_z = (vertices[1].z - vertices[0].z).abs();
    if delta_x >= 1.0e-15 || delta_y >= 1.0e-15 {
        return false;
    }

    let cx = (vertices[2].x - vertices[1].x).abs();
    let cy = (vertices[2].y - vertices[1].y).abs();
    let cz = (vertices[2].z - vertices[1].z).abs();
    cx < 1.0e-15 && cy < 1.0e-15 && (cz - delta_z).abs() < 1.0e-15
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretize::mesh_box;

    fn unit_domain(points: usize) -> Domain {
        Domain::new([0.; 3], [1.; 3], [points; 3])
    }

    #[test]
    fn new_derives_steps() {
        let domain = Domain::new([0., 0., 0.], [3., 6., 9.], [4, 4, 4]);
        assert_eq!(domain.step, [1., 2., 3.]);
        assert_eq!(domain.cells(), [3, 3, 3]);
    }

    #[test]
    fn validate_rejects_coarse_axes() {
        let domain = Domain::new([0.; 3], [1.; 3], [2, 4, 4]);
        assert!(domain.validate(MeshKind::Hexahedral).is_err());
        assert!(domain.validate(MeshKind::Tetrahedral).is_err());
    }

    #[test]
    fn validate_rejects_stale_step() {
        let mut domain = unit_domain(4);
        domain.step[1] += 1.0e-3;
        assert!(domain.validate(MeshKind::Hexahedral).is_err());
        // a tetrahedral mesh only needs the box and counts to be sane
        assert!(domain.validate(MeshKind::Tetrahedral).is_ok());
    }

    #[test]
    fn from_mesh_recovers_grid_parameters() {
        let domain = Domain::new([0., -1., 2.], [3., 1., 5.], [4, 5, 6]);
        let mesh = mesh_box(&domain, MeshKind::Hexahedral).unwrap();

        let stale = unit_domain(3);
        let recovered = stale.from_mesh(&mesh, MeshKind::Hexahedral).unwrap();
        assert_eq!(recovered.points, [4, 5, 6]);
        assert_eq!(recovered.min, [0., -1., 2.]);
        assert_eq!(recovered.max, [3., 1., 5.]);
        for axis in 0..3 {
            assert!((recovered.step[axis] - domain.step[axis]).abs() < 1.0e-14);
        }
    }

    #[test]
    fn from_mesh_rejects_scrambled_hex_grid() {
        let domain = unit_domain(4);
        let mut mesh = mesh_box(&domain, MeshKind::Hexahedral).unwrap();
        // perturbing an interior vertex breaks the lattice check
        mesh.vertices[21].x += 0.3;
        let result = domain.from_mesh(&mesh, MeshKind::Hexahedral);
        assert!(result.is_err());
    }

    #[test]
    fn from_mesh_tolerates_unstructured_tet_vertices() {
        let domain = unit_domain(4);
        let mut mesh = mesh_box(&domain, MeshKind::Tetrahedral).unwrap();
        // shuffle the first two vertices so no grid is detected
        mesh.vertices.swap(0, 1);
        let recovered = domain.from_mesh(&mesh, MeshKind::Tetrahedral).unwrap();
        assert_eq!(recovered.points, domain.points);
    }
}
