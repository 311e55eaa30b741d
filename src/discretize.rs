//! Procedural discretization of a rectangular box.
//!
//! [`mesh_box`] lays vertices on the lattice `min + index * step` (row-major,
//! `idx = (i*ny + j)*nz + k`) and fills either one hexahedron per grid cell
//! or six positively-oriented tetrahedra per cell. The six-tetrahedra cut is
//! the fixed symmetric pattern of the reference topology: the local vertex
//! quintuples are reproduced verbatim because any other triangulation breaks
//! face conformity with the neighbouring cells.

use crate::domain::{Domain, DomainError};
use crate::mesh::{
    Edge, HexBody, Hexahedron, Mesh, MeshBody, MeshKind, Point, Quadrilateral, TetBody,
    Tetrahedron, Triangle, Vector,
};

#[derive(Debug, thiserror::Error)]
pub enum DiscretizeError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("expecting {expected} {entity} instead of the {declared} declared by the caller")]
    CountMismatch {
        entity: &'static str,
        expected: usize,
        declared: usize,
    },
}

/// boundary label of lattice point `(i, j, k)` in an `nx` x `ny` x `nz` grid
///
/// Faces are numbered `1..=6` for `j = 0`, `i = nx-1`, `j = ny-1`, `i = 0`,
/// `k = 0`, `k = nz-1` respectively. A point on a single face gets that face
/// number; a ridge point on two faces gets `10*f1 + f2` and a corner point on
/// three faces `100*f1 + 10*f2 + f3`, always with `f1 < f2 < f3`. Interior
/// points get `0`.
pub fn label_point(i: usize, j: usize, k: usize, nx: usize, ny: usize, nz: usize) -> i32 {
    let mut faces = [0i32; 3];
    let mut count = 0;

    if j == 0 {
        faces[count] = 1;
        count += 1;
    }
    if i == nx - 1 {
        faces[count] = 2;
        count += 1;
    }
    if j == ny - 1 {
        faces[count] = 3;
        count += 1;
    }
    if i == 0 {
        faces[count] = 4;
        count += 1;
    }
    if k == 0 {
        faces[count] = 5;
        count += 1;
    }
    if k == nz - 1 {
        faces[count] = 6;
        count += 1;
    }

    faces[..count].sort_unstable();
    faces[..count].iter().fold(0, |code, face| code * 10 + face)
}

/// entity counts implied by a discretization, or tallied from a mesh
///
/// Exactly one element family is ever non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshCounts {
    pub vertices: usize,
    pub quadrilaterals: usize,
    pub hexahedra: usize,
    pub triangles: usize,
    pub tetrahedra: usize,
    pub edges: usize,
    pub normals: usize,
    pub tangents: usize,
    pub corners: usize,
}

impl MeshCounts {
    /// closed-form counts for a box discretized with the given resolution
    ///
    /// Every axis needs at least 3 points (see [`Domain::validate`]).
    pub fn expected(kind: MeshKind, points: [usize; 3]) -> MeshCounts {
        let [nx, ny, nz] = points;
        let faces = (nx - 1) * (ny - 1) + (nx - 1) * (nz - 1) + (ny - 1) * (nz - 1);

        let mut counts = MeshCounts {
            vertices: nx * ny * nz,
            ..MeshCounts::default()
        };

        match kind {
            MeshKind::Hexahedral => {
                counts.quadrilaterals = 2 * faces;
                counts.hexahedra = (nx - 1) * (ny - 1) * (nz - 1);
            }
            MeshKind::Tetrahedral => {
                counts.triangles = 4 * faces;
                counts.tetrahedra = 6 * (nx - 1) * (ny - 1) * (nz - 1);
                counts.edges = 4 * ((nx - 1) + (ny - 1) + (nz - 1));
                counts.normals =
                    2 * ((nx - 2) * (ny - 2) + (nx - 2) * (nz - 2) + (ny - 2) * (nz - 2));
                counts.tangents = 4 * ((nx - 2) + (ny - 2) + (nz - 2));
                counts.corners = 8;
            }
        }

        counts
    }

    /// tally the entities actually stored in a mesh
    pub fn of_mesh(mesh: &Mesh) -> MeshCounts {
        let mut counts = MeshCounts {
            vertices: mesh.vertices.len(),
            ..MeshCounts::default()
        };

        match &mesh.body {
            MeshBody::Hexahedral(body) => {
                counts.quadrilaterals = body.quadrilaterals.len();
                counts.hexahedra = body.hexahedra.len();
            }
            MeshBody::Tetrahedral(body) => {
                counts.triangles = body.triangles.len();
                counts.tetrahedra = body.tetrahedra.len();
                counts.edges = body.edges.len();
                counts.normals = body.normals.len();
                counts.tangents = body.tangents.len();
                counts.corners = body.corners;
            }
        }

        counts
    }

    /// bytes the in-memory mesh will occupy, for the confirmation prompt
    pub fn memory_estimate(&self) -> usize {
        use std::mem::size_of;

        size_of::<Mesh>()
            + self.vertices * size_of::<Point>()
            + self.quadrilaterals * size_of::<Quadrilateral>()
            + self.hexahedra * size_of::<Hexahedron>()
            + self.triangles * size_of::<Triangle>()
            + self.tetrahedra * size_of::<Tetrahedron>()
            + self.edges * size_of::<Edge>()
            + (self.normals + self.tangents) * size_of::<Vector>()
    }

    fn check_against(&self, declared: &MeshCounts) -> Result<(), DiscretizeError> {
        let pairs = [
            ("vertices", self.vertices, declared.vertices),
            ("quadrilaterals", self.quadrilaterals, declared.quadrilaterals),
            ("hexahedra", self.hexahedra, declared.hexahedra),
            ("triangles", self.triangles, declared.triangles),
            ("tetrahedra", self.tetrahedra, declared.tetrahedra),
            ("edges", self.edges, declared.edges),
            ("normal vectors", self.normals, declared.normals),
            ("tangent vectors", self.tangents, declared.tangents),
            ("corners", self.corners, declared.corners),
        ];
        for (entity, expected, declared) in pairs {
            if expected != declared {
                return Err(DiscretizeError::CountMismatch {
                    entity,
                    expected,
                    declared,
                });
            }
        }
        Ok(())
    }
}

/// discretize the box described by `domain` into a conforming mesh
pub fn mesh_box(domain: &Domain, kind: MeshKind) -> Result<Mesh, DiscretizeError> {
    // the closed-form counts assume at least 3 points per axis
    domain.validate(MeshKind::Hexahedral)?;
    let expected = MeshCounts::expected(kind, domain.points);
    mesh_box_declared(domain, kind, &expected)
}

/// discretize the box, first checking the caller's entity bookkeeping
///
/// The closed-form counts are recomputed independently; any disagreement
/// with `declared` signals a caller-side bookkeeping bug and is fatal.
pub fn mesh_box_declared(
    domain: &Domain,
    kind: MeshKind,
    declared: &MeshCounts,
) -> Result<Mesh, DiscretizeError> {
    // generating the lattice always needs the strict step consistency, even
    // when the requested element family is tetrahedral
    domain.validate(MeshKind::Hexahedral)?;
    MeshCounts::expected(kind, domain.points).check_against(declared)?;

    let [nx, ny, nz] = domain.points;
    let idx = |a: usize, b: usize, c: usize| 1 + (a * ny + b) * nz + c;

    log::debug!("saving vertices");
    let mut vertices = Vec::with_capacity(nx * ny * nz);
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                vertices.push(Point::new(
                    domain.min[0] + i as f64 * domain.step[0],
                    domain.min[1] + j as f64 * domain.step[1],
                    domain.min[2] + k as f64 * domain.step[2],
                    label_point(i, j, k, nx, ny, nz),
                ));
            }
        }
    }

    let body = match kind {
        MeshKind::Hexahedral => MeshBody::Hexahedral(hex_elements(nx, ny, nz, &idx)),
        MeshKind::Tetrahedral => MeshBody::Tetrahedral(tet_elements(nx, ny, nz, &idx)),
    };

    Ok(Mesh { vertices, body })
}

fn hex_elements(nx: usize, ny: usize, nz: usize, idx: &dyn Fn(usize, usize, usize) -> usize) -> HexBody {
    log::debug!("saving hexahedra");

    // one hexahedron per grid cell; p1..p8 walk the cell corners in the fixed
    // right-handed order (back-bottom-left first)
    let mut hexahedra = Vec::with_capacity((nx - 1) * (ny - 1) * (nz - 1));
    for i in 1..nx {
        for j in 1..ny {
            for k in 1..nz {
                hexahedra.push(Hexahedron {
                    p1: idx(i - 1, j - 1, k - 1),
                    p2: idx(i, j - 1, k - 1),
                    p3: idx(i, j, k - 1),
                    p4: idx(i - 1, j, k - 1),
                    p5: idx(i - 1, j - 1, k),
                    p6: idx(i, j - 1, k),
                    p7: idx(i, j, k),
                    p8: idx(i - 1, j, k),
                    label: 0,
                });
            }
        }
    }

    log::debug!("saving boundary quadrilaterals");

    // boundary quadrilaterals, counter-clockwise seen from outside the box
    let nqua = 2 * ((nx - 1) * (ny - 1) + (nx - 1) * (nz - 1) + (ny - 1) * (nz - 1));
    let mut quadrilaterals = Vec::with_capacity(nqua);

    // face 1 (j = 0)
    for i in 1..nx {
        for k in 1..nz {
            quadrilaterals.push(Quadrilateral {
                p1: idx(i - 1, 0, k - 1),
                p2: idx(i, 0, k - 1),
                p3: idx(i, 0, k),
                p4: idx(i - 1, 0, k),
                label: 1,
            });
        }
    }

    // face 2 (i = nx-1)
    for j in 1..ny {
        for k in 1..nz {
            quadrilaterals.push(Quadrilateral {
                p1: idx(nx - 1, j - 1, k - 1),
                p2: idx(nx - 1, j, k - 1),
                p3: idx(nx - 1, j, k),
                p4: idx(nx - 1, j - 1, k),
                label: 2,
            });
        }
    }

    // face 3 (j = ny-1)
    for i in 1..nx {
        for k in 1..nz {
            quadrilaterals.push(Quadrilateral {
                p1: idx(i - 1, ny - 1, k - 1),
                p2: idx(i - 1, ny - 1, k),
                p3: idx(i, ny - 1, k),
                p4: idx(i, ny - 1, k - 1),
                label: 3,
            });
        }
    }

    // face 4 (i = 0)
    for j in 1..ny {
        for k in 1..nz {
            quadrilaterals.push(Quadrilateral {
                p1: idx(0, j - 1, k - 1),
                p2: idx(0, j - 1, k),
                p3: idx(0, j, k),
                p4: idx(0, j, k - 1),
                label: 4,
            });
        }
    }

    // face 5 (k = 0)
    for i in 1..nx {
        for j in 1..ny {
            quadrilaterals.push(Quadrilateral {
                p1: idx(i - 1, j - 1, 0),
                p2: idx(i - 1, j, 0),
                p3: idx(i, j, 0),
                p4: idx(i, j - 1, 0),
                label: 5,
            });
        }
    }

    // face 6 (k = nz-1)
    for i in 1..nx {
        for j in 1..ny {
            quadrilaterals.push(Quadrilateral {
                p1: idx(i - 1, j - 1, nz - 1),
                p2: idx(i, j - 1, nz - 1),
                p3: idx(i, j, nz - 1),
                p4: idx(i - 1, j, nz - 1),
                label: 6,
            });
        }
    }

    HexBody {
        quadrilaterals,
        hexahedra,
    }
}

fn tet_elements(nx: usize, ny: usize, nz: usize, idx: &dyn Fn(usize, usize, usize) -> usize) -> TetBody {
    log::debug!("saving tetrahedra");

    // cell corners, numbered as for the hexahedron: 1=(i-1,j-1,k-1),
    // 2=(i,j-1,k-1), 3=(i,j,k-1), 4=(i-1,j,k-1), 5=(i-1,j-1,k), 6=(i,j-1,k),
    // 7=(i,j,k), 8=(i-1,j,k). The six quintuples 1524, 6254, 2346, 7836,
    // 6483, 8654 cut every cell the same way, so faces of adjacent cells
    // coincide.
    let mut tetrahedra = Vec::with_capacity(6 * (nx - 1) * (ny - 1) * (nz - 1));
    for i in 1..nx {
        for j in 1..ny {
            for k in 1..nz {
                let c1 = idx(i - 1, j - 1, k - 1);
                let c2 = idx(i, j - 1, k - 1);
                let c3 = idx(i, j, k - 1);
                let c4 = idx(i - 1, j, k - 1);
                let c5 = idx(i - 1, j - 1, k);
                let c6 = idx(i, j - 1, k);
                let c7 = idx(i, j, k);
                let c8 = idx(i - 1, j, k);

                for [p1, p2, p3, p4] in [
                    [c1, c5, c2, c4],
                    [c6, c2, c5, c4],
                    [c2, c3, c4, c6],
                    [c7, c8, c3, c6],
                    [c6, c4, c8, c3],
                    [c8, c6, c5, c4],
                ] {
                    tetrahedra.push(Tetrahedron {
                        p1,
                        p2,
                        p3,
                        p4,
                        label: 0,
                    });
                }
            }
        }
    }

    log::debug!("saving boundary triangles");

    let faces = (nx - 1) * (ny - 1) + (nx - 1) * (nz - 1) + (ny - 1) * (nz - 1);
    let mut triangles = Vec::with_capacity(4 * faces);

    // two triangles per boundary square, oriented like the quadrilaterals

    // face 1 (j = 0)
    for i in 1..nx {
        for k in 1..nz {
            let (q1, q2, q3, q4) = (
                idx(i - 1, 0, k - 1),
                idx(i, 0, k - 1),
                idx(i, 0, k),
                idx(i - 1, 0, k),
            );
            triangles.push(Triangle { p1: q1, p2: q2, p3: q4, label: 1 });
            triangles.push(Triangle { p1: q2, p2: q3, p3: q4, label: 1 });
        }
    }

    // face 2 (i = nx-1)
    for j in 1..ny {
        for k in 1..nz {
            let (q1, q2, q3, q4) = (
                idx(nx - 1, j - 1, k - 1),
                idx(nx - 1, j, k - 1),
                idx(nx - 1, j, k),
                idx(nx - 1, j - 1, k),
            );
            triangles.push(Triangle { p1: q1, p2: q2, p3: q4, label: 2 });
            triangles.push(Triangle { p1: q2, p2: q3, p3: q4, label: 2 });
        }
    }

    // face 3 (j = ny-1)
    for i in 1..nx {
        for k in 1..nz {
            let (q1, q2, q3, q4) = (
                idx(i - 1, ny - 1, k - 1),
                idx(i - 1, ny - 1, k),
                idx(i, ny - 1, k),
                idx(i, ny - 1, k - 1),
            );
            triangles.push(Triangle { p1: q1, p2: q2, p3: q4, label: 3 });
            triangles.push(Triangle { p1: q4, p2: q2, p3: q3, label: 3 });
        }
    }

    // face 4 (i = 0)
    for j in 1..ny {
        for k in 1..nz {
            let (q1, q2, q3, q4) = (
                idx(0, j - 1, k - 1),
                idx(0, j - 1, k),
                idx(0, j, k),
                idx(0, j, k - 1),
            );
            triangles.push(Triangle { p1: q1, p2: q2, p3: q4, label: 4 });
            triangles.push(Triangle { p1: q4, p2: q2, p3: q3, label: 4 });
        }
    }

    // face 5 (k = 0)
    for i in 1..nx {
        for j in 1..ny {
            let (q1, q2, q3, q4) = (
                idx(i - 1, j - 1, 0),
                idx(i - 1, j, 0),
                idx(i, j, 0),
                idx(i, j - 1, 0),
            );
            triangles.push(Triangle { p1: q1, p2: q2, p3: q4, label: 5 });
            triangles.push(Triangle { p1: q4, p2: q2, p3: q3, label: 5 });
        }
    }

    // face 6 (k = nz-1)
    for i in 1..nx {
        for j in 1..ny {
            let (q1, q2, q3, q4) = (
                idx(i - 1, j - 1, nz - 1),
                idx(i, j - 1, nz - 1),
                idx(i, j, nz - 1),
                idx(i - 1, j, nz - 1),
            );
            triangles.push(Triangle { p1: q1, p2: q2, p3: q4, label: 6 });
            triangles.push(Triangle { p1: q2, p2: q3, p3: q4, label: 6 });
        }
    }

    log::debug!("saving geometry (ridges, corners, normal and tangent vectors)");

    let mut edges = Vec::with_capacity(4 * ((nx - 1) + (ny - 1) + (nz - 1)));
    for i in 1..nx {
        // ridges running along x: face pairs 15, 35, 36, 16
        edges.push(Edge { p1: idx(i - 1, 0, 0), p2: idx(i, 0, 0), label: 15 });
        edges.push(Edge { p1: idx(i - 1, ny - 1, 0), p2: idx(i, ny - 1, 0), label: 35 });
        edges.push(Edge {
            p1: idx(i - 1, ny - 1, nz - 1),
            p2: idx(i, ny - 1, nz - 1),
            label: 36,
        });
        edges.push(Edge { p1: idx(i - 1, 0, nz - 1), p2: idx(i, 0, nz - 1), label: 16 });
    }
    for j in 1..ny {
        // ridges running along y: face pairs 45, 25, 26, 46
        edges.push(Edge { p1: idx(0, j - 1, 0), p2: idx(0, j, 0), label: 45 });
        edges.push(Edge { p1: idx(nx - 1, j - 1, 0), p2: idx(nx - 1, j, 0), label: 25 });
        edges.push(Edge {
            p1: idx(nx - 1, j - 1, nz - 1),
            p2: idx(nx - 1, j, nz - 1),
            label: 26,
        });
        edges.push(Edge { p1: idx(0, j - 1, nz - 1), p2: idx(0, j, nz - 1), label: 46 });
    }
    for k in 1..nz {
        // ridges running along z: face pairs 14, 12, 23, 34
        edges.push(Edge { p1: idx(0, 0, k - 1), p2: idx(0, 0, k), label: 14 });
        edges.push(Edge { p1: idx(nx - 1, 0, k - 1), p2: idx(nx - 1, 0, k), label: 12 });
        edges.push(Edge {
            p1: idx(nx - 1, ny - 1, k - 1),
            p2: idx(nx - 1, ny - 1, k),
            label: 23,
        });
        edges.push(Edge { p1: idx(0, ny - 1, k - 1), p2: idx(0, ny - 1, k), label: 34 });
    }

    // outward unit normals at the points strictly interior to each face
    let nnorm = 2 * ((nx - 2) * (ny - 2) + (nx - 2) * (nz - 2) + (ny - 2) * (nz - 2));
    let mut normals = Vec::with_capacity(nnorm);
    for i in 1..nx - 1 {
        for k in 1..nz - 1 {
            normals.push(Vector { x: 0., y: -1., z: 0., p: idx(i, 0, k) });
        }
    }
    for j in 1..ny - 1 {
        for k in 1..nz - 1 {
            normals.push(Vector { x: 1., y: 0., z: 0., p: idx(nx - 1, j, k) });
        }
    }
    for i in 1..nx - 1 {
        for k in 1..nz - 1 {
            normals.push(Vector { x: 0., y: 1., z: 0., p: idx(i, ny - 1, k) });
        }
    }
    for j in 1..ny - 1 {
        for k in 1..nz - 1 {
            normals.push(Vector { x: -1., y: 0., z: 0., p: idx(0, j, k) });
        }
    }
    for i in 1..nx - 1 {
        for j in 1..ny - 1 {
            normals.push(Vector { x: 0., y: 0., z: -1., p: idx(i, j, 0) });
        }
    }
    for i in 1..nx - 1 {
        for j in 1..ny - 1 {
            normals.push(Vector { x: 0., y: 0., z: 1., p: idx(i, j, nz - 1) });
        }
    }

    // tangents along the ridge lines, at the points interior to each ridge
    let mut tangents = Vec::with_capacity(4 * ((nx - 2) + (ny - 2) + (nz - 2)));
    for i in 1..nx - 1 {
        for p in [
            idx(i, 0, 0),
            idx(i, ny - 1, 0),
            idx(i, ny - 1, nz - 1),
            idx(i, 0, nz - 1),
        ] {
            tangents.push(Vector { x: 1., y: 0., z: 0., p });
        }
    }
    for j in 1..ny - 1 {
        for p in [
            idx(0, j, 0),
            idx(nx - 1, j, 0),
            idx(nx - 1, j, nz - 1),
            idx(0, j, nz - 1),
        ] {
            tangents.push(Vector { x: 0., y: 1., z: 0., p });
        }
    }
    for k in 1..nz - 1 {
        for p in [
            idx(0, 0, k),
            idx(nx - 1, 0, k),
            idx(nx - 1, ny - 1, k),
            idx(0, ny - 1, k),
        ] {
            tangents.push(Vector { x: 0., y: 0., z: 1., p });
        }
    }

    TetBody {
        triangles,
        tetrahedra,
        edges,
        corners: 8,
        normals,
        tangents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cover_all_27_slab_combinations() {
        let (nx, ny, nz) = (4, 5, 6);
        // axis positions: min slab, strictly interior, max slab
        let is = [0, 1, nx - 1];
        let js = [0, 2, ny - 1];
        let ks = [0, 3, nz - 1];

        let expected = [
            // i = 0 (face 4)
            [[145, 14, 146], [45, 4, 46], [345, 34, 346]],
            // interior i
            [[15, 1, 16], [5, 0, 6], [35, 3, 36]],
            // i = nx-1 (face 2)
            [[125, 12, 126], [25, 2, 26], [235, 23, 236]],
        ];

        for (a, &i) in is.iter().enumerate() {
            for (b, &j) in js.iter().enumerate() {
                for (c, &k) in ks.iter().enumerate() {
                    assert_eq!(
                        label_point(i, j, k, nx, ny, nz),
                        expected[a][b][c],
                        "label at ({}, {}, {})",
                        i,
                        j,
                        k
                    );
                }
            }
        }
    }

    #[test]
    fn multi_digit_codes_keep_faces_ordered() {
        for (i, j, k) in [(0, 0, 0), (3, 4, 5), (0, 4, 0), (3, 0, 5)] {
            let label = label_point(i, j, k, 4, 5, 6);
            let digits: Vec<u32> = label
                .to_string()
                .chars()
                .map(|c| c.to_digit(10).unwrap())
                .collect();
            for pair in digits.windows(2) {
                assert!(pair[0] < pair[1], "faces out of order in label {}", label);
            }
        }
    }

    #[test]
    fn expected_counts_for_the_4x4x4_box() {
        let hex = MeshCounts::expected(MeshKind::Hexahedral, [4, 4, 4]);
        assert_eq!(hex.vertices, 64);
        assert_eq!(hex.hexahedra, 27);
        assert_eq!(hex.quadrilaterals, 54);
        assert_eq!(hex.tetrahedra, 0);

        let tet = MeshCounts::expected(MeshKind::Tetrahedral, [4, 4, 4]);
        assert_eq!(tet.vertices, 64);
        assert_eq!(tet.tetrahedra, 162);
        assert_eq!(tet.triangles, 108);
        assert_eq!(tet.edges, 36);
        assert_eq!(tet.normals, 24);
        assert_eq!(tet.tangents, 24);
        assert_eq!(tet.corners, 8);
        assert_eq!(tet.hexahedra, 0);
    }

    #[test]
    fn generated_mesh_matches_expected_counts() {
        let domain = Domain::new([0.; 3], [3.; 3], [4, 4, 4]);
        for kind in [MeshKind::Hexahedral, MeshKind::Tetrahedral] {
            let mesh = mesh_box(&domain, kind).unwrap();
            assert_eq!(
                MeshCounts::of_mesh(&mesh),
                MeshCounts::expected(kind, domain.points)
            );
        }
    }

    #[test]
    fn declared_count_mismatch_is_fatal() {
        let domain = Domain::new([0.; 3], [3.; 3], [4, 4, 4]);
        let mut declared = MeshCounts::expected(MeshKind::Hexahedral, domain.points);
        declared.hexahedra += 1;
        let result = mesh_box_declared(&domain, MeshKind::Hexahedral, &declared);
        assert!(matches!(
            result,
            Err(DiscretizeError::CountMismatch { entity: "hexahedra", .. })
        ));
    }

    fn vertex_position(mesh: &Mesh, reference: usize) -> [f64; 3] {
        let p = &mesh.vertices[reference - 1];
        [p.x, p.y, p.z]
    }

    fn signed_volume(mesh: &Mesh, tet: &Tetrahedron) -> f64 {
        let a = vertex_position(mesh, tet.p1);
        let b = vertex_position(mesh, tet.p2);
        let c = vertex_position(mesh, tet.p3);
        let d = vertex_position(mesh, tet.p4);

        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let w = [d[0] - a[0], d[1] - a[1], d[2] - a[2]];

        let det = u[0] * (v[1] * w[2] - v[2] * w[1]) - u[1] * (v[0] * w[2] - v[2] * w[0])
            + u[2] * (v[0] * w[1] - v[1] * w[0]);
        det / 6.0
    }

    #[test]
    fn six_tetrahedra_fill_each_cell() {
        let domain = Domain::new([0.; 3], [2.; 3], [3, 3, 3]);
        let mesh = mesh_box(&domain, MeshKind::Tetrahedral).unwrap();
        let body = mesh.tet_body().unwrap();

        // first cell is (i, j, k) = (1, 1, 1); its corners in the lattice
        let idx = |a: usize, b: usize, c: usize| 1 + (a * 3 + b) * 3 + c;
        let mut cell_corners: Vec<usize> = vec![
            idx(0, 0, 0),
            idx(1, 0, 0),
            idx(1, 1, 0),
            idx(0, 1, 0),
            idx(0, 0, 1),
            idx(1, 0, 1),
            idx(1, 1, 1),
            idx(0, 1, 1),
        ];
        cell_corners.sort_unstable();

        let first_cell = &body.tetrahedra[..6];
        let mut used: Vec<usize> = first_cell
            .iter()
            .flat_map(|t| [t.p1, t.p2, t.p3, t.p4])
            .collect();
        used.sort_unstable();
        used.dedup();
        assert_eq!(used, cell_corners);

        // the cell volume is covered exactly: six positive volumes summing to
        // the cell volume
        let cell_volume: f64 = first_cell.iter().map(|t| signed_volume(&mesh, t)).sum();
        assert!((cell_volume - 1.0).abs() < 1.0e-12);
    }

    #[test]
    fn every_tetrahedron_is_positively_oriented() {
        let domain = Domain::new([-1.; 3], [1.; 3], [4, 4, 4]);
        let mesh = mesh_box(&domain, MeshKind::Tetrahedral).unwrap();
        let body = mesh.tet_body().unwrap();
        for (index, tet) in body.tetrahedra.iter().enumerate() {
            let volume = signed_volume(&mesh, tet);
            assert!(volume > 0.0, "tetrahedron {} has volume {}", index + 1, volume);
        }
    }

    #[test]
    fn ridge_labels_match_vertex_labels() {
        let domain = Domain::new([0.; 3], [3.; 3], [4, 4, 4]);
        let mesh = mesh_box(&domain, MeshKind::Tetrahedral).unwrap();
        let body = mesh.tet_body().unwrap();

        for edge in &body.edges {
            // both endpoints lie on the ridge (or one of its corner ends), so
            // the two digits of the edge label appear in each endpoint label
            for endpoint in [edge.p1, edge.p2] {
                let vertex_label = mesh.vertices[endpoint - 1].label.to_string();
                let f1 = (edge.label / 10).to_string();
                let f2 = (edge.label % 10).to_string();
                assert!(vertex_label.contains(&f1) && vertex_label.contains(&f2));
            }
        }
    }

    #[test]
    fn normals_point_outward_at_face_interior_points() {
        let domain = Domain::new([0.; 3], [3.; 3], [4, 4, 4]);
        let mesh = mesh_box(&domain, MeshKind::Tetrahedral).unwrap();
        let body = mesh.tet_body().unwrap();

        for normal in &body.normals {
            let vertex = &mesh.vertices[normal.p - 1];
            // single-face label and a unit axis direction
            assert!((1..=6).contains(&vertex.label));
            let length = normal.x.abs() + normal.y.abs() + normal.z.abs();
            assert_eq!(length, 1.0);

            // the direction matches the face the owning vertex lies on
            let expected = match vertex.label {
                1 => [0., -1., 0.],
                2 => [1., 0., 0.],
                3 => [0., 1., 0.],
                4 => [-1., 0., 0.],
                5 => [0., 0., -1.],
                _ => [0., 0., 1.],
            };
            assert_eq!([normal.x, normal.y, normal.z], expected);
        }
    }
}
