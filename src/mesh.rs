//! In-memory representation of a volumetric mesh, independent of any on-disk
//! format.
//!
//! A [`Mesh`] owns its vertices and one of two element families: a structured
//! hexahedral grid (hexahedra + boundary quadrilaterals) or an unstructured
//! tetrahedral mesh (tetrahedra + boundary triangles, ridge edges, corners,
//! and boundary normal/tangent vectors). The family is encoded in the type so
//! no field is ever "present but expected to be empty".

/// a mesh vertex: position, boundary label, and a scratch value slot
///
/// The label encodes boundary membership: `0` interior, `1..=6` one of the
/// six box faces, a two-digit code for a ridge shared by two faces, and a
/// three-digit code for a corner shared by three faces. The `value` field is
/// reserved for downstream consumers (level-set style data) and is always
/// written as zero by this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub label: i32,
    pub value: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64, label: i32) -> Point {
        Point {
            x,
            y,
            z,
            label,
            value: 0.,
        }
    }
}

/// tetrahedron described by four 1-based vertex references
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tetrahedron {
    pub p1: usize,
    pub p2: usize,
    pub p3: usize,
    pub p4: usize,
    pub label: i32,
}

/// hexahedron described by eight 1-based vertex references
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hexahedron {
    pub p1: usize,
    pub p2: usize,
    pub p3: usize,
    pub p4: usize,
    pub p5: usize,
    pub p6: usize,
    pub p7: usize,
    pub p8: usize,
    pub label: i32,
}

/// boundary triangle, labelled by the face it lies on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triangle {
    pub p1: usize,
    pub p2: usize,
    pub p3: usize,
    pub label: i32,
}

/// boundary quadrilateral, labelled by the face it lies on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quadrilateral {
    pub p1: usize,
    pub p2: usize,
    pub p3: usize,
    pub p4: usize,
    pub label: i32,
}

/// ridge edge, labelled by the two-digit face-pair code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Edge {
    pub p1: usize,
    pub p2: usize,
    pub label: i32,
}

/// a normal or tangent direction attached to the vertex referenced by `p`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub p: usize,
}

/// pair of 1-based hexahedron references on the two sides of an interface
///
/// `hexin` sits inside the designated region, `hexout` outside. The pairs are
/// produced by downstream adjacency bookkeeping and only drive the label
/// mapping applied while exporting a hexahedral mesh (see
/// [`write_mesh`](crate::write_mesh)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacency {
    pub hexin: usize,
    pub hexout: usize,
}

/// which element family a mesh (or a file being read) uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshKind {
    /// structured grid: hexahedra + boundary quadrilaterals
    Hexahedral,
    /// unstructured mesh: tetrahedra + boundary triangles + geometry
    Tetrahedral,
}

impl std::fmt::Display for MeshKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshKind::Hexahedral => write!(f, "hexahedral"),
            MeshKind::Tetrahedral => write!(f, "tetrahedral"),
        }
    }
}

/// element data of a structured hexahedral grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HexBody {
    pub quadrilaterals: Vec<Quadrilateral>,
    pub hexahedra: Vec<Hexahedron>,
}

/// element data of an unstructured tetrahedral mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TetBody {
    pub triangles: Vec<Triangle>,
    pub tetrahedra: Vec<Tetrahedron>,
    pub edges: Vec<Edge>,
    /// number of corner vertices declared by the source (the corner vertices
    /// themselves are recognized by their three-digit labels)
    pub corners: usize,
    pub normals: Vec<Vector>,
    pub tangents: Vec<Vector>,
}

/// the element family actually stored in a [`Mesh`]
#[derive(Debug, Clone, PartialEq)]
pub enum MeshBody {
    Hexahedral(HexBody),
    Tetrahedral(TetBody),
}

/// a complete volumetric mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point>,
    pub body: MeshBody,
}

impl Mesh {
    /// an empty mesh of the given family
    pub fn empty(kind: MeshKind) -> Mesh {
        let body = match kind {
            MeshKind::Hexahedral => MeshBody::Hexahedral(HexBody::default()),
            MeshKind::Tetrahedral => MeshBody::Tetrahedral(TetBody::default()),
        };
        Mesh {
            vertices: Vec::new(),
            body,
        }
    }

    pub fn kind(&self) -> MeshKind {
        match &self.body {
            MeshBody::Hexahedral(_) => MeshKind::Hexahedral,
            MeshBody::Tetrahedral(_) => MeshKind::Tetrahedral,
        }
    }

    pub fn hex_body(&self) -> Option<&HexBody> {
        match &self.body {
            MeshBody::Hexahedral(body) => Some(body),
            MeshBody::Tetrahedral(_) => None,
        }
    }

    pub fn tet_body(&self) -> Option<&TetBody> {
        match &self.body {
            MeshBody::Tetrahedral(body) => Some(body),
            MeshBody::Hexahedral(_) => None,
        }
    }

    /// number of vertices whose label marks a box corner (three faces meet)
    pub fn corner_vertices(&self) -> usize {
        self.vertices.iter().filter(|p| p.label > 100).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mesh_matches_kind() {
        let hex = Mesh::empty(MeshKind::Hexahedral);
        assert_eq!(hex.kind(), MeshKind::Hexahedral);
        assert!(hex.hex_body().is_some());
        assert!(hex.tet_body().is_none());

        let tet = Mesh::empty(MeshKind::Tetrahedral);
        assert_eq!(tet.kind(), MeshKind::Tetrahedral);
        assert!(tet.tet_body().is_some());
    }

    #[test]
    fn corner_vertices_counts_three_digit_labels() {
        let mut mesh = Mesh::empty(MeshKind::Tetrahedral);
        mesh.vertices.push(Point::new(0., 0., 0., 145));
        mesh.vertices.push(Point::new(1., 0., 0., 12));
        mesh.vertices.push(Point::new(0., 1., 0., 0));
        mesh.vertices.push(Point::new(1., 1., 1., 236));
        assert_eq!(mesh.corner_vertices(), 2);
    }
}
