//! Reading and parsing `.mesh` files.
//!
//! The whole file is read into memory and scanned from a byte slice. The
//! [`Scanner`] is the explicit reader context threaded through every helper:
//! it skips `#` comment lines and whitespace, reads tokens and fixed-width
//! keyword fragments, and locates keywords with the word-boundary rule (a
//! candidate first byte only counts when the byte before it is outside the
//! printable ASCII range, so the `V` inside `MeshVersionFormatted` can never
//! match `Vertices`).

mod error;

pub use error::{MeshParseError, ScanError};

use crate::files::FileKind;
use crate::mesh::{
    Edge, HexBody, Hexahedron, Mesh, MeshBody, MeshKind, Point, Quadrilateral, TetBody,
    Tetrahedron, Triangle,
};
use crate::Error;

use nom::bytes::complete::{take, take_till, take_till1, take_while};
use nom::IResult;

use std::path::Path;

const SLOTS: [&str; 8] = [
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth",
];

/// skip whitespace and `#`-prefixed comment lines
fn blank(i: &[u8]) -> &[u8] {
    let mut rest = i;
    loop {
        let spaces: IResult<&[u8], &[u8]> =
            take_while(|c: u8| c.is_ascii_whitespace())(rest);
        if let Ok((after, _)) = spaces {
            rest = after;
        }
        if rest.first() == Some(&b'#') {
            let comment: IResult<&[u8], &[u8]> = take_till(|c| c == b'\n')(rest);
            if let Ok((after, _)) = comment {
                rest = after;
            }
        } else {
            return rest;
        }
    }
}

/// explicit scanning context over the raw file bytes
pub(crate) struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a [u8]) -> Scanner<'a> {
        Scanner { input, pos: 0 }
    }

    fn rest(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    fn advance_to(&mut self, rest: &'a [u8]) {
        self.pos = self.input.len() - rest.len();
    }

    pub fn skip_blank(&mut self) {
        let rest = blank(self.rest());
        self.advance_to(rest);
    }

    /// true once only whitespace and comments remain
    pub fn at_end(&mut self) -> bool {
        self.skip_blank();
        self.rest().is_empty()
    }

    /// discard the rest of the current line, newline included
    ///
    /// Used for free-text header lines that are not part of the token
    /// grammar. Reaching the end of the input before a newline is an error.
    pub fn skip_line(&mut self, expected: &'static str) -> Result<(), ScanError> {
        let line: IResult<&[u8], &[u8]> = take_till(|c| c == b'\n')(self.rest());
        if let Ok((rest, _)) = line {
            if rest.first() == Some(&b'\n') {
                self.advance_to(&rest[1..]);
                return Ok(());
            }
        }
        Err(ScanError::InputExhausted { expected })
    }

    /// next whitespace-delimited token
    fn read_token(&mut self, expected: &'static str) -> Result<&'a [u8], ScanError> {
        self.skip_blank();
        let token: IResult<&[u8], &[u8]> =
            take_till1(|c: u8| c.is_ascii_whitespace())(self.rest());
        match token {
            Ok((rest, token)) => {
                self.advance_to(rest);
                Ok(token)
            }
            Err(_) => Err(ScanError::InputExhausted { expected }),
        }
    }

    /// consume exactly `n` bytes, without skipping anything first
    fn read_exact(&mut self, n: usize, expected: &'static str) -> Result<&'a [u8], ScanError> {
        let taken: IResult<&[u8], &[u8]> = take(n)(self.rest());
        match taken {
            Ok((rest, bytes)) => {
                self.advance_to(rest);
                Ok(bytes)
            }
            Err(_) => Err(ScanError::InputExhausted { expected }),
        }
    }

    /// consume the given literal, reporting the offending bytes on mismatch
    fn expect_literal(
        &mut self,
        literal: &'static str,
        full_keyword: &'static str,
    ) -> Result<(), ScanError> {
        let got = self.read_exact(literal.len(), full_keyword)?;
        if got == literal.as_bytes() {
            Ok(())
        } else {
            Err(ScanError::KeywordMismatch {
                expected: full_keyword,
                found: String::from_utf8_lossy(got).into_owned(),
            })
        }
    }

    pub fn read_int(&mut self, context: &'static str) -> Result<i64, ScanError> {
        let token = self.read_token(context)?;
        std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ScanError::BadInteger {
                context,
                token: String::from_utf8_lossy(token).into_owned(),
            })
    }

    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, ScanError> {
        let token = self.read_token(context)?;
        std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ScanError::BadFloat {
                context,
                token: String::from_utf8_lossy(token).into_owned(),
            })
    }

    /// scan forward to the next occurrence of `keyword`
    ///
    /// Comment lines are skipped. A candidate first byte only counts when it
    /// sits at a word boundary; once a candidate is accepted the remaining
    /// letters must match exactly or the scan fails, naming what was found.
    pub fn seek_keyword(&mut self, keyword: &'static str) -> Result<(), ScanError> {
        let bytes = keyword.as_bytes();
        let first = bytes[0];

        let mut offset = self.pos;
        let mut in_comment = false;
        while offset < self.input.len() {
            let byte = self.input[offset];
            if in_comment {
                if byte == b'\n' {
                    in_comment = false;
                }
                offset += 1;
                continue;
            }
            if byte == b'#' {
                in_comment = true;
                offset += 1;
                continue;
            }
            if byte == first && boundary_before(self.input, offset) {
                let end = offset + bytes.len();
                let found = match self.input.get(offset..end) {
                    Some(found) => found,
                    None => return Err(ScanError::InputExhausted { expected: keyword }),
                };
                if found == bytes {
                    self.pos = end;
                    return Ok(());
                }
                return Err(ScanError::KeywordMismatch {
                    expected: keyword,
                    found: String::from_utf8_lossy(found).into_owned(),
                });
            }
            offset += 1;
        }

        Err(ScanError::InputExhausted { expected: keyword })
    }
}

/// a keyword can only start after a byte outside printable ASCII (33..=126),
/// or at the very start of the input
fn boundary_before(input: &[u8], offset: usize) -> bool {
    match offset.checked_sub(1).and_then(|i| input.get(i)) {
        Some(&previous) => !(33..=126).contains(&previous),
        None => true,
    }
}

/// read in and parse an entire mesh file at the given path
pub fn read_mesh_file(path: &Path, kind: MeshKind) -> Result<Mesh, Error> {
    FileKind::expect(path, FileKind::Mesh)?;

    log::info!("opening {} for reading", path.display());
    let buffer = std::fs::read(path).map_err(|source| Error::Open {
        path: path.into(),
        source,
    })?;

    let mesh = parse_mesh(&buffer, kind)?;
    Ok(mesh)
}

/// parse the `.mesh` grammar out of raw bytes
pub fn parse_mesh(input: &[u8], kind: MeshKind) -> Result<Mesh, MeshParseError> {
    let mut scanner = Scanner::new(input);

    scanner.seek_keyword("MeshVersionFormatted")?;
    let version = scanner.read_int("the mesh format version")?;
    if version != 2 {
        return Err(MeshParseError::BadVersion { found: version });
    }

    scanner.seek_keyword("Dimension")?;
    let dimension = scanner.read_int("the mesh dimension")?;
    if dimension != 3 {
        return Err(MeshParseError::BadDimension { found: dimension });
    }

    // the vertex block must come first: every element record is validated
    // against the vertex count
    scanner.seek_keyword("Vertices")?;
    let nver = positive_count(&mut scanner, "Vertices")?;

    let mut vertices = Vec::with_capacity(nver);
    for k in 0..nver {
        let wrap = MeshParseError::in_entity("vertex", k + 1);
        let x = scanner.read_f64("a vertex coordinate").map_err(&wrap)?;
        let y = scanner.read_f64("a vertex coordinate").map_err(&wrap)?;
        let z = scanner.read_f64("a vertex coordinate").map_err(&wrap)?;
        let label = scanner.read_int("a vertex label").map_err(&wrap)?;
        vertices.push(Point::new(x, y, z, label as i32));
    }

    let body = match kind {
        MeshKind::Hexahedral => MeshBody::Hexahedral(parse_hex_blocks(&mut scanner, nver)?),
        MeshKind::Tetrahedral => MeshBody::Tetrahedral(parse_tet_blocks(&mut scanner, nver)?),
    };

    Ok(Mesh { vertices, body })
}

fn positive_count(scanner: &mut Scanner, keyword: &'static str) -> Result<usize, MeshParseError> {
    let count = scanner.read_int(keyword)?;
    if count < 1 {
        return Err(MeshParseError::BadCount { keyword, count });
    }
    Ok(count as usize)
}

/// a count that additionally may not exceed the vertex count
fn capped_count(
    scanner: &mut Scanner,
    keyword: &'static str,
    nver: usize,
) -> Result<usize, MeshParseError> {
    let count = scanner.read_int(keyword)?;
    if count < 1 {
        return Err(MeshParseError::BadCount { keyword, count });
    }
    if count as usize > nver {
        return Err(MeshParseError::CountExceedsVertices {
            keyword,
            count,
            vertices: nver,
        });
    }
    Ok(count as usize)
}

fn read_vertex_ref(
    scanner: &mut Scanner,
    entity: &'static str,
    index: usize,
    slot: &'static str,
    nver: usize,
) -> Result<usize, MeshParseError> {
    let value = scanner
        .read_int(entity)
        .map_err(MeshParseError::in_entity(entity, index))?;
    if value < 1 || value as usize > nver {
        return Err(MeshParseError::VertexRefOutOfBounds {
            entity,
            index,
            slot,
            value,
            vertices: nver,
        });
    }
    Ok(value as usize)
}

fn read_label(
    scanner: &mut Scanner,
    entity: &'static str,
    index: usize,
) -> Result<i32, MeshParseError> {
    let value = scanner
        .read_int(entity)
        .map_err(MeshParseError::in_entity(entity, index))?;
    Ok(value as i32)
}

fn warn_if_out_of_order(entity: &'static str, index: usize, value: i64) {
    if value != index as i64 {
        log::warn!(
            "the {} of the mesh are not stored in increasing order \
             (the {}-th one is referred to as {})",
            entity,
            index,
            value
        );
    }
}

/// merge a redundantly-declared count into an already-sized vector
///
/// The first of the two twin blocks allocates; the second must agree on the
/// count exactly.
fn merge_count<T: Default + Clone>(
    items: &mut Vec<T>,
    count: usize,
    first: &'static str,
    second: &'static str,
) -> Result<(), MeshParseError> {
    if items.is_empty() {
        items.resize(count, T::default());
        Ok(())
    } else if items.len() != count {
        Err(MeshParseError::DuplicateCountMismatch {
            first,
            second,
            stored: items.len(),
            found: count,
        })
    } else {
        Ok(())
    }
}

fn parse_hex_blocks(scanner: &mut Scanner, nver: usize) -> Result<HexBody, MeshParseError> {
    let mut body = HexBody::default();

    loop {
        scanner.skip_blank();
        let prefix = scanner.read_exact(3, "a mesh keyword")?;
        match String::from_utf8_lossy(prefix).as_ref() {
            "Qua" => {
                scanner.expect_literal("drilaterals", "Quadrilaterals")?;
                let count = positive_count(scanner, "Quadrilaterals")?;
                body.quadrilaterals = Vec::with_capacity(count);
                for k in 0..count {
                    let quadrilateral = Quadrilateral {
                        p1: read_vertex_ref(scanner, "quadrilateral", k + 1, SLOTS[0], nver)?,
                        p2: read_vertex_ref(scanner, "quadrilateral", k + 1, SLOTS[1], nver)?,
                        p3: read_vertex_ref(scanner, "quadrilateral", k + 1, SLOTS[2], nver)?,
                        p4: read_vertex_ref(scanner, "quadrilateral", k + 1, SLOTS[3], nver)?,
                        label: read_label(scanner, "quadrilateral", k + 1)?,
                    };
                    body.quadrilaterals.push(quadrilateral);
                }
            }
            "Hex" => {
                scanner.expect_literal("ahedra", "Hexahedra")?;
                let count = positive_count(scanner, "Hexahedra")?;
                body.hexahedra = Vec::with_capacity(count);
                for k in 0..count {
                    let hexahedron = Hexahedron {
                        p1: read_vertex_ref(scanner, "hexahedron", k + 1, SLOTS[0], nver)?,
                        p2: read_vertex_ref(scanner, "hexahedron", k + 1, SLOTS[1], nver)?,
                        p3: read_vertex_ref(scanner, "hexahedron", k + 1, SLOTS[2], nver)?,
                        p4: read_vertex_ref(scanner, "hexahedron", k + 1, SLOTS[3], nver)?,
                        p5: read_vertex_ref(scanner, "hexahedron", k + 1, SLOTS[4], nver)?,
                        p6: read_vertex_ref(scanner, "hexahedron", k + 1, SLOTS[5], nver)?,
                        p7: read_vertex_ref(scanner, "hexahedron", k + 1, SLOTS[6], nver)?,
                        p8: read_vertex_ref(scanner, "hexahedron", k + 1, SLOTS[7], nver)?,
                        label: read_label(scanner, "hexahedron", k + 1)?,
                    };
                    body.hexahedra.push(hexahedron);
                }
            }
            "End" => break,
            other => {
                return Err(MeshParseError::UnknownKeyword {
                    kind: "hexahedral",
                    found: other.to_owned(),
                })
            }
        }
    }

    Ok(body)
}

fn parse_tet_blocks(scanner: &mut Scanner, nver: usize) -> Result<TetBody, MeshParseError> {
    let mut body = TetBody::default();

    loop {
        scanner.skip_blank();
        let prefix = scanner.read_exact(3, "a mesh keyword")?;
        match String::from_utf8_lossy(prefix).as_ref() {
            "Tri" => {
                scanner.expect_literal("angles", "Triangles")?;
                let count = positive_count(scanner, "Triangles")?;
                body.triangles = Vec::with_capacity(count);
                for k in 0..count {
                    let triangle = Triangle {
                        p1: read_vertex_ref(scanner, "triangle", k + 1, SLOTS[0], nver)?,
                        p2: read_vertex_ref(scanner, "triangle", k + 1, SLOTS[1], nver)?,
                        p3: read_vertex_ref(scanner, "triangle", k + 1, SLOTS[2], nver)?,
                        label: read_label(scanner, "triangle", k + 1)?,
                    };
                    body.triangles.push(triangle);
                }
            }
            "Tet" => {
                scanner.expect_literal("rahedra", "Tetrahedra")?;
                let count = positive_count(scanner, "Tetrahedra")?;
                body.tetrahedra = Vec::with_capacity(count);
                for k in 0..count {
                    let tetrahedron = Tetrahedron {
                        p1: read_vertex_ref(scanner, "tetrahedron", k + 1, SLOTS[0], nver)?,
                        p2: read_vertex_ref(scanner, "tetrahedron", k + 1, SLOTS[1], nver)?,
                        p3: read_vertex_ref(scanner, "tetrahedron", k + 1, SLOTS[2], nver)?,
                        p4: read_vertex_ref(scanner, "tetrahedron", k + 1, SLOTS[3], nver)?,
                        label: read_label(scanner, "tetrahedron", k + 1)?,
                    };
                    body.tetrahedra.push(tetrahedron);
                }
            }
            "Edg" => {
                scanner.expect_literal("es", "Edges")?;
                let count = positive_count(scanner, "Edges")?;
                merge_count(&mut body.edges, count, "ridges", "edges")?;
                for k in 0..count {
                    body.edges[k] = Edge {
                        p1: read_vertex_ref(scanner, "edge", k + 1, SLOTS[0], nver)?,
                        p2: read_vertex_ref(scanner, "edge", k + 1, SLOTS[1], nver)?,
                        label: read_label(scanner, "edge", k + 1)?,
                    };
                }
            }
            "Rid" => {
                scanner.expect_literal("ges", "Ridges")?;
                let count = positive_count(scanner, "Ridges")?;
                merge_count(&mut body.edges, count, "edges", "ridges")?;
                for k in 0..count {
                    let value = scanner
                        .read_int("Ridges")
                        .map_err(MeshParseError::in_entity("ridge", k + 1))?;
                    warn_if_out_of_order("ridges", k + 1, value);
                }
            }
            "Cor" => {
                scanner.expect_literal("ners", "Corners")?;
                let count = capped_count(scanner, "Corners", nver)?;
                if body.corners != 0 && body.corners != count {
                    log::warn!(
                        "the number of required vertices (={}) should not be different \
                         from the number of corners (={})",
                        body.corners,
                        count
                    );
                }
                body.corners = count;
                for k in 0..count {
                    let value = scanner
                        .read_int("Corners")
                        .map_err(MeshParseError::in_entity("corner", k + 1))?;
                    warn_if_out_of_order("corners", k + 1, value);
                }
            }
            "Req" => {
                scanner.expect_literal("uiredVertices", "RequiredVertices")?;
                let count = capped_count(scanner, "RequiredVertices", nver)?;
                if body.corners != 0 {
                    if body.corners != count {
                        log::warn!(
                            "the number of corners (={}) should not be different from \
                             the number of required vertices (={})",
                            body.corners,
                            count
                        );
                    }
                } else {
                    body.corners = count;
                }
                for k in 0..count {
                    let value = scanner
                        .read_int("RequiredVertices")
                        .map_err(MeshParseError::in_entity("required vertex", k + 1))?;
                    warn_if_out_of_order("required vertices", k + 1, value);
                }
            }
            "Nor" => {
                let tail = scanner.read_exact(4, "the Normals or NormalAtVertices keyword")?;
                match String::from_utf8_lossy(tail).as_ref() {
                    "malA" => {
                        scanner.expect_literal("tVertices", "NormalAtVertices")?;
                        let count = capped_count(scanner, "NormalAtVertices", nver)?;
                        merge_count(
                            &mut body.normals,
                            count,
                            "normal vectors",
                            "normal vectors prescribed at vertices",
                        )?;
                        for k in 0..count {
                            let p = read_vertex_ref(
                                scanner,
                                "normal vector",
                                k + 1,
                                "owning",
                                nver,
                            )?;
                            let own = scanner
                                .read_int("NormalAtVertices")
                                .map_err(MeshParseError::in_entity("normal vector", k + 1))?;
                            warn_if_out_of_order("normal vectors at vertices", k + 1, own);
                            body.normals[k].p = p;
                        }
                    }
                    "mals" => {
                        let count = capped_count(scanner, "Normals", nver)?;
                        merge_count(
                            &mut body.normals,
                            count,
                            "normal vectors prescribed at vertices",
                            "normal vectors",
                        )?;
                        for k in 0..count {
                            let wrap = MeshParseError::in_entity("normal vector", k + 1);
                            body.normals[k].x =
                                scanner.read_f64("a normal component").map_err(&wrap)?;
                            body.normals[k].y =
                                scanner.read_f64("a normal component").map_err(&wrap)?;
                            body.normals[k].z =
                                scanner.read_f64("a normal component").map_err(&wrap)?;
                        }
                    }
                    other => {
                        return Err(ScanError::KeywordMismatch {
                            expected: "Normals or NormalAtVertices",
                            found: format!("Nor{}", other),
                        }
                        .into())
                    }
                }
            }
            "Tan" => {
                let tail = scanner.read_exact(5, "the Tangents or TangentAtVertices keyword")?;
                match String::from_utf8_lossy(tail).as_ref() {
                    "gentA" => {
                        scanner.expect_literal("tVertices", "TangentAtVertices")?;
                        let count = capped_count(scanner, "TangentAtVertices", nver)?;
                        merge_count(
                            &mut body.tangents,
                            count,
                            "tangent vectors",
                            "tangent vectors prescribed at vertices",
                        )?;
                        for k in 0..count {
                            let p = read_vertex_ref(
                                scanner,
                                "tangent vector",
                                k + 1,
                                "owning",
                                nver,
                            )?;
                            let own = scanner
                                .read_int("TangentAtVertices")
                                .map_err(MeshParseError::in_entity("tangent vector", k + 1))?;
                            warn_if_out_of_order("tangent vectors at vertices", k + 1, own);
                            body.tangents[k].p = p;
                        }
                    }
                    "gents" => {
                        let count = capped_count(scanner, "Tangents", nver)?;
                        merge_count(
                            &mut body.tangents,
                            count,
                            "tangent vectors prescribed at vertices",
                            "tangent vectors",
                        )?;
                        for k in 0..count {
                            let wrap = MeshParseError::in_entity("tangent vector", k + 1);
                            body.tangents[k].x =
                                scanner.read_f64("a tangent component").map_err(&wrap)?;
                            body.tangents[k].y =
                                scanner.read_f64("a tangent component").map_err(&wrap)?;
                            body.tangents[k].z =
                                scanner.read_f64("a tangent component").map_err(&wrap)?;
                        }
                    }
                    other => {
                        return Err(ScanError::KeywordMismatch {
                            expected: "Tangents or TangentAtVertices",
                            found: format!("Tan{}", other),
                        }
                        .into())
                    }
                }
            }
            "End" => break,
            other => {
                return Err(MeshParseError::UnknownKeyword {
                    kind: "tetrahedral",
                    found: other.to_owned(),
                })
            }
        }
    }

    Ok(body)
}
