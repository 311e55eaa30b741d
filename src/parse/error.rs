//! Error types raised while scanning and parsing `.mesh` files.
//!
//! Every fatal condition carries enough context to pinpoint the failure: the
//! keyword or entity being read, the entity index, the vertex slot, and the
//! offending value.

/// low-level failures of the token scanner
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("reached the end of the input while looking for {expected}")]
    InputExhausted { expected: &'static str },
    #[error("expecting the keyword `{expected}` instead of `{found}`")]
    KeywordMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("expecting an integer for {context} instead of `{token}`")]
    BadInteger {
        context: &'static str,
        token: String,
    },
    #[error("expecting a floating point value for {context} instead of `{token}`")]
    BadFloat {
        context: &'static str,
        token: String,
    },
}

/// fatal format violations raised by the mesh reader
#[derive(Debug, thiserror::Error)]
pub enum MeshParseError {
    #[error("{0}")]
    Scan(#[from] ScanError),
    #[error("expecting `MeshVersionFormatted 2` instead of version {found}")]
    BadVersion { found: i64 },
    #[error("expecting `Dimension 3` instead of dimension {found}")]
    BadDimension { found: i64 },
    #[error("expecting a positive count after the `{keyword}` keyword instead of {count}")]
    BadCount { keyword: &'static str, count: i64 },
    #[error(
        "the count {count} after the `{keyword}` keyword cannot be (strictly) greater \
         than the total number of vertices {vertices}"
    )]
    CountExceedsVertices {
        keyword: &'static str,
        count: i64,
        vertices: usize,
    },
    #[error(
        "the number of {first} (={stored}) should not be different from the \
         number of {second} (={found})"
    )]
    DuplicateCountMismatch {
        first: &'static str,
        second: &'static str,
        stored: usize,
        found: usize,
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
        value: i64,
        vertices: usize,
    },
    #[error("while reading the {index}-th {entity}: {source}")]
    Entity {
        entity: &'static str,
        index: usize,
        source: ScanError,
    },
    #[error("the keyword `{found}` is not recognized in a {kind} mesh file")]
    UnknownKeyword { kind: &'static str, found: String },
}

impl MeshParseError {
    /// attach the entity being read to a low-level scanner failure
    pub(crate) fn in_entity(
        entity: &'static str,
        index: usize,
    ) -> impl Fn(ScanError) -> MeshParseError {
        move |source| MeshParseError::Entity {
            entity,
            index,
            source,
        }
    }
}
