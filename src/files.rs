//! File-name classification and extension handling.
//!
//! The on-disk formats are tied to exact, case-sensitive suffixes: `.mesh`
//! for the mesh interchange format, `.cube` for the volumetric grid format,
//! and `.chem` for the chemistry description. Classification compares the
//! suffix bytes directly; `Mesh.cube` and `box.MESH` are different things.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("the path `{path}` is not valid UTF-8 and cannot be classified")]
    NotUtf8 { path: PathBuf },
    #[error("the name `{path}` cannot hold anything more than the bare `{extension}` extension")]
    TooShort {
        path: PathBuf,
        extension: &'static str,
    },
    #[error("the name `{path}` does not end with the '.mesh', '.cube' or '.chem' extension")]
    UnknownExtension { path: PathBuf },
    #[error("the name `{path}` does not end with the expected `{expected}` extension")]
    ExpectedKind {
        path: PathBuf,
        expected: &'static str,
    },
}

/// the three on-disk formats this crate touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Mesh,
    Cube,
    Chem,
}

impl FileKind {
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Mesh => ".mesh",
            FileKind::Cube => ".cube",
            FileKind::Chem => ".chem",
        }
    }

    /// classify a path by its exact suffix bytes
    pub fn classify(path: &Path) -> Result<FileKind, FileError> {
        let name = path_str(path)?;

        for kind in [FileKind::Mesh, FileKind::Cube, FileKind::Chem] {
            if name.ends_with(kind.extension()) {
                // something must precede the extension
                if name.len() < kind.extension().len() + 1 {
                    return Err(FileError::TooShort {
                        path: path.into(),
                        extension: kind.extension(),
                    });
                }
                return Ok(kind);
            }
        }

        Err(FileError::UnknownExtension { path: path.into() })
    }

    /// classify and require a specific kind
    pub fn expect(path: &Path, expected: FileKind) -> Result<(), FileError> {
        if FileKind::classify(path)? == expected {
            Ok(())
        } else {
            Err(FileError::ExpectedKind {
                path: path.into(),
                expected: expected.extension(),
            })
        }
    }
}

fn path_str(path: &Path) -> Result<&str, FileError> {
    path.to_str().ok_or_else(|| FileError::NotUtf8 {
        path: path.into(),
    })
}

/// replace the 5-byte extension of `path` (".xxxx") with `extension`
pub(crate) fn swap_extension(path: &Path, extension: &'static str) -> Result<PathBuf, FileError> {
    let name = path_str(path)?;
    if name.len() < 6 || name.as_bytes()[name.len() - 5] != b'.' {
        return Err(FileError::TooShort {
            path: path.into(),
            extension,
        });
    }
    Ok(PathBuf::from(format!("{}{}", &name[..name.len() - 5], extension)))
}

/// the default output name derived from the companion `.info` name
pub(crate) fn default_from_info(info: &Path, kind: FileKind) -> Result<PathBuf, FileError> {
    let name = path_str(info)?;
    if !name.ends_with(".info") {
        return Err(FileError::ExpectedKind {
            path: info.into(),
            expected: ".info",
        });
    }
    if name.len() < 6 {
        return Err(FileError::TooShort {
            path: info.into(),
            extension: ".info",
        });
    }
    swap_extension(info, kind.extension())
}

/// decide where a mesh file goes: an explicit `.mesh` name, a `.cube` name
/// with the extension swapped, or the `.info` companion default
pub(crate) fn resolve_mesh_output(
    explicit: Option<&Path>,
    info: &Path,
) -> Result<PathBuf, FileError> {
    match explicit {
        None => default_from_info(info, FileKind::Mesh),
        Some(path) => match FileKind::classify(path)? {
            FileKind::Mesh => Ok(path.into()),
            FileKind::Cube => swap_extension(path, ".mesh"),
            FileKind::Chem => Err(FileError::ExpectedKind {
                path: path.into(),
                expected: ".mesh",
            }),
        },
    }
}

/// decide where a grid file goes, mirroring [`resolve_mesh_output`]
pub(crate) fn resolve_grid_output(
    explicit: Option<&Path>,
    info: &Path,
) -> Result<PathBuf, FileError> {
    match explicit {
        None => default_from_info(info, FileKind::Cube),
        Some(path) => match FileKind::classify(path)? {
            FileKind::Cube => Ok(path.into()),
            FileKind::Mesh => swap_extension(path, ".cube"),
            FileKind::Chem => Err(FileError::ExpectedKind {
                path: path.into(),
                expected: ".cube",
            }),
        },
    }
}

/// the `.sol` scratch name the external remesher writes next to a `.mesh`
/// file (one byte shorter than the mesh name)
pub(crate) fn sol_companion(mesh: &Path) -> Result<PathBuf, FileError> {
    let name = path_str(mesh)?;
    if name.len() < 6 || !name.ends_with(".mesh") {
        return Err(FileError::ExpectedKind {
            path: mesh.into(),
            expected: ".mesh",
        });
    }
    Ok(PathBuf::from(format!("{}.sol", &name[..name.len() - 5])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_exact_and_case_sensitive() {
        assert_eq!(FileKind::classify(Path::new("a.mesh")).unwrap(), FileKind::Mesh);
        assert_eq!(FileKind::classify(Path::new("dir/a.cube")).unwrap(), FileKind::Cube);
        assert_eq!(FileKind::classify(Path::new("a.chem")).unwrap(), FileKind::Chem);
        assert!(FileKind::classify(Path::new("a.MESH")).is_err());
        assert!(FileKind::classify(Path::new("a.msh")).is_err());
        assert!(FileKind::classify(Path::new(".mesh")).is_err());
    }

    #[test]
    fn mesh_output_resolution() {
        let info = Path::new("run/case.info");
        assert_eq!(
            resolve_mesh_output(None, info).unwrap(),
            PathBuf::from("run/case.mesh")
        );
        assert_eq!(
            resolve_mesh_output(Some(Path::new("grid.cube")), info).unwrap(),
            PathBuf::from("grid.mesh")
        );
        assert_eq!(
            resolve_mesh_output(Some(Path::new("out.mesh")), info).unwrap(),
            PathBuf::from("out.mesh")
        );
        assert!(resolve_mesh_output(Some(Path::new("out.chem")), info).is_err());
        assert!(resolve_mesh_output(None, Path::new("case.data")).is_err());
    }

    #[test]
    fn sol_companion_shortens_the_name() {
        assert_eq!(
            sol_companion(Path::new("run/case.mesh")).unwrap(),
            PathBuf::from("run/case.sol")
        );
        assert!(sol_companion(Path::new("case.cube")).is_err());
    }
}
