//! Orchestration: decide how the mesh comes to exist.
//!
//! [`load_mesh`] is a small state machine over "does the named input file
//! exist" and "what extension does it have". A missing file leads to a
//! default box discretization (after user confirmation), a `.mesh` file is
//! loaded and reconciled with the discretization parameters, and a `.cube`
//! file is converted through the grid reader. The external isotropic
//! remesher and the confirmation prompt are injected collaborators so the
//! core stays agnostic of how either is actually performed.

use crate::discretize::{mesh_box_declared, MeshCounts};
use crate::domain::Domain;
use crate::files::{self, FileError, FileKind};
use crate::grid::read_grid_file;
use crate::mesh::{Mesh, MeshKind};
use crate::parse::read_mesh_file;
use crate::write_mesh::write_mesh_file;
use crate::Error;

use std::path::{Path, PathBuf};

/// the external isotropic remeshing tool, seen as a blocking subroutine that
/// rewrites the mesh file in place (file-based IPC)
pub trait Remesher {
    fn remesh(&self, path: &Path) -> Result<(), Error>;
}

/// run an external remeshing program on the mesh file, blocking until it
/// returns
pub struct CommandRemesher {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandRemesher {
    pub fn new(program: impl Into<PathBuf>) -> CommandRemesher {
        CommandRemesher {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// add a fixed argument placed before the mesh path
    pub fn arg(mut self, arg: impl Into<String>) -> CommandRemesher {
        self.args.push(arg.into());
        self
    }
}

impl Remesher for CommandRemesher {
    fn remesh(&self, path: &Path) -> Result<(), Error> {
        let status = std::process::Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()
            .map_err(|source| Error::Remesh {
                path: path.into(),
                reason: source.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Remesh {
                path: path.into(),
                reason: format!("exit status {}", status),
            })
        }
    }
}

/// user confirmation for potentially destructive or expensive steps
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> Result<bool, Error>;
}

/// silent mode: every question is answered with yes
pub struct AutoApprove;

impl Confirm for AutoApprove {
    fn confirm(&self, _prompt: &str) -> Result<bool, Error> {
        Ok(true)
    }
}

/// interactive confirmation on standard input (`y` / `n`)
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool, Error> {
        use std::io::Write as _;

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let _ = write!(handle, "{} (y/n)? ", prompt);
        let _ = handle.flush();
        drop(handle);

        let mut answer = String::new();
        let read = std::io::stdin()
            .read_line(&mut answer)
            .map_err(|_| Error::Prompt)?;
        if read == 0 {
            // end of stream before any answer
            return Err(Error::Prompt);
        }

        match answer.trim() {
            "y" => Ok(true),
            "n" => Ok(false),
            _ => Err(Error::Prompt),
        }
    }
}

/// names, flags, and discretization parameters driving [`load_mesh`]
///
/// `info_path` is the companion `.info` name whose extension substitution
/// yields the default output names. `mesh_path` is the user-prescribed input
/// (or output) mesh name, updated as the orchestration settles on the file it
/// will keep writing to. `interactive` gates the confirmation prompts.
pub struct LoadConfig {
    pub domain: Domain,
    pub kind: MeshKind,
    pub info_path: PathBuf,
    pub mesh_path: Option<PathBuf>,
    pub chem_path: PathBuf,
    pub interactive: bool,
}

/// how [`load_mesh`] ended: with a mesh, or with the user declining
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Mesh),
    Declined,
}

/// produce the mesh the rest of the pipeline runs on
///
/// - no usable file named: generate the default discretization (confirmed by
///   the user unless silent), persist it, and for tetrahedral meshes run the
///   external remesher on the fresh file and reload its output
/// - an existing `.mesh` file: load it, recompute the discretization
///   parameters from its vertices, and make sure later writes never clobber
///   the user's original file
/// - an existing `.cube` file: convert it and persist the `.mesh` rendition
pub fn load_mesh(
    config: &mut LoadConfig,
    remesher: &dyn Remesher,
    confirm: &dyn Confirm,
) -> Result<LoadOutcome, Error> {
    let existing = config.mesh_path.as_ref().filter(|p| p.exists()).cloned();

    match existing {
        None => generate_default(config, remesher, confirm),
        Some(path) => match FileKind::classify(&path)? {
            FileKind::Mesh => load_existing_mesh(config, &path, confirm),
            FileKind::Cube => convert_grid(config, &path),
            FileKind::Chem => Err(FileError::ExpectedKind {
                path,
                expected: ".mesh' or '.cube",
            }
            .into()),
        },
    }
}

fn generate_default(
    config: &mut LoadConfig,
    remesher: &dyn Remesher,
    confirm: &dyn Confirm,
) -> Result<LoadOutcome, Error> {
    // the counts below are only meaningful for a sane discretization
    config.domain.validate(MeshKind::Hexahedral)?;

    let counts = MeshCounts::expected(config.kind, config.domain.points);
    let estimate = counts.memory_estimate();

    let summary = match config.kind {
        MeshKind::Tetrahedral => format!(
            "{} vertices, {} tetrahedra, and {} boundary triangles (8 corners, {} edges, \
             {} tangent and {} normal vectors)",
            counts.vertices,
            counts.tetrahedra,
            counts.triangles,
            counts.edges,
            counts.tangents,
            counts.normals
        ),
        MeshKind::Hexahedral => format!(
            "{} vertices, {} hexahedra, and {} boundary quadrilaterals",
            counts.vertices, counts.hexahedra, counts.quadrilaterals
        ),
    };
    log::info!(
        "the default initial computational box is [{}, {}] x [{}, {}] x [{}, {}] with \
         ({} x {} x {}) points",
        config.domain.min[0],
        config.domain.max[0],
        config.domain.min[1],
        config.domain.max[1],
        config.domain.min[2],
        config.domain.max[2],
        config.domain.points[0],
        config.domain.points[1],
        config.domain.points[2]
    );
    log::info!("the default initial mesh will have {}", summary);

    if config.interactive {
        let prompt = format!(
            "The default initial mesh will have {}, taking {}.{:06} MB. \
             Do you want to continue",
            summary,
            estimate / 1_000_000,
            estimate % 1_000_000
        );
        if !confirm.confirm(&prompt)? {
            log::info!("ok, leaving: the suggested discretization was not approved");
            return Ok(LoadOutcome::Declined);
        }
    }
    log::info!("ok, we mesh the box");

    let mut mesh = mesh_box_declared(&config.domain, config.kind, &counts)?;

    let target = files::resolve_mesh_output(config.mesh_path.as_deref(), &config.info_path)?;
    write_mesh_file(&config.domain, &mesh, &target, None)?;
    config.mesh_path = Some(target.clone());

    // a stale scratch file from an earlier run would confuse the remesher
    let sol = files::sol_companion(&target)?;
    if sol.exists() {
        std::fs::remove_file(&sol)?;
    }

    if config.kind == MeshKind::Tetrahedral {
        log::info!("running a preliminary isotropic mesh adaptation");
        drop(mesh);

        remesher.remesh(&target)?;
        if sol.exists() {
            std::fs::remove_file(&sol)?;
        }

        mesh = read_mesh_file(&target, config.kind)?;
    }

    Ok(LoadOutcome::Loaded(mesh))
}

fn load_existing_mesh(
    config: &mut LoadConfig,
    path: &Path,
    confirm: &dyn Confirm,
) -> Result<LoadOutcome, Error> {
    log::info!("mesh structure will be loaded from {}", path.display());

    let mesh = read_mesh_file(path, config.kind)?;
    config.domain = config.domain.from_mesh(&mesh, config.kind)?;

    let default = files::default_from_info(&config.info_path, FileKind::Mesh)?;
    if path == default {
        log::warn!(
            "the prescribed mesh file has the same path as the default name {}",
            default.display()
        );
        if config.interactive {
            let prompt = format!(
                "The {} file may be overwritten later. Do you want to continue",
                default.display()
            );
            if !confirm.confirm(&prompt)? {
                log::info!("ok, leaving: the input mesh file stays untouched");
                return Ok(LoadOutcome::Declined);
            }
        }
    } else {
        // work on a copy so later writes never clobber the user's file
        if default.exists() {
            std::fs::remove_file(&default)?;
        }
        std::fs::copy(path, &default)?;
        config.mesh_path = Some(default);
    }

    Ok(LoadOutcome::Loaded(mesh))
}

fn convert_grid(config: &mut LoadConfig, path: &Path) -> Result<LoadOutcome, Error> {
    log::info!("mesh structure will be loaded from {}", path.display());

    let (domain, mesh) = read_grid_file(path, &config.chem_path, config.kind)?;
    config.domain = domain;

    let default = files::default_from_info(&config.info_path, FileKind::Mesh)?;
    write_mesh_file(&config.domain, &mesh, &default, None)?;
    config.mesh_path = Some(default);

    Ok(LoadOutcome::Loaded(mesh))
}
