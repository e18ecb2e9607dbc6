use super::fit;
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::MolecularFile;
use crate::core::models::system::MolecularSystem;
use crate::core::selection::AtomSelection;
use crate::engine::assembler::{AssembledRing, RigidBodyToolkit, RingAssembler};
use crate::engine::circle_fit::CircleFit;
use crate::engine::config::{BuildConfig, ConfigError, IntermediatesConfig, RingSpec};
use crate::engine::error::EngineError;
use crate::engine::planner::{plan, resolve_radius};
use crate::engine::progress::{Progress, ProgressReporter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const MONOMER_FILE_NAME: &str = "monomer.pdb";

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub ring: AssembledRing,
    pub circle: CircleFit,
    /// Intermediate files left on disk (empty unless they are kept).
    pub intermediate_files: Vec<PathBuf>,
}

pub fn load_structure(path: &Path) -> Result<MolecularSystem, EngineError> {
    PdbFile::read_from_path(path)
        .map(|(system, _)| system)
        .map_err(|source| EngineError::StructureFile {
            action: "read",
            path: path.to_path_buf(),
            source,
        })
}

pub fn save_structure(system: &MolecularSystem, path: &Path) -> Result<(), EngineError> {
    PdbFile::write_system_to_path(system, path).map_err(|source| EngineError::StructureFile {
        action: "write",
        path: path.to_path_buf(),
        source,
    })
}

pub fn subunit_file_name(index: usize) -> String {
    format!("{}subunit.pdb", index)
}

/// Name of the assembled ring file, e.g. `12mer_rad25.0A_z0.0deg_xy0.0deg_tilt0.0deg.pdb`.
///
/// The radius is rounded to two decimals; all numbers keep a fractional part.
pub fn output_file_name(ring: &RingSpec, radius: f64) -> String {
    format!(
        "{}mer_rad{}A_z{}deg_xy{}deg_tilt{}deg.pdb",
        ring.subunit_count,
        format_decimal((radius * 100.0).round() / 100.0),
        format_decimal(ring.z_rotation_deg),
        format_decimal(ring.xy_rotation_deg),
        format_decimal(ring.tilt_deg),
    )
}

/// Shortest round-trip rendering of `value`, with `.0` appended to whole numbers.
fn format_decimal(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

/// Takes the first chain of `source` as the repeating unit.
fn extract_monomer(source: &MolecularSystem) -> Result<MolecularSystem, EngineError> {
    source
        .first_chain()
        .map(|chain| source.extract_chain(chain))
        .filter(|monomer| !monomer.is_empty())
        .ok_or_else(|| {
            ConfigError::EmptySelection {
                selection: AtomSelection::All.to_string(),
                context: "monomer",
            }
            .into()
        })
}

fn resolve_circle(
    reference: &MolecularSystem,
    config: &BuildConfig,
) -> Result<CircleFit, EngineError> {
    match config.ring.radius_override {
        Some(radius) => {
            info!(
                radius,
                "Using a fixed radius of {} Angstrom for the circular assembly.", radius
            );
            Ok(CircleFit::user_supplied(radius))
        }
        None => Ok(fit::run(reference, &config.fit_selection, &config.fit)?.circle),
    }
}

/// Tracks files written into the intermediates directory so they can be
/// removed again.
struct IntermediateStore<'a> {
    config: &'a IntermediatesConfig,
    created_dir: bool,
    files: Vec<PathBuf>,
}

impl<'a> IntermediateStore<'a> {
    fn open(config: &'a IntermediatesConfig) -> Result<Self, EngineError> {
        let created_dir = !config.directory.exists();
        fs::create_dir_all(&config.directory).map_err(|source| EngineError::Filesystem {
            path: config.directory.clone(),
            source,
        })?;
        Ok(Self {
            config,
            created_dir,
            files: Vec::new(),
        })
    }

    fn write(&mut self, name: &str, system: &MolecularSystem) -> Result<(), EngineError> {
        let path = self.config.directory.join(name);
        save_structure(system, &path)?;
        self.files.push(path);
        Ok(())
    }

    /// Keeps the written files if so configured, otherwise removes them.
    /// Returns the files left on disk.
    fn finish(self) -> Result<Vec<PathBuf>, EngineError> {
        if self.config.keep {
            return Ok(self.files);
        }
        info!("Deleting individual subunit structures.");
        self.discard()?;
        Ok(Vec::new())
    }

    /// Removes every file this run wrote, and the directory if this run
    /// created it, whether or not they were to be kept.
    fn discard(self) -> Result<(), EngineError> {
        for file in &self.files {
            fs::remove_file(file).map_err(|source| EngineError::Filesystem {
                path: file.clone(),
                source,
            })?;
        }
        if self.created_dir {
            if let Err(err) = fs::remove_dir(&self.config.directory) {
                warn!(
                    path = %self.config.directory.display(),
                    "Could not remove intermediates directory: {}", err
                );
            }
        }
        Ok(())
    }
}

/// Builds a ring from `reference`.
///
/// The monomer is the first chain of `monomer_source` if given, otherwise
/// the first chain of `reference`. Unless the ring radius is fixed by the
/// configuration, it is fitted to the atoms of `reference` matched by the
/// fit selection. Every copy is aligned onto the first chain of `reference`.
///
/// When intermediates are configured, the monomer and every placed subunit
/// are written to that directory; unless they are kept they are removed
/// again. A failed build always removes the files it wrote.
#[instrument(skip_all, name = "ring_build_workflow", fields(subunits = config.ring.subunit_count))]
pub fn run(
    reference: &MolecularSystem,
    monomer_source: Option<&MolecularSystem>,
    config: &BuildConfig,
    reporter: &ProgressReporter,
) -> Result<BuildResult, EngineError> {
    config.ring.validate()?;

    let mut store = config
        .intermediates
        .as_ref()
        .map(IntermediateStore::open)
        .transpose()?;

    let outcome = build(reference, monomer_source, config, reporter, store.as_mut());

    let intermediate_files = match store {
        Some(store) if outcome.is_ok() => store.finish()?,
        Some(store) => {
            if let Err(cleanup_err) = store.discard() {
                warn!("Failed to clean up intermediates: {}", cleanup_err);
            }
            Vec::new()
        }
        None => Vec::new(),
    };

    let (ring, circle) = outcome?;
    Ok(BuildResult {
        ring,
        circle,
        intermediate_files,
    })
}

fn build(
    reference: &MolecularSystem,
    monomer_source: Option<&MolecularSystem>,
    config: &BuildConfig,
    reporter: &ProgressReporter,
    mut store: Option<&mut IntermediateStore>,
) -> Result<(AssembledRing, CircleFit), EngineError> {
    let monomer = reporter.phase("Preparation", || {
        info!("Extracting the monomer from the first chain.");
        let monomer = extract_monomer(monomer_source.unwrap_or(reference))?;
        if let Some(store) = store.as_deref_mut() {
            store.write(MONOMER_FILE_NAME, &monomer)?;
        }
        Ok::<_, EngineError>(monomer)
    })?;

    let circle = reporter.phase("Circle Fit", || resolve_circle(reference, config))?;
    let placements = plan(&config.ring, &circle)?;
    let radius = resolve_radius(&config.ring, &circle);

    let toolkit = RigidBodyToolkit;
    let assembler = RingAssembler::new(&toolkit, config.alignment_selection.clone());

    let subunits = reporter.phase("Placement", || {
        assembler.place_subunits(&monomer, reference, &placements, &config.ring, reporter)
    })?;

    if let Some(store) = store.as_deref_mut() {
        for (index, subunit) in subunits.iter().enumerate() {
            store.write(&subunit_file_name(index), subunit)?;
        }
    }

    let structure = reporter.phase("Merge", || assembler.merge(&subunits));
    reporter.report(Progress::Message(format!(
        "Assembled {} subunits at radius {:.2} Angstrom.",
        placements.len(),
        radius
    )));
    info!(
        atoms = structure.atom_count(),
        radius, "Ring assembly complete."
    );

    Ok((
        AssembledRing {
            structure,
            placements,
            radius,
        },
        circle,
    ))
}
