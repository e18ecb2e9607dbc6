//! # Molecular Model
//!
//! In-memory representation of an atomic structure: atoms grouped into residues,
//! residues grouped into chains, plus explicit bonds.
//!
//! - [`ids`] - slot-map keys for atoms, residues and chains
//! - [`atom`] - a single atom with its coordinates and role
//! - [`residue`] - a residue and the atoms it owns
//! - [`chain`] - a labelled chain (segment) of residues
//! - [`topology`] - bonds between atoms
//! - [`system`] - [`MolecularSystem`](system::MolecularSystem), the container tying them together
//!
//! ```ignore
//! use ringsmith::core::models::{atom::Atom, chain::ChainType, system::MolecularSystem};
//!
//! let mut system = MolecularSystem::new();
//! let chain_id = system.add_chain('A', ChainType::Protein);
//! let residue_id = system.add_residue(chain_id, 1, None, "ALA")?;
//! system.add_atom_to_residue(residue_id, Atom::new("CA", residue_id, Point3::origin()))?;
//! ```

pub mod atom;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod system;
pub mod topology;
