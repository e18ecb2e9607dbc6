//! # Core Module
//!
//! The structure collaborator used by the ring engine: molecular data models,
//! atom selections, geometric primitives and file I/O.
//!
//! - **Molecular Representation** ([`models`]) - atoms, residues, chains and systems
//! - **Atom Selection** ([`selection`]) - named subsets used for fitting and alignment
//! - **File I/O** ([`io`]) - the [`MolecularFile`](io::traits::MolecularFile) trait and the PDB format
//! - **Utilities** ([`utils`]) - superposition, rotations and residue/atom classification

pub mod io;
pub mod models;
pub mod selection;
pub mod utils;
