//! Reading and writing molecular structure files.
//!
//! Formats implement [`MolecularFile`](traits::MolecularFile); the only format
//! shipped is fixed-column PDB.

pub mod pdb;
pub mod traits;
