//! # Ringsmith Core Library
//!
//! Builds circularly symmetric multi-subunit assemblies ("rings") from a single
//! repeating subunit: a circle is fitted to a crude arrangement (or the radius
//! is given), and copies of the subunit are aligned, rotated and translated
//! onto that circle before being merged into one structure.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** Molecular data models (`MolecularSystem`),
//!   atom selections, geometric primitives and PDB I/O.
//!
//! - **[`engine`]: The Logic Core.** Circle fitting, placement planning and ring
//!   assembly. Structure manipulation goes through the `StructureToolkit` trait.
//!
//! - **[`workflows`]: The Public API.** Complete procedures (`build`, `fit`)
//!   with progress reporting and intermediate file handling.

pub mod core;
pub mod engine;
pub mod workflows;
