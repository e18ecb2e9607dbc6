//! # Workflows Module
//!
//! End-to-end entry points tying the [`core`](crate::core) structure layer and
//! the [`engine`](crate::engine) together.
//!
//! - **Build Workflow** ([`build`]) - monomer extraction, radius resolution,
//!   placement, intermediate files and merging into the final ring
//! - **Fit Workflow** ([`fit`]) - circle fit of a structure on its own, for diagnostics

pub mod build;
pub mod fit;
