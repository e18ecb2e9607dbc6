//! # Engine Module
//!
//! The geometric modeling engine: fitting a circle to an approximate
//! arrangement, planning where each subunit goes, and assembling the ring.
//!
//! - **Configuration** ([`config`]) - ring geometry, fit parameters and the build config builder
//! - **Circle Fitting** ([`circle_fit`]) - Levenberg-Marquardt fit of center and radius
//! - **Planning** ([`planner`]) - per-subunit angles, target positions, axes and chain labels
//! - **Assembly** ([`assembler`]) - the [`StructureToolkit`](assembler::StructureToolkit) seam and the ring assembler
//! - **Progress Monitoring** ([`progress`]) - callback-based progress events
//! - **Error Handling** ([`error`]) - engine error types
//!
//! The circle fit always completes before any placement starts; placements
//! themselves are independent and run in parallel with the `parallel` feature.

pub mod assembler;
pub mod circle_fit;
pub mod config;
pub mod error;
pub mod planner;
pub mod progress;
