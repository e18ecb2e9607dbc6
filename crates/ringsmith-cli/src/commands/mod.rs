pub mod build;
pub mod fit;
