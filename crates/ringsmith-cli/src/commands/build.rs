use crate::cli::BuildArgs;
use crate::config::{AppConfig, build_config};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use ringsmith::engine::progress::ProgressReporter;
use ringsmith::workflows::build::{self, BuildResult};
use std::path::PathBuf;
use tracing::info;

pub fn run(args: BuildArgs, show_progress: bool) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let config = build_config(&args)?;

    info!("Loading input structure from {:?}", &config.input_path);
    let reference = build::load_structure(&config.input_path)?;
    let monomer = config
        .monomer_path
        .as_deref()
        .map(|path| {
            info!("Loading monomer from {:?}", path);
            build::load_structure(path)
        })
        .transpose()?;

    let progress_handler = if show_progress {
        CliProgressHandler::new()
    } else {
        CliProgressHandler::hidden()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Building a ring of {} subunits...",
        config.core_config.ring.subunit_count
    );
    let result = build::run(
        &reference,
        monomer.as_ref(),
        &config.core_config,
        &reporter,
    )?;

    let output_path = output_path(&config, &result);
    info!("Writing assembled ring to {:?}", &output_path);
    build::save_structure(&result.ring.structure, &output_path)?;

    if result.circle.is_fitted() {
        println!(
            "  Fitted ring radius: {:.2} Å (center {:.2}, {:.2})",
            result.circle.radius, result.circle.center.x, result.circle.center.y
        );
    }
    for file in &result.intermediate_files {
        println!("  Intermediate structure kept: {}", file.display());
    }
    println!(
        "✓ Ring of {} subunits (radius {:.2} Å) written to: {}",
        result.ring.placements.len(),
        result.ring.radius,
        output_path.display()
    );

    Ok(())
}

fn output_path(config: &AppConfig, result: &BuildResult) -> PathBuf {
    config.output_path.clone().unwrap_or_else(|| {
        config
            .topdir
            .join(build::output_file_name(&config.core_config.ring, result.ring.radius))
    })
}
