use crate::cli::FitArgs;
use crate::config::build_fit_config;
use crate::error::{CliError, Result};
use ringsmith::engine::circle_fit::FitSource;
use ringsmith::workflows::{build, fit};
use std::fs;
use tracing::info;

pub fn run(args: FitArgs) -> Result<()> {
    let config = build_fit_config(&args)?;

    info!("Loading input structure from {:?}", &config.input_path);
    let structure = build::load_structure(&config.input_path)?;
    let report = fit::run(&structure, &config.selection, &config.fit)?;

    println!(
        "✓ Circle fitted to {} atoms ({}): center ({:.3}, {:.3}), radius {:.3} Å",
        report.point_count,
        report.selection,
        report.circle.center.x,
        report.circle.center.y,
        report.circle.radius
    );
    if let FitSource::Fitted { rms_residual } = report.circle.source {
        println!("  RMS radial deviation {:.3} Å", rms_residual);
    }

    if let Some(path) = &config.report_path {
        let content = toml::to_string(&report).map_err(|e| CliError::Other(e.into()))?;
        fs::write(path, content)?;
        println!("  Report written to: {}", path.display());
    }

    Ok(())
}
