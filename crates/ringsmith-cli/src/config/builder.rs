use super::defaults::{DefaultsConfig, INTERMEDIATES_DIR_NAME};
use super::file::FileConfig;
use super::models::{AppConfig, FitAppConfig};
use crate::cli::{BuildArgs, FitArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use ringsmith::core::selection::AtomSelection;
use ringsmith::engine::config::{BuildConfigBuilder, CircleFitConfig, IntermediatesConfig};

/// Merges the `build` arguments with the config file and the built-in
/// defaults, in that order of precedence.
pub fn build_config(args: &BuildArgs) -> Result<AppConfig> {
    let file_config = FileConfig::load_optional(args.config.as_deref())?;
    build_config_with(args, file_config)
}

fn build_config_with(args: &BuildArgs, mut file_config: FileConfig) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let ring_file = file_config.ring.take().unwrap_or_default();
    let fit_file = file_config.fit.take().unwrap_or_default();
    let alignment_file = file_config.alignment.take().unwrap_or_default();
    let output_file = file_config.output.take().unwrap_or_default();

    let topdir = args
        .topdir
        .clone()
        .or(output_file.topdir)
        .unwrap_or(defaults.topdir);
    let delete_intermediates = args
        .delete_intermediates
        .or(output_file.delete_intermediates)
        .unwrap_or(defaults.delete_intermediates);

    let fit_selection =
        resolve_selection(None, fit_file.selection.as_deref(), defaults.fit_selection)?;
    let alignment_selection = resolve_selection(
        args.align_selection.clone(),
        alignment_file.selection.as_deref(),
        defaults.alignment_selection,
    )?;

    let mut builder = BuildConfigBuilder::new()
        .z_rotation(
            args.z_rotation
                .or(ring_file.z_rotation)
                .unwrap_or(defaults.z_rotation),
        )
        .xy_rotation(
            args.xy_rotation
                .or(ring_file.xy_rotation)
                .unwrap_or(defaults.xy_rotation),
        )
        .tilt(args.tilt.or(ring_file.tilt).unwrap_or(defaults.tilt))
        .radius_override(args.in_radius.or(ring_file.radius))
        .max_iterations(fit_file.max_iterations.unwrap_or(defaults.max_iterations))
        .tolerance(fit_file.tolerance.unwrap_or(defaults.tolerance))
        .fit_selection(fit_selection)
        .alignment_selection(alignment_selection)
        .intermediates(Some(IntermediatesConfig {
            directory: topdir.join(INTERMEDIATES_DIR_NAME),
            keep: !delete_intermediates,
        }));
    if let Some(count) = args.no_subunits.or(ring_file.subunits) {
        builder = builder.subunit_count(count);
    }
    let core_config = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        input_path: topdir.join(&args.in_structure),
        monomer_path: args.monomer.as_ref().map(|path| topdir.join(path)),
        output_path: args.output.clone(),
        topdir,
        core_config,
    })
}

/// Merges the `fit` arguments with the `[fit]` section of the config file.
pub fn build_fit_config(args: &FitArgs) -> Result<FitAppConfig> {
    let file_config = FileConfig::load_optional(args.config.as_deref())?;
    build_fit_config_with(args, file_config)
}

fn build_fit_config_with(args: &FitArgs, file_config: FileConfig) -> Result<FitAppConfig> {
    let defaults = DefaultsConfig::default();
    let fit_file = file_config.fit.unwrap_or_default();

    let selection = resolve_selection(
        args.selection.clone(),
        fit_file.selection.as_deref(),
        defaults.fit_selection,
    )?;
    let fit = CircleFitConfig {
        max_iterations: fit_file.max_iterations.unwrap_or(defaults.max_iterations),
        tolerance: fit_file.tolerance.unwrap_or(defaults.tolerance),
    };
    fit.validate().map_err(|e| CliError::Config(e.to_string()))?;

    Ok(FitAppConfig {
        input_path: args.in_structure.clone(),
        selection,
        fit,
        report_path: args.report.clone(),
    })
}

fn resolve_selection(
    cli_value: Option<AtomSelection>,
    file_value: Option<&str>,
    default: AtomSelection,
) -> Result<AtomSelection> {
    if let Some(selection) = cli_value {
        return Ok(selection);
    }
    match file_value {
        Some(text) => parser::parse_selection(text).map_err(|e| CliError::Config(e.to_string())),
        None => Ok(default),
    }
}
