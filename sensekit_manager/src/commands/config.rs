//! `sensekit config` - validate a devices file

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use colored::*;
use serde::Serialize;

use sensekit_core::driver::DevicesConfig;
use sensekit_core::init_string::ParseResult;
use sensekit_library::drivers::{canonical_driver, list_available_drivers};

/// Validation outcome for one device
#[derive(Debug, Serialize)]
pub struct DeviceReport {
    pub name: String,
    pub driver: String,
    pub backend: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ParseResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeviceReport {
    /// Disabled devices are reported but never fail
    pub fn is_ok(&self) -> bool {
        !self.enabled || self.error.is_none()
    }
}

/// Load `path`, or the first devices file found in the standard locations
pub fn load_config(path: Option<&Path>) -> Result<(DevicesConfig, PathBuf)> {
    let Some(path) = path else {
        return Ok(DevicesConfig::find_and_load_with_path()?);
    };

    tracing::debug!(path = %path.display(), "loading devices file");
    let config = DevicesConfig::from_file(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok((config, path.to_path_buf()))
}

/// Check every device's driver name and init string
pub fn build_report(config: &DevicesConfig) -> Vec<DeviceReport> {
    config
        .devices
        .iter()
        .map(|(name, device)| {
            let mut report = DeviceReport {
                name: name.clone(),
                driver: device.driver.clone(),
                backend: device.backend.clone(),
                enabled: device.enabled,
                resources: None,
                error: None,
            };

            if canonical_driver(&device.driver).is_none() {
                report.error = Some(format!(
                    "unknown driver '{}' (available: {})",
                    device.driver,
                    list_available_drivers().join(", ")
                ));
                return report;
            }

            match device.descriptors() {
                Ok(parsed) => report.resources = Some(parsed),
                Err(e) => report.error = Some(e.to_string()),
            }
            report
        })
        .collect()
}

pub fn render_report(reports: &[DeviceReport], source: &Path) -> String {
    let mut out = format!(
        "{} {}\n",
        "Devices file:".cyan().bold(),
        source.display()
    );

    for report in reports {
        let marker = if !report.enabled {
            "-".dimmed()
        } else if report.error.is_some() {
            "x".red().bold()
        } else {
            "ok".green()
        };

        out.push_str(&format!(
            "  {:<3} {:<16} {:<14} {}\n",
            marker,
            report.name,
            report.driver,
            report.backend.dimmed()
        ));

        if !report.enabled {
            continue;
        }
        if let Some(resources) = &report.resources {
            out.push_str(&format!("        init: {}\n", resources));
        }
        if let Some(error) = &report.error {
            out.push_str(&format!("        {}\n", error.red()));
        }
    }

    out
}

pub fn run_config(path: Option<PathBuf>, json: bool) -> Result<()> {
    let (config, source) = load_config(path.as_deref())?;
    let reports = build_report(&config);

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print!("{}", render_report(&reports, &source));
    }

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        bail!("{} of {} device(s) failed validation", failed, reports.len());
    }

    if !json {
        println!("{}", "All devices valid".green().bold());
    }
    Ok(())
}
