//! `sensekit check` - parse one init string and show what it describes

use anyhow::Result;
use colored::*;
use serde::Serialize;

use sensekit_core::init_string::{self, Descriptor, ParseResult, UartPort, CLAUSE_DELIMITER};
use sensekit_core::InitStringError;

/// JSON shape of a failed parse
#[derive(Debug, Serialize)]
pub struct CheckFailure {
    pub error: &'static str,
    pub clause: usize,
    pub message: String,
}

impl From<&InitStringError> for CheckFailure {
    fn from(err: &InitStringError) -> Self {
        Self {
            error: err.kind_name(),
            clause: err.clause_index(),
            message: err.to_string(),
        }
    }
}

/// Human-readable parameters of one descriptor
pub fn describe(descriptor: &Descriptor) -> String {
    match descriptor {
        Descriptor::Gpio(d) => format!("pin {} ({})", d.pin, d.direction.as_str()),
        Descriptor::I2c(d) => format!("bus {}, address 0x{:02X}", d.bus, d.address),
        Descriptor::Spi(d) => format!("bus {}, chip select {}", d.bus, d.chip_select),
        Descriptor::Uart(d) => match &d.port {
            UartPort::Index(i) => format!("port {}, {} baud", i, d.baud),
            UartPort::Path(p) => format!("device {}, {} baud", p, d.baud),
        },
        Descriptor::Adc(d) => format!("channel {}", d.pin),
        Descriptor::Pwm(d) => match d.duty {
            Some(duty) => format!("pin {}, duty {:.2}", d.pin, duty),
            None => format!("pin {}", d.pin),
        },
    }
}

/// One line per descriptor, in clause order
pub fn render_descriptors(result: &ParseResult) -> String {
    if result.is_empty() {
        return format!("  {}", "(no resources)".dimmed());
    }

    result
        .iter()
        .enumerate()
        .map(|(i, d)| format!("  {:>2}  {:<5} {}", i, d.kind().tag().cyan(), describe(d)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Where in `init` the error occurred, used as context for the error itself
pub fn error_location(init: &str, err: &InitStringError) -> String {
    let clause = err.clause_index();
    let text = init.split(CLAUSE_DELIMITER).nth(clause).unwrap_or("").trim();
    format!("{} at clause {} '{}'", err.kind_name(), clause, text)
}

/// JSON document for either outcome
pub fn render_json(result: &Result<ParseResult, InitStringError>) -> Result<String> {
    let json = match result {
        Ok(parsed) => serde_json::to_string_pretty(parsed)?,
        Err(err) => serde_json::to_string_pretty(&CheckFailure::from(err))?,
    };
    Ok(json)
}

/// Parse `init`, print the outcome, and fail if it does not parse
///
/// Failures are not printed here; the returned error carries the clause
/// location for the caller to report.
pub fn run_check(init: &str, json: bool) -> Result<()> {
    tracing::debug!(init, "checking init string");
    let result = init_string::parse(init);

    if json {
        println!("{}", render_json(&result)?);
        return result.map(|_| ()).map_err(anyhow::Error::from);
    }

    match result {
        Ok(parsed) => {
            println!(
                "{} {} resource(s)",
                "Valid init string:".green().bold(),
                parsed.len()
            );
            println!("{}", render_descriptors(&parsed));
            Ok(())
        }
        Err(err) => {
            let location = error_location(init, &err);
            Err(anyhow::Error::from(err).context(location))
        }
    }
}
