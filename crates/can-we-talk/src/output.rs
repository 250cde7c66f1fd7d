//! Console output of a survey

use clap::ValueEnum;
use obd_protocol::{Pid, PidOutcome, Reading, Survey};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per reading
    #[default]
    Text,
    /// JSON document
    Json,
}

/// JSON view of one outcome
#[derive(Debug, Serialize)]
struct OutcomeReport {
    pid: u8,
    name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reading: Option<Reading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&PidOutcome> for OutcomeReport {
    fn from(outcome: &PidOutcome) -> Self {
        let (reading, error) = match &outcome.result {
            Ok(reading) => (Some(*reading), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            pid: outcome.pid.as_hex(),
            name: outcome.pid.description(),
            reading,
            error,
        }
    }
}

#[derive(Debug, Serialize)]
struct SurveyReport {
    readings: Vec<OutcomeReport>,
}

/// Render a survey in the requested format
pub fn render(survey: &Survey, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(survey)),
        OutputFormat::Json => {
            let report = SurveyReport {
                readings: survey.outcomes().iter().map(OutcomeReport::from).collect(),
            };
            serde_json::to_string_pretty(&report)
        }
    }
}

/// Description with the first letter capitalized
fn heading(pid: Pid) -> String {
    let description = pid.description();
    let mut chars = description.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn render_text(survey: &Survey) -> String {
    survey
        .outcomes()
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(reading) => format!("{}: {}", heading(reading.pid()), reading),
            Err(e) => format!("unable to read {} ({})", outcome.pid.description(), e),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
