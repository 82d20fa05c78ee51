//! Output formats for analysis results.
//!
//! The report is produced as markdown. These formatters turn an
//! [`AnalysisOutput`] into markdown, plain text for terminals and logs, or
//! JSON for programmatic consumers.
//!
//! # Examples
//!
//! ```rust,no_run
//! use term_explore::formatters::{JsonFormatter, PlainTextFormatter, ReportFormatter};
//! # use term_explore::report::AnalysisOutput;
//! # let output = AnalysisOutput::default();
//!
//! let text = PlainTextFormatter::new().format(&output).unwrap();
//! let json = JsonFormatter::new().with_pretty(false).format(&output).unwrap();
//! println!("{text}\n{json}");
//! ```

use std::fmt::Write;

use chrono::Local;
use serde::Serialize;

use crate::error::{ExploreError, Result};
use crate::report::{AnalysisOutput, ResultBundle};

/// Timestamp layout used in generated documents.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Options shared by the formatters.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include the result bundle (JSON only)
    pub include_bundle: bool,
    /// Add a generation timestamp
    pub include_timestamp: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_bundle: true,
            include_timestamp: false,
        }
    }
}

impl FormatterConfig {
    /// Narrative only.
    pub fn minimal() -> Self {
        Self {
            include_bundle: false,
            include_timestamp: false,
        }
    }

    /// Everything, stamped with the generation time.
    pub fn detailed() -> Self {
        Self {
            include_bundle: true,
            include_timestamp: true,
        }
    }

    pub fn with_bundle(mut self, include: bool) -> Self {
        self.include_bundle = include;
        self
    }

    pub fn with_timestamp(mut self, include: bool) -> Self {
        self.include_timestamp = include;
        self
    }
}

/// Formats analysis results into a string representation.
///
/// # Examples
///
/// ```rust
/// use term_explore::formatters::ReportFormatter;
/// use term_explore::report::AnalysisOutput;
///
/// struct SectionCount;
///
/// impl ReportFormatter for SectionCount {
///     fn format(&self, output: &AnalysisOutput) -> term_explore::Result<String> {
///         Ok(format!("{} sections", output.report.sections().len()))
///     }
/// }
///
/// assert_eq!(SectionCount.format(&AnalysisOutput::default()).unwrap(), "0 sections");
/// ```
pub trait ReportFormatter {
    fn format(&self, output: &AnalysisOutput) -> Result<String>;

    /// Formats with explicit options. The default ignores them.
    fn format_with_config(&self, output: &AnalysisOutput, _config: &FormatterConfig) -> Result<String> {
        self.format(output)
    }
}

/// The markdown report as produced by the engine.
#[derive(Debug, Clone, Default)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, output: &AnalysisOutput) -> Result<String> {
        self.format_with_config(output, &self.config)
    }

    fn format_with_config(&self, output: &AnalysisOutput, config: &FormatterConfig) -> Result<String> {
        let mut text = output.report.text();
        if config.include_timestamp {
            write!(text, "\n\n_Relatório gerado em: {}_", timestamp())
                .map_err(|e| ExploreError::Serialization(e.to_string()))?;
        }
        Ok(text)
    }
}

/// The report with markdown markers removed.
#[derive(Debug, Clone, Default)]
pub struct PlainTextFormatter {
    config: FormatterConfig,
}

impl PlainTextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }
}

impl ReportFormatter for PlainTextFormatter {
    fn format(&self, output: &AnalysisOutput) -> Result<String> {
        self.format_with_config(output, &self.config)
    }

    fn format_with_config(&self, output: &AnalysisOutput, config: &FormatterConfig) -> Result<String> {
        let mut text = strip_markdown(&output.report.text());
        if config.include_timestamp {
            write!(text, "\n\nRelatório gerado em: {}", timestamp())
                .map_err(|e| ExploreError::Serialization(e.to_string()))?;
        }
        Ok(text)
    }
}

/// Sections and bundle as JSON.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonSection<'a> {
    number: usize,
    title: &'static str,
    lines: &'a [String],
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    generated_at: Option<String>,
    sections: Vec<JsonSection<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bundle: Option<&'a ResultBundle>,
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, output: &AnalysisOutput) -> Result<String> {
        self.format_with_config(output, &self.config)
    }

    fn format_with_config(&self, output: &AnalysisOutput, config: &FormatterConfig) -> Result<String> {
        let document = JsonDocument {
            generated_at: config.include_timestamp.then(timestamp),
            sections: output
                .report
                .sections()
                .iter()
                .map(|s| JsonSection {
                    number: s.kind.number(),
                    title: s.kind.title(),
                    lines: &s.lines,
                })
                .collect(),
            bundle: config.include_bundle.then_some(&output.bundle),
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        json.map_err(|e| ExploreError::Serialization(format!("Failed to serialize report to JSON: {e}")))
    }
}

/// Removes the markdown markers the report uses.
///
/// Heading hashes, bold asterisks, italic underscores around a whole line
/// and inline code backticks are dropped; list dashes and indentation stay.
pub fn strip_markdown(text: &str) -> String {
    text.lines()
        .map(|line| {
            let line = match line.trim_start().strip_prefix('#') {
                Some(_) => line.trim_start().trim_start_matches('#').trim_start(),
                None => line,
            };
            let line = line
                .strip_prefix('_')
                .and_then(|l| l.strip_suffix('_'))
                .unwrap_or(line);
            line.replace("**", "").replace('`', "")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}
