//! Rendering of command results.
//!
//! Every command ends in exactly one [`Outcome`]: `success`, `not_found` or
//! `error`. The outcome is rendered as JSON, YAML or a two-column table, and
//! decides the process exit code.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use tabled::{Style, Table, Tabled};
use tracing::warn;

use crate::client::ApiResponse;
use crate::error::{Error, Result};

/// Output encoding selected with `--format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

/// The result of one command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success {
        request: String,
        status: u16,
        body: Value,
    },
    NotFound {
        request: String,
        status: u16,
    },
    Error {
        request: String,
        kind: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        message: String,
    },
}

impl Outcome {
    /// Classify the result of a client call.
    pub fn from_result<T: Serialize>(request: &str, result: Result<ApiResponse<T>>) -> Self {
        let response = match result {
            Ok(response) => response,
            Err(err) => return Self::error(request, &err),
        };

        if response.is_not_found() {
            return Self::NotFound {
                request: request.to_string(),
                status: response.status(),
            };
        }

        let status = response.status();
        match response.into_body().map(serde_json::to_value).transpose() {
            Ok(body) => Self::Success {
                request: request.to_string(),
                status,
                body: body.unwrap_or(Value::Null),
            },
            Err(err) => Self::error(request, &Error::from(err)),
        }
    }

    /// An error outcome.
    pub fn error(request: &str, err: &Error) -> Self {
        warn!(request, error = %err, "Command failed");
        Self::Error {
            request: request.to_string(),
            kind: err.kind().as_str(),
            status: err.status(),
            message: err.to_string(),
        }
    }

    /// 0 for success and not found, 1 for errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Success { .. } | Self::NotFound { .. } => 0,
            Self::Error { .. } => 1,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::NotFound { .. } => "not_found",
            Self::Error { .. } => "error",
        }
    }
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "FIELD")]
    field: String,
    #[tabled(rename = "VALUE")]
    value: String,
}

impl Row {
    fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Write `outcome` to `out` in the requested format.
pub fn render(out: &mut impl Write, format: OutputFormat, outcome: &Outcome) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(outcome).map_err(io::Error::other)?;
            writeln!(out, "{}", text)
        },
        OutputFormat::Yaml => {
            let text = serde_yaml::to_string(outcome).map_err(io::Error::other)?;
            write!(out, "{}", text)
        },
        OutputFormat::Table => {
            let mut table = Table::new(table_rows(outcome));
            table.with(Style::blank());
            writeln!(out, "{}", table)
        },
    }
}

fn table_rows(outcome: &Outcome) -> Vec<Row> {
    let mut rows = vec![Row::new("outcome", outcome.name())];
    match outcome {
        Outcome::Success {
            request,
            status,
            body,
        } => {
            rows.push(Row::new("request", request.as_str()));
            rows.push(Row::new("status", status.to_string()));
            match body {
                Value::Object(fields) => {
                    rows.extend(fields.iter().map(|(k, v)| Row::new(k.as_str(), cell(v))));
                },
                Value::Array(items) => {
                    rows.extend(
                        items
                            .iter()
                            .enumerate()
                            .map(|(i, v)| Row::new(format!("[{}]", i), cell(v))),
                    );
                },
                Value::Null => {},
                other => rows.push(Row::new("body", cell(other))),
            }
        },
        Outcome::NotFound { request, status } => {
            rows.push(Row::new("request", request.as_str()));
            rows.push(Row::new("status", status.to_string()));
        },
        Outcome::Error {
            request,
            kind,
            status,
            message,
        } => {
            rows.push(Row::new("request", request.as_str()));
            rows.push(Row::new("kind", *kind));
            if let Some(status) = status {
                rows.push(Row::new("status", status.to_string()));
            }
            rows.push(Row::new("message", message.as_str()));
        },
    }
    rows
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
