//! External document-to-HTML conversion
//!
//! The converter is an external program (LibreOffice by default) driven
//! through an argument template.

use crate::errors::IngestionError;
use apit_common::config::ConverterConfig;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Longest stderr excerpt kept in a conversion error
const STDERR_LIMIT: usize = 4096;

/// Converts a stored document into an HTML file
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Convert `input` into HTML written at `output`
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), IngestionError>;

    /// Converter name for logs
    fn name(&self) -> &str;
}

/// Runs an external program once per document
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Substitute `{input}`, `{output}` and `{outdir}` in the argument template
    fn render_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.display().to_string();
        let output_str = output.display().to_string();
        let outdir = output
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ".".to_string());

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{output}", &output_str)
                    .replace("{outdir}", &outdir)
            })
            .collect()
    }
}

#[async_trait]
impl DocumentConverter for CommandConverter {
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), IngestionError> {
        let args = self.render_args(input, output);
        debug!(program = %self.program, ?args, "Running document converter");

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let result = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| IngestionError::TimedOut {
                timeout_ms: self.timeout.as_millis() as u64,
            })?
            .map_err(|source| IngestionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            let mut stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            if stderr.len() > STDERR_LIMIT {
                let mut cut = STDERR_LIMIT;
                while !stderr.is_char_boundary(cut) {
                    cut -= 1;
                }
                stderr.truncate(cut);
            }
            return Err(IngestionError::ConversionFailed {
                status: result.status.to_string(),
                stderr,
            });
        }

        if !tokio::fs::try_exists(output).await? {
            return Err(IngestionError::MissingOutput {
                path: output.display().to_string(),
            });
        }

        Ok(())
    }

    fn name(&self) -> &str {
        &self.program
    }
}
