//! Environment configuration for the CLI.

use anyhow::{anyhow, Context, Result};
use bundler_common::Address;
use clap::ValueEnum;

pub const LOG_ENV: &str = "BUNDLER_LOG";
pub const CONTRACT_ADDRESS_ENV: &str = "BUNDLER_CONTRACT_ADDRESS";
pub const OUTPUT_ENV: &str = "BUNDLER_OUTPUT";

pub const DEFAULT_LOG_FILTER: &str = "bundler_tools=info,bundler_contract=info,bundler_sandbox=info";
const DEFAULT_CONTRACT_ADDRESS: u64 = 0xb0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single-line JSON.
    Json,
    /// Indented JSON.
    #[default]
    Pretty,
}

impl OutputFormat {
    fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "pretty" => Ok(OutputFormat::Pretty),
            other => Err(anyhow!(
                "invalid {OUTPUT_ENV} '{other}', expected 'json' or 'pretty'"
            )),
        }
    }

    pub fn render<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        let rendered = match self {
            OutputFormat::Json => serde_json::to_string(value),
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
        };
        rendered.context("failed to serialize output")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolsConfig {
    pub log_filter: String,
    /// Deployment address used when a command does not name one.
    pub contract_address: Address,
    pub output: OutputFormat,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            contract_address: Address::from_low_u64(DEFAULT_CONTRACT_ADDRESS),
            output: OutputFormat::default(),
        }
    }
}

impl ToolsConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(filter) = lookup(LOG_ENV) {
            config.log_filter = filter;
        }
        if let Some(raw) = lookup(CONTRACT_ADDRESS_ENV) {
            config.contract_address = raw
                .parse()
                .with_context(|| format!("invalid {CONTRACT_ADDRESS_ENV} '{raw}'"))?;
        }
        if let Some(raw) = lookup(OUTPUT_ENV) {
            config.output = OutputFormat::parse(&raw)?;
        }

        Ok(config)
    }

    /// Command-line flags win over the environment.
    pub fn with_overrides(mut self, log_filter: Option<String>, output: Option<OutputFormat>) -> Self {
        if let Some(filter) = log_filter {
            self.log_filter = filter;
        }
        if let Some(output) = output {
            self.output = output;
        }
        self
    }
}
