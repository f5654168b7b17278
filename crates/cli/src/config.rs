//! Command-line and environment configuration.
//!
//! Every flag has an environment-variable fallback so the relay can be
//! configured entirely from a container environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use jenkins::JenkinsConfig;
use routing::RelayError;

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

/// Relays source-control push events to build jobs, debouncing bursts.
#[derive(Debug, Clone, Parser)]
#[command(name = "trigger-relay", version, about)]
pub struct CliConfig {
    /// Base URL of the build server.
    #[arg(long, env = "JENKINS_URL")]
    pub jenkins_url: String,

    /// Build server user; without one the token is a remote trigger token.
    #[arg(long, env = "JENKINS_USER")]
    pub jenkins_user: Option<String>,

    /// API token for the user, or the jobs' remote trigger token.
    #[arg(long, env = "JENKINS_TOKEN", hide_env_values = true)]
    pub jenkins_token: String,

    /// Folder or multibranch root all jobs live under.
    #[arg(long, env = "JENKINS_MULTI")]
    pub jenkins_folder: Option<String>,

    /// Accept invalid TLS certificates from the build server.
    #[arg(long, env = "JENKINS_INSECURE")]
    pub jenkins_insecure: bool,

    /// Path to the mapping file. Ignored when --mapping-url is set.
    #[arg(long, env = "MAPPING_FILE", default_value = "mapping.csv")]
    pub mapping_file: PathBuf,

    /// URL of the mapping document; `<url>.sha256` must serve its fingerprint.
    #[arg(long, env = "MAPPING_URL")]
    pub mapping_url: Option<String>,

    /// Accept invalid TLS certificates from the mapping server.
    #[arg(long, env = "MAPPING_INSECURE")]
    pub mapping_insecure: bool,

    /// Seconds between mapping refreshes.
    #[arg(long, env = "MAPPING_REFRESH_INTERVAL", default_value_t = 60)]
    pub refresh_interval: u64,

    /// Seconds to wait for further events before triggering a job.
    #[arg(long, env = "QUIET_PERIOD", default_value_t = 10)]
    pub quiet_period: u64,

    /// Match changed file paths; mapping records then need a fourth field.
    #[arg(long, env = "FILE_MATCHING")]
    pub file_matching: bool,

    /// Repository prefix of component repositories whose name is used as a path prefix.
    #[arg(long, env = "SEMANTIC_REPO")]
    pub semantic_repo: Option<String>,

    /// Address to listen on.
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// OTLP gRPC endpoint for trace export (e.g. `http://localhost:4317`).
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl CliConfig {
    /// Rejects values clap cannot check on its own.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.jenkins_url.trim().is_empty() {
            return Err(configuration("no JENKINS_URL defined"));
        }
        if self.jenkins_token.is_empty() {
            return Err(configuration("no JENKINS_TOKEN defined"));
        }
        if self.refresh_interval == 0 {
            return Err(configuration("refresh interval must be at least one second"));
        }
        if self.mapping_url.is_none() && self.mapping_file.as_os_str().is_empty() {
            return Err(configuration("no mapping file or mapping URL defined"));
        }
        Ok(())
    }

    /// Build server settings.
    pub fn jenkins_config(&self) -> JenkinsConfig {
        JenkinsConfig {
            url: self.jenkins_url.clone(),
            folder: self.jenkins_folder.clone(),
            user: self.jenkins_user.clone(),
            token: self.jenkins_token.clone(),
            accept_invalid_certs: self.jenkins_insecure,
        }
    }

    /// Debounce quiet period.
    pub fn quiet_period(&self) -> Duration {
        Duration::from_secs(self.quiet_period)
    }

    /// Mapping refresh period.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }
}

fn configuration(message: &str) -> RelayError {
    RelayError::Configuration {
        message: message.to_string(),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
