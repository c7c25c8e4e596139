//! Logging setup.
//!
//! A preset picked from the CLI flags sets a level per `matchlog::` target;
//! `--log target=level` adjusts single targets on top of it. `RUST_LOG`
//! replaces the whole filter when set.

use clap::ValueEnum;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const TARGET_PREFIX: &str = "matchlog::";

/// Targets the crates log under, without the prefix.
const TARGETS: [&str; 7] = ["startup", "ingest", "lifecycle", "store", "roster", "lookup", "api"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Match starts and ends, files written, problems
    #[default]
    Production,
    /// Adds each request and snapshot summary
    Verbose,
    Debug,
    Trace,
    /// Warnings and errors only
    Quiet,
}

impl LogPreset {
    /// Level for one of our targets under this preset.
    fn level_for(self, target: &str) -> Level {
        match self {
            LogPreset::Production => match target {
                "lookup" => Level::WARN,
                _ => Level::INFO,
            },
            LogPreset::Verbose => Level::INFO,
            LogPreset::Debug => Level::DEBUG,
            LogPreset::Trace => Level::TRACE,
            LogPreset::Quiet => Level::WARN,
        }
    }

    /// Level for request spans from `tower_http`.
    fn http_level(self) -> Level {
        match self {
            LogPreset::Production => Level::WARN,
            LogPreset::Verbose => Level::INFO,
            LogPreset::Debug => Level::DEBUG,
            LogPreset::Trace => Level::TRACE,
            LogPreset::Quiet => Level::ERROR,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Applied in order after the preset; a later entry for the same
    /// target wins.
    pub overrides: Vec<(String, Level)>,
    pub format: LogFormat,
}

impl LogConfig {
    pub fn from_cli(
        verbose: bool,
        debug: bool,
        trace: bool,
        quiet: bool,
        log_overrides: Vec<String>,
        format: LogFormat,
    ) -> Self {
        let preset = match (quiet, trace, debug, verbose) {
            (true, ..) => LogPreset::Quiet,
            (_, true, ..) => LogPreset::Trace,
            (_, _, true, _) => LogPreset::Debug,
            (.., true) => LogPreset::Verbose,
            _ => LogPreset::Production,
        };

        let overrides = log_overrides
            .iter()
            .flat_map(|arg| arg.split(','))
            .filter_map(parse_override)
            .collect();

        Self {
            preset,
            overrides,
            format,
        }
    }

    /// Filter directives for the preset followed by the overrides.
    pub fn directives(&self) -> Vec<String> {
        let mut directives: Vec<String> = TARGETS
            .iter()
            .map(|target| format!("{}{}={}", TARGET_PREFIX, target, self.preset.level_for(target)))
            .collect();
        directives.push(format!("tower_http={}", self.preset.http_level()));
        directives.extend(
            self.overrides
                .iter()
                .map(|(target, level)| format!("{}={}", target, level)),
        );
        directives
    }

    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }
        EnvFilter::try_new(self.directives().join(",")).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Parse one `target=level` pair. Bare targets get the `matchlog::` prefix;
/// `tower_http` and already-prefixed targets are kept as given.
fn parse_override(part: &str) -> Option<(String, Level)> {
    let (target, level) = part.split_once('=')?;
    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    let level = Level::from_str(level.trim()).ok()?;

    let target = if target.starts_with(TARGET_PREFIX) || target == "tower_http" {
        target.to_string()
    } else {
        format!("{}{}", TARGET_PREFIX, target)
    };
    Some((target, level))
}

pub fn init(config: &LogConfig) {
    let filter = config.build_filter();
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init(),
    }
}
