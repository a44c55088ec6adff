//! testgauge: push test run outcomes to a Prometheus Pushgateway.
//!
//! - Wraps a test command (or reads stdin) and passes its output through
//! - Decodes libtest or outcome JSON lines into per-test outcomes
//! - With `--metrics`, pushes one snapshot at the end of the run
//! - The exit code is the test run's; a failed push never changes it

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use testgauge_pusher::adapters::EventFormat;
use testgauge_pusher::runner::{self, EventSource, RunOptions};
use testgauge_pusher::transport::HttpPushTransport;
use testgauge_pusher::LabelHooks;

#[derive(Debug, Parser)]
#[command(name = "testgauge", version, about)]
struct Cli {
    /// Send metrics over Prometheus PushGateway.
    #[arg(long)]
    metrics: bool,

    /// YAML settings file; PROMETHEUS_PUSHGATEWAY_* variables override it.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Format of the test event stream.
    #[arg(long, default_value_t = EventFormat::Libtest)]
    format: EventFormat,

    /// Test command to run. Without one, events are read from stdin.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    command: Vec<String>,
}

impl Cli {
    fn into_options(self) -> RunOptions {
        let source = if self.command.is_empty() {
            EventSource::Stdin
        } else {
            EventSource::Command(self.command)
        };
        RunOptions {
            metrics: self.metrics,
            config_file: self.config,
            format: self.format,
            source,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Cli::parse().into_options();
    let code = runner::run(
        opts,
        |name| std::env::var(name).ok(),
        |cfg| HttpPushTransport::new(cfg.timeout),
        LabelHooks::new(),
    )
    .await;
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
