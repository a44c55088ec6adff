//! Host-runner side: read a test run's event stream, pass every line
//! through, and feed decoded outcomes to the collector.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Command;

use testgauge_core::error::{Result, TestGaugeError};
use testgauge_core::summary::OutcomeCounts;

use crate::adapters::EventFormat;
use crate::collector::SessionMetricsCollector;
use crate::config::{self, PushConfig};
use crate::hooks::LabelHooks;
use crate::transport::PushTransport;

/// Exit codes of the `testgauge` binary.
///
/// When a command is wrapped its own exit code is passed through unchanged;
/// these only apply when testgauge decides the code itself.
pub enum ExitCodes {}

impl ExitCodes {
    /// All observed tests passed (or none ran).
    pub const OK: i32 = 0;

    /// At least one test failed or errored, or the wrapped command was
    /// killed by a signal.
    pub const TESTS_FAILED: i32 = 1;

    /// Configuration was invalid or the session could not be started.
    pub const INTERNAL_ERROR: i32 = 3;
}

/// Where events come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    Stdin,
    /// Program and arguments; its stdout is the event stream.
    Command(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub exit_code: i32,
    pub counts: OutcomeCounts,
}

/// Copy `reader` to `echo` line by line, decoding events on the way.
///
/// Returns the counts of routed outcomes, independent of whether a collector
/// is attached. Output that is not valid UTF-8 is echoed as is. A failing
/// `echo` (closed pipe) only stops echoing; decoding carries on.
pub async fn pump_events<R, W>(
    mut reader: R,
    echo: &mut W,
    format: EventFormat,
    mut collector: Option<&mut SessionMetricsCollector>,
) -> Result<OutcomeCounts>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut counts = OutcomeCounts::default();
    let mut buf = Vec::new();
    let mut echoing = true;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        if echoing {
            if let Err(e) = echo.write_all(&buf).await {
                tracing::warn!(error = %e, "output closed; no longer echoing test output");
                echoing = false;
            }
        }

        let line = String::from_utf8_lossy(&buf);
        let Some(rec) = format.decode(&line) else {
            continue;
        };
        if let (Some(bucket), Some(_)) = (rec.bucket(), rec.test_identifier()) {
            counts.add(bucket);
        }
        if let Some(c) = collector.as_deref_mut() {
            c.record(&rec);
        }
    }

    if echoing {
        if let Err(e) = echo.flush().await {
            tracing::warn!(error = %e, "flushing test output failed");
        }
    }
    Ok(counts)
}

/// Run one session from `source`.
pub async fn run_session(
    source: &EventSource,
    format: EventFormat,
    collector: Option<&mut SessionMetricsCollector>,
) -> Result<SessionReport> {
    let mut stdout = tokio::io::stdout();

    match source {
        EventSource::Stdin => {
            let stdin = BufReader::new(tokio::io::stdin());
            let counts = pump_events(stdin, &mut stdout, format, collector).await?;
            Ok(SessionReport {
                exit_code: exit_code_for(&counts),
                counts,
            })
        }
        EventSource::Command(argv) => {
            let (program, args) = argv
                .split_first()
                .ok_or_else(|| TestGaugeError::Config("empty test command".into()))?;

            let mut child = Command::new(program)
                .args(args)
                .stdin(Stdio::inherit())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| TestGaugeError::Internal(format!("failed to start {program}: {e}")))?;
            tracing::debug!(%program, pid = ?child.id(), "test command started");

            let child_out = child
                .stdout
                .take()
                .ok_or_else(|| TestGaugeError::Internal("child stdout not captured".into()))?;

            let counts =
                match pump_events(BufReader::new(child_out), &mut stdout, format, collector).await {
                    Ok(counts) => counts,
                    Err(e) => {
                        if let Err(kill_err) = child.kill().await {
                            tracing::warn!(%program, error = %kill_err, "failed to stop test command");
                        }
                        return Err(e);
                    }
                };
            let status = child.wait().await?;
            let exit_code = status.code().unwrap_or(ExitCodes::TESTS_FAILED);
            tracing::debug!(%program, exit_code, "test command finished");

            Ok(SessionReport { exit_code, counts })
        }
    }
}

/// Exit code when no wrapped command supplies one.
pub fn exit_code_for(counts: &OutcomeCounts) -> i32 {
    if counts.failed > 0 || counts.errored > 0 {
        ExitCodes::TESTS_FAILED
    } else {
        ExitCodes::OK
    }
}

/// One `testgauge` invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Push metrics at the end of the run.
    pub metrics: bool,
    pub config_file: Option<PathBuf>,
    pub format: EventFormat,
    pub source: EventSource,
}

struct Reporter<T> {
    collector: SessionMetricsCollector,
    transport: T,
}

fn build_reporter<L, T, M>(
    opts: &RunOptions,
    lookup: L,
    make_transport: M,
    hooks: LabelHooks,
) -> Result<Reporter<T>>
where
    L: Fn(&str) -> Option<String>,
    M: FnOnce(&PushConfig) -> Result<T>,
{
    let cfg = config::load_with(opts.config_file.as_deref(), lookup)?;
    let transport = make_transport(&cfg)?;
    let collector = SessionMetricsCollector::new(&cfg, hooks);
    tracing::info!(gateway = %cfg.gateway_url, job = %cfg.job, "metrics enabled");
    Ok(Reporter {
        collector,
        transport,
    })
}

/// Run a session and, with metrics on, push its snapshot. Returns the
/// process exit code.
///
/// Settings are read through `lookup` and validated before the session
/// starts; a rejected config returns [`ExitCodes::INTERNAL_ERROR`] without
/// running anything. Otherwise the exit code is the session's, whether or
/// not the push went through.
pub async fn run<L, T, M>(opts: RunOptions, lookup: L, make_transport: M, hooks: LabelHooks) -> i32
where
    L: Fn(&str) -> Option<String>,
    T: PushTransport,
    M: FnOnce(&PushConfig) -> Result<T>,
{
    let mut reporter = if opts.metrics {
        match build_reporter(&opts, lookup, make_transport, hooks) {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::error!(code = e.code().as_str(), error = %e, "metrics configuration rejected");
                eprintln!("INTERNAL ERROR: {e}");
                return ExitCodes::INTERNAL_ERROR;
            }
        }
    } else {
        None
    };

    let collector = reporter.as_mut().map(|r| &mut r.collector);
    let report = match run_session(&opts.source, opts.format, collector).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "test session failed");
            eprintln!("INTERNAL ERROR: {e}");
            return ExitCodes::INTERNAL_ERROR;
        }
    };
    tracing::debug!(exit_code = report.exit_code, detail = %report.counts.detail(), "session finished");

    if let Some(Reporter {
        collector,
        transport,
    }) = reporter
    {
        let gateway_url = collector.gateway_url().to_string();
        let outcome = collector.finalize(report.exit_code, &transport).await;
        println!("{}", outcome.status_line(&gateway_url));
    }

    report.exit_code
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl AsyncWrite for ClosedPipe {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
            _: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn closed_output_keeps_counting() {
        let input: &[u8] = b"{\"type\":\"test\",\"name\":\"a\",\"event\":\"ok\"}\n\
{\"type\":\"test\",\"name\":\"b\",\"event\":\"failed\"}\n";
        let counts = pump_events(input, &mut ClosedPipe, EventFormat::Libtest, None)
            .await
            .unwrap();
        assert_eq!(counts.passed, 1);
        assert_eq!(counts.failed, 1);
    }

    #[test]
    fn exit_code_from_counts() {
        assert_eq!(exit_code_for(&OutcomeCounts::default()), ExitCodes::OK);
        let skipped = OutcomeCounts {
            passed: 2,
            skipped: 1,
            ..Default::default()
        };
        assert_eq!(exit_code_for(&skipped), ExitCodes::OK);
        let errored = OutcomeCounts {
            errored: 1,
            ..Default::default()
        };
        assert_eq!(exit_code_for(&errored), ExitCodes::TESTS_FAILED);
    }
}
