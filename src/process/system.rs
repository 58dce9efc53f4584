// ABOUTME: CommandRunner backed by tokio::process.
// ABOUTME: Runs programs on the local host with piped output and no stdin.

use async_trait::async_trait;
use parking_lot::Mutex;
use snafu::ResultExt;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use super::error::{IoSnafu, ProcessError, SpawnSnafu};
use super::stream::{OutputLine, OutputSink, OutputStream, StreamedOutput, TailBuffer};
use super::{CommandOutput, CommandRunner, CommandSpec};

/// Executes commands as child processes of this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(spec: &CommandSpec) -> Command {
        let mut command = Command::new(spec.program());
        command
            .args(spec.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = spec.cwd() {
            command.current_dir(dir);
        }
        command
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        tracing::debug!(command = %spec, "running");

        let output = Self::command(spec).output().await.context(SpawnSnafu {
            program: spec.program(),
        })?;

        let result = CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(command = %spec, exit_code = result.exit_code, "finished");
        Ok(result)
    }

    async fn run_streaming(
        &self,
        spec: &CommandSpec,
        sink: &dyn OutputSink,
        tail_lines: usize,
    ) -> Result<StreamedOutput, ProcessError> {
        tracing::debug!(command = %spec, "running (streamed)");

        let mut child = Self::command(spec).spawn().context(SpawnSnafu {
            program: spec.program(),
        })?;

        let tail = Mutex::new(TailBuffer::new(tail_lines));

        // Both pipes must be drained together or a chatty stderr can block the child.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        futures::try_join!(
            pump(stdout, OutputStream::Stdout, sink, &tail),
            pump(stderr, OutputStream::Stderr, sink, &tail),
        )
        .context(IoSnafu {
            program: spec.program(),
        })?;

        let status = child.wait().await.context(IoSnafu {
            program: spec.program(),
        })?;

        let exit_code = status.code().unwrap_or(-1);
        tracing::debug!(command = %spec, exit_code, "finished (streamed)");
        Ok(StreamedOutput {
            exit_code,
            tail: tail.into_inner().into_lines(),
        })
    }
}

/// Longest line handed to the sink; longer runs are split.
const MAX_LINE_BYTES: usize = 16 * 1024;

async fn pump<R>(
    reader: Option<R>,
    stream: OutputStream,
    sink: &dyn OutputSink,
    tail: &Mutex<TailBuffer>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(());
    };
    let mut reader = BufReader::new(reader);
    let mut lines = LineSplitter::default();
    let emit = |content: String| {
        let line = OutputLine { stream, content };
        sink.line(&line);
        tail.lock().push(line.content);
    };

    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            if let Some(rest) = lines.finish() {
                emit(rest);
            }
            return Ok(());
        }
        let consumed = chunk.len();
        lines.feed(chunk, &emit);
        reader.consume(consumed);
    }
}

/// Splits a byte stream into lines on `\n` or `\r`.
///
/// Progress bars redraw with bare carriage returns, so each redraw becomes a
/// line. `\r\n` counts as one break.
#[derive(Debug, Default)]
struct LineSplitter {
    buf: Vec<u8>,
    after_cr: bool,
}

impl LineSplitter {
    fn feed(&mut self, bytes: &[u8], emit: &impl Fn(String)) {
        for &byte in bytes {
            match byte {
                b'\n' if self.after_cr => self.after_cr = false,
                b'\n' | b'\r' => {
                    self.after_cr = byte == b'\r';
                    emit(self.take());
                }
                _ => {
                    self.after_cr = false;
                    self.buf.push(byte);
                    if self.buf.len() >= MAX_LINE_BYTES {
                        emit(self.take());
                    }
                }
            }
        }
    }

    fn finish(&mut self) -> Option<String> {
        (!self.buf.is_empty()).then(|| self.take())
    }

    fn take(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.buf).trim_end().to_string();
        self.buf.clear();
        line
    }
}
