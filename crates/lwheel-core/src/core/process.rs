use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{anyhow, Context, Result};

const DEFAULT_MAX_CAPTURE_BYTES: usize = 1024 * 1024;

fn max_capture_bytes() -> usize {
    std::env::var("LWHEEL_MAX_CAPTURE_BYTES")
        .ok()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_CAPTURE_BYTES)
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    /// Both streams joined into one block, the way a terminal would have shown
    /// them. Used for diagnostics and marker scans.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut text = self.stdout.trim_end().to_string();
        let err = self.stderr.trim_end();
        if !err.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(err);
        }
        text
    }
}

/// Runs a program with stdout and stderr captured and stdin closed.
///
/// Both streams are drained on their own threads so a child filling one pipe
/// while the parent waits on the other cannot deadlock.
///
/// # Errors
///
/// Returns an error when the program cannot be spawned or a stream cannot be
/// read to the end.
pub fn run_command(
    program: &str,
    args: &[String],
    envs: &[(String, String)],
    cwd: &Path,
) -> Result<RunOutput> {
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in envs {
        command.env(key, value);
    }

    let mut child = command
        .spawn()
        .with_context(|| format!("failed to start {program}"))?;
    let limit = max_capture_bytes();
    let stdout = child.stdout.take().context("child stdout was not piped")?;
    let stderr = child.stderr.take().context("child stderr was not piped")?;
    let stdout_reader = thread::spawn(move || drain_stream(stdout, limit));
    let stderr_reader = thread::spawn(move || drain_stream(stderr, limit));

    let status = child
        .wait()
        .with_context(|| format!("failed to wait for {program}"))?;
    let stdout = join_capture(stdout_reader, "stdout", program)?;
    let stderr = join_capture(stderr_reader, "stderr", program)?;
    Ok(RunOutput {
        code: status.code().unwrap_or(-1),
        stdout,
        stderr,
    })
}

fn join_capture(
    handle: thread::JoinHandle<io::Result<String>>,
    stream: &str,
    program: &str,
) -> Result<String> {
    handle
        .join()
        .map_err(|_| anyhow!("{stream} reader for {program} panicked"))?
        .with_context(|| format!("failed to read {stream} of {program}"))
}

fn drain_stream(mut reader: impl Read, limit: usize) -> io::Result<String> {
    let mut capture = CaptureBuffer::new(limit);
    let mut chunk = [0u8; 8192];
    loop {
        let read = reader.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        capture.push(&chunk[..read]);
    }
    Ok(capture.into_text())
}

/// Bounded capture that keeps the newest bytes. pip puts the useful part of a
/// failure at the end of its output, so the tail is the half worth keeping.
struct CaptureBuffer {
    bytes: Vec<u8>,
    limit: usize,
    truncated: bool,
}

impl CaptureBuffer {
    fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
            truncated: false,
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        if self.limit == 0 {
            return;
        }
        if self.bytes.len().saturating_add(chunk.len()) <= self.limit {
            self.bytes.extend_from_slice(chunk);
            return;
        }
        self.truncated = true;
        if chunk.len() >= self.limit {
            self.bytes.clear();
            self.bytes.extend_from_slice(&chunk[chunk.len() - self.limit..]);
            return;
        }
        let keep_old = self.limit - chunk.len();
        if self.bytes.len() > keep_old {
            self.bytes.drain(..self.bytes.len() - keep_old);
        }
        self.bytes.extend_from_slice(chunk);
    }

    fn into_text(self) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.truncated {
            text.push_str("\n[...truncated...]\n");
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[cfg(unix)]
    #[test]
    fn run_command_captures_output_and_status_unix() -> Result<()> {
        let output = run_command(
            "/bin/sh",
            &[
                "-c".to_string(),
                "printf out && printf err >&2; exit 7".to_string(),
            ],
            &[],
            Path::new("."),
        )?;
        assert_eq!(output.code, 7);
        assert_eq!(output.stdout, "out");
        assert_eq!(output.stderr, "err");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn run_command_passes_extra_environment_unix() -> Result<()> {
        let output = run_command(
            "/bin/sh",
            &[
                "-c".to_string(),
                r#"printf "%s" "$LWHEEL_TEST_MARKER""#.to_string(),
            ],
            &[("LWHEEL_TEST_MARKER".into(), "liblammps.so".into())],
            Path::new("."),
        )?;
        assert_eq!(output.stdout, "liblammps.so");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn run_command_truncates_large_output_unix() -> Result<()> {
        let bytes = DEFAULT_MAX_CAPTURE_BYTES + 1024;
        let output = run_command(
            "/bin/sh",
            &[
                "-c".to_string(),
                format!("head -c {bytes} /dev/zero | tr '\\0' a"),
            ],
            &[],
            Path::new("."),
        )?;
        assert!(
            output.stdout.contains("[...truncated...]"),
            "stdout should include truncation marker"
        );
        assert!(
            output.stdout.len() <= DEFAULT_MAX_CAPTURE_BYTES + 64,
            "stdout should be bounded"
        );
        Ok(())
    }

    #[cfg(windows)]
    #[test]
    fn run_command_captures_output_and_status_windows() -> Result<()> {
        let output = run_command(
            "cmd",
            &[
                "/C".to_string(),
                "@echo off & echo out & echo err 1>&2 & exit /B 7".to_string(),
            ],
            &[],
            Path::new("."),
        )?;
        assert_eq!(output.code, 7);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        Ok(())
    }

    #[test]
    fn capture_keeps_the_tail_when_over_limit() {
        let mut capture = CaptureBuffer::new(8);
        capture.push(b"abcdefgh");
        capture.push(b"XYZ");
        assert_eq!(capture.into_text(), "defghXYZ\n[...truncated...]\n");

        let mut capture = CaptureBuffer::new(4);
        capture.push(b"0123456789");
        assert_eq!(capture.into_text(), "6789\n[...truncated...]\n");
    }

    #[test]
    fn combined_joins_streams_in_terminal_order() {
        let output = RunOutput {
            code: 1,
            stdout: "collecting lammps\n".to_string(),
            stderr: "ERROR: boom\n".to_string(),
        };
        assert_eq!(output.combined(), "collecting lammps\nERROR: boom");

        let quiet = RunOutput {
            code: 0,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(quiet.combined(), "");
    }
}
