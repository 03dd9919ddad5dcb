//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};
use crate::progress::{is_progress_line, parse_progress_line, DecodeProgress};

/// Stderr lines kept for error reports.
const MAX_STDERR_LINES: usize = 40;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output path or image sequence pattern
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an input argument (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add an output argument (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Emit only frames the filter graph selected.
    pub fn variable_frame_rate(self) -> Self {
        self.output_arg("-fps_mode").output_arg("vfr")
    }

    /// First number used when expanding an image sequence pattern.
    pub fn start_number(self, n: u32) -> Self {
        self.output_arg("-start_number").output_arg(n.to_string())
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with progress reporting.
///
/// There is no timeout: a stalled decode stalls the caller.
#[derive(Debug, Default)]
pub struct FfmpegRunner;

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self
    }

    /// Run an FFmpeg command, forwarding every progress block to `progress_callback`.
    pub async fn run_with_progress<F>(&self, cmd: &FfmpegCommand, progress_callback: F) -> MediaResult<()>
    where
        F: Fn(DecodeProgress) + Send + 'static,
    {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr was not captured"))?;
        let mut reader = BufReader::new(stderr).lines();

        let reader_handle = tokio::spawn(async move {
            let mut current = DecodeProgress::default();
            let mut diagnostics = Vec::new();

            while let Ok(Some(line)) = reader.next_line().await {
                if is_progress_line(&line) {
                    if let Some(progress) = parse_progress_line(&line, &mut current) {
                        progress_callback(progress);
                    }
                } else if !line.trim().is_empty() && diagnostics.len() < MAX_STDERR_LINES {
                    diagnostics.push(line);
                }
            }

            diagnostics
        });

        let status = child.wait().await?;
        let diagnostics = reader_handle.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            let stderr = (!diagnostics.is_empty()).then(|| diagnostics.join("\n"));
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                stderr,
                status.code(),
            ))
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}
