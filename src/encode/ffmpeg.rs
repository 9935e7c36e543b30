//! Frame encoding via the system `ffmpeg`.
//!
//! The encoder spawns `ffmpeg`, streams raw RGBA8 frames to its stdin and
//! waits for the container to be finalized. MP4 uses libx264 + yuv420p for
//! broad compatibility; GIF is written in a single pass with infinite loop.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::{
    foundation::{
        core::{Canvas, Fps},
        error::{AsmvizError, AsmvizResult},
    },
    render::{backend::FrameRgba, presets::OutputFormat},
};

/// Parameters for one encoding run.
#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub out_path: PathBuf,
    pub canvas: Canvas,
    pub fps: Fps,
    pub format: OutputFormat,
}

impl EncodeConfig {
    /// Validate dimensions against the target container.
    pub fn validate(&self) -> AsmvizResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(AsmvizError::engine("encode width/height must be non-zero"));
        }
        if self.format == OutputFormat::Video
            && (!self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2))
        {
            return Err(AsmvizError::engine(
                "mp4 output requires even width/height (yuv420p)",
            ));
        }
        Ok(())
    }
}

/// The argument vector passed to `ffmpeg`, split out so the command shape is
/// testable without spawning a process.
pub fn ffmpeg_args(cfg: &EncodeConfig) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgba".into(),
        "-s".into(),
        format!("{}x{}", cfg.canvas.width, cfg.canvas.height),
        "-r".into(),
        format!("{}/{}", cfg.fps.num, cfg.fps.den),
        "-i".into(),
        "pipe:0".into(),
    ];
    match cfg.format {
        OutputFormat::Video => {
            args.extend(
                [
                    "-an",
                    "-c:v",
                    "libx264",
                    "-pix_fmt",
                    "yuv420p",
                    "-movflags",
                    "+faststart",
                ]
                .map(String::from),
            );
        }
        OutputFormat::Gif => {
            args.extend(["-loop", "0"].map(String::from));
        }
    }
    args.push(cfg.out_path.display().to_string());
    args
}

/// Streaming encoder wrapping a spawned `ffmpeg` child process.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl FfmpegEncoder {
    /// Spawn `ffmpeg` for the given run.
    pub fn new(cfg: EncodeConfig) -> AsmvizResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;
        if !is_ffmpeg_on_path() {
            return Err(AsmvizError::engine(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.args(ffmpeg_args(&cfg))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            AsmvizError::engine(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AsmvizError::engine("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| AsmvizError::engine("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        Ok(Self {
            cfg,
            child: Some(child),
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
        })
    }

    /// Stream one frame's RGBA bytes.
    pub fn encode_frame(&mut self, frame: &FrameRgba) -> AsmvizResult<()> {
        if frame.width != self.cfg.canvas.width || frame.height != self.cfg.canvas.height {
            return Err(AsmvizError::engine(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.canvas.width, self.cfg.canvas.height
            )));
        }
        let expected = (frame.width as usize) * (frame.height as usize) * 4;
        if frame.data.len() != expected {
            return Err(AsmvizError::engine(
                "frame data size mismatch with width*height*4",
            ));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(AsmvizError::engine("ffmpeg encoder is already finalized"));
        };
        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            AsmvizError::engine(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    /// Close stdin, wait for `ffmpeg` and surface its stderr on failure. A
    /// failed exit removes the partial output file.
    pub fn finish(mut self) -> AsmvizResult<PathBuf> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| AsmvizError::engine("ffmpeg encoder not started"))?;

        let status = child
            .wait()
            .map_err(|e| AsmvizError::engine(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| AsmvizError::engine("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| AsmvizError::engine(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let _ = std::fs::remove_file(&self.cfg.out_path);
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(AsmvizError::engine(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(self.cfg.out_path)
    }

    /// Kill the child and remove the partial output. Used when rendering
    /// fails mid-stream.
    pub fn abort(mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        let _ = std::fs::remove_file(&self.cfg.out_path);
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> AsmvizResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(format: OutputFormat, width: u32, height: u32) -> EncodeConfig {
        EncodeConfig {
            out_path: PathBuf::from("media/out_test"),
            canvas: Canvas { width, height },
            fps: Fps { num: 24, den: 1 },
            format,
        }
    }

    #[test]
    fn mp4_requires_even_dimensions() {
        assert!(cfg(OutputFormat::Video, 854, 480).validate().is_ok());
        assert!(cfg(OutputFormat::Video, 853, 480).validate().is_err());
        // GIF has no chroma subsampling, odd sizes are fine.
        assert!(cfg(OutputFormat::Gif, 853, 480).validate().is_ok());
    }

    #[test]
    fn mp4_args_select_h264_yuv420p() {
        let args = ffmpeg_args(&cfg(OutputFormat::Video, 1280, 720));
        assert_eq!(args[0], "-y");
        assert!(args.windows(2).any(|w| w == ["-c:v", "libx264"]));
        assert!(args.windows(2).any(|w| w == ["-pix_fmt", "yuv420p"]));
        assert!(args.windows(2).any(|w| w == ["-s", "1280x720"]));
        assert!(args.windows(2).any(|w| w == ["-r", "24/1"]));
    }

    #[test]
    fn gif_args_loop_forever() {
        let args = ffmpeg_args(&cfg(OutputFormat::Gif, 854, 480));
        assert!(args.windows(2).any(|w| w == ["-loop", "0"]));
        assert!(!args.iter().any(|a| a == "libx264"));
    }
}
