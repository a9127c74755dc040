use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};

use anyhow::Context;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{LayerplayError, LayerplayResult};
use crate::render::backend::FrameRGBA;
use crate::session::demo::Encoder;

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    pub encoder: Encoder,
    /// Constant rate factor.
    pub crf: u8,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            encoder: Encoder::X264,
            crf: 13,
        }
    }
}

/// A running `ffmpeg` process fed through its stdin.
struct EncoderProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl EncoderProcess {
    fn spawn(args: Vec<OsString>) -> LayerplayResult<Self> {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        tracing::debug!(?cmd, "spawning ffmpeg");

        let mut child = cmd.spawn().map_err(|e| {
            LayerplayError::evaluation(format!(
                "cannot start ffmpeg (MP4 capture needs it on PATH): {e}"
            ))
        })?;
        let stdin = child.stdin.take();
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| LayerplayError::evaluation("ffmpeg stderr was not captured"))?;
        // ffmpeg blocks once its stderr pipe fills up.
        let stderr = thread::Builder::new()
            .name("layerplay-ffmpeg-stderr".into())
            .spawn(move || {
                let mut buf = Vec::new();
                stderr.read_to_end(&mut buf)?;
                Ok(buf)
            })
            .context("spawn ffmpeg stderr reader")?;

        Ok(Self {
            child,
            stdin,
            stderr: Some(stderr),
        })
    }

    fn write(&mut self, bytes: &[u8]) -> LayerplayResult<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| LayerplayError::evaluation("ffmpeg input is already closed"))?;
        stdin
            .write_all(bytes)
            .context("pipe frame into ffmpeg")?;
        Ok(())
    }

    fn finish(mut self) -> LayerplayResult<()> {
        drop(self.stdin.take());
        let status = self.child.wait().context("wait for ffmpeg")?;
        let log = match self.stderr.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| LayerplayError::evaluation("ffmpeg stderr reader panicked"))?
                .context("read ffmpeg stderr")?,
            None => Vec::new(),
        };
        if status.success() {
            return Ok(());
        }
        Err(LayerplayError::evaluation(format!(
            "ffmpeg failed ({status}): {}",
            String::from_utf8_lossy(&log).trim()
        )))
    }
}

/// Streams raw RGBA frames into the system `ffmpeg`, optionally muxing the soundtrack.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    cfg: Option<SinkConfig>,
    process: Option<EncoderProcess>,
    next_idx: u64,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            cfg: None,
            process: None,
            next_idx: 0,
        }
    }

    /// Full `ffmpeg` argument list for `cfg`.
    pub fn command_args(&self, cfg: &SinkConfig) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-loglevel", "error"]
            .into_iter()
            .map(OsString::from)
            .collect();
        let mut flag = |name: &str, value: OsString| {
            args.push(name.into());
            args.push(value);
        };

        // Raw video on stdin; `-r` before `-i` sets the input rate.
        flag("-f", "rawvideo".into());
        flag("-pix_fmt", "rgba".into());
        flag("-s", format!("{}x{}", cfg.width, cfg.height).into());
        flag("-r", format!("{}/{}", cfg.fps.num, cfg.fps.den).into());
        flag("-i", "pipe:0".into());
        if let Some(audio) = &cfg.audio {
            if audio.offset > 0.0 {
                flag("-ss", format!("{:.3}", audio.offset).into());
            }
            flag("-i", audio.path.clone().into_os_string());
        }

        flag("-c:v", self.opts.encoder.codec().into());
        flag("-crf", self.opts.crf.to_string().into());
        flag("-pix_fmt", "yuv420p".into());
        if self.opts.encoder == Encoder::X265 {
            // QuickTime only plays HEVC tagged as hvc1.
            flag("-tag:v", "hvc1".into());
        }
        if cfg.audio.is_some() {
            flag("-map", "0:v:0".into());
            flag("-map", "1:a:0".into());
            flag("-c:a", "aac".into());
            args.push("-shortest".into());
        } else {
            args.push("-an".into());
        }
        args.push("-movflags".into());
        args.push("+faststart".into());
        args.push(self.opts.out_path.clone().into_os_string());
        args
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> LayerplayResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(LayerplayError::validation("capture size must be non-zero"));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(LayerplayError::validation(format!(
                "MP4 capture needs an even size (yuv420p), got {}x{}",
                cfg.width, cfg.height
            )));
        }
        if let Some(audio) = &cfg.audio
            && !audio.path.is_file()
        {
            return Err(LayerplayError::validation(format!(
                "soundtrack '{}' does not exist",
                audio.path.display()
            )));
        }
        if let Some(parent) = self.opts.out_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create capture directory '{}'", parent.display()))?;
        }

        self.process = Some(EncoderProcess::spawn(self.command_args(&cfg))?);
        self.cfg = Some(cfg);
        self.next_idx = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &FrameRGBA) -> LayerplayResult<()> {
        let (Some(cfg), Some(process)) = (self.cfg.as_ref(), self.process.as_mut()) else {
            return Err(LayerplayError::evaluation("ffmpeg sink not started"));
        };
        if idx != self.next_idx {
            return Err(LayerplayError::evaluation(format!(
                "ffmpeg sink expected frame {}, got {idx}",
                self.next_idx
            )));
        }
        if (frame.width, frame.height) != (cfg.width, cfg.height) {
            return Err(LayerplayError::validation(format!(
                "frame is {}x{}, capture is {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        // Presented frames are opaque, so premultiplied and straight bytes coincide.
        process.write(&frame.data)?;
        self.next_idx += 1;
        Ok(())
    }

    fn end(&mut self) -> LayerplayResult<()> {
        let process = self
            .process
            .take()
            .ok_or_else(|| LayerplayError::evaluation("ffmpeg sink not started"))?;
        self.cfg = None;
        process.finish()?;
        tracing::info!(out = %self.opts.out_path.display(), frames = self.next_idx, "encoded");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
