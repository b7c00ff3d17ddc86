//! # Video Processing Module
//!
//! Questo modulo incapsula i due tool esterni: ffprobe (analisi) e ffmpeg (compressione).
//!
//! ## Responsabilità:
//! - Lettura di durata e dimensione del container con ffprobe
//! - Verifica di validità (presenza di uno stream video) per il reconciler
//! - Calcolo dei bitrate target a partire dal budget in kilobit
//! - Ricodifica H.264 + AAC con ffmpeg e parsing del progresso
//! - Timeout su ogni invocazione, con kill del processo figlio
//! - Verifica dipendenze esterne (ffmpeg, ffprobe)
//!
//! ## Calcolo bitrate:
//! Dato un budget `S` (kilobit) e una durata `D` (secondi):
//! - video: `S / D * 0.8` kbps
//! - audio: `S / D * 0.15` kbps
//!
//! Il 5% residuo copre l'overhead del container MP4.
//!
//! ## Progresso:
//! ffmpeg viene lanciato con `-progress pipe:1`; le righe `out_time_us=` vengono
//! convertite in percentuale rispetto alla durata sondata.
//!
//! ## Esempio:
//! ```rust,ignore
//! let processor = VideoProcessor::new(config.clone());
//! let info = processor.probe(&reserve_path).await?;
//! let targets = BitrateTargets::from_config(info.duration_secs, &config);
//! processor.encode(&reserve_path, &original_path, &targets, info.duration_secs, |pct| {
//!     debug!("{:.0}%", pct);
//! }).await?;
//! ```

use crate::config::Config;
use crate::error::CompressError;
use crate::platform::PlatformCommands;
use serde::Deserialize;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Container metadata read by ffprobe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeInfo {
    pub duration_secs: f64,
    pub size_bytes: u64,
}

/// Target bitrates for one encode, in kbps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitrateTargets {
    pub video_kbps: f64,
    pub audio_kbps: f64,
}

impl BitrateTargets {
    /// Split `total_kilobits` over `duration_secs` between video and audio
    pub fn compute(
        duration_secs: f64,
        total_kilobits: f64,
        video_share: f64,
        audio_share: f64,
    ) -> Self {
        let per_second = total_kilobits / duration_secs;
        Self {
            video_kbps: per_second * video_share,
            audio_kbps: per_second * audio_share,
        }
    }

    pub fn from_config(duration_secs: f64, config: &Config) -> Self {
        Self::compute(
            duration_secs,
            config.target_total_kilobits,
            config.video_bitrate_share,
            config.audio_bitrate_share,
        )
    }

    /// ffmpeg bitrate argument in kbps, fractional part kept
    pub fn ffmpeg_rate(kbps: f64) -> String {
        format!("{}k", kbps)
    }
}

#[derive(Debug, Deserialize)]
struct FormatReport {
    format: Option<FormatSection>,
}

#[derive(Debug, Deserialize)]
struct FormatSection {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamReport {
    #[serde(default)]
    streams: Vec<StreamSection>,
}

#[derive(Debug, Deserialize)]
struct StreamSection {
    codec_type: Option<String>,
}

/// Parse `ffprobe -show_format -print_format json` output
pub fn parse_probe_output(json: &str) -> Result<ProbeInfo, CompressError> {
    let report: FormatReport = serde_json::from_str(json)
        .map_err(|e| CompressError::Probe(format!("Malformed ffprobe output: {}", e)))?;
    let format = report
        .format
        .ok_or_else(|| CompressError::Probe("ffprobe reported no format section".to_string()))?;

    let duration_secs = format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| {
            CompressError::Probe(format!("Unusable duration: {:?}", format.duration))
        })?;

    let size_bytes = format
        .size
        .as_deref()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0);

    Ok(ProbeInfo {
        duration_secs,
        size_bytes,
    })
}

/// Whether a stream listing starts with a video stream
pub fn parse_stream_check(json: &str) -> bool {
    match serde_json::from_str::<StreamReport>(json) {
        Ok(report) => report
            .streams
            .first()
            .and_then(|s| s.codec_type.as_deref())
            .map(|t| t == "video")
            .unwrap_or(false),
        Err(e) => {
            warn!("Error parsing ffprobe output: {}", e);
            false
        }
    }
}

/// Convert one `-progress` line into a completion percentage
pub fn parse_progress_line(line: &str, duration_secs: f64) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "progress" if value == "end" => Some(100.0),
        // ffmpeg reports out_time_ms in microseconds as well
        "out_time_us" | "out_time_ms" if duration_secs > 0.0 => {
            let micros = value.parse::<f64>().ok()?;
            Some((micros / 1_000_000.0 / duration_secs * 100.0).clamp(0.0, 100.0))
        }
        _ => None,
    }
}

/// Handles probing and re-encoding of videos
#[derive(Clone)]
pub struct VideoProcessor {
    config: Config,
}

impl VideoProcessor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get container duration and size
    pub async fn probe(&self, video_path: &Path) -> Result<ProbeInfo, CompressError> {
        let output = self
            .run_ffprobe(
                crate::args!["-v", "error", "-print_format", "json", "-show_format"],
                video_path,
            )
            .await?;

        if !output.status.success() {
            return Err(CompressError::Probe(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
        debug!(
            "Probed {}: {:.2}s, {} bytes",
            video_path.display(),
            info.duration_secs,
            info.size_bytes
        );
        Ok(info)
    }

    /// Check that a file is a readable container with a leading video stream.
    ///
    /// Every failure (spawn, timeout, exit status, parsing) counts as invalid.
    pub async fn has_video_stream(&self, video_path: &Path) -> bool {
        let name = video_path.file_name().unwrap_or_default().to_string_lossy();
        let result = self
            .run_ffprobe(
                crate::args![
                    "-v", "error",
                    "-select_streams", "v:0",
                    "-show_entries", "stream=codec_type",
                    "-of", "json",
                ],
                video_path,
            )
            .await;

        match result {
            Ok(output) if output.status.success() => {
                parse_stream_check(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                debug!(
                    "ffprobe rejected {} (exit code {:?})",
                    name,
                    output.status.code()
                );
                false
            }
            Err(e) => {
                warn!("Failed to run ffprobe on {}: {}", name, e);
                false
            }
        }
    }

    async fn run_ffprobe(&self, args: Vec<String>, video_path: &Path) -> Result<Output, CompressError> {
        let secs = self.config.probe_timeout_secs;
        let mut cmd = Command::new(&self.config.ffprobe_bin);
        cmd.args(args)
            .arg(video_path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tokio::time::timeout(Duration::from_secs(secs), cmd.output())
            .await
            .map_err(|_| CompressError::Timeout { stage: "probe", secs })?
            .map_err(|e| {
                CompressError::Probe(format!(
                    "Failed to execute {}: {}",
                    self.config.ffprobe_bin.display(),
                    e
                ))
            })
    }

    /// Re-encode `input` into `output` at the given bitrates.
    ///
    /// `on_progress` receives completion percentages as ffmpeg reports them.
    pub async fn encode<F>(
        &self,
        input: &Path,
        output: &Path,
        targets: &BitrateTargets,
        duration_secs: f64,
        on_progress: F,
    ) -> Result<(), CompressError>
    where
        F: FnMut(f64) + Send,
    {
        let secs = self.config.encode_timeout_secs;
        tokio::time::timeout(
            Duration::from_secs(secs),
            self.encode_internal(input, output, targets, duration_secs, on_progress),
        )
        .await
        .map_err(|_| CompressError::Timeout { stage: "encode", secs })?
    }

    async fn encode_internal<F>(
        &self,
        input: &Path,
        output: &Path,
        targets: &BitrateTargets,
        duration_secs: f64,
        mut on_progress: F,
    ) -> Result<(), CompressError>
    where
        F: FnMut(f64) + Send,
    {
        debug!(
            "🎬 Compressing video: {} (video: {:.2} kbps, audio: {:.2} kbps)",
            input.file_name().unwrap_or_default().to_string_lossy(),
            targets.video_kbps,
            targets.audio_kbps
        );

        let mut cmd = Command::new(&self.config.ffmpeg_bin);
        cmd.args(crate::args!["-y", "-nostdin", "-i"])
            .arg(input)
            .args(crate::args![
                "-c:v", "libx264",
                "-b:v", BitrateTargets::ffmpeg_rate(targets.video_kbps),
                "-c:a", "aac",
                "-b:a", BitrateTargets::ffmpeg_rate(targets.audio_kbps),
                "-progress", "pipe:1",
                "-nostats",
                "-loglevel", "error",
            ])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start_time = Instant::now();
        let mut child = cmd.spawn().map_err(|e| {
            CompressError::Encode(format!(
                "Failed to execute {}: {}",
                self.config.ffmpeg_bin.display(),
                e
            ))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CompressError::Encode("ffmpeg stdout was not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| CompressError::Encode("ffmpeg stderr was not captured".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).trim().to_string()
        });

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(percent) = parse_progress_line(&line, duration_secs) {
                on_progress(percent);
            }
        }

        let status = child.wait().await?;
        let stderr_text = stderr_task.await.unwrap_or_default();
        let elapsed = start_time.elapsed().as_secs_f64();

        if !status.success() {
            debug!("FFmpeg failed after {:.1}s", elapsed);
            return Err(CompressError::Encode(format!(
                "exit code {:?}: {}",
                status.code(),
                stderr_text
            )));
        }

        if !tokio::fs::try_exists(output).await? {
            return Err(CompressError::Encode(format!(
                "ffmpeg exited cleanly but produced no file at {}",
                output.display()
            )));
        }

        debug!("✅ Video compression completed in {:.1}s", elapsed);
        Ok(())
    }

    /// Check if required tools are available
    pub async fn check_dependencies(config: &Config) -> Result<(), CompressError> {
        let platform = PlatformCommands::instance();

        for tool in [&config.ffprobe_bin, &config.ffmpeg_bin] {
            if !platform.is_command_available(tool).await {
                return Err(CompressError::MissingDependency(format!(
                    "{} is required for video processing",
                    tool.display()
                )));
            }
        }

        Ok(())
    }
}
