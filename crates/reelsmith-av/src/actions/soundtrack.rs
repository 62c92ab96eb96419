//! Lay a soundtrack under a silent video.

use std::path::{Path, PathBuf};

use crate::{Error, Result, ToolCommand};

/// Soundtrack mix settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MixSpec {
    /// Gain applied to the soundtrack (0.0 - 1.0).
    pub volume: f64,
    pub fade_in: f64,
    pub fade_out: f64,
    /// Length of the video; the soundtrack is looped or cut to match.
    pub duration_secs: f64,
    /// AAC bitrate, e.g. "192k".
    pub bitrate: String,
}

impl MixSpec {
    /// The `-filter_complex` graph for the audio input.
    pub fn filter(&self) -> String {
        let fade_out_start = (self.duration_secs - self.fade_out).max(0.0);
        let mut chain = vec![
            format!("atrim=end={:.3}", self.duration_secs),
            format!("volume={:.3}", self.volume),
        ];
        if self.fade_in > 0.0 {
            chain.push(format!("afade=t=in:st=0:d={:.3}", self.fade_in));
        }
        if self.fade_out > 0.0 {
            chain.push(format!(
                "afade=t=out:st={:.3}:d={:.3}",
                fade_out_start, self.fade_out
            ));
        }
        format!("[1:a]{}[a]", chain.join(","))
    }

    /// Arguments after the common ffmpeg prefix.
    pub fn args(&self, video: &Path, audio: &Path, output: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            video.display().to_string(),
            "-stream_loop".to_string(),
            "-1".to_string(),
            "-i".to_string(),
            audio.display().to_string(),
            "-filter_complex".to_string(),
            self.filter(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "[a]".to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            self.bitrate.clone(),
            "-t".to_string(),
            format!("{:.3}", self.duration_secs),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output.display().to_string(),
        ]
    }
}

/// Mix `audio` under `video` into `output`.
pub fn mix_soundtrack(
    ffmpeg: &Path,
    video: &Path,
    audio: &Path,
    spec: &MixSpec,
    output: &Path,
) -> Result<PathBuf> {
    for input in [video, audio] {
        if !input.exists() {
            return Err(Error::missing_input(input));
        }
    }
    if !(0.0..=1.0).contains(&spec.volume) {
        return Err(Error::InvalidSpec(format!(
            "soundtrack volume {} outside 0.0..=1.0",
            spec.volume
        )));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(audio = %audio.display(), volume = spec.volume, "Mixing soundtrack");

    let mut cmd = ToolCommand::ffmpeg(ffmpeg);
    cmd.args(spec.args(video, audio, output));
    cmd.execute_producing(output)?;

    Ok(output.to_path_buf())
}

/// Copy the streams of `video` into `output` with the index moved to the front.
pub fn faststart(ffmpeg: &Path, video: &Path, output: &Path) -> Result<PathBuf> {
    if !video.exists() {
        return Err(Error::missing_input(video));
    }
    let mut cmd = ToolCommand::ffmpeg(ffmpeg);
    cmd.arg("-i")
        .arg(video)
        .args(["-c", "copy", "-movflags", "+faststart"])
        .arg(output);
    cmd.execute_producing(output)?;
    Ok(output.to_path_buf())
}
