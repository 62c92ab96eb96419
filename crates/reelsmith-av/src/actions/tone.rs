//! Ambient pad synthesis from lavfi sources.

use std::path::{Path, PathBuf};

use crate::{Error, Result, ToolCommand};

/// Parameters of a synthesized ambient track.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbientSpec {
    pub duration_secs: f64,
    /// Chord tones in Hz, mixed at equal gain.
    pub frequencies: Vec<f64>,
    /// Pink noise amplitude (0.0 - 1.0), 0 disables the noise bed.
    pub noise_amplitude: f64,
    /// Noise generator seed.
    pub seed: u64,
    pub lowpass_hz: u32,
    /// Amplitude pulse rate in Hz (eighth notes at the track tempo).
    pub pulse_hz: f64,
    /// Pulse depth (0.0 - 1.0), 0 keeps the pad steady.
    pub pulse_depth: f64,
    pub fade_secs: f64,
    pub sample_rate: u32,
}

impl AmbientSpec {
    fn input_count(&self) -> usize {
        self.frequencies.len() + usize::from(self.noise_amplitude > 0.0)
    }

    /// The `-filter_complex` graph mixing all sources.
    pub fn filter(&self) -> String {
        let n = self.input_count();
        let inputs: String = (0..n).map(|i| format!("[{i}:a]")).collect();
        let fade_out_start = (self.duration_secs - self.fade_secs).max(0.0);
        let pulse = if self.pulse_depth > 0.0 {
            format!("tremolo=f={:.3}:d={:.2},", self.pulse_hz, self.pulse_depth)
        } else {
            String::new()
        };
        // amix divides by the input count; restore some level.
        format!(
            "{inputs}amix=inputs={n}:duration=longest,volume={gain:.2},lowpass=f={lp},{pulse}\
             afade=t=in:st=0:d={fade:.3},afade=t=out:st={fo:.3}:d={fade:.3},\
             aformat=channel_layouts=stereo[a]",
            gain = (n as f64 / 2.0).max(1.0),
            lp = self.lowpass_hz,
            fade = self.fade_secs,
            fo = fade_out_start,
        )
    }

    /// Arguments after the common ffmpeg prefix.
    pub fn args(&self, output: &Path) -> Vec<String> {
        let d = format!("{:.3}", self.duration_secs);
        let mut args = Vec::new();
        for f in &self.frequencies {
            args.extend([
                "-f".to_string(),
                "lavfi".to_string(),
                "-i".to_string(),
                format!(
                    "sine=frequency={:.2}:sample_rate={}:duration={}",
                    f, self.sample_rate, d
                ),
            ]);
        }
        if self.noise_amplitude > 0.0 {
            args.extend([
                "-f".to_string(),
                "lavfi".to_string(),
                "-i".to_string(),
                format!(
                    "anoisesrc=color=pink:amplitude={:.3}:sample_rate={}:duration={}:seed={}",
                    self.noise_amplitude, self.sample_rate, d, self.seed
                ),
            ]);
        }
        args.extend([
            "-filter_complex".to_string(),
            self.filter(),
            "-map".to_string(),
            "[a]".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            "192k".to_string(),
            "-t".to_string(),
            d,
            output.display().to_string(),
        ]);
        args
    }
}

/// Render an ambient track into `output`.
pub fn synthesize_ambient(ffmpeg: &Path, spec: &AmbientSpec, output: &Path) -> Result<PathBuf> {
    if spec.frequencies.is_empty() {
        return Err(Error::InvalidSpec("ambient track needs at least one tone".to_string()));
    }
    if spec.pulse_depth > 0.0 && !(spec.pulse_hz >= 0.1) {
        return Err(Error::InvalidSpec(format!(
            "pulse rate must be at least 0.1 Hz, got {}",
            spec.pulse_hz
        )));
    }
    if !(spec.duration_secs > 0.0) {
        return Err(Error::InvalidSpec(format!(
            "duration must be positive, got {}",
            spec.duration_secs
        )));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        tones = ?spec.frequencies,
        duration = spec.duration_secs,
        seed = spec.seed,
        "Synthesizing ambient track"
    );

    let mut cmd = ToolCommand::ffmpeg(ffmpeg);
    cmd.args(spec.args(output));
    cmd.execute_producing(output)?;

    Ok(output.to_path_buf())
}
