//! Generated ambient soundtracks.
//!
//! The seed picks a key, a mode and a slight detune for a three-note pad;
//! `[music]` can pin the key and mode, pulse the pad at the track tempo and
//! set the level of the pink-noise ocean bed underneath. The track is
//! rendered by `ffmpeg` from lavfi sources and recorded as a CC0 asset
//! authored by the channel.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reelsmith_av::actions::{synthesize_ambient, AmbientSpec};
use reelsmith_av::{Tools, Workspace};
use reelsmith_common::{Asset, Error, License, LicensedAsset, MediaKind, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{Config, MusicConfig};
use crate::tools::encoding;

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// MIDI number of C3.
const OCTAVE_BASE: u8 = 48;

const SAMPLE_RATE: u32 = 44_100;
const LOWPASS_HZ: u32 = 1_800;
const MAX_DETUNE: f64 = 0.003;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" | "maj" => Ok(Self::Major),
            "minor" | "min" => Ok(Self::Minor),
            other => Err(format!("unknown mode {other:?}; use major or minor")),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
        }
    }
}

/// The pad chord chosen for a seed.
#[derive(Debug, Clone, PartialEq)]
pub struct Chord {
    pub key: &'static str,
    pub mode: Mode,
    /// Root, third and fifth as MIDI note numbers.
    pub notes: [u8; 3],
    /// Detuned frequencies in Hz.
    pub frequencies: Vec<f64>,
}

/// Frequency of a MIDI note (A4 = 69 = 440 Hz).
pub fn midi_to_freq(note: f64) -> f64 {
    440.0 * 2f64.powf((note - 69.0) / 12.0)
}

/// Pitch class (0 = C) of a key name such as `A`, `C#` or `Eb`.
pub fn parse_key(name: &str) -> Result<usize> {
    let name = name.trim();
    let mut chars = name.chars();
    let natural = match chars.next().map(|c| c.to_ascii_uppercase()) {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => return Err(Error::configuration(format!("unknown key {name:?}"))),
    };
    let shift: i32 = match chars.as_str() {
        "" => 0,
        "#" => 1,
        "b" => -1,
        _ => return Err(Error::configuration(format!("unknown key {name:?}"))),
    };
    Ok((natural + shift).rem_euclid(12) as usize)
}

/// Pick the chord for `seed`. `key` (a pitch class) and `mode` override the
/// seeded choice; the detune always comes from the seed.
pub fn choose_chord(seed: u64, key: Option<usize>, mode: Option<Mode>) -> Chord {
    let mut rng = StdRng::seed_from_u64(seed);
    let seeded_degree = rng.gen_range(0..NOTE_NAMES.len());
    let seeded_mode = if rng.gen_bool(0.5) { Mode::Major } else { Mode::Minor };
    let degree = key.map(|k| k % NOTE_NAMES.len()).unwrap_or(seeded_degree);
    let mode = mode.unwrap_or(seeded_mode);
    let root = OCTAVE_BASE + degree as u8;
    let third = match mode {
        Mode::Major => root + 4,
        Mode::Minor => root + 3,
    };
    let notes = [root, third, root + 7];
    let frequencies = notes
        .iter()
        .map(|&n| midi_to_freq(n as f64) * (1.0 + rng.gen_range(-MAX_DETUNE..MAX_DETUNE)))
        .collect();
    Chord {
        key: NOTE_NAMES[degree],
        mode,
        notes,
        frequencies,
    }
}

/// Synthesis parameters for a track of `duration_secs`.
pub fn ambient_spec(
    chord: &Chord,
    duration_secs: f64,
    seed: u64,
    music: &MusicConfig,
) -> AmbientSpec {
    AmbientSpec {
        duration_secs,
        frequencies: chord.frequencies.clone(),
        noise_amplitude: music.ocean_level,
        seed,
        lowpass_hz: LOWPASS_HZ,
        // Eighth notes.
        pulse_hz: music.bpm / 60.0 * 2.0,
        pulse_depth: music.pulse,
        fade_secs: (duration_secs / 4.0).min(3.0),
        sample_rate: SAMPLE_RATE,
    }
}

/// File name of the generated track.
pub fn track_file_name(seed: u64) -> String {
    format!("ambient-{seed}.m4a")
}

/// Render an ambient track into the music directory and record its
/// provenance.
///
/// # Errors
///
/// - [`Error::Configuration`] for a non-positive duration
/// - [`Error::Encoding`] when `ffmpeg` fails
/// - [`Error::LicenseViolation`] when CC0 is not in the allowed set
pub fn generate_music(
    config: &Config,
    tools: &Tools,
    duration_secs: f64,
    seed: u64,
) -> Result<LicensedAsset> {
    if !(duration_secs > 0.0) {
        return Err(Error::configuration(format!(
            "music duration must be positive, got {duration_secs}"
        )));
    }

    let dir = &config.paths.music_dir;
    std::fs::create_dir_all(dir)?;
    let dir: PathBuf = std::fs::canonicalize(dir)?;
    let name = track_file_name(seed);
    let output = dir.join(&name);

    let music = &config.music;
    let key = music.key.as_deref().map(parse_key).transpose()?;
    let chord = choose_chord(seed, key, music.mode);
    info!(
        key = chord.key,
        mode = %chord.mode,
        bpm = music.bpm,
        seed,
        duration = duration_secs,
        "Generating soundtrack"
    );

    let workspace = Workspace::new_in(&dir).map_err(encoding("workspace"))?;
    let spec = ambient_spec(&chord, duration_secs, seed, music);
    synthesize_ambient(&tools.ffmpeg, &spec, &workspace.file(&name)).map_err(encoding("music"))?;
    workspace.finalize(&name, &output).map_err(encoding("finalize"))?;

    let asset = Asset::new(&output, "generated", License::Cc0, &config.channel.name, MediaKind::Audio)
        .with_title(format!("Ambient pad in {} {} (seed {seed})", chord.key, chord.mode))
        .with_duration(duration_secs);
    asset.write_sidecar()?;
    info!(output = %output.display(), "Soundtrack written");

    asset.into_licensed(&config.fetch.licenses)
}
