//! Join segments with the concat demuxer.

use std::path::{Path, PathBuf};

use crate::{Error, Result, ToolCommand};

/// Name of the list file written into the working directory.
const LIST_FILE: &str = "segments.txt";

/// Build a concat demuxer list for the given segment file names.
///
/// Single quotes are escaped the way the demuxer expects (`'\''`).
pub fn concat_list<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| format!("file '{}'\n", s.as_ref().replace('\'', r"'\''")))
        .collect()
}

/// Concatenate `segments` (file names inside `work_dir`) into `output` without
/// re-encoding. All segments must share codec, size and frame rate.
pub fn concat_segments<S: AsRef<str>>(
    ffmpeg: &Path,
    work_dir: &Path,
    segments: &[S],
    output: &Path,
) -> Result<PathBuf> {
    if segments.is_empty() {
        return Err(Error::InvalidSpec("no segments to concatenate".to_string()));
    }
    std::fs::write(work_dir.join(LIST_FILE), concat_list(segments))?;

    #[cfg(feature = "tracing")]
    tracing::debug!(count = segments.len(), output = %output.display(), "Concatenating segments");

    let mut cmd = ToolCommand::ffmpeg(ffmpeg);
    cmd.args(["-f", "concat", "-safe", "0", "-i", LIST_FILE, "-c", "copy"])
        .arg(output)
        .current_dir(work_dir);
    cmd.execute_producing(output)?;

    Ok(output.to_path_buf())
}
