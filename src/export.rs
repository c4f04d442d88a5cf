//! Write generated clips to disk.

use crate::error::Result;
use crate::generation::AudioClip;
use std::fs;
use std::path::{Path, PathBuf};

/// Write each clip to `dir/{display_name}`, creating `dir` if needed.
///
/// Returns the written paths in clip order. Existing files are overwritten.
pub fn export_clips(clips: &[AudioClip], dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut paths = Vec::with_capacity(clips.len());
    for clip in clips {
        let path = dir.join(&clip.display_name);
        fs::write(&path, &clip.audio.bytes[..])?;
        tracing::debug!(path = %path.display(), bytes = clip.audio.len(), "exported clip");
        paths.push(path);
    }
    Ok(paths)
}
