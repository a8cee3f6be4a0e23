use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::Frame;
use crate::foundation::error::{StickerError, StickerResult};

/// Load every `*.png` in `dir` as a frame, ordered by filename.
///
/// Frames keep their filenames as keys so anchor entries keep matching after a round trip.
pub fn load_frame_dir(dir: &Path) -> StickerResult<Vec<Frame>> {
    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("read frame directory '{}'", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_png(p))
        .collect::<Vec<_>>();
    paths.sort();
    if paths.is_empty() {
        return Err(StickerError::validation(format!(
            "no PNG files found in '{}'",
            dir.display()
        )));
    }

    let mut frames = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        let image = image::open(path)
            .with_context(|| format!("decode frame '{}'", path.display()))?
            .to_rgba8();
        let key = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| Frame::key_for(index));
        frames.push(Frame::new(index, key, image));
    }
    tracing::debug!(dir = %dir.display(), frames = frames.len(), "loaded frames");
    Ok(frames)
}

/// Write frames as `frame_000.png`, `frame_001.png`, ... into `dir`, replacing its contents.
///
/// Files land in a sibling staging directory that is renamed into place only after every frame
/// is written, so `dir` is either the complete new set or untouched.
pub fn write_frame_dir(dir: &Path, frames: &[Frame]) -> StickerResult<Vec<PathBuf>> {
    let staging = sibling(dir, "partial")?;
    if staging.exists() {
        std::fs::remove_dir_all(&staging)
            .with_context(|| format!("clear staging directory '{}'", staging.display()))?;
    }
    std::fs::create_dir_all(&staging)
        .with_context(|| format!("create staging directory '{}'", staging.display()))?;

    let written = write_all(&staging, frames);
    if let Err(err) = written {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(err);
    }

    if dir.exists() {
        std::fs::remove_dir_all(dir)
            .with_context(|| format!("remove previous output '{}'", dir.display()))?;
    }
    std::fs::rename(&staging, dir)
        .with_context(|| format!("move '{}' into place at '{}'", staging.display(), dir.display()))?;

    let paths = (0..frames.len())
        .map(|i| dir.join(Frame::key_for(i)))
        .collect::<Vec<_>>();
    tracing::info!(dir = %dir.display(), frames = paths.len(), "wrote frames");
    Ok(paths)
}

/// Write bytes to `path` through a temporary sibling file and a rename.
pub fn write_file_atomic(path: &Path, bytes: &[u8]) -> StickerResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let tmp = sibling(path, "partial")?;
    std::fs::write(&tmp, bytes).with_context(|| format!("write '{}'", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("move '{}' into place at '{}'", tmp.display(), path.display()))?;
    Ok(())
}

fn write_all(staging: &Path, frames: &[Frame]) -> StickerResult<()> {
    for (i, frame) in frames.iter().enumerate() {
        let path = staging.join(Frame::key_for(i));
        frame
            .image
            .save_with_format(&path, image::ImageFormat::Png)
            .with_context(|| format!("write frame '{}'", path.display()))?;
    }
    Ok(())
}

fn sibling(path: &Path, tag: &str) -> StickerResult<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| StickerError::validation(format!("'{}' has no file name", path.display())))?;
    let mut staged = name.to_os_string();
    staged.push(format!(".{tag}-{}", std::process::id()));
    Ok(path.with_file_name(staged))
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

#[cfg(test)]
#[path = "../../tests/unit/frames/store.rs"]
mod tests;
