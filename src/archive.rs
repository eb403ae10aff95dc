//! Zip packaging of extracted frames.
//!
//! [`write_archive`] bundles frames from an output directory into a single
//! deflate-compressed zip for download. Entries are stored flat under their
//! file names.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! // Everything in the directory.
//! framesift::archive::write_archive(Path::new("out/talk"), &[], Path::new("talk.zip"))?;
//!
//! // Only a selection.
//! let picked = ["frame_0002.png".to_string(), "frame_0005.png".to_string()];
//! framesift::archive::write_archive(Path::new("out/talk"), &picked, Path::new("picked.zip"))?;
//! # Ok::<(), framesift::FrameSiftError>(())
//! ```

use std::{
    collections::HashSet,
    fs::{self, File},
    io::{BufWriter, ErrorKind, Write},
    path::{Component, Path, PathBuf},
};

use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::error::FrameSiftError;

/// Resolve a requested entry name to a file directly inside `directory`.
///
/// Rejects anything that is not a plain file name: separators, `.`/`..`,
/// absolute paths, and names with no file behind them.
fn resolve_entry(directory: &Path, name: &str) -> Result<PathBuf, FrameSiftError> {
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain || name.contains(['/', '\\']) {
        return Err(FrameSiftError::InvalidArchiveEntry(name.to_string()));
    }

    let path = directory.join(name);
    if !path.is_file() {
        return Err(FrameSiftError::InvalidArchiveEntry(name.to_string()));
    }
    Ok(path)
}

/// Every `*.png` in `directory`, sorted by name.
fn all_png_names(directory: &Path) -> Result<Vec<String>, FrameSiftError> {
    let mut names: Vec<String> = fs::read_dir(directory)?
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| {
            Path::new(name)
                .extension()
                .is_some_and(|extension| extension.eq_ignore_ascii_case("png"))
        })
        .collect();
    names.sort_unstable();
    Ok(names)
}

fn write_entries(entries: &[(&String, PathBuf)], destination: &Path) -> Result<(), FrameSiftError> {
    let mut archive = ZipWriter::new(BufWriter::new(File::create(destination)?));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, path) in entries {
        archive.start_file(name.as_str(), options)?;
        archive.write_all(&fs::read(path)?)?;
    }

    archive.finish()?.flush()?;
    Ok(())
}

/// Write `entries` to `destination`, removing the file again on failure.
fn pack(entries: &[(&String, PathBuf)], destination: &Path) -> Result<(), FrameSiftError> {
    let written = write_entries(entries, destination);
    if written.is_err() {
        match fs::remove_file(destination) {
            Err(error) if error.kind() != ErrorKind::NotFound => log::warn!(
                "Could not remove incomplete archive {}: {error}",
                destination.display()
            ),
            _ => {}
        }
    }
    written
}

/// Write a zip of frames from `frames_dir` to `destination`.
///
/// An empty `selection` packs every `*.png` in the directory; otherwise
/// exactly the named files are packed, in the given order. All names are
/// checked before `destination` is created, and a partially written archive
/// is removed.
///
/// Returns the number of entries written.
///
/// # Errors
///
/// - [`FrameSiftError::InvalidArchiveEntry`] for a name that is not a plain
///   file inside `frames_dir`, or that is selected more than once.
/// - [`FrameSiftError::IoError`] / [`FrameSiftError::ArchiveError`] if
///   reading a frame or writing the archive fails.
pub fn write_archive(
    frames_dir: &Path,
    selection: &[String],
    destination: &Path,
) -> Result<usize, FrameSiftError> {
    let names = if selection.is_empty() {
        all_png_names(frames_dir)?
    } else {
        selection.to_vec()
    };

    let mut seen = HashSet::new();
    let entries = names
        .iter()
        .map(|name| {
            if !seen.insert(name.as_str()) {
                return Err(FrameSiftError::InvalidArchiveEntry(format!(
                    "{name} (selected twice)"
                )));
            }
            resolve_entry(frames_dir, name).map(|path| (name, path))
        })
        .collect::<Result<Vec<_>, _>>()?;

    pack(&entries, destination)?;

    log::info!(
        "Archived {} frame(s) from {} into {}",
        entries.len(),
        frames_dir.display(),
        destination.display()
    );

    Ok(entries.len())
}
