//! Path-checked, all-or-nothing writes of compiled files.
//!
//! Every output name is cleaned and joined onto the build directory; a name
//! that would land outside it is rejected before anything touches the disk.
//! Files are first written next to their destination with a `.tmp` suffix and
//! only renamed into place once every write succeeded. On failure the
//! temporary files are removed again.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use walkdir::WalkDir;

use crate::engine::Compilation;
use crate::{Error, Result};

/// Replace the contents of `build_dir` with the public files followed by the
/// compiled ones. Development-only assets are skipped. Returns the number of
/// compiled files written.
pub fn write_site(compilation: &Compilation, build_dir: &Path, public_dir: &Path) -> Result<usize> {
    let dir = validate_and_normalize_dir(build_dir)?;
    clean_dir(&dir)?;
    copy_public_dir(public_dir, &dir)?;
    write_compilation(compilation, &dir)
}

/// Write every non-development asset of `compilation` under `dir`.
pub fn write_compilation(compilation: &Compilation, dir: &Path) -> Result<usize> {
    let dir = validate_and_normalize_dir(dir)?;
    fs::create_dir_all(&dir).map_err(|e| {
        Error::WriteFailure(format!(
            "Failed to create output directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let mut operations = Vec::new();
    for (name, asset) in &compilation.assets {
        if asset.development {
            continue;
        }
        let target_path = validate_output_path(&dir, name)?;
        operations.push((target_path, asset.content.as_slice()));
    }

    write_files_atomic(&operations)?;
    tracing::debug!(files = operations.len(), dir = %dir.display(), "wrote compilation");
    Ok(operations.len())
}

/// Copy the public directory verbatim into `dir`. A missing public directory
/// copies nothing.
pub fn copy_public_dir(public_dir: &Path, dir: &Path) -> Result<usize> {
    if !public_dir.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(public_dir).follow_links(true) {
        let entry = entry.map_err(|e| {
            Error::WriteFailure(format!(
                "Failed to read public directory '{}': {}",
                public_dir.display(),
                e
            ))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(public_dir) else {
            continue;
        };
        let name = relative.to_string_lossy().replace('\\', "/");
        let target_path = validate_output_path(dir, &name)?;
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::io(format!("Failed to create '{}'", parent.display()), e))?;
        }
        fs::copy(entry.path(), &target_path).map_err(|e| {
            Error::io(
                format!(
                    "Failed to copy '{}' to '{}'",
                    entry.path().display(),
                    target_path.display()
                ),
                e,
            )
        })?;
        copied += 1;
    }
    Ok(copied)
}

/// Remove the previous build, refusing to touch a filesystem root.
fn clean_dir(dir: &Path) -> Result<()> {
    if dir.parent().is_none() {
        return Err(Error::InvalidOutputPath(format!(
            "Refusing to clean '{}'",
            dir.display()
        )));
    }
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(
            format!("Failed to clean build directory '{}'", dir.display()),
            e,
        )),
    }
}

fn validate_and_normalize_dir(dir: &Path) -> Result<PathBuf> {
    let cleaned = dir.clean();
    if cleaned.is_absolute() {
        return Ok(cleaned);
    }
    Ok(std::env::current_dir()
        .map_err(|e| Error::InvalidOutputPath(format!("Failed to get current directory: {}", e)))?
        .join(&cleaned)
        .clean())
}

/// Join `filename` onto `base_dir`, rejecting names that escape it.
fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "Filename contains null byte".to_string(),
        ));
    }

    #[cfg(target_os = "windows")]
    {
        let upper = filename.to_uppercase();
        let device_names = [
            "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
            "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
        ];
        for device in &device_names {
            if upper == *device || upper.starts_with(&format!("{}.", device)) {
                return Err(Error::InvalidOutputPath(format!(
                    "Filename is a reserved device name: {}",
                    filename
                )));
            }
        }
    }

    let full_path = base_dir.join(Path::new(filename).clean()).clean();
    if !full_path.starts_with(base_dir) || full_path == base_dir {
        return Err(Error::InvalidOutputPath(format!(
            "Path '{}' escapes output directory '{}' (resolved to '{}')",
            filename,
            base_dir.display(),
            full_path.display()
        )));
    }

    Ok(full_path)
}

/// `index.html` -> `index.html.tmp`; keeps names differing only by extension apart.
fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut temp_files = Vec::new();

    for (target_path, content) in operations {
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                cleanup_temp_files(&temp_files);
                Error::WriteFailure(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp_path = temp_path_for(target_path);
        fs::write(&temp_path, content).map_err(|e| {
            cleanup_temp_files(&temp_files);
            Error::WriteFailure(format!(
                "Failed to write temporary file '{}': {}",
                temp_path.display(),
                e
            ))
        })?;

        temp_files.push((temp_path, target_path.clone()));
    }

    for (temp_path, target_path) in &temp_files {
        fs::rename(temp_path, target_path).map_err(|e| {
            cleanup_temp_files(&temp_files);
            Error::WriteFailure(format!(
                "Failed to rename '{}' to '{}': {}",
                temp_path.display(),
                target_path.display(),
                e
            ))
        })?;
    }

    Ok(())
}

/// Best effort; we are already failing.
fn cleanup_temp_files(temp_files: &[(PathBuf, PathBuf)]) {
    for (temp_path, _) in temp_files {
        if temp_path.exists() {
            if let Err(e) = fs::remove_file(temp_path) {
                tracing::warn!(
                    path = %temp_path.display(),
                    error = %e,
                    "failed to clean up temporary file"
                );
            }
        }
    }
}
