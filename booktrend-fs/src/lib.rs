//! Filesystem helpers for report output, built on `cap-std` and `camino`.
//!
//! Every helper resolves the longest ambient prefix of a path (root, drive
//! prefix, or leading `..` segments) once, then performs the operation through
//! a capability handle on that directory.
#![forbid(unsafe_code)]

use std::io;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};

/// Create `path` and any missing ancestors.
///
/// # Errors
///
/// Returns the underlying I/O error when the ambient base cannot be opened or
/// a directory cannot be created.
pub fn ensure_dir(path: &Utf8Path) -> io::Result<()> {
    let (base, relative) = split_ambient(path);
    if relative.as_str().is_empty() {
        return Ok(());
    }
    let dir = Dir::open_ambient_dir(&base, ambient_authority())?;
    dir.create_dir_all(&relative)
}

/// Create the directory that will contain `path`.
///
/// # Errors
///
/// See [`ensure_dir`].
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Write `contents` to `path`, replacing any existing file.
///
/// The parent directory must already exist.
///
/// # Errors
///
/// Returns an [`io::ErrorKind::InvalidInput`] error when `path` has no file
/// name, or the I/O error raised while opening the parent or writing.
pub fn write_file(path: &Utf8Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
    let (dir, name) = open_parent(path)?;
    dir.write(name, contents)
}

/// Return whether `path` names an existing regular file.
///
/// # Errors
///
/// Returns I/O errors other than [`io::ErrorKind::NotFound`].
pub fn is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = match open_parent(path) {
        Ok(found) => found,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(name) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

fn open_parent(path: &Utf8Path) -> io::Result<(Dir, &str)> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{path} does not name a file"),
        )
    })?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

/// Split `path` into an ambient base directory and a sandboxed remainder.
///
/// Leading root, drive prefix and `..` components stay in the base so the
/// remainder never escapes the directory it is resolved against.
fn split_ambient(path: &Utf8Path) -> (Utf8PathBuf, Utf8PathBuf) {
    let mut base = Utf8PathBuf::new();
    let mut relative = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::Prefix(_) | Utf8Component::RootDir | Utf8Component::ParentDir
                if relative.as_str().is_empty() =>
            {
                base.push(component);
            }
            Utf8Component::CurDir => {}
            other => relative.push(other),
        }
    }
    if base.as_str().is_empty() {
        base.push(".");
    }
    (base, relative)
}
