//! Path indexing - stable `(directory, name)` keys for scanned files
//!
//! Format: `<directory>/<name>` where `directory` is the file's containing
//! directory relative to the scan root (always `/`-prefixed, `/` for the root
//! itself) and `name` is the file base name without its extension.
//!
//! Examples, for a scan root of `pages/`:
//! - `pages/index.toml` → `("/", "index")`
//! - `pages/news/item1.toml` → `("/news", "item1")`

use crate::{Error, Result};
use std::path::{Component, Path};

/// Addressing key shared by pages and documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexKey {
    pub directory: String,
    pub name: String,
}

impl IndexKey {
    /// Derive the key of `file`, which must live under `root`.
    ///
    /// Depends only on the two paths, never on file contents.
    pub fn from_path(root: &Path, file: &Path) -> Result<Self> {
        let containing = file.parent().unwrap_or(root);
        Ok(Self {
            directory: directory_for(root, containing)?,
            name: name_for(file)?,
        })
    }

    /// Split a lookup path into `(directory, name)` the same way files are indexed.
    ///
    /// A path without any `/` yields an empty directory, which never matches
    /// an indexed record.
    pub fn split(path: &str) -> Self {
        let (directory, name) = match path.rsplit_once('/') {
            Some(("", name)) => ("/", name),
            Some((directory, name)) => (directory, name),
            None => ("", path),
        };
        Self {
            directory: directory.to_string(),
            name: name.to_string(),
        }
    }

    /// Join a directory and name back into a virtual path
    pub fn join(directory: &str, name: &str) -> String {
        if directory.ends_with('/') {
            format!("{}{}", directory, name)
        } else {
            format!("{}/{}", directory, name)
        }
    }

    pub fn to_path_string(&self) -> String {
        Self::join(&self.directory, &self.name)
    }
}

impl std::fmt::Display for IndexKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}

/// Indexed directory of `containing` relative to `root`.
pub fn directory_for(root: &Path, containing: &Path) -> Result<String> {
    let relative = containing.strip_prefix(root).map_err(|_| {
        Error::InvalidPath(format!(
            "{} is not under {}",
            containing.display(),
            root.display()
        ))
    })?;

    let mut directory = String::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| Error::InvalidPath(format!("non UTF-8 path: {}", containing.display())))?;
                directory.push('/');
                directory.push_str(part);
            }
            Component::CurDir => {}
            _ => {
                return Err(Error::InvalidPath(format!(
                    "unexpected component in {}",
                    containing.display()
                )))
            }
        }
    }

    if directory.is_empty() {
        directory.push('/');
    }
    Ok(directory)
}

/// Indexed name of `file`: its base name with the final extension removed.
pub fn name_for(file: &Path) -> Result<String> {
    file.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidPath(format!("no usable file name: {}", file.display())))
}
