use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;


/// Failure reasons of the text extraction helpers.
///
/// The helpers never pick a fallback on their own, the command that calls them decides whether
/// a failure is fatal or replaced by a default.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("File not found: {0:?}")]
    FileNotFound(PathBuf),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `line` counts from 1.
    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow {
        line: usize,
        reason: String,
    },

    #[error("Unrecognized column layout with {0} columns")]
    UnrecognizedLayout(usize),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("No data found: {0}")]
    Empty(&'static str),
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;


/// Read the whole file, mapping a missing file to `ExtractError::FileNotFound`.
pub fn read_to_string(path: &(impl AsRef<Path> + ?Sized)) -> ExtractResult<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ExtractError::FileNotFound(path.to_path_buf()),
        _ => ExtractError::Io { path: path.to_path_buf(), source: e },
    })
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_file() {
        let ret = read_to_string("/this/file/does/not/exist");
        assert!(matches!(ret, Err(ExtractError::FileNotFound(_))));
    }
}
