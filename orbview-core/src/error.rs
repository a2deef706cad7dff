//! Errors produced while loading mesh data.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The attribute pool a face element refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Position,
    TexCoord,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Position => f.write_str("position"),
            Attribute::TexCoord => f.write_str("texture coordinate"),
            Attribute::Normal => f.write_str("normal"),
        }
    }
}

/// Failure while reading or interpreting an OBJ file.
#[derive(Debug, Error)]
pub enum ObjError {
    #[error("failed to open OBJ file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read OBJ data: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: malformed `{keyword}` directive: {message}")]
    Parse {
        line: usize,
        keyword: String,
        message: String,
    },
    #[error("line {line}: {attribute} index {index} is out of range ({declared} declared so far)")]
    OutOfRange {
        line: usize,
        attribute: Attribute,
        index: i64,
        declared: usize,
    },
    #[error("mesh has more than {} vertices", u32::MAX)]
    TooManyVertices,
}

impl ObjError {
    /// True when the error came from the filesystem rather than the file contents.
    pub fn is_io(&self) -> bool {
        matches!(self, ObjError::Open { .. } | ObjError::Io(_))
    }
}
