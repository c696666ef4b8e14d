use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Primer \"{primer}\" contains unsupported base '{base}' at position {position}")]
    InvalidPrimerAlphabet {
        primer: String,
        base: char,
        position: usize,
    },

    #[error("Primer set \"{0}\" is not in the primer set list")]
    UnresolvedPrimerSet(String),

    #[error("Primer set OTHER needs an explicit {0} primer sequence")]
    MissingPrimerLiteral(crate::primer::PrimerRole),

    #[error("Primer set OTHER needs an explicit marker length (0 for variable)")]
    MissingMarkerLength,

    #[error("Primer set \"{0}\" is already in the primer set list")]
    DuplicatePrimerSet(String),

    #[error("Sample {sample} has {present:?} but no {missing} mate file")]
    MissingMateFile {
        sample: String,
        present: PathBuf,
        missing: &'static str,
    },

    #[error("Malformed record on line {line} in {origin}: {reason}")]
    MalformedRecord {
        origin: String,
        line: usize,
        reason: &'static str,
    },

    #[error("Marker length is variable; a minimum trimmed length must be supplied")]
    MissingCutoff,

    #[error("Error reading or writing \"{file}\": {source}")]
    FileIo {
        file: String,
        source: std::io::Error,
    },

    #[error("Error reading or writing bytes: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error reading or writing primer set table: {0}")]
    Registry(#[from] csv::Error),

    #[error("Error building primer pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    pub(crate) fn file_io(file: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Error::FileIo {
            file: file.as_ref().display().to_string(),
            source,
        }
    }
}
