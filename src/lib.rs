// lib.rs - amplicon primer trimming

pub mod config;
pub mod discover;
pub mod error;
pub mod fastq;
pub mod pairing;
pub mod pattern;
pub mod primer;
pub mod registry;
pub mod run;
pub mod spacer;
pub mod summary;
pub mod trim;

pub use config::{PrimerChoice, RunConfig, RunContext};
pub use error::{Error, Result};
pub use pattern::{CompiledPattern, PrimerPatterns};
pub use primer::{ErrorBudget, PrimerRole, PrimerSpec};
pub use registry::{PrimerRegistry, PrimerSet};
pub use trim::{trim_read, TrimResult};

/// Reverse complement of a read sequence.
///
/// A/T and G/C are swapped, input is upper-cased first and anything else
/// becomes N.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|b| match b.to_ascii_uppercase() {
        b'A' => b'T',
        b'T' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        _    => b'N',
    }).collect()
}

/// [`reverse_complement`] for sequences held as `str`.
pub fn reverse_complement_str(seq: &str) -> String {
    reverse_complement(seq.as_bytes()).into_iter().map(char::from).collect()
}
