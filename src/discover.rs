//! Locate paired Illumina mate files under a run directory.
//!
//! Every sub-directory of the run directory is scanned for
//! `<sample>_..._R1_001.fastq.gz` and `<sample>_..._R2_001.fastq.gz`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::primer::PrimerRole;

const FORWARD_SUFFIX: &str = "R1_001.fastq.gz";
const REVERSE_SUFFIX: &str = "R2_001.fastq.gz";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplePair {
    pub sample: String,
    pub forward: PathBuf,
    pub reverse: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleInput {
    pub sample: String,
    pub directory: PathBuf,
    pub forward: Option<PathBuf>,
    pub reverse: Option<PathBuf>,
}

impl SampleInput {
    pub fn into_pair(self) -> Result<SamplePair> {
        match (self.forward, self.reverse) {
            (Some(forward), Some(reverse)) => Ok(SamplePair {
                sample: self.sample,
                forward,
                reverse,
            }),
            (Some(present), None) => Err(Error::MissingMateFile {
                sample: self.sample,
                present,
                missing: "reverse",
            }),
            (None, Some(present)) => Err(Error::MissingMateFile {
                sample: self.sample,
                present,
                missing: "forward",
            }),
            (None, None) => Err(Error::MissingMateFile {
                sample: self.sample,
                present: self.directory,
                missing: "forward or reverse",
            }),
        }
    }
}

/// Sample id: the file name up to its first `_`.
pub fn sample_name(file_name: &str) -> &str {
    file_name.split('_').next().unwrap_or(file_name)
}

/// Which mate a file name holds, if any.
pub fn mate_direction(file_name: &str) -> Option<PrimerRole> {
    if file_name.ends_with(FORWARD_SUFFIX) {
        Some(PrimerRole::Forward)
    } else if file_name.ends_with(REVERSE_SUFFIX) {
        Some(PrimerRole::Reverse)
    } else {
        None
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| Error::file_io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::file_io(dir, e))?;
    entries.sort();
    Ok(entries)
}

/// Mate files grouped per directory and sample, in directory then sample order.
pub fn discover_samples(root: &Path) -> Result<Vec<SampleInput>> {
    let mut inputs = Vec::new();
    for dir in sorted_entries(root)?.into_iter().filter(|p| p.is_dir()) {
        let mut samples: BTreeMap<String, SampleInput> = BTreeMap::new();
        for path in sorted_entries(&dir)? {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(direction) = mate_direction(file_name) else {
                continue;
            };
            let sample = sample_name(file_name).to_string();
            let input = samples.entry(sample.clone()).or_insert_with(|| SampleInput {
                sample,
                directory: dir.clone(),
                forward: None,
                reverse: None,
            });
            match direction {
                PrimerRole::Forward => input.forward = Some(path),
                PrimerRole::Reverse => input.reverse = Some(path),
            }
        }
        inputs.extend(samples.into_values());
    }
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn names_and_directions() {
        assert_eq!(sample_name("S12_S1_L001_R1_001.fastq.gz"), "S12");
        assert_eq!(sample_name("plain.fastq.gz"), "plain.fastq.gz");
        assert_eq!(mate_direction("S12_S1_L001_R1_001.fastq.gz"), Some(PrimerRole::Forward));
        assert_eq!(mate_direction("S12_S1_L001_R2_001.fastq.gz"), Some(PrimerRole::Reverse));
        assert_eq!(mate_direction("S12_S1_L001_R2_001.fastq"), None);
    }

    #[test]
    fn pairs_mates_and_reports_missing() {
        let root = tempfile::tempdir().unwrap();
        let run1 = root.path().join("run1");
        let run2 = root.path().join("run2");
        fs::create_dir(&run1).unwrap();
        fs::create_dir(&run2).unwrap();
        touch(&run1.join("A_S1_L001_R1_001.fastq.gz"));
        touch(&run1.join("A_S1_L001_R2_001.fastq.gz"));
        touch(&run1.join("notes.txt"));
        touch(&run2.join("B_S2_L001_R1_001.fastq.gz"));
        touch(&root.path().join("C_S3_L001_R1_001.fastq.gz"));

        let inputs = discover_samples(root.path()).unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].sample, "A");
        assert_eq!(inputs[1].sample, "B");

        let pair = inputs[0].clone().into_pair().unwrap();
        assert!(pair.forward.ends_with("A_S1_L001_R1_001.fastq.gz"));
        assert!(pair.reverse.ends_with("A_S1_L001_R2_001.fastq.gz"));

        match inputs[1].clone().into_pair() {
            Err(Error::MissingMateFile { sample, missing, .. }) => {
                assert_eq!(sample, "B");
                assert_eq!(missing, "reverse");
            }
            other => panic!("expected MissingMateFile, got {:?}", other),
        }
    }
}
