//! Named primer sets.
//!
//! The registry starts from a built-in table and can be persisted as a
//! tab-separated file with the columns `Primer Set`, `For Seq`, `Rev Seq`
//! and `Length`. A length of 0 marks a variable-length marker.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pattern::alternatives;

// Snyder et al. 2019, "Invasive species in bait and pond stores".
const BUILTIN: &[(&str, &str, &str, usize)] = &[
    ("ACTSPART-2", "TNACNTTCCGN", "CNCCAATTCAN", 53),
    ("MIFISHPART-2", "TCGTGCCAGCN", "TCCCAGTTTGN", 0),
    ("ACTLPART-2", "GMTCHATYCCN", "CNCCAATTCAN", 150),
    ("GOBIPART-2", "TWAAAATYGCN", "ACRTCWCGRCN", 165),
    ("CYPPART-2", "CYCTHCTAGGN", "CYCCRTTRGCN", 134),
    ("CYPCOMPLETE", "TGATGAAAYTTYGGMTCYCTHCTAGG", "AARAAGAATGATGCYCCRTTRGC", 136),
    ("GOBICOMPLETE", "AACVCAYCCVCTVCTWAAAATYGC", "AGYCANCCRAARTTWACRTCWCGRC", 165),
    ("MIFISHPART", "TCGTGCCAGC", "TCCCAGTTTG", 0),
    ("ACTLPART", "GMTCHATYCC", "CNCCAATTCA", 152),
    ("GOBIPART", "TWAAAATYGC", "ACRTCWCGRC", 167),
    ("CYPPART", "CYCTHCTAGG", "CYCCRTTRGC", 136),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimerSet {
    #[serde(rename = "Primer Set")]
    pub name: String,
    #[serde(rename = "For Seq")]
    pub forward: String,
    #[serde(rename = "Rev Seq")]
    pub reverse: String,
    #[serde(rename = "Length")]
    pub marker_length: usize,
}

impl PrimerSet {
    pub fn new(name: &str, forward: &str, reverse: &str, marker_length: usize) -> Self {
        PrimerSet {
            name: name.to_ascii_uppercase(),
            forward: forward.to_ascii_uppercase(),
            reverse: reverse.to_ascii_uppercase(),
            marker_length,
        }
    }

}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimerRegistry {
    sets: Vec<PrimerSet>,
}

impl PrimerRegistry {
    pub fn builtin() -> Self {
        PrimerRegistry {
            sets: BUILTIN
                .iter()
                .map(|&(name, forward, reverse, length)| PrimerSet::new(name, forward, reverse, length))
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(b'\t')
            .from_path(path)?;
        let mut registry = PrimerRegistry::default();
        for row in rdr.deserialize() {
            let set: PrimerSet = row?;
            registry.add(PrimerSet::new(&set.name, &set.forward, &set.reverse, set.marker_length))?;
        }
        Ok(registry)
    }

    /// Load `path` when it exists, otherwise fall back to the built-in table.
    pub fn load_or_builtin(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading primer sets from {}", path.display());
            Self::load(path)
        } else {
            Ok(Self::builtin())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?;
        for set in &self.sets {
            wtr.serialize(set)?;
        }
        wtr.flush().map_err(|e| Error::file_io(path, e))?;
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&PrimerSet> {
        self.sets.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn resolve(&self, name: &str) -> Result<&PrimerSet> {
        self.lookup(name)
            .ok_or_else(|| Error::UnresolvedPrimerSet(name.to_ascii_uppercase()))
    }

    pub fn add(&mut self, set: PrimerSet) -> Result<()> {
        if self.lookup(&set.name).is_some() {
            return Err(Error::DuplicatePrimerSet(set.name));
        }
        alternatives(&set.forward, 0)?;
        alternatives(&set.reverse, 0)?;
        self.sets.push(set);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<PrimerSet> {
        match self.sets.iter().position(|s| s.name.eq_ignore_ascii_case(name)) {
            Some(index) => Ok(self.sets.remove(index)),
            None => Err(Error::UnresolvedPrimerSet(name.to_ascii_uppercase())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrimerSet> {
        self.sets.iter()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
