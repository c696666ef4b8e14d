//! Spacer-insert classification used to reject index-hopped reads.
//!
//! Libraries built with the four Klymus et al. spacer inserts carry one of
//! four fixed 4-mers at the very start of every read. A sample's dominant
//! spacer is found by a vote over its first reads; reads that start with a
//! different spacer are treated as index hops.

use std::fmt;
use std::io::BufRead;

use log::info;
use regex::Regex;

use crate::error::Result;
use crate::fastq::FastqReader;
use crate::pattern::{alternation, build_regex};
use crate::primer::PrimerRole;

/// Number of leading records inspected by [`classify_sample`].
pub const SPACER_SAMPLE_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpacerVariant {
    E,
    F,
    G,
    H,
}

impl SpacerVariant {
    /// Declaration order, also the tie-break order of a vote.
    pub const ALL: [SpacerVariant; 4] = [SpacerVariant::E, SpacerVariant::F, SpacerVariant::G, SpacerVariant::H];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn literal(self, direction: PrimerRole) -> &'static str {
        match direction {
            PrimerRole::Forward => match self {
                SpacerVariant::E => "TCCT",
                SpacerVariant::F => "ATGC",
                SpacerVariant::G => "CGAG",
                SpacerVariant::H => "GATA",
            },
            PrimerRole::Reverse => match self {
                SpacerVariant::E => "CGTA",
                SpacerVariant::F => "TCAC",
                SpacerVariant::G => "GAGT",
                SpacerVariant::H => "ATCG",
            },
        }
    }
}

impl fmt::Display for SpacerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpacerVariant::E => "e",
            SpacerVariant::F => "f",
            SpacerVariant::G => "g",
            SpacerVariant::H => "h",
        };
        write!(f, "{}", name)
    }
}

/// Prefix matcher for one spacer: the exact 4-mer or any single position
/// replaced by a wildcard.
#[derive(Debug, Clone)]
pub struct SpacerMatcher {
    variant: SpacerVariant,
    regex: Regex,
}

impl SpacerMatcher {
    pub fn new(variant: SpacerVariant, direction: PrimerRole) -> Result<Self> {
        let pattern = format!("^{}", alternation(variant.literal(direction), 1)?);
        Ok(SpacerMatcher {
            variant,
            regex: build_regex(&pattern)?,
        })
    }

    pub fn variant(&self) -> SpacerVariant {
        self.variant
    }

    /// Whether `sequence` begins with this spacer.
    pub fn matches_start(&self, sequence: &str) -> bool {
        self.regex.is_match(sequence)
    }
}

/// Prefix matchers for all four variants of one read direction.
#[derive(Debug, Clone)]
pub struct SpacerTable {
    direction: PrimerRole,
    matchers: Vec<SpacerMatcher>,
}

impl SpacerTable {
    pub fn new(direction: PrimerRole) -> Result<Self> {
        let matchers = SpacerVariant::ALL
            .iter()
            .map(|&v| SpacerMatcher::new(v, direction))
            .collect::<Result<Vec<_>>>()?;
        Ok(SpacerTable { direction, matchers })
    }

    pub fn direction(&self) -> PrimerRole {
        self.direction
    }

    pub fn matcher(&self, variant: SpacerVariant) -> &SpacerMatcher {
        &self.matchers[variant.index()]
    }

    /// Variants whose spacer starts `sequence`; a read may match several.
    pub fn matching<'a>(&'a self, sequence: &'a str) -> impl Iterator<Item = SpacerVariant> + 'a {
        self.matchers
            .iter()
            .filter(move |m| m.matches_start(sequence))
            .map(SpacerMatcher::variant)
    }
}

/// Spacer tables for both read directions, built once per run.
#[derive(Debug, Clone)]
pub struct SpacerTables {
    forward: SpacerTable,
    reverse: SpacerTable,
}

impl SpacerTables {
    pub fn new() -> Result<Self> {
        Ok(SpacerTables {
            forward: SpacerTable::new(PrimerRole::Forward)?,
            reverse: SpacerTable::new(PrimerRole::Reverse)?,
        })
    }

    pub fn get(&self, direction: PrimerRole) -> &SpacerTable {
        match direction {
            PrimerRole::Forward => &self.forward,
            PrimerRole::Reverse => &self.reverse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpacerVote {
    pub counts: [usize; 4],
    pub sampled: usize,
    pub chosen: SpacerVariant,
}

impl SpacerVote {
    /// Tally of variant hits. Ties go to the earliest variant in `e, f, g, h`.
    pub fn from_counts(counts: [usize; 4], sampled: usize) -> Self {
        let mut chosen = SpacerVariant::E;
        for variant in SpacerVariant::ALL {
            if counts[variant.index()] > counts[chosen.index()] {
                chosen = variant;
            }
        }
        SpacerVote { counts, sampled, chosen }
    }

    pub fn count(&self, variant: SpacerVariant) -> usize {
        self.counts[variant.index()]
    }
}

/// Vote on the dominant spacer over at most [`SPACER_SAMPLE_SIZE`] records.
///
/// The reader is consumed; callers reopen the file for the full pass.
pub fn classify_sample<R: BufRead>(reader: &mut FastqReader<R>, table: &SpacerTable) -> Result<SpacerVote> {
    let mut counts = [0usize; 4];
    let mut sampled = 0;
    while sampled < SPACER_SAMPLE_SIZE {
        let Some(record) = reader.read_record()? else {
            break;
        };
        sampled += 1;
        for variant in table.matching(&record.sequence) {
            counts[variant.index()] += 1;
        }
    }

    let vote = SpacerVote::from_counts(counts, sampled);
    info!(
        "Spacer counts in first {} {} reads of {}: e={} f={} g={} h={}; chose {}",
        sampled,
        table.direction(),
        reader.origin(),
        counts[0],
        counts[1],
        counts[2],
        counts[3],
        vote.chosen
    );
    Ok(vote)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fastq(sequences: &[&str]) -> String {
        let mut out = String::new();
        for (i, s) in sequences.iter().enumerate() {
            out.push_str(&format!("@r{}\n{}\n+\n{}\n", i, s, "I".repeat(s.len())));
        }
        out
    }

    #[test]
    fn spacer_matches_exact_and_single_wildcard_at_start_only() {
        let m = SpacerMatcher::new(SpacerVariant::E, PrimerRole::Forward).unwrap();
        assert!(m.matches_start("TCCTAAAA"));
        assert!(m.matches_start("NCCTAAAA"));
        assert!(m.matches_start("TCGTAAAA"));
        assert!(!m.matches_start("TGGTAAAA"));
        assert!(!m.matches_start("AATCCTAA"));
    }

    #[test]
    fn tie_goes_to_first_variant() {
        assert_eq!(SpacerVote::from_counts([0, 5, 5, 1], 11).chosen, SpacerVariant::F);
        assert_eq!(SpacerVote::from_counts([0, 0, 0, 0], 0).chosen, SpacerVariant::E);
    }

    #[test]
    fn majority_wins() {
        let vote = SpacerVote::from_counts([900, 50, 30, 20], 1000);
        assert_eq!(vote.chosen, SpacerVariant::E);
        assert_eq!(vote.count(SpacerVariant::G), 30);
        assert_eq!(SpacerVote::from_counts([1, 2, 30, 20], 53).chosen, SpacerVariant::G);
    }

    #[test]
    fn classify_counts_reverse_spacers() {
        let table = SpacerTable::new(PrimerRole::Reverse).unwrap();
        let text = fastq(&["TCACGGGG", "TCACGGGG", "CGTAGGGG", "GGGGGGGG"]);
        let mut reader = FastqReader::new(text.as_bytes(), "test");
        let vote = classify_sample(&mut reader, &table).unwrap();
        assert_eq!(vote.sampled, 4);
        assert_eq!(vote.chosen, SpacerVariant::F);
        assert_eq!(vote.count(SpacerVariant::F), 2);
    }

    #[test]
    fn classify_stops_after_sample_size() {
        let table = SpacerTable::new(PrimerRole::Forward).unwrap();
        let sequences: Vec<&str> = std::iter::repeat("GATAAAAA").take(SPACER_SAMPLE_SIZE + 5).collect();
        let text = fastq(&sequences);
        let mut reader = FastqReader::new(text.as_bytes(), "test");
        let vote = classify_sample(&mut reader, &table).unwrap();
        assert_eq!(vote.sampled, SPACER_SAMPLE_SIZE);
        assert_eq!(vote.chosen, SpacerVariant::H);
        assert!(reader.next().is_some());
    }

    #[test]
    fn classification_is_deterministic() {
        let table = SpacerTable::new(PrimerRole::Forward).unwrap();
        let text = fastq(&["ATGCAA", "CGAGAA", "ATGCTT", "CGAGTT"]);
        let first = classify_sample(&mut FastqReader::new(text.as_bytes(), "a"), &table).unwrap();
        let second = classify_sample(&mut FastqReader::new(text.as_bytes(), "b"), &table).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.chosen, SpacerVariant::F);
    }
}
