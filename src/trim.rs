//! Per-read primer trimming.
//!
//! The anchor primer marks the start of the target. The end is either a fixed
//! marker length past the anchor, or, for variable-length markers, the
//! position of the opposite primer found in the reverse complement of the
//! read. That search is heuristic: if the opposite primer also occurs inside
//! the target the read is cut short.

use std::ops::Range;

use crate::fastq::FastqRecord;
use crate::pattern::PrimerPatterns;
use crate::primer::PrimerRole;
use crate::reverse_complement_str;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimmedRead {
    pub sequence: String,
    pub quality: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimResult {
    pub identifier: String,
    /// `None` when the anchor primer was not found.
    pub trimmed: Option<TrimmedRead>,
}

impl TrimResult {
    /// Identifier and trimmed read, when the anchor matched and the window
    /// holds at least one base.
    pub fn into_window(self) -> Option<(String, TrimmedRead)> {
        match self.trimmed {
            Some(trimmed) if !trimmed.sequence.is_empty() => Some((self.identifier, trimmed)),
            _ => None,
        }
    }
}

/// Target window of `sequence` between the `anchor` primer and the marker end.
pub fn trim_window(
    sequence: &str,
    anchor: PrimerRole,
    patterns: &PrimerPatterns,
    marker_length: usize,
) -> Option<Range<usize>> {
    let start = patterns[anchor].find(sequence)?.end;

    let end = if marker_length == 0 {
        let rc = reverse_complement_str(sequence);
        match patterns[anchor.opposite()].find(&rc) {
            Some(m) => sequence.len() - m.end,
            None => sequence.len(),
        }
    } else {
        start.saturating_add(marker_length)
    };

    let end = end.min(sequence.len());
    Some(start..end.max(start))
}

pub fn trim_read(
    record: &FastqRecord,
    anchor: PrimerRole,
    patterns: &PrimerPatterns,
    marker_length: usize,
) -> TrimResult {
    let trimmed = trim_window(&record.sequence, anchor, patterns, marker_length).map(|window| TrimmedRead {
        sequence: record.sequence[window.clone()].to_string(),
        quality: record.quality[window].to_string(),
    });
    TrimResult {
        identifier: record.identifier().to_string(),
        trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primer::{ErrorBudget, PrimerSpec};

    fn patterns(forward: &str, reverse: &str, budget: ErrorBudget) -> PrimerPatterns {
        PrimerPatterns::compile(&PrimerSpec::new(forward, reverse, 0), &budget).unwrap()
    }

    fn record(sequence: &str) -> FastqRecord {
        let quality: String = (0..sequence.len())
            .map(|i| (b'!' + (i % 40) as u8) as char)
            .collect();
        FastqRecord::new("@read1 1:N:0".into(), sequence.into(), "+".into(), quality)
    }

    #[test]
    fn fixed_marker_length_cuts_after_anchor() {
        let p = patterns("AAAA", "CCCC", ErrorBudget::new(1, 1));
        let rec = record("GGAAAACCCC");
        let result = trim_read(&rec, PrimerRole::Forward, &p, 4);
        let trimmed = result.trimmed.unwrap();
        assert_eq!(trimmed.sequence, "CCCC");
        assert_eq!(trimmed.quality, &rec.quality[6..10]);
        assert_eq!(result.identifier, "@read1");
    }

    #[test]
    fn fixed_marker_length_of_ten() {
        let p = patterns("ACGTTG", "TTTTTT", ErrorBudget::default());
        let rec = record("XXXXACGTTGYYYYYYYYYYZZZ");
        let trimmed = trim_read(&rec, PrimerRole::Forward, &p, 10).trimmed.unwrap();
        assert_eq!(trimmed.sequence, "YYYYYYYYYY");
        assert_eq!(trimmed.quality.len(), 10);
    }

    #[test]
    fn marker_past_read_end_is_clamped() {
        let p = patterns("AAAA", "CCCC", ErrorBudget::default());
        let trimmed = trim_read(&record("AAAACGT"), PrimerRole::Forward, &p, 10).trimmed.unwrap();
        assert_eq!(trimmed.sequence, "CGT");
    }

    #[test]
    fn missing_anchor_is_unmatched() {
        let p = patterns("AAAA", "CCCC", ErrorBudget::default());
        let result = trim_read(&record("GGGGGGGG"), PrimerRole::Forward, &p, 4);
        assert!(result.trimmed.is_none());
        assert_eq!(result.into_window(), None);
    }

    #[test]
    fn variable_length_ends_at_opposite_primer() {
        // forward primer, target, reverse complement of the reverse primer, adapter
        let p = patterns("ACGTAC", "GGATCC", ErrorBudget::default());
        let read = format!("TT{}{}{}{}", "ACGTAC", "TTTTTTTTTT", reverse_complement_str("GGATCC"), "AAAA");
        let trimmed = trim_read(&record(&read), PrimerRole::Forward, &p, 0).trimmed.unwrap();
        assert_eq!(trimmed.sequence, "TTTTTTTTTT");
    }

    #[test]
    fn variable_length_without_opposite_keeps_remainder() {
        let p = patterns("ACGTAC", "GGATCC", ErrorBudget::default());
        let trimmed = trim_read(&record("ACGTACTTTTTTTT"), PrimerRole::Forward, &p, 0).trimmed.unwrap();
        assert_eq!(trimmed.sequence, "TTTTTTTT");
    }

    #[test]
    fn reverse_read_anchors_on_reverse_primer() {
        let p = patterns("ACGTAC", "GGATCC", ErrorBudget::default());
        let read = format!("{}{}{}", "GGATCC", "CCCCCC", reverse_complement_str("ACGTAC"));
        let trimmed = trim_read(&record(&read), PrimerRole::Reverse, &p, 0).trimmed.unwrap();
        assert_eq!(trimmed.sequence, "CCCCCC");
    }

    #[test]
    fn overlapping_opposite_primer_gives_empty_window() {
        // The opposite primer's reverse complement sits before the anchor end.
        let p = patterns("AAAA", "TTTT", ErrorBudget::default());
        let result = trim_read(&record("AAAAGG"), PrimerRole::Forward, &p, 0);
        assert_eq!(result.trimmed.as_ref().map(|t| t.sequence.as_str()), Some(""));
        assert_eq!(result.into_window(), None);
    }

    #[test]
    fn huge_marker_length_keeps_remainder() {
        let p = patterns("AAAA", "CCCC", ErrorBudget::default());
        let (identifier, trimmed) = trim_read(&record("AAAAGGT"), PrimerRole::Forward, &p, usize::MAX)
            .into_window()
            .unwrap();
        assert_eq!(identifier, "@read1");
        assert_eq!(trimmed.sequence, "GGT");
    }
}
