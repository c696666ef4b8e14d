//! Error-tolerant primer patterns.
//!
//! A primer literal is expanded into a regex alternation: one alternative per
//! set of mismatch positions (every subset of size `0..=k`). A mismatch slot
//! accepts any base including `N`, an IUPAC ambiguity code accepts its base
//! set and a plain base accepts only itself. Only substitutions are
//! tolerated; every alternative has the primer's length.

use std::collections::HashSet;
use std::ops::{Index, Range};

use itertools::Itertools;
use log::debug;
use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};
use crate::primer::{ErrorBudget, PrimerRole, PrimerSpec};

/// Class used for a position chosen as a mismatch slot.
pub const MISMATCH_CLASS: &str = "[ACTGN]";

// Large primers with several mismatches produce thousands of alternatives.
const REGEX_SIZE_LIMIT: usize = 1 << 28;

/// IUPAC ambiguity code to the character class of bases it stands for.
pub fn iupac_class(base: u8) -> Option<&'static str> {
    let class = match base {
        b'R' => "[AG]",
        b'Y' => "[CT]",
        b'S' => "[GC]",
        b'W' => "[AT]",
        b'K' => "[GT]",
        b'M' => "[AC]",
        b'B' => "[CGT]",
        b'D' => "[AGT]",
        b'H' => "[ACT]",
        b'V' => "[ACG]",
        b'N' => "[ATCG]",
        _ => return None,
    };
    Some(class)
}

fn check_alphabet(literal: &str) -> Result<()> {
    for (position, base) in literal.bytes().enumerate() {
        let known = matches!(base, b'A' | b'C' | b'G' | b'T') || iupac_class(base).is_some();
        if !known {
            return Err(Error::InvalidPrimerAlphabet {
                primer: literal.to_string(),
                base: base as char,
                position,
            });
        }
    }
    Ok(())
}

fn translate(base: u8) -> String {
    match iupac_class(base) {
        Some(class) => class.to_string(),
        None => (base as char).to_string(),
    }
}

fn render(literal: &[u8], mismatches: &[usize]) -> String {
    let mut out = String::with_capacity(literal.len() * 4);
    for (position, &base) in literal.iter().enumerate() {
        if mismatches.contains(&position) {
            out.push_str(MISMATCH_CLASS);
        } else {
            out.push_str(&translate(base));
        }
    }
    out
}

/// Distinct alternatives grouped by the number of mismatch slots they
/// carry: tier `i` holds every alternative with exactly `i` slots.
///
/// With a budget of 0 there is a single tier holding the IUPAC-translated
/// literal.
pub fn tiered_alternatives(literal: &str, max_mismatches: usize) -> Result<Vec<Vec<String>>> {
    let literal = literal.to_ascii_uppercase();
    check_alphabet(&literal)?;
    let bases = literal.as_bytes();

    if max_mismatches == 0 {
        return Ok(vec![vec![render(bases, &[])]]);
    }

    let mut seen = HashSet::new();
    let mut tiers = Vec::new();
    for k in 0..=max_mismatches.min(bases.len()) {
        let mut tier = Vec::new();
        for mask in (0..bases.len()).combinations(k) {
            let alternative = render(bases, &mask);
            if seen.insert(alternative.clone()) {
                tier.push(alternative);
            }
        }
        tiers.push(tier);
    }
    Ok(tiers)
}

/// All distinct alternatives for `literal` tolerating up to `max_mismatches`
/// substitutions.
pub fn alternatives(literal: &str, max_mismatches: usize) -> Result<Vec<String>> {
    Ok(tiered_alternatives(literal, max_mismatches)?
        .into_iter()
        .flatten()
        .collect())
}

/// Non-capturing alternation of [`alternatives`], suitable for embedding.
pub fn alternation(literal: &str, max_mismatches: usize) -> Result<String> {
    Ok(format!("(?:{})", alternatives(literal, max_mismatches)?.join("|")))
}

pub(crate) fn build_regex(pattern: &str) -> Result<Regex> {
    let regex = RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .dfa_size_limit(REGEX_SIZE_LIMIT)
        .build()?;
    Ok(regex)
}

/// A primer compiled into a searchable matcher.
///
/// Searching prefers the fewest mismatches: the earliest exact occurrence
/// wins over an earlier occurrence with one substitution, and so on.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    literal: String,
    tiers: Vec<Regex>,
}

impl CompiledPattern {
    pub fn compile(literal: &str, max_mismatches: usize) -> Result<Self> {
        let tiers = tiered_alternatives(literal, max_mismatches)?;
        let alternatives: usize = tiers.iter().map(Vec::len).sum();
        debug!(
            "Compiled primer {} with {} mismatches into {} alternatives",
            literal, max_mismatches, alternatives
        );
        let tiers = tiers
            .iter()
            .filter(|tier| !tier.is_empty())
            .map(|tier| build_regex(&format!("(?:{})", tier.join("|"))))
            .collect::<Result<Vec<_>>>()?;
        Ok(CompiledPattern {
            literal: literal.to_ascii_uppercase(),
            tiers,
        })
    }

    /// Byte range of the earliest occurrence with the fewest mismatches.
    pub fn find(&self, sequence: &str) -> Option<Range<usize>> {
        self.tiers
            .iter()
            .find_map(|tier| tier.find(sequence))
            .map(|m| m.range())
    }

    pub fn is_match(&self, sequence: &str) -> bool {
        self.tiers.iter().any(|tier| tier.is_match(sequence))
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

}

/// Compiled forward and reverse primers for one run.
#[derive(Debug, Clone)]
pub struct PrimerPatterns {
    forward: CompiledPattern,
    reverse: CompiledPattern,
}

impl PrimerPatterns {
    pub fn compile(spec: &PrimerSpec, budget: &ErrorBudget) -> Result<Self> {
        Ok(PrimerPatterns {
            forward: CompiledPattern::compile(spec.literal(PrimerRole::Forward), budget.get(PrimerRole::Forward))?,
            reverse: CompiledPattern::compile(spec.literal(PrimerRole::Reverse), budget.get(PrimerRole::Reverse))?,
        })
    }

    pub fn get(&self, role: PrimerRole) -> &CompiledPattern {
        match role {
            PrimerRole::Forward => &self.forward,
            PrimerRole::Reverse => &self.reverse,
        }
    }
}

impl Index<PrimerRole> for PrimerPatterns {
    type Output = CompiledPattern;

    fn index(&self, role: PrimerRole) -> &CompiledPattern {
        self.get(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const READ_BASES: [u8; 5] = [b'A', b'C', b'G', b'T', b'N'];
    const LITERAL_BASES: &[u8] = b"ACGTACGTACGTRYSWKMBDHVN";

    fn members(code: u8) -> &'static [u8] {
        match code {
            b'A' => b"A",
            b'C' => b"C",
            b'G' => b"G",
            b'T' => b"T",
            b'R' => b"AG",
            b'Y' => b"CT",
            b'S' => b"GC",
            b'W' => b"AT",
            b'K' => b"GT",
            b'M' => b"AC",
            b'B' => b"CGT",
            b'D' => b"AGT",
            b'H' => b"ACT",
            b'V' => b"ACG",
            b'N' => b"ACGT",
            _ => unreachable!(),
        }
    }

    // Bases in a code's set everywhere except `positions`, which get a base
    // outside it.
    fn sample_read(literal: &[u8], positions: &[usize], rng: &mut StdRng) -> String {
        let out: Vec<u8> = literal
            .iter()
            .enumerate()
            .map(|(i, &code)| {
                let set = members(code);
                if positions.contains(&i) {
                    let outside: Vec<u8> = READ_BASES.iter().copied().filter(|b| !set.contains(b)).collect();
                    outside[rng.gen_range(0..outside.len())]
                } else {
                    set[rng.gen_range(0..set.len())]
                }
            })
            .collect();
        String::from_utf8(out).unwrap()
    }

    fn random_literal(len: usize, rng: &mut StdRng) -> Vec<u8> {
        (0..len).map(|_| LITERAL_BASES[rng.gen_range(0..LITERAL_BASES.len())]).collect()
    }

    fn distinct_positions(len: usize, n: usize, rng: &mut StdRng) -> Vec<usize> {
        let mut positions: Vec<usize> = (0..len).collect();
        for i in 0..n {
            let j = rng.gen_range(i..len);
            positions.swap(i, j);
        }
        positions.truncate(n);
        positions
    }

    #[test]
    fn zero_budget_is_single_translated_literal() {
        let alts = alternatives("GMTCHATYCC", 0).unwrap();
        assert_eq!(alts, vec!["G[AC]TC[ACT]AT[CT]CC".to_string()]);
    }

    #[test]
    fn one_mismatch_has_literal_plus_each_position() {
        let alts = alternatives("ACGT", 1).unwrap();
        assert_eq!(alts.len(), 5);
        assert_eq!(alts[0], "ACGT");
        assert!(alts.contains(&"[ACTGN]CGT".to_string()));
        assert!(alts.contains(&"ACG[ACTGN]".to_string()));
    }

    #[test]
    fn alternative_count_is_sum_of_binomials() {
        // 1 + 10 + 45
        assert_eq!(alternatives("ACGTACGTAC", 2).unwrap().len(), 56);
    }

    #[test]
    fn budget_larger_than_primer_is_capped() {
        let alts = alternatives("AC", 5).unwrap();
        assert_eq!(alts.len(), 4);
        assert!(alts.contains(&"[ACTGN][ACTGN]".to_string()));
    }

    #[test]
    fn lowercase_literal_is_accepted() {
        let p = CompiledPattern::compile("acgt", 0).unwrap();
        assert_eq!(p.literal(), "ACGT");
        assert!(p.is_match("TTACGTTT"));
    }

    #[test]
    fn unsupported_base_is_rejected() {
        match CompiledPattern::compile("ACXT", 1) {
            Err(Error::InvalidPrimerAlphabet { base, position, .. }) => {
                assert_eq!(base, 'X');
                assert_eq!(position, 2);
            }
            other => panic!("expected InvalidPrimerAlphabet, got {:?}", other),
        }
    }

    #[test]
    fn zero_budget_matches_iupac_expansion_only() {
        let p = CompiledPattern::compile("ARN", 0).unwrap();
        for s in ["AAA", "AGC", "AGT", "AAG"] {
            assert!(p.is_match(s), "{s}");
        }
        for s in ["ACA", "TAA", "AAN", "ATG"] {
            assert!(!p.is_match(s), "{s}");
        }
    }

    #[test]
    fn mismatch_slot_accepts_n() {
        let p = CompiledPattern::compile("ACGT", 1).unwrap();
        assert!(p.is_match("ACNT"));
        assert!(!p.is_match("ANNT"));
    }

    #[test]
    fn find_prefers_exact_over_earlier_mismatch() {
        let p = CompiledPattern::compile("AAAA", 1).unwrap();
        // "GAAA" at 1 is within budget but the exact hit at 2 wins.
        assert_eq!(p.find("GGAAAACCCC"), Some(2..6));
        assert_eq!(p.find("GAAATTAAAA"), Some(6..10));
        assert_eq!(p.find("GAAATTCCCC"), Some(0..4));
        assert_eq!(p.find("GGGGGGGG"), None);
    }

    #[test]
    fn tiers_group_by_mismatch_count() {
        let tiers = tiered_alternatives("ACG", 2).unwrap();
        assert_eq!(tiers.iter().map(Vec::len).collect::<Vec<_>>(), vec![1, 3, 3]);
    }

    #[test]
    fn iupac_positions_accept_their_set_with_mismatch_budget() {
        let p = CompiledPattern::compile("ARYN", 1).unwrap();
        assert_eq!(p.find("AGCT"), Some(0..4));
        assert_eq!(p.find("AATA"), Some(0..4));
        // one position outside its set
        assert_eq!(p.find("ACCG"), Some(0..4));
        // two positions outside their sets
        assert!(!p.is_match("ACGN"));
    }

    #[test]
    fn fuzz_within_budget_matches() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let len = rng.gen_range(4..12);
            let k = rng.gen_range(0..3);
            let literal = random_literal(len, &mut rng);
            let pattern = CompiledPattern::compile(std::str::from_utf8(&literal).unwrap(), k).unwrap();
            let n = rng.gen_range(0..=k);
            let positions = distinct_positions(len, n, &mut rng);
            let read = sample_read(&literal, &positions, &mut rng);
            assert_eq!(pattern.find(&read), Some(0..len), "{read} vs {:?}", pattern.literal());
        }
    }

    #[test]
    fn fuzz_over_budget_does_not_match() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let len = rng.gen_range(5..12);
            let k = rng.gen_range(0..3);
            let literal = random_literal(len, &mut rng);
            let pattern = CompiledPattern::compile(std::str::from_utf8(&literal).unwrap(), k).unwrap();
            let positions = distinct_positions(len, k + 1, &mut rng);
            let read = sample_read(&literal, &positions, &mut rng);
            assert!(!pattern.is_match(&read), "{read} vs {:?}", pattern.literal());
        }
    }

    #[test]
    fn patterns_are_indexed_by_role() {
        let spec = PrimerSpec::new("AAAA", "CCCC", 4);
        let patterns = PrimerPatterns::compile(&spec, &ErrorBudget::new(1, 0)).unwrap();
        assert_eq!(patterns[PrimerRole::Forward].literal(), "AAAA");
        assert_eq!(patterns[PrimerRole::Reverse].find("GGCCCG"), None);
        assert_eq!(patterns[PrimerRole::Forward].find("GGAAGA"), Some(2..6));
    }
}
