//! Forward/reverse pairing of trimmed reads for one sample.
//!
//! The forward file is consumed first and every trimmed forward read above
//! the cutoff is kept in memory, keyed by identifier. The reverse pass then
//! writes a pair for each reverse read whose mate was kept and which clears
//! the cutoff itself.

use std::collections::{HashMap, HashSet};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::RunContext;
use crate::error::{Error, Result};
use crate::fastq::{create_writer, open_reader, FastqReader, FastqRecord};
use crate::primer::PrimerRole;
use crate::spacer::{classify_sample, SpacerMatcher};
use crate::trim::trim_read;

const PROGRESS_INTERVAL: usize = 10_000;

/// Trimmed reads must be strictly longer than this to be kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortReadCutoff(f64);

impl ShortReadCutoff {
    /// Markers over 125 bp use 100; other fixed lengths use three quarters of
    /// the marker. Variable markers have no default. An explicit value always
    /// wins.
    pub fn resolve(marker_length: usize, explicit: Option<f64>) -> Result<Self> {
        if let Some(value) = explicit {
            return Ok(ShortReadCutoff(value));
        }
        match marker_length {
            0 => Err(Error::MissingCutoff),
            len if len > 125 => Ok(ShortReadCutoff(100.0)),
            len => Ok(ShortReadCutoff(len as f64 * 0.75)),
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn admits(&self, length: usize) -> bool {
        length as f64 > self.0
    }
}

/// One row of the trim summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSummary {
    pub sample: String,
    /// Raw records in the reverse file.
    pub reads: usize,
    pub forward_trimmed: usize,
    pub reverse_trimmed: usize,
    pub paired: usize,
    pub short: usize,
    /// `(correct, incorrect)` spacer combinations when spacer filtering ran.
    pub spacer_combos: Option<(usize, usize)>,
}

impl SampleSummary {
    pub fn to_record(&self) -> Vec<String> {
        let mut row = vec![
            self.sample.clone(),
            self.reads.to_string(),
            self.forward_trimmed.to_string(),
            self.reverse_trimmed.to_string(),
            self.paired.to_string(),
            self.short.to_string(),
        ];
        if let Some((correct, incorrect)) = self.spacer_combos {
            row.push(correct.to_string());
            row.push(incorrect.to_string());
        }
        row
    }
}

/// Per-sample counters.
#[derive(Debug, Default)]
pub struct SampleAccumulator {
    pub raw_forward: usize,
    pub raw_reverse: usize,
    pub forward_trimmed: usize,
    pub reverse_trimmed: usize,
    pub paired: usize,
    pub short: usize,
    correct_spacer: Option<HashSet<String>>,
}

impl SampleAccumulator {
    pub fn new(spacers: bool) -> Self {
        SampleAccumulator {
            correct_spacer: spacers.then(HashSet::new),
            ..Default::default()
        }
    }

    fn mark_correct(&mut self, identifier: &str) {
        if let Some(ids) = self.correct_spacer.as_mut() {
            ids.insert(identifier.to_string());
        }
    }

    fn mark_incorrect(&mut self, identifier: &str) {
        if let Some(ids) = self.correct_spacer.as_mut() {
            ids.remove(identifier);
        }
    }

    pub fn finalize(self, sample: &str) -> SampleSummary {
        let reads = self.raw_reverse;
        SampleSummary {
            sample: sample.to_string(),
            reads,
            forward_trimmed: self.forward_trimmed,
            reverse_trimmed: self.reverse_trimmed,
            paired: self.paired,
            short: self.short,
            spacer_combos: self.correct_spacer.map(|ids| (ids.len(), reads.saturating_sub(ids.len()))),
        }
    }
}

/// Processing of one sample before its forward file has been read.
pub struct PairingEngine<'a> {
    ctx: &'a RunContext,
    sample: String,
}

/// A sample whose forward pass is complete.
pub struct ForwardPassed<'a> {
    ctx: &'a RunContext,
    sample: String,
    mates: HashMap<String, FastqRecord>,
    acc: SampleAccumulator,
}

impl<'a> PairingEngine<'a> {
    pub fn new(ctx: &'a RunContext, sample: impl Into<String>) -> Self {
        PairingEngine {
            ctx,
            sample: sample.into(),
        }
    }

    /// Trim every forward record. With `spacer` set, records that do not start
    /// with it are dropped before trimming.
    pub fn forward_pass<R: BufRead>(
        self,
        reader: &mut FastqReader<R>,
        spacer: Option<&SpacerMatcher>,
    ) -> Result<ForwardPassed<'a>> {
        let ctx = self.ctx;
        let mut acc = SampleAccumulator::new(spacer.is_some());
        let mut mates = HashMap::new();

        info!("Trimming primers sample {} forward", self.sample);
        for record in reader.by_ref() {
            let record = record?;
            acc.raw_forward += 1;
            if acc.raw_forward % PROGRESS_INTERVAL == 0 {
                debug!("Read: {}", acc.raw_forward);
            }
            if spacer.is_some_and(|s| !s.matches_start(&record.sequence)) {
                continue;
            }

            let window = trim_read(&record, PrimerRole::Forward, &ctx.patterns, ctx.marker_length()).into_window();
            let Some((identifier, trimmed)) = window else {
                continue;
            };
            acc.forward_trimmed += 1;
            if ctx.cutoff.admits(trimmed.sequence.len()) {
                acc.mark_correct(&identifier);
                let kept = FastqRecord::new(record.header, trimmed.sequence, "+".to_string(), trimmed.quality);
                mates.insert(identifier, kept);
            }
        }
        info!("{} total raw forward reads", acc.raw_forward);

        Ok(ForwardPassed {
            ctx,
            sample: self.sample,
            mates,
            acc,
        })
    }
}

impl<'a> ForwardPassed<'a> {
    pub fn sample(&self) -> &str {
        &self.sample
    }

    pub fn kept_forward(&self) -> usize {
        self.mates.len()
    }

    /// Trim every reverse record and write the surviving pairs, then return
    /// the sample's summary row.
    pub fn reverse_pass<R, F, V>(
        mut self,
        reader: &mut FastqReader<R>,
        spacer: Option<&SpacerMatcher>,
        forward_out: &mut F,
        reverse_out: &mut V,
    ) -> Result<SampleSummary>
    where
        R: BufRead,
        F: Write + ?Sized,
        V: Write + ?Sized,
    {
        let ctx = self.ctx;

        info!("Trimming primers sample {} reverse", self.sample);
        for record in reader.by_ref() {
            let record = record?;
            self.acc.raw_reverse += 1;
            if self.acc.raw_reverse % PROGRESS_INTERVAL == 0 {
                debug!("Read: {}", self.acc.raw_reverse);
            }
            if spacer.is_some_and(|s| !s.matches_start(&record.sequence)) {
                self.acc.mark_incorrect(record.identifier());
                continue;
            }

            let window = trim_read(&record, PrimerRole::Reverse, &ctx.patterns, ctx.marker_length()).into_window();
            let Some((identifier, trimmed)) = window else {
                continue;
            };
            self.acc.reverse_trimmed += 1;

            let Some(mate) = self.mates.get(&identifier) else {
                continue;
            };
            if ctx.cutoff.admits(trimmed.sequence.len()) {
                mate.write_to(forward_out)?;
                let paired = FastqRecord::new(record.header, trimmed.sequence, "+".to_string(), trimmed.quality);
                paired.write_to(reverse_out)?;
                self.acc.paired += 1;
            } else {
                self.acc.short += 1;
            }
        }
        info!("{} total raw reverse reads", self.acc.raw_reverse);

        forward_out.flush()?;
        reverse_out.flush()?;
        let summary = self.acc.finalize(&self.sample);
        info!(
            "Sample {}: {} F trimmed, {} R trimmed, {} paired, {} short",
            summary.sample, summary.forward_trimmed, summary.reverse_trimmed, summary.paired, summary.short
        );
        Ok(summary)
    }
}

/// Choose the dominant spacer of one mate file by sampling its first reads.
fn vote_spacer<'c>(ctx: &'c RunContext, path: &Path, direction: PrimerRole) -> Result<Option<&'c SpacerMatcher>> {
    let Some(table) = ctx.spacer_table(direction) else {
        return Ok(None);
    };
    let mut reader = open_reader(path)?;
    let vote = classify_sample(&mut reader, table)?;
    Ok(Some(table.matcher(vote.chosen)))
}

/// Output paths for a sample's trimmed mates.
pub fn output_paths(output_dir: &Path, sample: &str, compress: bool) -> (PathBuf, PathBuf) {
    let extension = if compress { "fastq.gz" } else { "fastq" };
    (
        output_dir.join(format!("{}_R1_001.{}", sample, extension)),
        output_dir.join(format!("{}_R2_001.{}", sample, extension)),
    )
}

/// Trim and pair one sample from its two mate files.
pub fn process_sample(
    ctx: &RunContext,
    sample: &str,
    forward: &Path,
    reverse: &Path,
    output_dir: &Path,
) -> Result<SampleSummary> {
    info!("Processing sample {}: {} / {}", sample, forward.display(), reverse.display());
    let (forward_path, reverse_path) = output_paths(output_dir, sample, ctx.compress_output);

    let forward_spacer = vote_spacer(ctx, forward, PrimerRole::Forward)?;
    let mut forward_reader = open_reader(forward)?;
    let passed = PairingEngine::new(ctx, sample).forward_pass(&mut forward_reader, forward_spacer)?;
    debug!("{} forward mates held for sample {}", passed.kept_forward(), passed.sample());

    let reverse_spacer = vote_spacer(ctx, reverse, PrimerRole::Reverse)?;
    let mut reverse_reader = open_reader(reverse)?;
    let mut forward_out = create_writer(&forward_path)?;
    let mut reverse_out = create_writer(&reverse_path)?;
    passed.reverse_pass(&mut reverse_reader, reverse_spacer, &mut *forward_out, &mut *reverse_out)
}
