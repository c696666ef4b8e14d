use std::fs::File;
use std::path::Path;

use crate::error::{Error, Result};
use crate::pairing::SampleSummary;

const COLUMNS: [&str; 6] = [
    "Sample",
    "Reads",
    "F Seqs Trimmed",
    "R Seqs Trimmed",
    "Seqs F & R Trimmed",
    "Short Seqs",
];

const SPACER_COLUMNS: [&str; 2] = ["Seqs w/ Correct Spacer Combo", "Seqs w/o Correct Spacer Combo"];

/// Tab-separated trim summary, one row per sample.
pub struct SummaryWriter {
    writer: csv::Writer<File>,
    path: String,
}

impl SummaryWriter {
    pub fn create(path: &Path, spacers: bool) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?;
        let mut header: Vec<&str> = COLUMNS.to_vec();
        if spacers {
            header.extend_from_slice(&SPACER_COLUMNS);
        }
        writer.write_record(&header)?;
        let mut summary = SummaryWriter {
            writer,
            path: path.display().to_string(),
        };
        summary.flush()?;
        Ok(summary)
    }

    pub fn append(&mut self, row: &SampleSummary) -> Result<()> {
        self.writer.write_record(row.to_record())?;
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| Error::file_io(&self.path, e))
    }
}
