use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    pub header: String,
    pub sequence: String,
    pub plus: String,
    pub quality: String,
}

impl FastqRecord {
    pub fn new(header: String, sequence: String, plus: String, quality: String) -> Self {
        FastqRecord {
            header,
            sequence,
            plus,
            quality,
        }
    }

    /// First whitespace-delimited token of the header line, `@` included.
    pub fn identifier(&self) -> &str {
        self.header.split_whitespace().next().unwrap_or("")
    }

    pub fn write_to_bytes(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(self.header.as_bytes());
        buffer.push(b'\n');
        buffer.extend_from_slice(self.sequence.as_bytes());
        buffer.push(b'\n');
        buffer.extend_from_slice(self.plus.as_bytes());
        buffer.push(b'\n');
        buffer.extend_from_slice(self.quality.as_bytes());
        buffer.push(b'\n');
    }

    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut buffer = Vec::with_capacity(self.header.len() + 2 * self.sequence.len() + 8);
        self.write_to_bytes(&mut buffer);
        writer.write_all(&buffer)
    }
}

/// Strict four-line FASTQ reader.
///
/// Blank lines between records are skipped. Anything else that breaks the
/// header / sequence / `+` / quality framing is a `MalformedRecord`.
pub struct FastqReader<R> {
    lines: std::io::Lines<R>,
    origin: String,
    line: usize,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R, origin: impl Into<String>) -> Self {
        FastqReader {
            lines: reader.lines(),
            origin: origin.into(),
            line: 0,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn malformed(&self, reason: &'static str) -> Error {
        Error::MalformedRecord {
            origin: self.origin.clone(),
            line: self.line,
            reason,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.next() {
            Some(line) => {
                self.line += 1;
                let line = line.map_err(|e| Error::file_io(&self.origin, e))?;
                Ok(Some(line.trim_end().to_string()))
            }
            None => Ok(None),
        }
    }

    fn required_line(&mut self, reason: &'static str) -> Result<String> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(self.malformed(reason)),
        }
    }

    pub fn read_record(&mut self) -> Result<Option<FastqRecord>> {
        let header = loop {
            match self.next_line()? {
                Some(line) if line.is_empty() => continue,
                Some(line) => break line,
                None => return Ok(None),
            }
        };
        if !header.starts_with('@') {
            return Err(self.malformed("header line does not start with '@'"));
        }

        let sequence = self.required_line("unexpected end of file while reading sequence")?;
        let plus = self.required_line("unexpected end of file while reading separator")?;
        if !plus.starts_with('+') {
            return Err(self.malformed("separator line does not start with '+'"));
        }
        let quality = self.required_line("unexpected end of file while reading quality")?;
        if !sequence.is_ascii() || !quality.is_ascii() {
            return Err(self.malformed("sequence or quality holds non-ASCII bytes"));
        }
        if quality.len() != sequence.len() {
            return Err(self.malformed("quality length differs from sequence length"));
        }

        Ok(Some(FastqRecord::new(header, sequence, plus, quality)))
    }
}

impl<R: BufRead> Iterator for FastqReader<R> {
    type Item = Result<FastqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

pub fn open_reader(path: &Path) -> Result<FastqReader<Box<dyn BufRead>>> {
    let file = File::open(path).map_err(|e| Error::file_io(path, e))?;

    let reader: Box<dyn BufRead> = if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let decoder = MultiGzDecoder::new(file);
        Box::new(BufReader::with_capacity(2 << 20, decoder))
    } else {
        Box::new(BufReader::with_capacity(2 << 20, file))
    };
    Ok(FastqReader::new(reader, path.display().to_string()))
}

pub fn create_writer(path: &Path) -> Result<Box<dyn Write>> {
    let file = File::create(path).map_err(|e| Error::file_io(path, e))?;

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let encoder = GzEncoder::new(file, Compression::new(1));
        Ok(Box::new(BufWriter::with_capacity(4 << 20, encoder)))
    } else {
        Ok(Box::new(BufWriter::with_capacity(4 << 20, file)))
    }
}
