use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputFormat {
    Fen,
    FenEval,
    FenMove,
}

impl OutputFormat {
    pub fn header(self) -> &'static str {
        match self {
            OutputFormat::Fen => "FEN",
            OutputFormat::FenEval => "FEN,Evaluation",
            OutputFormat::FenMove => "FEN,Move",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    None,
    Evaluation(i32),
    Move(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRecord {
    pub fen: String,
    pub label: Label,
}

/// Appends dataset rows after a fixed header and refuses anything past the
/// record cap.
pub struct DatasetWriter<W: Write> {
    out: W,
    format: OutputFormat,
    max_records: Option<usize>,
    written: usize,
}

impl DatasetWriter<BufWriter<File>> {
    /// Create `path` (and its parent directories) and write the header.
    pub fn create(
        path: &Path,
        format: OutputFormat,
        max_records: Option<usize>,
    ) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        Self::new(BufWriter::new(File::create(path)?), format, max_records)
    }
}

impl<W: Write> DatasetWriter<W> {
    pub fn new(mut out: W, format: OutputFormat, max_records: Option<usize>) -> io::Result<Self> {
        writeln!(out, "{}", format.header())?;

        Ok(Self {
            out,
            format,
            max_records,
            written: 0,
        })
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn is_full(&self) -> bool {
        self.max_records.is_some_and(|max| self.written >= max)
    }

    /// Append one row. Returns `false`, writing nothing, once the cap is
    /// reached.
    pub fn write(&mut self, record: &DatasetRecord) -> io::Result<bool> {
        if self.is_full() {
            return Ok(false);
        }

        match (self.format, &record.label) {
            (OutputFormat::Fen, _) => writeln!(self.out, "{}", record.fen)?,
            (OutputFormat::FenEval, Label::Evaluation(cp)) => {
                writeln!(self.out, "{},{}", record.fen, cp)?
            }
            (OutputFormat::FenMove, Label::Move(mv)) => writeln!(self.out, "{},{}", record.fen, mv)?,
            (format, label) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{:?} cannot be written as {:?}", label, format),
                ))
            }
        }

        self.written += 1;
        Ok(true)
    }

    /// Flush and hand back the underlying stream.
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
