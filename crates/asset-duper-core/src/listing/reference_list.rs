use crate::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Plain-text reference inventory: one path-like entry per line.
///
/// The first line is treated as a header and dropped when it starts with
/// `header_token` (case-insensitive). Lines are trimmed; invalid UTF-8 is
/// replaced rather than rejected.
pub struct ReferenceListSource<R: BufRead> {
    reader: R,
    header_token: String,
    first_line: bool,
    buf: Vec<u8>,
}

impl ReferenceListSource<BufReader<File>> {
    pub fn open(path: &Path, header_token: &str) -> Result<Self, Error> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), header_token))
    }
}

impl<R: BufRead> ReferenceListSource<R> {
    pub fn new(reader: R, header_token: &str) -> Self {
        Self {
            reader,
            header_token: header_token.to_lowercase(),
            first_line: true,
            buf: Vec::new(),
        }
    }

    fn read_line(&mut self) -> Option<Result<String, Error>> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => Some(Ok(String::from_utf8_lossy(&self.buf).trim().to_string())),
            Err(e) => Some(Err(Error::Io(e))),
        }
    }
}

impl<R: BufRead> Iterator for ReferenceListSource<R> {
    type Item = Result<String, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.read_line()?;
        if std::mem::take(&mut self.first_line) {
            if let Ok(text) = &line {
                if !self.header_token.is_empty()
                    && text.to_lowercase().starts_with(&self.header_token)
                {
                    debug!("Skipping header: '{}'", text);
                    return self.read_line();
                }
            }
        }
        Some(line)
    }
}
