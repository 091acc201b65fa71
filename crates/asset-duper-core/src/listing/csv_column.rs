use crate::error::Error;
use csv::{Reader, StringRecordsIntoIter};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Yields one named column from a CSV export, e.g. `Full Object Key` from an
/// inventory snapshot or `FilePath` from an external drive listing.
pub struct CsvColumnSource<R: Read> {
    records: StringRecordsIntoIter<R>,
    column: usize,
}

impl CsvColumnSource<File> {
    pub fn open(path: &Path, column_name: &str) -> Result<Self, Error> {
        let reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        Self::from_csv_reader(reader, column_name)
    }
}

impl<R: Read> CsvColumnSource<R> {
    pub fn from_reader(reader: R, column_name: &str) -> Result<Self, Error> {
        let reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        Self::from_csv_reader(reader, column_name)
    }

    fn from_csv_reader(mut reader: Reader<R>, column_name: &str) -> Result<Self, Error> {
        let column = reader
            .headers()?
            .iter()
            .position(|header| header.trim() == column_name)
            .ok_or_else(|| Error::MissingColumn(column_name.to_string()))?;
        Ok(Self {
            records: reader.into_records(),
            column,
        })
    }
}

impl<R: Read> Iterator for CsvColumnSource<R> {
    type Item = Result<String, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(
            record
                .map(|row| row.get(self.column).unwrap_or_default().to_string())
                .map_err(Error::from),
        )
    }
}
