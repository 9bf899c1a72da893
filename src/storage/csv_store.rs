//! CSV storage implementation
//!
//! This module provides a CSV-file implementation of the RecordStore trait.
//! Every field is double-quoted with embedded quotes doubled, rows end with
//! `\n`, and each append is flushed and synced before returning.

use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::{CatalogRow, ProductRecord, VariantRecord};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, Writer, WriterBuilder};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Fixed column order of the record store
pub const HEADER: [&str; 5] = ["Category", "Product Name", "Product URL", "Size", "Price"];

/// CSV record store backend
pub struct CsvRecordStore {
    path: PathBuf,
    writer: Option<Writer<File>>,
}

impl CsvRecordStore {
    /// Creates a store handle for `path` without touching the filesystem
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_empty_or_missing(&self) -> StorageResult<bool> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    fn check_header(&self) -> StorageResult<()> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;
        let headers = reader.headers()?;

        if headers.iter().ne(HEADER.iter().copied()) {
            return Err(StorageError::HeaderMismatch {
                path: self.path.display().to_string(),
                found: headers.iter().collect::<Vec<_>>().join(","),
            });
        }

        Ok(())
    }

    /// Returns the append writer, opening the file on first use
    fn writer(&mut self) -> StorageResult<&mut Writer<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                self.ensure_initialized()?;
                self.repair_tail()?;
                let file = OpenOptions::new().append(true).open(&self.path)?;
                WriterBuilder::new()
                    .has_headers(false)
                    .quote_style(QuoteStyle::Always)
                    .terminator(Terminator::Any(b'\n'))
                    .from_writer(file)
            }
        };

        Ok(self.writer.insert(writer))
    }

    /// Terminates a last row left unfinished by an interrupted write
    ///
    /// Every written field is quoted, so an odd number of quote characters
    /// means the torn row ends inside a field; that field is closed before
    /// the missing newline is added.
    fn repair_tail(&self) -> StorageResult<()> {
        let mut file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        if file.seek(SeekFrom::End(0))? == 0 {
            return Ok(());
        }

        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        if last[0] == b'\n' {
            return Ok(());
        }

        file.seek(SeekFrom::Start(0))?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        let quotes = content.iter().filter(|&&b| b == b'"').count();

        tracing::warn!(
            "Last row of {} is incomplete, terminating it before appending",
            self.path.display()
        );
        if quotes % 2 == 1 {
            file.write_all(b"\"")?;
        }
        file.write_all(b"\n")?;
        file.sync_data()?;
        Ok(())
    }

    fn append_row(&mut self, row: &CatalogRow) -> StorageResult<()> {
        let writer = self.writer()?;
        writer.serialize(row)?;
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }
}

/// Builds a row by column position
///
/// A row cut short after its URL keeps empty size and price; a row without
/// a URL column yields `None`.
fn row_from_record(record: &StringRecord) -> Option<CatalogRow> {
    let field = |i: usize| record.get(i).unwrap_or_default().to_string();
    record.get(2)?;

    Some(CatalogRow {
        category: field(0),
        product_name: field(1),
        url: field(2),
        size: field(3),
        price: field(4),
    })
}

impl RecordStore for CsvRecordStore {
    fn ensure_initialized(&mut self) -> StorageResult<()> {
        if !self.is_empty_or_missing()? {
            return self.check_header();
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", HEADER.join(","))?;
        file.sync_data()?;

        tracing::info!("Created record store at {}", self.path.display());
        Ok(())
    }

    fn load_seen_urls(&self) -> StorageResult<HashSet<String>> {
        let urls: HashSet<String> = self
            .read_all_rows()?
            .into_iter()
            .map(|row| row.url)
            .filter(|url| !url.is_empty())
            .collect();

        tracing::info!(
            "Loaded {} known product URLs from {}",
            urls.len(),
            self.path.display()
        );
        Ok(urls)
    }

    fn append_product_stub(&mut self, record: &ProductRecord) -> StorageResult<()> {
        self.append_row(&CatalogRow::from(record))
    }

    fn append_variant(&mut self, record: &VariantRecord) -> StorageResult<()> {
        self.append_row(&CatalogRow::from(record))
    }

    fn read_all_rows(&self) -> StorageResult<Vec<CatalogRow>> {
        if self.is_empty_or_missing()? {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            match result {
                Ok(record) => match row_from_record(&record) {
                    Some(row) => rows.push(row),
                    None => {
                        let line = record.position().map(|p| p.line()).unwrap_or_default();
                        tracing::warn!(
                            "Skipping row without a product URL at line {} of {}",
                            line,
                            self.path.display()
                        );
                    }
                },
                Err(e) if !e.is_io_error() => {
                    let line = e.position().map(|p| p.line()).unwrap_or_default();
                    tracing::warn!(
                        "Skipping unreadable row at line {} of {}: {}",
                        line,
                        self.path.display(),
                        e
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(rows)
    }
}
