use crate::models::RESULT_COLUMNS;
use crate::sheets::SheetTab;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Destination for finished result rows.
pub trait RowSink {
    fn append_row(&mut self, row: &[String]) -> Result<()>;
}

/// Appends rows to a worksheet.
pub struct SheetSink<'s, S: SheetTab + ?Sized> {
    sheet: &'s mut S,
}

impl<'s, S: SheetTab + ?Sized> SheetSink<'s, S> {
    pub fn new(sheet: &'s mut S) -> Self {
        Self { sheet }
    }
}

impl<S: SheetTab + ?Sized> RowSink for SheetSink<'_, S> {
    fn append_row(&mut self, row: &[String]) -> Result<()> {
        self.sheet.append_row(row)
    }
}

/// Forwards rows to an inner sink and keeps a local CSV copy of what went
/// through. The copy is written only after the inner sink accepted the row.
pub struct CsvMirror<R: RowSink> {
    inner: R,
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl<R: RowSink> CsvMirror<R> {
    pub fn open(inner: R, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open CSV mirror: {}", path.display()))?;

        let is_empty = file
            .metadata()
            .with_context(|| format!("Failed to stat CSV mirror: {}", path.display()))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_empty {
            writer.write_record(RESULT_COLUMNS)?;
            writer.flush()?;
        }

        Ok(Self { inner, writer, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: RowSink> RowSink for CsvMirror<R> {
    fn append_row(&mut self, row: &[String]) -> Result<()> {
        self.inner.append_row(row)?;
        self.writer
            .write_record(row)
            .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        self.writer.flush()?;
        Ok(())
    }
}
