//! CSV row sink

use crate::core::export::batch::ReportStream;
use crate::domain::{Cell, Result};
use std::borrow::Cow;
use std::io::Write;
use tokio::sync::watch;

/// What a sink did with one stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkOutcome {
    pub rows: u64,
    /// Stopped early on a shutdown signal
    pub interrupted: bool,
}

/// Writes report streams as delimited text
#[derive(Debug, Clone, Copy)]
pub struct CsvSink {
    delimiter: u8,
}

impl Default for CsvSink {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvSink {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Write the header (if any) and every row of `stream` to `out`
    ///
    /// The shutdown flag is checked before each row; once set, the stream is
    /// no longer pulled and the output written so far is flushed.
    ///
    /// # Errors
    ///
    /// Stream errors and write failures end the report.
    pub async fn write_report<W: Write>(
        &self,
        stream: &mut ReportStream,
        out: W,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<SinkOutcome> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(out);

        if let Some(header) = stream.header() {
            writer.write_record(header)?;
        }

        let mut outcome = SinkOutcome::default();
        loop {
            if *shutdown.borrow() {
                outcome.interrupted = true;
                break;
            }
            let Some(row) = stream.next_row().await else {
                break;
            };
            let row = row?;
            let fields: Vec<Cow<'_, str>> = row.iter().map(Cell::render).collect();
            writer.write_record(fields.iter().map(|f| f.as_bytes()))?;
            outcome.rows += 1;
        }

        writer.flush()?;
        Ok(outcome)
    }

    /// Drain `stream` without writing anything, counting rows
    ///
    /// # Errors
    ///
    /// Returns the first error the stream yields.
    pub async fn count(
        &self,
        stream: &mut ReportStream,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<SinkOutcome> {
        let mut outcome = SinkOutcome::default();
        loop {
            if *shutdown.borrow() {
                outcome.interrupted = true;
                break;
            }
            match stream.next_row().await {
                Some(row) => {
                    row?;
                    outcome.rows += 1;
                }
                None => break,
            }
        }
        Ok(outcome)
    }
}
