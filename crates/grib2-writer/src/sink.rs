//! File sink writing one GRIB2 message per record.
//!
//! Messages go to `<output>.partial`; `finish` moves the partial file over
//! the final path, `abort` deletes it. A failed run therefore never leaves a
//! truncated GRIB file under the final name.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use current_grid::{OutputRecord, RecordSink, Result as GridResult};
use tracing::{debug, info, warn};

use crate::encoder::MessageEncoder;
use crate::error::{Grib2Error, Grib2Result};

#[derive(Debug)]
enum State {
    Pending,
    Writing(BufWriter<File>),
    Closed,
}

/// Writes records to a GRIB2 file atomically.
#[derive(Debug)]
pub struct Grib2FileSink {
    path: PathBuf,
    temp_path: PathBuf,
    encoder: MessageEncoder,
    state: State,
    messages: usize,
    bytes: u64,
}

impl Grib2FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_encoder(path, MessageEncoder::new())
    }

    pub fn with_encoder(path: impl Into<PathBuf>, encoder: MessageEncoder) -> Self {
        let path = path.into();
        let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".partial");
        let temp_path = path.with_file_name(temp_name);
        Self {
            path,
            temp_path,
            encoder,
            state: State::Pending,
            messages: 0,
            bytes: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Messages written so far.
    pub fn messages(&self) -> usize {
        self.messages
    }

    fn writer(&mut self) -> Grib2Result<&mut BufWriter<File>> {
        if matches!(self.state, State::Pending) {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = File::create(&self.temp_path)?;
            debug!(path = %self.temp_path.display(), "Opened partial GRIB2 output");
            self.state = State::Writing(BufWriter::new(file));
        }

        match &mut self.state {
            State::Writing(writer) => Ok(writer),
            _ => Err(Grib2Error::Closed(self.path.display().to_string())),
        }
    }

    fn append(&mut self, record: &OutputRecord) -> Grib2Result<()> {
        let message = self.encoder.encode(record)?;
        self.writer()?.write_all(&message)?;
        self.messages += 1;
        self.bytes += message.len() as u64;
        Ok(())
    }

    fn commit(&mut self) -> Grib2Result<()> {
        // An empty run still produces an (empty) output file
        self.writer()?;
        let State::Writing(writer) = std::mem::replace(&mut self.state, State::Closed) else {
            return Err(Grib2Error::Closed(self.path.display().to_string()));
        };

        let file = writer
            .into_inner()
            .map_err(|e| Grib2Error::IoError(e.into_error()))?;
        file.sync_all()?;
        drop(file);

        if self.path.exists() {
            debug!(path = %self.path.display(), "Replacing existing output");
        }
        if fs::rename(&self.temp_path, &self.path).is_err() {
            // Cross-device: copy then delete
            fs::copy(&self.temp_path, &self.path)?;
            fs::remove_file(&self.temp_path)?;
        }

        info!(
            path = %self.path.display(),
            messages = self.messages,
            bytes = self.bytes,
            "GRIB2 output written"
        );
        Ok(())
    }
}

impl RecordSink for Grib2FileSink {
    fn write(&mut self, record: &OutputRecord) -> GridResult<()> {
        self.append(record).map_err(Into::into)
    }

    fn finish(&mut self) -> GridResult<()> {
        self.commit().map_err(Into::into)
    }

    fn abort(&mut self) {
        // Closes the partial file if one is open
        self.state = State::Closed;
        if self.temp_path.exists() {
            if let Err(e) = fs::remove_file(&self.temp_path) {
                warn!(path = %self.temp_path.display(), error = %e, "Failed to remove partial output");
            }
        }
    }
}
