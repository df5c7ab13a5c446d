//! C3: response assemblers — JSON buffering & parse, or streaming write to
//! flash, selected by request kind.

use thiserror::Error;

use crate::contracts::{FlashError, FlashStreamer};
use crate::transport::ResponseSink;

/// Initial capacity of a [`JsonAssembler`]'s buffer, doubled on overflow.
pub const JSON_BUFFER_INITIAL_CAPACITY: usize = 1_100;

#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("response buffer allocation failed")]
    AllocationFailed,
    #[error("accumulated length {actual} does not match Content-Length {expected:?}")]
    LengthMismatch { expected: Option<u64>, actual: usize },
    #[error("invalid JSON body")]
    Json(#[from] serde_json::Error),
    #[error("flash streamer error")]
    Flash(#[from] FlashError),
}

/// Accumulates a response body into a growable buffer and parses it as
/// JSON once the body is complete.
pub struct JsonAssembler {
    buf: Vec<u8>,
    content_length: Option<u64>,
    error: Option<AssemblerError>,
}

impl Default for JsonAssembler {
    fn default() -> Self {
        JsonAssembler::new()
    }
}

impl JsonAssembler {
    pub fn new() -> Self {
        JsonAssembler {
            buf: Vec::with_capacity(JSON_BUFFER_INITIAL_CAPACITY),
            content_length: None,
            error: None,
        }
    }

    fn grow_for(&mut self, additional: usize) -> Result<(), ()> {
        let needed = self.buf.len() + additional;
        if needed <= self.buf.capacity() {
            return Ok(());
        }
        let mut new_capacity = self.buf.capacity().max(1);
        while new_capacity < needed {
            new_capacity = new_capacity.saturating_mul(2);
        }
        self.buf
            .try_reserve(new_capacity - self.buf.len())
            .map_err(|_| ())
    }

    /// Parses the accumulated body as `T`, after checking that the
    /// accumulated length matches the advertised `Content-Length`.
    pub fn into_result<T: serde::de::DeserializeOwned>(self) -> Result<T, AssemblerError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if let Some(expected) = self.content_length {
            if self.buf.len() as u64 != expected {
                return Err(AssemblerError::LengthMismatch {
                    expected: self.content_length,
                    actual: self.buf.len(),
                });
            }
        }
        Ok(serde_json::from_slice(&self.buf)?)
    }
}

impl ResponseSink for JsonAssembler {
    fn start(&mut self, content_length: Option<u64>) {
        self.content_length = content_length;
    }

    fn chunk(&mut self, data: &[u8], _is_final: bool) {
        if self.error.is_some() || data.is_empty() {
            return;
        }
        if self.grow_for(data.len()).is_err() {
            self.error = Some(AssemblerError::AllocationFailed);
            return;
        }
        self.buf.extend_from_slice(data);
    }
}

/// Streams a response body straight into the alternate flash slot via a
/// [`FlashStreamer`], tracking download progress as it goes.
pub struct FlashAssembler<'a> {
    streamer: &'a mut dyn FlashStreamer,
    content_length: Option<u64>,
    last_progress_percent: u8,
    on_progress: Option<Box<dyn FnMut(u8) + 'a>>,
    error: Option<AssemblerError>,
}

impl<'a> FlashAssembler<'a> {
    pub fn new(streamer: &'a mut dyn FlashStreamer) -> Self {
        FlashAssembler {
            streamer,
            content_length: None,
            last_progress_percent: 0,
            on_progress: None,
            error: None,
        }
    }

    /// Registers a callback invoked each time `download_progress_percent`
    /// advances; it is never called twice for the same percentage.
    pub fn with_progress(mut self, callback: impl FnMut(u8) + 'a) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub fn downloaded_size(&self) -> usize {
        self.streamer.bytes_written()
    }

    pub fn progress_percent(&self) -> u8 {
        self.last_progress_percent
    }

    /// Finalizes the download, checking that `downloaded_size` matches
    /// `expected_size` (the `Content-Length`, falling back to the
    /// artifact's declared size) per the monotone-progress invariant.
    pub fn finish(self, expected_size: Option<u64>) -> Result<usize, AssemblerError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let downloaded = self.streamer.bytes_written();
        if let Some(expected) = expected_size {
            if downloaded as u64 != expected {
                return Err(AssemblerError::LengthMismatch {
                    expected: Some(expected),
                    actual: downloaded,
                });
            }
        }
        Ok(downloaded)
    }
}

impl<'a> ResponseSink for FlashAssembler<'a> {
    fn start(&mut self, content_length: Option<u64>) {
        self.content_length = content_length;
    }

    fn chunk(&mut self, data: &[u8], is_final: bool) {
        if self.error.is_some() {
            return;
        }
        if let Err(error) = self.streamer.append(data, is_final) {
            self.error = Some(AssemblerError::Flash(error));
            return;
        }
        let Some(total) = self.content_length else {
            return;
        };
        if total == 0 {
            return;
        }
        let written = self.streamer.bytes_written() as u64;
        let percent = ((written * 100) / total).min(100) as u8;
        if percent > self.last_progress_percent {
            self.last_progress_percent = percent;
            if let Some(callback) = self.on_progress.as_mut() {
                callback(percent);
            }
        }
    }
}
