//! Resource recording brackets.
//!
//! UI construction starts transient resources (animations) that keep pointing
//! at widgets. Every such resource is started inside a start/end recording
//! bracket and its handle lands in the manifest, so teardown can delete all of
//! them in one pass before the widgets go away.
//!
//! Brackets are non-reentrant: a second `start_recording` while one is open
//! fails, as does `end_recording` with nothing open. [`RecordingBracket`] is the
//! scoped form that always closes its bracket, even on an early return.

use core::fmt;

use heapless::Vec;
use log::warn;

pub const MANIFEST_CAPACITY: usize = 32;

/// Opaque handle to a recorded resource. Meaning is up to whoever released it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceHandle(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecordingError {
    AlreadyRecording,
    NotRecording,
    ManifestFull,
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::AlreadyRecording => f.write_str("a recording bracket is already open"),
            RecordingError::NotRecording => f.write_str("no recording bracket is open"),
            RecordingError::ManifestFull => f.write_str("resource manifest is full"),
        }
    }
}

#[derive(Debug, Default)]
pub struct ResourceRecorder {
    manifest: Vec<ResourceHandle, MANIFEST_CAPACITY>,
    // Manifest index where the open bracket started
    open_from: Option<usize>,
    brackets: u16,
}

impl ResourceRecorder {
    pub const fn new() -> Self {
        Self { manifest: Vec::new(), open_from: None, brackets: 0 }
    }

    pub fn is_recording(&self) -> bool {
        self.open_from.is_some()
    }

    /// Handles captured so far, closed and open brackets alike.
    pub fn len(&self) -> usize {
        self.manifest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.is_empty()
    }

    /// Number of brackets closed since the last release.
    pub fn bracket_count(&self) -> u16 {
        self.brackets
    }

    pub fn start_recording(&mut self) -> Result<(), RecordingError> {
        if self.open_from.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }
        self.open_from = Some(self.manifest.len());
        Ok(())
    }

    /// Close the open bracket, returning how many handles it captured.
    pub fn end_recording(&mut self) -> Result<usize, RecordingError> {
        let from = self.open_from.take().ok_or(RecordingError::NotRecording)?;
        self.brackets = self.brackets.saturating_add(1);
        Ok(self.manifest.len() - from)
    }

    /// Register a resource created inside the open bracket.
    pub fn record(&mut self, handle: ResourceHandle) -> Result<(), RecordingError> {
        if self.open_from.is_none() {
            return Err(RecordingError::NotRecording);
        }
        self.manifest
            .push(handle)
            .map_err(|_| RecordingError::ManifestFull)
    }

    /// Open a bracket that closes when the returned guard is finished or dropped.
    pub fn bracket(&mut self) -> Result<RecordingBracket<'_>, RecordingError> {
        self.start_recording()?;
        Ok(RecordingBracket { recorder: self, closed: false })
    }

    /// Hand every recorded handle to `release`, in recording order, and clear
    /// the manifest. A bracket still open at this point is closed first.
    pub fn release_all(&mut self, mut release: impl FnMut(ResourceHandle)) -> usize {
        if self.open_from.is_some() {
            warn!("Releasing resources with a recording bracket still open");
            let _ = self.end_recording();
        }
        let n = self.manifest.len();
        for handle in self.manifest.iter().copied() {
            release(handle);
        }
        self.manifest.clear();
        self.brackets = 0;
        n
    }
}

/// Scoped recording bracket: start on creation, end on `finish` or drop.
#[derive(Debug)]
pub struct RecordingBracket<'a> {
    recorder: &'a mut ResourceRecorder,
    closed: bool,
}

impl RecordingBracket<'_> {
    pub fn record(&mut self, handle: ResourceHandle) -> Result<(), RecordingError> {
        self.recorder.record(handle)
    }

    pub fn finish(mut self) -> Result<usize, RecordingError> {
        self.closed = true;
        self.recorder.end_recording()
    }
}

impl Drop for RecordingBracket<'_> {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.recorder.end_recording();
        }
    }
}
