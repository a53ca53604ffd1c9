//! Traits for video decoding backends.

use std::fmt::Display;
use std::ops::{Deref, DerefMut};
use std::path::Path;

/// An opened video yielding decoded frames in order.
pub trait FrameSource {
    type Frame;
    type Error: Display;

    /// Read the next frame; `Ok(None)` once the stream is exhausted.
    fn read(&mut self) -> Result<Option<Self::Frame>, Self::Error>;

    /// Frames per second reported by the container.
    fn fps(&self) -> f64;

    /// Total number of frames reported by the container.
    fn frame_count(&self) -> u64;

    /// Release the underlying decoder. Called exactly once by the pipeline.
    fn release(&mut self);
}

/// Opens videos by path.
pub trait VideoOpener {
    type Source: FrameSource;
    type Error: Display;

    /// Whether the video resource exists. Checked before `open`.
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn open(&self, path: &Path) -> Result<Self::Source, Self::Error>;
}

/// Releases the wrapped source when dropped, whatever the exit path.
pub(crate) struct FrameSourceGuard<S: FrameSource> {
    source: S,
    released: bool,
}

impl<S: FrameSource> FrameSourceGuard<S> {
    pub(crate) fn new(source: S) -> Self {
        Self {
            source,
            released: false,
        }
    }

    pub(crate) fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.source.release();
        }
    }
}

impl<S: FrameSource> Deref for FrameSourceGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.source
    }
}

impl<S: FrameSource> DerefMut for FrameSourceGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: FrameSource> Drop for FrameSourceGuard<S> {
    fn drop(&mut self) {
        self.release();
    }
}
