//! Loop collection
//!
//! Session state owned by the caller: the ordered list of loops cut from a
//! source buffer. Loops are immutable once collected; replacing one means
//! removing it and collecting a new one.

use uuid::Uuid;

use crate::engine::buffer::SampleBuffer;
use crate::engine::slice::{slice, Selection};
use crate::error::{LoopError, Result};

/// A committed slice of source audio
#[derive(Debug, Clone)]
pub struct Loop {
    id: Uuid,
    name: String,
    buffer: SampleBuffer,
}

impl Loop {
    /// Wrap an already sliced buffer
    pub fn new(name: impl Into<String>, buffer: SampleBuffer) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            buffer,
        }
    }

    /// Unique identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Display label
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Length in seconds at the buffer's own sample rate
    pub fn duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }
}

/// Ordered collection of loops, in export order
#[derive(Debug, Clone, Default)]
pub struct LoopCollection {
    loops: Vec<Loop>,
}

impl LoopCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slice `source` and append the result as `LOOP_<n>`
    ///
    /// # Errors
    /// Propagates `InvalidSelection` / `MalformedSourceBuffer` from slicing;
    /// the collection is left untouched on error.
    pub fn collect(&mut self, source: &SampleBuffer, selection: &Selection) -> Result<&Loop> {
        let buffer = slice(source, selection)?;
        let name = format!("LOOP_{}", self.loops.len() + 1);
        Ok(self.push(Loop::new(name, buffer)))
    }

    /// Append an already built loop
    pub fn push(&mut self, item: Loop) -> &Loop {
        log::debug!(
            "Collected {} ({:.2}s, id {})",
            item.name(),
            item.duration_secs(),
            item.id()
        );
        self.loops.push(item);
        &self.loops[self.loops.len() - 1]
    }

    /// Remove a loop by id, returning it
    ///
    /// # Errors
    /// * `LoopNotFound` - if no loop has this id
    pub fn remove(&mut self, id: Uuid) -> Result<Loop> {
        let index = self
            .loops
            .iter()
            .position(|l| l.id() == id)
            .ok_or_else(|| LoopError::LoopNotFound { id: id.to_string() })?;
        Ok(self.loops.remove(index))
    }

    pub fn get(&self, id: Uuid) -> Option<&Loop> {
        self.loops.iter().find(|l| l.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Loop> {
        self.loops.iter()
    }

    /// Buffers in collection order, ready for packing
    pub fn buffers(&self) -> Vec<&SampleBuffer> {
        self.loops.iter().map(Loop::buffer).collect()
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}
