//! Two-phase buffered encoding output.

use crate::value::KindMismatch;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::ops::{Deref, DerefMut};

/// Returned when SSZ encoding fails.
#[derive(Debug, PartialEq, Clone)]
pub enum EncodeError {
    /// The value does not match the handler tree.
    ValueMismatch(KindMismatch),
    /// The injected sink failed.
    Io(String),
}

impl From<KindMismatch> for EncodeError {
    fn from(mismatch: KindMismatch) -> Self {
        EncodeError::ValueMismatch(mismatch)
    }
}

const MAX_POOLED_BUFFERS: usize = 32;

lazy_static! {
    static ref BUFFER_POOL: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());
}

/// A reusable encoding buffer borrowed from the process-wide pool.
///
/// Returned to the pool when dropped, on every exit path.
pub(crate) struct PooledBuffer {
    buf: Vec<u8>,
}

impl PooledBuffer {
    pub fn acquire() -> Self {
        let buf = BUFFER_POOL.lock().pop().unwrap_or_default();
        Self { buf }
    }
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let mut pool = BUFFER_POOL.lock();
        if pool.len() < MAX_POOLED_BUFFERS {
            self.buf.clear();
            pool.push(std::mem::take(&mut self.buf));
        }
    }
}

/// A two-phase SSZ writer over a caller-supplied buffer.
///
/// Fixed-region bytes append to the main buffer. Variable payloads are
/// staged onto a pooled forward queue and flushed behind the fixed region by
/// the outermost variable composite in the call chain; a nested composite
/// encoded with the same writer must not flush.
pub struct SszWriter<'a> {
    buf: &'a mut Vec<u8>,
    forward: PooledBuffer,
}

impl<'a> SszWriter<'a> {
    pub fn new(buf: &'a mut Vec<u8>) -> Self {
        Self {
            buf,
            forward: PooledBuffer::acquire(),
        }
    }

    /// Appends bytes to the fixed region.
    pub fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a `u32` little-endian into the fixed region.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes the offset of the next staged payload: the container's fixed
    /// region length plus everything staged so far.
    pub fn write_offset(&mut self, fixed_len: u64) {
        let offset = fixed_len + self.forward.len() as u64;
        self.write_u32(offset as u32);
    }

    /// Appends an encoded payload to the forward queue.
    pub fn stage(&mut self, payload: &[u8]) {
        self.forward.extend_from_slice(payload);
    }

    /// Moves the forward queue behind the fixed region.
    pub fn flush_forward(&mut self) {
        self.buf.extend_from_slice(&self.forward);
        self.forward.clear();
    }
}

/// Streams an encoded buffer into an injected sink.
pub(crate) fn write_all(sink: &mut dyn Write, bytes: &[u8]) -> Result<(), EncodeError> {
    sink.write_all(bytes).map_err(map_io_error)
}

fn map_io_error(e: io::Error) -> EncodeError {
    EncodeError::Io(e.to_string())
}
