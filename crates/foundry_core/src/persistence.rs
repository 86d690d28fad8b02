//! Save/restore of mutable entity state.
//!
//! Each persisted type appends fixed-width fields to a shared byte stream,
//! after whatever its base wrote, and reads them back in the same order.
//! Fields are encoded with bincode's fixed-width little-endian encoding, so an
//! `f32` is exactly four bytes and needs no length prefix.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SimError};

/// Appends fields to a save buffer.
#[derive(Debug, Default)]
pub struct SaveWriter {
    buffer: Vec<u8>,
}

impl SaveWriter {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one field.
    pub fn write<T: Serialize>(&mut self, value: &T) -> Result<()> {
        bincode::serialize_into(&mut self.buffer, value)
            .map_err(|e| SimError::Persistence(format!("Failed to write field: {e}")))
    }

    /// Append an `f32`.
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write(&value)
    }

    /// Bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Take the written bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Reads fields back from a save buffer, front to back.
#[derive(Debug)]
pub struct SaveReader<'a> {
    remaining: &'a [u8],
}

impl<'a> SaveReader<'a> {
    /// Read from `bytes`.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { remaining: bytes }
    }

    /// Read the next field.
    ///
    /// A truncated or malformed stream is an error; callers must not fall back
    /// to a default value.
    pub fn read<T: DeserializeOwned>(&mut self) -> Result<T> {
        bincode::deserialize_from(&mut self.remaining)
            .map_err(|e| SimError::Persistence(format!("Failed to read field: {e}")))
    }

    /// Read the next `f32`.
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read()
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

/// State written to and restored from a save.
pub trait Persist {
    /// Append this entity's fields after those of its base.
    fn write_state(&self, writer: &mut SaveWriter) -> Result<()>;

    /// Restore fields in the order [`write_state`](Self::write_state) wrote
    /// them.
    fn read_state(&mut self, reader: &mut SaveReader<'_>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_is_four_bytes() {
        let mut writer = SaveWriter::new();
        writer.write_f32(0.73).unwrap();
        assert_eq!(writer.as_bytes().len(), 4);
        assert_eq!(writer.as_bytes(), &0.73f32.to_le_bytes());
    }

    #[test]
    fn test_fields_read_in_write_order() {
        let mut writer = SaveWriter::new();
        writer.write(&7u8).unwrap();
        writer.write_f32(-2.5).unwrap();
        let bytes = writer.into_bytes();

        let mut reader = SaveReader::new(&bytes);
        assert_eq!(reader.read::<u8>().unwrap(), 7);
        assert_eq!(reader.read_f32().unwrap(), -2.5);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_truncated_read_is_error() {
        let bytes = [0u8, 0, 128];
        let mut reader = SaveReader::new(&bytes);
        assert!(matches!(reader.read_f32(), Err(SimError::Persistence(_))));
    }
}
