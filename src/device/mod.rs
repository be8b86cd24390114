//! The hashing pipeline consumed by the harness.
//!
//! A [ComputeBackend] enumerates devices, builds a program for an Argon2 variant and version,
//! and builds [ProcessingUnit]s able to hash a fixed-size batch of passwords. A unit is driven
//! in a fixed order: passwords are staged through a [PasswordWriter], the batch is computed by
//! the blocking `begin_processing`/`end_processing` pair, and the hashes are retrieved through
//! a [HashReader]. Both cursors map their area when created and unmap it when dropped.

use thiserror::Error;
use tracing::trace;

use crate::params::{Argon2Type, Argon2Version, HashParams};

pub mod cpu;

#[cfg(test)]
pub(crate) mod testing;


// ERRORS
// ================================================================================================

/// Failures originating in the device pipeline. They are never retried.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no compute devices available")]
    NoDevices,
    #[error("invalid hash parameters: {0}")]
    InvalidParams(String),
    #[error("computation failed: {0}")]
    Computation(String),
    #[error("slot {slot} is outside of a batch of {batch_size}")]
    SlotOutOfRange { slot: usize, batch_size: usize },
    #[error("invalid processing unit state: {0}")]
    InvalidState(&'static str),
    #[error("processing worker panicked")]
    WorkerPanicked,
}

// TRAITS
// ================================================================================================

/// A compute device exposed by a backend.
pub trait Device {
    /// Returns a human-readable description of the device.
    fn info(&self) -> String;
}

/// Entry point of a hashing pipeline implementation.
///
/// A backend is an explicitly constructed context object; everything that needs devices,
/// programs or units borrows it.
pub trait ComputeBackend {
    type Device: Device;
    type Program;
    type Unit: ProcessingUnit;

    /// Returns all devices, in a stable order used for device indices.
    fn devices(&self) -> &[Self::Device];

    /// Builds the program computing the given Argon2 variant and version on `devices`.
    fn build_program(
        &self,
        devices: &[Self::Device],
        variant: Argon2Type,
        version: Argon2Version,
    ) -> Result<Self::Program, DeviceError>;

    /// Builds a unit hashing batches of `batch_size` passwords with `params` on `device`.
    fn build_unit(
        &self,
        program: &Self::Program,
        params: &HashParams,
        device: &Self::Device,
        batch_size: usize,
    ) -> Result<Self::Unit, DeviceError>;
}

/// A device-bound batch of hashing tasks.
///
/// Callers normally go through [PasswordWriter] and [HashReader] rather than the raw mapping
/// methods, so that every `map_*` is paired with its `unmap_*`.
pub trait ProcessingUnit {
    /// Returns the number of slots in a batch.
    fn batch_size(&self) -> usize;

    /// Returns the length of every hash produced by the unit.
    fn output_len(&self) -> usize;

    /// Makes the input staging area writable by the host.
    fn map_input(&mut self) -> Result<(), DeviceError>;

    /// Hands the input staging area back to the device.
    fn unmap_input(&mut self);

    /// Stores `password` in `slot` of the mapped input area.
    fn write_password(&mut self, slot: usize, password: &[u8]) -> Result<(), DeviceError>;

    /// Starts computing the whole batch.
    fn begin_processing(&mut self) -> Result<(), DeviceError>;

    /// Blocks until the batch started by `begin_processing` is complete.
    fn end_processing(&mut self) -> Result<(), DeviceError>;

    /// Makes the output area readable by the host.
    fn map_output(&mut self) -> Result<(), DeviceError>;

    /// Hands the output area back to the device.
    fn unmap_output(&mut self);

    /// Returns the hash in `slot` of the mapped output area.
    fn read_hash(&self, slot: usize) -> Result<&[u8], DeviceError>;

    /// Maps the input area and returns a cursor positioned at the first slot.
    fn password_writer(&mut self) -> Result<PasswordWriter<'_, Self>, DeviceError> {
        PasswordWriter::new(self)
    }

    /// Maps the output area and returns a cursor positioned at the first slot.
    fn hash_reader(&mut self) -> Result<HashReader<'_, Self>, DeviceError> {
        HashReader::new(self)
    }
}

// PASSWORD WRITER
// ================================================================================================

/// Write cursor over the input staging area of a [ProcessingUnit].
///
/// The area stays mapped for the lifetime of the cursor.
pub struct PasswordWriter<'a, U: ProcessingUnit + ?Sized> {
    unit: &'a mut U,
    slot: usize,
}

impl<'a, U: ProcessingUnit + ?Sized> PasswordWriter<'a, U> {
    pub fn new(unit: &'a mut U) -> Result<Self, DeviceError> {
        unit.map_input()?;
        trace!("input area mapped");
        Ok(Self { unit, slot: 0 })
    }

    /// Returns the slot the next password is written to.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Stages `password` at the current slot.
    pub fn set_password(&mut self, password: &[u8]) -> Result<(), DeviceError> {
        let batch_size = self.unit.batch_size();
        if self.slot >= batch_size {
            return Err(DeviceError::SlotOutOfRange { slot: self.slot, batch_size });
        }
        self.unit.write_password(self.slot, password)
    }

    /// Moves the cursor `count` slots forward.
    pub fn advance(&mut self, count: usize) {
        self.slot = self.slot.saturating_add(count);
    }
}

impl<U: ProcessingUnit + ?Sized> Drop for PasswordWriter<'_, U> {
    fn drop(&mut self) {
        self.unit.unmap_input();
        trace!(slot = self.slot, "input area unmapped");
    }
}

// HASH READER
// ================================================================================================

/// Read cursor over the output area of a [ProcessingUnit].
///
/// The area stays mapped for the lifetime of the cursor.
pub struct HashReader<'a, U: ProcessingUnit + ?Sized> {
    unit: &'a mut U,
    slot: usize,
}

impl<'a, U: ProcessingUnit + ?Sized> HashReader<'a, U> {
    pub fn new(unit: &'a mut U) -> Result<Self, DeviceError> {
        unit.map_output()?;
        trace!("output area mapped");
        Ok(Self { unit, slot: 0 })
    }

    /// Returns the slot the next hash is read from.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Returns the hash at the current slot.
    pub fn hash(&self) -> Result<&[u8], DeviceError> {
        let batch_size = self.unit.batch_size();
        if self.slot >= batch_size {
            return Err(DeviceError::SlotOutOfRange { slot: self.slot, batch_size });
        }
        self.unit.read_hash(self.slot)
    }

    /// Moves the cursor `count` slots forward.
    pub fn advance(&mut self, count: usize) {
        self.slot = self.slot.saturating_add(count);
    }
}

impl<U: ProcessingUnit + ?Sized> Drop for HashReader<'_, U> {
    fn drop(&mut self) {
        self.unit.unmap_output();
        trace!(slot = self.slot, "output area unmapped");
    }
}
