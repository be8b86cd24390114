//! Scripted backend used by unit tests to observe how the harness drives a pipeline.

use std::{cell::RefCell, rc::Rc};

use super::{ComputeBackend, Device, DeviceError, ProcessingUnit};
use crate::params::{Argon2Type, Argon2Version, HashParams};

/// Pipeline calls recorded by [MockUnit].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    MapInput,
    Write(usize),
    UnmapInput,
    Begin,
    End,
    MapOutput,
    Read(usize),
    UnmapOutput,
}

/// Deterministic stand-in for a hash: the password cycled to `len` bytes and xor-ed with 0x5a.
pub fn mock_hash(password: &[u8], len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| if password.is_empty() { 0x5a } else { password[i % password.len()] ^ 0x5a })
        .collect()
}

#[derive(Debug, Clone)]
pub struct MockDevice(pub String);

impl Device for MockDevice {
    fn info(&self) -> String {
        self.0.clone()
    }
}

#[derive(Debug, Default)]
pub struct MockBackend {
    pub devices: Vec<MockDevice>,
    pub events: Rc<RefCell<Vec<Event>>>,
    pub programs_built: RefCell<Vec<(Argon2Type, Argon2Version)>>,
    pub units_built: RefCell<Vec<(HashParams, usize)>>,
    /// Makes `end_processing` fail on every unit built afterwards.
    pub fail_processing: bool,
}

impl MockBackend {
    pub fn with_devices(count: usize) -> Self {
        Self {
            devices: (0..count).map(|i| MockDevice(format!("mock device {i}"))).collect(),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }
}

impl ComputeBackend for MockBackend {
    type Device = MockDevice;
    type Program = (Argon2Type, Argon2Version);
    type Unit = MockUnit;

    fn devices(&self) -> &[MockDevice] {
        &self.devices
    }

    fn build_program(
        &self,
        devices: &[MockDevice],
        variant: Argon2Type,
        version: Argon2Version,
    ) -> Result<Self::Program, DeviceError> {
        if devices.is_empty() {
            return Err(DeviceError::NoDevices);
        }
        self.programs_built.borrow_mut().push((variant, version));
        Ok((variant, version))
    }

    fn build_unit(
        &self,
        _program: &Self::Program,
        params: &HashParams,
        _device: &MockDevice,
        batch_size: usize,
    ) -> Result<MockUnit, DeviceError> {
        self.units_built.borrow_mut().push((params.clone(), batch_size));
        Ok(MockUnit {
            batch_size,
            output_len: params.output_len,
            passwords: vec![Vec::new(); batch_size],
            hashes: vec![Vec::new(); batch_size],
            events: Rc::clone(&self.events),
            fail_processing: self.fail_processing,
        })
    }
}

#[derive(Debug)]
pub struct MockUnit {
    batch_size: usize,
    output_len: usize,
    passwords: Vec<Vec<u8>>,
    hashes: Vec<Vec<u8>>,
    events: Rc<RefCell<Vec<Event>>>,
    fail_processing: bool,
}

impl MockUnit {
    pub fn passwords(&self) -> &[Vec<u8>] {
        &self.passwords
    }

    fn record(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl ProcessingUnit for MockUnit {
    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn output_len(&self) -> usize {
        self.output_len
    }

    fn map_input(&mut self) -> Result<(), DeviceError> {
        self.record(Event::MapInput);
        Ok(())
    }

    fn unmap_input(&mut self) {
        self.record(Event::UnmapInput);
    }

    fn write_password(&mut self, slot: usize, password: &[u8]) -> Result<(), DeviceError> {
        self.record(Event::Write(slot));
        self.passwords[slot] = password.to_vec();
        Ok(())
    }

    fn begin_processing(&mut self) -> Result<(), DeviceError> {
        self.record(Event::Begin);
        Ok(())
    }

    fn end_processing(&mut self) -> Result<(), DeviceError> {
        self.record(Event::End);
        if self.fail_processing {
            return Err(DeviceError::Computation("scripted failure".into()));
        }
        self.hashes = self.passwords.iter().map(|pw| mock_hash(pw, self.output_len)).collect();
        Ok(())
    }

    fn map_output(&mut self) -> Result<(), DeviceError> {
        self.record(Event::MapOutput);
        Ok(())
    }

    fn unmap_output(&mut self) {
        self.record(Event::UnmapOutput);
    }

    fn read_hash(&self, slot: usize) -> Result<&[u8], DeviceError> {
        self.record(Event::Read(slot));
        Ok(&self.hashes[slot])
    }
}
