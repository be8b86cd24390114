use std::{
    hint::black_box,
    io::{self, Write},
    slice,
    time::Instant,
};

use tracing::debug;

use super::{
    Argon2Runner, BenchError, BenchmarkConfig, BenchmarkDirector, BenchmarkExecutive,
    PasswordGenerator, TrialTiming,
};
use crate::{
    device::{ComputeBackend, Device, DeviceError, ProcessingUnit},
    params::ConfigError,
};

// DEVICE RUNNER
// ================================================================================================

/// Runs benchmark trials on a processing unit bound to one device.
#[derive(Debug)]
pub struct DeviceRunner<U: ProcessingUnit> {
    unit: U,
}

impl<U: ProcessingUnit> DeviceRunner<U> {
    /// Builds a unit sized and parameterized for `config` on `device`.
    pub fn new<B>(
        backend: &B,
        program: &B::Program,
        device: &B::Device,
        config: &BenchmarkConfig,
    ) -> Result<Self, DeviceError>
    where
        B: ComputeBackend<Unit = U>,
    {
        let unit =
            backend.build_unit(program, &config.hash_params(), device, config.batch_size().get())?;
        Ok(Self { unit })
    }

    pub fn unit(&self) -> &U {
        &self.unit
    }
}

impl<U: ProcessingUnit> Argon2Runner for DeviceRunner<U> {
    fn run_benchmark(
        &mut self,
        config: &BenchmarkConfig,
        passwords: &mut dyn PasswordGenerator,
    ) -> Result<TrialTiming, DeviceError> {
        let batch_size = config.batch_size().get();

        let staging = Instant::now();
        {
            let mut writer = self.unit.password_writer()?;
            for _ in 0..batch_size {
                writer.set_password(passwords.next_password())?;
                writer.advance(1);
            }
        }

        let compute = Instant::now();
        self.unit.begin_processing()?;
        self.unit.end_processing()?;

        let retrieval = Instant::now();
        {
            let mut reader = self.unit.hash_reader()?;
            for _ in 0..batch_size {
                black_box(reader.hash()?);
                reader.advance(1);
            }
        }
        let done = Instant::now();

        Ok(TrialTiming {
            staging: compute - staging,
            compute: retrieval - compute,
            retrieval: done - retrieval,
        })
    }
}

// DEVICE EXECUTIVE
// ================================================================================================

/// Runs a benchmark on one device of a [ComputeBackend].
#[derive(Debug)]
pub struct DeviceExecutive<'a, B: ComputeBackend> {
    backend: &'a B,
    device_index: usize,
    list_devices: bool,
}

impl<'a, B: ComputeBackend> DeviceExecutive<'a, B> {
    /// Returns an executive for the device at `device_index`. With `list_devices` set it only
    /// prints the available devices.
    pub fn new(backend: &'a B, device_index: usize, list_devices: bool) -> Self {
        Self { backend, device_index, list_devices }
    }
}

impl<B: ComputeBackend> BenchmarkExecutive for DeviceExecutive<'_, B> {
    fn run_benchmark(
        &self,
        director: &BenchmarkDirector,
        out: &mut dyn io::Write,
    ) -> Result<(), BenchError> {
        let devices = self.backend.devices();

        if self.list_devices {
            for (index, device) in devices.iter().enumerate() {
                writeln!(out, "Device #{index}: {}", device.info())?;
            }
            return Ok(());
        }

        let device = devices.get(self.device_index).ok_or(ConfigError::DeviceIndexOutOfRange {
            index: self.device_index,
            count: devices.len(),
        })?;
        let config = director.config();
        if config.is_verbose() {
            writeln!(out, "Using device #{}: {}", self.device_index, device.info())?;
        }
        debug!(index = self.device_index, device = %device.info(), "device selected");

        let program = self.backend.build_program(
            slice::from_ref(device),
            config.variant(),
            config.version(),
        )?;
        let mut runner = DeviceRunner::new(self.backend, &program, device, config)?;
        director.run_benchmark(&mut runner, out)
    }
}
