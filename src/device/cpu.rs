//! Host CPU backend.
//!
//! The host is exposed as a single device. Each hash is delegated to the `argon2` crate; a
//! batch is computed on the rayon pool by a worker thread that `begin_processing` starts and
//! `end_processing` joins.

use std::{mem, sync::Arc, thread};

use argon2::{Algorithm, Argon2, AssociatedData, Params, ParamsBuilder, Version};
use rayon::prelude::*;
use tracing::debug;

use super::{ComputeBackend, Device, DeviceError, ProcessingUnit};
use crate::params::{Argon2Type, Argon2Version, HashParams};

// CONSTANTS
// ================================================================================================

/// Shortest salt accepted by Argon2 (RFC 9106, section 3.1).
pub const MIN_SALT_LEN: usize = 8;

// DEVICE
// ================================================================================================

/// The host CPU, described by the size of the rayon pool hashes are spread over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuDevice {
    threads: usize,
}

impl CpuDevice {
    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl Device for CpuDevice {
    fn info(&self) -> String {
        format!("host CPU ({} threads)", self.threads)
    }
}

// BACKEND
// ================================================================================================

/// Compute backend running every batch on the host CPU.
#[derive(Debug, Clone)]
pub struct CpuBackend {
    devices: Vec<CpuDevice>,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self {
            devices: vec![CpuDevice { threads: rayon::current_num_threads() }],
        }
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Program selected for one Argon2 variant and version.
#[derive(Debug, Clone, Copy)]
pub struct CpuProgram {
    algorithm: Algorithm,
    version: Version,
}

impl ComputeBackend for CpuBackend {
    type Device = CpuDevice;
    type Program = CpuProgram;
    type Unit = CpuUnit;

    fn devices(&self) -> &[CpuDevice] {
        &self.devices
    }

    fn build_program(
        &self,
        devices: &[CpuDevice],
        variant: Argon2Type,
        version: Argon2Version,
    ) -> Result<CpuProgram, DeviceError> {
        if devices.is_empty() {
            return Err(DeviceError::NoDevices);
        }
        debug!(%variant, %version, "cpu program built");
        Ok(CpuProgram {
            algorithm: variant.into(),
            version: version.into(),
        })
    }

    fn build_unit(
        &self,
        program: &CpuProgram,
        params: &HashParams,
        device: &CpuDevice,
        batch_size: usize,
    ) -> Result<CpuUnit, DeviceError> {
        let unit = CpuUnit::new(program, params, batch_size)?;
        debug!(batch_size, device = %device.info(), "cpu processing unit built");
        Ok(unit)
    }
}

// HASH CONTEXT
// ================================================================================================

/// Everything a worker needs to hash one password, shared with the worker thread.
#[derive(Debug)]
struct HashContext {
    algorithm: Algorithm,
    version: Version,
    params: Params,
    salt: Vec<u8>,
    secret: Vec<u8>,
    output_len: usize,
}

impl HashContext {
    fn new(program: &CpuProgram, params: &HashParams) -> Result<Self, DeviceError> {
        if params.salt.len() < MIN_SALT_LEN {
            return Err(DeviceError::InvalidParams(format!(
                "salt must be at least {MIN_SALT_LEN} bytes, found {}",
                params.salt.len()
            )));
        }

        let mut builder = ParamsBuilder::new();
        builder
            .m_cost(params.m_cost)
            .t_cost(params.t_cost)
            .p_cost(params.lanes)
            .output_len(params.output_len);
        if !params.associated_data.is_empty() {
            let data = AssociatedData::new(&params.associated_data)
                .map_err(|err| DeviceError::InvalidParams(err.to_string()))?;
            builder.data(data);
        }
        let argon2_params =
            builder.build().map_err(|err| DeviceError::InvalidParams(err.to_string()))?;

        let context = Self {
            algorithm: program.algorithm,
            version: program.version,
            params: argon2_params,
            salt: params.salt.clone(),
            secret: params.secret.clone(),
            output_len: params.output_len,
        };
        // rejects an oversized secret before any batch is staged
        context.hasher().map_err(|err| DeviceError::InvalidParams(err.to_string()))?;
        Ok(context)
    }

    fn hasher(&self) -> Result<Argon2<'_>, argon2::Error> {
        if self.secret.is_empty() {
            Ok(Argon2::new(self.algorithm, self.version, self.params.clone()))
        } else {
            Argon2::new_with_secret(&self.secret, self.algorithm, self.version, self.params.clone())
        }
    }

    fn hash_into(&self, password: &[u8], out: &mut [u8]) -> Result<(), DeviceError> {
        self.hasher()
            .and_then(|hasher| hasher.hash_password_into(password, &self.salt, out))
            .map_err(|err| DeviceError::Computation(err.to_string()))
    }

    fn hash_batch(&self, passwords: &[Vec<u8>]) -> Result<Vec<u8>, DeviceError> {
        let mut hashes = vec![0; passwords.len() * self.output_len];
        hashes
            .par_chunks_mut(self.output_len)
            .zip(passwords.par_iter())
            .try_for_each(|(out, password)| self.hash_into(password, out))?;
        Ok(hashes)
    }
}

// PROCESSING UNIT
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitState {
    Idle,
    Staging,
    Running,
    Done,
    Reading,
}

type WorkerOutput = (Vec<Vec<u8>>, Result<Vec<u8>, DeviceError>);

/// A batch of Argon2 tasks computed on the host.
///
/// Password buffers are allocated once per slot and reused by every trial.
#[derive(Debug)]
pub struct CpuUnit {
    context: Arc<HashContext>,
    batch_size: usize,
    passwords: Vec<Vec<u8>>,
    hashes: Vec<u8>,
    state: UnitState,
    worker: Option<thread::JoinHandle<WorkerOutput>>,
}

impl CpuUnit {
    fn new(
        program: &CpuProgram,
        params: &HashParams,
        batch_size: usize,
    ) -> Result<Self, DeviceError> {
        if batch_size == 0 {
            return Err(DeviceError::InvalidParams("batch size must be at least 1".into()));
        }
        let context = HashContext::new(program, params)?;
        Ok(Self {
            hashes: vec![0; batch_size * context.output_len],
            context: Arc::new(context),
            batch_size,
            passwords: vec![Vec::new(); batch_size],
            state: UnitState::Idle,
            worker: None,
        })
    }

    fn expect_state(&self, expected: UnitState, message: &'static str) -> Result<(), DeviceError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(DeviceError::InvalidState(message))
        }
    }
}

impl ProcessingUnit for CpuUnit {
    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn output_len(&self) -> usize {
        self.context.output_len
    }

    fn map_input(&mut self) -> Result<(), DeviceError> {
        match self.state {
            UnitState::Idle | UnitState::Done => {
                self.state = UnitState::Staging;
                Ok(())
            },
            _ => Err(DeviceError::InvalidState("input can only be mapped between batches")),
        }
    }

    fn unmap_input(&mut self) {
        if self.state == UnitState::Staging {
            self.state = UnitState::Idle;
        }
    }

    fn write_password(&mut self, slot: usize, password: &[u8]) -> Result<(), DeviceError> {
        self.expect_state(UnitState::Staging, "passwords can only be written to mapped input")?;
        let buffer = self
            .passwords
            .get_mut(slot)
            .ok_or(DeviceError::SlotOutOfRange { slot, batch_size: self.batch_size })?;
        buffer.clear();
        buffer.extend_from_slice(password);
        Ok(())
    }

    fn begin_processing(&mut self) -> Result<(), DeviceError> {
        match self.state {
            UnitState::Idle | UnitState::Done => {},
            _ => return Err(DeviceError::InvalidState("processing requires unmapped buffers")),
        }

        let context = Arc::clone(&self.context);
        let passwords = mem::take(&mut self.passwords);
        let spawned = thread::Builder::new().name("argon2-cpu-unit".into()).spawn(move || {
            let hashes = context.hash_batch(&passwords);
            (passwords, hashes)
        });
        let worker = match spawned {
            Ok(worker) => worker,
            Err(err) => {
                self.passwords = vec![Vec::new(); self.batch_size];
                return Err(DeviceError::Computation(err.to_string()));
            },
        };

        self.worker = Some(worker);
        self.state = UnitState::Running;
        Ok(())
    }

    fn end_processing(&mut self) -> Result<(), DeviceError> {
        let worker = self
            .worker
            .take()
            .ok_or(DeviceError::InvalidState("processing was not started"))?;
        let Ok((passwords, hashes)) = worker.join() else {
            // the staged passwords went down with the worker
            self.passwords = vec![Vec::new(); self.batch_size];
            self.state = UnitState::Idle;
            return Err(DeviceError::WorkerPanicked);
        };
        self.passwords = passwords;

        match hashes {
            Ok(hashes) => {
                self.hashes = hashes;
                self.state = UnitState::Done;
                Ok(())
            },
            Err(err) => {
                self.state = UnitState::Idle;
                Err(err)
            },
        }
    }

    fn map_output(&mut self) -> Result<(), DeviceError> {
        self.expect_state(UnitState::Done, "output can only be mapped after processing")?;
        self.state = UnitState::Reading;
        Ok(())
    }

    fn unmap_output(&mut self) {
        if self.state == UnitState::Reading {
            self.state = UnitState::Done;
        }
    }

    fn read_hash(&self, slot: usize) -> Result<&[u8], DeviceError> {
        self.expect_state(UnitState::Reading, "hashes can only be read from mapped output")?;
        let len = self.context.output_len;
        self.hashes
            .get(slot * len..(slot + 1) * len)
            .ok_or(DeviceError::SlotOutOfRange { slot, batch_size: self.batch_size })
    }
}

impl Drop for CpuUnit {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

// TESTS
// ================================================================================================
