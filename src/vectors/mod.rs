//! Correctness protocol: fixed Argon2 vectors replayed through a [ComputeBackend].

use std::{
    io::{self, Write},
    slice,
};

use thiserror::Error;
use tracing::debug;

use crate::{
    device::{ComputeBackend, DeviceError, ProcessingUnit},
    params::{Argon2Type, Argon2Version, HashParams},
};

mod data;
pub use data::TEST_GROUPS;


// ERRORS
// ================================================================================================

/// Errors aborting a whole test run. A mismatching hash is not an error.
#[derive(Debug, Error)]
pub enum TestRunError {
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
    #[error("device index out of range: {index} (found {count} devices)")]
    DeviceIndexOutOfRange { index: usize, count: usize },
    #[error("failed to write test log: {0}")]
    Io(#[from] io::Error),
}

impl TestRunError {
    /// Returns the process exit code reporting this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Device(_) => 2,
            Self::DeviceIndexOutOfRange { .. } | Self::Io(_) => 1,
        }
    }
}

// TEST VECTORS
// ================================================================================================

/// A fixed input, its parameters and the hash it must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestVector<'a> {
    pub t_cost: u32,
    pub m_cost: u32,
    pub lanes: u32,
    pub password: &'a [u8],
    pub salt: &'a [u8],
    pub secret: &'a [u8],
    pub associated_data: &'a [u8],
    pub expected: &'a [u8],
}

impl TestVector<'_> {
    /// Returns the parameters of the vector; the output length is the expected hash length.
    pub fn params(&self) -> HashParams {
        HashParams::new(self.expected.len(), self.salt, self.t_cost, self.m_cost, self.lanes)
            .with_secret(self.secret)
            .with_associated_data(self.associated_data)
    }

    /// Writes the parameters and hex-encoded inputs of the vector.
    pub fn describe(&self, out: &mut dyn Write) -> io::Result<()> {
        write!(
            out,
            "t={} m={} p={} pass={}",
            self.t_cost,
            self.m_cost,
            self.lanes,
            hex::encode(self.password)
        )?;
        for (name, value) in
            [("salt", self.salt), ("ad", self.associated_data), ("secret", self.secret)]
        {
            if !value.is_empty() {
                write!(out, " {name}={}", hex::encode(value))?;
            }
        }
        Ok(())
    }
}

/// Vectors sharing an Argon2 variant and version, and therefore a program.
#[derive(Debug, Clone, Copy)]
pub struct VectorGroup<'a> {
    pub variant: Argon2Type,
    pub version: Argon2Version,
    pub vectors: &'a [TestVector<'a>],
}

/// Outcome of a test run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestSummary {
    pub passed: usize,
    pub failed: usize,
}

impl TestSummary {
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Returns 0 when every vector passed and 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        u8::from(!self.all_passed())
    }
}

// TEST RUNNER
// ================================================================================================

/// Runs every group on the device at `device_index` and writes the log and final tally.
pub fn run_tests<B: ComputeBackend>(
    backend: &B,
    device_index: usize,
    groups: &[VectorGroup<'_>],
    log: &mut dyn Write,
) -> Result<TestSummary, TestRunError> {
    let devices = backend.devices();
    let device = devices.get(device_index).ok_or(TestRunError::DeviceIndexOutOfRange {
        index: device_index,
        count: devices.len(),
    })?;

    let mut summary = TestSummary::default();
    for group in groups {
        let failed = run_group(backend, device, group, log)?;
        summary.failed += failed;
        summary.passed += group.vectors.len() - failed;
    }
    writeln!(log, "{}/{} test vectors passed", summary.passed, summary.total())?;
    Ok(summary)
}

/// Runs the vectors of one group and returns the number of failures.
///
/// Any device error aborts the group; a hash mismatch only fails its vector.
pub fn run_group<B: ComputeBackend>(
    backend: &B,
    device: &B::Device,
    group: &VectorGroup<'_>,
    log: &mut dyn Write,
) -> Result<usize, TestRunError> {
    writeln!(log, "Running tests for Argon2{} v{}...", group.variant, group.version)?;

    let program =
        backend.build_program(slice::from_ref(device), group.variant, group.version)?;
    let mut failures = 0;
    for vector in group.vectors {
        write!(log, "  ")?;
        vector.describe(log)?;
        write!(log, "... ")?;

        let mut unit = backend.build_unit(&program, &vector.params(), device, 1)?;
        let passed = check_vector(&mut unit, vector.password, vector.expected)?;
        debug!(variant = %group.variant, version = %group.version, passed, "test vector checked");

        if passed {
            writeln!(log, "PASS")?;
        } else {
            failures += 1;
            writeln!(log, "FAIL")?;
        }
    }
    if failures == 0 {
        writeln!(log, "  ALL PASSED")?;
    }
    Ok(failures)
}

/// Hashes `password` on a batch-1 `unit` and compares the result with `expected`.
fn check_vector<U: ProcessingUnit>(
    unit: &mut U,
    password: &[u8],
    expected: &[u8],
) -> Result<bool, DeviceError> {
    unit.password_writer()?.set_password(password)?;
    unit.begin_processing()?;
    unit.end_processing()?;

    let reader = unit.hash_reader()?;
    let matches = reader.hash()? == expected;
    Ok(matches)
}
