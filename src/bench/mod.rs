//! Benchmark protocol: timed batch trials aggregated into [RunTimeStats] and rendered as a
//! report.

use std::{
    io::{self, Write},
    time::Duration,
};

use thiserror::Error;
use tracing::debug;

use crate::{
    device::DeviceError,
    params::ConfigError,
    stats::{format_nanos, DataSet, Nanosecs, RunTimeStats, StatsError},
};

mod config;
pub use config::{
    BackendMode, BenchmarkConfig, CostParams, OutputMode, OutputSelection, OutputType,
    BENCHMARK_SALT, HASH_LENGTH,
};

mod executive;
pub use executive::{DeviceExecutive, DeviceRunner};

mod password;
pub use password::{DummyPasswordGenerator, PasswordGenerator, PASSWORD_LENGTH};

#[cfg(test)]
mod tests;

// ERRORS
// ================================================================================================

/// Errors ending a benchmark run.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
    #[error("statistics error: {0}")]
    Stats(#[from] StatsError),
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl BenchError {
    /// Returns the process exit code reporting this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Device(_) => 2,
            Self::Config(_) | Self::Stats(_) | Self::Io(_) => 1,
        }
    }
}

// CAPABILITIES
// ================================================================================================

/// Durations of the three phases of a batch trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrialTiming {
    /// Staging the passwords of the batch.
    pub staging: Duration,
    /// The blocking device computation; the only phase recorded as a sample.
    pub compute: Duration,
    /// Retrieving the hashes of the batch.
    pub retrieval: Duration,
}

impl TrialTiming {
    /// Returns the computation phase in nanoseconds, saturating at [Nanosecs::MAX].
    pub fn compute_nanos(&self) -> Nanosecs {
        Nanosecs::try_from(self.compute.as_nanos()).unwrap_or(Nanosecs::MAX)
    }
}

/// Executes timed trials of batch hashing.
pub trait Argon2Runner {
    /// Stages one batch of passwords from `passwords`, computes it and retrieves the hashes.
    fn run_benchmark(
        &mut self,
        config: &BenchmarkConfig,
        passwords: &mut dyn PasswordGenerator,
    ) -> Result<TrialTiming, DeviceError>;
}

/// Sets up a runner for a backend and hands it to a [BenchmarkDirector].
pub trait BenchmarkExecutive {
    fn run_benchmark(
        &self,
        director: &BenchmarkDirector,
        out: &mut dyn io::Write,
    ) -> Result<(), BenchError>;
}

// BENCHMARK DIRECTOR
// ================================================================================================

/// Runs the configured number of trials and reports their statistics.
#[derive(Debug, Clone)]
pub struct BenchmarkDirector {
    config: BenchmarkConfig,
}

impl BenchmarkDirector {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Runs the benchmark with time-seeded pseudo-random passwords and writes the report to
    /// `out`.
    pub fn run_benchmark(
        &self,
        runner: &mut dyn Argon2Runner,
        out: &mut dyn io::Write,
    ) -> Result<(), BenchError> {
        let mut passwords = DummyPasswordGenerator::new();
        self.run_benchmark_with(runner, &mut passwords, out)
    }

    /// Runs the benchmark with passwords taken from `passwords`.
    pub fn run_benchmark_with(
        &self,
        runner: &mut dyn Argon2Runner,
        passwords: &mut dyn PasswordGenerator,
        out: &mut dyn io::Write,
    ) -> Result<(), BenchError> {
        let stats = self.collect(runner, passwords, out)?;

        match self.config.output() {
            OutputSelection::Verbose => write_summary(&stats, out),
            OutputSelection::Report { output_type, mode } => {
                let data = match output_type {
                    OutputType::Nanoseconds => stats.nanoseconds(),
                    OutputType::NanosecsPerHash => stats.nanosecs_per_hash(),
                };
                write_report(data, mode, out)
            },
        }
    }

    fn collect(
        &self,
        runner: &mut dyn Argon2Runner,
        passwords: &mut dyn PasswordGenerator,
        out: &mut dyn io::Write,
    ) -> Result<RunTimeStats, BenchError> {
        let verbose = self.config.is_verbose();
        let mut stats = RunTimeStats::new(self.config.batch_size());

        for sample in 0..self.config.samples().get() {
            if verbose {
                writeln!(out, "  Sample {sample}...")?;
            }
            let timing = runner.run_benchmark(&self.config, passwords)?;
            debug!(
                sample,
                staging_ns = timing.staging.as_nanos() as u64,
                compute_ns = timing.compute_nanos(),
                retrieval_ns = timing.retrieval.as_nanos() as u64,
                "trial complete"
            );
            if verbose {
                let ns = |d: Duration| format_nanos(d.as_nanos() as f64);
                writeln!(out, "    Writing took     {}", ns(timing.staging))?;
                writeln!(out, "    Computation took {}", ns(timing.compute))?;
                writeln!(out, "    Reading took     {}", ns(timing.retrieval))?;
            }
            stats.add_sample(timing.compute_nanos())?;
        }

        stats.close()?;
        Ok(stats)
    }
}

// RENDERING
// ================================================================================================

fn write_summary(stats: &RunTimeStats, out: &mut dyn io::Write) -> Result<(), BenchError> {
    let time = stats.nanoseconds();
    writeln!(out, "Mean computation time: {}", format_nanos(time.mean()?))?;
    writeln!(
        out,
        "Mean deviation: {} ({:.3}%)",
        format_nanos(time.mean_deviation()?),
        time.mean_deviation_per_mean()? * 100.0
    )?;

    let per_hash = stats.nanosecs_per_hash();
    writeln!(out, "Mean computation time (per hash): {}", format_nanos(per_hash.mean()?))?;
    writeln!(out, "Mean deviation (per hash): {}", format_nanos(per_hash.mean_deviation()?))?;
    Ok(())
}

fn write_report(
    data: &DataSet,
    mode: OutputMode,
    out: &mut dyn io::Write,
) -> Result<(), BenchError> {
    match mode {
        OutputMode::Raw => {
            for sample in data.samples() {
                writeln!(out, "{sample}")?;
            }
        },
        OutputMode::Mean => writeln!(out, "{}", data.mean()?)?,
        OutputMode::MeanAndMdev => {
            writeln!(out, "{}", data.mean()?)?;
            writeln!(out, "{}", data.mean_deviation()?)?;
        },
    }
    Ok(())
}
