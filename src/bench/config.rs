use core::{num::NonZeroUsize, str::FromStr};

use crate::params::{Argon2Type, Argon2Version, ConfigError, HashParams};

// CONSTANTS
// ================================================================================================

/// Length of the hashes computed by benchmark trials.
pub const HASH_LENGTH: usize = 32;

/// Salt shared by every benchmark hash; Argon2 rejects salts shorter than 8 bytes.
pub const BENCHMARK_SALT: [u8; 16] = [0; 16];

// OUTPUT SELECTION
// ================================================================================================

/// Which view of the run statistics a report prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    /// Absolute duration of each batch trial (`ns`).
    Nanoseconds,
    /// Batch duration divided by the batch size (`ns-per-hash`).
    NanosecsPerHash,
}

impl FromStr for OutputType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ns" => Ok(Self::Nanoseconds),
            "ns-per-hash" => Ok(Self::NanosecsPerHash),
            _ => Err(ConfigError::InvalidOutputType(s.into())),
        }
    }
}

/// How a report renders the selected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Every sample on its own line, in collection order.
    Raw,
    /// The mean only.
    Mean,
    /// The mean, then the mean deviation.
    MeanAndMdev,
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(Self::Raw),
            "mean" => Ok(Self::Mean),
            "mean-and-mdev" => Ok(Self::MeanAndMdev),
            _ => Err(ConfigError::InvalidOutputMode(s.into())),
        }
    }
}

/// The output requested for a benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSelection {
    /// Human-readable progress and summary of both views.
    Verbose,
    /// Machine-readable output of a single view.
    Report { output_type: OutputType, mode: OutputMode },
}

impl OutputSelection {
    /// Parses the `--output-mode` and `--output-type` arguments.
    ///
    /// The output type is ignored in verbose mode. Otherwise it is validated before the mode.
    pub fn parse(mode: &str, output_type: &str) -> Result<Self, ConfigError> {
        if mode == "verbose" {
            return Ok(Self::Verbose);
        }
        let output_type = output_type.parse()?;
        let mode = mode.parse()?;
        Ok(Self::Report { output_type, mode })
    }
}

// BACKEND MODE
// ================================================================================================

/// The pipeline implementation selected with `--mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    OpenCl,
    Cpu,
}

impl FromStr for BackendMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opencl" => Ok(Self::OpenCl),
            "cpu" => Ok(Self::Cpu),
            _ => Err(ConfigError::InvalidMode(s.into())),
        }
    }
}

// BENCHMARK CONFIG
// ================================================================================================

/// Argon2 cost parameters of a benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostParams {
    pub t_cost: u32,
    pub m_cost: u32,
    pub lanes: u32,
}

/// Immutable configuration of a benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkConfig {
    variant: Argon2Type,
    version: Argon2Version,
    costs: CostParams,
    batch_size: NonZeroUsize,
    samples: NonZeroUsize,
    output: OutputSelection,
}

impl BenchmarkConfig {
    /// Returns a new configuration.
    ///
    /// # Errors
    /// Returns an error if the batch size, the sample count or any cost parameter is zero.
    pub fn new(
        variant: Argon2Type,
        version: Argon2Version,
        costs: CostParams,
        batch_size: usize,
        samples: usize,
        output: OutputSelection,
    ) -> Result<Self, ConfigError> {
        let named_costs =
            [("t-cost", costs.t_cost), ("m-cost", costs.m_cost), ("lanes", costs.lanes)];
        for (name, value) in named_costs {
            if value == 0 {
                return Err(ConfigError::ZeroValue { name });
            }
        }
        let batch_size =
            NonZeroUsize::new(batch_size).ok_or(ConfigError::ZeroValue { name: "batch-size" })?;
        let samples = NonZeroUsize::new(samples).ok_or(ConfigError::ZeroValue { name: "samples" })?;

        Ok(Self {
            variant,
            version,
            costs,
            batch_size,
            samples,
            output,
        })
    }

    pub fn variant(&self) -> Argon2Type {
        self.variant
    }

    pub fn version(&self) -> Argon2Version {
        self.version
    }

    pub fn costs(&self) -> CostParams {
        self.costs
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    pub fn samples(&self) -> NonZeroUsize {
        self.samples
    }

    pub fn output(&self) -> OutputSelection {
        self.output
    }

    pub fn is_verbose(&self) -> bool {
        self.output == OutputSelection::Verbose
    }

    /// Returns the parameters every hash of a trial is computed with.
    pub fn hash_params(&self) -> HashParams {
        HashParams::new(
            HASH_LENGTH,
            &BENCHMARK_SALT,
            self.costs.t_cost,
            self.costs.m_cost,
            self.costs.lanes,
        )
    }
}
