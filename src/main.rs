use std::{
    io::{self, Write},
    process::ExitCode,
};

use argon2_bench::{
    bench::{
        BackendMode, BenchError, BenchmarkConfig, BenchmarkDirector, BenchmarkExecutive,
        CostParams, DeviceExecutive, OutputSelection,
    },
    device::cpu::CpuBackend,
    logging, Argon2Type, Argon2Version, ConfigError,
};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "argon2-bench",
    about = "Benchmarks batched Argon2 hashing on a compute device",
    rename_all = "kebab-case"
)]
pub struct BenchmarkCmd {
    /// List available devices and exit
    #[arg(short = 'l', long = "list-devices")]
    list_devices: bool,
    /// Pipeline implementation: opencl or cpu
    #[arg(short = 'm', long = "mode", default_value = "cpu")]
    mode: String,
    /// Index of the device to benchmark
    #[arg(short = 'd', long = "device", default_value = "0")]
    device: usize,
    /// Statistics view to report: ns or ns-per-hash
    #[arg(short = 'o', long = "output-type", default_value = "ns")]
    output_type: String,
    /// Report format: verbose, raw, mean or mean-and-mdev
    #[arg(long = "output-mode", default_value = "verbose")]
    output_mode: String,
    /// Argon2 variant: i or d
    #[arg(short = 't', long = "type", default_value = "i")]
    variant: String,
    /// Argon2 version: 1.0 or 1.3
    #[arg(short = 'v', long = "version", default_value = "1.3")]
    version: String,
    /// Number of passes over memory
    #[arg(short = 'T', long = "t-cost", default_value = "1")]
    t_cost: u32,
    /// Memory size in KiB
    #[arg(short = 'M', long = "m-cost", default_value = "1024")]
    m_cost: u32,
    /// Degree of parallelism
    #[arg(short = 'L', long = "lanes", default_value = "1")]
    lanes: u32,
    /// Number of passwords hashed per trial
    #[arg(short = 'b', long = "batch-size", default_value = "16")]
    batch_size: usize,
    /// Number of timed trials
    #[arg(short = 's', long = "samples", default_value = "10")]
    samples: usize,
}

fn main() -> ExitCode {
    logging::init();
    let args = BenchmarkCmd::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err}", env!("CARGO_BIN_NAME"));
            ExitCode::from(err.exit_code())
        },
    }
}

/// Validates the arguments and runs the benchmark on the selected backend.
fn run(args: &BenchmarkCmd) -> Result<(), BenchError> {
    let mode: BackendMode = args.mode.parse()?;
    let variant: Argon2Type = args.variant.parse()?;
    let version: Argon2Version = args.version.parse()?;
    let output = OutputSelection::parse(&args.output_mode, &args.output_type)?;

    let costs = CostParams {
        t_cost: args.t_cost,
        m_cost: args.m_cost,
        lanes: args.lanes,
    };
    let config =
        BenchmarkConfig::new(variant, version, costs, args.batch_size, args.samples, output)?;
    let director = BenchmarkDirector::new(config);

    let mut stdout = io::stdout().lock();
    match mode {
        BackendMode::Cpu => {
            info!(%variant, %version, ?costs, "running benchmark on the CPU backend");
            let backend = CpuBackend::new();
            DeviceExecutive::new(&backend, args.device, args.list_devices)
                .run_benchmark(&director, &mut stdout)?;
        },
        BackendMode::OpenCl => return Err(ConfigError::BackendUnavailable("OpenCL").into()),
    }
    stdout.flush()?;
    Ok(())
}
