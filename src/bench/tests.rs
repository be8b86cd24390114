use std::{collections::VecDeque, time::Duration};

use assert_matches::assert_matches;

use super::*;
use crate::{
    device::{
        testing::{Event, MockBackend},
        ComputeBackend,
    },
    params::{Argon2Type, Argon2Version},
};

// HELPERS
// ================================================================================================

/// Replays fixed computation times and counts the passwords it consumes.
struct ScriptedRunner {
    compute_ns: VecDeque<u64>,
    passwords_consumed: usize,
}

impl ScriptedRunner {
    fn new(compute_ns: &[u64]) -> Self {
        Self {
            compute_ns: compute_ns.iter().copied().collect(),
            passwords_consumed: 0,
        }
    }
}

impl Argon2Runner for ScriptedRunner {
    fn run_benchmark(
        &mut self,
        config: &BenchmarkConfig,
        passwords: &mut dyn PasswordGenerator,
    ) -> Result<TrialTiming, DeviceError> {
        for _ in 0..config.batch_size().get() {
            passwords.next_password();
            self.passwords_consumed += 1;
        }
        let compute = self.compute_ns.pop_front().expect("runner called too often");
        Ok(TrialTiming {
            staging: Duration::from_nanos(1),
            compute: Duration::from_nanos(compute),
            retrieval: Duration::from_nanos(1),
        })
    }
}

/// Yields single-byte passwords 0, 1, 2, ...
struct CountingGenerator {
    next: u8,
    buffer: [u8; 1],
}

impl PasswordGenerator for CountingGenerator {
    fn next_password(&mut self) -> &[u8] {
        self.buffer = [self.next];
        self.next = self.next.wrapping_add(1);
        &self.buffer
    }
}

fn config(batch_size: usize, samples: usize, output: OutputSelection) -> BenchmarkConfig {
    let costs = CostParams { t_cost: 1, m_cost: 64, lanes: 1 };
    BenchmarkConfig::new(Argon2Type::I, Argon2Version::V13, costs, batch_size, samples, output)
        .unwrap()
}

fn report(output_type: OutputType, mode: OutputMode) -> OutputSelection {
    OutputSelection::Report { output_type, mode }
}

fn render(config: BenchmarkConfig, compute_ns: &[u64]) -> String {
    let director = BenchmarkDirector::new(config);
    let mut runner = ScriptedRunner::new(compute_ns);
    let mut passwords = DummyPasswordGenerator::with_seed(7);
    let mut out = Vec::new();
    director.run_benchmark_with(&mut runner, &mut passwords, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

// CONFIGURATION
// ================================================================================================

#[test]
fn output_selection_parsing() {
    assert_eq!(OutputSelection::parse("verbose", "anything").unwrap(), OutputSelection::Verbose);
    assert_eq!(
        OutputSelection::parse("mean-and-mdev", "ns-per-hash").unwrap(),
        report(OutputType::NanosecsPerHash, OutputMode::MeanAndMdev)
    );
    assert_matches!(
        OutputSelection::parse("raw", "ms"),
        Err(ConfigError::InvalidOutputType(t)) if t == "ms"
    );
    assert_matches!(
        OutputSelection::parse("median", "ns"),
        Err(ConfigError::InvalidOutputMode(m)) if m == "median"
    );
    // the output type is checked first
    assert_matches!(OutputSelection::parse("median", "ms"), Err(ConfigError::InvalidOutputType(_)));
}

#[test]
fn backend_mode_parsing() {
    assert_eq!("cpu".parse::<BackendMode>().unwrap(), BackendMode::Cpu);
    assert_eq!("opencl".parse::<BackendMode>().unwrap(), BackendMode::OpenCl);
    assert_matches!("cuda".parse::<BackendMode>(), Err(ConfigError::InvalidMode(_)));
}

#[test]
fn config_rejects_zero_values() {
    let output = OutputSelection::Verbose;
    let costs = CostParams { t_cost: 1, m_cost: 64, lanes: 1 };
    let new = |costs, batch_size, samples| {
        BenchmarkConfig::new(Argon2Type::D, Argon2Version::V10, costs, batch_size, samples, output)
    };

    assert_matches!(new(costs, 0, 1), Err(ConfigError::ZeroValue { name: "batch-size" }));
    assert_matches!(new(costs, 1, 0), Err(ConfigError::ZeroValue { name: "samples" }));
    assert_matches!(
        new(CostParams { lanes: 0, ..costs }, 1, 1),
        Err(ConfigError::ZeroValue { name: "lanes" })
    );

    let config = new(costs, 4, 2).unwrap();
    let params = config.hash_params();
    assert_eq!(params.output_len, HASH_LENGTH);
    assert_eq!(params.salt, BENCHMARK_SALT);
    assert_eq!((params.t_cost, params.m_cost, params.lanes), (1, 64, 1));
}

// PASSWORD GENERATOR
// ================================================================================================

#[test]
fn dummy_passwords_are_64_random_bytes() {
    let mut generator = DummyPasswordGenerator::new();
    let mut previous = generator.next_password().to_vec();
    let mut any_nonzero = previous.iter().any(|&b| b != 0);

    for _ in 0..100 {
        let password = generator.next_password();
        assert_eq!(password.len(), PASSWORD_LENGTH);
        assert_ne!(password, previous.as_slice());
        any_nonzero |= password.iter().any(|&b| b != 0);
        previous = password.to_vec();
    }
    assert!(any_nonzero);
}

#[test]
fn seeded_password_streams_repeat() {
    let mut a = DummyPasswordGenerator::with_seed(42);
    let mut b = DummyPasswordGenerator::with_seed(42);
    for _ in 0..10 {
        let expected = a.next_password().to_vec();
        assert_eq!(b.next_password(), expected.as_slice());
    }
}

// RENDERING
// ================================================================================================

#[test]
fn raw_mode_prints_samples_in_order() {
    let output = render(config(1, 3, report(OutputType::Nanoseconds, OutputMode::Raw)), &[10, 20, 30]);
    assert_eq!(output, "10\n20\n30\n");
}

#[test]
fn mean_mode_prints_mean() {
    let output = render(config(1, 3, report(OutputType::Nanoseconds, OutputMode::Mean)), &[10, 20, 30]);
    assert_eq!(output, "20\n");
}

#[test]
fn mean_and_mdev_mode_prints_both() {
    let selection = report(OutputType::Nanoseconds, OutputMode::MeanAndMdev);
    let output = render(config(1, 3, selection), &[10, 20, 30]);
    assert_eq!(output, "20\n6.666666666666667\n");
}

#[test]
fn per_hash_view_divides_by_batch_size() {
    let selection = report(OutputType::NanosecsPerHash, OutputMode::Raw);
    let output = render(config(4, 2, selection), &[10, 400]);
    assert_eq!(output, "2.5\n100\n");
}

#[test]
fn verbose_mode_prints_progress_and_summary() {
    let output = render(config(2, 2, OutputSelection::Verbose), &[1_000, 3_000]);
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines[0], "  Sample 0...");
    assert_eq!(lines[2], "    Computation took 1.000 us");
    assert_eq!(lines[4], "  Sample 1...");
    assert_eq!(lines[8], "Mean computation time: 2.000 us");
    assert_eq!(lines[9], "Mean deviation: 1.000 us (50.000%)");
    assert_eq!(lines[10], "Mean computation time (per hash): 1.000 us");
    assert_eq!(lines[11], "Mean deviation (per hash): 500.000 ns");
    assert_eq!(lines.len(), 12);
}

#[test]
fn director_pulls_one_password_per_slot() {
    let director = BenchmarkDirector::new(config(3, 4, report(OutputType::Nanoseconds, OutputMode::Mean)));
    let mut runner = ScriptedRunner::new(&[1, 2, 3, 4]);
    let mut out = Vec::new();
    director.run_benchmark(&mut runner, &mut out).unwrap();

    assert_eq!(runner.passwords_consumed, 12);
    assert!(runner.compute_ns.is_empty());
}

// DEVICE RUNNER
// ================================================================================================

#[test]
fn device_runner_follows_stage_process_retrieve_order() {
    let backend = MockBackend::with_devices(1);
    let device = &backend.devices()[0];
    let config = config(3, 1, OutputSelection::Verbose);
    let program = backend
        .build_program(core::slice::from_ref(device), config.variant(), config.version())
        .unwrap();
    let mut runner = DeviceRunner::new(&backend, &program, device, &config).unwrap();
    let mut passwords = CountingGenerator { next: 0, buffer: [0] };

    runner.run_benchmark(&config, &mut passwords).unwrap();

    assert_eq!(runner.unit().passwords(), &[vec![0u8], vec![1], vec![2]]);
    assert_eq!(
        backend.events(),
        vec![
            Event::MapInput,
            Event::Write(0),
            Event::Write(1),
            Event::Write(2),
            Event::UnmapInput,
            Event::Begin,
            Event::End,
            Event::MapOutput,
            Event::Read(0),
            Event::Read(1),
            Event::Read(2),
            Event::UnmapOutput,
        ]
    );
    let (params, batch_size) = backend.units_built.borrow()[0].clone();
    assert_eq!(batch_size, 3);
    assert_eq!(params, config.hash_params());
}

// DEVICE EXECUTIVE
// ================================================================================================

#[test]
fn executive_lists_devices_without_benchmarking() {
    let backend = MockBackend::with_devices(3);
    let director = BenchmarkDirector::new(config(1, 1, OutputSelection::Verbose));
    let mut out = Vec::new();

    DeviceExecutive::new(&backend, 0, true).run_benchmark(&director, &mut out).unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Device #0: mock device 0\nDevice #1: mock device 1\nDevice #2: mock device 2\n"
    );
    assert!(backend.programs_built.borrow().is_empty());
    assert!(backend.events().is_empty());
}

#[test]
fn executive_accepts_every_valid_device_index() {
    for index in 0..3 {
        let backend = MockBackend::with_devices(3);
        let selection = report(OutputType::Nanoseconds, OutputMode::Raw);
        let director = BenchmarkDirector::new(config(2, 3, selection));
        let mut out = Vec::new();

        DeviceExecutive::new(&backend, index, false).run_benchmark(&director, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 3);
        assert_eq!(backend.programs_built.borrow().as_slice(), &[(Argon2Type::I, Argon2Version::V13)]);
        assert_eq!(backend.units_built.borrow().len(), 1);
    }
}

#[test]
fn executive_rejects_index_equal_to_device_count() {
    let backend = MockBackend::with_devices(3);
    let director = BenchmarkDirector::new(config(1, 1, OutputSelection::Verbose));
    let mut out = Vec::new();

    let err = DeviceExecutive::new(&backend, 3, false)
        .run_benchmark(&director, &mut out)
        .unwrap_err();

    assert_matches!(
        err,
        BenchError::Config(ConfigError::DeviceIndexOutOfRange { index: 3, count: 3 })
    );
    assert_eq!(err.exit_code(), 1);
    assert!(out.is_empty());
    assert!(backend.programs_built.borrow().is_empty());
    assert!(backend.units_built.borrow().is_empty());
}

#[test]
fn executive_reports_device_failures() {
    let backend = MockBackend { fail_processing: true, ..MockBackend::with_devices(1) };
    let director = BenchmarkDirector::new(config(2, 5, OutputSelection::Verbose));
    let mut out = Vec::new();

    let err = DeviceExecutive::new(&backend, 0, false)
        .run_benchmark(&director, &mut out)
        .unwrap_err();

    assert_matches!(err, BenchError::Device(DeviceError::Computation(_)));
    assert_eq!(err.exit_code(), 2);
    // the failed trial is the first and only one
    assert_eq!(backend.events().iter().filter(|e| **e == Event::Begin).count(), 1);
    assert_eq!(backend.events().last(), Some(&Event::End));
}
