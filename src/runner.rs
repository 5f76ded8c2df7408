//! Runs the FFT rider for every problem size of a [`BenchmarkCase`] and
//! stores one data row per size.
use std::fs::{self, File, OpenOptions};
use std::io::Write;

use tracing::{info, warn};

use crate::case::{BenchmarkCase, Layout, Precision, ProblemSize};
use crate::error::Result;
use crate::options::{DataKind, RunConfiguration};
use crate::process::{Captured, Invocation};
use crate::samples::{DataRow, SampleSet};

/// Executes benchmark cases one rider invocation at a time.
#[derive(Debug, Clone)]
pub struct CaseRunner {
    rider: String,
    device: usize,
    kind: DataKind,
    step_logs: bool,
    dry_run: bool,
}

impl CaseRunner {
    pub fn new(rider: impl Into<String>, device: usize, kind: DataKind) -> Self {
        CaseRunner {
            rider: rider.into(),
            device,
            kind,
            step_logs: true,
            dry_run: false,
        }
    }

    pub fn from_config(config: &RunConfiguration) -> Self {
        CaseRunner::new(config.rider.clone(), config.device, config.primary)
            .with_step_logs(config.step_logs)
            .with_dry_run(config.dry_run)
    }

    /// Append every invocation's output to `<data file>.log`
    pub fn with_step_logs(mut self, step_logs: bool) -> Self {
        self.step_logs = step_logs;
        self
    }

    /// Print the rider command lines instead of running them
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The rider command line for one problem size of `case`.
    pub fn invocation(&self, case: &BenchmarkCase, size: ProblemSize) -> Invocation {
        let codes = case.kind.rider_codes(case.direction);

        let mut inv = Invocation::new(case.input_dir.join(&self.rider))
            .current_dir(&case.input_dir)
            .args(["-x".to_string(), size.x.to_string()])
            .args(["-y".to_string(), size.y.to_string()])
            .args(["-z".to_string(), size.z.to_string()])
            .args(["-N".to_string(), case.samples.to_string()]);
        if case.precision == Precision::Double {
            inv = inv.arg("--double");
        }
        inv = inv
            .args(["-b".to_string(), case.batch.to_string()])
            .args(["--device".to_string(), self.device.to_string()])
            .args(["--transformType".to_string(), codes.transform.to_string()])
            .args(["--inArrType".to_string(), codes.input.to_string()])
            .args(["--outArrType".to_string(), codes.output.to_string()]);
        if case.layout == Layout::OutOfPlace {
            inv = inv.arg("-o");
        }
        inv
    }

    /// Runs the rider once. Every failure is logged and gives an empty set.
    pub fn run_step(&self, case: &BenchmarkCase, size: ProblemSize) -> SampleSet {
        let inv = self.invocation(case, size);
        let captured = match inv.run() {
            Ok(captured) => captured,
            Err(e) => {
                warn!("{e}");
                return SampleSet::new();
            }
        };

        if self.step_logs {
            if let Err(e) = append_step_log(case, &inv, &captured) {
                warn!(log = %case.log_file().display(), "could not write step log: {e}");
            }
        }

        if !captured.success() {
            warn!(
                command = %inv.command_line(),
                status = %captured.status,
                "rider invocation failed"
            );
            return SampleSet::new();
        }

        let prefix = self.kind.output_prefix();
        match SampleSet::from_lines(captured.matching_lines(prefix), self.kind) {
            Ok(samples) => {
                if samples.is_empty() {
                    warn!(
                        command = %inv.command_line(),
                        "no line starting with {prefix:?} in rider output"
                    );
                }
                samples
            }
            Err(e) => {
                warn!(command = %inv.command_line(), "{e}");
                SampleSet::new()
            }
        }
    }

    /// Runs every problem size of `case`, writing the data file from scratch.
    ///
    /// Rider failures only empty the corresponding row; the error case is
    /// reserved for the data file itself.
    pub fn run_case(&self, case: &BenchmarkCase) -> Result<Vec<DataRow>> {
        if self.dry_run {
            for size in case.sizes() {
                println!("{}", self.invocation(case, size).command_line());
            }
            return Ok(Vec::new());
        }

        info!(
            file = %case.output_file.display(),
            label = %case.label,
            "running {} sizes",
            case.sizes().count()
        );
        let mut out = File::create(&case.output_file)?;
        if self.step_logs {
            File::create(case.log_file())?;
        }

        let mut rows = Vec::new();
        for size in case.sizes() {
            let samples = self.run_step(case, size);
            info!(x = size.x, y = size.y, z = size.z, samples = samples.len(), "done");
            let row = DataRow::new(size.x, samples);
            row.write_to(&mut out)?;
            rows.push(row);
        }
        Ok(rows)
    }
}

fn append_step_log(
    case: &BenchmarkCase,
    inv: &Invocation,
    captured: &Captured,
) -> std::io::Result<()> {
    let path = case.log_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut log = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(log, "$ {}", inv.command_line())?;
    log.write_all(captured.stdout.as_bytes())?;
    log.write_all(captured.stderr.as_bytes())?;
    writeln!(log, "[{}]", captured.status)
}
