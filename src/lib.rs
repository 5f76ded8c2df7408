//! Benchmark sweeps for an external FFT benchmark binary.
//!
//! A run enumerates [`planner::Figure`]s from a [`RunConfiguration`], runs
//! the benchmark binary (the *rider*) once per problem size of every
//! [`case::BenchmarkCase`], and stores the measured samples as tab-separated
//! data files. The [`report::ReportAssembler`] then plots every figure with
//! `asy` and typesets the plots into a single PDF or docx report.
//!
//! ```no_run
//! use fftbench::{run, RunConfiguration};
//!
//! let mut config = RunConfiguration::default();
//! config.dimensions = vec![1];
//! config.short_run = true;
//! let summary = run(config)?;
//! println!("{} figures in the report", summary.figures_in_document);
//! # Ok::<(), fftbench::Error>(())
//! ```
use std::fs;

use tracing::{debug, info, warn};

pub mod case;
pub mod cli;
pub mod error;
pub mod options;
pub mod planner;
pub mod process;
pub mod report;
pub mod runner;
pub mod samples;

pub use crate::case::{BenchmarkCase, Direction, Layout, Precision, ProblemSize, TransformKind};
pub use crate::error::{Error, Result};
pub use crate::options::{DataKind, DirectoryPair, DocumentFormat, RunConfiguration, RunType};
pub use crate::planner::{Figure, SweepPlanner};
pub use crate::report::ReportAssembler;
pub use crate::runner::CaseRunner;

use crate::process::find_on_path;
use crate::report::specs::{self, Sidecars};
use crate::samples::read_data_file;

/// What a finished run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub figures: usize,
    /// Cases whose rider invocations were attempted
    pub cases_run: usize,
    /// Cases whose data file could not be written
    pub cases_failed: usize,
    /// Data rows without a single sample
    pub empty_rows: usize,
    pub figures_in_document: usize,
}

/// Plans, runs and reports one configuration.
///
/// Only configuration problems, a missing binary or tool, and I/O errors on
/// the output directories end the run early. Everything that goes wrong for a
/// single size, case or figure is logged and skipped.
pub fn run(mut config: RunConfiguration) -> Result<RunSummary> {
    config.validate()?;
    let figures = SweepPlanner::from_config(&config).plan()?;
    let steps: usize = figures.iter().map(Figure::step_count).sum();
    info!(figures = figures.len(), steps, run_type = ?config.run_type, "sweep planned");

    let mut summary = RunSummary {
        figures: figures.len(),
        ..RunSummary::default()
    };

    if !config.dry_run {
        for pair in &config.directories {
            fs::create_dir_all(&pair.output)?;
        }
        if config.plots {
            fs::create_dir_all(&config.doc_dir)?;
        }
    }

    if config.plots && !config.dry_run {
        for &tool in ReportAssembler::new(&config, Vec::new()).required_tools() {
            if find_on_path(tool).is_none() {
                return Err(Error::MissingBinary(tool.into()));
            }
        }
    }

    if config.benchmarks {
        if !config.dry_run {
            config.locate_riders()?;
        }
        if config.collect_specs && !config.dry_run {
            let sidecars = specs::collect(&config.device_probe);
            for pair in &config.directories {
                sidecars.store(&pair.output)?;
                debug!(dir = %pair.output.display(), "specs written");
            }
        }

        // paths are replanned against the resolved input directories
        let figures = SweepPlanner::from_config(&config).plan()?;
        let runner = CaseRunner::from_config(&config);
        for figure in &figures {
            info!(figure = %figure.name, "{}", figure.caption);
            for case in &figure.cases {
                summary.cases_run += 1;
                match runner.run_case(case) {
                    Ok(rows) => {
                        summary.empty_rows += rows.iter().filter(|r| r.samples.is_empty()).count();
                    }
                    Err(e) => {
                        summary.cases_failed += 1;
                        warn!(file = %case.output_file.display(), "case failed: {e}");
                    }
                }
            }
        }
    }

    if config.dry_run {
        if config.plots {
            let sidecars = vec![Sidecars::default(); config.directories.len()];
            let assembler = ReportAssembler::new(&config, sidecars);
            summary.figures_in_document = assembler.assemble(&figures)?;
        }
        return Ok(summary);
    }

    log_medians(&figures);

    if config.plots {
        let sidecars = config
            .directories
            .iter()
            .map(|pair| Sidecars::load(&pair.output))
            .collect::<Result<Vec<_>>>()?;
        let assembler = ReportAssembler::new(&config, sidecars);
        summary.figures_in_document = assembler.assemble(&figures)?;
    }

    info!(
        cases = summary.cases_run,
        failed = summary.cases_failed,
        empty_rows = summary.empty_rows,
        "run finished"
    );
    Ok(summary)
}

/// Logs the median of every row of every data file the figures point at.
fn log_medians(figures: &[Figure]) {
    for figure in figures {
        for case in &figure.cases {
            let rows = match read_data_file(&case.output_file) {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(file = %case.output_file.display(), "{e}");
                    continue;
                }
            };
            for row in rows {
                match row.samples.median() {
                    Some(median) => info!(
                        figure = %figure.name,
                        label = %case.label,
                        size = row.size,
                        median
                    ),
                    None => info!(
                        figure = %figure.name,
                        label = %case.label,
                        size = row.size,
                        "no samples"
                    ),
                }
            }
        }
    }
}
