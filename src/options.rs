use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Settings for one orchestration run.
///
/// Built once from the command line (see [`crate::cli`]) and only read
/// afterwards. [`RunConfiguration::default`] describes a single build in the
/// current directory timed with the full benchmark sweep.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    /// Builds under test, each with its own data directory and legend label
    pub directories: Vec<DirectoryPair>,
    pub run_type: RunType,
    /// Subset of {1, 2, 3}, in the order the sweeps run
    pub dimensions: Vec<u8>,
    /// Shrink every size range for quick iteration
    pub short_run: bool,
    /// Replaces the radix of benchmark and report sweeps
    pub radix: Option<usize>,
    /// Replaces the batch sizes of every sweep
    pub batch: Option<usize>,
    pub aspect_ratio: [usize; 2],
    pub samples: usize,
    pub device: usize,
    pub primary: DataKind,
    pub secondary: Option<DataKind>,
    pub format: DocumentFormat,
    /// Where plots and the generated document are written
    pub doc_dir: PathBuf,
    /// File name of the FFT binary inside each input directory
    pub rider: String,
    pub plot_script: PathBuf,
    /// Print the planned commands without running anything
    pub dry_run: bool,
    pub plots: bool,
    /// Run the FFT binary. Off means plotting data already on disk.
    pub benchmarks: bool,
    pub speedup: bool,
    /// Keep `<data file>.log` with the output of every rider invocation
    pub step_logs: bool,
    pub collect_specs: bool,
    pub device_probe: String,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        RunConfiguration {
            directories: vec![DirectoryPair::new(".", ".", "dir0")],
            run_type: RunType::default(),
            dimensions: vec![1, 2, 3],
            short_run: false,
            radix: None,
            batch: None,
            aspect_ratio: [1, 1],
            samples: 10,
            device: 0,
            primary: DataKind::default(),
            secondary: None,
            format: DocumentFormat::default(),
            doc_dir: PathBuf::from("."),
            rider: DEFAULT_RIDER.to_string(),
            plot_script: PathBuf::from(DEFAULT_PLOT_SCRIPT),
            dry_run: false,
            plots: true,
            benchmarks: true,
            speedup: false,
            step_logs: true,
            collect_specs: false,
            device_probe: DEFAULT_DEVICE_PROBE.to_string(),
        }
    }
}

pub const DEFAULT_RIDER: &str = "rocfft-rider";
pub const DEFAULT_PLOT_SCRIPT: &str = "datagraphs.asy";
pub const DEFAULT_DEVICE_PROBE: &str = "rocminfo";

/// Labels and data file paths reach the plot script as quoted,
/// comma-separated lists
const PLOT_LIST_RESERVED: &[char] = &[',', '"'];

impl RunConfiguration {
    /// Number of builds the plots compare against each other, 0 when the
    /// comparison is off.
    pub fn speedup_count(&self) -> usize {
        if self.speedup {
            self.directories.len()
        } else {
            0
        }
    }

    /// Checks the settings that do not depend on the filesystem.
    pub fn validate(&self) -> Result<()> {
        if self.directories.is_empty() {
            return Err(Error::Config("at least one input directory is required".into()));
        }
        if self.dimensions.is_empty() {
            return Err(Error::Config("no dimension selected".into()));
        }
        if let Some(d) = self.dimensions.iter().find(|d| !(1..=3).contains(*d)) {
            return Err(Error::Config(format!("invalid dimension: {d}")));
        }
        if self.radix.is_some_and(|r| r < 2) {
            return Err(Error::Config("radix must be at least 2".into()));
        }
        if self.batch == Some(0) {
            return Err(Error::Config("batch size must be at least 1".into()));
        }
        if self.samples == 0 {
            return Err(Error::Config("sample count must be at least 1".into()));
        }
        if self.aspect_ratio.contains(&0) {
            return Err(Error::Config("aspect ratio entries must be at least 1".into()));
        }
        if self.secondary.is_some_and(|s| s != DataKind::Gflops) {
            return Err(Error::Config("the secondary axis can only show GFLOP/s".into()));
        }

        for pair in &self.directories {
            if pair.label.contains(PLOT_LIST_RESERVED) {
                return Err(Error::Config(format!(
                    "label {:?} contains ',' or '\"'",
                    pair.label
                )));
            }
            if pair.output.to_string_lossy().contains(PLOT_LIST_RESERVED) {
                return Err(Error::Config(format!(
                    "output directory {} contains ',' or '\"'",
                    pair.output.display()
                )));
            }
        }

        let mut seen = HashSet::new();
        for pair in &self.directories {
            if !seen.insert(&pair.output) {
                return Err(Error::Config(format!(
                    "output directory {} is used twice",
                    pair.output.display()
                )));
            }
        }
        Ok(())
    }

    /// Resolves every input directory to an absolute path and makes sure the
    /// rider binary exists in it.
    pub fn locate_riders(&mut self) -> Result<()> {
        for pair in &mut self.directories {
            let rider = pair.input.join(&self.rider);
            if !rider.is_file() {
                return Err(Error::MissingBinary(rider));
            }
            pair.input = pair.input.canonicalize()?;
        }
        Ok(())
    }
}

/// A build directory, the directory its results go to, and its legend label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPair {
    pub input: PathBuf,
    pub output: PathBuf,
    pub label: String,
}

impl DirectoryPair {
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        label: impl Into<String>,
    ) -> Self {
        DirectoryPair {
            input: input.into(),
            output: output.into(),
            label: label.into(),
        }
    }
}

/// The family of sweeps to run
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RunType {
    #[default]
    /// Every dimension, precision, transform kind and batch size
    Benchmark,
    /// One batch size, both layouts; a compact overview
    Report,
    /// Scaling over radices 2, 3, 5 and 7
    Efficiency,
}

/// What the rider output is read as, and what the plot axis shows
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DataKind {
    #[default]
    /// Execution time in seconds
    Time,
    /// Throughput in GFLOP/s
    Gflops,
    /// GFLOP/s against the device roofline
    Roofline,
}

impl DataKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DataKind::Time => "time",
            DataKind::Gflops => "gflops",
            DataKind::Roofline => "roofline",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DocumentFormat {
    #[default]
    /// LaTeX compiled with latexmk
    Pdf,
    /// Word-processor document
    Docx,
}
