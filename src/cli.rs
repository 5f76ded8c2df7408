use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;

use crate::error::{Error, Result};
use crate::options::{
    DataKind, DirectoryPair, DocumentFormat, RunConfiguration, RunType, DEFAULT_DEVICE_PROBE,
    DEFAULT_PLOT_SCRIPT, DEFAULT_RIDER,
};

/// Sweep an FFT benchmark binary over problem sizes and typeset the results
#[derive(Parser, Debug)]
#[command(name = "fftbench", version, about)]
pub struct Cli {
    /// Directory containing the FFT benchmark binary; repeat to compare builds
    #[arg(short = 'w', long = "input-dir", value_name = "DIR", required = true)]
    pub input_dirs: Vec<PathBuf>,

    /// Data directory for the input directory at the same position
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dirs: Vec<PathBuf>,

    /// Legend label for the input directory at the same position
    #[arg(short = 'l', long = "label", value_name = "TEXT")]
    pub labels: Vec<String>,

    /// Family of sweeps to run
    #[arg(long, value_enum, default_value_t = RunType::Benchmark)]
    pub run_type: RunType,

    /// Dimensions to sweep
    #[arg(
        short,
        long = "dimension",
        value_delimiter = ',',
        default_values_t = [1u8, 2, 3],
        value_parser = clap::value_parser!(u8).range(1..=3)
    )]
    pub dimensions: Vec<u8>,

    /// Shrink every size range for a quick run
    #[arg(long)]
    pub short: bool,

    /// Growth factor between problem sizes (benchmark and report runs)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(2..))]
    pub radix: Option<u64>,

    /// Batch size replacing the built-in ones
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch: Option<u64>,

    /// Length of the y and z axes relative to x
    #[arg(
        long,
        value_name = "Y,Z",
        value_delimiter = ',',
        default_values_t = [1usize, 1]
    )]
    pub aspect_ratio: Vec<usize>,

    /// Timed runs per problem size
    #[arg(
        short = 'N',
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub samples: u64,

    /// Device index passed to the benchmark binary
    #[arg(short = 'g', long, default_value_t = 0)]
    pub device: usize,

    /// What to measure and plot
    #[arg(long, value_enum, default_value_t = DataKind::Time)]
    pub primary: DataKind,

    /// Optional second plot axis
    #[arg(long, value_enum)]
    pub secondary: Option<DataKind>,

    /// Report format
    #[arg(long, value_enum, default_value_t = DocumentFormat::Pdf)]
    pub format: DocumentFormat,

    /// Directory for plots and the report (default: the first output directory)
    #[arg(long, value_name = "DIR")]
    pub doc_dir: Option<PathBuf>,

    /// File name of the benchmark binary inside each input directory
    #[arg(long, env = "FFTBENCH_RIDER", default_value = DEFAULT_RIDER)]
    pub rider: String,

    /// Asymptote script drawing the graphs
    #[arg(long, value_name = "FILE", default_value = DEFAULT_PLOT_SCRIPT)]
    pub plot_script: PathBuf,

    /// Print the commands that would run, and stop
    #[arg(long)]
    pub dry_run: bool,

    /// Skip plots and the report document
    #[arg(long)]
    pub no_plots: bool,

    /// Do not run benchmarks; build the report from existing data files
    #[arg(long, conflicts_with = "no_plots")]
    pub report_only: bool,

    /// Do not plot builds relative to each other
    #[arg(long)]
    pub no_speedup: bool,

    /// Do not keep the benchmark output next to each data file
    #[arg(long)]
    pub no_log: bool,

    /// Record host and device specs in every output directory first
    #[arg(long)]
    pub collect_specs: bool,

    /// Command printing device information for --collect-specs
    #[arg(long, value_name = "CMD", default_value = DEFAULT_DEVICE_PROBE)]
    pub device_probe: String,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Default filter directive for the log subscriber
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Pairs the directory lists and checks the result.
    ///
    /// Without any `--output-dir`, a single input directory writes to the
    /// current directory. Otherwise every input needs its own output.
    pub fn into_config(self) -> Result<RunConfiguration> {
        let output_dirs = match (self.output_dirs.is_empty(), self.input_dirs.len()) {
            (true, 1) => vec![PathBuf::from(".")],
            _ => self.output_dirs,
        };
        if output_dirs.len() != self.input_dirs.len() {
            return Err(Error::Config(format!(
                "{} input directories but {} output directories",
                self.input_dirs.len(),
                output_dirs.len()
            )));
        }
        if self.labels.len() > self.input_dirs.len() {
            return Err(Error::Config(format!(
                "{} labels for {} input directories",
                self.labels.len(),
                self.input_dirs.len()
            )));
        }

        let directories: Vec<DirectoryPair> = self
            .input_dirs
            .into_iter()
            .zip(output_dirs)
            .enumerate()
            .map(|(i, (input, output))| {
                let label = self
                    .labels
                    .get(i)
                    .filter(|l| !l.is_empty())
                    .cloned()
                    .unwrap_or_else(|| format!("dir{i}"));
                DirectoryPair::new(input, output, label)
            })
            .collect();

        let mut dimensions = self.dimensions;
        let mut seen = HashSet::new();
        dimensions.retain(|d| seen.insert(*d));

        let aspect_ratio = match self.aspect_ratio[..] {
            [y, z] => [y, z],
            _ => return Err(Error::Config("--aspect-ratio takes two values".into())),
        };

        let doc_dir = match (self.doc_dir, directories.first()) {
            (Some(dir), _) => dir,
            (None, Some(first)) => first.output.clone(),
            (None, None) => PathBuf::from("."),
        };

        let mut config = RunConfiguration::default();
        config.speedup = !self.no_speedup && directories.len() > 1;
        config.directories = directories;
        config.run_type = self.run_type;
        config.dimensions = dimensions;
        config.short_run = self.short;
        config.radix = self.radix.map(|r| r as usize);
        config.batch = self.batch.map(|b| b as usize);
        config.aspect_ratio = aspect_ratio;
        config.samples = self.samples as usize;
        config.device = self.device;
        config.primary = self.primary;
        config.secondary = self.secondary;
        config.format = self.format;
        config.doc_dir = doc_dir;
        config.rider = self.rider;
        config.plot_script = self.plot_script;
        config.dry_run = self.dry_run;
        config.plots = !self.no_plots;
        config.benchmarks = !self.report_only;
        config.step_logs = !self.no_log;
        config.collect_specs = self.collect_specs;
        config.device_probe = self.device_probe;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("fftbench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn single_directory_defaults() {
        let config = parse(&["-w", "build/release/clients/staging"]).into_config().unwrap();
        assert_eq!(config.directories.len(), 1);
        assert_eq!(config.directories[0].output, PathBuf::from("."));
        assert_eq!(config.directories[0].label, "dir0");
        assert_eq!(config.dimensions, vec![1, 2, 3]);
        assert_eq!(config.samples, 10);
        assert_eq!(config.run_type, RunType::Benchmark);
        assert_eq!(config.primary, DataKind::Time);
        assert_eq!(config.doc_dir, PathBuf::from("."));
        assert_eq!(config.speedup_count(), 0);
        assert!(config.plots && config.benchmarks && config.step_logs);
    }

    #[test]
    fn paired_directories_and_labels() {
        let config = parse(&[
            "-w", "a", "-o", "out/a", "-l", "main", "-w", "b", "-o", "out/b", "--doc-dir", "doc",
        ])
        .into_config()
        .unwrap();
        assert_eq!(config.directories[0], DirectoryPair::new("a", "out/a", "main"));
        assert_eq!(config.directories[1], DirectoryPair::new("b", "out/b", "dir1"));
        assert_eq!(config.speedup_count(), 2);
        assert_eq!(config.doc_dir, PathBuf::from("doc"));
    }

    #[test]
    fn no_speedup_turns_the_comparison_off() {
        let config = parse(&["-w", "a", "-o", "x", "-w", "b", "-o", "y", "--no-speedup"])
            .into_config()
            .unwrap();
        assert_eq!(config.speedup_count(), 0);
    }

    #[test]
    fn unpaired_directories_are_rejected() {
        let err = parse(&["-w", "a", "-w", "b", "-o", "out"]).into_config().unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = parse(&["-w", "a", "-w", "b"]).into_config().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn run_options() {
        let config = parse(&[
            "-w", "a", "--run-type", "efficiency", "-d", "1,3", "--short", "-N", "3", "-g", "2",
            "--primary", "gflops", "--secondary", "gflops", "--format", "docx", "--report-only",
            "--aspect-ratio", "2,4",
        ])
        .into_config()
        .unwrap();
        assert_eq!(config.run_type, RunType::Efficiency);
        assert_eq!(config.dimensions, vec![1, 3]);
        assert!(config.short_run);
        assert_eq!((config.samples, config.device), (3, 2));
        assert_eq!(config.primary, DataKind::Gflops);
        assert_eq!(config.secondary, Some(DataKind::Gflops));
        assert_eq!(config.format, DocumentFormat::Docx);
        assert!(!config.benchmarks);
        assert_eq!(config.aspect_ratio, [2, 4]);
    }

    #[test]
    fn invalid_values_are_rejected_by_the_parser() {
        let bad: [&[&str]; 5] = [
            &["-w", "a", "-d", "4"],
            &["-w", "a", "--run-type", "fast"],
            &["-w", "a", "--radix", "1"],
            &["-w", "a", "-N", "ten"],
            &["-w", "a", "--format", "odt"],
        ];
        for args in bad {
            let argv = std::iter::once("fftbench").chain(args.iter().copied());
            assert!(Cli::try_parse_from(argv).is_err(), "accepted {args:?}");
        }
    }

    #[test]
    fn secondary_axis_must_be_gflops() {
        let err = parse(&["-w", "a", "--secondary", "time"]).into_config().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn repeated_dimensions_keep_their_first_position() {
        let config = parse(&["-w", "a", "-d", "3,1,3", "-d", "1"]).into_config().unwrap();
        assert_eq!(config.dimensions, vec![3, 1]);
    }

    #[test]
    fn log_level_follows_flags() {
        assert_eq!(parse(&["-w", "a"]).log_level(), "info");
        assert_eq!(parse(&["-w", "a", "-v"]).log_level(), "debug");
        assert_eq!(parse(&["-w", "a", "-q"]).log_level(), "warn");
    }
}
