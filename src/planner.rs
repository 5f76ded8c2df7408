//! The planner module turns a [`RunConfiguration`] into the ordered list of
//! figures to produce. Each figure groups the benchmark cases that end up on
//! one plot: both transform directions of one configuration, for every build
//! under test.
//!
//! Planning is pure: no file is touched and no process is started, so the whole
//! run can be checked (unique names, hence unique data files) before anything
//! executes.
use std::collections::HashSet;

use crate::case::{BenchmarkCase, Direction, Layout, Precision, TransformKind};
use crate::error::{Error, Result};
use crate::options::{DirectoryPair, RunConfiguration, RunType};

/// Smallest power of `radix` that is greater than or equal to `value`.
///
/// `next_pow(1, radix)` is 1 for every radix.
///
/// # Panics
///
/// Panics if `radix < 2`.
pub fn next_pow(value: usize, radix: usize) -> usize {
    assert!(radix >= 2, "radix must be at least 2, got {radix}");

    let mut x = 1usize;
    while x < value {
        x = x.saturating_mul(radix);
    }
    x
}

/// One plot of the report, and the cases whose data it shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    /// Unique within a run; also the stem of every file the figure produces
    pub name: String,
    pub caption: String,
    pub cases: Vec<BenchmarkCase>,
}

impl Figure {
    /// Data files in plotting order
    pub fn data_files(&self) -> impl Iterator<Item = &std::path::Path> {
        self.cases.iter().map(|c| c.output_file.as_path())
    }

    /// Legend entries, in the same order as [`Figure::data_files`]
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().map(|c| c.label.as_str())
    }

    /// Number of rider invocations this figure needs
    pub fn step_count(&self) -> usize {
        self.cases.iter().map(|c| c.sizes().count()).sum()
    }
}

/// Fails on the first figure name used twice.
pub fn ensure_unique_names(figures: &[Figure]) -> Result<()> {
    let mut seen = HashSet::with_capacity(figures.len());
    for figure in figures {
        if !seen.insert(figure.name.as_str()) {
            return Err(Error::DuplicateFigure(figure.name.clone()));
        }
    }
    Ok(())
}

/// (maximum x length, batch size) pairs swept for each dimension
fn size_table(dimension: u8, short_run: bool) -> &'static [(usize, usize)] {
    match (dimension, short_run) {
        (1, false) => &[(1 << 29, 1), (32768, 100_000)],
        (1, true) => &[(4096, 1), (1024, 100)],
        (2, false) => &[(32768, 1), (32768, 100)],
        (2, true) => &[(1024, 1), (256, 10)],
        (3, false) => &[(1024, 1), (1024, 10)],
        (3, true) => &[(128, 1), (64, 10)],
        _ => &[],
    }
}

const SIZE_FLOOR: usize = 2;
const EFFICIENCY_RADICES: [usize; 4] = [2, 3, 5, 7];

/// The axes shared by every case of one figure
#[derive(Debug, Clone, Copy)]
struct Axes {
    dimension: u8,
    min_size: usize,
    max_size: usize,
    batch: usize,
    radix: usize,
    kind: TransformKind,
    layout: Layout,
    precision: Precision,
}

/// Enumerates the figures of a run.
#[derive(Debug, Clone)]
pub struct SweepPlanner<'a> {
    pub run_type: RunType,
    pub dimensions: &'a [u8],
    pub short_run: bool,
    pub radix: Option<usize>,
    pub batch: Option<usize>,
    pub aspect_ratio: [usize; 2],
    pub samples: usize,
    pub directories: &'a [DirectoryPair],
}

impl<'a> SweepPlanner<'a> {
    pub fn from_config(config: &'a RunConfiguration) -> Self {
        SweepPlanner {
            run_type: config.run_type,
            dimensions: &config.dimensions,
            short_run: config.short_run,
            radix: config.radix,
            batch: config.batch,
            aspect_ratio: config.aspect_ratio,
            samples: config.samples,
            directories: &config.directories,
        }
    }

    /// Every figure of the run, in execution order.
    ///
    /// Returns [`Error::DuplicateFigure`] if two figures would share a name.
    pub fn plan(&self) -> Result<Vec<Figure>> {
        let mut figures = Vec::new();
        for &dimension in self.dimensions {
            match self.run_type {
                RunType::Benchmark => self.benchmark_figures(dimension, &mut figures),
                RunType::Report => self.report_figures(dimension, &mut figures),
                RunType::Efficiency => self.efficiency_figures(dimension, &mut figures),
            }
        }
        ensure_unique_names(&figures)?;
        Ok(figures)
    }

    /// (max, batch) pairs for `dimension`, with the batch override applied.
    /// An override collapses the table to its largest size range.
    fn sizes_and_batches(&self, dimension: u8) -> Vec<(usize, usize)> {
        let table = size_table(dimension, self.short_run);
        match self.batch {
            Some(batch) => table.iter().take(1).map(|&(max, _)| (max, batch)).collect(),
            None => table.to_vec(),
        }
    }

    fn largest_size(&self, dimension: u8) -> usize {
        size_table(dimension, self.short_run)
            .first()
            .map_or(0, |&(max, _)| max)
    }

    fn benchmark_figures(&self, dimension: u8, figures: &mut Vec<Figure>) {
        let radix = self.radix.unwrap_or(2);
        for precision in Precision::ALL {
            for kind in TransformKind::ALL {
                for (max_size, batch) in self.sizes_and_batches(dimension) {
                    let axes = Axes {
                        dimension,
                        min_size: next_pow(SIZE_FLOOR, radix),
                        max_size,
                        batch,
                        radix,
                        kind,
                        layout: Layout::OutOfPlace,
                        precision,
                    };
                    let name = format!(
                        "{dimension}d-{}-{}-n{batch}",
                        kind.as_str(),
                        precision.as_str()
                    );
                    let mut caption = base_caption(&axes);
                    caption.push_str(&format!(", batch size: {batch}"));
                    if radix != 2 {
                        caption.push_str(&format!(", radix: {radix}"));
                    }
                    figures.push(self.figure(name, caption, axes, &Direction::ALL));
                }
            }
        }
    }

    fn report_figures(&self, dimension: u8, figures: &mut Vec<Figure>) {
        let radix = self.radix.unwrap_or(2);
        let batch = self.batch.unwrap_or(1);
        for precision in Precision::ALL {
            for kind in TransformKind::ALL {
                for layout in Layout::ALL {
                    let axes = Axes {
                        dimension,
                        min_size: next_pow(SIZE_FLOOR, radix),
                        max_size: self.largest_size(dimension),
                        batch,
                        radix,
                        kind,
                        layout,
                        precision,
                    };
                    let name = format!(
                        "report-{dimension}d-{}-{}-{}",
                        kind.as_str(),
                        layout.as_str(),
                        precision.as_str()
                    );
                    let caption = format!(
                        "{}, layout: {}",
                        base_caption(&axes),
                        layout.description()
                    );
                    figures.push(self.figure(name, caption, axes, &Direction::ALL));
                }
            }
        }
    }

    fn efficiency_figures(&self, dimension: u8, figures: &mut Vec<Figure>) {
        let floor = if self.short_run { 8 } else { 16 };
        let batch = self.batch.unwrap_or(1);
        for radix in EFFICIENCY_RADICES {
            for precision in Precision::ALL {
                let axes = Axes {
                    dimension,
                    min_size: next_pow(floor, radix),
                    max_size: self.largest_size(dimension),
                    batch,
                    radix,
                    kind: TransformKind::ComplexToComplex,
                    layout: Layout::OutOfPlace,
                    precision,
                };
                let name = format!("efficiency-{dimension}d-r{radix}-{}", precision.as_str());
                let caption = format!("{}, radix: {radix}", base_caption(&axes));
                figures.push(self.figure(name, caption, axes, &[Direction::Forward]));
            }
        }
    }

    /// One case per direction and build, directions outermost.
    fn figure(
        &self,
        name: String,
        caption: String,
        axes: Axes,
        directions: &[Direction],
    ) -> Figure {
        let mut cases = Vec::with_capacity(directions.len() * self.directories.len());
        for &direction in directions {
            for pair in self.directories {
                let output_file = pair
                    .output
                    .join(format!("{name}-{}.dat", direction.as_str()));
                cases.push(BenchmarkCase {
                    dimension: axes.dimension,
                    min_size: axes.min_size,
                    max_size: axes.max_size,
                    batch: axes.batch,
                    radix: axes.radix,
                    aspect_ratio: self.aspect_ratio,
                    kind: axes.kind,
                    direction,
                    layout: axes.layout,
                    precision: axes.precision,
                    samples: self.samples,
                    input_dir: pair.input.clone(),
                    output_file,
                    label: format!("{} {}", pair.label, direction.as_str()),
                });
            }
        }
        Figure {
            name,
            caption,
            cases,
        }
    }
}

fn base_caption(axes: &Axes) -> String {
    format!(
        "Dimension: {}, type: {}, precision: {}",
        axes.dimension,
        axes.kind.description(),
        axes.precision.as_str()
    )
}
