//! The description of one benchmark case: which transform to run, on which
//! build, and over which range of problem sizes.
use std::path::{Path, PathBuf};

/// Forward is the regular FFT, Inverse runs the IFFT
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    /// Negative exponent in the twiddle factor
    Forward,
    /// Positive exponent in the twiddle factor
    Inverse,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Forward, Direction::Inverse];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Inverse => "inverse",
        }
    }
}

/// Whether both ends of the transform are complex, or one side is real
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum TransformKind {
    #[default]
    ComplexToComplex,
    /// Real-to-complex going forward, complex-to-real going back
    RealComplex,
}

impl TransformKind {
    pub const ALL: [TransformKind; 2] = [
        TransformKind::ComplexToComplex,
        TransformKind::RealComplex,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransformKind::ComplexToComplex => "c2c",
            TransformKind::RealComplex => "r2c",
        }
    }

    /// Wording used in figure captions
    pub fn description(self) -> &'static str {
        match self {
            TransformKind::ComplexToComplex => "complex",
            TransformKind::RealComplex => "real/complex",
        }
    }

    /// The transform/input/output type codes the rider expects for this
    /// transform run in `direction`.
    pub fn rider_codes(self, direction: Direction) -> RiderCodes {
        let (transform, input, output) = match (self, direction) {
            (TransformKind::ComplexToComplex, Direction::Forward) => (0, 0, 0),
            (TransformKind::ComplexToComplex, Direction::Inverse) => (1, 0, 0),
            (TransformKind::RealComplex, Direction::Forward) => (2, 2, 3),
            (TransformKind::RealComplex, Direction::Inverse) => (3, 3, 2),
        };
        RiderCodes {
            transform,
            input,
            output,
        }
    }
}

/// Integer codes for `--transformType`, `--inArrType` and `--outArrType`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RiderCodes {
    pub transform: u8,
    pub input: u8,
    pub output: u8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Layout {
    InPlace,
    #[default]
    OutOfPlace,
}

impl Layout {
    pub const ALL: [Layout; 2] = [Layout::InPlace, Layout::OutOfPlace];

    pub fn as_str(self) -> &'static str {
        match self {
            Layout::InPlace => "inplace",
            Layout::OutOfPlace => "outofplace",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Layout::InPlace => "in-place",
            Layout::OutOfPlace => "out-of-place",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Precision {
    #[default]
    Single,
    Double,
}

impl Precision {
    pub const ALL: [Precision; 2] = [Precision::Single, Precision::Double];

    pub fn as_str(self) -> &'static str {
        match self {
            Precision::Single => "single",
            Precision::Double => "double",
        }
    }
}

/// Lengths of the transform along each axis. Unused axes have length 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProblemSize {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

/// Everything needed to run one sweep of the rider and store its results.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkCase {
    /// 1, 2 or 3
    pub dimension: u8,
    pub min_size: usize,
    /// Inclusive upper bound on the x length
    pub max_size: usize,
    pub batch: usize,
    /// Growth factor between consecutive problem sizes
    pub radix: usize,
    /// Length of the y and z axes relative to x
    pub aspect_ratio: [usize; 2],
    pub kind: TransformKind,
    pub direction: Direction,
    pub layout: Layout,
    pub precision: Precision,
    /// Number of timed runs the rider performs per problem size
    pub samples: usize,
    /// Directory holding the rider build under test
    pub input_dir: PathBuf,
    /// Data file receiving one row per problem size
    pub output_file: PathBuf,
    /// Legend entry for this case in plots
    pub label: String,
}

impl BenchmarkCase {
    /// Problem sizes covered by this case, smallest first.
    ///
    /// `x` starts at `min_size` and is multiplied by `radix` for as long as it
    /// stays at or below `max_size`. Extra axes follow `x` scaled by the
    /// aspect ratio.
    pub fn sizes(&self) -> Sizes {
        Sizes {
            next_x: (self.min_size > 0 && self.min_size <= self.max_size).then_some(self.min_size),
            max_size: self.max_size,
            radix: self.radix,
            dimension: self.dimension,
            aspect_ratio: self.aspect_ratio,
        }
    }

    /// Per-step log file sitting next to the data file
    pub fn log_file(&self) -> PathBuf {
        log_path_for(&self.output_file)
    }
}

pub(crate) fn log_path_for(data_file: &Path) -> PathBuf {
    let mut path = data_file.as_os_str().to_owned();
    path.push(".log");
    PathBuf::from(path)
}

/// Iterator returned by [`BenchmarkCase::sizes`]
#[derive(Debug, Clone)]
pub struct Sizes {
    next_x: Option<usize>,
    max_size: usize,
    radix: usize,
    dimension: u8,
    aspect_ratio: [usize; 2],
}

impl Iterator for Sizes {
    type Item = ProblemSize;

    fn next(&mut self) -> Option<ProblemSize> {
        let x = self.next_x?;
        // radix < 2 would never make progress, so it yields a single size
        self.next_x = x
            .checked_mul(self.radix)
            .filter(|&next| next > x && next <= self.max_size);

        let y = if self.dimension > 1 { x * self.aspect_ratio[0] } else { 1 };
        let z = if self.dimension > 2 { x * self.aspect_ratio[1] } else { 1 };
        Some(ProblemSize { x, y, z })
    }
}
