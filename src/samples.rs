//! Measurements read from the rider output, and the tab-separated data files
//! they are stored in.
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::options::DataKind;

/// Line prefix of the per-run GPU times, in milliseconds
pub const GPU_TIME_PREFIX: &str = "Execution gpu time: ";
/// Line prefix of the per-run throughput figures
pub const GFLOPS_PREFIX: &str = "Execution gflops (wall time): ";

const MS_TO_S: f64 = 1e-3;
const GFLOPS_SCALE: f64 = 1e-3;

impl DataKind {
    /// Prefix of the rider output lines holding this kind of measurement
    pub fn output_prefix(self) -> &'static str {
        match self {
            DataKind::Time => GPU_TIME_PREFIX,
            DataKind::Gflops | DataKind::Roofline => GFLOPS_PREFIX,
        }
    }

    fn scale(self) -> f64 {
        match self {
            DataKind::Time => MS_TO_S,
            DataKind::Gflops | DataKind::Roofline => GFLOPS_SCALE,
        }
    }
}

/// Measurements from one rider invocation, in output order.
///
/// Empty when the invocation failed or printed nothing recognisable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet(Vec<f64>);

impl SampleSet {
    pub fn new() -> Self {
        SampleSet(Vec::new())
    }

    /// Collects the measurements from the remainders of the matching output
    /// lines, i.e. with `kind.output_prefix()` already stripped.
    ///
    /// A trailing `ms` unit is dropped for [`DataKind::Time`]. Fails on the
    /// first token that is not a number.
    pub fn from_lines<'a>(
        lines: impl IntoIterator<Item = &'a str>,
        kind: DataKind,
    ) -> Result<Self> {
        let mut values = Vec::new();
        for line in lines {
            let mut line = line.trim_end();
            if kind == DataKind::Time {
                line = line.strip_suffix("ms").unwrap_or(line);
            }
            for token in line.split_whitespace() {
                let value: f64 = token
                    .parse()
                    .map_err(|_| Error::UnparsableSample(token.to_string()))?;
                values.push(value * kind.scale());
            }
        }
        Ok(SampleSet(values))
    }

    /// Scans a whole captured output for lines with the measurement prefix.
    pub fn parse_output(output: &str, kind: DataKind) -> Result<Self> {
        let prefix = kind.output_prefix();
        Self::from_lines(output.lines().filter_map(|l| l.strip_prefix(prefix)), kind)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn median(&self) -> Option<f64> {
        if self.0.is_empty() {
            return None;
        }
        let mut sorted = self.0.clone();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }
}

impl From<Vec<f64>> for SampleSet {
    fn from(values: Vec<f64>) -> Self {
        SampleSet(values)
    }
}

/// One line of a data file: `<size>\t<count>\t<v1>\t<v2>...`
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    /// Sweep coordinate, the x length of the problem
    pub size: usize,
    pub samples: SampleSet,
}

impl DataRow {
    pub fn new(size: usize, samples: SampleSet) -> Self {
        DataRow { size, samples }
    }

    /// Parses a row; fields may be separated by tabs or any other whitespace.
    pub fn parse(line: &str) -> Result<Self> {
        let malformed = |reason: &str| Error::MalformedRow {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let mut fields = line.split_whitespace();
        let size = fields
            .next()
            .ok_or_else(|| malformed("empty line"))?
            .parse()
            .map_err(|_| malformed("size is not an integer"))?;
        let count: usize = fields
            .next()
            .ok_or_else(|| malformed("missing sample count"))?
            .parse()
            .map_err(|_| malformed("sample count is not an integer"))?;
        let values = fields
            .map(|f| f.parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| malformed("sample is not a number"))?;
        if values.len() != count {
            return Err(malformed("sample count does not match the number of samples"));
        }

        Ok(DataRow::new(size, SampleSet(values)))
    }

    pub fn write_to(&self, mut out: impl Write) -> std::io::Result<()> {
        writeln!(out, "{self}")
    }
}

impl fmt::Display for DataRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.size, self.samples.len())?;
        for value in self.samples.values() {
            write!(f, "\t{value}")?;
        }
        Ok(())
    }
}

/// Reads every non-blank row of a data file.
pub fn read_data_file(path: &Path) -> Result<Vec<DataRow>> {
    fs::read_to_string(path)?
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(DataRow::parse)
        .collect()
}
