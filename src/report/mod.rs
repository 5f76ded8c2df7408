//! Turns the data files of a run into plots and a single report document.
//!
//! Every figure is plotted by `asy` on its own; a failed plot is logged and
//! left out of the document. The document is written and compiled once all
//! figures are done, whatever happened to them.
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::options::{DataKind, DirectoryPair, DocumentFormat, RunConfiguration};
use crate::planner::Figure;
use crate::process::Invocation;

pub mod docx;
pub mod latex;
pub mod specs;

use specs::{Sidecars, SpecsBlock};

pub const TITLE: &str = "FFT benchmark results";

const PLOTTER: &str = "asy";
const LATEX_BUILD: &str = "latexmk";
const EPS_TO_PDF: &str = "epstopdf";
const PDF_TO_PNG: &str = "pdftoppm";
const PNG_RESOLUTION: &str = "300";

/// A figure whose image is ready to be embedded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlottedFigure {
    pub name: String,
    pub caption: String,
    pub image: PathBuf,
}

/// Everything the document shows, independent of its output format.
#[derive(Debug, Clone)]
pub struct ReportContent<'a> {
    pub samples: usize,
    pub gflops_secondary: bool,
    pub directories: &'a [DirectoryPair],
    /// Specs of each build that has them, with the build's label
    pub specs: Vec<(&'a str, &'a SpecsBlock)>,
    pub figures: &'a [PlottedFigure],
}

impl ReportContent<'_> {
    pub fn introduction(&self) -> String {
        format!(
            "Every problem size was measured with {} samples by the FFT benchmark client.",
            self.samples
        )
    }

    pub fn methodology(&self) -> Option<&'static str> {
        self.gflops_secondary.then_some(
            "GFLOP/s figures are derived from the measured time with the nominal \
             operation count of 5 N log2(N) for a complex transform of N points, \
             and half of that for real transforms.",
        )
    }
}

/// Produces the plots and the report document for a planned run.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    doc_dir: PathBuf,
    format: DocumentFormat,
    plot_script: PathBuf,
    primary: DataKind,
    secondary: Option<DataKind>,
    speedup: usize,
    samples: usize,
    dry_run: bool,
    directories: Vec<DirectoryPair>,
    /// One entry per directory pair, same order
    sidecars: Vec<Sidecars>,
}

impl ReportAssembler {
    /// `sidecars` holds the sidecar files of each output directory, in the
    /// order of `config.directories`.
    pub fn new(config: &RunConfiguration, sidecars: Vec<Sidecars>) -> Self {
        ReportAssembler {
            doc_dir: config.doc_dir.clone(),
            format: config.format,
            plot_script: config.plot_script.clone(),
            primary: config.primary,
            secondary: config.secondary,
            speedup: config.speedup_count(),
            samples: config.samples,
            dry_run: config.dry_run,
            directories: config.directories.clone(),
            sidecars,
        }
    }

    /// External programs the report needs
    pub fn required_tools(&self) -> &'static [&'static str] {
        match self.format {
            DocumentFormat::Pdf => &[PLOTTER, LATEX_BUILD],
            DocumentFormat::Docx => &[PLOTTER, EPS_TO_PDF, PDF_TO_PNG],
        }
    }

    fn gpuid(&self) -> Option<&str> {
        self.sidecars.iter().find_map(|s| s.gpuid.as_deref())
    }

    /// The image `asy` writes for `figure`
    pub fn plot_output(&self, figure: &Figure) -> PathBuf {
        let ext = match self.format {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "eps",
        };
        self.doc_dir.join(format!("{}.{ext}", figure.name))
    }

    pub fn plot_invocation(&self, figure: &Figure) -> Invocation {
        let files: Vec<String> = figure
            .data_files()
            .map(|p| p.display().to_string())
            .collect();
        let labels: Vec<&str> = figure.labels().collect();
        let format = match self.format {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "eps",
        };

        let mut inv = Invocation::new(PLOTTER)
            .args(["-f", format])
            .arg(&self.plot_script)
            .args(["-u".to_string(), format!("filenames=\"{}\"", files.join(","))])
            .args(["-u".to_string(), format!("legendlist=\"{}\"", labels.join(","))])
            .args(["-u".to_string(), format!("speedup={}", self.speedup)])
            .args(["-u".to_string(), format!("primaryaxis=\"{}\"", self.primary.as_str())]);
        if let Some(secondary) = self.secondary {
            inv = inv.args(["-u".to_string(), format!("secondaryaxis=\"{}\"", secondary.as_str())]);
        }
        if self.primary == DataKind::Roofline {
            match self.gpuid() {
                Some(id) => inv = inv.args(["-u".to_string(), format!("gpuid=\"{id}\"")]),
                None => warn!(
                    figure = %figure.name,
                    "roofline plot without a {} sidecar",
                    specs::GPUID_FILE
                ),
            }
        }
        inv.arg("-o").arg(self.plot_output(figure))
    }

    /// The two conversion steps from the EPS plot to an embeddable PNG
    pub fn conversion_invocations(&self, eps: &Path) -> [Invocation; 2] {
        let pdf = eps.with_extension("pdf");
        let png_root = eps.with_extension("");
        [
            Invocation::new(EPS_TO_PDF)
                .arg(eps)
                .arg(format!("--outfile={}", pdf.display())),
            Invocation::new(PDF_TO_PNG)
                .args(["-png", "-r", PNG_RESOLUTION, "-singlefile"])
                .arg(&pdf)
                .arg(png_root),
        ]
    }

    /// Plots one figure, converting it for embedding when needed.
    ///
    /// Returns `None`, after logging why, when any step fails.
    pub fn plot(&self, figure: &Figure) -> Option<PlottedFigure> {
        let plot = self.plot_invocation(figure);
        let mut steps = vec![plot];
        let image = match self.format {
            DocumentFormat::Pdf => self.plot_output(figure),
            DocumentFormat::Docx => {
                let eps = self.plot_output(figure);
                steps.extend(self.conversion_invocations(&eps));
                eps.with_extension("png")
            }
        };

        for step in &steps {
            if self.dry_run {
                println!("{}", step.command_line());
                continue;
            }
            match step.run() {
                Ok(captured) if captured.success() => {}
                Ok(captured) => {
                    warn!(
                        figure = %figure.name,
                        command = %step.command_line(),
                        status = %captured.status,
                        "plotting failed\n--- stdout ---\n{}\n--- stderr ---\n{}",
                        captured.stdout.trim_end(),
                        captured.stderr.trim_end()
                    );
                    return None;
                }
                Err(e) => {
                    warn!(figure = %figure.name, "plotting failed: {e}");
                    return None;
                }
            }
        }

        Some(PlottedFigure {
            name: figure.name.clone(),
            caption: figure.caption.clone(),
            image,
        })
    }

    fn content<'a>(&'a self, figures: &'a [PlottedFigure]) -> ReportContent<'a> {
        let specs = self
            .directories
            .iter()
            .zip(&self.sidecars)
            .filter_map(|(pair, sidecars)| {
                let specs = sidecars.specs.as_ref().filter(|s| !s.is_empty())?;
                Some((pair.label.as_str(), specs))
            })
            .collect();
        ReportContent {
            samples: self.samples,
            gflops_secondary: self.secondary == Some(DataKind::Gflops),
            directories: &self.directories,
            specs,
            figures,
        }
    }

    /// Writes the document for the plotted figures and compiles it when the
    /// output is a PDF. A failing compile is logged, not returned.
    ///
    /// Returns how many figures the document holds.
    pub fn compile(&self, figures: &[PlottedFigure]) -> Result<usize> {
        let content = self.content(figures);
        match self.format {
            DocumentFormat::Pdf => {
                let tex_path = self.doc_dir.join("figs.tex");
                let build = Invocation::new(LATEX_BUILD)
                    .args(["-pdf", "figs.tex"])
                    .current_dir(&self.doc_dir);
                if self.dry_run {
                    println!("{}", build.command_line());
                    return Ok(figures.len());
                }

                fs::write(&tex_path, latex::compose(&content))?;
                let status = build.run_to_files(
                    &self.doc_dir.join("texcmd.log"),
                    &self.doc_dir.join("texcmd.err"),
                );
                match status {
                    Ok(status) if status.success() => {
                        let document = self.doc_dir.join("figs.pdf");
                        info!(document = %document.display(), "report written");
                    }
                    Ok(status) => warn!(
                        %status,
                        log = %self.doc_dir.join("texcmd.log").display(),
                        "document compile failed"
                    ),
                    Err(e) => warn!("document compile failed: {e}"),
                }
                Ok(figures.len())
            }
            DocumentFormat::Docx => {
                let path = self.doc_dir.join("figs.docx");
                if self.dry_run {
                    println!("# write {}", path.display());
                    return Ok(figures.len());
                }
                let embedded = docx::write(&content, &path)?;
                info!(document = %path.display(), figures = embedded, "report written");
                Ok(embedded)
            }
        }
    }

    /// Plots every figure, then builds the document from the ones that worked.
    /// Returns how many figures made it into the document.
    pub fn assemble(&self, figures: &[Figure]) -> Result<usize> {
        let plotted: Vec<PlottedFigure> = figures.iter().filter_map(|f| self.plot(f)).collect();
        if plotted.len() < figures.len() {
            warn!(
                "{} of {} figures could not be plotted",
                figures.len() - plotted.len(),
                figures.len()
            );
        }
        self.compile(&plotted)
    }
}
