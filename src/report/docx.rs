//! Word-processor version of the report.
//!
//! Figures have to be PNG by the time they get here; see
//! [`super::ReportAssembler::plot`] for the conversion chain. A figure whose
//! image cannot be read or decoded is left out with a warning.
use std::fs::{self, File};
use std::io::Cursor;
use std::path::Path;

use docx_rs::{BreakType, Docx, Paragraph, Pic, Run};
use image::ImageReader;
use tracing::warn;

use super::{ReportContent, TITLE};
use crate::error::{Error, Result};

const EMU_PER_INCH: u64 = 914_400;
const FIGURE_WIDTH_EMU: u64 = 6 * EMU_PER_INCH;

/// Writes the document to `path` and returns how many figures it embeds.
pub fn write(content: &ReportContent<'_>, path: &Path) -> Result<usize> {
    let mut doc = Docx::new()
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(TITLE).bold().size(32)))
        .add_paragraph(text(&content.introduction()));
    if let Some(methodology) = content.methodology() {
        doc = doc.add_paragraph(text(methodology));
    }

    for pair in content.directories {
        doc = doc.add_paragraph(text(&format!(
            "{}: {} (results in {})",
            pair.label,
            pair.input.display(),
            pair.output.display()
        )));
    }

    for (label, specs) in &content.specs {
        let heading = Run::new().add_text(format!("Specifications: {label}")).bold();
        doc = doc.add_paragraph(Paragraph::new().add_run(heading));
        for section in &specs.sections {
            if let Some(title) = &section.title {
                doc = doc.add_paragraph(text(title));
            }
            for item in &section.items {
                doc = doc.add_paragraph(text(&format!("\u{2022} {item}")));
            }
        }
    }

    doc = doc.add_paragraph(page_break());
    let mut embedded = 0;
    for figure in content.figures {
        let Some(pic) = load_picture(&figure.image) else {
            continue;
        };
        let caption = Run::new().add_text(&figure.caption).italic();
        doc = doc
            .add_paragraph(Paragraph::new().add_run(Run::new().add_image(pic)))
            .add_paragraph(Paragraph::new().add_run(caption));
        embedded += 1;
        if embedded % 2 == 0 {
            doc = doc.add_paragraph(page_break());
        }
    }

    let file = File::create(path)?;
    doc.build()
        .pack(file)
        .map_err(|e| Error::Document(e.to_string()))?;
    Ok(embedded)
}

fn text(s: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(s))
}

fn page_break() -> Paragraph {
    Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
}

/// Page-wide picture of the PNG at `path`, or `None` after logging why not.
fn load_picture(path: &Path) -> Option<Pic> {
    let png = match fs::read(path) {
        Ok(png) => png,
        Err(e) => {
            warn!(image = %path.display(), "figure left out: {e}");
            return None;
        }
    };
    let (width_px, height_px) = match pixel_size(&png) {
        Ok(size) => size,
        Err(e) => {
            warn!(image = %path.display(), "figure left out: {e}");
            return None;
        }
    };
    let (width, height) = figure_size(width_px, height_px);
    Some(Pic::new_with_dimensions(png, width_px, height_px).size(width, height))
}

fn pixel_size(png: &[u8]) -> image::ImageResult<(u32, u32)> {
    ImageReader::new(Cursor::new(png))
        .with_guessed_format()?
        .into_dimensions()
}

/// Width and height in EMU for a page-wide image with the given aspect ratio
fn figure_size(width_px: u32, height_px: u32) -> (u32, u32) {
    let height = FIGURE_WIDTH_EMU * u64::from(height_px) / u64::from(width_px.max(1));
    (FIGURE_WIDTH_EMU as u32, height.min(u64::from(u32::MAX)) as u32)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::report::PlottedFigure;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    fn figure(image: PathBuf) -> PlottedFigure {
        PlottedFigure {
            name: "1d-c2c-single-n1".into(),
            caption: "Dimension: 1".into(),
            image,
        }
    }

    fn content(figures: &[PlottedFigure]) -> ReportContent<'_> {
        ReportContent {
            samples: 10,
            gflops_secondary: false,
            directories: &[],
            specs: vec![],
            figures,
        }
    }

    #[test]
    fn figure_keeps_aspect_ratio() {
        let (w, h) = figure_size(3000, 1500);
        assert_eq!(w as u64, FIGURE_WIDTH_EMU);
        assert_eq!(h as u64, FIGURE_WIDTH_EMU / 2);
    }

    #[test]
    fn reads_pixel_size_of_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fig.png");
        image::RgbImage::new(40, 30).save(&path).unwrap();
        assert_eq!(pixel_size(&fs::read(&path).unwrap()).unwrap(), (40, 30));
        assert!(pixel_size(&PNG_SIGNATURE).is_err());
        assert!(pixel_size(b"%PDF-1.5 not an image at all").is_err());
    }

    #[test]
    fn writes_a_document_without_figures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figs.docx");
        assert_eq!(write(&content(&[]), &path).unwrap(), 0);
        let bytes = fs::read(&path).unwrap();
        // a docx is a zip archive
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn unusable_images_are_left_out() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        image::RgbImage::new(40, 30).save(&good).unwrap();
        let truncated = dir.path().join("truncated.png");
        fs::write(&truncated, PNG_SIGNATURE).unwrap();
        let empty = dir.path().join("empty.png");
        fs::write(&empty, b"").unwrap();
        let missing = dir.path().join("missing.png");

        let figures: Vec<_> = [truncated, good, empty, missing].into_iter().map(figure).collect();
        let path = dir.path().join("figs.docx");
        assert_eq!(write(&content(&figures), &path).unwrap(), 1);
        assert!(path.is_file());
    }
}
