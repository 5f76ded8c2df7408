#![cfg(unix)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use fftbench::options::{DirectoryPair, DocumentFormat, RunConfiguration, RunType};
use fftbench::run;
use utilities::write_fake_rider;

/// Plots anything except the radix-3 figures
const ASY: &str = r#"
out=""
prev=""
for a in "$@"; do
    if [ "$prev" = "-o" ]; then out="$a"; fi
    prev="$a"
done
case "$out" in
    *-r3-*) echo "no data for $out" >&2; exit 1 ;;
esac
echo plotted > "$out"
"#;

/// Records its working directory in its output
const LATEXMK: &str = r#"
pwd
echo "latexmk $*"
echo "overfull hbox" >&2
"#;

const EPSTOPDF: &str = r#"
for a in "$@"; do
    case "$a" in
        --outfile=*) out="${a#--outfile=}" ;;
    esac
done
echo converted > "$out"
"#;

/// Copies a real PNG, except for the radix-5 figures which get a truncated one
const PDFTOPPM: &str = r#"
for a in "$@"; do root="$a"; done
case "$root" in
    *-r5-*) printf '\211PNG\r\n\032\n' > "$root.png" ;;
    *) cp "$FFTBENCH_TEST_PNG" "$root.png" ;;
esac
"#;

/// Puts the fake document tools first on `PATH`, once per test binary.
fn fake_tools() -> &'static Path {
    static TOOLS: OnceLock<PathBuf> = OnceLock::new();
    TOOLS.get_or_init(|| {
        let dir = env::temp_dir().join(format!("fftbench-report-tools-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        write_fake_rider(&dir, "asy", ASY);
        write_fake_rider(&dir, "latexmk", LATEXMK);
        write_fake_rider(&dir, "epstopdf", EPSTOPDF);
        let png = dir.join("figure.png");
        image::RgbImage::new(64, 48).save(&png).unwrap();
        let pdftoppm = PDFTOPPM.replace("$FFTBENCH_TEST_PNG", &png.display().to_string());
        write_fake_rider(&dir, "pdftoppm", &pdftoppm);

        let path = env::var_os("PATH").unwrap_or_default();
        let mut dirs = vec![dir.clone()];
        dirs.extend(env::split_paths(&path));
        env::set_var("PATH", env::join_paths(dirs).unwrap());
        dir
    })
}

fn report_run(root: &Path, format: DocumentFormat) -> RunConfiguration {
    fake_tools();
    let mut config = RunConfiguration::default();
    config.directories = vec![DirectoryPair::new(root.join("build"), root.join("out"), "main")];
    config.run_type = RunType::Efficiency;
    config.dimensions = vec![1];
    config.short_run = true;
    config.benchmarks = false;
    config.format = format;
    config.doc_dir = root.join("doc");
    config
}

#[test]
fn failed_plots_are_left_out_of_the_pdf_report() {
    let root = tempfile::tempdir().unwrap();
    let summary = run(report_run(root.path(), DocumentFormat::Pdf)).unwrap();

    // four radices times two precisions, radix 3 fails to plot
    assert_eq!(summary.figures, 8);
    assert_eq!(summary.figures_in_document, 6);

    let doc = root.path().join("doc");
    let tex = fs::read_to_string(doc.join("figs.tex")).unwrap();
    assert_eq!(tex.matches(r"\includegraphics").count(), 6);
    assert!(tex.contains("{efficiency-1d-r2-single.pdf}"));
    assert!(!tex.contains("-r3-"));
    assert!(doc.join("efficiency-1d-r7-double.pdf").is_file());

    let log = fs::read_to_string(doc.join("texcmd.log")).unwrap();
    let mut lines = log.lines();
    let cwd = Path::new(lines.next().unwrap());
    assert_eq!(cwd.canonicalize().unwrap(), doc.canonicalize().unwrap());
    assert_eq!(lines.next(), Some("latexmk -pdf figs.tex"));
    assert_eq!(fs::read_to_string(doc.join("texcmd.err")).unwrap(), "overfull hbox\n");
}

#[test]
fn docx_report_skips_figures_that_fail_to_convert() {
    let root = tempfile::tempdir().unwrap();
    let summary = run(report_run(root.path(), DocumentFormat::Docx)).unwrap();

    // radix 3 fails to plot, radix 5 converts to a truncated PNG
    assert_eq!(summary.figures, 8);
    assert_eq!(summary.figures_in_document, 4);

    let doc = root.path().join("doc");
    assert!(doc.join("efficiency-1d-r2-single.eps").is_file());
    assert!(doc.join("efficiency-1d-r2-single.pdf").is_file());
    assert!(doc.join("efficiency-1d-r2-single.png").is_file());
    assert!(!doc.join("efficiency-1d-r3-single.png").exists());

    let bytes = fs::read(doc.join("figs.docx")).unwrap();
    assert_eq!(&bytes[..2], b"PK");
    assert!(!doc.join("figs.tex").exists());
}
