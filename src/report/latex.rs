//! LaTeX source of the PDF report.
use std::fmt::Write;

use super::{ReportContent, TITLE};

const HEADER: &str = r"\documentclass[12pt]{article}
\usepackage{graphicx}
\usepackage{url}
\usepackage[margin=1in]{geometry}

\begin{document}
";

const FOOTER: &str = r"
\end{document}
";

/// Escapes the characters LaTeX treats specially in running text.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

pub fn compose(content: &ReportContent<'_>) -> String {
    let mut tex = String::from(HEADER);
    // writing into a String cannot fail
    let _ = write_body(&mut tex, content);
    tex.push_str(FOOTER);
    tex
}

fn write_body(tex: &mut String, content: &ReportContent<'_>) -> std::fmt::Result {
    writeln!(tex, "\\section*{{{}}}", escape(TITLE))?;
    writeln!(tex, "{}\n", escape(&content.introduction()))?;
    if let Some(methodology) = content.methodology() {
        writeln!(tex, "{}\n", escape(methodology))?;
    }

    writeln!(tex, "\\noindent\\begin{{tabular}}{{lll}}")?;
    for pair in content.directories {
        writeln!(
            tex,
            "{} & \\url{{{}}} & \\url{{{}}}\\\\",
            escape(&pair.label),
            pair.input.display(),
            pair.output.display()
        )?;
    }
    writeln!(tex, "\\end{{tabular}}\n")?;

    for (label, specs) in &content.specs {
        writeln!(tex, "\\subsection*{{Specifications: {}}}", escape(label))?;
        for section in &specs.sections {
            if let Some(title) = &section.title {
                writeln!(tex, "\\noindent {}", escape(title))?;
            }
            if section.items.is_empty() {
                continue;
            }
            writeln!(tex, "\\begin{{itemize}}")?;
            for item in &section.items {
                writeln!(tex, "  \\item {}", escape(item))?;
            }
            writeln!(tex, "\\end{{itemize}}")?;
        }
    }

    writeln!(tex, "\\clearpage")?;
    for (i, figure) in content.figures.iter().enumerate() {
        let file_name = figure
            .image
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        writeln!(tex, "\\begin{{figure}}[htbp]")?;
        writeln!(tex, "  \\centering")?;
        writeln!(tex, "  \\includegraphics[width=\\textwidth]{{{file_name}}}")?;
        writeln!(tex, "  \\caption{{{}}}", escape(&figure.caption))?;
        writeln!(tex, "\\end{{figure}}")?;
        if i % 2 == 1 {
            writeln!(tex, "\\clearpage")?;
        }
    }
    Ok(())
}
