//! `specs.txt` and `gpuid.txt`, the sidecar files kept next to the data of
//! each build.
//!
//! `specs.txt` is free text split into sections by lines starting with
//! `Host info` or `Device info`; every other non-blank line is one item of the
//! current section. `gpuid.txt` holds a single device identifier such as
//! `gfx906`, used by roofline plots.
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use sysinfo::System;
use tracing::warn;

use crate::error::Result;
use crate::process::Invocation;

pub const SPECS_FILE: &str = "specs.txt";
pub const GPUID_FILE: &str = "gpuid.txt";

const HOST_HEADER: &str = "Host info";
const DEVICE_HEADER: &str = "Device info";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecSection {
    /// The header line, absent for items that precede any header
    pub title: Option<String>,
    pub items: Vec<String>,
}

/// Parsed contents of a `specs.txt`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecsBlock {
    pub sections: Vec<SpecSection>,
}

impl SpecsBlock {
    pub fn parse(text: &str) -> Self {
        let mut sections: Vec<SpecSection> = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.starts_with(HOST_HEADER) || line.starts_with(DEVICE_HEADER) {
                sections.push(SpecSection {
                    title: Some(line.to_string()),
                    items: Vec::new(),
                });
            } else if !line.is_empty() {
                if sections.is_empty() {
                    sections.push(SpecSection::default());
                }
                if let Some(current) = sections.last_mut() {
                    current.items.push(line.to_string());
                }
            }
        }
        SpecsBlock { sections }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.title.is_none() && s.items.is_empty())
    }

    /// Text in the `specs.txt` layout
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            if let Some(title) = &section.title {
                out.push_str(title);
                out.push('\n');
            }
            for item in &section.items {
                out.push_str(item);
                out.push('\n');
            }
        }
        out
    }
}

/// Sidecar contents of one output directory, loaded up front and handed to the
/// report assembler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sidecars {
    pub specs: Option<SpecsBlock>,
    pub gpuid: Option<String>,
}

impl Sidecars {
    /// Reads the sidecars of `dir`. Missing files are not an error.
    pub fn load(dir: &Path) -> Result<Self> {
        let specs = read_optional(&dir.join(SPECS_FILE))?.map(|t| SpecsBlock::parse(&t));
        let gpuid = read_optional(&dir.join(GPUID_FILE))?
            .and_then(|t| t.lines().next().map(|l| l.trim().to_string()))
            .filter(|id| !id.is_empty());
        Ok(Sidecars { specs, gpuid })
    }

    /// Writes `specs.txt`, and `gpuid.txt` when a device id is known.
    pub fn store(&self, dir: &Path) -> Result<()> {
        if let Some(specs) = &self.specs {
            fs::write(dir.join(SPECS_FILE), specs.render())?;
        }
        if let Some(id) = &self.gpuid {
            fs::write(dir.join(GPUID_FILE), format!("{id}\n"))?;
        }
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Host description gathered from the operating system
pub fn host_info() -> Vec<String> {
    let mut sys = System::new();
    sys.refresh_cpu();
    sys.refresh_memory();

    let mut items = Vec::new();
    if let Some(host) = System::host_name() {
        items.push(format!("hostname: {host}"));
    }
    if let Some(name) = System::long_os_version().or_else(System::name) {
        items.push(format!("os: {name}"));
    }
    if let Some(kernel) = System::kernel_version() {
        items.push(format!("kernel: {kernel}"));
    }
    if let Some(cpu) = sys.cpus().first() {
        items.push(format!("cpu: {} ({} logical cores)", cpu.brand().trim(), sys.cpus().len()));
    }
    items.push(format!("ram: {:.1} GiB", sys.total_memory() as f64 / (1u64 << 30) as f64));
    items
}

/// What the device probe reported
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub items: Vec<String>,
    pub gpuid: Option<String>,
}

impl DeviceInfo {
    /// Picks the name lines and the first `gfx*` identifier out of the
    /// probe output.
    pub fn parse(output: &str) -> Self {
        let mut items: Vec<String> = Vec::new();
        for line in output.lines() {
            let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
            let keep = line.starts_with("Marketing Name") || line.starts_with("Name:");
            if keep && items.last() != Some(&line) {
                items.push(line);
            }
        }
        let gpuid = output
            .split_whitespace()
            .find(|t| t.starts_with("gfx"))
            .map(str::to_string);
        DeviceInfo { items, gpuid }
    }
}

/// Runs the device probe command. A failing probe is logged and reports
/// nothing.
pub fn probe_device(command: &str) -> DeviceInfo {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        return DeviceInfo::default();
    };
    let inv = Invocation::new(program).args(parts);
    match inv.run() {
        Ok(captured) if captured.success() => DeviceInfo::parse(&captured.stdout),
        Ok(captured) => {
            warn!(command = %inv.command_line(), status = %captured.status, "device probe failed");
            DeviceInfo::default()
        }
        Err(e) => {
            warn!("device probe failed: {e}");
            DeviceInfo::default()
        }
    }
}

/// Sidecars describing this machine, ready to be stored.
pub fn collect(device_probe: &str) -> Sidecars {
    let device = probe_device(device_probe);
    let specs = SpecsBlock {
        sections: vec![
            SpecSection {
                title: Some(format!("{HOST_HEADER}:")),
                items: host_info(),
            },
            SpecSection {
                title: Some(format!("{DEVICE_HEADER}:")),
                items: device.items,
            },
        ],
    };
    Sidecars {
        specs: Some(specs),
        gpuid: device.gpuid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPECS: &str = "\
Host info:
    hostname: bench01
    cpu: AMD EPYC 7742

Device info:
    Marketing Name: AMD Instinct MI100
";

    #[test]
    fn headers_open_sections() {
        let block = SpecsBlock::parse(SPECS);
        assert_eq!(block.sections.len(), 2);
        assert_eq!(block.sections[0].title.as_deref(), Some("Host info:"));
        assert_eq!(
            block.sections[0].items,
            vec!["hostname: bench01", "cpu: AMD EPYC 7742"]
        );
        assert_eq!(block.sections[1].title.as_deref(), Some("Device info:"));
        assert_eq!(block.sections[1].items, vec!["Marketing Name: AMD Instinct MI100"]);
    }

    #[test]
    fn items_before_any_header_get_an_untitled_section() {
        let block = SpecsBlock::parse("gcc 12\n\nHost info\nx\n");
        assert_eq!(block.sections[0].title, None);
        assert_eq!(block.sections[0].items, vec!["gcc 12"]);
        assert_eq!(block.sections[1].items, vec!["x"]);
    }

    #[test]
    fn blank_text_is_empty() {
        assert!(SpecsBlock::parse("\n  \n").is_empty());
        assert!(!SpecsBlock::parse(SPECS).is_empty());
    }

    #[test]
    fn sidecars_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Sidecars::load(dir.path()).unwrap(), Sidecars::default());

        let sidecars = Sidecars {
            specs: Some(SpecsBlock::parse(SPECS)),
            gpuid: Some("gfx908".into()),
        };
        sidecars.store(dir.path()).unwrap();
        assert_eq!(Sidecars::load(dir.path()).unwrap(), sidecars);
    }

    #[test]
    fn blank_gpuid_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(GPUID_FILE), "\n").unwrap();
        assert_eq!(Sidecars::load(dir.path()).unwrap().gpuid, None);
    }

    #[test]
    fn device_probe_output() {
        let output = "\
*******
Agent 1
*******
  Name:                    AMD EPYC 7742 64-Core Processor
  Marketing Name:          AMD EPYC 7742 64-Core Processor
*******
Agent 2
*******
  Name:                    gfx908
  Marketing Name:          AMD Instinct MI100
  Vendor Name:             AMD
";
        let info = DeviceInfo::parse(output);
        assert_eq!(info.gpuid.as_deref(), Some("gfx908"));
        assert_eq!(
            info.items,
            vec![
                "Name: AMD EPYC 7742 64-Core Processor",
                "Marketing Name: AMD EPYC 7742 64-Core Processor",
                "Name: gfx908",
                "Marketing Name: AMD Instinct MI100",
            ]
        );
    }

    #[test]
    fn failing_probe_reports_nothing() {
        assert_eq!(probe_device("/nonexistent/rocminfo"), DeviceInfo::default());
        assert_eq!(probe_device(""), DeviceInfo::default());
    }

    #[test]
    fn collected_specs_parse_back() {
        let sidecars = collect("/nonexistent/rocminfo");
        let text = sidecars.specs.as_ref().unwrap().render();
        let parsed = SpecsBlock::parse(&text);
        assert_eq!(parsed.sections[0].title.as_deref(), Some("Host info:"));
        assert!(parsed.sections[0].items.iter().any(|i| i.starts_with("ram: ")));
        assert_eq!(parsed.sections.len(), 2);
    }
}
