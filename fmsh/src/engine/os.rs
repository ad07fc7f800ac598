//! Host information for `os` and `sysinfo`
//!
//! Linux values come from `/proc`; kernel name, release and host name come
//! from `uname(2)`. Anything the host does not expose is reported as
//! `unknown` rather than failing the command.

use super::format::{format_duration, format_size};
use crate::error::FmshError;
use crate::parser::escape_string;
use std::fmt;
use std::str::FromStr;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsQuery {
    Eol,
    Cpus,
    HomeDir,
    Username,
    Architecture,
    Hostname,
    Platform,
    Release,
    Uptime,
    Memory,
}

impl OsQuery {
    pub const ALL: [OsQuery; 10] = [
        Self::Eol,
        Self::Cpus,
        Self::HomeDir,
        Self::Username,
        Self::Architecture,
        Self::Hostname,
        Self::Platform,
        Self::Release,
        Self::Uptime,
        Self::Memory,
    ];

    /// Flag name as typed after `--`.
    pub fn flag(&self) -> &'static str {
        match self {
            Self::Eol => "EOL",
            Self::Cpus => "cpus",
            Self::HomeDir => "homedir",
            Self::Username => "username",
            Self::Architecture => "architecture",
            Self::Hostname => "hostname",
            Self::Platform => "platform",
            Self::Release => "release",
            Self::Uptime => "uptime",
            Self::Memory => "memory",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Eol => "End of line",
            Self::Cpus => "CPUs",
            Self::HomeDir => "Home directory",
            Self::Username => "System user name",
            Self::Architecture => "Architecture",
            Self::Hostname => "Host name",
            Self::Platform => "Platform",
            Self::Release => "Release",
            Self::Uptime => "Uptime",
            Self::Memory => "Memory",
        }
    }

    /// Current value for this query, formatted for display.
    pub fn value(&self) -> String {
        match self {
            Self::Eol => escape_string(eol()),
            Self::Cpus => describe_cpus(&cpus()),
            Self::HomeDir => dirs::home_dir().map_or_else(|| UNKNOWN.to_string(), |p| p.display().to_string()),
            Self::Username => system_username(),
            Self::Architecture => std::env::consts::ARCH.to_string(),
            Self::Hostname => uname().map_or_else(|| UNKNOWN.to_string(), |u| u.nodename),
            Self::Platform => std::env::consts::OS.to_string(),
            Self::Release => uname().map_or_else(|| UNKNOWN.to_string(), |u| u.release),
            Self::Uptime => read_proc("/proc/uptime")
                .and_then(|s| parse_uptime(&s))
                .map_or_else(|| UNKNOWN.to_string(), format_duration),
            Self::Memory => read_proc("/proc/meminfo")
                .and_then(|s| parse_meminfo(&s))
                .map_or_else(|| UNKNOWN.to_string(), |m| m.to_string()),
        }
    }
}

impl fmt::Display for OsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

impl FromStr for OsQuery {
    type Err = FmshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim_start_matches('-');
        Self::ALL
            .iter()
            .find(|q| q.flag().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| FmshError::InvalidArgument(format!("unknown os flag '--{wanted}'")))
    }
}

fn eol() -> &'static str {
    if cfg!(windows) {
        "\r\n"
    } else {
        "\n"
    }
}

fn system_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| UNKNOWN.to_string())
}

fn read_proc(path: &str) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CpuInfo {
    pub model: String,
    pub mhz: Option<f64>,
}

/// One entry per logical CPU. Falls back to the parallelism hint when
/// `/proc/cpuinfo` is unavailable.
pub fn cpus() -> Vec<CpuInfo> {
    let parsed = read_proc("/proc/cpuinfo")
        .map(|s| parse_cpuinfo(&s))
        .unwrap_or_default();
    if !parsed.is_empty() {
        return parsed;
    }
    let count = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    vec![
        CpuInfo {
            model: UNKNOWN.to_string(),
            mhz: None,
        };
        count
    ]
}

pub(crate) fn parse_cpuinfo(text: &str) -> Vec<CpuInfo> {
    let mut cpus = Vec::new();
    for block in text.split("\n\n") {
        let mut model = None;
        let mut mhz = None;
        let mut is_processor = false;
        for line in block.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            match key.trim() {
                "processor" => is_processor = true,
                "model name" | "Model" | "cpu model" => model = Some(value.trim().to_string()),
                "cpu MHz" => mhz = value.trim().parse::<f64>().ok(),
                _ => {}
            }
        }
        if is_processor {
            cpus.push(CpuInfo {
                model: model.unwrap_or_else(|| UNKNOWN.to_string()),
                mhz,
            });
        }
    }
    cpus
}

fn describe_cpus(cpus: &[CpuInfo]) -> String {
    let mut out = format!("{} logical CPU(s)", cpus.len());
    for (i, cpu) in cpus.iter().enumerate() {
        match cpu.mhz {
            Some(mhz) => out.push_str(&format!("\n  #{i}: {} ({:.2} GHz)", cpu.model, mhz / 1000.0)),
            None => out.push_str(&format!("\n  #{i}: {}", cpu.model)),
        }
    }
    out
}

/// Whole seconds since boot.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn parse_uptime(text: &str) -> Option<u64> {
    let secs: f64 = text.split_whitespace().next()?.parse().ok()?;
    Some(secs as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total: u64,
    pub available: u64,
}

impl fmt::Display for MemoryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} total, {} available",
            format_size(self.total),
            format_size(self.available)
        )
    }
}

/// `MemTotal` and `MemAvailable` (falling back to `MemFree`), in bytes.
pub(crate) fn parse_meminfo(text: &str) -> Option<MemoryInfo> {
    let field = |name: &str| -> Option<u64> {
        text.lines().find_map(|line| {
            let rest = line.strip_prefix(name)?.strip_prefix(':')?;
            let kib: u64 = rest.split_whitespace().next()?.parse().ok()?;
            Some(kib * 1024)
        })
    };
    Some(MemoryInfo {
        total: field("MemTotal")?,
        available: field("MemAvailable").or_else(|| field("MemFree"))?,
    })
}

struct Uname {
    nodename: String,
    release: String,
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn uname() -> Option<Uname> {
    use std::ffi::CStr;

    // SAFETY: utsname is plain data; uname fills it with NUL-terminated strings.
    unsafe {
        let mut buf: libc::utsname = std::mem::zeroed();
        if libc::uname(&mut buf) != 0 {
            return None;
        }
        Some(Uname {
            nodename: CStr::from_ptr(buf.nodename.as_ptr()).to_string_lossy().into_owned(),
            release: CStr::from_ptr(buf.release.as_ptr()).to_string_lossy().into_owned(),
        })
    }
}

#[cfg(not(unix))]
fn uname() -> Option<Uname> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse_case_insensitively() {
        assert_eq!("EOL".parse::<OsQuery>().unwrap(), OsQuery::Eol);
        assert_eq!("--eol".parse::<OsQuery>().unwrap(), OsQuery::Eol);
        assert_eq!("Architecture".parse::<OsQuery>().unwrap(), OsQuery::Architecture);
        assert!(matches!(
            "gpu".parse::<OsQuery>(),
            Err(FmshError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_eol_is_escaped() {
        let value = OsQuery::Eol.value();
        assert!(value == "\\n" || value == "\\r\\n");
    }

    #[test]
    fn test_static_values() {
        assert_eq!(OsQuery::Architecture.value(), std::env::consts::ARCH);
        assert_eq!(OsQuery::Platform.value(), std::env::consts::OS);
        assert!(!OsQuery::Cpus.value().is_empty());
    }

    #[test]
    fn test_parse_cpuinfo() {
        let text = "processor\t: 0\nmodel name\t: Test CPU @ 2.40GHz\ncpu MHz\t\t: 2400.000\n\n\
                    processor\t: 1\nmodel name\t: Test CPU @ 2.40GHz\ncpu MHz\t\t: 1200.500\n";
        let cpus = parse_cpuinfo(text);
        assert_eq!(cpus.len(), 2);
        assert_eq!(cpus[0].model, "Test CPU @ 2.40GHz");
        assert_eq!(cpus[1].mhz, Some(1200.5));
        assert!(describe_cpus(&cpus).contains("2.40 GHz"));
    }

    #[test]
    fn test_parse_uptime() {
        assert_eq!(parse_uptime("12345.67 54321.00\n"), Some(12345));
        assert_eq!(parse_uptime("garbage"), None);
    }

    #[test]
    fn test_parse_meminfo() {
        let text = "MemTotal:       16384 kB\nMemFree:         1024 kB\nMemAvailable:    8192 kB\n";
        let mem = parse_meminfo(text).unwrap();
        assert_eq!(mem.total, 16384 * 1024);
        assert_eq!(mem.available, 8192 * 1024);

        let old_kernel = "MemTotal: 2048 kB\nMemFree: 512 kB\n";
        assert_eq!(parse_meminfo(old_kernel).unwrap().available, 512 * 1024);
        assert_eq!(parse_meminfo("nothing here"), None);
    }
}
