use std::fmt;

use fs_err as fs;

/// OS family key used by the package catalog. Distributions the catalog does
/// not cover stay addressable through `Other` so diagnostics can name them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Macos,
    Ubuntu,
    Debian,
    /// Generic fallback when the Linux distribution cannot be identified.
    Linux,
    /// Raw OS or distribution name (e.g. "Fedora", "windows").
    Other(String),
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::Macos => write!(f, "macos"),
            OsFamily::Ubuntu => write!(f, "Ubuntu"),
            OsFamily::Debian => write!(f, "Debian"),
            OsFamily::Linux => write!(f, "Linux"),
            OsFamily::Other(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Amd64,
    Arm64,
}

impl Arch {
    /// Normalize the machine-architecture spellings seen across platforms.
    pub fn from_machine(machine: &str) -> Option<Self> {
        match machine {
            "x86_64" | "AMD64" | "amd64" => Some(Arch::Amd64),
            "aarch64" | "arm64" => Some(Arch::Arm64),
            _ => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::Amd64 => write!(f, "amd64"),
            Arch::Arm64 => write!(f, "arm64"),
        }
    }
}

/// What the host reports about itself, normalized to catalog keys. Derived
/// once per run.
#[derive(Debug, Clone)]
pub struct HostPlatform {
    pub family: OsFamily,
    /// Distribution major version ("22.04" -> "22"); only set for Linux.
    pub version: Option<String>,
    /// None when the machine architecture is not one we recognize.
    pub arch: Option<Arch>,
}

impl HostPlatform {
    /// Read-only inspection of the host; never fails. An unrecognized
    /// architecture surfaces as `arch: None` so the caller can report it.
    pub fn detect() -> Self {
        let arch = Arch::from_machine(std::env::consts::ARCH);
        let (family, version) = match std::env::consts::OS {
            "macos" => (OsFamily::Macos, None),
            "linux" => linux_family(),
            other => (OsFamily::Other(other.to_string()), None),
        };
        HostPlatform {
            family,
            version,
            arch,
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "os={}", self.family)?;
        if let Some(version) = &self.version {
            write!(f, " version={version}")?;
        }
        match self.arch {
            Some(arch) => write!(f, " arch={arch}"),
            None => write!(f, " arch=unknown"),
        }
    }
}

const OS_RELEASE_PATH: &str = "/etc/os-release";

fn linux_family() -> (OsFamily, Option<String>) {
    match fs::read_to_string(OS_RELEASE_PATH) {
        Ok(text) => family_from_os_release(&text),
        Err(_) => (OsFamily::Linux, None),
    }
}

fn family_from_os_release(text: &str) -> (OsFamily, Option<String>) {
    let release = parse_os_release(text);
    let Some(id) = release.id else {
        // No ID field: treat the descriptor as malformed.
        return (OsFamily::Linux, None);
    };
    let family = match id.as_str() {
        "ubuntu" => OsFamily::Ubuntu,
        "debian" => OsFamily::Debian,
        other => OsFamily::Other(capitalize(other)),
    };
    (family, release.version_major)
}

#[derive(Debug, Default)]
struct OsRelease {
    id: Option<String>,
    version_major: Option<String>,
}

// KEY=VALUE lines, values optionally double-quoted. Lines that do not fit
// that shape are skipped.
fn parse_os_release(text: &str) -> OsRelease {
    let mut release = OsRelease::default();
    for line in text.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim_matches('"');
        match key {
            "ID" => release.id = Some(value.to_string()),
            "VERSION_ID" => {
                if let Some(major) = value.split('.').next() {
                    if !major.is_empty() {
                        release.version_major = Some(major.to_string());
                    }
                }
            }
            _ => {}
        }
    }
    release
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UBUNTU_OS_RELEASE: &str = r#"PRETTY_NAME="Ubuntu 22.04.4 LTS"
NAME="Ubuntu"
VERSION_ID="22.04"
VERSION="22.04.4 LTS (Jammy Jellyfish)"
ID=ubuntu
ID_LIKE=debian
"#;

    #[test]
    fn ubuntu_release_maps_to_family_and_major_version() {
        let (family, version) = family_from_os_release(UBUNTU_OS_RELEASE);
        assert_eq!(family, OsFamily::Ubuntu);
        assert_eq!(version.as_deref(), Some("22"));
    }

    #[test]
    fn debian_release_with_plain_major_version() {
        let (family, version) = family_from_os_release("ID=debian\nVERSION_ID=\"12\"\n");
        assert_eq!(family, OsFamily::Debian);
        assert_eq!(version.as_deref(), Some("12"));
    }

    #[test]
    fn unknown_distro_keeps_its_capitalized_id() {
        let (family, version) = family_from_os_release("ID=fedora\nVERSION_ID=40\n");
        assert_eq!(family, OsFamily::Other("Fedora".to_string()));
        assert_eq!(version.as_deref(), Some("40"));
    }

    #[test]
    fn release_without_id_degrades_to_generic_linux() {
        let (family, version) = family_from_os_release("PRETTY_NAME=\"mystery\"\n");
        assert_eq!(family, OsFamily::Linux);
        assert_eq!(version, None);
    }

    #[test]
    fn garbage_release_degrades_to_generic_linux() {
        let (family, version) = family_from_os_release("not a key value file");
        assert_eq!(family, OsFamily::Linux);
        assert_eq!(version, None);
    }

    #[test]
    fn machine_spellings_normalize_or_reject() {
        assert_eq!(Arch::from_machine("x86_64"), Some(Arch::Amd64));
        assert_eq!(Arch::from_machine("AMD64"), Some(Arch::Amd64));
        assert_eq!(Arch::from_machine("aarch64"), Some(Arch::Arm64));
        assert_eq!(Arch::from_machine("arm64"), Some(Arch::Arm64));
        assert_eq!(Arch::from_machine("riscv64"), None);
        assert_eq!(Arch::from_machine(""), None);
    }
}
