use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::platform::{Arch, HostPlatform, OsFamily};

/// The two lookup shapes the catalog uses: the macOS entry keys on
/// architecture alone, the Debian-family entries key on distribution major
/// version first.
#[derive(Debug)]
pub enum PackageSet {
    ByArch(HashMap<Arch, &'static str>),
    ByVersionThenArch(HashMap<&'static str, HashMap<Arch, &'static str>>),
}

/// WezTerm release artifacts, keyed by platform. Compiled in; never fetched
/// or updated at runtime.
static CATALOG: Lazy<HashMap<OsFamily, PackageSet>> = Lazy::new(|| {
    use Arch::{Amd64, Arm64};
    HashMap::from([
        (
            OsFamily::Macos,
            PackageSet::ByArch(HashMap::from([(
                Arm64,
                "https://github.com/wezterm/wezterm/releases/download/20240203-110809-5046fc22/WezTerm-macos-20240203-110809-5046fc22.zip",
            )])),
        ),
        (
            OsFamily::Ubuntu,
            PackageSet::ByVersionThenArch(HashMap::from([
                (
                    "22",
                    HashMap::from([
                        (
                            Amd64,
                            "https://github.com/wezterm/wezterm/releases/download/20240203-110809-5046fc22/wezterm-20240203-110809-5046fc22.Ubuntu22.04.deb",
                        ),
                        (
                            Arm64,
                            "https://github.com/wezterm/wezterm/releases/download/20240203-110809-5046fc22/wezterm-20240203-110809-5046fc22.Ubuntu22.04.arm64.deb",
                        ),
                    ]),
                ),
                (
                    "20",
                    HashMap::from([(
                        Amd64,
                        "https://github.com/wezterm/wezterm/releases/download/20240203-110809-5046fc22/wezterm-20240203-110809-5046fc22.Ubuntu20.04.deb",
                    )]),
                ),
            ])),
        ),
        (
            OsFamily::Debian,
            PackageSet::ByVersionThenArch(HashMap::from([
                (
                    "12",
                    HashMap::from([
                        (
                            Amd64,
                            "https://github.com/wezterm/wezterm/releases/download/20240203-110809-5046fc22/wezterm-20240203-110809-5046fc22.Debian12.deb",
                        ),
                        (
                            Arm64,
                            "https://github.com/wezterm/wezterm/releases/download/20240203-110809-5046fc22/wezterm-20240203-110809-5046fc22.Debian12.arm64.deb",
                        ),
                    ]),
                ),
                (
                    "11",
                    HashMap::from([(
                        Amd64,
                        "https://github.com/wezterm/wezterm/releases/download/20240203-110809-5046fc22/wezterm-20240203-110809-5046fc22.Debian11.deb",
                    )]),
                ),
            ])),
        ),
    ])
});

/// Look up the download URL for the detected platform. Exact matches only:
/// an unlisted distribution version resolves to nothing even when a close
/// version is present.
pub fn resolve(host: &HostPlatform) -> Option<&'static str> {
    resolve_in(&CATALOG, host)
}

fn resolve_in(
    catalog: &HashMap<OsFamily, PackageSet>,
    host: &HostPlatform,
) -> Option<&'static str> {
    let arch = host.arch?;
    match catalog.get(&host.family)? {
        PackageSet::ByArch(by_arch) => by_arch.get(&arch).copied(),
        PackageSet::ByVersionThenArch(by_version) => {
            let version = host.version.as_deref()?;
            by_version.get(version)?.get(&arch).copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(family: OsFamily, version: Option<&str>, arch: Option<Arch>) -> HostPlatform {
        HostPlatform {
            family,
            version: version.map(str::to_string),
            arch,
        }
    }

    #[test]
    fn every_catalog_entry_resolves_to_its_own_url() {
        for (family, set) in CATALOG.iter() {
            match set {
                PackageSet::ByArch(by_arch) => {
                    for (arch, url) in by_arch {
                        let h = host(family.clone(), None, Some(*arch));
                        assert_eq!(resolve(&h), Some(*url));
                    }
                }
                PackageSet::ByVersionThenArch(by_version) => {
                    for (version, by_arch) in by_version {
                        for (arch, url) in by_arch {
                            let h = host(family.clone(), Some(*version), Some(*arch));
                            assert_eq!(resolve(&h), Some(*url));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn every_leaf_is_a_well_formed_artifact_url() {
        for set in CATALOG.values() {
            match set {
                PackageSet::ByArch(by_arch) => {
                    for url in by_arch.values() {
                        assert!(url.starts_with("https://"));
                        assert!(url.ends_with(".zip") || url.ends_with(".deb"));
                    }
                }
                PackageSet::ByVersionThenArch(by_version) => {
                    for by_arch in by_version.values() {
                        for url in by_arch.values() {
                            assert!(url.starts_with("https://"));
                            assert!(url.ends_with(".deb"));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn unlisted_versions_do_not_fall_back_to_neighbors() {
        assert_eq!(
            resolve(&host(OsFamily::Ubuntu, Some("18"), Some(Arch::Amd64))),
            None
        );
        assert_eq!(
            resolve(&host(OsFamily::Ubuntu, Some("20"), Some(Arch::Arm64))),
            None
        );
        assert_eq!(
            resolve(&host(OsFamily::Debian, Some("10"), Some(Arch::Amd64))),
            None
        );
    }

    #[test]
    fn macos_keys_on_architecture_alone() {
        let with_version = host(OsFamily::Macos, Some("14"), Some(Arch::Arm64));
        let without_version = host(OsFamily::Macos, None, Some(Arch::Arm64));
        assert_eq!(resolve(&with_version), resolve(&without_version));
        assert!(resolve(&without_version).is_some());
        assert_eq!(resolve(&host(OsFamily::Macos, None, Some(Arch::Amd64))), None);
    }

    #[test]
    fn uncovered_families_resolve_to_nothing() {
        assert_eq!(
            resolve(&host(OsFamily::Linux, None, Some(Arch::Amd64))),
            None
        );
        assert_eq!(
            resolve(&host(
                OsFamily::Other("Fedora".to_string()),
                Some("40"),
                Some(Arch::Amd64)
            )),
            None
        );
        assert_eq!(
            resolve(&host(
                OsFamily::Other("windows".to_string()),
                None,
                Some(Arch::Amd64)
            )),
            None
        );
    }

    #[test]
    fn missing_arch_or_version_resolves_to_nothing() {
        assert_eq!(resolve(&host(OsFamily::Macos, None, None)), None);
        assert_eq!(
            resolve(&host(OsFamily::Ubuntu, None, Some(Arch::Amd64))),
            None
        );
    }
}
