use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use fs_err as fs;
use reqwest::blocking::Client;
use thiserror::Error;

use crate::fetch::{self, FetchError};

#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    Download(#[from] FetchError),
    #[error("`{command}` exited with {status}")]
    Subprocess { command: String, status: ExitStatus },
    #[error("no .app bundle found inside {0}")]
    MissingBundle(String),
    #[error("no install step for '{0}' on this OS")]
    UnsupportedArtifact(String),
    #[error("unpacking archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// How an artifact gets installed, decided by its file-name suffix and the
/// host OS.
#[derive(Debug, PartialEq, Eq)]
enum InstallMethod {
    AptPackage,
    MacosBundle,
    Unsupported,
}

fn classify(file_name: &str, os: &str) -> InstallMethod {
    if file_name.ends_with(".deb") {
        InstallMethod::AptPackage
    } else if file_name.ends_with(".zip") && os == "macos" {
        InstallMethod::MacosBundle
    } else {
        InstallMethod::Unsupported
    }
}

/// Removes the downloaded artifact when it goes out of scope, whichever way
/// the install attempt ended.
struct DownloadGuard {
    path: PathBuf,
}

impl DownloadGuard {
    fn fetch(client: &Client, url: &str, dest: PathBuf) -> (Self, Result<(), FetchError>) {
        // Arm the guard before the transfer starts: a failed fetch can leave
        // a partial file at `dest`.
        let guard = DownloadGuard { path: dest };
        let result = fetch::fetch_to_path(client, url, &guard.path);
        (guard, result)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DownloadGuard {
    fn drop(&mut self) {
        if self.path.exists() {
            match fs::remove_file(&self.path) {
                Ok(()) => println!("Removed downloaded file {}", self.path.display()),
                Err(e) => eprintln!("Warning: could not remove {}: {e}", self.path.display()),
            }
        }
    }
}

/// Download the artifact into the current working directory and hand it to
/// the native install mechanism. The downloaded file is deleted on every
/// exit path.
pub fn install(client: &Client, url: &str) -> Result<(), InstallError> {
    let file_name = fetch::url_file_name(url);
    let dest = std::env::current_dir()?.join(&file_name);
    println!("Downloading {file_name}");
    let (artifact, fetched) = DownloadGuard::fetch(client, url, dest);
    fetched?;

    match classify(&file_name, std::env::consts::OS) {
        InstallMethod::AptPackage => install_deb(artifact.path()),
        InstallMethod::MacosBundle => install_app_bundle(artifact.path(), &file_name),
        InstallMethod::Unsupported => Err(InstallError::UnsupportedArtifact(file_name)),
    }
}

fn install_deb(package: &Path) -> Result<(), InstallError> {
    println!("Detected a .deb package; installing via apt-get...");
    let mut cmd = Command::new("sudo");
    cmd.args(["apt-get", "install", "-y"]).arg(package);
    run(cmd)?;
    println!("Package installed.");
    Ok(())
}

fn install_app_bundle(archive: &Path, file_name: &str) -> Result<(), InstallError> {
    println!("Detected a .zip archive; extracting and moving to /Applications...");
    // Extraction happens in a staging dir that is discarded with this scope.
    let staging = tempfile::tempdir()?;
    let reader = fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(reader)?;
    zip.extract(staging.path())?;

    let (bundle, bundle_name) = find_app_bundle(staging.path())?
        .ok_or_else(|| InstallError::MissingBundle(file_name.to_string()))?;
    let dest = Path::new("/Applications").join(&bundle_name);
    if dest.exists() {
        println!("Found an existing {}; removing it first.", dest.display());
        let mut rm = Command::new("sudo");
        rm.args(["rm", "-rf"]).arg(&dest);
        run(rm)?;
    }
    println!(
        "Moving {} to {}...",
        bundle_name.to_string_lossy(),
        dest.display()
    );
    let mut mv = Command::new("sudo");
    mv.arg("mv").arg(&bundle).arg(&dest);
    run(mv)?;
    println!("Application installed.");
    Ok(())
}

/// First top-level `*.app` entry in `dir`, if any.
fn find_app_bundle(dir: &Path) -> Result<Option<(PathBuf, OsString)>, InstallError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "app") {
            return Ok(Some((path, entry.file_name())));
        }
    }
    Ok(None)
}

fn run(mut cmd: Command) -> Result<(), InstallError> {
    let rendered = format!("{cmd:?}");
    let status = cmd.status()?;
    if status.success() {
        Ok(())
    } else {
        Err(InstallError::Subprocess {
            command: rendered,
            status,
        })
    }
}
