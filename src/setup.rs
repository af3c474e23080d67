use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use fs_err as fs;
use reqwest::blocking::Client;
use thiserror::Error;

use crate::fetch::{self, FetchError};

const JETBRAINS_MONO_URL: &str =
    "https://github.com/ryanoasis/nerd-fonts/releases/download/v3.4.0/JetBrainsMono.zip";

// Fandol is published as individual font files, there is no archive.
const FANDOL_URLS: [&str; 8] = [
    "https://mirrors.ctan.org/fonts/fandol/FandolBraille-Display.otf",
    "https://mirrors.ctan.org/fonts/fandol/FandolBraille-Regular.otf",
    "https://mirrors.ctan.org/fonts/fandol/FandolFang-Regular.otf",
    "https://mirrors.ctan.org/fonts/fandol/FandolHei-Bold.otf",
    "https://mirrors.ctan.org/fonts/fandol/FandolHei-Regular.otf",
    "https://mirrors.ctan.org/fonts/fandol/FandolKai-Regular.otf",
    "https://mirrors.ctan.org/fonts/fandol/FandolSong-Bold.otf",
    "https://mirrors.ctan.org/fonts/fandol/FandolSong-Regular.otf",
];

const CONFIG_REPO_URL: &str = "https://github.com/lyxichigoichie/wezterm-config.git";

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Download(#[from] FetchError),
    #[error("unpacking archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("`{command}` exited with {status}")]
    Subprocess { command: String, status: ExitStatus },
    #[error("could not locate the home directory")]
    NoHomeDir,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Best-effort enrichment after the main install: fonts, then the
/// configuration clone. A failure in one phase is reported and does not
/// abort the other.
pub fn apply(client: &Client) {
    println!("\n--- Setting up WezTerm fonts and configuration ---");
    match font_dir() {
        Some(dir) => {
            if let Err(e) = install_fonts(client, &dir) {
                eprintln!("Font installation failed: {e}");
            }
        }
        None => println!("No font directory for this OS; skipping font installation."),
    }
    if let Err(e) = clone_config() {
        eprintln!("Fetching the configuration repository failed: {e}");
    }
    println!("\n--- Setup finished ---");
    println!("Restart WezTerm for the changes to take effect.");
}

/// Per-user font install path. Only Linux and macOS are covered.
fn font_dir() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    match std::env::consts::OS {
        "linux" => Some(home.join(".local").join("share").join("fonts")),
        "macos" => Some(home.join("Library").join("Fonts")),
        _ => None,
    }
}

fn scratch_dir() -> Result<PathBuf, SetupError> {
    let home = dirs::home_dir().ok_or(SetupError::NoHomeDir)?;
    let dir = home.join("Downloads").join("wezterm");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn install_fonts(client: &Client, font_dir: &Path) -> Result<(), SetupError> {
    println!("Fonts will be installed to {}", font_dir.display());
    fs::create_dir_all(font_dir)?;
    let scratch = scratch_dir()?;

    // JetBrainsMono ships as one archive of .ttf files.
    println!("Downloading JetBrainsMono Nerd Font...");
    let archive_path = scratch.join(fetch::url_file_name(JETBRAINS_MONO_URL));
    fetch::fetch_to_path(client, JETBRAINS_MONO_URL, &archive_path)?;
    let extract_dir = scratch.join("JetBrainsMono");
    let mut zip = zip::ZipArchive::new(fs::File::open(&archive_path)?)?;
    zip.extract(&extract_dir)?;
    let moved = move_fonts(&extract_dir, font_dir, "ttf")?;
    println!("Installed {moved} JetBrainsMono font files.");
    fs::remove_dir_all(&extract_dir)?;
    fs::remove_file(&archive_path)?;

    println!("Downloading Fandol CJK fonts...");
    let fandol_dir = scratch.join("Fandol");
    fs::create_dir_all(&fandol_dir)?;
    for url in FANDOL_URLS {
        let name = fetch::url_file_name(url);
        println!("  - {name}");
        fetch::fetch_to_path(client, url, &fandol_dir.join(&name))?;
    }
    let moved = move_fonts(&fandol_dir, font_dir, "otf")?;
    println!("Installed {moved} Fandol font files.");
    fs::remove_dir_all(&fandol_dir)?;
    Ok(())
}

/// Move every file with the given extension from `src` into `dest`.
fn move_fonts(src: &Path, dest: &Path, ext: &str) -> Result<usize, SetupError> {
    let mut moved = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension() == Some(OsStr::new(ext)) {
            move_file(&path, &dest.join(entry.file_name()))?;
            moved += 1;
        }
    }
    Ok(moved)
}

// rename() cannot cross filesystems; fall back to copy + remove.
fn move_file(src: &Path, dest: &Path) -> Result<(), SetupError> {
    if fs::rename(src, dest).is_err() {
        fs::copy(src, dest)?;
        fs::remove_file(src)?;
    }
    Ok(())
}

fn clone_config() -> Result<(), SetupError> {
    if which::which("git").is_err() {
        println!("'git' not found; skipping the configuration clone.");
        return Ok(());
    }
    let home = dirs::home_dir().ok_or(SetupError::NoHomeDir)?;
    let config_dir = home.join(".config").join("wezterm");
    backup_existing(&config_dir)?;
    println!("Cloning wezterm-config into {}...", config_dir.display());
    let mut cmd = Command::new("git");
    cmd.arg("clone").arg(CONFIG_REPO_URL).arg(&config_dir);
    run(cmd)?;
    println!("Configuration cloned.");
    Ok(())
}

/// Rotate an existing config directory to `<dir>.bak`, replacing any prior
/// backup so only one generation is kept. A failed clone afterwards leaves
/// the backup in place; it is not restored automatically.
fn backup_existing(config_dir: &Path) -> Result<(), SetupError> {
    if !config_dir.exists() {
        return Ok(());
    }
    let backup = config_dir.with_extension("bak");
    if backup.exists() {
        fs::remove_dir_all(&backup)?;
    }
    fs::rename(config_dir, &backup)?;
    println!("Existing configuration moved to {}", backup.display());
    Ok(())
}

fn run(mut cmd: Command) -> Result<(), SetupError> {
    let rendered = format!("{cmd:?}");
    let status = cmd.status()?;
    if status.success() {
        Ok(())
    } else {
        Err(SetupError::Subprocess {
            command: rendered,
            status,
        })
    }
}
