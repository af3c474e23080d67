mod catalog;
mod cli;
mod fetch;
mod installer;
mod platform;
mod setup;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use reqwest::blocking::Client;

use crate::cli::Cli;
use crate::platform::HostPlatform;

// Distinct exit codes for the two unrecoverable pre-download failures.
const EXIT_UNKNOWN_ARCH: u8 = 2;
const EXIT_NO_PACKAGE: u8 = 3;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let host = HostPlatform::detect();
    println!("Looking for a WezTerm package: {host}");

    if host.arch.is_none() {
        eprintln!(
            "Error: unrecognized CPU architecture '{}'.",
            std::env::consts::ARCH
        );
        return ExitCode::from(EXIT_UNKNOWN_ARCH);
    }

    let Some(url) = catalog::resolve(&host) else {
        eprintln!("Sorry, no WezTerm package is listed for this platform.");
        return ExitCode::from(EXIT_NO_PACKAGE);
    };

    if cli.dry_run {
        println!("Would download {url}");
        return ExitCode::SUCCESS;
    }

    let client = Client::new();
    if let Err(e) = installer::install(&client, url) {
        eprintln!("Installation failed: {e}");
        return ExitCode::FAILURE;
    }
    println!("WezTerm installed.");

    if cli.skip_extras {
        println!("Skipping font and configuration setup.");
        return ExitCode::SUCCESS;
    }
    let proceed = cli.assume_yes
        || confirm("\nAlso install the recommended fonts and configuration? (y/N): ");
    if proceed {
        setup::apply(&client);
    } else {
        println!("Skipping font and configuration setup.");
    }
    ExitCode::SUCCESS
}

// EOF or a failed read counts as "no": an interrupt at this one prompt skips
// the optional phase instead of aborting the run.
fn confirm(prompt: &str) -> bool {
    print!("{prompt}");
    let _ = io::stdout().flush();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
    }
}
