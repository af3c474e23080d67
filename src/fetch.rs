use std::path::Path;
use std::time::Duration;

use fs_err as fs;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GET {url}: server responded {status}")]
    Status { url: String, status: StatusCode },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Blocking GET of `url` into `dest`. The destination file is created before
/// the body streams, so a failed transfer can leave a partial file behind;
/// callers holding a cleanup guard remove it either way.
pub fn fetch_to_path(client: &Client, url: &str, dest: &Path) -> Result<(), FetchError> {
    let pb = spinner(format!("GET {}", url_file_name(url)));
    let result = fetch_inner(client, url, dest);
    match &result {
        Ok(()) => pb.finish_with_message(format!("Saved {}", dest.display())),
        Err(_) => pb.finish_and_clear(),
    }
    result
}

fn fetch_inner(client: &Client, url: &str, dest: &Path) -> Result<(), FetchError> {
    let mut resp = client.get(url).send().map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;
    if !resp.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: resp.status(),
        });
    }
    let mut out = fs::File::create(dest)?;
    resp.copy_to(&mut out).map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;
    Ok(())
}

fn spinner(msg: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Final path segment of a URL; the artifact's local file name.
pub fn url_file_name(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_the_final_path_segment() {
        assert_eq!(
            url_file_name("https://example.com/a/b/wezterm.Ubuntu22.04.deb"),
            "wezterm.Ubuntu22.04.deb"
        );
        assert_eq!(url_file_name("https://example.com/WezTerm.zip"), "WezTerm.zip");
    }

    #[test]
    fn file_name_of_a_bare_token_is_the_token() {
        assert_eq!(url_file_name("plain-name"), "plain-name");
    }
}
