use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use sha2::{Digest, Sha256};
use std::env;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::process::Command;
use tracing::debug;
use url::Url;

use crate::ui;

const RELEASE_BASE: &str = "https://github.com/conda-forge/miniforge/releases/latest/download/";
const DEFAULT_USER_AGENT: &str = concat!("conda-migrate/", env!("CARGO_PKG_VERSION"));

pub fn installer_url(asset: &str) -> Result<Url> {
    release_url(asset)
}

/// Miniforge publishes `<asset>.sha256` next to every installer.
pub fn checksum_url(asset: &str) -> Result<Url> {
    release_url(&format!("{asset}.sha256"))
}

fn release_url(file: &str) -> Result<Url> {
    Url::parse(RELEASE_BASE)
        .and_then(|base| base.join(file))
        .with_context(|| format!("Failed to build download URL for {file}"))
}

/// Transfer seam used by the install stage.
pub trait Fetch {
    /// Download `url` into `dest` and return the SHA-256 of the bytes written.
    fn fetch(&self, url: &Url, dest: &Path) -> Result<[u8; 32]>;

    fn fetch_text(&self, url: &Url) -> Result<String>;
}

/// HTTP first; `curl` then `wget` when the built-in client fails.
pub struct Downloader {
    http: Client,
    user_agent: String,
}

impl Downloader {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        let user_agent = env::var("CONDA_MIGRATE_USER_AGENT")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        Ok(Self { http, user_agent })
    }

    fn download_http(&self, url: &Url, dest: &Path) -> Result<[u8; 32]> {
        let mut response = self
            .http
            .get(url.clone())
            .header(USER_AGENT, &self.user_agent)
            .send()
            .with_context(|| format!("Failed to download {url}"))?;

        if !response.status().is_success() {
            bail!("Download of {url} returned {}", response.status());
        }

        let mut file = File::create(dest)
            .with_context(|| format!("Failed to create download file at {:?}", dest))?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];

        loop {
            let read = response
                .read(&mut buffer)
                .with_context(|| format!("Failed while reading download stream from {url}"))?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read])
                .with_context(|| format!("Failed while writing download to {:?}", dest))?;
            hasher.update(&buffer[..read]);
        }

        file.flush()
            .with_context(|| format!("Failed to flush download to {:?}", dest))?;

        Ok(hasher.finalize().into())
    }
}

impl Fetch for Downloader {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<[u8; 32]> {
        match self.download_http(url, dest) {
            Ok(digest) => Ok(digest),
            Err(err) => {
                ui::warn(format!("{err:#}; retrying with an external download tool"));
                download_external(url, dest)?;
                compute_sha256(dest)
            }
        }
    }

    fn fetch_text(&self, url: &Url) -> Result<String> {
        let response = self
            .http
            .get(url.clone())
            .header(USER_AGENT, &self.user_agent)
            .send()
            .with_context(|| format!("Failed to fetch {url}"))?;
        if !response.status().is_success() {
            bail!("Fetching {url} returned {}", response.status());
        }
        response
            .text()
            .with_context(|| format!("Failed to read response body from {url}"))
    }
}

/// Command line for the first external transfer tool found on PATH.
fn external_command(url: &Url, dest: &Path) -> Result<Command> {
    if let Ok(curl) = which::which("curl") {
        let mut command = Command::new(curl);
        command.args(["-fsSL", "-o"]).arg(dest).arg(url.as_str());
        return Ok(command);
    }
    if let Ok(wget) = which::which("wget") {
        let mut command = Command::new(wget);
        command.args(["-q", "-O"]).arg(dest).arg(url.as_str());
        return Ok(command);
    }
    bail!("No download tool available; install curl or wget and retry")
}

fn download_external(url: &Url, dest: &Path) -> Result<()> {
    let mut command = external_command(url, dest)?;
    debug!(?command, "external download");
    let status = command
        .status()
        .with_context(|| format!("Failed to run {:?}", command.get_program()))?;
    if !status.success() {
        bail!(
            "{} could not download {url} ({status})",
            command.get_program().to_string_lossy()
        );
    }
    Ok(())
}

/// Digest from a `sha256sum`-style line (`<hex>  <file name>`).
pub fn parse_checksum(text: &str) -> Result<[u8; 32]> {
    let digest = text
        .split_whitespace()
        .next()
        .context("Checksum file is empty")?;
    if digest.len() != 64 {
        bail!("SHA256 checksum must be exactly 64 hex characters");
    }
    let bytes = hex::decode(digest).context("Failed to decode SHA256 checksum")?;
    let mut array = [0u8; 32];
    array.copy_from_slice(&bytes);
    Ok(array)
}

pub fn format_digest(bytes: &[u8; 32]) -> String {
    hex::encode(bytes)
}

pub fn compute_sha256(path: &Path) -> Result<[u8; 32]> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open file for checksum calculation at {:?}", path))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let read = file
            .read(&mut buffer)
            .with_context(|| format!("Failed to read file {:?} while hashing", path))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.finalize().into())
}
