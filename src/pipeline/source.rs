//! Source acquisition: download, checksum, extract.
//!
//! Archives land in a shared downloads directory and are reused when their
//! sha256 still matches. The entry is locked while it is fetched and checked.

use flate2::read::GzDecoder;
use fs2::FileExt;
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::layout::{remove_dir_if_exists, RunLayout};
use crate::error::{RecipeError, Result};

const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Pinned upstream source of the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    pub version: String,
    pub homepage: String,
    pub sha256: String,
}

impl SourceSpec {
    pub fn archive_url(&self) -> String {
        archive_url(&self.homepage, &self.version)
    }

    pub fn archive_filename(&self) -> String {
        format!("{}-{}.tar.gz", self.name, self.version)
    }

    /// Top-level directory the archive unpacks into.
    pub fn extracted_dir(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

/// `{homepage}/archive/{version}.tar.gz`
pub fn archive_url(homepage: &str, version: &str) -> String {
    format!("{}/archive/{}.tar.gz", homepage.trim_end_matches('/'), version)
}

/// Unpacked source tree of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub root: PathBuf,
}

/// Transport that writes the body behind `url` to `dest`.
pub trait SourceFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Blocking HTTP(S) fetcher.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| RecipeError::Fetch {
                url: String::new(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl SourceFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let fetch_err = |reason: String| RecipeError::Fetch {
            url: url.to_string(),
            reason,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_err(format!("HTTP {}", response.status())));
        }

        let bytes = write_via_part_file(dest, |file| {
            response.copy_to(file).map_err(|e| fetch_err(e.to_string()))
        })?;
        debug!("downloaded {} bytes from {}", bytes, url);
        Ok(())
    }
}

/// Write `dest` through a sibling `.part` file that is renamed on success and
/// removed on failure.
fn write_via_part_file<F>(dest: &Path, write: F) -> Result<u64>
where
    F: FnOnce(&mut File) -> Result<u64>,
{
    let tmp = dest.with_extension("part");
    let written = File::create(&tmp)
        .map_err(RecipeError::from)
        .and_then(|mut file| write(&mut file));
    match written {
        Ok(bytes) => {
            fs::rename(&tmp, dest)?;
            Ok(bytes)
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

/// Fetch, verify and unpack the source archive into `layout`.
pub fn acquire(
    fetcher: &dyn SourceFetcher,
    layout: &RunLayout,
    spec: &SourceSpec,
) -> Result<SourceLocation> {
    let url = spec.archive_url();
    let archive = layout.downloads.join(spec.archive_filename());
    fs::create_dir_all(&layout.downloads)?;

    {
        let _lock = DownloadLock::acquire(&archive)?;
        if archive.is_file() && sha256_file(&archive)? == spec.sha256.to_ascii_lowercase() {
            info!("using cached archive {}", archive.display());
        } else {
            if archive.exists() {
                warn!("discarding cached archive {} (checksum mismatch)", archive.display());
                fs::remove_file(&archive)?;
            }
            info!("fetching {}", url);
            fetcher.fetch(&url, &archive)?;
            verify_archive(&archive, &url, &spec.sha256)?;
        }
    }

    let extracted = layout.root.join(spec.extracted_dir());
    let source = layout.source_folder();
    remove_dir_if_exists(&extracted)?;
    remove_dir_if_exists(&source)?;

    extract_tar_gz(&archive, &layout.root).map_err(|e| RecipeError::Fetch {
        url: url.clone(),
        reason: format!("failed to unpack {}: {e}", archive.display()),
    })?;

    if !extracted.is_dir() {
        return Err(RecipeError::Fetch {
            url,
            reason: format!(
                "archive did not contain top-level directory '{}'",
                spec.extracted_dir()
            ),
        });
    }
    fs::rename(&extracted, &source)?;
    debug!("source tree at {}", source.display());

    Ok(SourceLocation { root: source })
}

/// Check `archive` against `expected`; a mismatching file is deleted.
fn verify_archive(archive: &Path, url: &str, expected: &str) -> Result<()> {
    let actual = sha256_file(archive)?;
    if actual != expected.to_ascii_lowercase() {
        let _ = fs::remove_file(archive);
        return Err(RecipeError::Integrity {
            url: url.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

pub(crate) fn sha256_file(path: &Path) -> Result<String> {
    let f = File::open(path)?;
    let mut r = BufReader::new(f);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = r.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> std::io::Result<()> {
    let f = File::open(archive)?;
    let mut tar = tar::Archive::new(GzDecoder::new(f));
    tar.unpack(dest)
}

/// Exclusive lock on a download entry, released on drop.
///
/// The lock file itself stays on disk. Unlinking it would let a waiter hold a
/// lock on a deleted inode while the next caller locks a fresh file.
struct DownloadLock {
    file: File,
}

impl DownloadLock {
    fn acquire(archive: &Path) -> Result<Self> {
        let path = archive.with_extension("lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for DownloadLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}
