use std::path::PathBuf;

use anyhow::{bail, Context};
use async_trait::async_trait;
use tokio::process::Command;

use crate::models::VideoMetadata;

/// Outcome of a fetch: the source title plus the path yt-dlp reported for
/// the muxed file, when it reported one.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub title: String,
    pub output_path: Option<PathBuf>,
}

/// The external collaborator that turns a URL into metadata or a local file.
///
/// Kept behind a trait so the route handlers can be exercised without a
/// network connection or a yt-dlp binary on the machine.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Extracts title, thumbnail and the format list for `url` without
    /// downloading anything.
    async fn resolve_metadata(&self, url: &str) -> anyhow::Result<VideoMetadata>;

    /// Downloads and muxes the streams matched by `format_selector` into the
    /// container named by `merge_format`, writing to `output_template`.
    async fn fetch(
        &self,
        url: &str,
        format_selector: &str,
        output_template: &str,
        merge_format: &str,
    ) -> anyhow::Result<FetchOutcome>;
}

/// Production resolver shelling out to the `yt-dlp` executable.
pub struct YtDlpResolver;

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn resolve_metadata(&self, url: &str) -> anyhow::Result<VideoMetadata> {
        let output = Command::new("yt-dlp")
            .arg("--dump-json")
            .arg("--no-warnings")
            .arg(url)
            .output()
            .await
            .context("failed to run yt-dlp")?;

        if !output.status.success() {
            bail!("{}", String::from_utf8_lossy(&output.stderr).trim());
        }

        serde_json::from_slice(&output.stdout).context("yt-dlp returned unparseable metadata")
    }

    async fn fetch(
        &self,
        url: &str,
        format_selector: &str,
        output_template: &str,
        merge_format: &str,
    ) -> anyhow::Result<FetchOutcome> {
        // `after_move:` prints fire only once the file has landed at its
        // final path, so stdout yields the title and path of the real file.
        let output = Command::new("yt-dlp")
            .arg("-f")
            .arg(format_selector)
            .arg("--merge-output-format")
            .arg(merge_format)
            .arg("--no-warnings")
            .arg("--print")
            .arg("after_move:title")
            .arg("--print")
            .arg("after_move:filepath")
            .arg("-o")
            .arg(output_template)
            .arg(url)
            .output()
            .await
            .context("failed to run yt-dlp")?;

        if !output.status.success() {
            bail!("{}", String::from_utf8_lossy(&output.stderr).trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut lines = stdout.lines().map(str::trim).filter(|line| !line.is_empty());
        let title = lines.next().unwrap_or_default().to_string();
        let output_path = lines.next().map(PathBuf::from);

        Ok(FetchOutcome { title, output_path })
    }
}
