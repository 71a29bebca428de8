//! Downloads the chosen candidate and persists its original bytes.

use std::path::{Path, PathBuf};

use log::{info, warn};
use url::Url;

use crate::candidate_discovery::RankedCandidate;
use crate::candidate_scoring::is_vector_url;
use crate::candidate_selection::first_raster_candidate;
use crate::config::Config;
use crate::fetcher::HttpFetcher;
use crate::image_pipeline::write_file_atomic;

const PLACEHOLDER_EXTENSION: &str = ".img";

/// Original image bytes saved to the assets directory.
#[derive(Debug, Clone)]
pub struct DownloadedSource {
    pub url: String,
    pub bytes: Vec<u8>,
    pub path: PathBuf,
    /// True when a vector choice was swapped for a raster candidate.
    pub substituted_vector: bool,
}

/// Extension of the URL path including the dot, or `.img` when there is none.
pub fn source_extension(url: &str) -> String {
    let path = Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    Path::new(&path)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_else(|| PLACEHOLDER_EXTENSION.to_string())
}

pub fn source_path_for(config: &Config, url: &str) -> PathBuf {
    config.output.assets_dir.join(format!(
        "{}{}",
        config.output.source_basename,
        source_extension(url)
    ))
}

fn download_and_persist<F: HttpFetcher + ?Sized>(
    fetcher: &F,
    config: &Config,
    url: &str,
) -> Result<DownloadedSource, String> {
    let bytes = fetcher.fetch_bytes(url, &config.source.page_url)?;
    let path = source_path_for(config, url);
    write_file_atomic(&path, &bytes)?;
    info!("Saved source image: {}", path.display());
    Ok(DownloadedSource {
        url: url.to_string(),
        bytes,
        path,
        substituted_vector: false,
    })
}

/// Downloads `chosen`; a vector result is replaced by the first raster candidate when one exists.
pub fn fetch_chosen_source<F: HttpFetcher + ?Sized>(
    fetcher: &F,
    config: &Config,
    chosen: &RankedCandidate,
    candidates: &[RankedCandidate],
) -> Result<DownloadedSource, String> {
    let downloaded = download_and_persist(fetcher, config, &chosen.url)?;
    if !is_vector_url(&source_extension(&downloaded.url)) {
        return Ok(downloaded);
    }

    let Some(raster) = first_raster_candidate(candidates) else {
        warn!(
            "Chosen image is a vector and no raster candidate exists: {}",
            downloaded.url
        );
        return Ok(downloaded);
    };
    info!("Switching to raster candidate: {}", raster.url);
    let mut replacement = download_and_persist(fetcher, config, &raster.url)?;
    replacement.substituted_vector = true;
    Ok(replacement)
}
