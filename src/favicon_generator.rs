//! End-to-end favicon generation: discover, select, download, transform, encode.

use std::path::PathBuf;

use log::{debug, info};

use crate::candidate_discovery::discover_candidates;
use crate::candidate_selection::select_candidate;
use crate::config::Config;
use crate::fetcher::HttpFetcher;
use crate::image_pipeline::{decode_image_from_memory_with_fallback, to_square_rgba, write_icon_file};
use crate::source_image::fetch_chosen_source;

/// Summary of one successful generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub chosen_url: String,
    pub source_path: PathBuf,
    pub icon_path: PathBuf,
    pub icon_sizes: Vec<u32>,
    pub substituted_vector: bool,
}

pub fn generate_favicon<F: HttpFetcher + ?Sized>(
    config: &Config,
    fetcher: &F,
) -> Result<GenerationReport, String> {
    let page_url = config.source.page_url.as_str();
    info!("Fetching page: {}", page_url);
    let html = fetcher.fetch_text(page_url)?;

    let candidates = discover_candidates(&html, page_url)?;
    info!(
        "Candidates (top {} of {}):",
        config.discovery.log_top_candidates.min(candidates.len()),
        candidates.len()
    );
    for candidate in candidates.iter().take(config.discovery.log_top_candidates) {
        info!(" - [{}] {}", candidate.score, candidate.url);
    }

    let (chosen, rule) = select_candidate(&candidates)?;
    info!("Chosen image: {}", chosen.url);
    debug!("Selected by rule '{}'", rule);

    let source = fetch_chosen_source(fetcher, config, chosen, &candidates)?;
    let decoded = decode_image_from_memory_with_fallback(&source.bytes)
        .map_err(|err| format!("Failed to open image from {}: {}", source.url, err))?;

    let square = to_square_rgba(&decoded);
    write_icon_file(square, &config.output.icon_sizes, &config.output.icon_path)?;
    info!("Wrote {}", config.output.icon_path.display());

    Ok(GenerationReport {
        chosen_url: source.url,
        source_path: source.path,
        icon_path: config.output.icon_path.clone(),
        icon_sizes: config.output.icon_sizes.clone(),
        substituted_vector: source.substituted_vector,
    })
}
