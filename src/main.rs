mod candidate_discovery;
mod candidate_scoring;
mod candidate_selection;
mod config;
mod favicon_generator;
mod fetcher;
mod image_pipeline;
mod source_image;

use std::process::ExitCode;

use fetcher::ureq_fetcher::UreqFetcher;
use log::{error, info};

fn main() -> ExitCode {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Debug);
    clog.init();

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let config = match config::load_config(&config::config_search_paths()) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let fetcher = UreqFetcher::new(&config.source);
    match favicon_generator::generate_favicon(&config, &fetcher) {
        Ok(report) => {
            if report.substituted_vector {
                info!("Vector candidate was replaced by a raster image");
            }
            info!(
                "Done. chosen={} source={} icon={} sizes={:?}",
                report.chosen_url,
                report.source_path.display(),
                report.icon_path.display(),
                report.icon_sizes
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
