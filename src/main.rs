use clap::Parser;
use page_haul::{Batch, FetchConfig};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match FetchConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("Failed to load config from {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => FetchConfig::default(),
    };

    // Command-line flags override the file configuration
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout {
        config.navigation_timeout_secs = timeout;
    }
    if let Some(dir) = &args.download_dir {
        config.download_dir = Some(dir.clone());
    }
    if args.browser_only {
        config.light_first = false;
    }

    ::log::info!("Fetching {} URLs", args.urls.len());
    let start_time = std::time::Instant::now();

    let outcomes = match Batch::new(args.urls).with_config(config).run().await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            ::log::error!("Batch failed: {}", e);
            std::process::exit(1);
        }
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&outcomes)
    } else {
        serde_json::to_string(&outcomes)
    };

    match json {
        Ok(json) => println!("{json}"),
        Err(e) => {
            ::log::error!("Failed to serialize outcomes: {}", e);
            std::process::exit(1);
        }
    }

    let with_content = outcomes.iter().filter(|o| o.has_content()).count();
    ::log::info!(
        "Done - {} of {} URLs produced content in {:.2} seconds",
        with_content,
        outcomes.len(),
        start_time.elapsed().as_secs_f64()
    );
}
