mod batch;
mod catalog;
mod completion;
mod config;
mod draft;
mod error;
mod expand;
mod image_search;
mod parse;
mod pipeline;
mod prompt;
mod proxy;
mod record;
mod response;
mod season;
mod server;
mod store;
mod supabase;
#[cfg(test)]
mod testing;
mod util;
mod vocab;

use crate::batch::{BatchEnricher, BatchReport};
use crate::catalog::{Catalog, read_import_file};
use crate::completion::OpenAiClient;
use crate::config::Config;
use crate::error::{AppError, StatusMessage};
use crate::image_search::GoogleImageSearch;
use crate::parse::{AdminCommand, Args, Command};
use crate::record::FlyId;
use crate::server::{AppState, build_router, proxy_only_router, serve};
use crate::store::extension_from_url;
use crate::supabase::SupabaseStore;
use crate::util::print_hms;
use clap::Parser;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Instant;

pub fn print_summary(report: &BatchReport) {
    if report.total == 0 {
        println!("No flies to enrich");
        return;
    }

    println!("\nSummary:");
    println!("Total flies: {}", report.total);
    println!("Processed: {}", report.processed);
    println!("Succeeded: {}", report.succeeded);
    println!("Failed: {}", report.failed);

    let failures: Vec<_> = report.outcomes.iter().filter(|o| !o.succeeded).collect();
    if !failures.is_empty() {
        println!("Failures:");
        for outcome in failures {
            println!("  {}", outcome.message);
        }
    }
}

fn build_catalog(config: &Config) -> Result<Catalog, AppError> {
    let (url, key) = config.store()?;
    let store = SupabaseStore::new(url, key.to_string(), config.bucket.clone())?;
    let mut catalog = Catalog::new(Arc::new(store));

    match config.completion() {
        Ok(settings) => catalog = catalog.with_completion(Arc::new(OpenAiClient::new(settings)?)),
        Err(e) => debug!("Completion service not configured: {}", e),
    }
    match config.image_search() {
        Ok((key, engine)) => {
            let search = GoogleImageSearch::new(key.to_string(), engine.to_string())?;
            catalog = catalog.with_image_search(Arc::new(search));
        }
        Err(e) => debug!("Image search not configured: {}", e),
    }
    Ok(catalog)
}

async fn run_server(config: &Config, addr: &str) -> Result<(), AppError> {
    let http = reqwest::Client::new();
    let router = match build_catalog(config) {
        Ok(catalog) => {
            if config.admin_token.is_none() {
                warn!("ADMIN_TOKEN is not set; admin routes will reject every request");
            }
            build_router(AppState::new(catalog, config.admin_token.clone()), http)
        }
        Err(e) => {
            warn!("Serving the image proxy only: {}", e);
            proxy_only_router(http)
        }
    };
    serve(router, addr).await
}

async fn run_admin(command: AdminCommand, catalog: Catalog) -> Result<(), AppError> {
    match command {
        AdminCommand::Enrich {
            ids,
            incomplete,
            group_size,
            delay,
            output,
        } => {
            let enricher = BatchEnricher::new(catalog.store(), catalog.completion()?)
                .with_group_size(group_size)
                .with_delay(delay);

            let start = Instant::now();
            let report = if incomplete || ids.is_empty() {
                enricher.enrich_incomplete().await?
            } else {
                let ids: Vec<FlyId> = ids.into_iter().map(FlyId).collect();
                enricher.enrich_ids(&ids).await?
            };
            print_hms(&start);

            if let Some(path) = output {
                report.save_to_csv(&path)?;
            }
            print_summary(&report);
            Ok(())
        }
        AdminCommand::Import { file } => {
            let text = read_import_file(&file)?;
            println!("{}", catalog.bulk_import(&text).await?);
            Ok(())
        }
        AdminCommand::SearchImages { term, pick } => {
            let outcome = catalog.search_images(&term).await?;
            if let Some(message) = &outcome.message {
                println!("{}", message);
            }
            let Some(fly) = outcome.fly else {
                return Ok(());
            };

            println!("Images for {} ({}):", fly.name, fly.id);
            for (i, hit) in outcome.hits.iter().enumerate() {
                println!("  {}. {} {}", i + 1, hit.title, hit.link);
            }

            if let Some(n) = pick {
                let hit = n
                    .checked_sub(1)
                    .and_then(|i| outcome.hits.get(i))
                    .ok_or_else(|| AppError::NotFound(format!("image result {}", n)))?;
                println!("{}", catalog.select_image(&fly.id, &hit.link).await?);
            }
            Ok(())
        }
        AdminCommand::UploadImage { name, path } => {
            let bytes = std::fs::read(&path)?;
            let extension = extension_from_url(&path.to_string_lossy());
            println!("{}", catalog.upload_image(&name, bytes, &extension).await?);
            Ok(())
        }
        AdminCommand::Waitlist { email, name } => {
            println!("{}", catalog.join_waitlist(name, &email).await?);
            Ok(())
        }
        AdminCommand::DeleteRequest { email } => {
            println!("{}", catalog.request_data_deletion(&email).await?);
            Ok(())
        }
    }
}

async fn run(command: Command, config: Config) -> Result<(), AppError> {
    match command {
        Command::Serve { addr } => run_server(&config, &addr).await,
        Command::Admin(command) => run_admin(command, build_catalog(&config)?).await,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = Config::from_env()?;
    if let Err(e) = run(args.command, config).await {
        eprintln!("{}", StatusMessage::error(&e));
        std::process::exit(1);
    }

    Ok(())
}
