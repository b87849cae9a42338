mod cli;
mod discord;
mod logging;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use reelcast_api::{MetadataSearch, TmdbClient};
use reelcast_core::config::AppConfig;
use reelcast_core::error::{ConfigError, ReelcastError};
use reelcast_core::publisher::{Publisher, PublisherSettings};
use reelcast_core::reconciler::{Reconciler, ReconcilerSettings, TitleSampler};
use reelcast_core::resolver::{MetadataResolver, ResolverSettings};
use reelcast_detect::{SourceDatabase, SystemTitles};
use reelcast_parse::{sanitize_for_log, Classifier};

use crate::cli::{Cli, Command};
use crate::discord::DiscordPresence;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.verbose, &AppConfig::log_dir());

    let result = match cli.action() {
        Command::Init { force } => init(cli.config.as_deref(), force),
        action => match AppConfig::load(cli.config.as_deref()) {
            Ok(config) => match action {
                Command::Detect => detect(config).await,
                Command::Lookup { title, season } => lookup(config, &title, season).await,
                Command::Run => run(config).await,
                // Handled before any config is loaded.
                Command::Init { .. } => Ok(()),
            },
            Err(e) => Err(e.into()),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "reelcast exited with an error");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), ReelcastError> {
    config.validate()?;
    let api_key = config
        .metadata
        .api_key
        .clone()
        .ok_or(ConfigError::Missing("metadata.api_key"))?;

    let search = TmdbClient::new(api_key).with_image_size(config.metadata.image_size.as_str());
    let resolver = MetadataResolver::new(search, ResolverSettings::from(&config.metadata));
    let publisher = Publisher::new(
        DiscordPresence::start()?,
        PublisherSettings::from(&config.presence),
    );
    let classifier = Classifier::new(&config.detection.ignore_keywords);
    let mut reconciler = Reconciler::new(
        classifier,
        resolver,
        publisher,
        ReconcilerSettings::from(&config),
    );

    let source = Arc::new(SystemTitles::new(load_sources()));
    reconciler.run(source, shutdown_signal()).await;

    let stats = reconciler.resolver().stats();
    tracing::info!(
        lookups = stats.lookups,
        hits = stats.hits,
        negative_hits = stats.negative_hits,
        entries = stats.entries,
        "Metadata cache at exit"
    );
    Ok(())
}

fn init(path: Option<&Path>, force: bool) -> Result<(), ReelcastError> {
    let target = path.map_or_else(AppConfig::config_path, Path::to_path_buf);
    AppConfig::write_default(&target, force)?;
    println!("Wrote {}", target.display());
    Ok(())
}

async fn detect(config: AppConfig) -> Result<(), ReelcastError> {
    let source = Arc::new(SystemTitles::new(load_sources()));
    let titles = TitleSampler::new(source, config.detection.timeout())
        .sample()
        .await;
    let classifier = Classifier::new(&config.detection.ignore_keywords);

    if titles.is_empty() {
        println!("No titles detected.");
        return Ok(());
    }

    for title in &titles {
        println!("{:?}: {}", title.source, sanitize_for_log(&title.text));
        if let Some(url) = &title.url {
            println!("  URL: {url}");
        }
        match classifier.classify(title) {
            Some(fact) => {
                let number = fact.number.map(|n| n.to_string()).unwrap_or_default();
                println!(
                    "  -> {} | {} {} {}",
                    fact.service.display_name(),
                    fact.display_title,
                    number,
                    fact.episode_title.as_deref().unwrap_or("")
                );
            }
            None => println!("  -> (not watching)"),
        }
    }
    Ok(())
}

async fn lookup(config: AppConfig, title: &str, season: Option<u32>) -> Result<(), ReelcastError> {
    let api_key = config
        .metadata
        .api_key
        .clone()
        .ok_or(ConfigError::Missing("metadata.api_key"))?;
    let client = TmdbClient::new(api_key).with_image_size(config.metadata.image_size.as_str());

    let candidates = client
        .search(title, season)
        .await
        .map_err(|e| ReelcastError::Metadata(e.to_string()))?;

    if candidates.is_empty() {
        println!("No results for {title:?}.");
    }
    for c in &candidates {
        println!(
            "{:>6.1}  {:?}  {} ({})  id={}",
            c.score,
            c.kind,
            c.title,
            c.year.map(|y| y.to_string()).unwrap_or_else(|| "?".into()),
            c.id
        );
        if let Some(image) = &c.image_ref {
            println!("        {image}");
        }
    }
    Ok(())
}

/// Built-in source database, with the user's `sources.toml` merged on top.
fn load_sources() -> SourceDatabase {
    let mut db = SourceDatabase::embedded();
    let path = AppConfig::sources_path();
    if !path.exists() {
        return db;
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match SourceDatabase::from_toml(&content) {
            Ok(user) => {
                db.merge_user(&user);
                tracing::info!(path = %path.display(), "Merged user source database");
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid sources.toml"),
        },
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Could not read sources.toml"),
    }
    db
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
