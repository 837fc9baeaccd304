//! Release image publisher CLI entrypoint.
//!
//! This binary resolves configuration, wires the production collaborators
//! and runs the publishing pipeline once. It exits non-zero only when the run
//! cannot start: invalid configuration or an unusable release catalog.

use clap::Parser;
use log::{LevelFilter, info};
use release_image_publisher::catalog::ReleaseCatalogFetcher;
use release_image_publisher::cli::Cli;
use release_image_publisher::config::PublisherConfig;
use release_image_publisher::context::{AssetCatalog, BuildContextPreparer};
use release_image_publisher::downloader::VerifiedDownloader;
use release_image_publisher::error::Result;
use release_image_publisher::extraction::ZipExtractor;
use release_image_publisher::gate::PublishGate;
use release_image_publisher::http::UreqTransport;
use release_image_publisher::image::DockerImageBuilder;
use release_image_publisher::orchestrator::{Collaborators, Orchestrator, PlannedRelease};
use release_image_publisher::process::{SystemCommandExecutor, TimedCommandExecutor};
use release_image_publisher::rebuild::RebuildTracker;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level());
    let mut stderr = std::io::stderr();
    let exit_code = exit_code_for_run_result(run(&cli), &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Install `env_logger` at `level`; `RUST_LOG` refines it when set.
fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_secs()
        .parse_default_env()
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = PublisherConfig::from_cli(cli)?;

    let transport = UreqTransport::new(config.http_timeout);
    let catalog = ReleaseCatalogFetcher::new(&transport, config.catalog_url.clone());
    let gate = PublishGate::new(&transport, &config.tag_url_template, &config.image);
    let downloader = VerifiedDownloader::new(&transport);

    let extractor = ZipExtractor;
    let build_context = BuildContextPreparer::new(
        &extractor,
        AssetCatalog::new(config.assets_dir.clone()),
        config.build_dir.clone(),
        config.extract_dir_name.clone(),
    );

    let docker = SystemCommandExecutor;
    let images = DockerImageBuilder::new(&docker, config.image.clone());

    let git = TimedCommandExecutor::default();
    let mut tracker = RebuildTracker::new(&git, config.finalize.clone());

    let collaborators = Collaborators {
        catalog: &catalog,
        gate: &gate,
        downloader: &downloader,
        build_context: &build_context,
        images: &images,
    };
    let mut orchestrator =
        Orchestrator::new(collaborators, config.download_dir.clone(), &mut tracker);

    if config.dry_run {
        let plan = orchestrator.plan()?;
        for line in plan_lines(&plan) {
            info!("{line}");
        }
        return Ok(());
    }

    orchestrator.run()?;
    Ok(())
}

fn plan_lines(plan: &[PlannedRelease]) -> Vec<String> {
    plan.iter()
        .map(|release| {
            let latest = if release.latest { " [latest]" } else { "" };
            format!("{}{latest}: {}", release.version, release.decision)
        })
        .collect()
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; nothing else to do.
    }
}
