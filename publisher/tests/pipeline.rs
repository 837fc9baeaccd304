//! End-to-end pipeline tests.
//!
//! These tests drive the real downloader, extractor, build context preparer,
//! docker builder and rebuild tracker. Only the network and external
//! commands are faked: HTTP through an in-memory registry, commands through
//! the scripted `StubExecutor`.

use camino::{Utf8Path, Utf8PathBuf};
use release_image_publisher::catalog::ReleaseCatalogFetcher;
use release_image_publisher::context::{AssetCatalog, BuildContextPreparer};
use release_image_publisher::downloader::{MAX_ATTEMPTS, VerifiedDownloader};
use release_image_publisher::extraction::ZipExtractor;
use release_image_publisher::gate::PublishGate;
use release_image_publisher::http::{HttpError, HttpTransport};
use release_image_publisher::image::{DockerImageBuilder, ImageName};
use release_image_publisher::orchestrator::{Collaborators, Orchestrator};
use release_image_publisher::rebuild::{
    FinalizeOutcome, FinalizeSettings, GitIdentity, PushCredentials, RESET_COMMIT_MESSAGE,
    RebuildTracker,
};
use release_image_publisher::summary::{RunSummary, VersionOutcome};
use release_image_publisher::test_utils::{
    ExpectedCall, StubExecutor, catalog_json, sha1_hex, success_output,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::Path;

const CATALOG_URL: &str = "https://releases.example.test/install";
const TAG_TEMPLATE: &str = "https://registry.example.test/{namespace}/{repository}/tags/{version}";

/// In-memory stand-in for the catalog endpoint, archive host and registry.
#[derive(Default)]
struct FakeNetwork {
    catalog: String,
    archives: HashMap<String, Vec<u8>>,
    published: HashSet<String>,
    downloads: RefCell<Vec<String>>,
}

impl FakeNetwork {
    fn download_count(&self, url: &str) -> usize {
        self.downloads.borrow().iter().filter(|u| *u == url).count()
    }
}

impl HttpTransport for FakeNetwork {
    fn get_text(&self, url: &str) -> Result<String, HttpError> {
        if url == CATALOG_URL {
            return Ok(self.catalog.clone());
        }
        Err(HttpError::Status {
            url: url.to_owned(),
            status: 404,
        })
    }

    fn get_status(&self, url: &str) -> Result<u16, HttpError> {
        let published = self
            .published
            .iter()
            .any(|version| url.ends_with(&format!("/tags/{version}")));
        Ok(if published { 200 } else { 404 })
    }

    fn download_to_file(&self, url: &str, dest: &Path) -> Result<u64, HttpError> {
        self.downloads.borrow_mut().push(url.to_owned());
        let Some(body) = self.archives.get(url) else {
            return Err(HttpError::Status {
                url: url.to_owned(),
                status: 404,
            });
        };
        fs::write(dest, body)?;
        Ok(body.len() as u64)
    }
}

fn release_archive(marker: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    writer
        .start_file("public/index.php", options)
        .expect("start file");
    writer
        .write_all(format!("<?php // {marker}").as_bytes())
        .expect("write entry");
    writer.finish().expect("finish archive").into_inner()
}

fn archive_url(version: &str) -> String {
    format!("https://releases.example.test/{version}.zip")
}

struct Workspace {
    _temp: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 path");
        for (relative, contents) in [
            ("assets/docker/all.Dockerfile", "FROM php:7.4-apache"),
            ("assets/php/all.ini", "memory_limit=512M"),
        ] {
            let path = root.join(relative);
            fs::create_dir_all(path.parent().expect("parent")).expect("create assets");
            fs::write(path, contents).expect("write asset");
        }
        Self { _temp: temp, root }
    }

    fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    fn finalize_settings(&self, credentials: PushCredentials) -> FinalizeSettings {
        FinalizeSettings {
            repo_dir: self.root.clone(),
            rebuild_file: Utf8PathBuf::from(".rebuild"),
            credentials,
            identity: GitIdentity::default(),
            branch: "master".to_owned(),
        }
    }
}

fn docker_calls(build_dir: &Utf8Path, tags: &[&str]) -> Vec<ExpectedCall> {
    let dockerfile = build_dir.join("Dockerfile");
    tags.iter()
        .flat_map(|tag| {
            let reference = format!("yfricke/shopware:{tag}");
            [
                ExpectedCall::new(
                    "docker",
                    &[
                        "build",
                        "-t",
                        &reference,
                        "--file",
                        dockerfile.as_str(),
                        build_dir.as_str(),
                    ],
                    Ok(success_output()),
                ),
                ExpectedCall::new("docker", &["push", &reference], Ok(success_output())),
            ]
        })
        .collect()
}

fn run_pipeline(
    network: &FakeNetwork,
    workspace: &Workspace,
    docker: &StubExecutor,
    git: &StubExecutor,
    credentials: PushCredentials,
) -> RunSummary {
    let image = ImageName::default();
    let catalog = ReleaseCatalogFetcher::new(network, CATALOG_URL);
    let gate = PublishGate::new(network, TAG_TEMPLATE, &image);
    let downloader = VerifiedDownloader::new(network);
    let extractor = ZipExtractor;
    let build_context = BuildContextPreparer::new(
        &extractor,
        AssetCatalog::new(workspace.path("assets")),
        workspace.path("build"),
        "shopware",
    );
    let images = DockerImageBuilder::new(docker, image);
    let mut tracker = RebuildTracker::new(git, workspace.finalize_settings(credentials));

    let collaborators = Collaborators {
        catalog: &catalog,
        gate: &gate,
        downloader: &downloader,
        build_context: &build_context,
        images: &images,
    };
    Orchestrator::new(collaborators, workspace.path("downloads"), &mut tracker)
        .run()
        .expect("catalog is valid")
}

#[test]
fn publishes_missing_versions_and_isolates_failures() {
    let workspace = Workspace::new();
    let good = release_archive("6.3.2");
    let other = release_archive("6.3.0");
    let network = FakeNetwork {
        catalog: catalog_json(&[
            ("6.3.2", &archive_url("6.3.2"), &sha1_hex(&good)),
            ("6.3.1", &archive_url("6.3.1"), &sha1_hex(b"what the catalog promised")),
            ("6.3.0", &archive_url("6.3.0"), &sha1_hex(&other)),
            ("6.2.0", &archive_url("6.2.0"), &sha1_hex(b"old")),
        ]),
        archives: HashMap::from([
            (archive_url("6.3.2"), good),
            (archive_url("6.3.1"), b"tampered bytes".to_vec()),
            (archive_url("6.3.0"), other),
        ]),
        published: HashSet::from(["6.2.0".to_owned()]),
        ..FakeNetwork::default()
    };
    let build_dir = workspace.path("build");
    let docker = StubExecutor::new(docker_calls(&build_dir, &["6.3.2", "latest", "6.3.0"]));
    let git = StubExecutor::new(vec![]);

    let summary = run_pipeline(&network, &workspace, &docker, &git, PushCredentials::default());

    assert_eq!(
        summary.outcomes(),
        [
            ("6.3.2".to_owned(), VersionOutcome::PublishedAsLatest),
            ("6.3.1".to_owned(), VersionOutcome::DownloadFailed),
            ("6.3.0".to_owned(), VersionOutcome::Published),
            ("6.2.0".to_owned(), VersionOutcome::Skipped),
        ]
    );
    assert_eq!(summary.finalize(), Some(FinalizeOutcome::NothingToReset));
    docker.assert_finished();

    let attempts = usize::try_from(MAX_ATTEMPTS).expect("small");
    assert_eq!(network.download_count(&archive_url("6.3.1")), attempts);
    assert_eq!(network.download_count(&archive_url("6.2.0")), 0);

    // The context left behind belongs to the last built version.
    let index = fs::read_to_string(build_dir.join("shopware/public/index.php")).expect("index");
    assert!(index.contains("6.3.0"));
    assert!(build_dir.join("Dockerfile").exists());
    assert!(build_dir.join("php.ini").exists());
}

#[test]
fn malformed_catalog_entry_does_not_block_its_neighbours() {
    let workspace = Workspace::new();
    let newest = release_archive("6.3.2");
    let oldest = release_archive("6.3.0");
    let network = FakeNetwork {
        catalog: catalog_json(&[
            ("6.3.2", &archive_url("6.3.2"), &sha1_hex(&newest)),
            ("6.3.1", &archive_url("6.3.1"), ""),
            ("6.3.0", &archive_url("6.3.0"), &sha1_hex(&oldest)),
        ]),
        archives: HashMap::from([
            (archive_url("6.3.2"), newest),
            (archive_url("6.3.1"), b"unverifiable".to_vec()),
            (archive_url("6.3.0"), oldest),
        ]),
        ..FakeNetwork::default()
    };
    let docker = StubExecutor::new(docker_calls(
        &workspace.path("build"),
        &["6.3.2", "latest", "6.3.0"],
    ));
    let git = StubExecutor::new(vec![]);

    let summary = run_pipeline(&network, &workspace, &docker, &git, PushCredentials::default());

    assert_eq!(
        summary.outcomes(),
        [
            ("6.3.2".to_owned(), VersionOutcome::PublishedAsLatest),
            ("6.3.1".to_owned(), VersionOutcome::DownloadFailed),
            ("6.3.0".to_owned(), VersionOutcome::Published),
        ]
    );
    docker.assert_finished();
    assert_eq!(network.download_count(&archive_url("6.3.1")), 0);
}

#[test]
fn second_run_reuses_cached_archives() {
    let workspace = Workspace::new();
    let archive = release_archive("6.3.2");
    let network = FakeNetwork {
        catalog: catalog_json(&[("6.3.2", &archive_url("6.3.2"), &sha1_hex(&archive))]),
        archives: HashMap::from([(archive_url("6.3.2"), archive)]),
        ..FakeNetwork::default()
    };
    let build_dir = workspace.path("build");

    for _ in 0..2 {
        let docker = StubExecutor::new(docker_calls(&build_dir, &["6.3.2", "latest"]));
        let git = StubExecutor::new(vec![]);
        run_pipeline(&network, &workspace, &docker, &git, PushCredentials::default());
        docker.assert_finished();
    }

    assert_eq!(network.download_count(&archive_url("6.3.2")), 1);
}

#[test]
fn forced_rebuild_republishes_and_resets_override() {
    let workspace = Workspace::new();
    fs::write(workspace.path(".rebuild"), "6.3.1\n").expect("write rebuild file");
    let archive = release_archive("6.3.1");
    let network = FakeNetwork {
        catalog: catalog_json(&[
            ("6.3.2", &archive_url("6.3.2"), &sha1_hex(b"newest")),
            ("6.3.1", &archive_url("6.3.1"), &sha1_hex(&archive)),
        ]),
        archives: HashMap::from([(archive_url("6.3.1"), archive)]),
        published: HashSet::from(["6.3.2".to_owned(), "6.3.1".to_owned()]),
        ..FakeNetwork::default()
    };
    let build_dir = workspace.path("build");
    let docker = StubExecutor::new(docker_calls(&build_dir, &["6.3.1"]));
    let repo = workspace.root.as_str();
    let git = StubExecutor::new(vec![
        ExpectedCall::new(
            "git",
            &["-C", repo, "rm", "--cached", "--ignore-unmatch", ".rebuild"],
            Ok(success_output()),
        ),
        ExpectedCall::new(
            "git",
            &[
                "-C",
                repo,
                "-c",
                "user.name=CI",
                "-c",
                "user.email=ci@localhost",
                "commit",
                "-m",
                RESET_COMMIT_MESSAGE,
            ],
            Ok(success_output()),
        ),
        ExpectedCall::new(
            "git",
            &[
                "-C",
                repo,
                "push",
                "--quiet",
                "https://token@github.com/acme/images.git",
                "HEAD:master",
            ],
            Ok(success_output()),
        ),
    ]);

    let summary = run_pipeline(
        &network,
        &workspace,
        &docker,
        &git,
        PushCredentials::new(Some("token".to_owned()), Some("acme/images".to_owned())),
    );

    assert_eq!(summary.outcome_of("6.3.2"), Some(VersionOutcome::Skipped));
    assert_eq!(summary.outcome_of("6.3.1"), Some(VersionOutcome::Published));
    assert_eq!(summary.finalize(), Some(FinalizeOutcome::Reset));
    docker.assert_finished();
    git.assert_finished();
    assert!(!workspace.path(".rebuild").exists());
}
