//! Tests for publisher CLI parsing and environment fallbacks.

use super::*;
use rstest::rstest;

const ENV_VARS: [&str; 7] = [
    "SHOPWARE_RELEASES_URL",
    "DOCKER_USERNAME",
    "DOCKER_REPOSITORY",
    "REGISTRY_TAG_URL",
    "GH_BRANCH",
    "GH_TOKEN",
    "GH_REPOSITORY",
];

fn parse_clean(args: &[&str]) -> Cli {
    temp_env::with_vars_unset(ENV_VARS, || {
        Cli::parse_from(std::iter::once("release-image-publisher").chain(args.iter().copied()))
    })
}

#[test]
fn cli_parses_defaults() {
    let cli = parse_clean(&[]);
    assert_eq!(cli.catalog_url, DEFAULT_CATALOG_URL);
    assert_eq!(cli.registry_namespace, "yfricke");
    assert_eq!(cli.registry_repository, "shopware");
    assert_eq!(cli.tag_url_template, DEFAULT_TAG_URL_TEMPLATE);
    assert_eq!(cli.download_dir, Utf8PathBuf::from("downloads"));
    assert_eq!(cli.build_dir, Utf8PathBuf::from("build"));
    assert_eq!(cli.assets_dir, Utf8PathBuf::from("assets"));
    assert_eq!(cli.extract_dir_name, "shopware");
    assert_eq!(cli.repo_dir, Utf8PathBuf::from("."));
    assert_eq!(cli.rebuild_file, Utf8PathBuf::from(".rebuild"));
    assert_eq!(cli.push_branch, "master");
    assert_eq!(cli.http_timeout_secs, 900);
    assert!(cli.github_token.is_none());
    assert!(cli.github_repository.is_none());
    assert!(!cli.dry_run);
    assert_eq!(cli.log_level(), LevelFilter::Info);
}

#[test]
fn environment_supplies_registry_and_credentials() {
    let cli = temp_env::with_vars(
        [
            ("DOCKER_USERNAME", Some("acme")),
            ("DOCKER_REPOSITORY", Some("shop")),
            ("GH_TOKEN", Some("ghp_secret")),
            ("GH_REPOSITORY", Some("acme/images")),
            ("GH_BRANCH", Some("main")),
            ("SHOPWARE_RELEASES_URL", None),
            ("REGISTRY_TAG_URL", None),
        ],
        || Cli::parse_from(["release-image-publisher"]),
    );
    assert_eq!(cli.registry_namespace, "acme");
    assert_eq!(cli.registry_repository, "shop");
    assert_eq!(cli.github_token.as_deref(), Some("ghp_secret"));
    assert_eq!(cli.github_repository.as_deref(), Some("acme/images"));
    assert_eq!(cli.push_branch, "main");
}

#[test]
fn environment_supplies_catalog_url() {
    let cli = temp_env::with_vars(
        [("SHOPWARE_RELEASES_URL", Some("https://mirror.example.test/releases"))],
        || Cli::parse_from(["release-image-publisher"]),
    );
    assert_eq!(cli.catalog_url, "https://mirror.example.test/releases");
}

#[test]
fn flags_override_environment() {
    let cli = temp_env::with_vars(
        [
            ("DOCKER_USERNAME", Some("from-env")),
            ("SHOPWARE_RELEASES_URL", Some("https://env.example.test/releases")),
        ],
        || {
            Cli::parse_from([
                "release-image-publisher",
                "--registry-namespace",
                "from-flag",
                "--catalog-url",
                "https://flag.example.test/releases",
            ])
        },
    );
    assert_eq!(cli.registry_namespace, "from-flag");
    assert_eq!(cli.catalog_url, "https://flag.example.test/releases");
}

#[rstest]
#[case::quiet(&["-q"], LevelFilter::Warn)]
#[case::verbose(&["-v"], LevelFilter::Debug)]
#[case::very_verbose(&["-vv"], LevelFilter::Trace)]
fn verbosity_flags_select_log_level(#[case] args: &[&str], #[case] expected: LevelFilter) {
    assert_eq!(parse_clean(args).log_level(), expected);
}

#[test]
fn quiet_conflicts_with_verbose() {
    let result = temp_env::with_vars_unset(ENV_VARS, || {
        Cli::try_parse_from(["release-image-publisher", "-q", "-v"])
    });
    assert!(result.is_err());
}

#[test]
fn parses_paths_and_dry_run() {
    let cli = parse_clean(&[
        "--download-dir",
        "/var/cache/releases",
        "--assets-dir",
        "images/assets",
        "--rebuild-file",
        "ci/.rebuild",
        "--http-timeout-secs",
        "30",
        "--dry-run",
    ]);
    assert_eq!(cli.download_dir, Utf8PathBuf::from("/var/cache/releases"));
    assert_eq!(cli.assets_dir, Utf8PathBuf::from("images/assets"));
    assert_eq!(cli.rebuild_file, Utf8PathBuf::from("ci/.rebuild"));
    assert_eq!(cli.http_timeout_secs, 30);
    assert!(cli.dry_run);
}
