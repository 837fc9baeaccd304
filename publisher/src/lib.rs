//! Release image publisher library.
//!
//! This crate builds and publishes a container image for every upstream
//! release that the registry does not have yet. It is used by the
//! `release-image-publisher` binary and can be driven programmatically with
//! fake collaborators for testing.
//!
//! # Modules
//!
//! - [`catalog`] - Release catalog model, parsing and retrieval
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Resolved and validated run configuration
//! - [`context`] - Build context preparation and asset lookup
//! - [`downloader`] - Digest-verified archive downloads with bounded retry
//! - [`error`] - Semantic error types
//! - [`extraction`] - Zip extraction with path traversal protection
//! - [`gate`] - Registry check for already published versions
//! - [`http`] - HTTP transport abstraction
//! - [`image`] - Image build and push
//! - [`orchestrator`] - The publishing pipeline
//! - [`process`] - External command execution
//! - [`rebuild`] - Forced-rebuild override and its reset
//! - [`summary`] - Per-version outcomes and run summary

pub mod catalog;
pub mod cli;
pub mod config;
pub mod context;
pub mod downloader;
pub mod error;
pub mod extraction;
pub mod gate;
pub mod http;
pub mod image;
pub mod orchestrator;
pub mod process;
pub mod rebuild;
pub mod summary;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
