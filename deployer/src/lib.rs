//! streameee release automation library.
//!
//! This crate provides the stages of an APK release for the streameee Android
//! app: reading the version, building, composing the update manifest,
//! publishing over FTP and purging the CDN cache. It is used by the
//! `streameee-deploy` CLI binary and can be driven programmatically with stub
//! collaborators for testing.
//!
//! # Modules
//!
//! - [`builder`] - Flutter release build invocation
//! - [`cdn`] - Cloudflare cache invalidation
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Credentials loading from `.env.ftp` and the environment
//! - [`error`] - Semantic error types
//! - [`ftp`] - FTP and FTPS file-host connector
//! - [`layout`] - Fixed local and remote naming scheme
//! - [`logging`] - Terminal logger set-up
//! - [`manifest`] - Update manifest composition and local file
//! - [`output`] - Progress and summary formatting
//! - [`pipeline`] - Release pipeline orchestration
//! - [`publisher`] - Ordered upload sequence over one session
//! - [`transfer`] - File-host session abstraction
//! - [`version`] - Version and build code extraction from `pubspec.yaml`

pub mod builder;
pub mod cdn;
pub mod cli;
pub mod config;
pub mod error;
pub mod ftp;
pub mod layout;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod publisher;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod transfer;
pub mod version;
