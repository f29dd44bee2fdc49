//! End-to-end tests for the crawler
//!
//! Marketplace pages are served by wiremock over loopback; stores are SQLite,
//! in memory or in a temporary directory.

mod codec_tests;
mod common;
mod ingest_tests;
mod scheduler_tests;
mod source_tests;
