//! Integration tests for ReadEngine
//!
//! These tests use wiremock to serve pages and tempfile for on-disk stores,
//! and drive the public API end-to-end.

mod fetch_tests;
mod pipeline_tests;
