// ABOUTME: Shared test helpers for integration tests
// ABOUTME: Exports the axum request builder used by route tests

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod axum_test;
