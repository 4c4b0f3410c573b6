//! End-to-end tests - Full stack against a live ClickHouse
//!
//! These need a ClickHouse server with the SH sample schema loaded and
//! `CLICKHOUSE_URL` set (plus `CLICKHOUSE_USER` / `CLICKHOUSE_PASSWORD` when
//! required). Run with `cargo test --test e2e -- --ignored`.

mod clickhouse_tests;
