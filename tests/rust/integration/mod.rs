//! Integration tests - Client and server talking over real HTTP
//!
//! Each test binds the router to an ephemeral local port and serves rows
//! from an in-memory store, so no database is needed.

mod server_round_trip_tests;
