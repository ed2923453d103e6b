//! Shared fixtures for integration tests with a mock HTTP server

#![allow(dead_code)]

pub mod mock_server;
