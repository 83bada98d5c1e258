//! Unit tests for the Species ID SDK
//!
//! This module contains tests for various components of the SDK.

pub mod config_tests;
pub mod resilience_tests;
