//! Unit tests for the player state machine and its pure helpers

pub mod config_tests;
