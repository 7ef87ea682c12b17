//! Integration tests against mocked nodes and HTTP servers

pub mod node_tests;
pub mod search_tests;
pub mod spotify_tests;
