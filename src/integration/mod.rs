//! Tests against a local stand-in for the video site

pub mod fixtures;

mod e2e;
