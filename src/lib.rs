//! Reelsmith - stock-footage montage automation
//!
//! This library crate exposes the pipeline stages for the binary and for
//! integration testing.

pub mod assemble;
pub mod config;
pub mod fetch;
pub mod library;
pub mod metadata;
pub mod music;
pub mod output;
pub mod pipeline;
pub mod thumbnail;
pub mod tools;
