//! songlink-resolve library - shared modules for the `songlink` binary.

pub mod config;
pub mod lookup;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod resolve;
pub mod safety;
pub mod scoring;
