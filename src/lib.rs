//! Ghost Dodge game engine library
//!
//! A single-player side-scrolling avoidance game: a character runs and jumps
//! on a fixed 50 Hz update loop while one obstacle sweeps or hops across the
//! arena. The score is the number of whole seconds survived.
//!
//! # Features
//!
//! - `metrics_server` - Plain HTTP endpoint exposing Prometheus/JSON metrics (enabled by default)

pub mod config;
pub mod util;
pub mod game;
pub mod session;
pub mod sink;
pub mod metrics;
