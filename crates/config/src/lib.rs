//! Configuration for colcheck.

pub mod settings;

pub use settings::Settings;
