//! Pick the most popular comments in a source language, translate them
//! through DeepL and attach the translations next to the originals.

pub mod comment;
pub mod config;
pub mod language;
pub mod metrics;
pub mod page;
pub mod pipeline;
pub mod popularity;
pub mod retry;
pub mod security;
pub mod selector;
pub mod server;
pub mod translator;
