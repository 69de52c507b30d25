// ABOUTME: Public library API for FANBOX post sync
// ABOUTME: Re-exports core modules for external use

pub mod api;
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod iframely;
pub mod inline;
pub mod model;
pub mod parse;
pub mod storage;
pub mod sync;
pub mod telemetry;
pub mod util;

pub use error::{Error, Result};
pub use model::{Block, Entry, Frontmatter, Post, PostBody, PostStatus, PostSummary, StyleSpan};
