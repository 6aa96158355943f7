//! FarmGuide: a multilingual assistant for farmers.
//!
//! OCR text and speech come in, a tool-using language-model agent answers
//! in English, and the answer goes back out translated and spoken.
//!
//! # Quick Start
//!
//! ```no_run
//! use farmguide::prelude::*;
//!
//! # async fn example() -> farmguide::error::Result<()> {
//! let config = FarmGuideConfig::from_env();
//! let pipeline = PipelineCoordinator::from_config(&config);
//! let result = pipeline
//!     .process_text_query("Urea 46% N", "How much should I apply per acre?", Language::Ur)
//!     .await?;
//! println!("{}", result.translated_response);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod audio;
pub mod config;
pub mod error;
pub mod generation;
pub mod language;
pub mod models;
pub mod pipeline;
pub mod prelude;
pub mod provider;
pub mod tools;
pub mod translate;
pub mod types;
pub mod util;

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;
