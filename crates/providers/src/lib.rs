//! LLM provider implementations for Citewright.
//!
//! All providers implement the `citewright_core::Provider` trait.
//! `build_from_config` builds the configured provider from `AppConfig`.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;
