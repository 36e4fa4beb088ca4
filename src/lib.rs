//! Build, validate and patch a static JSON dataset of vocabulary flashcards.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod mutate;
pub mod report;
pub mod validate;

pub use error::DeckError;
