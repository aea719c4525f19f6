//! Shelf/guillotine nesting of rectangular panel pieces onto stock sheets.
//!
//! Pipeline: [`expand`] → [`group`] → [`shelf`] (per material) → [`offcut`]
//! (per sheet) → [`report`]. [`optimizer::Optimizer`] runs all stages.

pub mod config;
pub mod error;
pub mod expand;
pub mod group;
pub mod input;
pub mod offcut;
pub mod optimizer;
pub mod render;
pub mod report;
pub mod shelf;
pub mod types;
