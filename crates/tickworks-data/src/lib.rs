//! Data-file loading for tickworks catalogs.
//!
//! Reads item definitions from RON, JSON or TOML, resolves name references
//! and builds an immutable [`tickworks_core::catalog::Catalog`] alongside the
//! engine's [`tickworks_core::config::SimConfig`].

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, Format, GameData, load_catalog_str, load_game_data};
