//! Tickworks Core -- the simulation engine for incremental factory games.
//!
//! This crate provides an arbitrary-magnitude decimal type, an immutable item
//! catalog, and a tick-driven production scheduler that turns inventory into
//! more inventory through assigned buildings, subject to storage caps, power
//! and randomized byproducts.
//!
//! # Tick Pass
//!
//! Each call to [`engine::Engine::tick`] advances the session by `dt` seconds:
//!
//! 1. **Clock** -- Clamp `dt`, advance play time and the frames-per-second
//!    estimate.
//! 2. **Production** -- Visit every (item, building) pair with a positive
//!    count in canonical order. Disabled recipes are skipped.
//! 3. **Power** -- A pair must hold power before it consumes or produces;
//!    fuel is drawn once per power cycle.
//! 4. **Credit** -- Whole units are credited to the ledger, through byproduct
//!    tables and capped by storage capacity.
//!
//! # Numbers
//!
//! Every quantity is a [`big::Big`]: an exact decimal `mantissa * 10^exponent`
//! with arbitrary-precision mantissa, plus signed infinities. Catalog values
//! are frozen at build time and reject in-place mutation.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Session state plus the tick pass and player
//!   operations.
//! - [`catalog::Catalog`] -- Immutable item definitions built with
//!   [`catalog::CatalogBuilder`].
//! - [`ledger::Ledger`] -- Per-item on-hand and ever-created quantities.
//! - [`storage::StorageCalculator`] -- Storage capacity derived from
//!   assigned containers and buildings.
//! - [`command::CommandQueue`] -- Buffered player commands applied at tick
//!   boundaries.
//! - [`serialize`] -- Versioned session snapshots via bitcode.
//! - [`autosave::Autosaver`] -- Periodic background saves.

pub mod autosave;
pub mod big;
pub mod byproduct;
pub mod catalog;
pub mod command;
pub mod config;
pub mod engine;
pub mod id;
pub mod ledger;
pub mod power;
pub mod production;
pub mod query;
pub mod rng;
pub mod serialize;
pub mod sim;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
