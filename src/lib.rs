//! A crate for biconditional Kronecker functional decision diagrams.
//!
//! A BKFDD is a shared, reduced, complement-edged decision diagram in
//! which every level independently picks one of six decomposition rules:
//! Shannon, positive or negative Davio, each in a classical or
//! biconditional flavor. One [`manager::Manager`] owns a forest of
//! them and provides the Boolean operations, reference-counted sharing
//! with garbage collection, adjacent-level swaps, expansion-type
//! rewrites and a sifting driver that optimizes order and decomposition
//! together.

#![allow(clippy::many_single_char_names)]

#[macro_use] extern crate log;
extern crate fxhash;
extern crate simplelog;

/// Tagged single-word edges with complement bits.
pub mod edge;

/// The six decomposition tags and their axes.
pub mod expansion;

/// Node records and per-level unique subtables.
pub mod node;

/// Memo cache for the recursive operations.
pub mod cache;

/// The manager: node store, references, GC, evaluation, validation.
pub mod manager;

/// AND, XOR, ITE and their wrappers.
pub mod ops;

/// In-place adjacent-level swaps.
pub mod swap;

/// Expansion-type rewrites (with polarity repair).
pub mod change;

/// The sifting driver and the interaction matrix.
pub mod sift;

pub use edge::{Edge, ONE, ZERO};
pub use expansion::{Expansion, Kind};
pub use manager::{Error, Manager, Params, Pin, Result};
