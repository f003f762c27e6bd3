//! Messages exchanged between game systems.
//!
//! Submodules:
//! - [`lineclear`] – written when a row of blocks is removed
pub mod lineclear;
