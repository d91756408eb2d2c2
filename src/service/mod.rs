//! Service layer for the rating simulation
//!
//! This module contains the simulation state that owns the rating store and
//! coordinates registration, concurrent runs, reporting and shutdown.

pub mod app;

pub use app::{EloSim, EloSimBuilder};
