//! SGP4/SDP4 orbit propagation, coordinate frames and satellite pass prediction for a fixed
//! ground station.
//!
//! The numerical core ([`elements`], [`propagate`], [`frames`], [`tracker`], [`predict`]) is
//! pure and synchronous; [`predict::PassAggregator`] fans a batch search out over the tokio
//! blocking pool. [`config`], [`catalog`] and [`web`] wire it into the CLI and HTTP API.

pub mod catalog;
pub mod config;
pub mod elements;
pub mod frames;
pub mod predict;
pub mod propagate;
pub mod tracker;
pub mod web;
