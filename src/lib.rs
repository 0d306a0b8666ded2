//! Dimcal - Dimmer sensitivity calibration
//!
//! This library drives a calibration experiment against a system protected by
//! a brownout dimmer: it samples per-component dimming probabilities, applies
//! them through the dimmer's admin API, ramps a load generator through each
//! trial and fits a linear model of P95 response time against the sampled
//! configuration. The normalised coefficients rank components by how strongly
//! they drive tail latency.

pub mod cli;
pub mod clock;
pub mod config;
pub mod dimmer;
pub mod http;
pub mod loadgen;
pub mod orchestrator;
pub mod ramp;
pub mod regression;
pub mod report;
pub mod reseed;
pub mod sampler;
