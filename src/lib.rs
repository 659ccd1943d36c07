//! # magshell
//!
//! Marshaling and dispatch layer for an external magnetospheric field-model engine.
//!
//! The engine itself is an opaque numerical routine set with a fixed-capacity call
//! protocol; this crate builds its padded argument buffers from heterogeneous
//! time/position/pitch-angle observation data, batches large requests across a worker
//! pool, and reassembles the raw outputs into physically meaningful quantities: local
//! and mirror field, minimum-B equator, magnetic local time, the adiabatic invariants
//! Lm/L*/K, field-line footpoints and trapped-flux climatology.
//!
//! Entry point: [`magshell::Magshell`], wrapping any
//! [`engine::FieldModelEngine`] implementation.

pub mod assemble;
pub mod constants;
pub mod coords;
pub mod dispatch;
pub mod engine;
pub mod extmodel;
pub mod magshell;
pub mod magshell_errors;
pub mod omni;
pub mod prep;
pub mod sysaxes;
pub mod time;
