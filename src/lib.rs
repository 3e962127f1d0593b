//! MIPE_EV1/EV2 bring-up library.
//!
//! Holds the hardware-agnostic part of the bring-up programs: the signal
//! phase, pacing, the LSM6DSO32 register read and the probe bookkeeping.
//! Everything touching the board goes through `embedded-hal` 1.0 traits,
//! so the same code runs on the nRF54L15 and against mocks on the host.
//!
//! With the `host` feature the crate also carries the logic-analyzer
//! capture checker used to verify a flashed board from the bench, and a
//! board simulation that renders the loop into the same capture format.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod timing;

#[cfg(feature = "host")]
pub mod capture;
#[cfg(feature = "host")]
pub mod sim;

pub use error::{Error, Result};
