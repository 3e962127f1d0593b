//! Application core: the bring-up loop, free of direct hardware access.
//!
//! All interaction with the board happens through the **port traits**
//! in [`ports`], so the loop can be driven step by step on the host
//! against mock pins, a mock SPI device and a mock delay.

pub mod events;
pub mod ports;
pub mod service;
pub mod stats;
