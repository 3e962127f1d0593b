//! Peripheral drivers for the bring-up board.

pub mod lsm6dso32;
pub mod signals;
