#![cfg_attr(not(test), no_std)]

//! Driver for the 8-channel FET switch board on a robot's CAN bus.
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`boards`] | FET board group, shared motor-board capabilities, frame dispatch |
//! | [`components`] | Wire format: raw frames and decoded messages |
//! | [`app`] | Self-test exerciser |
//! | [`config`] | Slot table, limits and timings |
//! | [`status`] | Process-wide counters |

#[macro_use]
mod logging;

pub mod app;
pub mod boards;
pub mod components;
pub mod config;
pub mod error;
pub mod status;

pub use boards::{Board, Decoded, DeviceIdx, FetBoard, dispatch};
pub use components::message::{CanMessage, Message};
pub use config::FetConfig;
pub use error::Error;
