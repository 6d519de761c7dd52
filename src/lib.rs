//! Bit-banged driver for the NET-port bus of Hayward pool heat pumps.
//!
//! The NET port is a single-wire half-duplex bus shared by the heat pump's
//! main board and its OEM keypad. This crate decodes the traffic (frame
//! boundaries by pulse timing, dual-polarity checksums, a catalog of typed
//! frames) into one canonical state record, and can inject keypad-style
//! command frames without colliding with the keypad's once-per-minute
//! cadence.
//!
//! The hardware side targets the Raspberry Pi Pico (RP2040) on embassy; the
//! whole protocol core is hardware-free and tested on the host with
//! `cargo test --features host`.
#![cfg_attr(not(feature = "host"), no_std)]
#![warn(
    clippy::pedantic,
    clippy::use_self,
    unused_lifetimes,
    missing_docs,
    single_use_lifetimes,
    unreachable_pub,
    clippy::perf,
    clippy::style,
    clippy::complexity,
    clippy::correctness,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::panic_in_result_fn
)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    reason = "the wire format is all half-degree bytes; truncating casts are the codec"
)]

#[cfg(not(feature = "host"))]
mod bus;
pub mod call;
pub mod codec;
pub mod decoder;
mod error;
pub mod frame;
mod never;
pub mod packet;
pub mod pulse;
pub mod queue;
pub mod schedule;
pub mod shared_constants;
pub mod state;
pub mod status;

#[cfg(not(feature = "host"))]
pub use bus::{BusMode, BusStatics, NetBus};
pub use call::Call;
pub use codec::{
    ClimateAction, ClimateMode, DecimalNumber, DefrostEcoMode, FanMode, FlowMeter, HpMode,
    LargeInteger, ModeRestrict, Temperature, TemperatureExt,
};
pub use decoder::{DecodedFrame, Decoder, DiscardReason, FeedOutcome};
pub use error::{Error, Result};
pub use frame::{Accepted, ControlOutcome, ControlResult, Entry, FrameKind, Registry};
pub use never::Never;
pub use packet::{Packet, Source};
pub use pulse::{PulseClass, PulseRecord};
pub use queue::DropOldestQueue;
pub use schedule::{TxGate, TxHold};
pub use state::{HeatPumpState, PowerOnClock, Traits};
pub use status::{ErrorClass, ErrorEntry, HeaterStatus};
