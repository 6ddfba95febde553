//! Built-in passes of the decoupling pipeline.
//!
//! In pipeline order:
//! - [`BarriersToDelays`]: schedules the circuit and makes idle time explicit
//! - [`MergeDelays`]: collapses runs of delays into one delay per gap
//! - [`FlagFundamentalState`]: marks nodes acting on never-excited qubits
//! - [`DelayToDd`]: replaces long enough delays by a decoupling sequence

pub mod barriers_to_delays;
pub mod delay_to_dd;
pub mod fundamental_state;
pub mod merge_delays;

pub use barriers_to_delays::{BarriersToDelays, SchedulingMethod};
pub use delay_to_dd::DelayToDd;
pub use fundamental_state::FlagFundamentalState;
pub use merge_delays::MergeDelays;
