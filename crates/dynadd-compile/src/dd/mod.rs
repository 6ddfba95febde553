//! Decoupling sequences: components, the fitting algorithm and the schemes.

pub mod component;
pub mod schemes;
pub mod sequence;

pub use component::{Component, GateComponent, PulseComponent, pulse_gate_name};
pub use schemes::{
    KddPulses, Scheme, SchemeOptions, build_scheme, carr_purcell, hahn_echo, kdd,
    uhrig, uhrig_breakpoints, uhrig_weights, xy4, y_pulse,
};
pub use sequence::Sequence;
