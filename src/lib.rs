// External data representation, a protocol for serializing data to be sent over the network
pub mod xdr;

// Remote procedure call, a protocol build on top of XDR to provide something like C-style function calls over the network
pub mod rpc;

// A protocol using RPC that's meant to communicate with instruments like oscilloscopes, power supplies, waveform generators, etc
pub mod vxi11;

// Request/response channel to an instrument, either a VXI-11 link or a scripted stand-in
pub mod session;

pub mod config;
pub mod error;

// IEEE-488.2 arbitrary block data, the framing of every binary query reply
pub mod block;

// Preamble parsing and conversion of ADC codes to volts
pub mod waveform;

// Named, validated SCPI settings
pub mod params;

// Drivers for the supported instruments
pub mod devices;

pub use config::Config;
pub use error::{Error, Result};
pub use session::{Session, ScriptedSession};
pub use devices::dg5000pro::RigolDG5000Pro;
pub use devices::ds8000r::RigolDS8000R;
