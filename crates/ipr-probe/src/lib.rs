//! Network probes: turn device CLI output into address evidence.
//!
//! Architectural decisions:
//! - Text parsing is pure and separately testable (`parse` module)
//! - Transport is a trait; the default implementation shells out to the
//!   system `ssh` binary with key auth and a hard timeout
//! - Multi-device gathering fans out with bounded parallelism; a device
//!   that times out or refuses contributes empty evidence, never an error

mod collector;
mod gather;
mod parse;
mod transport;

pub use collector::{EosCollector, EvidenceCollector};
pub use gather::{gather_evidence, GatherOptions};
pub use parse::{parse_arp_output, parse_interface_brief, ArpEntry, InterfaceEntry};
pub use transport::{DeviceTransport, ProbeError, SshTransport};
