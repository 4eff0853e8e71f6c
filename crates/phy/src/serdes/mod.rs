//! Serializers, deserializers and pad frames.
//!
//! 1. **OSerdes:** phase words to DDR transitions, with a tristate path of equal depth.
//! 2. **ISerdes:** DDR transitions to words, assembled from two half-cycle nibbles.
//! 3. **Pads:** what the PHY drives onto and samples from the memory bus each cycle.

/// Deserializer for DQ inputs.
pub mod iserdes;
/// Serializer for every output pin.
pub mod oserdes;
/// Per-cycle pad frames.
pub mod pads;

pub use iserdes::ISerdes;
pub use oserdes::{OSerdes, PinDrive};
pub use pads::{ControlPads, DqPad, PadsIn, PadsOut, StrobePad};
