//! Common types and constants used throughout the PHY model.
//!
//! 1. **Constants:** Pipeline depths, pad patterns and delay-line geometry.
//! 2. **Error Handling:** The construction-time error taxonomy.
//! 3. **Bit helpers:** Packing phase bits into DDR pin words.

/// Pipeline depths, pad patterns and delay-line geometry.
pub mod constants;

/// Construction-time error definitions.
pub mod error;

/// DDR word packing helpers.
pub mod word;

pub use error::{PhyError, PhyResult};
pub use word::DdrWord;
