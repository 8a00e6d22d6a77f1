//! # Translator
//!
//! Simulator state to Apollo pose translation.
//!
//! Responsibilities:
//! - Validated decode of the 18-token state line into `VehicleState`
//! - Quaternion -> Euler (clamped) and back, with the heading-zero offset
//! - Northing offset and `Pose` population
//!
//! Everything here is pure: no I/O, no logging, no state across calls.
//!
//! ## Usage Example
//!
//! ```
//! use translator::Translator;
//!
//! let translator = Translator::default();
//! let (state, fix) = translator
//!     .decode_and_translate("10.0 5.0 0.0 0.0 0.0 0.0 1.0 0 0 0 1 0 0 0 0 0 2.5 100.0")
//!     .unwrap();
//! assert_eq!(fix.pose.position.y, 187.5);
//! assert_eq!(state.forward_speed, 2.5);
//! ```

mod decode;
mod error;
mod orientation;
mod translate;

pub use contracts::{FrameConfig, HEADING_ZERO_OFFSET_DEG, MAP_NORTHING_OFFSET_M};
pub use decode::decode_state;
pub use error::DecodeError;
pub use orientation::{euler_to_quaternion, quaternion_to_euler};
pub use translate::{PoseFix, Translator};
