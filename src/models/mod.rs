//! Data models for the campaign microsite.
//!
//! Field names match the JSON the presentation layer and the remote tables use.

mod campaign;
mod map;
mod message;
mod source;

pub use campaign::*;
pub use map::*;
pub use message::*;
pub use source::*;
