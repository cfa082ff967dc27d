//! ORTC RTP capability negotiation for SFU routers.
//!
//! Given the media codecs a router is configured with, this crate computes the router RTP
//! capabilities, maps RTP parameters of producers to router payload types and header extension
//! ids, and derives RTP parameters for every consumer of a producer, including pipe consumers
//! relaying media between routers.
//!
//! Everything here is pure computation over negotiation data: there is no I/O and no media
//! handling. Low-level functions live in [`ortc`], [`router::Router`] and [`producer::Producer`]
//! wrap them into a small stateful API.
//!
//! ```
//! use mediasoup_ortc::prelude::*;
//!
//! let router = Router::new(RouterOptions::new(vec![RtpCodecCapability {
//!     mime_type: "video/VP8".to_string(),
//!     clock_rate: 90000,
//!     ..RtpCodecCapability::default()
//! }]))
//! .expect("Failed to create router");
//!
//! // VP8 and its RTX codec.
//! assert_eq!(router.rtp_capabilities().codecs.len(), 2);
//! ```

#![warn(rust_2018_idioms, missing_debug_implementations, missing_docs)]

pub mod h264_profile_level_id;
mod macros;
pub mod ortc;
pub mod prelude;
pub mod router;
pub mod rtp_parameters;
pub mod scalability_modes;
pub mod supported_rtp_capabilities;

pub use router::producer;
