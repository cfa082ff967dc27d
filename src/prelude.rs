//! mediasoup-ortc prelude.
//!
//! Re-exports commonly used structs from this crate.
//!
//! # Examples
//!
//! Import the prelude with:
//!
//! ```
//! # #[allow(unused_imports)]
//! use mediasoup_ortc::prelude::*;
//! ```
pub use crate::router::{Router, RouterId, RouterOptions};

pub use crate::producer::{ProduceError, Producer, ProducerId, ProducerOptions};

pub use crate::ortc::{
    CodecMatchMode, ConsumerRtpParametersError, ErrorKind, RtpCapabilitiesError, RtpMapping,
    RtpParametersMappingError, ValidationError,
};
pub use crate::rtp_parameters::{
    CodecParameterValue, CodecParameters, MediaKind, RtcpFeedback, RtcpParameters,
    RtpCapabilities, RtpCodecCapability, RtpCodecParameters, RtpEncodingParameters,
    RtpEncodingParametersRtx, RtpHeaderExtension, RtpHeaderExtensionParameters, RtpParameters,
};
