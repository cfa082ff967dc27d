//! ORTC negotiation: router capabilities, producer mapping and consumer parameters.
//!
//! All functions here are pure transformations over negotiation data structures. Shared inputs
//! (router capabilities, producer parameters and mapping) are only ever read, so consumers of
//! the same producer can be negotiated concurrently without locking.


use crate::h264_profile_level_id;
use crate::rtp_parameters::{
    header_extension_uri, CodecParameters, MediaKind, RtcpFeedback, RtcpParameters,
    RtpCapabilities, RtpCodecCapability, RtpCodecParameters, RtpEncodingParameters,
    RtpEncodingParametersRtx, RtpHeaderExtension, RtpHeaderExtensionParameters, RtpParameters,
};
use crate::scalability_modes;
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Dynamic payload types in allocation order. The order is kept as is for wire compatibility.
const DYNAMIC_PAYLOAD_TYPES: [u8; 88] = [
    100, 101, 102, 103, 104, 105, 106, 107, 108, 109, 110, 111, 112, 113, 114, 115, 116, 117, 118,
    119, 120, 121, 122, 123, 124, 125, 126, 127, 96, 97, 98, 99, 77, 78, 79, 80, 81, 82, 83, 84,
    85, 86, 87, 88, 89, 90, 91, 92, 93, 94, 95, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46,
    47, 48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64, 65, 66, 67, 68, 69,
    70, 71,
];

const MAX_PAYLOAD_TYPE: u8 = 127;

/// Broad class of a negotiation failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// Malformed input.
    Validation,
    /// No compatible codec or header extension.
    Unsupported,
    /// Dynamic payload types exhausted.
    ResourceExhaustion,
}

/// Malformed codecs, RTX associations or producer mapping.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ValidationError {
    /// No media codecs given for a router.
    #[error("media codecs cannot be empty")]
    EmptyMediaCodecs,
    /// Codec without MIME type.
    #[error("invalid codec, empty mimeType")]
    EmptyMimeType,
    /// Codec with zero clock rate.
    #[error("invalid codec clockRate [mimeType:{mime_type}]")]
    InvalidClockRate {
        /// MIME type
        mime_type: String,
    },
    /// Codec `apt` parameter that is not a number.
    #[error("invalid codec apt parameter {0}")]
    InvalidAptParameter(String),
    /// RTX codec without `apt` parameter.
    #[error("missing apt parameter in RTX codec [payloadType:{payload_type}]")]
    MissingAptParameter {
        /// Payload type of the RTX codec
        payload_type: u8,
    },
    /// RTX codec pointing to a media codec that doesn't exist.
    #[error("missing media codec found for RTX PT {payload_type}")]
    MissingMediaCodecForRtx {
        /// Payload type of the RTX codec
        payload_type: u8,
    },
    /// Same preferred payload type configured for more than one codec.
    #[error("duplicated preferredPayloadType {0}")]
    DuplicatedPreferredPayloadType(u8),
    /// Preferred payload type outside of the 0-127 RTP payload type range.
    #[error("invalid preferredPayloadType {0}")]
    InvalidPreferredPayloadType(u8),
    /// Capability codec used for mapping has no payload type assigned.
    #[error("capability codec without preferredPayloadType [mimeType:{mime_type}]")]
    MissingPreferredPayloadType {
        /// MIME type
        mime_type: String,
    },
    /// Producer codec payload type absent from the mapping.
    #[error("no mapping for codec payload type {payload_type}")]
    UnmappedPayloadType {
        /// Payload type
        payload_type: u8,
    },
    /// Mapped payload type absent from router capabilities.
    #[error("no capability codec for mapped payload type {payload_type}")]
    UnknownMappedPayloadType {
        /// Payload type
        payload_type: u8,
    },
    /// Producer encodings and mapping encodings are not positionally aligned.
    #[error("encodings mapping mismatch [encodings:{encodings}, mapped:{mapped}]")]
    EncodingsMappingMismatch {
        /// Number of producer encodings
        encodings: usize,
        /// Number of mapped encodings
        mapped: usize,
    },
}

/// Error that caused [`generate_router_rtp_capabilities`] to fail.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum RtpCapabilitiesError {
    /// Invalid media codec.
    #[error("invalid media codec: {0}")]
    Validation(#[from] ValidationError),
    /// Media codec not supported.
    #[error("media codec not supported [mimeType:{mime_type}]")]
    UnsupportedCodec {
        /// MIME type
        mime_type: String,
    },
    /// Cannot allocate more dynamic codec payload types.
    #[error("cannot allocate more dynamic codec payload types")]
    CannotAllocate,
}

impl RtpCapabilitiesError {
    /// Broad class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::UnsupportedCodec { .. } => ErrorKind::Unsupported,
            Self::CannotAllocate => ErrorKind::ResourceExhaustion,
        }
    }
}

/// Error that caused [`get_producer_rtp_parameters_mapping`] to fail.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum RtpParametersMappingError {
    /// Invalid producer RTP parameters.
    #[error("invalid RTP parameters: {0}")]
    Validation(#[from] ValidationError),
    /// Unsupported codec.
    #[error("unsupported codec [mimeType:{mime_type}, payloadType:{payload_type}]")]
    UnsupportedCodec {
        /// MIME type
        mime_type: String,
        /// Payload type
        payload_type: u8,
    },
    /// No RTX codec for capability codec.
    #[error("no RTX codec for capability codec PT {payload_type}")]
    UnsupportedRtxCodec {
        /// Payload type of capability media codec
        payload_type: u8,
    },
    /// Unsupported header extension.
    #[error("unsupported header extension [uri:{uri}, id:{id}]")]
    UnsupportedHeaderExtension {
        /// URI
        uri: String,
        /// ID
        id: u16,
    },
}

impl RtpParametersMappingError {
    /// Broad class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::UnsupportedCodec { .. }
            | Self::UnsupportedRtxCodec { .. }
            | Self::UnsupportedHeaderExtension { .. } => ErrorKind::Unsupported,
        }
    }
}

/// Error that caused [`get_consumer_rtp_parameters`] to fail.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ConsumerRtpParametersError {
    /// Invalid capabilities.
    #[error("invalid capabilities: {0}")]
    Validation(#[from] ValidationError),
    /// No compatible media codecs.
    #[error("no compatible media codecs")]
    NoCompatibleMediaCodecs,
}

impl ConsumerRtpParametersError {
    /// Broad class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NoCompatibleMediaCodecs => ErrorKind::Unsupported,
        }
    }
}

/// Codec payload type correspondence.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpMappingCodec {
    /// Payload type used by the producer.
    pub payload_type: u8,
    /// Payload type used by the router.
    pub mapped_payload_type: u8,
}

/// Header extension id correspondence.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpMappingHeaderExtension {
    /// Id used by the producer.
    pub id: u16,
    /// Id used by the router.
    pub mapped_id: u16,
}

/// Encoding correspondence, positionally aligned with producer encodings.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpMappingEncoding {
    /// SSRC used by the producer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssrc: Option<u32>,
    /// RID used by the producer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
    /// Scalability mode of the encoding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scalability_mode: Option<String>,
    /// SSRC used by the router.
    pub mapped_ssrc: u32,
}

/// Mapping of a producer's codec payload types, header extension ids and encodings to the
/// values expected by its router. Created once per producer and never modified afterwards.
#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpMapping {
    /// Codecs in the same order as in producer RTP parameters.
    pub codecs: Vec<RtpMappingCodec>,
    /// Header extensions in the same order as in producer RTP parameters.
    pub header_extensions: Vec<RtpMappingHeaderExtension>,
    /// Encodings in the same order as in producer RTP parameters.
    pub encodings: Vec<RtpMappingEncoding>,
}

/// Strictness of codec matching.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CodecMatchMode {
    /// MIME type, clock rate, channels and H264 packetization mode.
    Normal,
    /// Additionally requires compatible H264 profiles and equal VP9 `profile-id`.
    Strict,
    /// Like [`CodecMatchMode::Strict`], also yields the negotiated H264 `profile-level-id`.
    StrictAndModify,
}

impl CodecMatchMode {
    fn is_strict(self) -> bool {
        matches!(self, Self::Strict | Self::StrictAndModify)
    }
}

/// Successful codec match.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct CodecMatch {
    /// Candidate parameters with negotiated H264 `profile-level-id` applied, only set in
    /// [`CodecMatchMode::StrictAndModify`] mode for H264. The caller decides whether to apply it
    /// to its own copy of the candidate, shared codecs are never touched.
    ///
    /// Producer mapping only logs it: consumable parameters keep the producer's own codec
    /// parameters.
    pub negotiated_parameters: Option<CodecParameters>,
}

/// Subset of codec fields relevant for matching, shared by capabilities and parameters.
#[derive(Debug, Copy, Clone)]
pub struct CodecToMatch<'a> {
    mime_type: &'a str,
    clock_rate: u32,
    channels: Option<u8>,
    parameters: &'a CodecParameters,
}

impl<'a> From<&'a RtpCodecCapability> for CodecToMatch<'a> {
    fn from(codec: &'a RtpCodecCapability) -> Self {
        Self {
            mime_type: &codec.mime_type,
            clock_rate: codec.clock_rate,
            channels: codec.channels,
            parameters: &codec.parameters,
        }
    }
}

impl<'a> From<&'a RtpCodecParameters> for CodecToMatch<'a> {
    fn from(codec: &'a RtpCodecParameters) -> Self {
        Self {
            mime_type: &codec.mime_type,
            clock_rate: codec.clock_rate,
            channels: codec.channels,
            parameters: &codec.parameters,
        }
    }
}

/// Exclusive cursor over [`DYNAMIC_PAYLOAD_TYPES`] for a single router capabilities build.
struct DynamicPayloadTypes {
    next_index: usize,
    used: BTreeSet<u8>,
}

impl DynamicPayloadTypes {
    fn new() -> Self {
        Self {
            next_index: 0,
            used: BTreeSet::new(),
        }
    }

    /// Mark payload type as taken, returns `false` if it was already taken.
    fn reserve(&mut self, payload_type: u8) -> bool {
        self.used.insert(payload_type)
    }

    fn allocate(&mut self) -> Result<u8, RtpCapabilitiesError> {
        while let Some(&payload_type) = DYNAMIC_PAYLOAD_TYPES.get(self.next_index) {
            self.next_index += 1;
            if self.reserve(payload_type) {
                return Ok(payload_type);
            }
        }

        warn!("cannot allocate more dynamic codec payload types");

        Err(RtpCapabilitiesError::CannotAllocate)
    }
}

fn validate_codec(mime_type: &str, clock_rate: u32) -> Result<(), ValidationError> {
    if mime_type.is_empty() {
        return Err(ValidationError::EmptyMimeType);
    }
    if clock_rate == 0 {
        return Err(ValidationError::InvalidClockRate {
            mime_type: mime_type.to_string(),
        });
    }

    Ok(())
}

fn validate_apt_parameter(parameters: &CodecParameters) -> Result<(), ValidationError> {
    match parameters.get("apt") {
        Some(apt) if apt.as_number().is_none() => {
            Err(ValidationError::InvalidAptParameter(apt.to_string()))
        }
        _ => Ok(()),
    }
}

/// Validates RtpCodecCapability.
pub fn validate_rtp_codec_capability(codec: &RtpCodecCapability) -> Result<(), ValidationError> {
    validate_codec(&codec.mime_type, codec.clock_rate)?;
    validate_apt_parameter(&codec.parameters)
}

/// Validates RtpCodecParameters.
pub fn validate_rtp_codec_parameters(codec: &RtpCodecParameters) -> Result<(), ValidationError> {
    validate_codec(&codec.mime_type, codec.clock_rate)?;
    validate_apt_parameter(&codec.parameters)
}

/// Validates codecs of RtpParameters.
pub fn validate_rtp_parameters(rtp_parameters: &RtpParameters) -> Result<(), ValidationError> {
    rtp_parameters
        .codecs
        .iter()
        .try_for_each(validate_rtp_codec_parameters)
}

/// Validates codecs of RtpCapabilities.
pub fn validate_rtp_capabilities(
    rtp_capabilities: &RtpCapabilities,
) -> Result<(), ValidationError> {
    rtp_capabilities
        .codecs
        .iter()
        .try_for_each(validate_rtp_codec_capability)
}

fn generate_ssrc() -> u32 {
    rand::thread_rng().gen()
}

/// Compare two codecs with given strictness.
///
/// `candidate` is the codec being negotiated (its H264 parameters are considered the local
/// side), `capability` is an entry of the capabilities it is matched against.
#[must_use]
pub fn match_codecs(
    candidate: CodecToMatch<'_>,
    capability: CodecToMatch<'_>,
    mode: CodecMatchMode,
) -> Option<CodecMatch> {
    if !candidate.mime_type.eq_ignore_ascii_case(capability.mime_type) {
        return None;
    }

    if candidate.clock_rate != capability.clock_rate {
        return None;
    }

    // Zero or absent channels on either side act as a wildcard.
    if MediaKind::from_mime_type(candidate.mime_type) == Some(MediaKind::Audio) {
        if let (Some(channels_a), Some(channels_b)) = (candidate.channels, capability.channels) {
            if channels_a > 0 && channels_b > 0 && channels_a != channels_b {
                return None;
            }
        }
    }

    // Per codec special checks.
    let mime_type = candidate.mime_type.to_ascii_lowercase();

    if mime_type == "video/h264" {
        let packetization_mode_a = candidate
            .parameters
            .get_number("packetization-mode")
            .unwrap_or(0);
        let packetization_mode_b = capability
            .parameters
            .get_number("packetization-mode")
            .unwrap_or(0);

        if packetization_mode_a != packetization_mode_b {
            return None;
        }

        if mode.is_strict() {
            let selected_profile_level_id =
                match h264_profile_level_id::generate_profile_level_id_for_answer(
                    candidate.parameters,
                    capability.parameters,
                ) {
                    Ok(selected_profile_level_id) => selected_profile_level_id,
                    Err(error) => {
                        debug!("H264 codecs don't match: {}", error);
                        return None;
                    }
                };

            if mode == CodecMatchMode::StrictAndModify {
                let mut parameters = candidate.parameters.clone();
                match selected_profile_level_id {
                    Some(profile_level_id) => {
                        parameters.insert("profile-level-id", profile_level_id);
                    }
                    None => {
                        parameters.remove("profile-level-id");
                    }
                }

                return Some(CodecMatch {
                    negotiated_parameters: Some(parameters),
                });
            }
        }
    } else if mime_type == "video/vp9" && mode.is_strict() {
        let profile_id_a = candidate.parameters.get_number("profile-id").unwrap_or(0);
        let profile_id_b = capability.parameters.get_number("profile-id").unwrap_or(0);

        if profile_id_a != profile_id_b {
            return None;
        }
    }

    Some(CodecMatch::default())
}

/// Find the first codec in `capabilities` matching `candidate`. The order of `capabilities`
/// is the tie-break, so negotiation stays deterministic.
#[must_use]
pub fn select_matched_codec<'a>(
    candidate: CodecToMatch<'_>,
    capabilities: &'a [RtpCodecCapability],
    mode: CodecMatchMode,
) -> Option<(&'a RtpCodecCapability, CodecMatch)> {
    capabilities.iter().find_map(|capability| {
        match_codecs(candidate, capability.into(), mode).map(|codec_match| (capability, codec_match))
    })
}

/// Header extensions match if URIs are equal and kinds are equal or absent on either side.
#[must_use]
pub fn match_header_extensions(ext_a: &RtpHeaderExtension, ext_b: &RtpHeaderExtension) -> bool {
    if let (Some(kind_a), Some(kind_b)) = (ext_a.kind, ext_b.kind) {
        if kind_a != kind_b {
            return false;
        }
    }

    ext_a.uri == ext_b.uri
}

/// Generate RTP capabilities for the router based on the given media codecs and the media
/// engine supported RTP capabilities.
///
/// Every video codec is immediately followed by its RTX codec in the result.
pub fn generate_router_rtp_capabilities(
    media_codecs: &[RtpCodecCapability],
) -> Result<RtpCapabilities, RtpCapabilitiesError> {
    generate_router_rtp_capabilities_with_supported(
        media_codecs,
        &crate::supported_rtp_capabilities::get_supported_rtp_capabilities(),
    )
}

/// Same as [`generate_router_rtp_capabilities`], but with explicitly provided supported RTP
/// capabilities.
pub fn generate_router_rtp_capabilities_with_supported(
    media_codecs: &[RtpCodecCapability],
    supported_rtp_capabilities: &RtpCapabilities,
) -> Result<RtpCapabilities, RtpCapabilitiesError> {
    debug!(
        "generate_router_rtp_capabilities() [media_codecs:{}]",
        media_codecs.len()
    );

    if media_codecs.is_empty() {
        return Err(ValidationError::EmptyMediaCodecs.into());
    }

    let mut dynamic_payload_types = DynamicPayloadTypes::new();

    // Payload types explicitly requested by configuration are not available for allocation.
    for media_codec in media_codecs {
        if let Some(preferred_payload_type) = media_codec.preferred_payload_type {
            if preferred_payload_type > MAX_PAYLOAD_TYPE {
                return Err(
                    ValidationError::InvalidPreferredPayloadType(preferred_payload_type).into(),
                );
            }
            if !dynamic_payload_types.reserve(preferred_payload_type) {
                return Err(
                    ValidationError::DuplicatedPreferredPayloadType(preferred_payload_type).into(),
                );
            }
        }
    }

    let mut codecs = Vec::<RtpCodecCapability>::with_capacity(media_codecs.len() * 2);

    for media_codec in media_codecs {
        validate_rtp_codec_capability(media_codec)?;

        let (matched_codec, _) = select_matched_codec(
            media_codec.into(),
            &supported_rtp_capabilities.codecs,
            CodecMatchMode::Normal,
        )
        .ok_or_else(|| {
            warn!(
                "media codec not supported [mimeType:{}]",
                media_codec.mime_type
            );

            RtpCapabilitiesError::UnsupportedCodec {
                mime_type: media_codec.mime_type.clone(),
            }
        })?;

        let mut codec = matched_codec.clone();
        let kind = codec.kind();
        codec.kind = kind;

        // Normalize channels.
        codec.channels = match kind {
            Some(MediaKind::Audio) => match codec.channels {
                None | Some(0) => Some(1),
                channels => channels,
            },
            _ => None,
        };

        // Configured parameters win over supported defaults.
        codec.parameters.extend(media_codec.parameters.clone());

        // Configured payload types were reserved above, static ones from the supported table
        // must not collide with anything taken so far.
        let payload_type = match (media_codec.preferred_payload_type, codec.preferred_payload_type)
        {
            (Some(payload_type), _) => payload_type,
            (None, Some(payload_type)) => {
                if !dynamic_payload_types.reserve(payload_type) {
                    warn!(
                        "static payload type already taken [mimeType:{}, payloadType:{}]",
                        codec.mime_type, payload_type
                    );

                    return Err(ValidationError::DuplicatedPreferredPayloadType(payload_type).into());
                }
                payload_type
            }
            (None, None) => dynamic_payload_types.allocate()?,
        };
        codec.preferred_payload_type = Some(payload_type);

        debug!(
            "assigned payload type [mimeType:{}, payloadType:{}]",
            codec.mime_type, payload_type
        );

        codecs.push(codec);

        if kind == Some(MediaKind::Video) {
            let rtx_payload_type = dynamic_payload_types.allocate()?;

            codecs.push(RtpCodecCapability {
                kind: Some(MediaKind::Video),
                mime_type: format!("{}/rtx", MediaKind::Video),
                preferred_payload_type: Some(rtx_payload_type),
                clock_rate: matched_codec.clock_rate,
                channels: None,
                parameters: CodecParameters::from([("apt", payload_type.into())]),
                rtcp_feedback: vec![],
            });
        }
    }

    Ok(RtpCapabilities {
        codecs,
        header_extensions: supported_rtp_capabilities.header_extensions.clone(),
        fec_mechanisms: supported_rtp_capabilities.fec_mechanisms.clone(),
    })
}

/// Get a mapping of codec payload types, header extension ids and encodings of the given
/// producer RTP parameters to the values expected by the router.
///
/// Returns `Err()` if invalid or non supported RTP parameters are given.
pub fn get_producer_rtp_parameters_mapping(
    rtp_parameters: &RtpParameters,
    rtp_capabilities: &RtpCapabilities,
) -> Result<RtpMapping, RtpParametersMappingError> {
    debug!(
        "get_producer_rtp_parameters_mapping() [codecs:{}, encodings:{}]",
        rtp_parameters.codecs.len(),
        rtp_parameters.encodings.len()
    );

    validate_rtp_parameters(rtp_parameters)?;

    let codecs = &rtp_parameters.codecs;
    // Capability codec for each producer codec, same indices as `codecs`.
    let mut cap_codecs = vec![None::<&RtpCodecCapability>; codecs.len()];

    // Match media codecs to capabilities media codecs.
    for (codec, cap_codec) in codecs.iter().zip(cap_codecs.iter_mut()) {
        if codec.is_rtx() {
            continue;
        }

        let (matched_codec, codec_match) = select_matched_codec(
            codec.into(),
            &rtp_capabilities.codecs,
            CodecMatchMode::StrictAndModify,
        )
        .ok_or_else(|| {
            warn!(
                "unsupported codec [mimeType:{}, payloadType:{}]",
                codec.mime_type, codec.payload_type
            );

            RtpParametersMappingError::UnsupportedCodec {
                mime_type: codec.mime_type.clone(),
                payload_type: codec.payload_type,
            }
        })?;

        if let Some(negotiated_parameters) = codec_match.negotiated_parameters {
            debug!(
                "negotiated codec parameters [payloadType:{}, parameters:{:?}]",
                codec.payload_type, negotiated_parameters
            );
        }

        *cap_codec = Some(matched_codec);
    }

    // Match RTX codecs to capabilities RTX codecs.
    for (index, codec) in codecs.iter().enumerate() {
        if !codec.is_rtx() {
            continue;
        }

        let apt = codec.parameters.get_number("apt").ok_or(
            ValidationError::MissingAptParameter {
                payload_type: codec.payload_type,
            },
        )?;

        // Search for the associated media codec, it must have been matched above.
        let cap_media_codec = codecs
            .iter()
            .position(|media_codec| u32::from(media_codec.payload_type) == apt)
            .and_then(|media_index| cap_codecs[media_index])
            .ok_or(ValidationError::MissingMediaCodecForRtx {
                payload_type: codec.payload_type,
            })?;

        let cap_media_payload_type = cap_media_codec.preferred_payload_type.ok_or_else(|| {
            ValidationError::MissingPreferredPayloadType {
                mime_type: cap_media_codec.mime_type.clone(),
            }
        })?;

        // Ensure that the capabilities media codec has a RTX codec.
        let cap_rtx_codec = rtp_capabilities
            .codecs
            .iter()
            .find(|cap_codec| {
                cap_codec.is_rtx()
                    && cap_codec.parameters.get_number("apt")
                        == Some(u32::from(cap_media_payload_type))
            })
            .ok_or(RtpParametersMappingError::UnsupportedRtxCodec {
                payload_type: cap_media_payload_type,
            })?;

        cap_codecs[index] = Some(cap_rtx_codec);
    }

    let mut rtp_mapping = RtpMapping::default();

    // Generate codecs mapping in the order of producer codecs.
    for (codec, cap_codec) in codecs.iter().zip(cap_codecs) {
        let Some(cap_codec) = cap_codec else {
            continue;
        };
        let mapped_payload_type = cap_codec.preferred_payload_type.ok_or_else(|| {
            ValidationError::MissingPreferredPayloadType {
                mime_type: cap_codec.mime_type.clone(),
            }
        })?;

        rtp_mapping.codecs.push(RtpMappingCodec {
            payload_type: codec.payload_type,
            mapped_payload_type,
        });
    }

    // Generate header extensions mapping.
    for ext in rtp_parameters.header_extensions.iter() {
        let ext_to_match = RtpHeaderExtension {
            kind: None,
            uri: ext.uri.clone(),
            preferred_id: ext.id,
        };

        let matched_cap_ext = rtp_capabilities
            .header_extensions
            .iter()
            .find(|cap_ext| match_header_extensions(&ext_to_match, cap_ext))
            .ok_or_else(|| {
                warn!(
                    "unsupported header extension [uri:{}, id:{}]",
                    ext.uri, ext.id
                );

                RtpParametersMappingError::UnsupportedHeaderExtension {
                    uri: ext.uri.clone(),
                    id: ext.id,
                }
            })?;

        rtp_mapping
            .header_extensions
            .push(RtpMappingHeaderExtension {
                id: ext.id,
                mapped_id: matched_cap_ext.preferred_id,
            });
    }

    // Generate encodings mapping.
    for encoding in rtp_parameters.encodings.iter() {
        rtp_mapping.encodings.push(RtpMappingEncoding {
            ssrc: encoding.ssrc,
            rid: encoding.rid.clone(),
            scalability_mode: encoding.scalability_mode.clone(),
            mapped_ssrc: generate_ssrc(),
        });
    }

    Ok(rtp_mapping)
}

fn consumable_codec(
    cap_codec: &RtpCodecCapability,
    payload_type: u8,
    parameters: CodecParameters,
) -> RtpCodecParameters {
    RtpCodecParameters {
        mime_type: cap_codec.mime_type.clone(),
        payload_type,
        clock_rate: cap_codec.clock_rate,
        channels: cap_codec.channels,
        parameters,
        rtcp_feedback: cap_codec.rtcp_feedback.clone(),
    }
}

/// Generate RTP parameters to be internally used by consumers given the RTP parameters of a
/// producer and the RTP capabilities of the router.
pub fn get_consumable_rtp_parameters(
    kind: MediaKind,
    params: &RtpParameters,
    caps: &RtpCapabilities,
    rtp_mapping: &RtpMapping,
) -> Result<RtpParameters, ValidationError> {
    debug!(
        "get_consumable_rtp_parameters() [kind:{}, codecs:{}]",
        kind,
        params.codecs.len()
    );

    if params.encodings.len() != rtp_mapping.encodings.len() {
        return Err(ValidationError::EncodingsMappingMismatch {
            encodings: params.encodings.len(),
            mapped: rtp_mapping.encodings.len(),
        });
    }

    let mut consumable_params = RtpParameters::default();

    for codec in params.codecs.iter() {
        validate_rtp_codec_parameters(codec)?;

        if codec.is_rtx() {
            continue;
        }

        let consumable_codec_pt = rtp_mapping
            .codecs
            .iter()
            .find(|entry| entry.payload_type == codec.payload_type)
            .map(|entry| entry.mapped_payload_type)
            .ok_or(ValidationError::UnmappedPayloadType {
                payload_type: codec.payload_type,
            })?;

        let matched_cap_codec = caps
            .codecs
            .iter()
            .find(|cap_codec| cap_codec.preferred_payload_type == Some(consumable_codec_pt))
            .ok_or(ValidationError::UnknownMappedPayloadType {
                payload_type: consumable_codec_pt,
            })?;

        // Keep the producer codec parameters.
        consumable_params.codecs.push(consumable_codec(
            matched_cap_codec,
            consumable_codec_pt,
            codec.parameters.clone(),
        ));

        let consumable_cap_rtx_codec = caps.codecs.iter().find(|cap_rtx_codec| {
            cap_rtx_codec.is_rtx()
                && cap_rtx_codec.parameters.get_number("apt")
                    == Some(u32::from(consumable_codec_pt))
        });

        if let Some(cap_rtx_codec) = consumable_cap_rtx_codec {
            let rtx_payload_type = cap_rtx_codec.preferred_payload_type.ok_or_else(|| {
                ValidationError::MissingPreferredPayloadType {
                    mime_type: cap_rtx_codec.mime_type.clone(),
                }
            })?;

            consumable_params.codecs.push(consumable_codec(
                cap_rtx_codec,
                rtx_payload_type,
                cap_rtx_codec.parameters.clone(),
            ));
        }
    }

    for cap_ext in caps.header_extensions.iter() {
        // Just take RTP header extensions that can be used in consumers. Stream identity
        // extensions are regenerated by every consumer.
        if cap_ext.kind != Some(kind)
            || cap_ext.uri == header_extension_uri::MID
            || cap_ext.uri == header_extension_uri::RTP_STREAM_ID
            || cap_ext.uri == header_extension_uri::REPAIRED_RTP_STREAM_ID
        {
            continue;
        }

        consumable_params
            .header_extensions
            .push(RtpHeaderExtensionParameters {
                uri: cap_ext.uri.clone(),
                id: cap_ext.preferred_id,
            });
    }

    for (encoding, mapped_encoding) in params.encodings.iter().zip(rtp_mapping.encodings.iter()) {
        let mut consumable_encoding = encoding.clone();
        // Remove useless fields.
        consumable_encoding.rid.take();
        consumable_encoding.rtx.take();
        consumable_encoding.codec_payload_type.take();

        // Set the mapped ssrc.
        consumable_encoding.ssrc = Some(mapped_encoding.mapped_ssrc);

        consumable_params.encodings.push(consumable_encoding);
    }

    consumable_params.rtcp = RtcpParameters {
        cname: params.rtcp.cname.clone(),
        reduced_size: true,
        mux: Some(true),
    };

    Ok(consumable_params)
}

/// Check whether the given RTP capabilities can consume the given consumable RTP parameters.
#[must_use]
pub fn can_consume(consumable_params: &RtpParameters, caps: &RtpCapabilities) -> bool {
    if let Err(error) = validate_rtp_capabilities(caps) {
        debug!("can_consume() | invalid capabilities: {}", error);
        return false;
    }

    // Ensure there is at least one media codec and that it goes first.
    consumable_params
        .codecs
        .iter()
        .find_map(|codec| {
            select_matched_codec(codec.into(), &caps.codecs, CodecMatchMode::Strict)
                .map(|(matched_codec, _)| matched_codec)
        })
        .map_or(false, |first_matched_codec| !first_matched_codec.is_rtx())
}

/// Generate RTP parameters for a specific consumer.
///
/// It reduces encodings to just one and takes into account given RTP capabilities to reduce
/// codecs, codecs' RTCP feedback and header extensions, and also enables or disables RTX.
pub fn get_consumer_rtp_parameters(
    consumable_params: &RtpParameters,
    caps: &RtpCapabilities,
) -> Result<RtpParameters, ConsumerRtpParametersError> {
    debug!(
        "get_consumer_rtp_parameters() [codecs:{}, encodings:{}]",
        consumable_params.codecs.len(),
        consumable_params.encodings.len()
    );

    validate_rtp_capabilities(caps)?;

    let mut consumer_params = RtpParameters::default();
    let mut rtx_supported = false;

    for codec in consumable_params.codecs.iter() {
        match select_matched_codec(codec.into(), &caps.codecs, CodecMatchMode::Strict) {
            Some((matched_cap_codec, _)) => {
                let mut codec = codec.clone();
                codec.rtcp_feedback = matched_cap_codec.rtcp_feedback.clone();

                if codec.is_rtx() {
                    rtx_supported = true;
                }

                consumer_params.codecs.push(codec);
            }
            None => {
                debug!(
                    "codec not supported by consumer [mimeType:{}, payloadType:{}]",
                    codec.mime_type, codec.payload_type
                );
            }
        }
    }

    // Ensure there is at least one media codec and that it goes first.
    if consumer_params
        .codecs
        .first()
        .map_or(true, RtpCodecParameters::is_rtx)
    {
        return Err(ConsumerRtpParametersError::NoCompatibleMediaCodecs);
    }

    consumer_params.header_extensions = consumable_params
        .header_extensions
        .iter()
        .filter(|ext| {
            caps.header_extensions
                .iter()
                .any(|cap_ext| cap_ext.preferred_id == ext.id)
        })
        .cloned()
        .collect();

    let mut consumer_encoding = RtpEncodingParameters {
        ssrc: Some(generate_ssrc()),
        ..RtpEncodingParameters::default()
    };

    if rtx_supported {
        consumer_encoding.rtx = Some(RtpEncodingParametersRtx {
            ssrc: generate_ssrc(),
        });
    }

    // If any encoding has scalability mode, assume all encodings have the same one.
    let scalability_mode = consumable_params
        .encodings
        .iter()
        .find_map(|encoding| encoding.scalability_mode.clone());

    // With simulcast, spatial layers of the consumer are the producer encodings.
    consumer_encoding.scalability_mode = if consumable_params.encodings.len() > 1 {
        let temporal_layers =
            scalability_modes::parse(scalability_mode.as_deref().unwrap_or_default())
                .temporal_layers;

        Some(format!(
            "S{}T{}",
            consumable_params.encodings.len(),
            temporal_layers
        ))
    } else {
        scalability_mode
    };

    // Use the maximum max bitrate of any encoding.
    consumer_encoding.max_bitrate = consumable_params
        .encodings
        .iter()
        .filter_map(|encoding| encoding.max_bitrate)
        .max();

    consumer_params.encodings.push(consumer_encoding);
    consumer_params.rtcp = consumable_params.rtcp.clone();

    Ok(consumer_params)
}

/// Generate RTP parameters for a pipe consumer.
///
/// It keeps all original consumable encodings and removes RTX support and also other features
/// such as NACK, since pipe links carry no loss or congestion signalling.
#[must_use]
pub fn get_pipe_consumer_rtp_parameters(consumable_params: &RtpParameters) -> RtpParameters {
    debug!(
        "get_pipe_consumer_rtp_parameters() [codecs:{}, encodings:{}]",
        consumable_params.codecs.len(),
        consumable_params.encodings.len()
    );

    let codecs = consumable_params
        .codecs
        .iter()
        .filter(|codec| !codec.is_rtx())
        .map(|codec| {
            let mut codec = codec.clone();
            codec.rtcp_feedback.retain(|fb| {
                fb == &RtcpFeedback::NACK_PLI || fb == &RtcpFeedback::CCM_FIR
            });
            codec
        })
        .collect();

    let header_extensions = consumable_params
        .header_extensions
        .iter()
        .filter(|ext| ext.uri != header_extension_uri::ABS_SEND_TIME)
        .cloned()
        .collect();

    let encodings = consumable_params
        .encodings
        .iter()
        .map(|encoding| RtpEncodingParameters {
            rtx: None,
            ..encoding.clone()
        })
        .collect();

    RtpParameters {
        mid: None,
        codecs,
        header_extensions,
        encodings,
        rtcp: consumable_params.rtcp.clone(),
    }
}
