//! Collection of RTP-related data structures that are used to specify codec parameters and
//! capabilities of routers, producers and consumers.
//!
//! Everything here serializes to the camelCase JSON shape used by ORTC signaling, so values can
//! be exchanged with endpoints verbatim.


use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::iter::FromIterator;

/// URIs of RTP header extensions that negotiation treats specially.
pub mod header_extension_uri {
    /// urn:ietf:params:rtp-hdrext:sdes:mid
    pub const MID: &str = "urn:ietf:params:rtp-hdrext:sdes:mid";
    /// urn:ietf:params:rtp-hdrext:sdes:rtp-stream-id
    pub const RTP_STREAM_ID: &str = "urn:ietf:params:rtp-hdrext:sdes:rtp-stream-id";
    /// urn:ietf:params:rtp-hdrext:sdes:repaired-rtp-stream-id
    pub const REPAIRED_RTP_STREAM_ID: &str =
        "urn:ietf:params:rtp-hdrext:sdes:repaired-rtp-stream-id";
    /// <http://www.webrtc.org/experiments/rtp-hdrext/abs-send-time>
    pub const ABS_SEND_TIME: &str = "http://www.webrtc.org/experiments/rtp-hdrext/abs-send-time";
    /// <http://www.ietf.org/id/draft-holmer-rmcat-transport-wide-cc-extensions-01>
    pub const TRANSPORT_WIDE_CC_01: &str =
        "http://www.ietf.org/id/draft-holmer-rmcat-transport-wide-cc-extensions-01";
    /// <http://tools.ietf.org/html/draft-ietf-avtext-framemarking-07>
    pub const FRAME_MARKING_07: &str =
        "http://tools.ietf.org/html/draft-ietf-avtext-framemarking-07";
    /// urn:ietf:params:rtp-hdrext:framemarking
    pub const FRAME_MARKING: &str = "urn:ietf:params:rtp-hdrext:framemarking";
    /// urn:ietf:params:rtp-hdrext:ssrc-audio-level
    pub const AUDIO_LEVEL: &str = "urn:ietf:params:rtp-hdrext:ssrc-audio-level";
    /// urn:3gpp:video-orientation
    pub const VIDEO_ORIENTATION: &str = "urn:3gpp:video-orientation";
    /// urn:ietf:params:rtp-hdrext:toffset
    pub const TIME_OFFSET: &str = "urn:ietf:params:rtp-hdrext:toffset";
}

/// Media kind
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Audio
    Audio,
    /// Video
    Video,
}

impl MediaKind {
    /// Media kind as a string, the same one used as MIME type prefix.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// Derive media kind from the type part of a MIME type (`audio/opus` is audio).
    #[must_use]
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        let (kind, _) = mime_type.split_once('/').unwrap_or((mime_type, ""));

        if kind.eq_ignore_ascii_case("audio") {
            Some(Self::Audio)
        } else if kind.eq_ignore_ascii_case("video") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether given MIME type is the one of a retransmission (RTX) codec.
#[must_use]
pub fn is_rtx_mime_type(mime_type: &str) -> bool {
    mime_type
        .get(mime_type.len().saturating_sub(4)..)
        .map_or(false, |suffix| suffix.eq_ignore_ascii_case("/rtx"))
}

/// Single value used in RTP codec parameters.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CodecParameterValue {
    /// String value
    String(Cow<'static, str>),
    /// Numerical value
    Number(u32),
}

impl CodecParameterValue {
    /// Numeric interpretation of the value, strings holding decimal numbers included.
    #[must_use]
    pub fn as_number(&self) -> Option<u32> {
        match self {
            Self::Number(number) => Some(*number),
            Self::String(string) => string.parse().ok(),
        }
    }
}

impl fmt::Display for CodecParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(string) => f.write_str(string),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<Cow<'static, str>> for CodecParameterValue {
    fn from(s: Cow<'static, str>) -> Self {
        Self::String(s)
    }
}

impl From<String> for CodecParameterValue {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<&'static str> for CodecParameterValue {
    fn from(s: &'static str) -> Self {
        Self::String(s.into())
    }
}

impl From<u8> for CodecParameterValue {
    fn from(n: u8) -> Self {
        Self::Number(u32::from(n))
    }
}

impl From<u16> for CodecParameterValue {
    fn from(n: u16) -> Self {
        Self::Number(u32::from(n))
    }
}

impl From<u32> for CodecParameterValue {
    fn from(n: u32) -> Self {
        Self::Number(n)
    }
}

/// Codec specific parameters. Some parameters (such as `packetization-mode` and
/// `profile-level-id` in H264 or `profile-id` in VP9) are critical for codec matching, `apt`
/// links an RTX codec to its media codec.
#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct CodecParameters(BTreeMap<Cow<'static, str>, CodecParameterValue>);

impl CodecParameters {
    /// Insert another parameter into collection, replacing previous value with the same key.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<Cow<'static, str>>,
        V: Into<CodecParameterValue>,
    {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Remove parameter from collection, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<CodecParameterValue> {
        self.0.remove(key)
    }

    /// Get specific parameter from collection.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CodecParameterValue> {
        self.0.get(key)
    }

    /// Numeric value of a parameter; `None` if missing or not a number.
    #[must_use]
    pub fn get_number(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(CodecParameterValue::as_number)
    }

    /// Whether parameter with given key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over parameters in collection.
    pub fn iter(
        &self,
    ) -> std::collections::btree_map::Iter<'_, Cow<'static, str>, CodecParameterValue> {
        self.0.iter()
    }

    /// Number of parameters in collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, const N: usize> From<[(K, CodecParameterValue); N]> for CodecParameters
where
    K: Into<Cow<'static, str>>,
{
    fn from(array: [(K, CodecParameterValue); N]) -> Self {
        IntoIterator::into_iter(array).collect()
    }
}

impl IntoIterator for CodecParameters {
    type Item = (Cow<'static, str>, CodecParameterValue);
    type IntoIter = std::collections::btree_map::IntoIter<Cow<'static, str>, CodecParameterValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K> Extend<(K, CodecParameterValue)> for CodecParameters
where
    K: Into<Cow<'static, str>>,
{
    fn extend<T: IntoIterator<Item = (K, CodecParameterValue)>>(&mut self, iter: T) {
        iter.into_iter().for_each(|(k, v)| {
            self.insert(k, v);
        });
    }
}

impl<K> FromIterator<(K, CodecParameterValue)> for CodecParameters
where
    K: Into<Cow<'static, str>>,
{
    fn from_iter<T: IntoIterator<Item = (K, CodecParameterValue)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Provides information on RTCP feedback messages for a specific codec. Those messages can be
/// transport layer feedback messages or codec-specific feedback messages.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct RtcpFeedback {
    /// RTCP feedback type.
    pub r#type: Cow<'static, str>,
    /// RTCP feedback parameter, empty string if none.
    #[serde(default)]
    pub parameter: Cow<'static, str>,
}

impl RtcpFeedback {
    /// Generic NACK.
    pub const NACK: Self = Self::new("nack", "");
    /// NACK PLI.
    pub const NACK_PLI: Self = Self::new("nack", "pli");
    /// CCM FIR.
    pub const CCM_FIR: Self = Self::new("ccm", "fir");
    /// goog-remb
    pub const GOOG_REMB: Self = Self::new("goog-remb", "");
    /// transport-cc
    pub const TRANSPORT_CC: Self = Self::new("transport-cc", "");

    /// Create feedback entry from static strings.
    #[must_use]
    pub const fn new(r#type: &'static str, parameter: &'static str) -> Self {
        Self {
            r#type: Cow::Borrowed(r#type),
            parameter: Cow::Borrowed(parameter),
        }
    }
}

/// Provides information on the capabilities of a codec within the RTP capabilities. The list of
/// media codecs supported by the router and their settings is defined in the
/// `supported_rtp_capabilities.rs` file.
///
/// Exactly one [`RtpCodecCapability`] will be present for each supported combination of
/// parameters that requires a distinct value of `preferred_payload_type`. For example:
///
/// - Multiple H264 codecs, each with their own distinct `packetization-mode` and
///   `profile-level-id` values.
/// - Multiple VP9 codecs, each with their own distinct `profile-id` value.
///
/// [`RtpCodecCapability`] entries in the `media_codecs` vector of
/// [`RouterOptions`](crate::router::RouterOptions) do not require `preferred_payload_type` field
/// (if unset, a dynamic one will be allocated). If given, make sure it's in the 96-127 range,
/// values above 127 are rejected.
#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpCodecCapability {
    /// Media kind. If unset, derived from the type part of `mime_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,
    /// The codec MIME media type/subtype (e.g. 'audio/opus').
    pub mime_type: String,
    /// The preferred RTP payload type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_payload_type: Option<u8>,
    /// Codec clock rate expressed in Hertz.
    pub clock_rate: u32,
    /// The number of channels supported (e.g. two for stereo). Just for audio.
    /// Default 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u8>,
    /// Codec specific parameters.
    #[serde(default)]
    pub parameters: CodecParameters,
    /// Transport layer and codec-specific feedback messages for this codec.
    #[serde(default)]
    pub rtcp_feedback: Vec<RtcpFeedback>,
}

impl RtpCodecCapability {
    /// Media kind, either explicitly set or derived from `mime_type`.
    #[must_use]
    pub fn kind(&self) -> Option<MediaKind> {
        self.kind
            .or_else(|| MediaKind::from_mime_type(&self.mime_type))
    }

    /// Whether this is an RTX codec.
    #[must_use]
    pub fn is_rtx(&self) -> bool {
        is_rtx_mime_type(&self.mime_type)
    }
}

/// The RTP capabilities define what a router or an endpoint can receive at media level.
#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpCapabilities {
    /// Supported media and RTX codecs.
    #[serde(default)]
    pub codecs: Vec<RtpCodecCapability>,
    /// Supported RTP header extensions.
    #[serde(default)]
    pub header_extensions: Vec<RtpHeaderExtension>,
    /// Supported FEC mechanisms.
    #[serde(default)]
    pub fec_mechanisms: Vec<String>,
}

/// Provides information relating to supported header extensions. The list of RTP header
/// extensions supported by the router is defined in the `supported_rtp_capabilities.rs` file.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpHeaderExtension {
    /// Media kind. If unset, it's valid for all kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,
    /// The URI of the RTP header extension, as defined in RFC 5285.
    pub uri: String,
    /// The preferred numeric identifier that goes in the RTP packet. Must be unique.
    pub preferred_id: u16,
}

/// The RTP send parameters describe a media stream received by the router from an endpoint
/// through its corresponding producer.
///
/// Single encoding and multiple encodings (simulcast) are both allowed. In the latter case, each
/// entry in the encodings array must include a ssrc field or a rid field.
///
/// The RTP receive parameters describe a media stream as sent by the router to an endpoint
/// through its corresponding consumer. There is a single entry in the encodings array (even if
/// the corresponding producer uses simulcast), unless the consumer is a pipe consumer, in which
/// case all RTP streams of the producer are forwarded verbatim.
///
/// RTP receive parameters always have their ssrc values randomly generated, regardless of the
/// original RTP send parameters of the associated producer.
#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpParameters {
    /// The MID RTP extension value as defined in the BUNDLE specification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<String>,
    /// Media and RTX codecs in use.
    pub codecs: Vec<RtpCodecParameters>,
    /// RTP header extensions in use.
    #[serde(default)]
    pub header_extensions: Vec<RtpHeaderExtensionParameters>,
    /// Transmitted RTP streams and their settings.
    #[serde(default)]
    pub encodings: Vec<RtpEncodingParameters>,
    /// Parameters used for RTCP.
    #[serde(default)]
    pub rtcp: RtcpParameters,
}

/// Provides information on codec settings within the RTP parameters.
#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpCodecParameters {
    /// The codec MIME media type/subtype (e.g. `audio/opus`).
    pub mime_type: String,
    /// The value that goes in the RTP Payload Type Field. Must be unique.
    pub payload_type: u8,
    /// Codec clock rate expressed in Hertz.
    pub clock_rate: u32,
    /// The number of channels supported (e.g. two for stereo). Just for audio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u8>,
    /// Codec-specific parameters available for signaling.
    #[serde(default)]
    pub parameters: CodecParameters,
    /// Transport layer and codec-specific feedback messages for this codec.
    #[serde(default)]
    pub rtcp_feedback: Vec<RtcpFeedback>,
}

impl RtpCodecParameters {
    /// Whether this is an RTX codec.
    #[must_use]
    pub fn is_rtx(&self) -> bool {
        is_rtx_mime_type(&self.mime_type)
    }
}

/// RTX stream information. It must contain a numeric ssrc field indicating the RTX SSRC.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct RtpEncodingParametersRtx {
    /// The RTX SSRC.
    pub ssrc: u32,
}

/// Provides information relating to an encoding, which represents a media RTP stream and its
/// associated RTX stream (if any).
#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpEncodingParameters {
    /// The media SSRC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssrc: Option<u32>,
    /// The RID RTP extension value. Must be unique.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
    /// Codec payload type this encoding affects. If unset, first media codec is chosen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec_payload_type: Option<u8>,
    /// RTX stream information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtx: Option<RtpEncodingParametersRtx>,
    /// Whether discontinuous RTP transmission will be used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtx: Option<bool>,
    /// Number of spatial and temporal layers in the RTP stream (e.g. `L1T3`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalability_mode: Option<String>,
    /// Maximum number of bits per second to allow a track encoded with this encoding to use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bitrate: Option<u32>,
}

/// Defines a RTP header extension within the RTP parameters.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct RtpHeaderExtensionParameters {
    /// The URI of the RTP header extension, as defined in RFC 5285.
    pub uri: String,
    /// The numeric identifier that goes in the RTP packet. Must be unique.
    pub id: u16,
}

/// Provides information on RTCP settings within the RTP parameters.
///
/// Consumers always get `reduced_size` and `mux` enabled.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RtcpParameters {
    /// The Canonical Name (CNAME) used by RTCP (e.g. in SDES messages).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cname: Option<String>,
    /// Whether reduced size RTCP RFC 5506 is configured (if true) or compound RTCP
    /// as specified in RFC 3550 (if false). Default true.
    pub reduced_size: bool,
    /// Whether RTCP-mux is used. Default true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mux: Option<bool>,
}

impl Default for RtcpParameters {
    fn default() -> Self {
        Self {
            cname: None,
            reduced_size: true,
            mux: None,
        }
    }
}
