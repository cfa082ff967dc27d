//! RTP capabilities supported by the media engine.
//!
//! Router capabilities are always a subset of this table: every configured media codec has to
//! match one of the codecs here, and header extensions and FEC mechanisms are taken verbatim.

use crate::rtp_parameters::{
    header_extension_uri, CodecParameters, MediaKind, RtcpFeedback, RtpCapabilities,
    RtpCodecCapability, RtpHeaderExtension,
};

const AUDIO_RTCP_FEEDBACK: [RtcpFeedback; 1] = [RtcpFeedback::TRANSPORT_CC];

const VIDEO_RTCP_FEEDBACK: [RtcpFeedback; 5] = [
    RtcpFeedback::NACK,
    RtcpFeedback::NACK_PLI,
    RtcpFeedback::CCM_FIR,
    RtcpFeedback::GOOG_REMB,
    RtcpFeedback::TRANSPORT_CC,
];

fn audio_codec(
    mime_type: &str,
    preferred_payload_type: Option<u8>,
    clock_rate: u32,
    channels: u8,
    rtcp_feedback: &[RtcpFeedback],
) -> RtpCodecCapability {
    RtpCodecCapability {
        kind: Some(MediaKind::Audio),
        mime_type: mime_type.to_string(),
        preferred_payload_type,
        clock_rate,
        channels: Some(channels),
        parameters: CodecParameters::default(),
        rtcp_feedback: rtcp_feedback.to_vec(),
    }
}

fn video_codec(mime_type: &str, parameters: CodecParameters) -> RtpCodecCapability {
    RtpCodecCapability {
        kind: Some(MediaKind::Video),
        mime_type: mime_type.to_string(),
        preferred_payload_type: None,
        clock_rate: 90000,
        channels: None,
        parameters,
        rtcp_feedback: VIDEO_RTCP_FEEDBACK.to_vec(),
    }
}

fn header_extension(kind: MediaKind, uri: &str, preferred_id: u16) -> RtpHeaderExtension {
    RtpHeaderExtension {
        kind: Some(kind),
        uri: uri.to_string(),
        preferred_id,
    }
}

/// Get RTP capabilities supported by the media engine.
///
/// The order of codecs matters: configured router codecs are matched against the first
/// compatible entry.
#[must_use]
pub fn get_supported_rtp_capabilities() -> RtpCapabilities {
    RtpCapabilities {
        codecs: vec![
            audio_codec("audio/opus", None, 48000, 2, &AUDIO_RTCP_FEEDBACK),
            audio_codec("audio/PCMU", Some(0), 8000, 1, &AUDIO_RTCP_FEEDBACK),
            audio_codec("audio/PCMA", Some(8), 8000, 1, &AUDIO_RTCP_FEEDBACK),
            audio_codec("audio/ISAC", None, 32000, 1, &AUDIO_RTCP_FEEDBACK),
            audio_codec("audio/ISAC", None, 16000, 1, &AUDIO_RTCP_FEEDBACK),
            audio_codec("audio/G722", Some(9), 8000, 1, &AUDIO_RTCP_FEEDBACK),
            audio_codec("audio/iLBC", None, 8000, 1, &AUDIO_RTCP_FEEDBACK),
            audio_codec("audio/SILK", None, 24000, 1, &AUDIO_RTCP_FEEDBACK),
            audio_codec("audio/SILK", None, 16000, 1, &AUDIO_RTCP_FEEDBACK),
            audio_codec("audio/SILK", None, 12000, 1, &AUDIO_RTCP_FEEDBACK),
            audio_codec("audio/SILK", None, 8000, 1, &AUDIO_RTCP_FEEDBACK),
            audio_codec("audio/CN", Some(13), 32000, 1, &[]),
            audio_codec("audio/CN", Some(13), 16000, 1, &[]),
            audio_codec("audio/CN", Some(13), 8000, 1, &[]),
            audio_codec("audio/telephone-event", None, 48000, 1, &[]),
            audio_codec("audio/telephone-event", None, 32000, 1, &[]),
            audio_codec("audio/telephone-event", None, 16000, 1, &[]),
            audio_codec("audio/telephone-event", None, 8000, 1, &[]),
            video_codec("video/VP8", CodecParameters::default()),
            video_codec("video/VP9", CodecParameters::default()),
            video_codec(
                "video/H264",
                CodecParameters::from([
                    ("packetization-mode", 1_u32.into()),
                    ("level-asymmetry-allowed", 1_u32.into()),
                ]),
            ),
            video_codec(
                "video/H264",
                CodecParameters::from([
                    ("packetization-mode", 0_u32.into()),
                    ("level-asymmetry-allowed", 1_u32.into()),
                ]),
            ),
            video_codec(
                "video/H265",
                CodecParameters::from([
                    ("packetization-mode", 1_u32.into()),
                    ("level-asymmetry-allowed", 1_u32.into()),
                ]),
            ),
            video_codec(
                "video/H265",
                CodecParameters::from([
                    ("packetization-mode", 0_u32.into()),
                    ("level-asymmetry-allowed", 1_u32.into()),
                ]),
            ),
        ],
        header_extensions: vec![
            header_extension(MediaKind::Audio, header_extension_uri::MID, 1),
            header_extension(MediaKind::Video, header_extension_uri::MID, 1),
            header_extension(MediaKind::Video, header_extension_uri::RTP_STREAM_ID, 2),
            header_extension(
                MediaKind::Video,
                header_extension_uri::REPAIRED_RTP_STREAM_ID,
                3,
            ),
            header_extension(MediaKind::Audio, header_extension_uri::ABS_SEND_TIME, 4),
            header_extension(MediaKind::Video, header_extension_uri::ABS_SEND_TIME, 4),
            // For audio transport-wide-cc-01 is only used when receiving media.
            header_extension(
                MediaKind::Audio,
                header_extension_uri::TRANSPORT_WIDE_CC_01,
                5,
            ),
            header_extension(
                MediaKind::Video,
                header_extension_uri::TRANSPORT_WIDE_CC_01,
                5,
            ),
            // TODO: Remove the draft URI once framemarking becomes an RFC.
            header_extension(MediaKind::Video, header_extension_uri::FRAME_MARKING_07, 6),
            header_extension(MediaKind::Video, header_extension_uri::FRAME_MARKING, 7),
            header_extension(MediaKind::Audio, header_extension_uri::AUDIO_LEVEL, 10),
            header_extension(MediaKind::Video, header_extension_uri::VIDEO_ORIENTATION, 11),
            header_extension(MediaKind::Video, header_extension_uri::TIME_OFFSET, 12),
        ],
        fec_mechanisms: vec![],
    }
}
