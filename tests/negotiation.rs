use mediasoup_ortc::ortc;
use mediasoup_ortc::prelude::*;
use mediasoup_ortc::rtp_parameters::header_extension_uri;
use std::env;

fn init() {
    let mut builder = env_logger::builder();
    if env::var(env_logger::DEFAULT_FILTER_ENV).is_err() {
        builder.filter_level(log::LevelFilter::Off);
    }
    let _ = builder.is_test(true).try_init();
}

fn media_codecs() -> Vec<RtpCodecCapability> {
    vec![
        RtpCodecCapability {
            kind: Some(MediaKind::Audio),
            mime_type: "audio/opus".to_string(),
            clock_rate: 48000,
            channels: Some(2),
            parameters: CodecParameters::from([("useinbandfec", 1_u32.into())]),
            ..RtpCodecCapability::default()
        },
        RtpCodecCapability {
            kind: Some(MediaKind::Video),
            mime_type: "video/VP8".to_string(),
            clock_rate: 90000,
            ..RtpCodecCapability::default()
        },
        RtpCodecCapability {
            kind: Some(MediaKind::Video),
            mime_type: "video/H264".to_string(),
            clock_rate: 90000,
            parameters: CodecParameters::from([
                ("level-asymmetry-allowed", 1_u32.into()),
                ("packetization-mode", 1_u32.into()),
                ("profile-level-id", "4d0032".into()),
            ]),
            ..RtpCodecCapability::default()
        },
    ]
}

fn h264_rtp_parameters() -> RtpParameters {
    RtpParameters {
        mid: Some("1".to_string()),
        codecs: vec![
            RtpCodecParameters {
                mime_type: "video/H264".to_string(),
                payload_type: 112,
                clock_rate: 90000,
                parameters: CodecParameters::from([
                    ("packetization-mode", 1_u32.into()),
                    ("profile-level-id", "4d0032".into()),
                ]),
                rtcp_feedback: vec![RtcpFeedback::NACK, RtcpFeedback::NACK_PLI],
                ..RtpCodecParameters::default()
            },
            RtpCodecParameters {
                mime_type: "video/rtx".to_string(),
                payload_type: 113,
                clock_rate: 90000,
                parameters: CodecParameters::from([("apt", 112_u8.into())]),
                ..RtpCodecParameters::default()
            },
        ],
        header_extensions: vec![
            RtpHeaderExtensionParameters {
                uri: header_extension_uri::MID.to_string(),
                id: 10,
            },
            RtpHeaderExtensionParameters {
                uri: header_extension_uri::VIDEO_ORIENTATION.to_string(),
                id: 13,
            },
        ],
        encodings: vec![
            RtpEncodingParameters {
                ssrc: Some(22222222),
                rtx: Some(RtpEncodingParametersRtx { ssrc: 22222223 }),
                scalability_mode: Some("L1T3".to_string()),
                max_bitrate: Some(500_000),
                ..RtpEncodingParameters::default()
            },
            RtpEncodingParameters {
                ssrc: Some(22222224),
                rtx: Some(RtpEncodingParametersRtx { ssrc: 22222225 }),
                scalability_mode: Some("L1T3".to_string()),
                max_bitrate: Some(1_500_000),
                ..RtpEncodingParameters::default()
            },
        ],
        rtcp: RtcpParameters {
            cname: Some("FOOBAR".to_string()),
            ..RtcpParameters::default()
        },
    }
}

/// Capabilities of a typical browser endpoint.
fn consumer_rtp_capabilities() -> RtpCapabilities {
    serde_json::from_value(serde_json::json!({
        "codecs": [
            {
                "kind": "audio",
                "mimeType": "audio/opus",
                "preferredPayloadType": 100,
                "clockRate": 48000,
                "channels": 2
            },
            {
                "kind": "video",
                "mimeType": "video/H264",
                "preferredPayloadType": 103,
                "clockRate": 90000,
                "parameters": {
                    "level-asymmetry-allowed": 1,
                    "packetization-mode": 1,
                    "profile-level-id": "4d001f"
                },
                "rtcpFeedback": [
                    { "type": "nack" },
                    { "type": "nack", "parameter": "pli" },
                    { "type": "goog-remb" }
                ]
            },
            {
                "kind": "video",
                "mimeType": "video/rtx",
                "preferredPayloadType": 104,
                "clockRate": 90000,
                "parameters": { "apt": 103 }
            }
        ],
        "headerExtensions": [
            {
                "kind": "video",
                "uri": "urn:3gpp:video-orientation",
                "preferredId": 11
            },
            {
                "kind": "video",
                "uri": "urn:ietf:params:rtp-hdrext:toffset",
                "preferredId": 12
            }
        ]
    }))
    .expect("Failed to parse consumer RTP capabilities")
}

#[test]
fn produce_and_consume_h264_simulcast() {
    init();

    let router = Router::new(RouterOptions::new(media_codecs())).expect("Failed to create router");

    let producer = router
        .create_producer(ProducerOptions::new(MediaKind::Video, h264_rtp_parameters()))
        .expect("Failed to create producer");

    // opus: 100, VP8: 101, VP8 RTX: 102, H264: 103, H264 RTX: 104.
    let consumable_rtp_parameters = producer.consumable_rtp_parameters();
    assert_eq!(
        consumable_rtp_parameters
            .codecs
            .iter()
            .map(|codec| codec.payload_type)
            .collect::<Vec<_>>(),
        vec![103, 104]
    );
    assert_eq!(
        consumable_rtp_parameters.codecs[1].parameters.get_number("apt"),
        Some(103)
    );

    let consumer_rtp_capabilities = consumer_rtp_capabilities();
    assert!(router.can_consume(&producer, &consumer_rtp_capabilities));

    let consumer_rtp_parameters = producer
        .consumer_rtp_parameters(&consumer_rtp_capabilities)
        .expect("Failed to get consumer RTP parameters");

    assert_eq!(consumer_rtp_parameters.codecs.len(), 2);
    assert_eq!(
        consumer_rtp_parameters.codecs[0].rtcp_feedback,
        vec![
            RtcpFeedback::NACK,
            RtcpFeedback::NACK_PLI,
            RtcpFeedback::GOOG_REMB
        ]
    );
    assert_eq!(
        consumer_rtp_parameters
            .header_extensions
            .iter()
            .map(|ext| ext.id)
            .collect::<Vec<_>>(),
        vec![11, 12]
    );

    let encoding = &consumer_rtp_parameters.encodings[0];
    assert_eq!(consumer_rtp_parameters.encodings.len(), 1);
    assert!(encoding.ssrc.is_some());
    assert!(encoding.rtx.is_some());
    assert_eq!(encoding.scalability_mode.as_deref(), Some("S2T3"));
    assert_eq!(encoding.max_bitrate, Some(1_500_000));
    assert_eq!(consumer_rtp_parameters.rtcp.cname.as_deref(), Some("FOOBAR"));

    let pipe_consumer_rtp_parameters = producer.pipe_consumer_rtp_parameters();
    assert_eq!(pipe_consumer_rtp_parameters.codecs.len(), 1);
    assert_eq!(
        pipe_consumer_rtp_parameters.codecs[0].rtcp_feedback,
        vec![RtcpFeedback::NACK_PLI, RtcpFeedback::CCM_FIR]
    );
    assert!(pipe_consumer_rtp_parameters
        .encodings
        .iter()
        .all(|encoding| encoding.rtx.is_none()));
}

#[test]
fn consume_without_compatible_codecs() {
    init();

    let router = Router::new(RouterOptions::new(media_codecs())).expect("Failed to create router");
    let producer = router
        .create_producer(ProducerOptions::new(MediaKind::Video, h264_rtp_parameters()))
        .expect("Failed to create producer");

    let mut consumer_rtp_capabilities = consumer_rtp_capabilities();
    // Constrained Baseline only.
    consumer_rtp_capabilities.codecs[1]
        .parameters
        .insert("profile-level-id", "42e01f");

    assert!(!router.can_consume(&producer, &consumer_rtp_capabilities));

    let error = producer
        .consumer_rtp_parameters(&consumer_rtp_capabilities)
        .unwrap_err();
    assert_eq!(error, ConsumerRtpParametersError::NoCompatibleMediaCodecs);
    assert_eq!(error.kind(), ErrorKind::Unsupported);
}

#[test]
fn consumer_rtp_parameters_serialize_to_camel_case() {
    init();

    let router = Router::new(RouterOptions::new(media_codecs())).expect("Failed to create router");
    let producer = router
        .create_producer(ProducerOptions::new(MediaKind::Video, h264_rtp_parameters()))
        .expect("Failed to create producer");

    let value = serde_json::to_value(producer.pipe_consumer_rtp_parameters())
        .expect("Failed to serialize RTP parameters");

    assert_eq!(value["codecs"][0]["mimeType"], "video/H264");
    assert_eq!(value["codecs"][0]["payloadType"], 103);
    assert_eq!(value["rtcp"]["reducedSize"], true);
    assert!(value.get("mid").is_none());

    let mapping = serde_json::to_value(producer.rtp_mapping()).expect("Failed to serialize mapping");
    assert_eq!(mapping["codecs"][0]["mappedPayloadType"], 103);

    let rtp_mapping: RtpMapping =
        serde_json::from_value(mapping).expect("Failed to deserialize mapping");
    assert_eq!(&rtp_mapping, producer.rtp_mapping());
}

#[test]
fn router_capabilities_exhaustion() {
    init();

    let media_codecs: Vec<_> = (0..45)
        .map(|_| RtpCodecCapability {
            mime_type: "video/VP8".to_string(),
            clock_rate: 90000,
            ..RtpCodecCapability::default()
        })
        .collect();

    let error = ortc::generate_router_rtp_capabilities(&media_codecs).unwrap_err();
    assert_eq!(error, RtpCapabilitiesError::CannotAllocate);
    assert_eq!(error.kind(), ErrorKind::ResourceExhaustion);
}
