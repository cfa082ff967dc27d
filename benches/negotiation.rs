use criterion::{criterion_group, criterion_main, Criterion};
use mediasoup_ortc::prelude::*;

fn media_codecs() -> Vec<RtpCodecCapability> {
    vec![
        RtpCodecCapability {
            mime_type: "audio/opus".to_string(),
            clock_rate: 48000,
            channels: Some(2),
            parameters: CodecParameters::from([("foo", "111".into())]),
            ..RtpCodecCapability::default()
        },
        RtpCodecCapability {
            mime_type: "video/VP8".to_string(),
            clock_rate: 90000,
            ..RtpCodecCapability::default()
        },
        RtpCodecCapability {
            mime_type: "video/H264".to_string(),
            clock_rate: 90000,
            parameters: CodecParameters::from([
                ("level-asymmetry-allowed", 1_u32.into()),
                ("packetization-mode", 1_u32.into()),
                ("profile-level-id", "4d0032".into()),
                ("foo", "bar".into()),
            ]),
            ..RtpCodecCapability::default()
        },
    ]
}

fn create_ssrc() -> u32 {
    rand::random()
}

fn audio_producer_options() -> ProducerOptions {
    ProducerOptions::new(
        MediaKind::Audio,
        RtpParameters {
            mid: Some("AUDIO".to_string()),
            codecs: vec![RtpCodecParameters {
                mime_type: "audio/opus".to_string(),
                payload_type: 0,
                clock_rate: 48000,
                channels: Some(2),
                parameters: CodecParameters::from([
                    ("useinbandfec", 1_u32.into()),
                    ("usedtx", 1_u32.into()),
                ]),
                rtcp_feedback: vec![],
            }],
            encodings: vec![RtpEncodingParameters {
                ssrc: Some(create_ssrc()),
                ..RtpEncodingParameters::default()
            }],
            rtcp: RtcpParameters {
                cname: Some("audio-1".to_string()),
                ..RtcpParameters::default()
            },
            ..RtpParameters::default()
        },
    )
}

fn video_producer_options() -> ProducerOptions {
    ProducerOptions::new(
        MediaKind::Video,
        RtpParameters {
            mid: Some("VIDEO".to_string()),
            codecs: vec![
                RtpCodecParameters {
                    mime_type: "video/H264".to_string(),
                    payload_type: 112,
                    clock_rate: 90000,
                    parameters: CodecParameters::from([
                        ("packetization-mode", 1_u32.into()),
                        ("profile-level-id", "4d0032".into()),
                    ]),
                    rtcp_feedback: vec![
                        RtcpFeedback::NACK,
                        RtcpFeedback::NACK_PLI,
                        RtcpFeedback::GOOG_REMB,
                    ],
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
            encodings: (0..3)
                .map(|_| RtpEncodingParameters {
                    ssrc: Some(create_ssrc()),
                    rtx: Some(RtpEncodingParametersRtx {
                        ssrc: create_ssrc(),
                    }),
                    scalability_mode: Some("L1T3".to_string()),
                    ..RtpEncodingParameters::default()
                })
                .collect(),
            rtcp: RtcpParameters {
                cname: Some("video-1".to_string()),
                ..RtcpParameters::default()
            },
            ..RtpParameters::default()
        },
    )
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("negotiation");

    group.bench_function("router/create", |b| {
        b.iter(|| Router::new(RouterOptions::new(media_codecs())).expect("Failed to create router"))
    });

    let router = Router::new(RouterOptions::new(media_codecs())).expect("Failed to create router");

    group.bench_function("producer/create/audio", |b| {
        b.iter(|| {
            router
                .create_producer(audio_producer_options())
                .expect("Failed to produce audio")
        })
    });

    group.bench_function("producer/create/video", |b| {
        b.iter(|| {
            router
                .create_producer(video_producer_options())
                .expect("Failed to produce video")
        })
    });

    let video_producer = router
        .create_producer(video_producer_options())
        .expect("Failed to produce video");

    group.bench_function("consumer/video", |b| {
        b.iter(|| {
            video_producer
                .consumer_rtp_parameters(router.rtp_capabilities())
                .expect("Failed to get consumer RTP parameters")
        })
    });

    group.bench_function("pipe_consumer/video", |b| {
        b.iter(|| video_producer.pipe_consumer_rtp_parameters())
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
