//! A router holds the RTP capabilities negotiated from its configured media codecs and is the
//! entry point for producer mapping and consumer negotiation.
//!
//! Negotiation state is immutable once created: [`Router`] and [`Producer`] are cheap to clone
//! and can be shared across threads, every consumer negotiation works on its own copy of the
//! data it returns.

pub mod producer;

use crate::ortc::{self, RtpCapabilitiesError};
use crate::router::producer::{ProduceError, Producer, ProducerOptions};
use crate::rtp_parameters::{RtpCapabilities, RtpCodecCapability};
use crate::uuid_based_wrapper_type;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

uuid_based_wrapper_type!(
    /// [`Router`] identifier.
    RouterId
);

/// [`Router`] options.
///
/// Can be loaded from the same JSON shape as used by mediasoup:
/// `{"mediaCodecs": [{"kind": "audio", "mimeType": "audio/opus", "clockRate": 48000, ...}]}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct RouterOptions {
    /// Router media codecs, must not be empty.
    pub media_codecs: Vec<RtpCodecCapability>,
}

impl RouterOptions {
    /// Create router options with given list of declared media codecs.
    #[must_use]
    pub fn new(media_codecs: Vec<RtpCodecCapability>) -> Self {
        Self { media_codecs }
    }
}

struct Inner {
    id: RouterId,
    rtp_capabilities: RtpCapabilities,
}

impl Drop for Inner {
    fn drop(&mut self) {
        debug!("drop() [id:{}]", self.id);
    }
}

/// A router enables injection, selection and forwarding of media streams through producers and
/// consumers created on it.
#[derive(Clone)]
#[must_use = "Router has no side effects, dropping it right away is pointless"]
pub struct Router {
    inner: Arc<Inner>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("id", &self.inner.id)
            .field("rtp_capabilities", &self.inner.rtp_capabilities)
            .finish()
    }
}

impl Router {
    /// Create a new router with RTP capabilities negotiated against the media engine
    /// supported capabilities.
    pub fn new(router_options: RouterOptions) -> Result<Self, RtpCapabilitiesError> {
        let rtp_capabilities = ortc::generate_router_rtp_capabilities(&router_options.media_codecs)?;

        Ok(Self::from_rtp_capabilities(rtp_capabilities))
    }

    /// Same as [`Router::new()`], but negotiates against explicitly provided supported RTP
    /// capabilities instead of the built-in table.
    pub fn with_supported_rtp_capabilities(
        router_options: RouterOptions,
        supported_rtp_capabilities: &RtpCapabilities,
    ) -> Result<Self, RtpCapabilitiesError> {
        let rtp_capabilities = ortc::generate_router_rtp_capabilities_with_supported(
            &router_options.media_codecs,
            supported_rtp_capabilities,
        )?;

        Ok(Self::from_rtp_capabilities(rtp_capabilities))
    }

    fn from_rtp_capabilities(rtp_capabilities: RtpCapabilities) -> Self {
        let id = RouterId::new();

        debug!(
            "new() [id:{}, codecs:{}]",
            id,
            rtp_capabilities.codecs.len()
        );

        Self {
            inner: Arc::new(Inner {
                id,
                rtp_capabilities,
            }),
        }
    }

    /// Router id.
    #[must_use]
    pub fn id(&self) -> RouterId {
        self.inner.id
    }

    /// RTP capabilities of the router. These capabilities are typically needed by clients to
    /// compute their sending RTP parameters.
    #[must_use]
    pub fn rtp_capabilities(&self) -> &RtpCapabilities {
        &self.inner.rtp_capabilities
    }

    /// Create a producer for media sent with given RTP parameters.
    ///
    /// Maps producer payload types, header extension ids and SSRCs to router ones and derives
    /// parameters consumers of this producer will be negotiated from.
    pub fn create_producer(
        &self,
        producer_options: ProducerOptions,
    ) -> Result<Producer, ProduceError> {
        debug!("create_producer() [kind:{}]", producer_options.kind);

        Producer::new(self.id(), &self.inner.rtp_capabilities, producer_options)
    }

    /// Check whether the given RTP capabilities are valid to consume the given producer.
    #[must_use]
    pub fn can_consume(&self, producer: &Producer, rtp_capabilities: &RtpCapabilities) -> bool {
        if producer.router_id() != self.id() {
            warn!(
                "can_consume() | producer belongs to another router [producer_id:{}]",
                producer.id()
            );

            return false;
        }

        ortc::can_consume(producer.consumable_rtp_parameters(), rtp_capabilities)
    }
}
