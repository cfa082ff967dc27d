
use crate::ortc::{
    self, ConsumerRtpParametersError, ErrorKind, RtpMapping, RtpParametersMappingError,
    ValidationError,
};
use crate::router::RouterId;
use crate::rtp_parameters::{MediaKind, RtpCapabilities, RtpParameters};
use crate::uuid_based_wrapper_type;
use log::debug;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

uuid_based_wrapper_type!(
    /// [`Producer`] identifier.
    ProducerId
);

/// [`Producer`] options.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ProducerOptions {
    /// Media kind.
    pub kind: MediaKind,
    /// RTP parameters defining what the endpoint is sending.
    pub rtp_parameters: RtpParameters,
}

impl ProducerOptions {
    /// Create producer options for given kind and RTP parameters.
    #[must_use]
    pub fn new(kind: MediaKind, rtp_parameters: RtpParameters) -> Self {
        Self {
            kind,
            rtp_parameters,
        }
    }
}

/// Error that caused [`Router::create_producer`](crate::router::Router::create_producer) to
/// fail.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ProduceError {
    /// RTP parameters mapping error.
    #[error("RTP parameters mapping error: {0}")]
    FailedRtpParametersMapping(#[from] RtpParametersMappingError),
    /// Consumable RTP parameters can't be derived from producer RTP parameters.
    #[error("failed to derive consumable RTP parameters: {0}")]
    FailedConsumableRtpParameters(#[from] ValidationError),
}

impl ProduceError {
    /// Broad class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FailedRtpParametersMapping(error) => error.kind(),
            Self::FailedConsumableRtpParameters(_) => ErrorKind::Validation,
        }
    }
}

struct Inner {
    id: ProducerId,
    router_id: RouterId,
    kind: MediaKind,
    rtp_parameters: RtpParameters,
    rtp_mapping: RtpMapping,
    consumable_rtp_parameters: RtpParameters,
}

/// A producer represents an audio or video source being injected into a router.
///
/// Everything negotiated for a producer is computed once on creation, consumer negotiation
/// only reads it.
#[derive(Clone)]
pub struct Producer {
    inner: Arc<Inner>,
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("id", &self.inner.id)
            .field("router_id", &self.inner.router_id)
            .field("kind", &self.inner.kind)
            .field("rtp_parameters", &self.inner.rtp_parameters)
            .field("rtp_mapping", &self.inner.rtp_mapping)
            .field(
                "consumable_rtp_parameters",
                &self.inner.consumable_rtp_parameters,
            )
            .finish()
    }
}

impl Producer {
    pub(super) fn new(
        router_id: RouterId,
        router_rtp_capabilities: &RtpCapabilities,
        producer_options: ProducerOptions,
    ) -> Result<Self, ProduceError> {
        let ProducerOptions {
            kind,
            rtp_parameters,
        } = producer_options;

        let rtp_mapping =
            ortc::get_producer_rtp_parameters_mapping(&rtp_parameters, router_rtp_capabilities)?;

        let consumable_rtp_parameters = ortc::get_consumable_rtp_parameters(
            kind,
            &rtp_parameters,
            router_rtp_capabilities,
            &rtp_mapping,
        )?;

        let id = ProducerId::new();

        debug!("new() [id:{}, router_id:{}, kind:{}]", id, router_id, kind);

        Ok(Self {
            inner: Arc::new(Inner {
                id,
                router_id,
                kind,
                rtp_parameters,
                rtp_mapping,
                consumable_rtp_parameters,
            }),
        })
    }

    /// Producer id.
    #[must_use]
    pub fn id(&self) -> ProducerId {
        self.inner.id
    }

    /// Id of the router this producer belongs to.
    #[must_use]
    pub fn router_id(&self) -> RouterId {
        self.inner.router_id
    }

    /// Media kind.
    #[must_use]
    pub fn kind(&self) -> MediaKind {
        self.inner.kind
    }

    /// Producer RTP parameters as given on creation.
    #[must_use]
    pub fn rtp_parameters(&self) -> &RtpParameters {
        &self.inner.rtp_parameters
    }

    /// Mapping of producer payload types, header extension ids and SSRCs to router ones.
    #[must_use]
    pub fn rtp_mapping(&self) -> &RtpMapping {
        &self.inner.rtp_mapping
    }

    /// RTP parameters all consumers of this producer are derived from.
    #[must_use]
    pub fn consumable_rtp_parameters(&self) -> &RtpParameters {
        &self.inner.consumable_rtp_parameters
    }

    /// Negotiate RTP parameters for a consumer with given RTP capabilities.
    pub fn consumer_rtp_parameters(
        &self,
        rtp_capabilities: &RtpCapabilities,
    ) -> Result<RtpParameters, ConsumerRtpParametersError> {
        ortc::get_consumer_rtp_parameters(&self.inner.consumable_rtp_parameters, rtp_capabilities)
    }

    /// RTP parameters for a consumer on a pipe transport, which forwards every stream of this
    /// producer as is.
    #[must_use]
    pub fn pipe_consumer_rtp_parameters(&self) -> RtpParameters {
        ortc::get_pipe_consumer_rtp_parameters(&self.inner.consumable_rtp_parameters)
    }
}
