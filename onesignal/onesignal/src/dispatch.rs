use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::{Platform, PlatformRequest, Transport, TransportError};

/// OneSignal can process 2000 devices at a time.
pub const CHUNK_SIZE: usize = 2000;

/// One outbound request: platform request and at most [`CHUNK_SIZE`] tokens.
#[derive(Debug)]
pub struct Batch<'a> {
    platform: Platform,
    request: &'a PlatformRequest,
    tokens: &'a [String],
}

impl<'a> Batch<'a> {
    /// Creates a [`Batch`], tokens are put under the field of the platform.
    pub fn new(platform: Platform, request: &'a PlatformRequest, tokens: &'a [String]) -> Self {
        Self {
            platform,
            request,
            tokens,
        }
    }

    /// Platform of the batch.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Device tokens of the batch.
    pub fn tokens(&self) -> &[String] {
        self.tokens
    }

    /// Number of device tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the batch carries no token.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Serialize for Batch<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Body<'a> {
            #[serde(flatten)]
            request: &'a PlatformRequest,
            #[serde(flatten)]
            tokens: BTreeMap<&'static str, &'a [String]>,
        }

        Body {
            request: self.request,
            tokens: BTreeMap::from([(self.platform.token_field(), self.tokens)]),
        }
        .serialize(serializer)
    }
}

/// Successful delivery to one platform.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Delivery {
    /// Platform which is delivered to.
    pub platform: Platform,
    /// Number of device tokens.
    pub tokens: usize,
    /// Number of batches sent.
    pub batches: usize,
}

/// Dispatch to one platform is aborted. Batches before `batch` were delivered.
#[derive(Error, Debug)]
#[error("failed to send batch {batch} (offset {offset}) to {platform}: {source}")]
pub struct DispatchError {
    /// Platform which the batch is sent to.
    pub platform: Platform,
    /// Index of the failed batch, starts from zero.
    pub batch: usize,
    /// Index of the first token in the failed batch.
    pub offset: usize,
    /// Why the batch failed.
    #[source]
    pub source: TransportError,
}

/// Result of dispatch to one platform.
pub type DispatchOutcome = Result<Delivery, DispatchError>;

/// Sends request to tokens in batches of [`CHUNK_SIZE`], one after another.
/// Stops at the first failed batch. Batches already sent are not rolled back.
pub async fn dispatch<T>(
    transport: &T,
    platform: Platform,
    request: &PlatformRequest,
    tokens: &[String],
) -> DispatchOutcome
where
    T: Transport + ?Sized,
{
    for (index, chunk) in tokens.chunks(CHUNK_SIZE).enumerate() {
        let offset = index * CHUNK_SIZE;
        debug!(
            "send batch {index} of {} tokens to {platform}, offset {offset}",
            chunk.len()
        );
        transport
            .submit(&Batch::new(platform, request, chunk))
            .await
            .map_err(|source| DispatchError {
                platform,
                batch: index,
                offset,
                source,
            })?;
    }
    let batches = tokens.len().div_ceil(CHUNK_SIZE);
    info!(
        "sent to {} {platform} devices in {batches} batches",
        tokens.len()
    );
    Ok(Delivery {
        platform,
        tokens: tokens.len(),
        batches,
    })
}
