#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

//! OneSignal push adapter. Classifies devices by platform, transforms Parse push payload
//! into OneSignal schema and sends it in batches of 2000 devices.
//! <https://documentation.onesignal.com/reference/create-notification>

use futures::future::join_all;
use log::{error, info};

pub use config::{Config, ConfigError};
pub use device::{classify, DeviceRegistration, Platform};
pub use dispatch::{dispatch, Batch, Delivery, DispatchError, DispatchOutcome, CHUNK_SIZE};
pub use payload::{
    transform, transform_at, BadgeType, Localized, NotificationPayload, PlatformRequest,
};
pub use transport::{HttpTransport, Transport, TransportError, NOTIFICATIONS_PATH};

mod config;
mod device;
mod dispatch;
mod payload;
mod transport;

/// Platforms which OneSignal adapter can send to.
pub const VALID_PLATFORMS: [Platform; 2] = [Platform::Ios, Platform::Android];

/// Sends notifications to OneSignal through a [`Transport`].
#[derive(Debug)]
pub struct PushAdapter<T = HttpTransport> {
    transport: T,
}

impl PushAdapter<HttpTransport> {
    /// Creates a [`PushAdapter`] posting to OneSignal over HTTPS.
    ///
    /// ```rust
    /// # use onesignal::{Config, PushAdapter};
    /// let config = Config::new("app-id", "api-key").unwrap();
    /// let adapter = PushAdapter::new(&config).unwrap();
    /// ```
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::with_transport(HttpTransport::new(config)?))
    }
}

impl<T> PushAdapter<T>
where
    T: Transport,
{
    /// Creates a [`PushAdapter`] with custom [`Transport`].
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Platforms which can be sent to.
    pub fn valid_platforms(&self) -> &'static [Platform] {
        &VALID_PLATFORMS
    }

    /// Sends payload to devices. Platforms are dispatched concurrently and independently,
    /// failure of one platform does not cancel the others.
    ///
    /// Registrations of unsupported platforms are dropped.
    pub async fn send(
        &self,
        payload: &NotificationPayload,
        registrations: &[DeviceRegistration],
    ) -> SendReport {
        let map = classify(registrations, self.valid_platforms());

        let tasks = map
            .into_iter()
            .filter(|(_, tokens)| !tokens.is_empty())
            .map(|(platform, tokens)| async move {
                let request = transform(platform, payload);
                dispatch(&self.transport, platform, &request, &tokens).await
            });
        let outcomes = join_all(tasks).await;

        let report = SendReport { outcomes };
        for e in report.failures() {
            error!("{e}");
        }
        info!(
            "{} of {} platforms succeeded",
            report.deliveries().count(),
            report.outcomes.len()
        );
        report
    }
}

/// Outcomes of every platform which is sent to.
#[derive(Debug, Default)]
pub struct SendReport {
    outcomes: Vec<DispatchOutcome>,
}

impl SendReport {
    /// Outcomes in platform order. Platforms without devices are absent.
    pub fn outcomes(&self) -> &[DispatchOutcome] {
        &self.outcomes
    }

    /// Outcome of the platform, `None` if nothing is sent to it.
    pub fn outcome(&self, platform: Platform) -> Option<&DispatchOutcome> {
        self.outcomes.iter().find(|o| match o {
            Ok(d) => d.platform == platform,
            Err(e) => e.platform == platform,
        })
    }

    /// Successful deliveries.
    pub fn deliveries(&self) -> impl Iterator<Item = &Delivery> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    /// Failed platforms.
    pub fn failures(&self) -> impl Iterator<Item = &DispatchError> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }

    /// Whether every platform succeeded. Also true when nothing is sent.
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Deliveries, or the first failure if any platform failed.
    pub fn into_result(self) -> Result<Vec<Delivery>, DispatchError> {
        self.outcomes.into_iter().collect()
    }
}
