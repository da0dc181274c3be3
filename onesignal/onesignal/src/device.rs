use std::collections::BTreeMap;
use std::str::FromStr as _;

use log::warn;
use serde::{Deserialize, Serialize};

/// Device platform, which determines payload schema on OneSignal.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    /// ios - Apple devices
    Ios,
    /// android - Android devices
    Android,
}

impl Platform {
    /// Name of the field holding device tokens in OneSignal request body.
    pub fn token_field(self) -> &'static str {
        match self {
            Platform::Ios => "include_ios_tokens",
            Platform::Android => "include_android_reg_ids",
        }
    }
}

/// Device registration, Parse installation in most cases.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistration {
    /// Platform tag e.g. `ios` and `android`. Unsupported tags are kept as-is.
    #[serde(default)]
    pub device_type: String,
    /// Opaque device token. Empty if the installation has none.
    #[serde(default)]
    pub device_token: String,
}

impl DeviceRegistration {
    /// Creates a [`DeviceRegistration`].
    pub fn new<T, U>(device_type: T, device_token: U) -> Self
    where
        T: Into<String>,
        U: Into<String>,
    {
        Self {
            device_type: device_type.into(),
            device_token: device_token.into(),
        }
    }

    /// Parsed platform, `None` if the tag is not recognized.
    pub fn platform(&self) -> Option<Platform> {
        Platform::from_str(&self.device_type).ok()
    }
}

/// Groups device tokens by platform. Every platform in `valid` has an entry,
/// empty if no device is on it. Registrations without device token, or whose platform
/// is not in `valid`, are discarded. Order of tokens in each group follows `registrations`.
///
/// ```rust
/// # use onesignal::{classify, DeviceRegistration, Platform};
/// let registrations = vec![
///     DeviceRegistration::new("ios", "a"),
///     DeviceRegistration::new("web", "b"),
/// ];
/// let map = classify(&registrations, &[Platform::Ios, Platform::Android]);
/// assert_eq!(Some(&vec!["a".to_string()]), map.get(&Platform::Ios));
/// assert_eq!(Some(&vec![]), map.get(&Platform::Android));
/// ```
pub fn classify(
    registrations: &[DeviceRegistration],
    valid: &[Platform],
) -> BTreeMap<Platform, Vec<String>> {
    let mut map: BTreeMap<Platform, Vec<String>> =
        valid.iter().map(|p| (*p, Vec::new())).collect();
    for r in registrations {
        if r.device_token.is_empty() {
            warn!("drop {} device without device token", r.device_type);
            continue;
        }
        match r.platform().and_then(|p| map.get_mut(&p)) {
            Some(tokens) => tokens.push(r.device_token.clone()),
            None => warn!(
                "can not find sender for push type {}, drop device {}",
                r.device_type, r.device_token
            ),
        }
    }
    map
}
