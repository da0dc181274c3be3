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

//! osp is a command line application to send notifications through OneSignal.
//!
//! If OneSignal app ID is "app" and REST API key is "key",
//!
//! ```
//! $ osp --app-id app --api-key key -m message --ios token1 --android token2
//! ```
//!
//! Or you can set environment variables instead,
//!
//! ```
//! $ export ONESIGNAL_APP_ID=app
//! $ export ONESIGNAL_API_KEY=key
//! $ osp -m message --devices installations.json
//! ```
//!
//! Payload in Parse push format can be given with `--payload` or piped into standard input,
//!
//! ```
//! $ echo '{"data":{"alert":"hi","badge":"Increment"}}' | osp --ios token
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context as _};
use clap::Parser;
use log::{debug, Level};
use logging_timer::{finish, stimer};
use serde_json::Value;

use onesignal::{Config, DeviceRegistration, NotificationPayload, Platform, PushAdapter};

#[doc(hidden)]
#[derive(Parser)]
#[clap(about, author, version)]
struct Opts {
    /// OneSignal app ID. <https://documentation.onesignal.com/docs/keys-and-ids>
    #[clap(long, env = "ONESIGNAL_APP_ID")]
    app_id: String,
    /// OneSignal REST API key. <https://documentation.onesignal.com/docs/keys-and-ids>
    #[clap(long, env = "ONESIGNAL_API_KEY")]
    api_key: String,
    /// OneSignal API host.
    #[clap(long, env = "ONESIGNAL_BASE_URL", default_value = Config::DEFAULT_BASE_URL)]
    base_url: String,
    /// Timeout of each request in seconds.
    #[clap(long)]
    timeout: Option<u64>,
    /// Verbose.
    #[clap(short, long)]
    verbose: bool,
    /// Push payload in JSON e.g. {"data":{"alert":"hi"}}. Read from standard input if piped.
    #[clap(short, long)]
    payload: Option<PathBuf>,
    /// Devices in JSON e.g. [{"deviceType":"ios","deviceToken":"token"}].
    #[clap(short, long)]
    devices: Option<PathBuf>,
    /// iOS device token, can be given multiple times.
    #[clap(long)]
    ios: Vec<String>,
    /// Android registration ID, can be given multiple times.
    #[clap(long)]
    android: Vec<String>,
    /// Your message.
    #[clap(short, long)]
    message: Option<String>,
    /// Your message's title.
    #[clap(long)]
    title: Option<String>,
    /// iOS badge, a number or "Increment".
    #[clap(long)]
    badge: Option<String>,
    /// iOS sound.
    #[clap(long)]
    sound: Option<String>,
    /// Deep link opened when notification is clicked.
    #[clap(long)]
    uri: Option<String>,
    /// Image shown with notification.
    #[clap(long)]
    image_url: Option<String>,
    /// Schedule notification for future delivery e.g. "2015-09-24 14:00:00 GMT-0700".
    #[clap(long)]
    push_time: Option<String>,
}

impl Opts {
    fn config(&self) -> anyhow::Result<Config> {
        let config = Config::new(self.app_id.as_str(), self.api_key.as_str())?
            .with_base_url(&self.base_url)?;
        Ok(match self.timeout {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        })
    }

    /// Overrides payload with command line options.
    fn merge_payload(&self, mut payload: NotificationPayload) -> NotificationPayload {
        let fields = [
            ("alert", &self.message),
            ("title", &self.title),
            ("sound", &self.sound),
            ("uri", &self.uri),
            ("image_url", &self.image_url),
            ("push_time", &self.push_time),
        ];
        for (key, value) in fields {
            if let Some(v) = value {
                payload.data.insert(key.to_string(), Value::from(v.as_str()));
            }
        }
        if let Some(ref b) = self.badge {
            payload.data.insert("badge".to_string(), badge_value(b));
        }
        payload
    }

    fn flag_registrations(&self) -> Vec<DeviceRegistration> {
        let ios = self.ios.iter().map(|t| (Platform::Ios, t));
        let android = self.android.iter().map(|t| (Platform::Android, t));
        ios.chain(android)
            .map(|(p, t)| DeviceRegistration::new(p.to_string(), t.clone()))
            .collect()
    }
}

/// "Increment" is kept, numbers are sent as numbers.
fn badge_value(badge: &str) -> Value {
    badge
        .parse::<i64>()
        .map_or_else(|_| Value::from(badge), Value::from)
}

fn read_payload(opts: &Opts) -> anyhow::Result<NotificationPayload> {
    use std::io::Read as _;

    let content = if let Some(ref p) = opts.payload {
        debug!("load payload from {p:?}");
        fs::read_to_string(p).with_context(|| format!("failed to read {p:?}"))?
    } else if atty::isnt(atty::Stream::Stdin) {
        debug!("load payload from standard input");
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        String::new()
    };

    if content.trim().is_empty() {
        return Ok(NotificationPayload::default());
    }
    serde_json::from_str(&content).context("malformed payload")
}

fn read_registrations(opts: &Opts) -> anyhow::Result<Vec<DeviceRegistration>> {
    let mut registrations: Vec<DeviceRegistration> = match opts.devices {
        Some(ref p) => {
            debug!("load devices from {p:?}");
            let content = fs::read_to_string(p).with_context(|| format!("failed to read {p:?}"))?;
            serde_json::from_str(&content).context("malformed devices")?
        }
        None => vec![],
    };
    registrations.extend(opts.flag_registrations());
    Ok(registrations)
}

#[doc(hidden)]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let opts: Opts = Opts::parse();

    let config = opts.config()?;
    let payload = opts.merge_payload(read_payload(&opts)?);
    let registrations = read_registrations(&opts)?;
    if registrations.is_empty() {
        bail!("no device is given, use --devices, --ios or --android");
    }

    let adapter = PushAdapter::new(&config)?;

    let tmr = stimer!(Level::Debug; "SEND");
    let report = adapter.send(&payload, &registrations).await;
    finish!(tmr);

    if opts.verbose {
        for outcome in report.outcomes() {
            match outcome {
                Ok(d) => println!("{}: {} devices in {} batches", d.platform, d.tokens, d.batches),
                Err(e) => println!("{}: {e}", e.platform),
            }
        }
    }
    report.into_result()?;
    Ok(())
}
