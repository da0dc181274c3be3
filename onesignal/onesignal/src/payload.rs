use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Platform;

/// Push body from Parse. Notification content lives under `data`,
/// other top-level keys e.g. `where` and `expiration_time` are ignored.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct NotificationPayload {
    /// Notification content: `alert`, `title`, `badge`, `sound` etc.
    /// and custom keys which are forwarded as they are.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl NotificationPayload {
    /// Creates a [`NotificationPayload`] from notification content.
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

impl From<Map<String, Value>> for NotificationPayload {
    fn from(data: Map<String, Value>) -> Self {
        Self::new(data)
    }
}

/// Localized text. Only English is filled.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Localized {
    /// English
    pub en: Value,
}

/// How iOS badge is changed. <https://documentation.onesignal.com/reference/push-channel-properties#badges>
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, strum::Display)]
pub enum BadgeType {
    /// Increase badge count by `ios_badgeCount`
    Increase,
    /// Set badge count to `ios_badgeCount`
    SetTo,
}

/// Request body for one platform, without app ID and device tokens.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PlatformRequest {
    /// Title, from `title`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headings: Option<Localized>,
    /// Message, from `alert`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<Localized>,
    /// Scheduled time, from `push_time`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_after: Option<Value>,
    /// Deep link, from `uri`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Value>,
    /// Action buttons, from `buttons`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Value>,
    /// Android only. Image, from `image_url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub big_picture: Option<Value>,
    /// iOS only. Image keyed by epoch milliseconds, from `image_url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ios_attachments: Option<BTreeMap<String, Value>>,
    /// iOS only. From `badge`.
    #[serde(rename = "ios_badgeType", skip_serializing_if = "Option::is_none")]
    pub ios_badge_type: Option<BadgeType>,
    /// iOS only. From `badge`.
    #[serde(rename = "ios_badgeCount", skip_serializing_if = "Option::is_none")]
    pub ios_badge_count: Option<Value>,
    /// iOS only. From `sound`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ios_sound: Option<Value>,
    /// iOS only. From `content-available`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_available: Option<bool>,
    /// iOS only. From `mutable-content`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutable_content: Option<bool>,
    /// Keys which are not transformed.
    pub data: Map<String, Value>,
}

/// Transforms payload into request body of the platform.
/// Transformed keys are removed from `data` of the request.
pub fn transform(platform: Platform, payload: &NotificationPayload) -> PlatformRequest {
    transform_at(platform, payload, Utc::now().timestamp_millis())
}

/// Same as [`transform`], with iOS attachment keyed by the given timestamp.
pub fn transform_at(
    platform: Platform,
    payload: &NotificationPayload,
    timestamp_millis: i64,
) -> PlatformRequest {
    let mut data = payload.data.clone();
    let mut request = PlatformRequest::default();

    if platform == Platform::Ios {
        if let Some(badge) = take_truthy(&mut data, "badge") {
            if badge.as_str() == Some("Increment") {
                request.ios_badge_type = Some(BadgeType::Increase);
                request.ios_badge_count = Some(Value::from(1));
            } else {
                request.ios_badge_type = Some(BadgeType::SetTo);
                request.ios_badge_count = Some(badge);
            }
        }
    }

    request.headings = take_truthy(&mut data, "title").map(|en| Localized { en });
    request.contents = take_truthy(&mut data, "alert").map(|en| Localized { en });
    request.send_after = take_truthy(&mut data, "push_time");

    match platform {
        Platform::Ios => {
            request.ios_sound = take_truthy(&mut data, "sound");
            request.url = take_truthy(&mut data, "uri");
            if take_one(&mut data, "content-available") {
                request.content_available = Some(true);
            }
            if take_one(&mut data, "mutable-content") {
                request.mutable_content = Some(true);
            }
            request.ios_attachments = take_truthy(&mut data, "image_url")
                .map(|image| BTreeMap::from([(timestamp_millis.to_string(), image)]));
        }
        Platform::Android => {
            request.big_picture = take_truthy(&mut data, "image_url");
            // uri is copied but stays in data on Android
            request.url = data.get("uri").filter(|v| is_truthy(v)).cloned();
        }
    }

    request.buttons = take_truthy(&mut data, "buttons");
    request.data = data;
    request
}

fn take_truthy(data: &mut Map<String, Value>, key: &str) -> Option<Value> {
    if data.get(key).map_or(false, is_truthy) {
        data.remove(key)
    } else {
        None
    }
}

fn take_one(data: &mut Map<String, Value>, key: &str) -> bool {
    let matched = data.get(key).map_or(false, is_one);
    if matched {
        data.remove(key);
    }
    matched
}

/// `null`, `false`, `0` and `""` are treated as absent.
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `1`, `1.0`, `"1"` and `true` are all equal to one.
fn is_one(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => s.trim().parse::<f64>().map_or(false, |f| f == 1.0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    const NOW: i64 = 1_600_000_000_000;

    fn payload(data: Value) -> NotificationPayload {
        serde_json::from_value(json!({ "data": data })).unwrap()
    }

    fn ios(data: Value) -> Value {
        serde_json::to_value(transform_at(Platform::Ios, &payload(data), NOW)).unwrap()
    }

    fn android(data: Value) -> Value {
        serde_json::to_value(transform_at(Platform::Android, &payload(data), NOW)).unwrap()
    }

    #[test]
    fn t_ios_full() {
        let body = ios(json!({
            "badge": 5,
            "title": "title",
            "alert": "alert",
            "sound": "default",
            "content-available": 1,
            "push_time": "2020-09-13T12:26:40Z",
            "uri": "app://path",
            "mutable-content": 1,
            "image_url": "https://example.com/image.png",
            "buttons": [{"id": "id", "text": "text"}],
            "key": "value",
        }));
        assert_eq!(
            json!({
                "headings": {"en": "title"},
                "contents": {"en": "alert"},
                "send_after": "2020-09-13T12:26:40Z",
                "url": "app://path",
                "buttons": [{"id": "id", "text": "text"}],
                "ios_attachments": {"1600000000000": "https://example.com/image.png"},
                "ios_badgeType": "SetTo",
                "ios_badgeCount": 5,
                "ios_sound": "default",
                "content_available": true,
                "mutable_content": true,
                "data": {"key": "value"},
            }),
            body
        );
    }

    #[test]
    fn t_android_full() {
        let body = android(json!({
            "badge": 5,
            "title": "title",
            "alert": "alert",
            "sound": "default",
            "content-available": 1,
            "push_time": "2020-09-13T12:26:40Z",
            "uri": "app://path",
            "mutable-content": 1,
            "image_url": "https://example.com/image.png",
            "buttons": [{"id": "id", "text": "text"}],
        }));
        assert_eq!(
            json!({
                "headings": {"en": "title"},
                "contents": {"en": "alert"},
                "send_after": "2020-09-13T12:26:40Z",
                "url": "app://path",
                "buttons": [{"id": "id", "text": "text"}],
                "big_picture": "https://example.com/image.png",
                "data": {
                    "badge": 5,
                    "sound": "default",
                    "content-available": 1,
                    "mutable-content": 1,
                    "uri": "app://path",
                },
            }),
            body
        );
    }

    #[test]
    fn t_ios_badge_increment() {
        let body = ios(json!({"badge": "Increment"}));
        assert_eq!("Increase", body["ios_badgeType"]);
        assert_eq!(1, body["ios_badgeCount"]);
        assert!(body["data"].as_object().unwrap().is_empty());
    }

    #[test]
    fn t_ios_badge_set_to() {
        let body = ios(json!({"badge": 5}));
        assert_eq!("SetTo", body["ios_badgeType"]);
        assert_eq!(5, body["ios_badgeCount"]);

        let body = ios(json!({"badge": "7"}));
        assert_eq!("SetTo", body["ios_badgeType"]);
        assert_eq!("7", body["ios_badgeCount"]);
    }

    #[test]
    fn t_falsy_values_stay_in_data() {
        let body = ios(json!({"badge": 0, "title": "", "sound": null, "alert": false}));
        assert!(body.get("ios_badgeType").is_none());
        assert!(body.get("headings").is_none());
        assert!(body.get("ios_sound").is_none());
        assert!(body.get("contents").is_none());
        assert_eq!(
            json!({"badge": 0, "title": "", "sound": null, "alert": false}),
            body["data"]
        );
    }

    #[test]
    fn t_content_available_loose_one() {
        for v in [json!(1), json!(1.0), json!("1"), json!(true)] {
            let body = ios(json!({"content-available": v, "mutable-content": v}));
            assert_eq!(json!(true), body["content_available"]);
            assert_eq!(json!(true), body["mutable_content"]);
            assert!(body["data"].as_object().unwrap().is_empty());
        }
    }

    #[test]
    fn t_content_available_not_one() {
        let body = ios(json!({"content-available": 0, "mutable-content": "yes"}));
        assert!(body.get("content_available").is_none());
        assert!(body.get("mutable_content").is_none());
        assert_eq!(
            json!({"content-available": 0, "mutable-content": "yes"}),
            body["data"]
        );
    }

    #[test]
    fn t_uri_asymmetry() {
        let body = ios(json!({"uri": "app://path"}));
        assert_eq!("app://path", body["url"]);
        assert!(body["data"].get("uri").is_none());

        let body = android(json!({"uri": "app://path"}));
        assert_eq!("app://path", body["url"]);
        assert_eq!("app://path", body["data"]["uri"]);
    }

    #[test]
    fn t_mapped_keys_not_in_data() {
        let data = json!({
            "badge": "Increment",
            "title": "T",
            "alert": "A",
            "sound": "s",
            "content-available": 1,
            "push_time": "t",
            "uri": "u",
            "mutable-content": 1,
            "image_url": "i",
            "buttons": [],
            "custom": {"nested": true},
        });
        let mapped = [
            "badge",
            "title",
            "alert",
            "sound",
            "content-available",
            "push_time",
            "uri",
            "mutable-content",
            "image_url",
            "buttons",
        ];
        let body = ios(data.clone());
        for key in mapped {
            assert!(body["data"].get(key).is_none(), "{key} forwarded on iOS");
        }
        assert_eq!(json!({"nested": true}), body["data"]["custom"]);

        let body = android(data);
        for key in ["title", "alert", "push_time", "image_url", "buttons"] {
            assert!(body["data"].get(key).is_none(), "{key} forwarded on Android");
        }
    }

    #[test]
    fn t_caller_payload_untouched() {
        let p = payload(json!({"alert": "Hi", "badge": 1}));
        let before = p.clone();
        let _ = transform(Platform::Ios, &p);
        let _ = transform(Platform::Android, &p);
        assert_eq!(before, p);
    }

    #[test]
    fn t_attachment_timestamp() {
        let p = payload(json!({"image_url": "https://example.com/a.png"}));
        let r = transform(Platform::Ios, &p);
        let attachments = r.ios_attachments.unwrap();
        assert_eq!(1, attachments.len());
        let (ts, url) = attachments.into_iter().next().unwrap();
        assert!(ts.parse::<i64>().unwrap() > NOW);
        assert_eq!(json!("https://example.com/a.png"), url);
    }

    #[test]
    fn t_empty_payload() {
        let body = ios(json!({}));
        assert_eq!(json!({"data": {}}), body);

        let p: NotificationPayload = serde_json::from_str("{}").unwrap();
        assert!(p.data.is_empty());
    }
}
