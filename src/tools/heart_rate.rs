//! Heart-rate lookup tool — queries a local device telemetry service.
//!
//! `GET {base}/devices/getLatestHeartData?deviceName=<name>` answers
//! `{"code": 200, "data": {"heartRate": 72, "unit": "bpm", "measureTime": "...", "deviceName": "..."}}`.
//! Every failure mode is turned into a spoken [`ActionOutcome::Respond`].

use crate::config::HeartRateConfig;
use crate::error::{Result, SessionError};
use crate::session::SessionContext;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{ActionOutcome, DispatchMode, Tool};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeartRateData {
    #[serde(default)]
    heart_rate: Option<serde_json::Value>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    measure_time: Option<String>,
    #[serde(default)]
    device_name: Option<String>,
}

/// Tool that reports the latest heart-rate reading of a named device.
///
/// # Arguments (JSON)
///
/// - `deviceName` (string, required) — device name, e.g. "智能手表1"
pub struct HeartRateTool {
    client: reqwest::Client,
    base_url: String,
}

impl HeartRateTool {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &HeartRateConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    async fn fetch(&self, device_name: &str) -> std::result::Result<String, reqwest::Error> {
        let url = format!("{}/devices/getLatestHeartData", self.base_url);
        self.client
            .get(&url)
            .query(&[("deviceName", device_name)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

/// Render a reading that may arrive as a number or a string. Zero and blank
/// readings count as absent.
fn reading_text(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::Number(n) if n.as_f64().is_some_and(|v| v != 0.0) => Some(n.to_string()),
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        _ => None,
    }
}

fn not_found(device: &str) -> String {
    format!("没有查到设备「{device}」的最新心率数据。")
}

/// Map a response body to the spoken reply.
///
/// Only an object with `code == 200` and a `data` key counts as an answer.
/// A null `data` means the device has no reading yet.
fn describe(requested: &str, body: &str) -> String {
    let payload: serde_json::Value = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(_) => return "查询失败：心率服务返回的数据无法识别。".to_owned(),
    };
    let Some(payload) = payload.as_object() else {
        return not_found(requested);
    };
    if payload.get("code").and_then(serde_json::Value::as_i64) != Some(200) {
        return not_found(requested);
    }
    let data = match payload.get("data") {
        None => return not_found(requested),
        Some(serde_json::Value::Null) => HeartRateData::default(),
        Some(data) => match HeartRateData::deserialize(data) {
            Ok(data) => data,
            Err(_) => return "查询失败：心率服务返回的数据无法识别。".to_owned(),
        },
    };

    let device = data.device_name.as_deref().unwrap_or(requested);
    let Some(reading) = reading_text(data.heart_rate.as_ref()) else {
        return format!("设备「{device}」暂无心率数据。");
    };
    let unit = data.unit.as_deref().unwrap_or("bpm");
    let measured = data.measure_time.as_deref().unwrap_or("未知");
    format!("设备「{device}」最新心率为 {reading} {unit}，测量时间 {measured}。")
}

#[async_trait]
impl Tool for HeartRateTool {
    fn name(&self) -> &str {
        "get_latest_heart_rate"
    }

    fn description(&self) -> &str {
        "查询指定设备(deviceName)的最新心率数据。"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "deviceName": {
                    "type": "string",
                    "description": "设备名称，例如：智能手表1"
                }
            },
            "required": ["deviceName"]
        })
    }

    fn dispatch_mode(&self) -> DispatchMode {
        DispatchMode::Wait
    }

    async fn invoke(
        &self,
        session: &SessionContext,
        args: serde_json::Value,
    ) -> Result<ActionOutcome> {
        let device_name = args
            .get("deviceName")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SessionError::Tool("missing required argument: deviceName".into()))?;

        if session.is_aborted() {
            debug!(parent: session.span(), "heart rate lookup abandoned after stop");
            return Ok(ActionOutcome::NoAction {
                response: None,
                result: None,
            });
        }

        let reply = match self.fetch(device_name).await {
            Ok(body) => describe(device_name, &body),
            Err(e) => {
                warn!(parent: session.span(), error = %e, "heart rate service request failed");
                format!("查询失败：网络异常或服务不可用（{e}）。")
            }
        };
        Ok(ActionOutcome::respond(reply))
    }
}
