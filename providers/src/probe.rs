//! Connection probes: models list first, `/health` as the fallback.

use quill_types::{ConnectionReport, ProbeTarget};
use serde_json::Value;

use crate::ChatClient;

/// Model ids from a `{data:[{id|name}...]}` body. `None` when there is no
/// `data` array or it yields no ids.
#[must_use]
pub fn parse_model_ids(body: &Value) -> Option<Vec<String>> {
    let models: Vec<String> = body
        .get("data")?
        .as_array()?
        .iter()
        .filter_map(|entry| {
            ["id", "name"]
                .iter()
                .filter_map(|key| entry.get(*key).and_then(Value::as_str))
                .find(|value| !value.is_empty())
                .map(ToString::to_string)
        })
        .collect();

    (!models.is_empty()).then_some(models)
}

impl ChatClient {
    /// Probe the models endpoint; on a non-2xx status, probe `/health` under
    /// the base URL before declaring the connection broken.
    pub async fn check_connection(&self, target: &ProbeTarget) -> ConnectionReport {
        let api_key = target.api_key.as_ref();

        let response = match self.get(&target.models_url, api_key).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %target.models_url, "Models probe failed: {e}");
                return ConnectionReport::error(e.to_string());
            }
        };

        let status = response.status();
        if status.is_success() {
            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) => return ConnectionReport::error(e.to_string()),
            };
            return match serde_json::from_slice::<Value>(&body) {
                Ok(json) => ConnectionReport::ok(parse_model_ids(&json)),
                Err(e) => {
                    tracing::warn!(
                        url = %target.models_url,
                        "Models probe returned invalid JSON: {e}"
                    );
                    ConnectionReport::error(format!("invalid models response: {e}"))
                }
            };
        }

        let models_failure = format!("HTTP {}", status.as_u16());
        let Some(health_url) = target.health_url() else {
            return ConnectionReport::error(models_failure);
        };

        tracing::debug!(%status, url = %health_url, "Models probe failed, trying health endpoint");
        match self.get(&health_url, api_key).send().await {
            Ok(health) if health.status().is_success() => ConnectionReport::ok(None),
            Ok(health) => {
                tracing::debug!(status = %health.status(), "Health probe failed");
                ConnectionReport::error(models_failure)
            }
            Err(e) => {
                tracing::debug!("Health probe failed: {e}");
                ConnectionReport::error(models_failure)
            }
        }
    }
}
