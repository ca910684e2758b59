//! Prometheus instant-query connector
//!
//! Runs one instant query and turns a caller-chosen label (usually
//! `instance`) of each vector sample into an IP asset.

use std::collections::{HashMap, HashSet};

use base64::Engine;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use ipocket_import_types::BundleIpAssetEntry;

use crate::common::{extract_host_candidate, normalize_ipv4, AssetDefaults};
use crate::error::ConnectorError;

const SERVICE: &str = "Prometheus";

/// One vector sample: its label set and the sample value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrometheusMetricRecord {
    pub labels: HashMap<String, String>,
    pub value: String,
}

/// Client for the Prometheus HTTP API
pub struct PrometheusConnector {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl PrometheusConnector {
    /// `token` is either a bearer token or `user:password` for basic auth.
    pub fn new(
        prometheus_url: &str,
        token: Option<String>,
        insecure: bool,
    ) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()?;
        Ok(Self {
            client,
            base_url: prometheus_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn auth_header(&self) -> Option<String> {
        let token = self.token.as_deref()?.trim();
        if token.is_empty() {
            return None;
        }
        if token.contains(':') {
            Some(format!(
                "Basic {}",
                base64::engine::general_purpose::STANDARD.encode(token.as_bytes())
            ))
        } else {
            Some(format!("Bearer {token}"))
        }
    }

    /// Run an instant query and return its vector samples.
    pub async fn fetch_query_result(
        &self,
        query: &str,
    ) -> Result<Vec<PrometheusMetricRecord>, ConnectorError> {
        let url = format!("{}/api/v1/query", self.base_url);
        debug!("Querying {} with '{}'", url, query);

        let mut request = self
            .client
            .get(&url)
            .query(&[("query", query)])
            .header("Accept", "application/json");
        if let Some(value) = self.auth_header() {
            request = request.header("Authorization", value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::Api {
                service: SERVICE,
                status: status.as_u16(),
                details: response.text().await.unwrap_or_default(),
            });
        }

        let payload: Value = response.json().await.map_err(|_| {
            ConnectorError::InvalidPayload("Prometheus API returned invalid JSON.".to_string())
        })?;
        parse_query_payload(&payload)
    }
}

/// Parse a query-API response body into metric records.
pub fn parse_query_payload(
    payload: &Value,
) -> Result<Vec<PrometheusMetricRecord>, ConnectorError> {
    if payload.get("status").and_then(Value::as_str) != Some("success") {
        let error_type = payload.get("errorType").and_then(Value::as_str);
        let error_message = payload.get("error").and_then(Value::as_str);
        let details = match (error_type, error_message) {
            (None, None) => ".".to_string(),
            (error_type, error_message) => format!(
                " ({}: {}).",
                error_type.unwrap_or("unknown"),
                error_message.unwrap_or("unknown")
            ),
        };
        return Err(ConnectorError::InvalidPayload(format!(
            "Prometheus query status was not success{details}"
        )));
    }

    let data = payload.get("data").ok_or_else(|| {
        ConnectorError::InvalidPayload("Prometheus payload is missing data.".to_string())
    })?;
    let result_type = data.get("resultType").and_then(Value::as_str);
    if result_type != Some("vector") {
        return Err(ConnectorError::InvalidPayload(format!(
            "Unsupported Prometheus resultType '{}'. Expected 'vector'.",
            result_type.unwrap_or("missing")
        )));
    }
    let result = data.get("result").and_then(Value::as_array).ok_or_else(|| {
        ConnectorError::InvalidPayload(
            "Prometheus payload contains an invalid result list.".to_string(),
        )
    })?;

    let mut records = Vec::with_capacity(result.len());
    for (index, sample) in result.iter().enumerate() {
        let metric = sample.get("metric").and_then(Value::as_object).ok_or_else(|| {
            ConnectorError::InvalidPayload(format!(
                "Prometheus sample at index {index} has invalid metric labels."
            ))
        })?;
        let value = sample.get("value").and_then(Value::as_array);
        let sample_value = match value {
            Some(pair) if pair.len() == 2 => match &pair[1] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            _ => {
                return Err(ConnectorError::InvalidPayload(format!(
                    "Prometheus sample at index {index} has an invalid value field."
                )))
            }
        };

        let labels: HashMap<String, String> = metric
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect();
        records.push(PrometheusMetricRecord {
            labels,
            value: sample_value,
        });
    }
    Ok(records)
}

/// Turn samples into IP-asset entries by reading `ip_label` from each
/// sample. Every asset gets a note naming the query, label, metric and
/// sample value so the provenance stays visible in the inventory.
pub fn extract_ip_assets_from_result(
    records: &[PrometheusMetricRecord],
    ip_label: &str,
    query: &str,
    defaults: &AssetDefaults,
) -> Result<(Vec<BundleIpAssetEntry>, Vec<String>), ConnectorError> {
    let label = ip_label.trim();
    if label.is_empty() {
        return Err(ConnectorError::InvalidConfig(
            "IP label must not be empty.".to_string(),
        ));
    }

    let mut warnings = Vec::new();
    let mut ip_assets = Vec::new();
    let mut seen_ips: HashSet<String> = HashSet::new();

    for (index, record) in records.iter().enumerate() {
        let Some(raw_value) = record.labels.get(label) else {
            warnings.push(format!("Sample {index} skipped: label '{label}' is missing."));
            continue;
        };

        let host_candidate = extract_host_candidate(raw_value);
        let Some(parsed) = normalize_ipv4(&host_candidate) else {
            warnings.push(format!(
                "Sample {index} skipped: label '{label}' value '{raw_value}' does not \
                 contain a valid IPv4 address."
            ));
            continue;
        };
        if parsed.is_loopback() {
            warnings.push(format!(
                "Sample {index} skipped: loopback IP '{parsed}' is not allowed."
            ));
            continue;
        }
        let ip_address = parsed.to_string();
        if !seen_ips.insert(ip_address.clone()) {
            warnings.push(format!("Duplicate IP '{ip_address}' skipped."));
            continue;
        }

        let metric_name = record
            .labels
            .get("__name__")
            .map(String::as_str)
            .unwrap_or("unknown");
        let mut entry = defaults.apply(BundleIpAssetEntry::new(ip_address, "OTHER"));
        if entry.notes.is_none() {
            entry.notes = Some(format!(
                "Imported from Prometheus query '{query}' using label '{label}' \
                 (metric={metric_name}, value={}).",
                record.value
            ));
            entry.notes_provided = Some(true);
        }
        ip_assets.push(entry);
    }

    Ok((ip_assets, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(labels: &[(&str, &str)], value: &str) -> PrometheusMetricRecord {
        PrometheusMetricRecord {
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_parse_query_payload() {
        let payload = json!({
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {"metric": {"__name__": "up", "instance": "10.0.0.5:9100"}, "value": [1717243200.0, "1"]}
                ]
            }
        });
        let records = parse_query_payload(&payload).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].labels["instance"], "10.0.0.5:9100");
        assert_eq!(records[0].value, "1");
    }

    #[test]
    fn test_parse_query_payload_rejects_failure_status() {
        let err = parse_query_payload(&json!({
            "status": "error",
            "errorType": "bad_data",
            "error": "parse error"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("bad_data"));
    }

    #[test]
    fn test_parse_query_payload_rejects_matrix_results() {
        let err = parse_query_payload(&json!({
            "status": "success",
            "data": {"resultType": "matrix", "result": []}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("matrix"));
    }

    #[test]
    fn test_extraction_reads_instance_label() {
        let records = vec![
            sample(&[("__name__", "up"), ("instance", "10.0.0.5:9100")], "1"),
            sample(&[("__name__", "up"), ("instance", "node-2:9100")], "1"),
            sample(&[("__name__", "up"), ("job", "node")], "1"),
            sample(&[("instance", "10.0.0.5:9100")], "0"),
        ];
        let (assets, warnings) =
            extract_ip_assets_from_result(&records, "instance", "up", &AssetDefaults::default())
                .unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].ip_address, "10.0.0.5");
        assert_eq!(
            assets[0].notes.as_deref(),
            Some("Imported from Prometheus query 'up' using label 'instance' (metric=up, value=1).")
        );
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("does not contain a valid IPv4"));
        assert!(warnings[1].contains("label 'instance' is missing"));
        assert!(warnings[2].contains("Duplicate IP"));
    }

    #[test]
    fn test_extraction_requires_label() {
        assert!(extract_ip_assets_from_result(&[], "  ", "up", &AssetDefaults::default()).is_err());
    }

    #[test]
    fn test_explicit_note_wins_over_template() {
        let defaults = AssetDefaults {
            note: Some("fixed note".to_string()),
            ..Default::default()
        };
        let records = vec![sample(&[("instance", "10.0.0.5:9100")], "1")];
        let (assets, _) =
            extract_ip_assets_from_result(&records, "instance", "up", &defaults).unwrap();
        assert_eq!(assets[0].notes.as_deref(), Some("fixed note"));
    }
}
