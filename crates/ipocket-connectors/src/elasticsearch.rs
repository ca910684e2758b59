//! Elasticsearch node inventory connector
//!
//! Reads `GET /_nodes/http,transport` and turns each node's publish
//! address into an IP asset. Candidates are tried in priority order:
//! http publish address, transport publish address, `ip`, then `host`.

use std::collections::HashSet;

use base64::Engine;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use ipocket_import_types::BundleIpAssetEntry;

use crate::common::{candidate_rejection, extract_host_candidate, normalize_ipv4, AssetDefaults};
use crate::error::ConnectorError;

const SERVICE: &str = "Elasticsearch";

/// Authentication for the Elasticsearch API
#[derive(Debug, Clone)]
pub enum ElasticsearchAuth {
    /// API key, either already base64-encoded or in `id:key` form
    ApiKey(String),
    Basic { username: String, password: String },
    None,
}

impl ElasticsearchAuth {
    fn header_value(&self) -> Option<String> {
        match self {
            ElasticsearchAuth::ApiKey(key) => {
                let candidate = key.trim();
                let encoded = if candidate.contains(':') {
                    base64::engine::general_purpose::STANDARD.encode(candidate.as_bytes())
                } else {
                    candidate.to_string()
                };
                Some(format!("ApiKey {encoded}"))
            }
            ElasticsearchAuth::Basic { username, password } => {
                let credentials = format!("{username}:{password}");
                Some(format!(
                    "Basic {}",
                    base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes())
                ))
            }
            ElasticsearchAuth::None => None,
        }
    }
}

/// One node row from the nodes API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElasticsearchNodeRecord {
    pub node_id: String,
    pub name: String,
    pub http_publish_address: Option<String>,
    pub transport_publish_address: Option<String>,
    pub ip: Option<String>,
    pub host: Option<String>,
}

/// Client for the Elasticsearch nodes API
pub struct ElasticsearchConnector {
    client: Client,
    base_url: String,
    auth: ElasticsearchAuth,
}

impl ElasticsearchConnector {
    pub fn new(
        elasticsearch_url: &str,
        auth: ElasticsearchAuth,
        insecure: bool,
    ) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()?;
        Ok(Self {
            client,
            base_url: elasticsearch_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Fetch the node inventory.
    pub async fn fetch_nodes(&self) -> Result<Vec<ElasticsearchNodeRecord>, ConnectorError> {
        let url = format!("{}/_nodes/http,transport", self.base_url);
        debug!("Querying {}", url);

        let mut request = self.client.get(&url).header("Accept", "application/json");
        if let Some(value) = self.auth.header_value() {
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

        let payload: Value = response
            .json()
            .await
            .map_err(|_| ConnectorError::InvalidPayload(
                "Elasticsearch API returned invalid JSON.".to_string(),
            ))?;
        parse_nodes_payload(&payload)
    }
}

/// Parse the `/_nodes` response body into node records.
pub fn parse_nodes_payload(
    payload: &Value,
) -> Result<Vec<ElasticsearchNodeRecord>, ConnectorError> {
    let nodes = payload
        .get("nodes")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            ConnectorError::InvalidPayload(
                "Elasticsearch payload is missing a valid 'nodes' object.".to_string(),
            )
        })?;

    let mut records = Vec::with_capacity(nodes.len());
    for (node_id, node) in nodes {
        let Some(node) = node.as_object() else { continue };
        let publish_address = |section: &str| {
            node.get(section)
                .and_then(|value| value.get("publish_address"))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        records.push(ElasticsearchNodeRecord {
            node_id: node_id.clone(),
            name: node
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(node_id)
                .to_string(),
            http_publish_address: publish_address("http"),
            transport_publish_address: publish_address("transport"),
            ip: node.get("ip").and_then(Value::as_str).map(str::to_string),
            host: node.get("host").and_then(Value::as_str).map(str::to_string),
        });
    }
    Ok(records)
}

/// Turn node records into IP-asset entries, one per node with a usable
/// IPv4 address. Rejected nodes and duplicate IPs become warnings.
pub fn extract_ip_assets_from_nodes(
    records: &[ElasticsearchNodeRecord],
    defaults: &AssetDefaults,
) -> (Vec<BundleIpAssetEntry>, Vec<String>) {
    let mut warnings = Vec::new();
    let mut ip_assets = Vec::new();
    let mut seen_ips: HashSet<String> = HashSet::new();

    for record in records {
        let node_label = if record.name.is_empty() {
            &record.node_id
        } else {
            &record.name
        };
        let candidates: Vec<(&str, &str)> = [
            ("http.publish_address", record.http_publish_address.as_deref()),
            (
                "transport.publish_address",
                record.transport_publish_address.as_deref(),
            ),
            ("ip", record.ip.as_deref()),
            ("host", record.host.as_deref()),
        ]
        .into_iter()
        .filter_map(|(source, value)| {
            value
                .filter(|value| !value.trim().is_empty())
                .map(|value| (source, value))
        })
        .collect();

        if candidates.is_empty() {
            warnings.push(format!(
                "Node '{node_label}' skipped: no IP candidate found in \
                 http.publish_address, transport.publish_address, ip, or host."
            ));
            continue;
        }

        let mut resolved_ip: Option<String> = None;
        let mut skip_reason: Option<String> = None;
        for (source, raw_candidate) in candidates {
            let host_candidate = extract_host_candidate(raw_candidate);
            match normalize_ipv4(&host_candidate) {
                Some(parsed) if parsed.is_loopback() => {
                    skip_reason = Some(format!("loopback IP '{parsed}' is not allowed."));
                }
                Some(parsed) => {
                    resolved_ip = Some(parsed.to_string());
                    break;
                }
                None => {
                    skip_reason = Some(candidate_rejection(raw_candidate, source));
                }
            }
        }

        let Some(ip_address) = resolved_ip else {
            warnings.push(format!(
                "Node '{node_label}' skipped: {}",
                skip_reason.unwrap_or_else(|| "invalid IP.".to_string())
            ));
            continue;
        };

        if !seen_ips.insert(ip_address.clone()) {
            warnings.push(format!(
                "Duplicate IP '{ip_address}' skipped (node '{node_label}')."
            ));
            continue;
        }

        ip_assets.push(defaults.apply(BundleIpAssetEntry::new(ip_address, "OTHER")));
    }

    (ip_assets, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipocket_entities::IpAssetType;
    use serde_json::json;

    fn node(
        node_id: &str,
        http: Option<&str>,
        transport: Option<&str>,
        ip: Option<&str>,
        host: Option<&str>,
    ) -> ElasticsearchNodeRecord {
        ElasticsearchNodeRecord {
            node_id: node_id.to_string(),
            name: format!("name-{node_id}"),
            http_publish_address: http.map(str::to_string),
            transport_publish_address: transport.map(str::to_string),
            ip: ip.map(str::to_string),
            host: host.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_nodes_payload() {
        let payload = json!({
            "nodes": {
                "abc": {
                    "name": "es-data-1",
                    "http": {"publish_address": "10.0.0.5:9200"},
                    "transport": {"publish_address": "10.0.0.5:9300"},
                    "ip": "10.0.0.5",
                    "host": "es-data-1.lab"
                }
            }
        });
        let records = parse_nodes_payload(&payload).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "es-data-1");
        assert_eq!(
            records[0].http_publish_address.as_deref(),
            Some("10.0.0.5:9200")
        );
    }

    #[test]
    fn test_parse_nodes_payload_requires_nodes_object() {
        assert!(parse_nodes_payload(&json!({"cluster_name": "x"})).is_err());
    }

    #[test]
    fn test_extraction_prefers_http_publish_address() {
        let records = vec![node(
            "a",
            Some("10.0.0.5:9200"),
            Some("10.0.0.6:9300"),
            Some("10.0.0.7"),
            None,
        )];
        let (assets, warnings) =
            extract_ip_assets_from_nodes(&records, &AssetDefaults::default());
        assert!(warnings.is_empty());
        assert_eq!(assets[0].ip_address, "10.0.0.5");
    }

    #[test]
    fn test_extraction_falls_through_bad_candidates() {
        let records = vec![node(
            "a",
            Some("inet[es.lab:9200]"),
            None,
            Some("10.0.0.7"),
            None,
        )];
        let (assets, warnings) =
            extract_ip_assets_from_nodes(&records, &AssetDefaults::default());
        assert!(warnings.is_empty());
        assert_eq!(assets[0].ip_address, "10.0.0.7");
    }

    #[test]
    fn test_extraction_skips_loopback_ipv6_and_duplicates() {
        let records = vec![
            node("a", Some("127.0.0.1:9200"), None, None, None),
            node("b", Some("[::1]:9200"), None, None, None),
            node("c", Some("10.0.0.5:9200"), None, None, None),
            node("d", None, None, Some("10.0.0.5"), None),
            node("e", None, None, None, None),
        ];
        let (assets, warnings) =
            extract_ip_assets_from_nodes(&records, &AssetDefaults::default());
        assert_eq!(assets.len(), 1);
        assert_eq!(warnings.len(), 4);
        assert!(warnings[0].contains("loopback"));
        assert!(warnings[1].contains("IPv6"));
        assert!(warnings[2].contains("Duplicate IP '10.0.0.5'"));
        assert!(warnings[3].contains("no IP candidate"));
    }

    #[test]
    fn test_extraction_applies_defaults() {
        let defaults = AssetDefaults {
            asset_type: IpAssetType::Other,
            project_name: Some("Search".to_string()),
            tags: Some(vec!["elasticsearch".to_string()]),
            note: Some("from es".to_string()),
        };
        let records = vec![node("a", Some("10.0.0.5:9200"), None, None, None)];
        let (assets, _) = extract_ip_assets_from_nodes(&records, &defaults);
        assert_eq!(assets[0].project_name.as_deref(), Some("Search"));
        assert_eq!(assets[0].merge_tags, Some(true));
        assert_eq!(assets[0].notes_provided, Some(true));
    }

    #[test]
    fn test_api_key_header_encodes_id_key_pairs() {
        let auth = ElasticsearchAuth::ApiKey("id:secret".to_string());
        let header = auth.header_value().unwrap();
        assert!(header.starts_with("ApiKey "));
        assert_ne!(header, "ApiKey id:secret");

        let raw = ElasticsearchAuth::ApiKey("already-encoded".to_string());
        assert_eq!(raw.header_value().unwrap(), "ApiKey already-encoded");
    }
}
