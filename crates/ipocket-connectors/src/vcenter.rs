//! vCenter host/VM inventory connector
//!
//! Talks to the vSphere Automation REST API: session login, then the
//! host and VM listings plus each powered-on VM's guest identity. ESXi
//! hosts become OS assets (and host records); VMs become VM assets.

use std::collections::HashSet;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use ipocket_import_types::{BundleDocument, BundleHostEntry, BundleIpAssetEntry};

use crate::common::normalize_ipv4;
use crate::error::ConnectorError;

const SERVICE: &str = "vCenter";
const SESSION_HEADER: &str = "vmware-api-session-id";

/// An ESXi host with a usable management IPv4 address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcenterHostRecord {
    pub name: String,
    pub ip_address: String,
}

/// A virtual machine with a usable guest IPv4 address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcenterVmRecord {
    pub name: String,
    pub ip_address: String,
    pub host_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HostSummary {
    host: String,
    name: String,
    #[serde(default)]
    connection_state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VmSummary {
    vm: String,
    name: String,
    #[serde(default)]
    power_state: Option<String>,
}

/// Client for the vSphere Automation REST API
pub struct VcenterConnector {
    client: Client,
    base_url: String,
    session_id: Option<String>,
}

impl VcenterConnector {
    pub fn new(vcenter_url: &str, insecure: bool) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()?;
        Ok(Self {
            client,
            base_url: vcenter_url.trim_end_matches('/').to_string(),
            session_id: None,
        })
    }

    /// Open an API session with basic credentials.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ConnectorError> {
        let url = format!("{}/api/session", self.base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(username, Some(password))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::Api {
                service: SERVICE,
                status: status.as_u16(),
                details: response.text().await.unwrap_or_default(),
            });
        }
        let session_id: String = response.json().await.map_err(|_| {
            ConnectorError::InvalidPayload("vCenter session response was not a token.".to_string())
        })?;
        self.session_id = Some(session_id);
        debug!("Opened vCenter session");
        Ok(())
    }

    fn session_id(&self) -> Result<&str, ConnectorError> {
        self.session_id.as_deref().ok_or_else(|| {
            ConnectorError::InvalidConfig("vCenter session not established; call login first.".to_string())
        })
    }

    async fn get_json(&self, path: &str) -> Result<Value, ConnectorError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(SESSION_HEADER, self.session_id()?)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::Api {
                service: SERVICE,
                status: status.as_u16(),
                details: response.text().await.unwrap_or_default(),
            });
        }
        response.json().await.map_err(|_| {
            ConnectorError::InvalidPayload("vCenter API returned invalid JSON.".to_string())
        })
    }

    /// Connected ESXi hosts whose inventory name is a usable IPv4
    /// management address. Hosts registered by DNS name are skipped with
    /// a warning; the REST listing does not expose their vmk addresses.
    pub async fn fetch_hosts(&self) -> Result<(Vec<VcenterHostRecord>, Vec<String>), ConnectorError> {
        let payload = self.get_json("/api/vcenter/host").await?;
        let summaries: Vec<HostSummary> = serde_json::from_value(payload).map_err(|_| {
            ConnectorError::InvalidPayload("vCenter host listing had an unexpected shape.".to_string())
        })?;

        let mut records = Vec::new();
        let mut warnings = Vec::new();
        for summary in summaries {
            let name = summary.name.trim().to_string();
            if name.is_empty() {
                warnings.push(format!("Skipped host '{}' without a name.", summary.host));
                continue;
            }
            if summary
                .connection_state
                .as_deref()
                .is_some_and(|state| state != "CONNECTED")
            {
                warnings.push(format!("Skipped host '{name}' because it is not connected."));
                continue;
            }
            let Some(ip_address) = normalize_ipv4(&name) else {
                warnings.push(format!(
                    "Skipped host '{name}' because no IPv4 management IP was found."
                ));
                continue;
            };
            records.push(VcenterHostRecord {
                name,
                ip_address: ip_address.to_string(),
            });
        }
        Ok((records, warnings))
    }

    /// Powered-on VMs with an IPv4 guest address reported by guest tools.
    pub async fn fetch_vms(&self) -> Result<(Vec<VcenterVmRecord>, Vec<String>), ConnectorError> {
        let payload = self.get_json("/api/vcenter/vm").await?;
        let summaries: Vec<VmSummary> = serde_json::from_value(payload).map_err(|_| {
            ConnectorError::InvalidPayload("vCenter VM listing had an unexpected shape.".to_string())
        })?;

        let mut records = Vec::new();
        let mut warnings = Vec::new();
        for summary in summaries {
            let name = summary.name.trim().to_string();
            if name.is_empty() {
                warnings.push(format!("Skipped VM '{}' without a name.", summary.vm));
                continue;
            }
            if summary
                .power_state
                .as_deref()
                .is_some_and(|state| state != "POWERED_ON")
            {
                warnings.push(format!("Skipped VM '{name}' because it is not powered on."));
                continue;
            }
            let identity = match self
                .get_json(&format!("/api/vcenter/vm/{}/guest/identity", summary.vm))
                .await
            {
                Ok(identity) => identity,
                Err(err) => {
                    warn!("Guest identity lookup failed for '{}': {}", name, err);
                    warnings.push(format!(
                        "Skipped VM '{name}' because guest tools reported no identity."
                    ));
                    continue;
                }
            };
            let candidate = identity
                .get("ip_address")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let Some(ip_address) = normalize_ipv4(candidate) else {
                warnings.push(format!(
                    "Skipped VM '{name}' because no IPv4 guest IP was found."
                ));
                continue;
            };
            records.push(VcenterVmRecord {
                name,
                ip_address: ip_address.to_string(),
                host_name: None,
            });
        }
        Ok((records, warnings))
    }
}

/// Package host and VM records into a bundle. ESXi hosts become host
/// entries plus OS assets tagged `esxi`; VMs become VM assets. The first
/// record wins on duplicate IPs.
pub fn build_vcenter_bundle(
    hosts: &[VcenterHostRecord],
    vms: &[VcenterVmRecord],
    exported_at: Option<String>,
) -> (BundleDocument, Vec<String>) {
    let timestamp = exported_at.unwrap_or_else(|| {
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    });
    let mut document = BundleDocument::new(timestamp);
    let mut warnings = Vec::new();
    let mut seen_ips: HashSet<&str> = HashSet::new();

    for host in hosts {
        document.data.hosts.push(BundleHostEntry {
            name: host.name.clone(),
            notes: Some("Imported from vCenter host inventory.".to_string()),
            vendor_name: None,
        });
        if !seen_ips.insert(&host.ip_address) {
            warnings.push(format!(
                "Duplicate IP '{}' skipped for host '{}'.",
                host.ip_address, host.name
            ));
            continue;
        }
        let mut asset = BundleIpAssetEntry::new(host.ip_address.clone(), "OS");
        asset.host_name = Some(host.name.clone());
        asset.tags = Some(vec!["esxi".to_string()]);
        asset.notes = Some(format!("vCenter host: {}", host.name));
        asset.archived = Some(false);
        document.data.ip_assets.push(asset);
    }

    for vm in vms {
        if !seen_ips.insert(&vm.ip_address) {
            warnings.push(format!(
                "Duplicate IP '{}' skipped for VM '{}'.",
                vm.ip_address, vm.name
            ));
            continue;
        }
        let mut notes = format!("vCenter VM: {}", vm.name);
        if let Some(host_name) = &vm.host_name {
            notes = format!("{notes} (host: {host_name})");
        }
        let mut asset = BundleIpAssetEntry::new(vm.ip_address.clone(), "VM");
        asset.notes = Some(notes);
        asset.archived = Some(false);
        document.data.ip_assets.push(asset);
    }

    (document, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str, ip: &str) -> VcenterHostRecord {
        VcenterHostRecord {
            name: name.to_string(),
            ip_address: ip.to_string(),
        }
    }

    fn vm(name: &str, ip: &str, host_name: Option<&str>) -> VcenterVmRecord {
        VcenterVmRecord {
            name: name.to_string(),
            ip_address: ip.to_string(),
            host_name: host_name.map(str::to_string),
        }
    }

    #[test]
    fn test_bundle_contains_hosts_and_typed_assets() {
        let (document, warnings) = build_vcenter_bundle(
            &[host("10.0.0.2", "10.0.0.2")],
            &[vm("web-01", "10.0.0.40", Some("10.0.0.2"))],
            Some("2025-06-01T12:00:00Z".to_string()),
        );
        assert!(warnings.is_empty());
        assert_eq!(document.data.hosts.len(), 1);
        assert_eq!(document.data.ip_assets.len(), 2);

        let esx = &document.data.ip_assets[0];
        assert_eq!(esx.asset_type, "OS");
        assert_eq!(esx.tags, Some(vec!["esxi".to_string()]));
        assert_eq!(esx.host_name.as_deref(), Some("10.0.0.2"));

        let guest = &document.data.ip_assets[1];
        assert_eq!(guest.asset_type, "VM");
        assert_eq!(
            guest.notes.as_deref(),
            Some("vCenter VM: web-01 (host: 10.0.0.2)")
        );
    }

    #[test]
    fn test_bundle_dedups_across_hosts_and_vms() {
        let (document, warnings) = build_vcenter_bundle(
            &[host("10.0.0.2", "10.0.0.2")],
            &[vm("clone-a", "10.0.0.2", None), vm("web-01", "10.0.0.40", None)],
            None,
        );
        assert_eq!(document.data.ip_assets.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Duplicate IP '10.0.0.2' skipped for VM 'clone-a'"));
    }
}
