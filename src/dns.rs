// DNS records - resolver state per link, built from `resolvectl` output

use serde::Serialize;

use crate::kv::{KvDocument, KvParser};

/// Resolver settings of one link or of the global scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DnsRecord {
    #[serde(skip)]
    pub device: String,
    pub current_dns_server: String,
    pub dns_servers: Vec<String>,
    #[serde(rename = "dns-domain")]
    pub dns_domains: Vec<String>,
}

impl DnsRecord {
    pub fn is_empty(&self) -> bool {
        self.current_dns_server.is_empty() && self.dns_servers.is_empty() && self.dns_domains.is_empty()
    }
}

/// Parse `resolvectl` status text into DNS records
pub fn parse_resolver_state(text: &str) -> Vec<DnsRecord> {
    records_from(&KvParser::new().parse(text))
}

/// Keep devices that carry at least one DNS setting, in resolver order
pub fn records_from(doc: &KvDocument) -> Vec<DnsRecord> {
    doc.devices
        .iter()
        .filter(|device| !device.name.is_empty())
        .map(|device| DnsRecord {
            device: device.name.clone(),
            current_dns_server: device.get("current-dns-server").unwrap_or_default().to_string(),
            dns_servers: split_list(device.get("dns-servers")),
            dns_domains: split_list(device.get("dns-domain")),
        })
        .filter(|record| !record.is_empty())
        .collect()
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split_whitespace()
        .map(String::from)
        .collect()
}
