// Structured decoder - turns JSON emitted by `ip -json` into records

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Decode a JSON array of records.
///
/// Empty and malformed input are both reported as `SourceUnavailable` so the
/// caller can decide whether to substitute an empty list or stop.
pub fn decode_records<T: DeserializeOwned>(raw: &str, command: &str) -> AppResult<Vec<T>> {
    if raw.trim().is_empty() {
        return Err(AppError::source_unavailable(command, "command produced no output"));
    }

    serde_json::from_str(raw)
        .map_err(|e| AppError::source_unavailable(command, format!("undecodable output: {}", e)))
}

/// One link as reported by `ip -detail -json address show`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLink {
    pub ifindex: u32,
    pub ifname: String,
    pub link: Option<String>,
    pub address: String,
    pub operstate: String,
    pub addr_info: Vec<RawAddress>,
    pub altnames: Vec<String>,
    pub linkinfo: Option<RawLinkInfo>,
}

impl RawLink {
    /// Parent link name, if this link is stacked on another one
    pub fn parent(&self) -> Option<&str> {
        self.link.as_deref().filter(|name| !name.is_empty())
    }

    pub fn is_loopback(&self) -> bool {
        self.ifname == "lo"
    }

    /// VLAN id from `linkinfo.info_data.id`, absent when any level is missing
    pub fn vlan_id(&self) -> Option<u32> {
        self.linkinfo
            .as_ref()?
            .info_data
            .as_ref()?
            .id
            .as_ref()?
            .as_u64()
            .and_then(|id| u32::try_from(id).ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAddress {
    pub family: String,
    pub local: String,
    pub prefixlen: u8,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLinkInfo {
    pub info_kind: String,
    pub info_data: Option<RawLinkInfoData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLinkInfoData {
    /// Kept loose: only VLAN-like kinds carry a numeric id
    pub id: Option<serde_json::Value>,
}

/// One entry of `ip -detail -json route`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRoute {
    pub dst: String,
    pub gateway: Option<String>,
    pub dev: String,
    pub protocol: String,
    pub metric: Option<u32>,
}

/// Answer of `ip --json route get <addr>`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawNextHop {
    pub gateway: Option<String>,
    pub dev: String,
}
