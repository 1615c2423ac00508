// Routes module - route table records and next-hop lookup

pub mod lookup;
pub mod parser;

use serde::Serialize;

use crate::decode::RawRoute;

/// One routing table entry, serialized with the field names `ip` uses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    #[serde(rename = "dst")]
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(rename = "dev")]
    pub interface: String,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<u32>,
}

impl From<RawRoute> for Route {
    fn from(raw: RawRoute) -> Self {
        Route {
            destination: raw.dst,
            gateway: raw.gateway.filter(|gw| !gw.is_empty()),
            interface: raw.dev,
            protocol: raw.protocol,
            metric: raw.metric,
        }
    }
}
