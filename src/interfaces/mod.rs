// Interfaces module - canonical interface, VLAN and PCIe records

pub mod normalize;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::decode::RawLink;

/// Operational state as reported by `ip`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperState {
    Up,
    Down,
    LowerLayerDown,
    Unknown,
    /// Virtual switch ports have no meaningful link state
    NotApplicable,
    Other(String),
}

impl OperState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "UP" => OperState::Up,
            "DOWN" => OperState::Down,
            "LOWERLAYERDOWN" => OperState::LowerLayerDown,
            "UNKNOWN" => OperState::Unknown,
            "n/a" => OperState::NotApplicable,
            other => OperState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OperState::Up => "UP",
            OperState::Down => "DOWN",
            OperState::LowerLayerDown => "LOWERLAYERDOWN",
            OperState::Unknown => "UNKNOWN",
            OperState::NotApplicable => "n/a",
            OperState::Other(raw) => raw,
        }
    }
}

impl fmt::Display for OperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OperState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Link speed ladder. Anything not on the ladder is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LinkSpeed {
    Gbps1,
    Gbps2_5,
    Gbps5,
    Gbps10,
    Gbps25,
    Gbps40,
    Gbps50,
    Gbps100,
    Gbps200,
    Gbps400,
    Gbps800,
    Unknown,
}

const SPEED_LADDER: &[(&str, LinkSpeed)] = &[
    ("1000Mb/s", LinkSpeed::Gbps1),
    ("2500Mb/s", LinkSpeed::Gbps2_5),
    ("5000Mb/s", LinkSpeed::Gbps5),
    ("10000Mb/s", LinkSpeed::Gbps10),
    ("25000Mb/s", LinkSpeed::Gbps25),
    ("40000Mb/s", LinkSpeed::Gbps40),
    ("50000Mb/s", LinkSpeed::Gbps50),
    ("100000Mb/s", LinkSpeed::Gbps100),
    ("200000Mb/s", LinkSpeed::Gbps200),
    ("400000Mb/s", LinkSpeed::Gbps400),
    ("800000Mb/s", LinkSpeed::Gbps800),
];

impl LinkSpeed {
    /// Map an ethtool `Speed:` value onto the ladder
    pub fn from_ethtool(raw: &str) -> Self {
        SPEED_LADDER
            .iter()
            .find(|(text, _)| *text == raw.trim())
            .map(|(_, speed)| *speed)
            .unwrap_or(LinkSpeed::Unknown)
    }

    pub fn label(&self) -> &'static str {
        match self {
            LinkSpeed::Gbps1 => "1 Gbps",
            LinkSpeed::Gbps2_5 => "2.5 Gbps",
            LinkSpeed::Gbps5 => "5 Gbps",
            LinkSpeed::Gbps10 => "10 Gbps",
            LinkSpeed::Gbps25 => "25 Gbps",
            LinkSpeed::Gbps40 => "40 Gbps",
            LinkSpeed::Gbps50 => "50 Gbps",
            LinkSpeed::Gbps100 => "100 Gbps",
            LinkSpeed::Gbps200 => "200 Gbps",
            LinkSpeed::Gbps400 => "400 Gbps",
            LinkSpeed::Gbps800 => "800 Gbps",
            LinkSpeed::Unknown => "",
        }
    }
}

impl Serialize for LinkSpeed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Physical medium of the port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortType {
    BaseT,
    Dac,
    Fiber,
    Virtual,
    None,
}

impl PortType {
    /// Map an ethtool `Port:` value; unlisted media map to `None`
    pub fn from_ethtool(raw: &str) -> Self {
        match raw.trim() {
            "Twisted Pair" => PortType::BaseT,
            "Direct Attach Copper" => PortType::Dac,
            "FIBRE" => PortType::Fiber,
            _ => PortType::None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PortType::BaseT => "BaseT",
            PortType::Dac => "DAC",
            PortType::Fiber => "Fiber",
            PortType::Virtual => "Virtual",
            PortType::None => "",
        }
    }
}

impl Serialize for PortType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// IPv4 address with its prefix length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Cidr {
    pub address: String,
    pub prefix_len: u8,
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl Serialize for Ipv4Cidr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One network interface after merging `ip`, `ethtool` and `lspci` data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceRecord {
    pub index: u32,
    pub name: String,
    pub address: String,
    pub state: OperState,
    pub ipv4: Vec<Ipv4Cidr>,
    pub altnames: Vec<String>,
    pub driver: String,
    pub firmware: String,
    /// PCI address without the `0000:` domain
    pub bus: String,
    pub speed: LinkSpeed,
    pub port: PortType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u32>,
    /// Diagnostics not promoted to a typed field
    pub extra: BTreeMap<String, String>,
}

impl InterfaceRecord {
    pub fn is_vlan(&self) -> bool {
        self.parent.is_some()
    }
}

/// PCI device backing an interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PcieRecord {
    pub index: u32,
    pub interface: String,
    pub bus: String,
    pub description: String,
}

/// Which interfaces to keep
#[derive(Debug, Clone, Copy, Default)]
pub struct InterfaceFilter {
    pub up_only: bool,
}

impl InterfaceFilter {
    pub fn admits(&self, link: &RawLink) -> bool {
        !link.is_loopback() && (!self.up_only || link.operstate == "UP")
    }
}

/// Partitioned output of the normalizer
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    /// All kept interfaces in source order
    pub interfaces: Vec<InterfaceRecord>,
    pub pcie: Vec<PcieRecord>,
}

impl Inventory {
    pub fn physical(&self) -> impl Iterator<Item = &InterfaceRecord> {
        self.interfaces.iter().filter(|r| !r.is_vlan())
    }

    pub fn vlans(&self) -> impl Iterator<Item = &InterfaceRecord> {
        self.interfaces.iter().filter(|r| r.is_vlan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_ladder_is_total() {
        let expected = [
            ("1000Mb/s", "1 Gbps"),
            ("2500Mb/s", "2.5 Gbps"),
            ("5000Mb/s", "5 Gbps"),
            ("10000Mb/s", "10 Gbps"),
            ("25000Mb/s", "25 Gbps"),
            ("40000Mb/s", "40 Gbps"),
            ("50000Mb/s", "50 Gbps"),
            ("100000Mb/s", "100 Gbps"),
            ("200000Mb/s", "200 Gbps"),
            ("400000Mb/s", "400 Gbps"),
            ("800000Mb/s", "800 Gbps"),
            ("Unknown!", ""),
        ];
        for (raw, label) in expected {
            assert_eq!(LinkSpeed::from_ethtool(raw).label(), label, "speed {}", raw);
        }
    }

    #[test]
    fn test_unlisted_speeds_map_to_empty() {
        assert_eq!(LinkSpeed::from_ethtool("100Mb/s"), LinkSpeed::Unknown);
        assert_eq!(LinkSpeed::from_ethtool("1600000Mb/s").label(), "");
        assert_eq!(LinkSpeed::from_ethtool(""), LinkSpeed::Unknown);
    }

    #[test]
    fn test_port_labels() {
        assert_eq!(PortType::from_ethtool("Twisted Pair").label(), "BaseT");
        assert_eq!(PortType::from_ethtool("Direct Attach Copper").label(), "DAC");
        assert_eq!(PortType::from_ethtool("FIBRE").label(), "Fiber");
        assert_eq!(PortType::from_ethtool("None").label(), "");
        assert_eq!(PortType::from_ethtool("Other").label(), "");
    }

    #[test]
    fn test_oper_state_round_trip() {
        for raw in ["UP", "DOWN", "LOWERLAYERDOWN", "UNKNOWN", "n/a", "DORMANT"] {
            assert_eq!(OperState::parse(raw).as_str(), raw);
        }
    }

    #[test]
    fn test_filter_excludes_loopback_and_down() {
        let link = |ifname: &str, operstate: &str| RawLink {
            ifname: ifname.to_string(),
            operstate: operstate.to_string(),
            ..RawLink::default()
        };

        let all = InterfaceFilter::default();
        assert!(!all.admits(&link("lo", "UNKNOWN")));
        assert!(all.admits(&link("eth0", "DOWN")));

        let up = InterfaceFilter { up_only: true };
        assert!(up.admits(&link("eth0", "UP")));
        assert!(!up.admits(&link("eth1", "DOWN")));
    }
}
