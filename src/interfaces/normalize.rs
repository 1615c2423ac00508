// Interface normalizer - merges `ip` records with ethtool and lspci data

use std::collections::BTreeMap;

use super::{
    InterfaceFilter, InterfaceRecord, Inventory, Ipv4Cidr, LinkSpeed, OperState, PcieRecord,
    PortType,
};
use crate::decode::RawLink;
use crate::kv::{KvDocument, KvParser};

/// ethtool keys whose values span several lines
pub const REJECTED_KEYS: &[&str] = &[
    "supported-link-modes",
    "advertised-link-modes",
    "netlink-error",
    "current-message-level",
];

/// Upper bound on diagnostics kept outside the typed fields
pub const MAX_EXTRA_FIELDS: usize = 32;

const VIRTUAL_SWITCH_DRIVER: &str = "openvswitch";

/// Parser for `ethtool -i` and `ethtool` output
pub fn ethtool_parser() -> KvParser {
    KvParser::new().reject(REJECTED_KEYS)
}

/// Everything gathered about one interface besides its `ip` record
#[derive(Debug, Clone, Default)]
pub struct InterfaceDiagnostics {
    /// `ethtool -i <if>`
    pub driver_info: KvDocument,
    /// `ethtool <if>`
    pub settings: KvDocument,
    /// `lspci -s <bus>` description
    pub device_description: Option<String>,
}

impl InterfaceDiagnostics {
    fn fields(&self) -> BTreeMap<String, String> {
        let mut fields = self.driver_info.merged();
        fields.extend(self.settings.merged());
        fields.retain(|key, _| !REJECTED_KEYS.contains(&key.as_str()));
        fields
    }
}

/// Build the inventory from decoded links and per-interface diagnostics
pub fn normalize(
    links: &[RawLink],
    diagnostics: &BTreeMap<String, InterfaceDiagnostics>,
    filter: InterfaceFilter,
) -> Inventory {
    let mut inventory = Inventory::default();

    for link in links.iter().filter(|link| filter.admits(link)) {
        let (record, pcie) = normalize_link(link, diagnostics.get(&link.ifname));
        inventory.interfaces.push(record);
        inventory.pcie.extend(pcie);
    }

    inventory.pcie.sort_by(|a, b| a.bus.cmp(&b.bus));
    inventory
}

/// Merge one link with its diagnostics
pub fn normalize_link(
    link: &RawLink,
    diagnostics: Option<&InterfaceDiagnostics>,
) -> (InterfaceRecord, Option<PcieRecord>) {
    let mut fields = diagnostics.map(InterfaceDiagnostics::fields).unwrap_or_default();
    let mut take = |key: &str| fields.remove(key).unwrap_or_default();

    let driver = take("driver");
    let firmware = firmware_label(&take("firmware-version"));
    let bus = strip_pci_domain(&take("bus-info"));
    let speed = LinkSpeed::from_ethtool(&take("speed"));
    let mut port = PortType::from_ethtool(&take("port"));
    let mut state = OperState::parse(&link.operstate);

    if driver == VIRTUAL_SWITCH_DRIVER {
        port = PortType::Virtual;
        if state == OperState::Unknown {
            state = OperState::NotApplicable;
        }
    }

    let ipv4 = link
        .addr_info
        .iter()
        .filter(|addr| addr.family == "inet")
        .map(|addr| Ipv4Cidr {
            address: addr.local.clone(),
            prefix_len: addr.prefixlen,
        })
        .collect();

    let parent = link.parent().map(str::to_string);
    let vlan_id = parent.as_ref().and_then(|_| link.vlan_id());

    let extra = fields.into_iter().take(MAX_EXTRA_FIELDS).collect();

    let pcie = diagnostics
        .and_then(|d| d.device_description.as_deref())
        .filter(|description| !description.is_empty() && !bus.is_empty())
        .map(|description| PcieRecord {
            index: link.ifindex,
            interface: link.ifname.clone(),
            bus: bus.clone(),
            description: description.to_string(),
        });

    let record = InterfaceRecord {
        index: link.ifindex,
        name: link.ifname.clone(),
        address: link.address.clone(),
        state,
        ipv4,
        altnames: link.altnames.clone(),
        driver,
        firmware,
        bus,
        speed,
        port,
        parent,
        vlan_id,
        extra,
    };

    (record, pcie)
}

/// `0000:3b:00.0` -> `3b:00.0`
pub fn strip_pci_domain(bus_info: &str) -> String {
    bus_info.replace("0000:", "")
}

/// First token of the firmware string, without commas
pub fn firmware_label(raw: &str) -> String {
    raw.split(' ').next().unwrap_or_default().replace(',', "")
}

/// Description part of an `lspci -s` line
pub fn device_description(lspci_output: &str) -> Option<String> {
    let line = lspci_output.lines().next()?;
    let (_, description) = line.split_once(": ")?;
    let description = description.trim();
    (!description.is_empty()).then(|| description.to_string())
}

/// Physical interfaces in table order. Bus address breaks ties so hosts
/// without altnames still list in slot order.
pub fn sorted_physical(inventory: &Inventory) -> Vec<&InterfaceRecord> {
    let mut physical: Vec<&InterfaceRecord> = inventory.physical().collect();
    physical.sort_by(|a, b| a.altnames.cmp(&b.altnames).then_with(|| a.bus.cmp(&b.bus)));
    physical
}

/// VLANs grouped by parent link, then by name
pub fn sorted_vlans(inventory: &Inventory) -> Vec<&InterfaceRecord> {
    let mut vlans: Vec<&InterfaceRecord> = inventory.vlans().collect();
    vlans.sort_by(|a, b| a.parent.cmp(&b.parent).then_with(|| a.name.cmp(&b.name)));
    vlans
}
