// Report assembly - inventory and test results as tables or JSON

use std::io::{self, Write};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::collect::Snapshot;
use crate::config::TableSelection;
use crate::dns::DnsRecord;
use crate::error::AppResult;
use crate::interfaces::normalize::{sorted_physical, sorted_vlans};
use crate::interfaces::{InterfaceRecord, Inventory, Ipv4Cidr};
use crate::probe::TestResult;
use crate::render::{Style, Table};
use crate::routes::Route;

const INTERFACE_HEADERS: &[&str] = &[
    "ID",
    "INTERFACE",
    "MAC ADDRESS",
    "STATE",
    "IP ADDRESSES",
    "DRIVER",
    "FIRMWARE",
    "BUS",
    "SPEED",
    "PORT",
    "ALTNAMES",
];
const INTERFACE_SUMMARY_HEADERS: &[&str] = &[
    "ID",
    "INTERFACE",
    "MAC ADDRESS",
    "STATE",
    "IP ADDRESSES",
    "DRIVER",
    "BUS",
    "SPEED",
    "PORT",
];
const VLAN_HEADERS: &[&str] = &["ID", "INTERFACE", "LINK", "VID", "MAC ADDRESS", "STATE", "IP ADDRESSES"];
const PCIE_HEADERS: &[&str] = &["ID", "INTERFACE", "BUS", "DESCRIPTION"];
const ROUTE_HEADERS: &[&str] = &["DESTINATION", "GATEWAY", "INTERFACE", "PROTOCOL", "METRIC"];
const DNS_HEADERS: &[&str] = &["INTERFACE", "CURRENT SERVER", "ALL SERVERS", "DOMAINS"];
const TEST_HEADERS: &[&str] = &["Test Description", "Result", "Details"];

fn address_lines(addresses: &[Ipv4Cidr]) -> String {
    addresses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn interface_table(inventory: &Inventory, summary: bool) -> Table {
    let headers = if summary { INTERFACE_SUMMARY_HEADERS } else { INTERFACE_HEADERS };
    let mut table = Table::new("Physical Interfaces", headers);

    for record in sorted_physical(inventory) {
        let mut row = vec![
            record.index.to_string(),
            record.name.clone(),
            record.address.clone(),
            record.state.to_string(),
            address_lines(&record.ipv4),
            record.driver.clone(),
        ];
        if !summary {
            row.push(record.firmware.clone());
        }
        row.extend([
            record.bus.clone(),
            record.speed.label().to_string(),
            record.port.label().to_string(),
        ]);
        if !summary {
            row.push(record.altnames.join("\n"));
        }
        table.push_row(row);
    }

    table
}

pub fn vlan_table(inventory: &Inventory) -> Table {
    let mut table = Table::new("VLAN Interfaces", VLAN_HEADERS);

    for record in sorted_vlans(inventory) {
        table.push_row([
            record.index.to_string(),
            record.name.clone(),
            record.parent.clone().unwrap_or_default(),
            record.vlan_id.map(|id| id.to_string()).unwrap_or_default(),
            record.address.clone(),
            record.state.to_string(),
            address_lines(&record.ipv4),
        ]);
    }

    table
}

pub fn pcie_table(inventory: &Inventory) -> Table {
    let mut table = Table::new("PCIe Device Details", PCIE_HEADERS);
    for device in &inventory.pcie {
        table.push_row([
            device.index.to_string(),
            device.interface.clone(),
            device.bus.clone(),
            device.description.clone(),
        ]);
    }
    table
}

pub fn route_table(routes: &[Route]) -> Table {
    let mut table = Table::new("Route Table", ROUTE_HEADERS);
    for route in routes {
        table.push_row([
            route.destination.clone(),
            route.gateway.clone().unwrap_or_default(),
            route.interface.clone(),
            route.protocol.clone(),
            route.metric.map(|m| m.to_string()).unwrap_or_default(),
        ]);
    }
    table
}

pub fn dns_table(records: &[DnsRecord]) -> Table {
    let mut table = Table::new("DNS Server Table", DNS_HEADERS);
    for record in records {
        table.push_row([
            record.device.clone(),
            record.current_dns_server.clone(),
            record.dns_servers.join("\n"),
            record.dns_domains.join("\n"),
        ]);
    }
    table
}

pub fn test_table(results: &[TestResult]) -> Table {
    let mut table = Table::new("Connectivity Tests", TEST_HEADERS);
    for result in results {
        table.push_row([
            result.id.description().to_string(),
            result.result.as_str().to_string(),
            result.detail.summary(),
        ]);
    }
    table
}

/// Print the selected tables in fixed order, or a notice for each empty one
pub fn write_inventory<W: Write>(
    out: &mut W,
    snapshot: &Snapshot,
    tables: TableSelection,
    summary: bool,
    style: Style,
) -> io::Result<()> {
    let sections = [
        (
            tables.interfaces,
            interface_table(&snapshot.inventory, summary),
            "No network interfaces found.",
        ),
        (tables.vlans, vlan_table(&snapshot.inventory), "No VLANs configured."),
        (tables.dns, dns_table(&snapshot.dns), "No DNS entries found."),
        (tables.routes, route_table(&snapshot.routes), "No routes found."),
        (
            tables.pcie,
            pcie_table(&snapshot.inventory),
            "No PCIe devices corresponding to network interfaces found.",
        ),
    ];

    for (selected, table, empty_message) in sections {
        if !selected {
            continue;
        }
        if table.has_data() {
            table.render(out, style)?;
        } else {
            writeln!(out, "{}", empty_message)?;
        }
    }

    Ok(())
}

/// DNS records keyed by device, in resolver order
struct DnsByDevice<'a>(&'a [DnsRecord]);

impl Serialize for DnsByDevice<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for record in self.0 {
            map.serialize_entry(&record.device, record)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct InventoryExport<'a> {
    interfaces: &'a [InterfaceRecord],
    routes: &'a [Route],
    dns: DnsByDevice<'a>,
}

/// Single-line JSON document of everything collected
pub fn inventory_json(snapshot: &Snapshot) -> AppResult<String> {
    let export = InventoryExport {
        interfaces: &snapshot.inventory.interfaces,
        routes: &snapshot.routes,
        dns: DnsByDevice(&snapshot.dns),
    };
    Ok(serde_json::to_string(&export)?)
}

pub fn tests_json(results: &[TestResult]) -> AppResult<String> {
    Ok(serde_json::to_string(results)?)
}
