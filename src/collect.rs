// Inventory collection - runs the OS utilities and feeds the parsers

use std::collections::{BTreeMap, BTreeSet};

use crate::decode::{decode_records, RawLink};
use crate::dns::{self, DnsRecord};
use crate::error::{AppError, AppResult};
use crate::interfaces::normalize::{self, InterfaceDiagnostics};
use crate::interfaces::{InterfaceFilter, Inventory};
use crate::kv::KvDocument;
use crate::routes::{parser, Route};
use crate::source::{command_line, CommandSource};

const ADDRESS_ARGS: &[&str] = &["-detail", "-json", "address", "show"];

/// Everything gathered in one run
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub inventory: Inventory,
    pub routes: Vec<Route>,
    pub dns: Vec<DnsRecord>,
}

/// Gather interfaces, routes and DNS state.
///
/// Only the interface listing is required; every other source degrades to
/// empty data with a warning.
pub fn collect(source: &dyn CommandSource, filter: InterfaceFilter) -> AppResult<Snapshot> {
    let mut collector = Collector::new(source);

    let links = collector.links()?;
    let diagnostics = collector.diagnostics(&links, filter);
    let inventory = normalize::normalize(&links, &diagnostics, filter);

    Ok(Snapshot {
        inventory,
        routes: collector.routes(),
        dns: collector.dns(),
    })
}

pub struct Collector<'a> {
    source: &'a dyn CommandSource,
    warned: BTreeSet<String>,
}

impl<'a> Collector<'a> {
    pub fn new(source: &'a dyn CommandSource) -> Self {
        Collector {
            source,
            warned: BTreeSet::new(),
        }
    }

    /// Decoded `ip address` listing; failure here ends the run
    pub fn links(&mut self) -> AppResult<Vec<RawLink>> {
        let output = self.source.capture("ip", ADDRESS_ARGS)?;
        decode_records(&output.stdout, &command_line("ip", &["address", "show"]))
    }

    pub fn diagnostics(
        &mut self,
        links: &[RawLink],
        filter: InterfaceFilter,
    ) -> BTreeMap<String, InterfaceDiagnostics> {
        links
            .iter()
            .filter(|link| filter.admits(link))
            .map(|link| (link.ifname.clone(), self.interface_diagnostics(&link.ifname)))
            .collect()
    }

    fn interface_diagnostics(&mut self, ifname: &str) -> InterfaceDiagnostics {
        let driver_info = self.ethtool(&["-i", ifname]);
        let settings = self.ethtool(&[ifname]);

        let bus = normalize::strip_pci_domain(
            driver_info
                .merged()
                .get("bus-info")
                .map(String::as_str)
                .unwrap_or_default(),
        );
        let device_description = if bus.is_empty() {
            None
        } else {
            self.describe_device(&bus)
        };

        InterfaceDiagnostics {
            driver_info,
            settings,
            device_description,
        }
    }

    fn ethtool(&mut self, args: &[&str]) -> KvDocument {
        match self.source.capture("ethtool", args) {
            Ok(output) => {
                let doc = normalize::ethtool_parser().parse(&output.stdout);
                if doc.is_empty() {
                    tracing::debug!("ethtool {} reported no fields", args.join(" "));
                }
                doc
            }
            Err(e) => {
                self.warn_once("ethtool", &e, "Information will be missing from the output.");
                KvDocument::default()
            }
        }
    }

    fn describe_device(&mut self, bus: &str) -> Option<String> {
        match self.source.capture("lspci", &["-s", bus]) {
            Ok(output) => normalize::device_description(&output.stdout),
            Err(e) => {
                self.warn_once("lspci", &e, "PCIe device details will be missing.");
                None
            }
        }
    }

    pub fn routes(&mut self) -> Vec<Route> {
        parser::get_routing_table(self.source).unwrap_or_else(|e| {
            self.warn_once("ip route", &e, "Route information will be missing.");
            Vec::new()
        })
    }

    pub fn dns(&mut self) -> Vec<DnsRecord> {
        match self.source.capture("resolvectl", &[]) {
            Ok(output) => dns::parse_resolver_state(&output.stdout),
            Err(e) => {
                self.warn_once("resolvectl", &e, "DNS information will be missing.");
                Vec::new()
            }
        }
    }

    fn warn_once(&mut self, tool: &str, error: &AppError, consequence: &str) {
        tracing::debug!("{}", error);
        if self.warned.insert(tool.to_string()) {
            tracing::warn!("Dependency '{}' is missing or failing. {}", tool, consequence);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::scripted::ScriptedCommands;

    const IP_ADDR: &str = r#"[
        {"ifindex":1,"ifname":"lo","operstate":"UNKNOWN","addr_info":[{"family":"inet","local":"127.0.0.1","prefixlen":8}]},
        {"ifindex":2,"ifname":"eth0","operstate":"UP","address":"52:54:00:12:34:56",
         "addr_info":[{"family":"inet","local":"10.0.0.5","prefixlen":24}]},
        {"ifindex":3,"ifname":"eth1","operstate":"DOWN","address":"52:54:00:12:34:57"}
    ]"#;

    fn host() -> ScriptedCommands {
        ScriptedCommands::new()
            .respond("ip -detail -json address show", IP_ADDR, 0)
            .respond(
                "ethtool -i eth0",
                "driver: virtio_net\nversion: 1.0.0\nfirmware-version: \nbus-info: 0000:00:03.0\n",
                0,
            )
            .respond("ethtool eth0", "Settings for eth0:\n\tSpeed: Unknown!\n\tPort: Other\n", 0)
            .respond(
                "lspci -s 00:03.0",
                "00:03.0 Ethernet controller: Red Hat, Inc. Virtio network device\n",
                0,
            )
            .respond(
                "ip -detail -json route",
                r#"[{"dst":"default","gateway":"10.0.0.1","dev":"eth0","protocol":"dhcp","metric":100}]"#,
                0,
            )
            .respond("resolvectl", "Link 2 (eth0)\nCurrent DNS Server: 10.0.0.1\n", 0)
    }

    #[test]
    fn test_collect_full_host() {
        let snapshot = collect(&host(), InterfaceFilter::default()).unwrap();

        let names: Vec<&str> = snapshot.inventory.interfaces.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["eth0", "eth1"]);
        assert_eq!(snapshot.inventory.pcie.len(), 1);
        assert_eq!(snapshot.inventory.pcie[0].description, "Red Hat, Inc. Virtio network device");
        assert_eq!(snapshot.routes.len(), 1);
        assert_eq!(snapshot.dns[0].device, "eth0");
    }

    #[test]
    fn test_up_only_skips_commands_for_down_links() {
        let source = host();
        collect(&source, InterfaceFilter { up_only: true }).unwrap();

        assert!(source.was_called("ethtool -i eth0"));
        assert!(!source.was_called("ethtool -i eth1"));
        assert!(!source.was_called("ethtool -i lo"));
    }

    #[test]
    fn test_primary_source_missing_is_fatal() {
        let source = ScriptedCommands::new().respond("resolvectl", "", 0);
        let err = collect(&source, InterfaceFilter::default()).unwrap_err();
        assert!(matches!(err, AppError::SourceUnavailable { .. }));
        assert_eq!(err.exit_code(), 126);
    }

    #[test]
    fn test_secondary_sources_degrade_to_empty() {
        let source = ScriptedCommands::new().respond("ip -detail -json address show", IP_ADDR, 0);
        let snapshot = collect(&source, InterfaceFilter::default()).unwrap();

        assert_eq!(snapshot.inventory.interfaces.len(), 2);
        assert!(snapshot.inventory.interfaces.iter().all(|r| r.driver.is_empty()));
        assert!(snapshot.inventory.pcie.is_empty());
        assert!(snapshot.routes.is_empty());
        assert!(snapshot.dns.is_empty());
        assert!(!source.was_called("lspci"));
    }
}
