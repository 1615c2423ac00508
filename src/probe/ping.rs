// ICMP probes and next-hop resolution

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::ProbeConfig;
use crate::decode::{decode_records, RawNextHop};
use crate::error::{AppError, AppResult};
use crate::routes::lookup::{NextHop, RouteEngine};
use crate::routes::parser;
use crate::source::{command_line, CommandSource};

static RTT_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"rtt.*= ([0-9.]+)/([0-9.]+)/([0-9.]+)/([0-9.]+) ms").expect("valid rtt pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingReport {
    pub passed: bool,
    /// Average round trip, `"<n> ms"` or `"unknown"`
    pub rtt: String,
}

pub fn ping(
    source: &dyn CommandSource,
    settings: &ProbeConfig,
    target: &str,
    count: u32,
) -> AppResult<PingReport> {
    let count = count.to_string();
    let args = [
        "-q",
        "-c",
        count.as_str(),
        "-i",
        settings.ping_interval.as_str(),
        "-W",
        settings.ping_wait.as_str(),
        target,
    ];
    let output = source.capture("ping", &args)?;

    Ok(PingReport {
        passed: output.success(),
        rtt: average_rtt(&output.stdout),
    })
}

/// Average from the `rtt min/avg/max/mdev` summary line
pub fn average_rtt(stdout: &str) -> String {
    let joined = stdout.replace('\n', " | ");
    RTT_SUMMARY
        .captures(&joined)
        .map(|caps| format!("{} ms", &caps[2]))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Gateway used to reach `destination`.
///
/// Asks the kernel first; when that is unavailable or names no gateway the
/// local routing table is searched instead.
pub fn resolve_next_hop(source: &dyn CommandSource, destination: &str) -> AppResult<NextHop> {
    query_next_hop(source, destination).or_else(|e| {
        tracing::debug!("Kernel next-hop lookup failed ({}), searching route table", e);
        local_next_hop(source, destination)
    })
}

fn query_next_hop(source: &dyn CommandSource, destination: &str) -> AppResult<NextHop> {
    let args = ["--json", "route", "get", destination];
    let output = source.capture("ip", &args)?;
    let hops: Vec<RawNextHop> = decode_records(&output.stdout, &command_line("ip", &args))?;

    hops.into_iter()
        .find_map(|hop| {
            Some(NextHop {
                gateway: hop.gateway?,
                interface: hop.dev,
            })
        })
        .ok_or_else(|| AppError::FieldMissing("gateway".to_string()))
}

fn local_next_hop(source: &dyn CommandSource, destination: &str) -> AppResult<NextHop> {
    let dest: Ipv4Addr = destination.parse().map_err(|_| AppError::ProbeFailure {
        probe: "gateway-ping".to_string(),
        reason: format!("{} is not an IPv4 address", destination),
    })?;

    let routes = parser::get_routing_table(source)?;
    RouteEngine::new(&routes)
        .next_hop(dest)
        .ok_or_else(|| AppError::ProbeFailure {
            probe: "gateway-ping".to_string(),
            reason: format!("no gateway route toward {}", destination),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::scripted::ScriptedCommands;

    const PING_OK: &str = r#"PING 1.1.1.1 (1.1.1.1) 56(84) bytes of data.

--- 1.1.1.1 ping statistics ---
5 packets transmitted, 5 received, 0% packet loss, time 1004ms
rtt min/avg/max/mdev = 8.912/9.431/10.208/0.462 ms
"#;

    #[test]
    fn test_average_rtt() {
        assert_eq!(average_rtt(PING_OK), "9.431 ms");
        assert_eq!(average_rtt("5 packets transmitted, 0 received, 100% packet loss\n"), "unknown");
        assert_eq!(average_rtt(""), "unknown");
    }

    #[test]
    fn test_ping_uses_configured_timing() {
        let source = ScriptedCommands::new().respond("ping -q -c 5 -i 0.25 -W 0.5 1.1.1.1", PING_OK, 0);
        let report = ping(&source, &ProbeConfig::default(), "1.1.1.1", 5).unwrap();

        assert!(report.passed);
        assert_eq!(report.rtt, "9.431 ms");
    }

    #[test]
    fn test_ping_loss_fails_but_reports() {
        let source = ScriptedCommands::new().respond("ping -q -c 4 -i 0.25 -W 0.5 10.0.0.1", "", 1);
        let report = ping(&source, &ProbeConfig::default(), "10.0.0.1", 4).unwrap();

        assert!(!report.passed);
        assert_eq!(report.rtt, "unknown");
    }

    #[test]
    fn test_next_hop_from_kernel() {
        let source = ScriptedCommands::new().respond(
            "ip --json route get 1.1.1.1",
            r#"[{"dst":"1.1.1.1","gateway":"192.168.1.1","dev":"wlan0","prefsrc":"192.168.1.50","flags":[],"uid":1000,"cache":[]}]"#,
            0,
        );
        let hop = resolve_next_hop(&source, "1.1.1.1").unwrap();

        assert_eq!(hop.gateway, "192.168.1.1");
        assert_eq!(hop.interface, "wlan0");
        assert!(!source.was_called("ip -detail -json route"));
    }

    #[test]
    fn test_next_hop_falls_back_to_route_table() {
        let source = ScriptedCommands::new().respond(
            "ip -detail -json route",
            r#"[{"dst":"default","gateway":"10.0.0.1","dev":"eth0","protocol":"dhcp","metric":100},
               {"dst":"10.0.0.0/24","dev":"eth0","protocol":"kernel"}]"#,
            0,
        );
        let hop = resolve_next_hop(&source, "1.1.1.1").unwrap();

        assert_eq!(hop.gateway, "10.0.0.1");
        assert_eq!(hop.interface, "eth0");
    }

    #[test]
    fn test_next_hop_unresolvable() {
        let source = ScriptedCommands::new();
        assert!(resolve_next_hop(&source, "1.1.1.1").is_err());

        let err = resolve_next_hop(&source, "one.one.one.one").unwrap_err();
        assert!(matches!(err, AppError::ProbeFailure { .. }));
    }
}
