// Route table collection - `ip -json route` with a plain-text fallback

use super::Route;
use crate::decode::{decode_records, RawRoute};
use crate::error::{AppError, AppResult};
use crate::source::{command_line, CommandSource};

const JSON_ARGS: &[&str] = &["-detail", "-json", "route"];
const TEXT_ARGS: &[&str] = &["route", "show"];

/// Read the routing table, preferring structured output.
///
/// Older `ip` builds lack `-json`; their plain output is tokenized instead.
pub fn get_routing_table(source: &dyn CommandSource) -> AppResult<Vec<Route>> {
    let json = source
        .capture("ip", JSON_ARGS)
        .and_then(|output| parse_ip_json(&output.stdout));

    match json {
        Ok(routes) => Ok(routes),
        Err(e) => {
            tracing::debug!("Structured route listing unavailable ({}), trying plain output", e);

            let output = source.capture("ip", TEXT_ARGS)?;
            if !output.success() {
                return Err(AppError::source_unavailable(
                    command_line("ip", TEXT_ARGS),
                    output.stderr.trim().to_string(),
                ));
            }
            Ok(parse_ip_route(&output.stdout))
        }
    }
}

pub fn parse_ip_json(json_str: &str) -> AppResult<Vec<Route>> {
    let raw: Vec<RawRoute> = decode_records(json_str, &command_line("ip", JSON_ARGS))?;
    Ok(raw.into_iter().map(Route::from).collect())
}

/// Tokenize `ip route show` lines such as
/// `default via 192.168.1.1 dev wlan0 proto dhcp src 192.168.1.50 metric 600`
pub fn parse_ip_route(output: &str) -> Vec<Route> {
    output
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let destination = tokens.next()?.to_string();

            let mut route = Route {
                destination,
                gateway: None,
                interface: String::new(),
                protocol: String::new(),
                metric: None,
            };

            while let Some(token) = tokens.next() {
                match token {
                    "via" => route.gateway = tokens.next().map(String::from),
                    "dev" => route.interface = tokens.next().unwrap_or_default().to_string(),
                    "proto" => route.protocol = tokens.next().unwrap_or_default().to_string(),
                    "metric" => route.metric = tokens.next().and_then(|m| m.parse().ok()),
                    _ => {}
                }
            }

            Some(route)
        })
        .collect()
}
