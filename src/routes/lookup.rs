// Next-hop lookup with longest prefix matching over IPv4 routes

use std::net::Ipv4Addr;

use super::Route;

/// Gateway and egress device chosen for a destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextHop {
    pub gateway: String,
    pub interface: String,
}

pub struct RouteEngine<'a> {
    routes: &'a [Route],
}

impl<'a> RouteEngine<'a> {
    pub fn new(routes: &'a [Route]) -> Self {
        RouteEngine { routes }
    }

    /// Most specific route covering `dest`; lower metric wins a tie
    pub fn lookup(&self, dest: Ipv4Addr) -> Option<&'a Route> {
        self.routes
            .iter()
            .filter_map(|route| {
                let (network, prefix_len) = parse_prefix(&route.destination)?;
                contains(network, prefix_len, dest).then_some((route, prefix_len))
            })
            .max_by(|(a, a_len), (b, b_len)| {
                a_len
                    .cmp(b_len)
                    .then_with(|| b.metric.unwrap_or(0).cmp(&a.metric.unwrap_or(0)))
            })
            .map(|(route, _)| route)
    }

    /// Next hop toward `dest`, only when the best route goes through a gateway
    pub fn next_hop(&self, dest: Ipv4Addr) -> Option<NextHop> {
        let route = self.lookup(dest)?;
        Some(NextHop {
            gateway: route.gateway.clone()?,
            interface: route.interface.clone(),
        })
    }
}

/// `default`, `10.0.0.0/8` or a bare host address
fn parse_prefix(destination: &str) -> Option<(Ipv4Addr, u8)> {
    if destination == "default" {
        return Some((Ipv4Addr::UNSPECIFIED, 0));
    }

    match destination.split_once('/') {
        Some((addr, len)) => {
            let len: u8 = len.parse().ok()?;
            if len > 32 {
                return None;
            }
            Some((addr.parse().ok()?, len))
        }
        None => Some((destination.parse().ok()?, 32)),
    }
}

fn contains(network: Ipv4Addr, prefix_len: u8, addr: Ipv4Addr) -> bool {
    let mask = u32::MAX.checked_shl(32 - u32::from(prefix_len)).unwrap_or(0);
    u32::from(network) & mask == u32::from(addr) & mask
}
