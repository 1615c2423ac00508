// Probe module - ordered connectivity tests against public endpoints

pub mod fetch;
pub mod ping;

use std::collections::BTreeSet;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;

use crate::config::ProbeConfig;
use crate::error::AppError;
use crate::source::CommandSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestId {
    GatewayPing,
    DirectPing,
    DnsPing,
    WebpageLoad,
    DownlinkThroughput,
}

impl TestId {
    pub fn description(&self) -> &'static str {
        match self {
            TestId::GatewayPing => "Ping to Default Gateway",
            TestId::DirectPing => "Ping to Internet without DNS Lookup",
            TestId::DnsPing => "Ping to Internet with DNS Lookup",
            TestId::WebpageLoad => "Webpage Download",
            TestId::DownlinkThroughput => "Brief Downlink Throughput",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    fn from_passed(passed: bool) -> Self {
        if passed { Outcome::Pass } else { Outcome::Fail }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pass => "PASS",
            Outcome::Fail => "FAIL",
        }
    }
}

/// Test-specific detail fields, flattened into the JSON object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProbeDetail {
    Gateway { rtt: String, gateway: String },
    Latency { rtt: String },
    Details { details: String },
    Rate { rate: String },
}

impl ProbeDetail {
    fn empty(id: TestId) -> Self {
        match id {
            TestId::GatewayPing => ProbeDetail::Gateway {
                rtt: String::new(),
                gateway: String::new(),
            },
            TestId::DirectPing | TestId::DnsPing => ProbeDetail::Latency { rtt: String::new() },
            TestId::WebpageLoad => ProbeDetail::Details {
                details: String::new(),
            },
            TestId::DownlinkThroughput => ProbeDetail::Rate { rate: String::new() },
        }
    }

    /// Text for the Details column
    pub fn summary(&self) -> String {
        match self {
            ProbeDetail::Gateway { rtt, gateway } => format!("{} {}", gateway, rtt).trim().to_string(),
            ProbeDetail::Latency { rtt } => rtt.clone(),
            ProbeDetail::Details { details } => details.clone(),
            ProbeDetail::Rate { rate } => rate.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    #[serde(rename = "test")]
    pub id: TestId,
    pub result: Outcome,
    #[serde(flatten)]
    pub detail: ProbeDetail,
}

impl TestResult {
    fn new(id: TestId, passed: bool, detail: ProbeDetail) -> Self {
        TestResult {
            id,
            result: Outcome::from_passed(passed),
            detail,
        }
    }

    fn failed(id: TestId) -> Self {
        TestResult::new(id, false, ProbeDetail::empty(id))
    }
}

const PROBE_COUNT: u64 = 5;

/// Runs the five tests in a fixed order. A failing test never stops the
/// ones after it.
pub struct Prober<'a> {
    source: &'a dyn CommandSource,
    settings: &'a ProbeConfig,
    progress: ProgressBar,
    warned: BTreeSet<String>,
}

impl<'a> Prober<'a> {
    pub fn new(source: &'a dyn CommandSource, settings: &'a ProbeConfig, show_progress: bool) -> Self {
        let target = if show_progress {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        };
        let progress = ProgressBar::with_draw_target(Some(PROBE_COUNT), target);
        progress.set_style(
            ProgressStyle::with_template("[ TESTING {msg} ]").unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        Prober {
            source,
            settings,
            progress,
            warned: BTreeSet::new(),
        }
    }

    /// Results in report order: gateway, direct, DNS, webpage, throughput
    pub fn run(mut self) -> Vec<TestResult> {
        let settings = self.settings;

        self.advance();
        let direct = self.ping_public(TestId::DirectPing, &settings.public_ip);
        self.advance();
        let dns = self.ping_public(TestId::DnsPing, &settings.public_host);
        self.advance();
        let webpage = self.webpage_load();
        self.advance();
        let gateway = self.gateway_ping();
        self.advance();
        let throughput = if webpage.result == Outcome::Pass {
            self.downlink_throughput()
        } else {
            TestResult::failed(TestId::DownlinkThroughput)
        };

        self.progress.finish_and_clear();
        vec![gateway, direct, dns, webpage, throughput]
    }

    fn advance(&self) {
        self.progress.inc(1);
        let dots = ".".repeat(self.progress.position() as usize);
        self.progress.set_message(format!("{:<5}", dots));
    }

    fn ping_public(&mut self, id: TestId, target: &str) -> TestResult {
        match ping::ping(self.source, self.settings, target, self.settings.ping_count) {
            Ok(report) => TestResult::new(id, report.passed, ProbeDetail::Latency { rtt: report.rtt }),
            Err(e) => self.degrade(id, "ping", &e, "Internet connectivity results will be missing."),
        }
    }

    fn webpage_load(&mut self) -> TestResult {
        let id = TestId::WebpageLoad;
        let url = self.settings.webpage_url.as_str();
        match fetch::download(self.source, &[], url) {
            Ok(report) => {
                let details = fetch::connection_summary(&report.stderr, fetch::url_host(url));
                TestResult::new(id, report.passed, ProbeDetail::Details { details })
            }
            Err(e) => self.degrade(id, "wget", &e, "Web results will be missing."),
        }
    }

    fn gateway_ping(&mut self) -> TestResult {
        let id = TestId::GatewayPing;
        let hop = match ping::resolve_next_hop(self.source, &self.settings.public_ip) {
            Ok(hop) => hop,
            Err(e) => return self.degrade(id, "ip", &e, "Next Hop ping results will be missing."),
        };

        match ping::ping(self.source, self.settings, &hop.gateway, self.settings.gateway_ping_count) {
            Ok(report) => TestResult::new(
                id,
                report.passed,
                ProbeDetail::Gateway {
                    rtt: report.rtt,
                    gateway: format!("({} via {})", hop.gateway, hop.interface),
                },
            ),
            Err(e) => self.degrade(id, "ping", &e, "Next Hop ping results will be missing."),
        }
    }

    fn downlink_throughput(&mut self) -> TestResult {
        let id = TestId::DownlinkThroughput;
        match fetch::download(self.source, fetch::THROUGHPUT_OPTIONS, &self.settings.throughput_url) {
            Ok(report) => {
                let rate = fetch::transfer_rate(&report.stderr);
                TestResult::new(id, report.passed, ProbeDetail::Rate { rate })
            }
            Err(e) => self.degrade(id, "wget", &e, "Throughput results will be missing."),
        }
    }

    fn degrade(&mut self, id: TestId, tool: &str, error: &AppError, consequence: &str) -> TestResult {
        tracing::debug!("{}", error);
        if self.warned.insert(tool.to_string()) {
            self.progress.suspend(|| {
                tracing::warn!("Dependency '{}' is missing or failing. {}", tool, consequence);
            });
        }
        TestResult::failed(id)
    }
}
