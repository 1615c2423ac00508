// HTTP probes - page fetch and throughput through wget

use std::sync::LazyLock;

use regex::Regex;
use tempfile::NamedTempFile;

use crate::error::AppResult;
use crate::source::CommandSource;

static CONNECTING_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Connecting to ([\w.\-]+)").expect("valid connection pattern"));

static TRANSFER_RATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([\w./ ]+)\) - ").expect("valid rate pattern"));

/// Options for the throughput download
pub const THROUGHPUT_OPTIONS: &[&str] = &["--report-speed=bits", "--compression=none", "--no-check-certificate"];

#[derive(Debug, Clone)]
pub struct FetchReport {
    pub passed: bool,
    /// wget writes its progress and connection log here
    pub stderr: String,
}

/// Download `url` into a scratch file that is deleted as soon as wget returns
pub fn download(source: &dyn CommandSource, options: &[&str], url: &str) -> AppResult<FetchReport> {
    let scratch = NamedTempFile::new()?;
    let path = scratch.path().to_string_lossy().into_owned();

    let mut args = options.to_vec();
    args.extend(["-O", path.as_str(), url]);
    let result = source.capture("wget", &args);

    if let Err(e) = scratch.close() {
        tracing::warn!("Could not remove temporary file {}: {}", path, e);
    }

    let output = result?;
    Ok(FetchReport {
        passed: output.success(),
        stderr: output.stderr,
    })
}

/// Direct or proxied, judged by the first host wget connected to
pub fn connection_summary(stderr: &str, expected_host: &str) -> String {
    match CONNECTING_TO.captures(stderr) {
        Some(caps) if &caps[1] == expected_host => "Direct - no proxy detected".to_string(),
        Some(caps) => format!("Proxy via {}", &caps[1]),
        None => String::new(),
    }
}

/// `(85.3 Mb/s) - ` -> `85.3 Mbps`
pub fn transfer_rate(stderr: &str) -> String {
    TRANSFER_RATE
        .captures(stderr)
        .map(|caps| caps[1].replace('/', "p"))
        .unwrap_or_default()
}

/// Host part of an http(s) URL
pub fn url_host(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    rest.split(['/', ':']).next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::scripted::ScriptedCommands;

    const WGET_DIRECT: &str = r#"--2024-05-02 10:11:12--  https://www.cloudflare.com/
Resolving www.cloudflare.com (www.cloudflare.com)... 104.16.124.96, 104.16.123.96
Connecting to www.cloudflare.com (www.cloudflare.com)|104.16.124.96|:443... connected.
HTTP request sent, awaiting response... 200 OK
"#;

    const WGET_PROXY: &str = r#"--2024-05-02 10:11:12--  https://www.cloudflare.com/
Connecting to proxy.corp.example.com (proxy.corp.example.com)|10.1.1.1|:3128... connected.
Proxy request sent, awaiting response... 200 OK
"#;

    const WGET_RATE: &str = r#"Length: 10485760 (10M) [image/jpeg]
Saving to: '/tmp/.tmpX1'

2024-05-02 10:11:14 (85.3 Mb/s) - '/tmp/.tmpX1' saved [10485760/10485760]
"#;

    #[test]
    fn test_connection_summary() {
        assert_eq!(
            connection_summary(WGET_DIRECT, "www.cloudflare.com"),
            "Direct - no proxy detected"
        );
        assert_eq!(
            connection_summary(WGET_PROXY, "www.cloudflare.com"),
            "Proxy via proxy.corp.example.com"
        );
        assert_eq!(connection_summary("wget: unable to resolve host", "www.cloudflare.com"), "");
    }

    #[test]
    fn test_transfer_rate() {
        assert_eq!(transfer_rate(WGET_RATE), "85.3 Mbps");
        assert_eq!(transfer_rate("Length: unspecified"), "");
    }

    #[test]
    fn test_url_host() {
        assert_eq!(url_host("https://www.cloudflare.com/"), "www.cloudflare.com");
        assert_eq!(url_host("http://example.org:8080/x"), "example.org");
        assert_eq!(url_host("example.org"), "example.org");
    }

    #[test]
    fn test_download_removes_scratch_file() {
        let source = ScriptedCommands::new().respond_prefix("wget -O ", WGET_DIRECT, 0);
        let report = download(&source, &[], "https://www.cloudflare.com/").unwrap();
        assert!(report.passed);

        let call = source.calls().pop().unwrap();
        let path = call.split_whitespace().nth(2).unwrap().to_string();
        assert!(!std::path::Path::new(&path).exists());
    }

    #[test]
    fn test_download_without_wget() {
        let source = ScriptedCommands::new();
        assert!(download(&source, THROUGHPUT_OPTIONS, "https://example.org/").is_err());
        assert!(source.was_called("wget --report-speed=bits --compression=none --no-check-certificate -O "));
    }
}
