use std::net::IpAddr;
use std::time::Duration;

/// How the SDK's sandbox flag is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SandboxMode {
    /// Decide from the page host (see [`host_looks_like_sandbox`]).
    #[default]
    Auto,
    Sandbox,
    Production,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub app_id: String,
    pub app_name: String,
    pub welcome_message: String,
    /// Base URL of the relay service.
    pub relay_url: String,
    /// Host the app is served from; used for sandbox detection and passed to
    /// the SDK in production.
    pub page_host: String,
    pub sandbox: SandboxMode,
    pub sdk_version: String,
    pub sdk_poll_interval: Duration,
    pub sdk_poll_attempts: u32,
    pub auth_timeout: Duration,
    /// Continue as a guest when the SDK never loads instead of failing.
    pub allow_placeholder_session: bool,
    pub relay_timeout: Duration,
    /// Longest wait for the next wallet callback during a payment.
    pub payment_event_timeout: Duration,
    pub chat_reply_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app_id: "xpaio".to_string(),
            app_name: "Xpaio".to_string(),
            welcome_message: "Welcome! Ask me anything about issuing a test token.".to_string(),
            relay_url: "http://localhost:3000".to_string(),
            page_host: "localhost".to_string(),
            sandbox: SandboxMode::Auto,
            sdk_version: "2.0".to_string(),
            sdk_poll_interval: Duration::from_millis(100),
            sdk_poll_attempts: 50,
            auth_timeout: Duration::from_secs(30),
            allow_placeholder_session: false,
            relay_timeout: Duration::from_secs(10),
            payment_event_timeout: Duration::from_secs(180),
            chat_reply_delay: Duration::from_secs(1),
        }
    }
}

impl ClientConfig {
    pub fn is_sandbox(&self) -> bool {
        match self.sandbox {
            SandboxMode::Sandbox => true,
            SandboxMode::Production => false,
            SandboxMode::Auto => host_looks_like_sandbox(&self.page_host),
        }
    }
}

/// Local and preview hosts run against the sandbox.
pub fn host_looks_like_sandbox(host: &str) -> bool {
    let host = host.trim().to_ascii_lowercase();
    let bare = strip_port(&host);
    if bare.is_empty() || bare == "localhost" || bare.ends_with(".local") {
        return true;
    }
    if let Ok(ip) = bare.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }
    ["sandbox", "staging", "test"]
        .iter()
        .any(|marker| bare.contains(marker))
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // [::1]:8080
        return host.split(']').next().map(|h| &host[..h.len() + 1]).unwrap_or(host);
    }
    match host.rsplit_once(':') {
        Some((h, port)) if !h.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => h,
        _ => host,
    }
}
