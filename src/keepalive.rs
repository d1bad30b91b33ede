//! Keep-alive prober.
//!
//! Periodically GETs a URL so a hosted instance is not suspended for
//! inactivity. It is independent of the conversion pipeline.

use serde::Serialize;
use std::time::Duration;

use crate::config::KeepAliveSettings;
use crate::error::Result;

/// Something that can issue a GET and return the HTTP status.
pub trait Probe {
    fn get(&self, url: &str, timeout: Duration) -> Result<u16>;
}

/// [`Probe`] over a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::blocking::Client,
}

impl HttpProbe {
    pub fn new(settings: &KeepAliveSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!("tss-converter-keepalive/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Probe for HttpProbe {
    fn get(&self, url: &str, timeout: Duration) -> Result<u16> {
        let response = self.client.get(url).timeout(timeout).send()?;
        Ok(response.status().as_u16())
    }
}

/// Result of one round of attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingReport {
    pub url: String,
    pub attempts: u32,
    /// Status of the last response received, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub ok: bool,
}

/// A status below 400 means the service answered.
#[must_use]
pub fn is_alive(status: u16) -> bool {
    status < 400
}

/// GET `url` until one attempt succeeds or `max_attempts` have failed,
/// sleeping `retry_delay` between attempts.
pub fn ping_with_retries<P, F>(
    probe: &P,
    url: &str,
    settings: &KeepAliveSettings,
    mut sleep: F,
) -> PingReport
where
    P: Probe + ?Sized,
    F: FnMut(Duration),
{
    let max_attempts = settings.max_attempts.max(1);
    let mut report = PingReport {
        url: url.to_string(),
        attempts: 0,
        status: None,
        last_error: None,
        ok: false,
    };

    while report.attempts < max_attempts {
        if report.attempts > 0 {
            sleep(settings.retry_delay());
        }
        report.attempts += 1;

        match probe.get(url, settings.timeout()) {
            Ok(status) => {
                report.status = Some(status);
                if is_alive(status) {
                    report.ok = true;
                    report.last_error = None;
                    tracing::info!(url, status, attempt = report.attempts, "keep-alive ping ok");
                    return report;
                }
                report.last_error = Some(format!("HTTP status {status}"));
                tracing::warn!(url, status, attempt = report.attempts, "keep-alive ping failed");
            }
            Err(err) => {
                tracing::warn!(
                    url,
                    error = %err,
                    attempt = report.attempts,
                    "keep-alive ping failed"
                );
                report.last_error = Some(err.to_string());
            }
        }
    }

    tracing::error!(url, attempts = report.attempts, "keep-alive gave up");
    report
}

/// Ping every `interval` for `rounds` rounds, or forever when `rounds` is
/// `None`. Returns the report of each round.
pub fn run<P, F>(
    probe: &P,
    url: &str,
    settings: &KeepAliveSettings,
    rounds: Option<u32>,
    mut sleep: F,
) -> Vec<PingReport>
where
    P: Probe + ?Sized,
    F: FnMut(Duration),
{
    let mut reports = Vec::new();
    let mut round = 0u32;
    loop {
        let report = ping_with_retries(probe, url, settings, &mut sleep);
        round = round.saturating_add(1);
        if rounds.is_some() {
            reports.push(report);
        }
        if rounds.is_some_and(|limit| round >= limit) {
            return reports;
        }
        sleep(settings.interval());
    }
}
