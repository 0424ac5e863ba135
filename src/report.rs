//! Drives a full validation run and writes the console report.
//!
//! The run is strictly sequential: resolve the server, then fetch, parse and
//! validate the RSS feed, then the Atom feed. Report lines are written to the
//! caller's writer as each step finishes.

use std::io::{self, Write};

use crate::config::Config;
use crate::feed::{
    discover_base_url, fetch_feed, parse_document, validate, DiscoveryError, FeedKind, FetchError,
    Level, ParseError, ValidationResult,
};
use crate::util::join_feed_url;

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// What happened to one feed during a run.
#[derive(Debug)]
pub enum FeedOutcome {
    /// Parsed and checked; may still have failed structurally.
    Validated(ValidationResult),
    /// Fetched, but the body was not well-formed XML.
    ParseFailed(ParseError),
    /// The endpoint could not be reached.
    FetchFailed(FetchError),
    /// Not attempted because an earlier feed could not be fetched.
    Skipped,
}

impl FeedOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, FeedOutcome::Validated(result) if result.passed())
    }
}

#[derive(Debug)]
pub struct FeedReport {
    pub kind: FeedKind,
    pub url: String,
    pub outcome: FeedOutcome,
}

impl FeedReport {
    pub fn passed(&self) -> bool {
        self.outcome.passed()
    }
}

/// Result of a whole run, in the order feeds were attempted.
#[derive(Debug)]
pub struct RunSummary {
    pub base_url: Option<String>,
    pub reports: Vec<FeedReport>,
    /// Set when no server could be found; no feeds were attempted.
    pub fatal: Option<DiscoveryError>,
}

impl RunSummary {
    /// True when a server was found and every feed validated.
    pub fn passed(&self) -> bool {
        self.fatal.is_none() && !self.reports.is_empty() && self.reports.iter().all(FeedReport::passed)
    }

    /// Process exit status: 0 when everything passed, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.passed() {
            0
        } else {
            1
        }
    }

    pub fn report(&self, kind: FeedKind) -> Option<&FeedReport> {
        self.reports.iter().find(|r| r.kind == kind)
    }
}

/// Sequential fetch → parse → validate runner for the RSS and Atom feeds.
pub struct Driver {
    client: reqwest::Client,
    config: Config,
}

impl Driver {
    pub fn new(client: reqwest::Client, config: Config) -> Self {
        Self { client, config }
    }

    /// Runs both feeds and writes the report to `out`.
    ///
    /// A feed whose endpoint cannot be reached aborts the run: the remaining
    /// feeds are marked [`FeedOutcome::Skipped`]. A parse failure only fails
    /// that feed.
    ///
    /// # Errors
    ///
    /// Only writing to `out` can fail; validation problems are reported in
    /// the returned [`RunSummary`].
    pub async fn run<W: Write>(&self, out: &mut W) -> io::Result<RunSummary> {
        writeln!(out, "{}", RULE)?;
        writeln!(out, "RSS/Atom Feed Validator")?;
        writeln!(out, "{}", RULE)?;

        let base_url = match self.resolve_base_url(out).await? {
            Ok(base_url) => base_url,
            Err(e) => {
                tracing::warn!(error = %e, "No feed server reachable");
                writeln!(out)?;
                writeln!(out, "✗ {}", e)?;
                writeln!(
                    out,
                    "Please start the dev server (e.g. `npm run dev`) or pass --base-url <URL>"
                )?;
                return Ok(RunSummary {
                    base_url: None,
                    reports: Vec::new(),
                    fatal: Some(e),
                });
            }
        };

        let mut reports = Vec::new();
        let mut aborted = false;
        for kind in [FeedKind::Rss, FeedKind::Atom] {
            let url = join_feed_url(&base_url, self.feed_path(kind));
            if aborted {
                reports.push(FeedReport {
                    kind,
                    url,
                    outcome: FeedOutcome::Skipped,
                });
                continue;
            }

            let report = self.check_feed(kind, url, out).await?;
            aborted = matches!(report.outcome, FeedOutcome::FetchFailed(_));
            reports.push(report);
        }

        let summary = RunSummary {
            base_url: Some(base_url),
            reports,
            fatal: None,
        };
        write_summary(&summary, out)?;
        Ok(summary)
    }

    fn feed_path(&self, kind: FeedKind) -> &str {
        match kind {
            FeedKind::Rss => &self.config.rss_path,
            FeedKind::Atom => &self.config.atom_path,
        }
    }

    /// Fixed base URL when configured, otherwise port discovery.
    async fn resolve_base_url<W: Write>(
        &self,
        out: &mut W,
    ) -> io::Result<Result<String, DiscoveryError>> {
        if let Some(base_url) = &self.config.base_url {
            writeln!(out, "\nUsing server at {}", base_url)?;
            return Ok(Ok(base_url.clone()));
        }

        let found = discover_base_url(
            &self.client,
            &self.config.host,
            &self.config.candidate_ports,
            &self.config.rss_path,
            self.config.probe_timeout(),
        )
        .await;
        if let Ok(base_url) = &found {
            writeln!(out, "\n✓ Server found at {}", base_url)?;
        }
        Ok(found)
    }

    async fn check_feed<W: Write>(
        &self,
        kind: FeedKind,
        url: String,
        out: &mut W,
    ) -> io::Result<FeedReport> {
        writeln!(out)?;
        writeln!(out, "Validating {} feed from {}", kind, url)?;
        writeln!(out, "{}", THIN_RULE)?;
        tracing::info!(kind = %kind, url = %url, "Validating feed");

        let bytes = match fetch_feed(&self.client, &url, self.config.fetch_timeout()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(kind = %kind, url = %url, error = %e, "Feed fetch failed");
                writeln!(out, "✗ Could not reach feed endpoint: {}", e)?;
                return Ok(FeedReport {
                    kind,
                    url,
                    outcome: FeedOutcome::FetchFailed(e),
                });
            }
        };

        let doc = match parse_document(&bytes) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(kind = %kind, url = %url, error = %e, "Feed is not well-formed XML");
                writeln!(out, "✗ XML parsing failed ({}): {}", kind, e)?;
                writeln!(out, "{} Feed: INVALID - not well-formed XML", kind)?;
                return Ok(FeedReport {
                    kind,
                    url,
                    outcome: FeedOutcome::ParseFailed(e),
                });
            }
        };
        writeln!(out, "✓ XML is well-formed ({})", kind)?;

        let result = validate(kind, &doc);
        for diagnostic in &result.diagnostics {
            writeln!(out, "{} {}", marker(diagnostic.level), diagnostic.message)?;
        }

        if result.passed() {
            writeln!(out, "{} Feed: VALID - All required elements present", kind)?;
        } else {
            let failures = result.failures().count();
            writeln!(
                out,
                "{} Feed: INVALID - {} required check{} failed",
                kind,
                failures,
                if failures == 1 { "" } else { "s" }
            )?;
        }

        Ok(FeedReport {
            kind,
            url,
            outcome: FeedOutcome::Validated(result),
        })
    }
}

fn marker(level: Level) -> &'static str {
    match level {
        Level::Pass | Level::Info => "✓",
        Level::Warn => "⚠",
        Level::Fail => "✗",
    }
}

fn verdict(outcome: &FeedOutcome) -> &'static str {
    match outcome {
        FeedOutcome::Skipped => "SKIPPED",
        outcome if outcome.passed() => "PASS",
        _ => "FAIL",
    }
}

fn write_summary<W: Write>(summary: &RunSummary, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "TEST SUMMARY")?;
    writeln!(out, "{}", RULE)?;
    for report in &summary.reports {
        writeln!(out, "{} Feed: {}", report.kind, verdict(&report.outcome))?;
    }
    writeln!(out)?;
    if summary.passed() {
        writeln!(out, "Both feeds are valid and compatible with RSS readers.")?;
    } else {
        writeln!(out, "One or more feeds failed validation.")?;
    }
    Ok(())
}
