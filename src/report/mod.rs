use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Reporting window selector accepted by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateRange {
    CurrentHour,
    CurrentDay,
}

impl DateRange {
    /// Wire value used in the report query string.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            DateRange::CurrentHour => "current_hour",
            DateRange::CurrentDay => "current_day",
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

impl FromStr for DateRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "current_hour" => Ok(DateRange::CurrentHour),
            "current_day" => Ok(DateRange::CurrentDay),
            other => Err(anyhow!(
                "unknown date range `{}` (expected current_hour or current_day)",
                other
            )),
        }
    }
}

/// Which aggregation path a report takes.
///
/// Summary reports are a fixed three-line snapshot; statistics reports carry
/// one row per entity and are merged on the named identity column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReportKind {
    Summary,
    Statistics { identity_column: &'static str },
}

/// Catalog entry for one public report name.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub query_id: &'static str,
    pub definition_id: &'static str,
    pub kind: ReportKind,
}

/// Report name → gateway query/definition identifiers and aggregation kind.
///
/// Pure configuration. Built once at startup and passed by reference to
/// whoever needs it; lookups against an unknown name fail loudly so a typo
/// never falls through to the wrong aggregation path.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: BTreeMap<&'static str, ReportEntry>,
}

const SUMMARY: ReportKind = ReportKind::Summary;

const fn by(identity_column: &'static str) -> ReportKind {
    ReportKind::Statistics { identity_column }
}

/// (name, report_query_id, report_def_id, kind)
static CATALOG: &[(&str, &str, &str, ReportKind)] = &[
    (
        "incoming_mail_summary",
        "mga_overview_incoming_mail_summary",
        "mga_overview",
        SUMMARY,
    ),
    (
        "virus_threat_summary",
        "mga_virus_threats_threat_summary",
        "mga_virus_threats",
        SUMMARY,
    ),
    (
        "incoming_mail_domains",
        "mga_incoming_mail_domain_search",
        "mga_incoming_mail",
        by("sender_domain"),
    ),
    (
        "incoming_domain_auth",
        "mga_incoming_auth_domain_search",
        "mga_incoming_auth",
        by("sender_domain"),
    ),
    (
        "outgoing_mail_domains",
        "mga_outgoing_mail_domain_search",
        "mga_outgoing_mail",
        by("sender_domain"),
    ),
    (
        "internal_users",
        "mga_internal_users_user_search",
        "mga_internal_users",
        by("internal_user"),
    ),
    (
        "content_filters",
        "mga_content_filters_filter_search",
        "mga_content_filters",
        by("orig_value"),
    ),
    (
        "virus_types",
        "mga_virus_types_type_search",
        "mga_virus_types",
        by("orig_value"),
    ),
];

impl Registry {
    /// The built-in report catalog.
    pub fn builtin() -> Self {
        let entries = CATALOG
            .iter()
            .map(|(name, query_id, definition_id, kind)| {
                (
                    *name,
                    ReportEntry {
                        query_id: *query_id,
                        definition_id: *definition_id,
                        kind: kind.clone(),
                    },
                )
            })
            .collect();
        Registry { entries }
    }

    pub fn get(&self, name: &str) -> Result<&ReportEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| anyhow!("unknown report `{}`", name))
    }

    /// Public report names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}
