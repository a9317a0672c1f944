//! Agenda filtering and monthly totals
//!
//! Both work on an already fetched list of entries; neither touches the store.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::service::{AgendaEntry, ServiceStatus};

/// In-memory filter over agenda entries
#[derive(Debug, Clone, Default)]
pub struct AgendaFilter {
    /// Statuses to keep; empty keeps every status
    pub statuses: Vec<ServiceStatus>,
    /// Case-insensitive substring of the client name
    pub client_search: Option<String>,
}

impl AgendaFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = ServiceStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_client_search(mut self, search: impl Into<String>) -> Self {
        self.client_search = Some(search.into());
        self
    }

    pub fn matches(&self, entry: &AgendaEntry) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&entry.service.status) {
            return false;
        }

        match self.search_term() {
            Some(term) => entry
                .client_name
                .as_deref()
                .map(|name| name.to_lowercase().contains(&term))
                .unwrap_or(false),
            None => true,
        }
    }

    pub fn apply(&self, entries: Vec<AgendaEntry>) -> Vec<AgendaEntry> {
        entries.into_iter().filter(|e| self.matches(e)).collect()
    }

    fn search_term(&self) -> Option<String> {
        self.client_search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// Number of services on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub services: usize,
}

/// Paid and pending totals for a set of services
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub paid_total: f64,
    pub pending_total: f64,
    pub service_count: usize,
    /// Ordered by date
    pub per_day: Vec<DailyCount>,
}

impl MonthlySummary {
    pub fn from_entries(entries: &[AgendaEntry]) -> Self {
        let mut paid_total = 0.0;
        let mut pending_total = 0.0;
        let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();

        for entry in entries {
            match entry.service.status {
                ServiceStatus::Paid => paid_total += entry.service.amount,
                ServiceStatus::Pending => pending_total += entry.service.amount,
            }
            *per_day.entry(entry.service.date).or_insert(0) += 1;
        }

        Self {
            paid_total,
            pending_total,
            service_count: entries.len(),
            per_day: per_day
                .into_iter()
                .map(|(date, services)| DailyCount { date, services })
                .collect(),
        }
    }
}
