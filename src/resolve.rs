//! Maps semantic roles (rank, employee, score, ...) onto the actual column
//! headers of a document.
//!
//! Producer and consumer share no schema contract, so every consumer goes
//! through [`resolve`] with a priority-ordered candidate list instead of
//! indexing rows by assumed literal names. Resolution is recomputed for each
//! document since an upload may rename or reorder columns.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// First candidate, compared case-insensitively, that names one of
/// `columns`. Returns the column's original spelling.
///
/// Candidate order is the tie-break: an earlier candidate wins even when a
/// later one matches a column further left.
pub fn resolve<C, S>(columns: &[C], candidates: &[S]) -> Option<String>
where
    C: AsRef<str>,
    S: AsRef<str>,
{
    let lookup: HashMap<String, &str> = columns
        .iter()
        // a later column overwrites an earlier one differing only in case
        .map(|c| (c.as_ref().to_lowercase(), c.as_ref()))
        .collect();
    candidates
        .iter()
        .find_map(|candidate| lookup.get(&candidate.as_ref().to_lowercase()))
        .map(|hit| (*hit).to_owned())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Rank,
    Employee,
    Score,
    Impact,
    Completes,
    Total,
    Dealer,
    Area,
    Region,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 9] = [
        ColumnRole::Rank,
        ColumnRole::Employee,
        ColumnRole::Score,
        ColumnRole::Impact,
        ColumnRole::Completes,
        ColumnRole::Total,
        ColumnRole::Dealer,
        ColumnRole::Area,
        ColumnRole::Region,
    ];
}

/// Candidate header names per role, in priority order. The defaults are the
/// names seen in the advisor-performance export; deployments may override
/// any list through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleCandidates {
    pub rank: Vec<String>,
    pub employee: Vec<String>,
    pub score: Vec<String>,
    pub impact: Vec<String>,
    pub completes: Vec<String>,
    pub total: Vec<String>,
    pub dealer: Vec<String>,
    pub area: Vec<String>,
    pub region: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for RoleCandidates {
    fn default() -> Self {
        Self {
            rank: names(&["Rank"]),
            employee: names(&["Employee", "Advisor", "Service Advisor", "Name"]),
            score: names(&["Satisfaction Score", "Score"]),
            impact: names(&["Impact"]),
            completes: names(&["Completes"]),
            total: names(&["Total Records", "Total"]),
            dealer: names(&["Dealer"]),
            area: names(&["Area"]),
            region: names(&["Region"]),
        }
    }
}

impl RoleCandidates {
    pub fn candidates(&self, role: ColumnRole) -> &[String] {
        match role {
            ColumnRole::Rank => &self.rank,
            ColumnRole::Employee => &self.employee,
            ColumnRole::Score => &self.score,
            ColumnRole::Impact => &self.impact,
            ColumnRole::Completes => &self.completes,
            ColumnRole::Total => &self.total,
            ColumnRole::Dealer => &self.dealer,
            ColumnRole::Area => &self.area,
            ColumnRole::Region => &self.region,
        }
    }
}

/// Every role resolved against one document's columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedColumns {
    pub rank: Option<String>,
    pub employee: Option<String>,
    pub score: Option<String>,
    pub impact: Option<String>,
    pub completes: Option<String>,
    pub total: Option<String>,
    pub dealer: Option<String>,
    pub area: Option<String>,
    pub region: Option<String>,
}

impl ResolvedColumns {
    pub fn resolve_all<C: AsRef<str>>(columns: &[C], candidates: &RoleCandidates) -> Self {
        let find = |role| resolve(columns, candidates.candidates(role));
        Self {
            rank: find(ColumnRole::Rank),
            employee: find(ColumnRole::Employee),
            score: find(ColumnRole::Score),
            impact: find(ColumnRole::Impact),
            completes: find(ColumnRole::Completes),
            total: find(ColumnRole::Total),
            dealer: find(ColumnRole::Dealer),
            area: find(ColumnRole::Area),
            region: find(ColumnRole::Region),
        }
    }

    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        let slot = match role {
            ColumnRole::Rank => &self.rank,
            ColumnRole::Employee => &self.employee,
            ColumnRole::Score => &self.score,
            ColumnRole::Impact => &self.impact,
            ColumnRole::Completes => &self.completes,
            ColumnRole::Total => &self.total,
            ColumnRole::Dealer => &self.dealer,
            ColumnRole::Area => &self.area,
            ColumnRole::Region => &self.region,
        };
        slot.as_deref()
    }

    /// True when `column` is claimed by any resolved role.
    pub fn claims(&self, column: &str) -> bool {
        ColumnRole::ALL.iter().any(|role| self.get(*role) == Some(column))
    }
}
