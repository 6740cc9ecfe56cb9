//! The ranked leaderboard derived from a document: roles resolved, rows
//! ordered by rank, percent details classified against their thresholds.

use serde::Serialize;

use crate::datatype::{self, FieldType, PLACEHOLDER};
use crate::document::{Document, Row};
use crate::ranking::{Tier, rank_rows};
use crate::resolve::{ResolvedColumns, RoleCandidates};
use crate::rules::{PercentGauge, PresentationRules};

pub const DEFAULT_TITLE: &str = "Advisor Satisfaction";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderInfo {
    pub dealer_number: String,
    pub dealer_name: String,
    pub area: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub score: String,
    pub impact: Option<f64>,
    pub records: Option<f64>,
    pub completes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailCell {
    pub column: String,
    pub field_type: FieldType,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gauge: Option<PercentGauge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub position: usize,
    pub rank: Option<f64>,
    pub tier: Tier,
    pub name: String,
    pub summary: Summary,
    pub details: Vec<DetailCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub title: String,
    pub header: HeaderInfo,
    pub last_update: Option<String>,
    pub columns: ResolvedColumns,
    pub detail_columns: Vec<String>,
    pub entries: Vec<Entry>,
}

impl Leaderboard {
    pub fn build(document: &Document, roles: &RoleCandidates, rules: &PresentationRules) -> Self {
        let columns = ResolvedColumns::resolve_all(document.columns(), roles);
        let ranked = rank_rows(document.rows(), columns.rank.as_deref());

        // columns shown in the summary or header stay out of the detail grid
        let detail_columns: Vec<String> = document
            .columns()
            .iter()
            .filter(|c| !columns.claims(c))
            .cloned()
            .collect();

        let entries = ranked
            .iter()
            .enumerate()
            .map(|(position, (rank, row))| Entry {
                position: position + 1,
                rank: *rank,
                tier: Tier::for_rank(*rank),
                name: datatype::cell_text(row, columns.employee.as_deref())
                    .unwrap_or_else(|| PLACEHOLDER.to_owned()),
                summary: summarize(row, &columns),
                details: detail_columns
                    .iter()
                    .map(|column| detail(document, rules, row, column))
                    .collect(),
            })
            .collect();

        let first = ranked.first().map(|(_, row)| *row);
        let title = match document.title().trim() {
            "" => DEFAULT_TITLE.to_owned(),
            title => title.to_owned(),
        };
        let last_update = ["Exported Raw", "Exported"]
            .iter()
            .filter_map(|key| document.meta.get(*key))
            .find(|v| !v.trim().is_empty())
            .cloned();

        Self {
            title,
            header: header_info(document, &columns, first),
            last_update,
            columns,
            detail_columns,
            entries,
        }
    }
}

fn summarize(row: &Row, columns: &ResolvedColumns) -> Summary {
    let score = columns
        .score
        .as_deref()
        .and_then(|c| row.get(c))
        .map(datatype::format_score)
        .unwrap_or_else(|| PLACEHOLDER.to_owned());
    Summary {
        score,
        impact: datatype::cell_number(row, columns.impact.as_deref()),
        records: datatype::cell_number(row, columns.total.as_deref()),
        completes: datatype::cell_number(row, columns.completes.as_deref()),
    }
}

fn detail(document: &Document, rules: &PresentationRules, row: &Row, column: &str) -> DetailCell {
    let field_type = datatype::classify(document, column);
    let cell = row.get(column);
    let gauge = match (field_type, cell) {
        (FieldType::Percent, Some(value)) => rules.gauge(column, value),
        _ => None,
    };
    DetailCell {
        column: column.to_owned(),
        field_type,
        display: datatype::format_cell(cell, field_type),
        gauge,
    }
}

/// Dealer number and name come from the export's `Level` filter, formatted
/// `"<number> - <name>"`; area and region from the top ranked row.
pub fn header_info(document: &Document, columns: &ResolvedColumns, first: Option<&Row>) -> HeaderInfo {
    let level = document.meta.get("Level").map(|l| l.trim()).unwrap_or_default();
    let (mut dealer_number, dealer_name) = match level.split_once(" - ") {
        Some((number, name)) => (number.trim().to_owned(), name.trim().to_owned()),
        None => (String::new(), level.to_owned()),
    };
    let text = |column: &Option<String>| {
        first
            .and_then(|row| datatype::cell_text(row, column.as_deref()))
            .unwrap_or_default()
    };
    if dealer_number.is_empty() {
        dealer_number = text(&columns.dealer);
    }
    HeaderInfo { dealer_number, dealer_name, area: text(&columns.area), region: text(&columns.region) }
}
