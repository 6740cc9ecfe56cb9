use std::cmp::Ordering;

use serde::Serialize;

use crate::datatype::cell_number;
use crate::document::Row;

/// Orders `rows` ascending by the numeric value of `rank_column`.
///
/// Rows whose rank is missing or not numeric go after every ranked row and
/// keep their input order; so do rows with equal ranks. The input is left
/// untouched. Without a rank column the input order is returned as is.
pub fn rank_rows<'a>(rows: &'a [Row], rank_column: Option<&str>) -> Vec<(Option<f64>, &'a Row)> {
    let mut keyed: Vec<(Option<f64>, &Row)> = rows
        .iter()
        .map(|row| (cell_number(row, rank_column), row))
        .collect();
    // slice::sort_by is stable, which the missing-rank policy relies on
    keyed.sort_by(|(a, _), (b, _)| compare_ranks(*a, *b));
    keyed
}

pub fn compare_ranks(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Podium styling for the top three ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Gold,
    Silver,
    Bronze,
    Neutral,
}

impl Tier {
    pub fn for_rank(rank: Option<f64>) -> Self {
        match rank {
            Some(r) if r == 1.0 => Tier::Gold,
            Some(r) if r == 2.0 => Tier::Silver,
            Some(r) if r == 3.0 => Tier::Bronze,
            _ => Tier::Neutral,
        }
    }
}
