use rankboard::datatype::safe_number;
use rankboard::document::Row;
use rankboard::ranking::rank_rows;
use serde_json::{Value, json};

fn rows(values: Value) -> Vec<Row> {
    serde_json::from_value(values).unwrap()
}

fn names(ranked: &[(Option<f64>, &Row)]) -> Vec<String> {
    ranked.iter().map(|(_, row)| row["Employee"].as_str().unwrap().to_owned()).collect()
}

#[test]
fn sorts_ascending_with_missing_ranks_last() {
    let input = rows(json!([
        { "Rank": 2, "Employee": "Bea" },
        { "Rank": 1, "Employee": "Al" },
        { "Rank": null, "Employee": "Cy" }
    ]));
    let ranked = rank_rows(&input, Some("Rank"));
    assert_eq!(names(&ranked), ["Al", "Bea", "Cy"]);
    assert_eq!(ranked[2].0, None);
}

#[test]
fn unranked_rows_keep_input_order_after_ranked_ones() {
    let input = rows(json!([
        { "Rank": "n/a", "Employee": "first" },
        { "Rank": 1000000, "Employee": "big" },
        { "Employee": "missing" },
        { "Rank": "", "Employee": "blank" },
        { "Rank": "-3", "Employee": "negative" },
        { "Rank": null, "Employee": "null" }
    ]));
    let ranked = rank_rows(&input, Some("Rank"));
    assert_eq!(names(&ranked), ["negative", "big", "first", "missing", "blank", "null"]);
}

#[test]
fn equal_ranks_are_stable() {
    let input = rows(json!([
        { "Rank": 3, "Employee": "c1" },
        { "Rank": 1, "Employee": "a" },
        { "Rank": "3", "Employee": "c2" },
        { "Rank": 3.0, "Employee": "c3" }
    ]));
    let ranked = rank_rows(&input, Some("Rank"));
    assert_eq!(names(&ranked), ["a", "c1", "c2", "c3"]);
}

#[test]
fn input_is_not_mutated() {
    let input = rows(json!([{ "Rank": 2, "Employee": "b" }, { "Rank": 1, "Employee": "a" }]));
    let before = input.clone();
    let _ = rank_rows(&input, Some("Rank"));
    assert_eq!(input, before);
}

#[test]
fn no_rank_column_keeps_order() {
    let input = rows(json!([{ "Employee": "b" }, { "Employee": "a" }]));
    assert_eq!(names(&rank_rows(&input, None)), ["b", "a"]);
}

#[test]
fn safe_numeric_coercion() {
    assert_eq!(safe_number(&json!("")), None);
    assert_eq!(safe_number(&json!(null)), None);
    assert_eq!(safe_number(&json!("abc")), None);
    assert_eq!(safe_number(&json!("NaN")), None);
    assert_eq!(safe_number(&json!("Infinity")), None);
    assert_eq!(safe_number(&json!("-inf")), None);
    assert_eq!(safe_number(&json!(true)), None);
    assert_eq!(safe_number(&json!("42.5")), Some(42.5));
    assert_eq!(safe_number(&json!(" 7 ")), Some(7.0));
    assert_eq!(safe_number(&json!(0)), Some(0.0));
}
