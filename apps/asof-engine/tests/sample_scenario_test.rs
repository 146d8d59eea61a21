//! Sample Trade/Quote Scenario Tests
//!
//! Joins the fixture streams in `tests/fixtures` (AAPL and GOOGL trades
//! against quotes, plus a TSLA trade with no quotes at all) and checks every
//! match against the hand-worked expectations.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;

use asof_engine::jsonl::read_jsonl;
use asof_engine::{
    AsofJoiner, JoinConfig, JoinMode, JoinOutput, OutputOrder, Quote, RawEvent, Trade,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use test_case::test_case;

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

fn load_streams() -> (Vec<RawEvent<Trade>>, Vec<RawEvent<Quote>>) {
    let trades = read_jsonl(&fixture("trades.jsonl"))
        .unwrap_or_else(|e| panic!("Failed to load trades fixture: {e:#}"));
    let quotes = read_jsonl(&fixture("quotes.jsonl"))
        .unwrap_or_else(|e| panic!("Failed to load quotes fixture: {e:#}"));
    (trades, quotes)
}

fn run(mode: JoinMode, order: OutputOrder) -> JoinOutput<Trade, Quote> {
    let (trades, quotes) = load_streams();
    AsofJoiner::new(JoinConfig {
        join_mode: mode,
        order,
        ..JoinConfig::default()
    })
    .join_rows(trades, quotes)
    .expect("fixture streams are well formed")
}

fn hms(ts: DateTime<Utc>) -> String {
    ts.format("%H:%M:%S%.3f").to_string()
}

/// (group, primary time, matched reference time)
fn matches(output: &JoinOutput<Trade, Quote>) -> Vec<(String, String, Option<String>)> {
    output
        .records
        .iter()
        .map(|r| {
            (
                r.group_key().to_string(),
                hms(r.primary.timestamp),
                r.reference_timestamp().map(hms),
            )
        })
        .collect()
}

fn row(group: &str, primary: &str, reference: Option<&str>) -> (String, String, Option<String>) {
    (group.to_string(), primary.to_string(), reference.map(str::to_string))
}

// ============================================
// Concrete Scenario
// ============================================

#[test]
fn test_inner_join_matches_worked_example() {
    let output = run(JoinMode::Inner, OutputOrder::ByGroupThenTime);

    assert_eq!(
        matches(&output),
        vec![
            row("AAPL", "09:00:30.000", Some("09:00:30.000")),
            row("AAPL", "09:01:00.000", Some("09:00:30.000")),
            row("AAPL", "09:01:30.000", Some("09:01:30.000")),
            row("GOOGL", "09:02:00.000", Some("09:02:00.000")),
            row("GOOGL", "09:03:00.000", Some("09:02:00.000")),
            row("GOOGL", "09:03:30.000", Some("09:03:30.000")),
        ]
    );
}

#[test]
fn test_outer_join_keeps_trade_without_quotes() {
    let output = run(JoinMode::Outer, OutputOrder::ByGroupThenTime);

    assert_eq!(output.records.len(), 7);
    let last = output.records.last().unwrap();
    assert_eq!(last.group_key(), "TSLA");
    assert!(last.matched_reference.is_none());
    assert_eq!(output.stats.unmatched, 1);
    assert_eq!(output.stats.reference_only_groups, 1);
}

#[test]
fn test_stream_order_follows_trade_file() {
    let output = run(JoinMode::Outer, OutputOrder::StreamOrder);

    let sequences: Vec<u64> = output.records.iter().map(|r| r.primary.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2, 3, 4, 5, 6]);
    assert_eq!(output.records[0].group_key(), "GOOGL");
    assert_eq!(
        output.records[0].reference_timestamp().map(hms).as_deref(),
        Some("09:03:30.000")
    );
}

#[test]
fn test_matched_payloads_travel_with_records() {
    let output = run(JoinMode::Inner, OutputOrder::ByGroupThenTime);

    let first = &output.records[0];
    let quote = &first.matched_reference.as_ref().unwrap().payload;
    assert_eq!(first.primary.payload.price, Decimal::new(18750, 2));
    assert_eq!(quote.bid, Decimal::new(18740, 2));
    assert_eq!(quote.mid(), Decimal::new(18750, 2));
    assert_eq!(first.staleness().unwrap().num_seconds(), 0);
}

#[test_case(JoinMode::Inner ; "inner")]
#[test_case(JoinMode::Outer ; "outer")]
fn test_join_is_deterministic(mode: JoinMode) {
    let a = run(mode, OutputOrder::ByGroupThenTime);
    let b = run(mode, OutputOrder::ByGroupThenTime);

    assert_eq!(a.records, b.records);
}

#[test]
fn test_quote_equal_to_trade_time_is_included() {
    let output = run(JoinMode::Inner, OutputOrder::ByGroupThenTime);

    let equal = output
        .records
        .iter()
        .filter(|r| r.reference_timestamp() == Some(r.primary.timestamp))
        .count();
    assert_eq!(equal, 4);
}

#[test]
fn test_stats_for_fixture() {
    let output = run(JoinMode::Inner, OutputOrder::ByGroupThenTime);

    assert_eq!(output.stats.groups, 3);
    assert_eq!(output.stats.primary_events, 7);
    assert_eq!(output.stats.reference_events, 9);
    assert_eq!(output.stats.matched, 6);
    assert_eq!(output.stats.emitted, 6);
    assert!(output.stats.within_linear_bound());
}
