//! Aggregator and leader-selection integration tests
//!
//! Pins the reduction semantics: idempotent full rescans, malformed-line
//! isolation, pre-initialized candidate set, and deterministic tie-breaking.

mod common;

use whisker::aggregate::leader::{select_leader, LeaderBoard, SCORED_STATES};
use whisker::aggregate::{AggregateTable, Aggregator};
use whisker::CatDevice;

// ============================================================================
// Reduction
// ============================================================================

#[test]
fn test_fixture_totals() {
    let (table, report) = Aggregator::new().scan(&common::load_fixture());

    assert_eq!(table["2"]["Wander Time"], 181);
    assert_eq!(table["2"]["Moonwalk Time"], 45);
    assert_eq!(table["1"]["Moonwalk Time"], 90);
    assert_eq!(table["3"]["Nap Time"], 120);
    assert_eq!(table["3"]["Wander Time"], 10);

    // Six parseable records (csv included), one unknown-port line, one blank
    assert_eq!(report.records, 6);
    assert_eq!(report.blank, 1);
    assert_eq!(report.failures.unknown_port, 1);
}

#[test]
fn test_rescan_is_idempotent() {
    let text = common::load_fixture();
    let aggregator = Aggregator::new();

    let (first, first_report) = aggregator.scan(&text);
    let (second, second_report) = aggregator.scan(&text);

    assert_eq!(first, second);
    assert_eq!(first_report, second_report);
}

#[test]
fn test_malformed_line_does_not_disturb_valid_totals() {
    let valid = [
        common::piped_line(3334, 1, "00:03:01", "Wander Time"),
        common::piped_line(3333, 2, "1:00", "Moonwalk Time"),
    ]
    .join("\n");
    let with_noise = format!(
        "{}\nPort 9999 | ID 1 | Message: bogus\n{}",
        common::piped_line(3334, 1, "00:03:01", "Wander Time"),
        common::piped_line(3333, 2, "1:00", "Moonwalk Time"),
    );

    let aggregator = Aggregator::new();
    let (clean, _) = aggregator.scan(&valid);
    let (noisy, report) = aggregator.scan(&with_noise);

    assert_eq!(clean, noisy);
    assert_eq!(report.failures.unknown_port, 1);
}

#[test]
fn test_worked_example() {
    let text = "Port 3334 | ID 1729875494654 | Message: 00:03:01, Cat state: Wander Time\n\
                Port 9999 | ID 1 | Message: bogus\n";
    let (table, report) = Aggregator::new().scan(text);

    assert_eq!(table["2"]["Wander Time"], 181);
    assert!(table["1"].is_empty());
    assert!(table["3"].is_empty());
    assert_eq!(report.records, 1);
    assert_eq!(report.failed(), 1);

    assert_eq!(select_leader(&table), Some(CatDevice::Two));
}

#[test]
fn test_unknown_port_contributes_nothing_but_a_counter() {
    let (table, report) =
        Aggregator::new().scan("Port 4000 | ID 1 | Message: 10, Cat state: Wander Time\n");

    for device in CatDevice::all() {
        assert!(table[device.id()].is_empty());
    }
    assert_eq!(report.records, 0);
    assert_eq!(report.failures.unknown_port, 1);
}

// ============================================================================
// Leader Selection
// ============================================================================

fn table_with(entries: &[(&str, &str, u64)]) -> AggregateTable {
    let mut text = String::new();
    for (device, state, secs) in entries {
        let port = CatDevice::from_id(device).unwrap().port();
        text.push_str(&common::piped_line(port, 1, &secs.to_string(), state));
        text.push('\n');
    }
    Aggregator::new().scan(&text).0
}

#[test]
fn test_strictly_greater_sum_wins() {
    let table = table_with(&[
        ("1", "Wander Time", 100),
        ("2", "Wander Time", 80),
        ("2", "Moonwalk Time", 40),
        ("3", "Moonwalk Time", 119),
    ]);
    assert_eq!(select_leader(&table), Some(CatDevice::Two));
}

#[test]
fn test_tie_between_one_and_three_returns_one() {
    let table = table_with(&[
        ("1", "Wander Time", 100),
        ("3", "Moonwalk Time", 100),
    ]);
    assert_eq!(select_leader(&table), Some(CatDevice::One));
}

#[test]
fn test_only_scored_states_count() {
    let table = table_with(&[
        ("3", "Nap Time", 100_000),
        ("2", "Wander Time", 1),
    ]);
    assert_eq!(select_leader(&table), Some(CatDevice::Two));

    // Sanity: the scored set is exactly the two designated labels
    assert_eq!(SCORED_STATES, ["Wander Time", "Moonwalk Time"]);
}

#[test]
fn test_empty_log_still_yields_first_device() {
    let (table, _) = Aggregator::new().scan("");
    assert_eq!(select_leader(&table), Some(CatDevice::One));
}

#[test]
fn test_leader_board_matches_selection() {
    let table = table_with(&[
        ("2", "Wander Time", 181),
        ("1", "Moonwalk Time", 90),
    ]);
    let board = LeaderBoard::from_table(&table);

    assert_eq!(board.leader.as_deref(), Some("2"));
    assert_eq!(board.scores["1"], 90);
    assert_eq!(board.scores["2"], 181);
    assert_eq!(board.scores["3"], 0);
}
