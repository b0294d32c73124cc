use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::provider::{ChainRow, ChainSnapshot};

/// Call and put open interest for one expiration, index-aligned to `strikes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryLadder {
    pub date: String,
    pub strikes: Vec<f64>,
    pub call_matrix: Vec<u64>,
    pub put_matrix: Vec<u64>,
    pub net_matrix: Vec<i64>,
}

impl ExpiryLadder {
    pub fn from_snapshot(date: &str, snapshot: &ChainSnapshot) -> Self {
        align(date, &snapshot.calls, &snapshot.puts)
    }
}

/// Lays call and put rows onto the sorted union of their strikes. Strikes
/// missing from one side read as zero there; a strike repeated on one side
/// keeps its last row.
pub fn align(date: &str, calls: &[ChainRow], puts: &[ChainRow]) -> ExpiryLadder {
    let strikes = strike_ladder(calls, puts);
    let call_map = open_interest_by_strike(calls);
    let put_map = open_interest_by_strike(puts);

    let lookup = |map: &HashMap<u64, u64>| -> Vec<u64> {
        strikes
            .iter()
            .map(|s| map.get(&strike_key(*s)).copied().unwrap_or(0))
            .collect()
    };
    let call_matrix = lookup(&call_map);
    let put_matrix = lookup(&put_map);
    let net_matrix = call_matrix
        .iter()
        .zip(&put_matrix)
        .map(|(c, p)| *c as i64 - *p as i64)
        .collect();

    debug!(
        "{date}: {} strikes from {} calls / {} puts",
        strikes.len(),
        calls.len(),
        puts.len()
    );

    ExpiryLadder {
        date: date.to_string(),
        strikes,
        call_matrix,
        put_matrix,
        net_matrix,
    }
}

fn strike_ladder(calls: &[ChainRow], puts: &[ChainRow]) -> Vec<f64> {
    let mut strikes: Vec<f64> = calls
        .iter()
        .chain(puts)
        .map(|row| normalize(row.strike))
        .collect();
    strikes.sort_by(f64::total_cmp);
    strikes.dedup_by(|a, b| strike_key(*a) == strike_key(*b));

    strikes
}

fn open_interest_by_strike(rows: &[ChainRow]) -> HashMap<u64, u64> {
    rows.iter()
        .map(|row| (strike_key(row.strike), row.open_interest))
        .collect()
}

// -0.0 and 0.0 are the same price level
fn normalize(strike: f64) -> f64 {
    strike + 0.0
}

fn strike_key(strike: f64) -> u64 {
    normalize(strike).to_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(pairs: &[(f64, u64)]) -> Vec<ChainRow> {
        pairs.iter().map(|(s, oi)| ChainRow::new(*s, *oi)).collect()
    }

    #[test]
    fn test_align_mixed_strikes() {
        let calls = rows(&[(100.0, 50), (105.0, 0)]);
        let puts = rows(&[(100.0, 10), (110.0, 5)]);

        let ladder = align("2024-06-21", &calls, &puts);
        assert_eq!(ladder.date, "2024-06-21");
        assert_eq!(ladder.strikes, vec![100.0, 105.0, 110.0]);
        assert_eq!(ladder.call_matrix, vec![50, 0, 0]);
        assert_eq!(ladder.put_matrix, vec![10, 0, 5]);
        assert_eq!(ladder.net_matrix, vec![40, 0, -5]);
    }

    #[test]
    fn test_align_empty() {
        let ladder = align("2024-06-21", &[], &[]);
        assert!(ladder.strikes.is_empty());
        assert!(ladder.call_matrix.is_empty());
        assert!(ladder.put_matrix.is_empty());
        assert!(ladder.net_matrix.is_empty());
    }

    #[test]
    fn test_align_unsorted_input_with_shared_strikes() {
        let calls = rows(&[(120.0, 1), (90.0, 2), (100.5, 3)]);
        let puts = rows(&[(100.5, 4), (80.0, 5), (120.0, 6)]);

        let ladder = align("d", &calls, &puts);
        assert_eq!(ladder.strikes, vec![80.0, 90.0, 100.5, 120.0]);
        assert_eq!(ladder.call_matrix, vec![0, 2, 3, 1]);
        assert_eq!(ladder.put_matrix, vec![5, 0, 4, 6]);
        assert_eq!(ladder.net_matrix, vec![-5, 2, -1, -5]);
    }

    #[test]
    fn test_duplicate_strike_last_row_wins() {
        let calls = rows(&[(100.0, 7), (100.0, 9)]);
        let ladder = align("d", &calls, &[]);
        assert_eq!(ladder.strikes, vec![100.0]);
        assert_eq!(ladder.call_matrix, vec![9]);
        assert_eq!(ladder.put_matrix, vec![0]);
    }

    #[test]
    fn test_negative_zero_strike_merges() {
        let calls = rows(&[(-0.0, 3)]);
        let puts = rows(&[(0.0, 1)]);
        let ladder = align("d", &calls, &puts);
        assert_eq!(ladder.strikes.len(), 1);
        assert_eq!(ladder.net_matrix, vec![2]);
    }

    #[test]
    fn test_ladder_invariants() {
        let calls = rows(&[(5.0, 10), (2.5, 0), (7.5, 33), (10.0, 1)]);
        let puts = rows(&[(2.5, 4), (12.5, 8), (5.0, 10), (1.0, 2)]);
        let ladder = align("d", &calls, &puts);

        let n = ladder.strikes.len();
        assert_eq!(ladder.call_matrix.len(), n);
        assert_eq!(ladder.put_matrix.len(), n);
        assert_eq!(ladder.net_matrix.len(), n);
        assert!(ladder.strikes.windows(2).all(|w| w[0] < w[1]));
        for i in 0..n {
            assert_eq!(
                ladder.net_matrix[i],
                ladder.call_matrix[i] as i64 - ladder.put_matrix[i] as i64
            );
        }
        for row in calls.iter().chain(&puts) {
            assert!(ladder.strikes.contains(&row.strike));
        }
        assert_eq!(n, 6);
    }

    #[test]
    fn test_serialized_field_names() {
        let ladder = align("2024-06-21", &rows(&[(100.0, 50)]), &rows(&[(100.0, 10)]));
        let json = serde_json::to_string(&ladder).unwrap();
        assert_eq!(
            json,
            r#"{"date":"2024-06-21","strikes":[100.0],"callMatrix":[50],"putMatrix":[10],"netMatrix":[40]}"#
        );
    }
}
