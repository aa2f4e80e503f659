//! 캔들 테이블 병합.

use std::cmp::Ordering;

use crate::types::{Candle, CandleTable};

/// 두 테이블을 시각 키 기준으로 병합합니다.
///
/// 같은 시각이 양쪽에 있으면 `incoming` 행이 남습니다. 결과는 시각 오름차순이며,
/// 같은 `incoming`을 여러 번 병합해도 한 번 병합한 것과 같습니다.
pub fn merge_rows(existing: &CandleTable, incoming: &CandleTable) -> CandleTable {
    if incoming.is_empty() {
        return existing.clone();
    }
    if existing.is_empty() {
        return incoming.clone();
    }

    let left = existing.rows();
    let right = incoming.rows();
    let mut merged: Vec<Candle> = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);

    while i < left.len() && j < right.len() {
        match left[i].time.cmp(&right[j].time) {
            Ordering::Less => {
                merged.push(left[i].clone());
                i += 1;
            }
            Ordering::Greater => {
                merged.push(right[j].clone());
                j += 1;
            }
            Ordering::Equal => {
                merged.push(right[j].clone());
                i += 1;
                j += 1;
            }
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);

    CandleTable::from_rows(merged)
}
