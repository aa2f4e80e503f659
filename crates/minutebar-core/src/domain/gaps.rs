//! 캔들 테이블의 내부 갭 감지.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::types::{CandleTable, CandleTime};

/// 기본 샘플링 간격 (1분).
pub const MINUTE: TimeDelta = TimeDelta::minutes(1);

/// 양 끝을 포함하는 시간 구간.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: CandleTime,
    pub end: CandleTime,
}

impl TimeRange {
    pub fn new(start: CandleTime, end: CandleTime) -> Self {
        Self { start, end }
    }

    /// 구간에 포함되는 시각인지 확인합니다.
    pub fn contains(&self, time: &CandleTime) -> bool {
        self.start <= *time && *time <= self.end
    }

    /// 주어진 간격으로 구간에 들어가는 샘플 수.
    pub fn samples(&self, interval: TimeDelta) -> i64 {
        let step = interval.num_seconds().max(1);
        (self.end - self.start).num_seconds() / step + 1
    }
}

/// 인접 행 사이 간격이 `interval`보다 크면 비어 있는 정확한 구간을 반환합니다.
///
/// 예: 0,1,2,5분 행과 1분 간격 → `[3분, 4분]`. 행이 2개 미만이면 빈 결과입니다.
pub fn find_gaps(table: &CandleTable, interval: TimeDelta) -> Vec<TimeRange> {
    table
        .rows()
        .windows(2)
        .filter(|pair| pair[1].time - pair[0].time > interval)
        .map(|pair| TimeRange::new(pair[0].time + interval, pair[1].time - interval))
        .collect()
}
