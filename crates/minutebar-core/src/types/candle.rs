//! 분봉 캔들과 캔들 테이블.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 캔들 인덱스 시각 (분 단위 정렬, 서울 오프셋).
pub type CandleTime = DateTime<FixedOffset>;

/// 1분 OHLCV 캔들.
///
/// 직렬화 시 컬럼명은 `Time, Open, High, Low, Close, Volume, TradePrice`입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Candle {
    /// 캔들 시작 시각
    pub time: CandleTime,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 누적 거래량
    pub volume: Decimal,
    /// 누적 거래대금
    pub trade_price: Decimal,
}

/// 시각 오름차순, 시각 중복 없는 캔들 목록.
///
/// 생성 경로가 모두 정규화를 거치므로 `rows()`는 항상 엄격한 오름차순입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandleTable {
    rows: Vec<Candle>,
}

impl CandleTable {
    /// 빈 테이블.
    pub fn new() -> Self {
        Self::default()
    }

    /// 임의 순서의 행으로 테이블을 만듭니다.
    ///
    /// 시각 기준으로 정렬하며, 같은 시각이 여러 번 나오면 마지막 행이 남습니다.
    pub fn from_rows(mut rows: Vec<Candle>) -> Self {
        // 안정 정렬이므로 같은 시각끼리는 입력 순서가 유지된다
        rows.sort_by(|a, b| a.time.cmp(&b.time));
        let mut deduped: Vec<Candle> = Vec::with_capacity(rows.len());
        for row in rows {
            match deduped.last_mut() {
                Some(last) if last.time == row.time => *last = row,
                _ => deduped.push(row),
            }
        }
        Self { rows: deduped }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Candle] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Candle> {
        self.rows
    }

    /// 가장 이른 캔들 시각.
    pub fn first_time(&self) -> Option<CandleTime> {
        self.rows.first().map(|c| c.time)
    }

    /// 가장 늦은 캔들 시각.
    pub fn last_time(&self) -> Option<CandleTime> {
        self.rows.last().map(|c| c.time)
    }

    /// 해당 시각의 캔들.
    pub fn get(&self, time: &CandleTime) -> Option<&Candle> {
        self.rows
            .binary_search_by(|c| c.time.cmp(time))
            .ok()
            .map(|idx| &self.rows[idx])
    }

    /// 양 끝을 포함하는 `[lower, upper]` 구간 밖의 행을 제거합니다.
    /// `None` 경계는 제한하지 않습니다.
    pub fn retain_between(&mut self, lower: Option<CandleTime>, upper: Option<CandleTime>) {
        self.rows.retain(|c| {
            lower.map_or(true, |l| c.time >= l) && upper.map_or(true, |u| c.time <= u)
        });
    }

    /// 조건을 만족하는 행만 남깁니다.
    pub fn retain<F: FnMut(&Candle) -> bool>(&mut self, f: F) {
        self.rows.retain(f);
    }
}

impl From<Vec<Candle>> for CandleTable {
    fn from(rows: Vec<Candle>) -> Self {
        Self::from_rows(rows)
    }
}

impl<'a> IntoIterator for &'a CandleTable {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
