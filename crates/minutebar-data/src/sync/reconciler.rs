//! 종목 단위 분봉 동기화 엔진.
//!
//! # 동작 흐름
//!
//! ```text
//! synchronize(instrument, start?, end?, backfill)
//!         │
//!         ▼
//! ┌───────────────────────────┐
//! │ 1. 상한 = end ?? now       │ ← backfill=false면 하한을 저장된 최신 행으로 올림
//! └─────────────┬─────────────┘
//!               │
//! ┌─────────────▼─────────────┐
//! │ 2. 월 단위 역방향 순회       │ ← 하한이 걸린 월이 마지막
//! └─────────────┬─────────────┘
//!               │
//!         ┌─────┴─────┐
//!         │ 파티션 비어 │
//!         │   있음?    │
//!         └─────┬─────┘
//!           YES │ NO
//!               │   │
//!    전체 월 수집  │   ├─ (backfill) 갭 채우기 → 과거 방향 확장
//!               │   └─ 최신 방향 확장
//!               │
//! ┌─────────────▼─────────────┐
//! │ 3. 병합 후 파티션 저장       │ ← 변경이 없으면 쓰지 않음
//! └───────────────────────────┘
//! ```
//!
//! 과거 방향으로 페이지를 넘기다가 빈 페이지나 한 행짜리 페이지를 만나면
//! 더 이상 과거 데이터가 없다고 보고 월 순회를 끝냅니다.

use std::sync::Arc;

use chrono::Datelike;
use tracing::{debug, info, instrument};

use minutebar_core::{
    find_gaps, merge_rows, CandleFetcher, CandleTable, CandleTime, Clock, MinutebarError,
    SystemClock, TimeValue, MINUTE, SEOUL,
};

use super::report::SyncReport;
use crate::error::Result;
use crate::storage::PartitionedStore;

/// 구간 수집 결과.
struct RangeFetch {
    table: CandleTable,
    /// 빈 페이지 또는 한 행짜리 페이지를 만났는지 여부
    exhausted: bool,
}

/// 파티션 저장소와 캔들 수집기를 조율하는 동기화 엔진.
///
/// 한 종목에 대해 동시에 하나의 동기화만 실행된다고 가정합니다.
/// 종목이 다르면 저장 경로가 분리되므로 여러 인스턴스를 병렬로 실행해도 됩니다.
pub struct SyncReconciler {
    store: PartitionedStore,
    fetcher: Arc<dyn CandleFetcher>,
    clock: Arc<dyn Clock>,
}

impl SyncReconciler {
    pub fn new(store: PartitionedStore, fetcher: Arc<dyn CandleFetcher>) -> Self {
        Self {
            store,
            fetcher,
            clock: Arc::new(SystemClock),
        }
    }

    /// 현재 시각 제공자를 교체합니다.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &PartitionedStore {
        &self.store
    }

    /// 한 종목의 분봉을 요청 구간에 맞게 동기화합니다.
    ///
    /// - `requested_start`: 이보다 과거로는 내려가지 않음 (none이면 과거 데이터 끝까지)
    /// - `requested_end`: 이보다 최신은 수집하지 않음 (none이면 현재 시각)
    /// - `backfill`: false면 저장된 최신 행 이후만 수집, true면 갭/과거 방향도 채움
    ///
    /// 저장 실패는 즉시 반환됩니다. 이미 저장된 파티션은 원자적 쓰기로 보호됩니다.
    #[instrument(
        skip(self, requested_start, requested_end),
        fields(start = %requested_start, end = %requested_end)
    )]
    pub async fn synchronize(
        &self,
        instrument: &str,
        requested_start: TimeValue,
        requested_end: TimeValue,
        backfill: bool,
    ) -> Result<SyncReport> {
        if requested_start.is_some()
            && requested_end.is_some()
            && requested_start.is_at_or_after(&requested_end)?
        {
            return Err(MinutebarError::InvalidInput(format!(
                "시작 시각({})이 종료 시각({})보다 늦거나 같습니다",
                requested_start, requested_end
            ))
            .into());
        }

        let mut report = SyncReport::new(instrument);
        let now = self.clock.now();
        let upper = candle_time(&requested_end).map_or(now, |end| end.min(now));
        let mut lower = candle_time(&requested_start);

        if !backfill {
            if let Some(latest) = self.store.latest_row_time(instrument).await? {
                debug!(latest = %latest, "저장된 최신 행 이후부터 수집");
                lower = Some(lower.map_or(latest, |lo| lo.max(latest)));
            }
        }

        if let Some(lo) = lower {
            if lo >= upper {
                info!(lower = %lo, upper = %upper, "수집할 구간 없음");
                return Ok(report);
            }
        }

        let mut month_end = upper;
        loop {
            let mut month_start = start_of_month(month_end)?;
            let mut last_month = false;
            if let Some(lo) = lower {
                if month_start <= lo {
                    month_start = lo;
                    last_month = true;
                }
            }

            let exhausted = self
                .reconcile_month(instrument, month_start, month_end, backfill, &mut report)
                .await?;

            if exhausted {
                report.history_exhausted = true;
                info!(month_start = %month_start, "과거 데이터 끝 도달, 순회 종료");
                break;
            }
            if last_month {
                break;
            }
            month_end = end_of_previous_month(month_start)?;
        }

        info!(
            months = report.months_visited,
            partitions_written = report.partitions_written,
            rows_added = report.rows_added,
            pages = report.pages_fetched,
            gaps = report.gaps_found,
            exhausted = report.history_exhausted,
            "동기화 완료"
        );
        Ok(report)
    }

    /// `[month_start, month_end]` 구간 하나를 처리하고 과거 데이터 끝 도달 여부를 반환합니다.
    async fn reconcile_month(
        &self,
        instrument: &str,
        month_start: CandleTime,
        month_end: CandleTime,
        backfill: bool,
        report: &mut SyncReport,
    ) -> Result<bool> {
        let (year, month) = (month_start.year(), month_start.month());
        let stored = self.store.load_partition(instrument, year, month).await?;
        report.months_visited += 1;

        let mut merged = stored.clone();
        let mut exhausted = false;

        match (stored.first_time(), stored.last_time()) {
            (Some(earliest), Some(latest)) => {
                if backfill {
                    let gaps = find_gaps(&stored, MINUTE);
                    report.gaps_found += gaps.len();
                    for gap in gaps {
                        let start = gap.start.max(month_start);
                        let end = gap.end.min(month_end);
                        if start > end {
                            continue;
                        }
                        debug!(phase = "gap", start = %start, end = %end, "갭 채우기");
                        // 갭 구간 수집 중 과거 데이터 끝 신호는 순회에 영향을 주지 않음
                        let fetched = self.fetch_range(instrument, start, end, report).await?;
                        merged = merge_rows(&merged, &fetched.table);
                    }

                    if month_start < earliest {
                        debug!(phase = "backward", from = %month_start, to = %earliest, "과거 방향 확장");
                        let mut fetched = self
                            .fetch_range(instrument, month_start, earliest, report)
                            .await?;
                        fetched.table.retain(|c| c.time < earliest);
                        merged = merge_rows(&merged, &fetched.table);
                        exhausted = fetched.exhausted;
                    }
                }

                if month_end > latest {
                    debug!(phase = "forward", from = %latest, to = %month_end, "최신 방향 확장");
                    let mut fetched = self.fetch_range(instrument, latest, month_end, report).await?;
                    fetched.table.retain(|c| c.time > latest);
                    merged = merge_rows(&merged, &fetched.table);
                }
            }
            _ => {
                debug!(phase = "fresh", from = %month_start, to = %month_end, "월 전체 수집");
                let fetched = self
                    .fetch_range(instrument, month_start, month_end, report)
                    .await?;
                merged = fetched.table;
                exhausted = fetched.exhausted;
            }
        }

        if merged.is_empty() {
            debug!(year = year, month = month, "저장할 행 없음");
            return Ok(exhausted);
        }
        if merged == stored {
            debug!(year = year, month = month, "변경 없음, 저장 생략");
            return Ok(exhausted);
        }

        self.store
            .save_partition(instrument, year, month, &merged)
            .await?;
        report.partitions_written += 1;
        report.rows_added += merged.len().saturating_sub(stored.len());
        Ok(exhausted)
    }

    /// `upper`부터 과거 방향으로 페이지를 넘기며 `[lower, upper]` 구간을 수집합니다.
    ///
    /// 다음 페이지의 경계는 지금까지 받은 가장 오래된 시각입니다. 그 시각 이전 데이터가
    /// 없으면 해당 행 하나만 돌아오므로, 한 행짜리 페이지를 과거 데이터 끝으로 봅니다.
    async fn fetch_range(
        &self,
        instrument: &str,
        lower: CandleTime,
        upper: CandleTime,
        report: &mut SyncReport,
    ) -> Result<RangeFetch> {
        let mut collected = CandleTable::new();
        let mut upto = upper;
        let mut exhausted = false;

        loop {
            let page = self.fetcher.fetch_page(instrument, upto).await?;
            report.pages_fetched += 1;

            let Some(earliest) = page.first_time() else {
                exhausted = true;
                break;
            };
            let sentinel = page.len() == 1;
            collected = merge_rows(&collected, &page);

            if sentinel {
                exhausted = true;
                break;
            }
            // 페이지가 더 과거로 진행하지 못하면 중단
            if earliest <= lower || earliest >= upto {
                break;
            }
            upto = earliest;
        }

        collected.retain_between(Some(lower), Some(upper));
        Ok(RangeFetch {
            table: collected,
            exhausted,
        })
    }
}

fn candle_time(value: &TimeValue) -> Option<CandleTime> {
    value
        .to_datetime()
        .map(|t| t.with_timezone(&SEOUL).fixed_offset())
}

fn start_of_month(time: CandleTime) -> Result<CandleTime> {
    Ok(TimeValue::from(time).start_of_month()?.to_fixed()?)
}

fn end_of_previous_month(time: CandleTime) -> Result<CandleTime> {
    Ok(TimeValue::from(time).end_of_previous_month()?.to_fixed()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_month_helpers() {
        let t = SEOUL
            .with_ymd_and_hms(2024, 3, 10, 12, 30, 0)
            .unwrap()
            .fixed_offset();
        let start = start_of_month(t).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-03-01T00:00:00+09:00");
        let prev = end_of_previous_month(start).unwrap();
        assert_eq!(prev.to_rfc3339(), "2024-02-29T23:59:59+09:00");
    }

    #[test]
    fn test_candle_time_of_none() {
        assert!(candle_time(&TimeValue::none()).is_none());
    }
}
