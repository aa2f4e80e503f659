//! 저장소 현황 조회 모듈.

use minutebar_core::{CandleTime, TimeValue};
use minutebar_data::PartitionedStore;

use crate::Result;

/// 종목별 저장 현황
#[derive(Debug, Clone)]
pub struct InstrumentStatus {
    pub instrument: String,
    /// 파티션 파일 수
    pub partitions: usize,
    /// 가장 오래된 파티션의 월 시작
    pub earliest: TimeValue,
    /// 가장 최근 파티션의 월 끝
    pub latest: TimeValue,
    /// 최근 파티션의 행 수
    pub latest_rows: usize,
    /// 최근 파티션의 마지막 행 시각
    pub last_row: Option<CandleTime>,
}

/// 대상 종목들의 저장 현황 수집
pub async fn collect_status(
    store: &PartitionedStore,
    targets: &[String],
) -> Result<Vec<InstrumentStatus>> {
    let mut statuses = Vec::with_capacity(targets.len());

    for instrument in targets {
        let keys = store.partition_keys(instrument).await?;
        let (latest_rows, last_row) = match keys.last() {
            Some(&(year, month)) => {
                let table = store.load_partition(instrument, year, month).await?;
                (table.len(), table.last_time())
            }
            None => (0, None),
        };

        statuses.push(InstrumentStatus {
            instrument: instrument.clone(),
            partitions: keys.len(),
            earliest: store.earliest_partition_instant(instrument).await?,
            latest: store.latest_partition_instant(instrument).await?,
            latest_rows,
            last_row,
        });
    }

    Ok(statuses)
}

/// 현황 로그 출력
pub fn log_status(statuses: &[InstrumentStatus]) {
    for s in statuses {
        if s.partitions == 0 {
            tracing::info!(instrument = %s.instrument, "저장된 파티션 없음");
            continue;
        }
        tracing::info!(
            instrument = %s.instrument,
            partitions = s.partitions,
            earliest = %s.earliest,
            latest = %s.latest,
            latest_rows = s.latest_rows,
            last_row = ?s.last_row,
            "저장 현황"
        );
    }
}
