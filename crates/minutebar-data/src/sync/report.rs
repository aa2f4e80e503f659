//! 동기화 실행 결과.

use serde::Serialize;

/// 한 종목에 대한 `synchronize` 실행 결과.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// 종목 코드
    pub instrument: String,
    /// 방문한 월 수
    pub months_visited: usize,
    /// 실제로 다시 쓴 파티션 수
    pub partitions_written: usize,
    /// 새로 추가된 행 수
    pub rows_added: usize,
    /// 수집기 페이지 요청 수
    pub pages_fetched: usize,
    /// 발견된 내부 갭 수 (backfill 모드)
    pub gaps_found: usize,
    /// 과거 데이터 끝에 도달했는지 여부
    pub history_exhausted: bool,
}

impl SyncReport {
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            ..Default::default()
        }
    }

    /// 저장소에 변경이 있었는지 확인합니다.
    pub fn is_changed(&self) -> bool {
        self.partitions_written > 0
    }
}
