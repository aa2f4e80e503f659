//! 외부 캔들 수집기와 시계 추상화.
//!
//! 동기화 엔진은 거래소 구현을 직접 알지 못하고 이 trait들만 사용합니다.
//! 테스트에서는 스크립트된 수집기와 고정 시계를 주입합니다.

use async_trait::async_trait;
use chrono::Utc;

use crate::error::MinutebarResult;
use crate::types::{CandleTable, CandleTime, SEOUL};

/// 분봉 페이지 수집기 trait.
///
/// # 계약
///
/// - `upto` 시각(포함)에서 끝나는 최대 한 페이지 분량의 캔들을 오름차순으로 반환합니다.
/// - 해당 경계 이전 데이터가 없으면 빈 테이블을 반환합니다.
/// - 정확히 한 행짜리 페이지는 "이 시점 이전 과거 데이터 없음"을 뜻합니다.
/// - 일시적 네트워크 장애와 요청 한도 초과는 구현 내부에서 처리하며 에러로 올리지 않습니다.
#[async_trait]
pub trait CandleFetcher: Send + Sync {
    /// `upto`까지의 최신 캔들 한 페이지를 조회합니다.
    async fn fetch_page(&self, instrument: &str, upto: CandleTime)
        -> MinutebarResult<CandleTable>;
}

/// 현재 시각 제공자.
pub trait Clock: Send + Sync {
    fn now(&self) -> CandleTime;
}

/// 시스템 시계 (서울 시각).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> CandleTime {
        Utc::now().with_timezone(&SEOUL).fixed_offset()
    }
}

/// 항상 같은 시각을 반환하는 시계.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub CandleTime);

impl Clock for FixedClock {
    fn now(&self) -> CandleTime {
        self.0
    }
}
