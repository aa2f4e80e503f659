//! 분봉 동기화 시스템의 에러 타입.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum MinutebarError {
    /// 시각 문자열 형식 오류 (YYYYMMDD / YYMMDD 외 입력)
    #[error("형식 에러: {0}")]
    Format(String),

    /// 허용되지 않는 연산 (예: 값이 없는 TimeValue 비교)
    #[error("잘못된 연산: {0}")]
    InvalidOperation(String),

    /// 호출 계약 위반 (예: 시작 시각 >= 종료 시각)
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 재시도 대상이 아닌 외부 데이터 수집 실패
    #[error("수집 에러: {0}")]
    Fetch(String),
}

/// 도메인 작업을 위한 Result 타입.
pub type MinutebarResult<T> = Result<T, MinutebarError>;

impl MinutebarError {
    /// 호출자의 프로그래밍 오류로 인한 에러인지 확인합니다.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            MinutebarError::InvalidOperation(_) | MinutebarError::InvalidInput(_)
        )
    }
}
