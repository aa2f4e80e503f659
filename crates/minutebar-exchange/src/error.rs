//! 거래소 에러 타입.

use minutebar_core::MinutebarError;
use thiserror::Error;

/// 거래소 API 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 요청 한도 초과 (HTTP 429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// 거래소 서버 일시 장애 (HTTP 5xx)
    #[error("Service unavailable {code}: {message}")]
    ServiceUnavailable { code: u16, message: String },

    /// API 에러 코드 (HTTP 4xx)
    #[error("API error {code}: {message}")]
    ApiError { code: u16, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 알 수 없는 에러
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ExchangeError {
    /// 재시도 가능한 에러인지 확인.
    ///
    /// 재시도 가능한 에러는 수집기 내부에서 고정 간격으로 무한 재시도됩니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExchangeError::NetworkError(_)
                | ExchangeError::RateLimited
                | ExchangeError::ServiceUnavailable { .. }
                | ExchangeError::Timeout(_)
        )
    }

    /// HTTP 상태 코드와 응답 본문으로 에러를 분류합니다.
    pub fn from_status(code: u16, message: String) -> Self {
        match code {
            429 => ExchangeError::RateLimited,
            500..=599 => ExchangeError::ServiceUnavailable { code, message },
            _ => ExchangeError::ApiError { code, message },
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() || err.is_body() || err.is_decode() {
            // 본문 디코딩은 serde_json에서 따로 하므로 reqwest의 decode 에러는 본문 수신 중단
            ExchangeError::NetworkError(err.to_string())
        } else {
            ExchangeError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}

impl From<ExchangeError> for MinutebarError {
    fn from(err: ExchangeError) -> Self {
        MinutebarError::Fetch(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ExchangeError::from_status(429, String::new()),
            ExchangeError::RateLimited
        ));
        assert!(ExchangeError::from_status(503, "down".into()).is_retryable());
        assert!(!ExchangeError::from_status(400, "bad market".into()).is_retryable());
        assert!(!ExchangeError::ParseError("eof".into()).is_retryable());
        assert!(ExchangeError::Timeout("30s".into()).is_retryable());
    }

    #[test]
    fn test_json_error_is_parse_error() {
        let err: ExchangeError = serde_json::from_str::<Vec<u32>>("not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, ExchangeError::ParseError(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_into_core_error() {
        let err: MinutebarError = ExchangeError::ApiError {
            code: 404,
            message: "Code not found".into(),
        }
        .into();
        assert!(matches!(err, MinutebarError::Fetch(msg) if msg.contains("404")));
    }
}
