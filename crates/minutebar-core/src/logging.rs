//! 동기화 로그 출력 설정.
//!
//! 파티션 로드/저장, 페이지 수집, 재시도가 모두 `tracing` 이벤트로 남습니다.
//! 기본 필터는 `minutebar_*` 크레이트만 info로 열고 나머지 의존성은 warn으로 둡니다.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// `RUST_LOG`가 없을 때 쓰는 필터
pub const DEFAULT_FILTER: &str =
    "warn,minutebar_core=info,minutebar_exchange=info,minutebar_data=info,minutebar_collector=info";

/// 로그 출력 형식 (`LOG_FORMAT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 터미널용 여러 줄 출력
    #[default]
    Pretty,
    /// 로그 수집기용 한 줄 JSON
    Json,
    /// 데몬 로그 파일용 한 줄 텍스트
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(format!("알 수 없는 로그 형식: {}", other)),
        }
    }
}

/// 로그 필터와 출력 형식.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` 지시어 (예: "minutebar_data=debug")
    pub level: String,
    pub format: LogFormat,
}

impl LogConfig {
    /// `RUST_LOG`, `LOG_FORMAT`에서 읽고 없으면 기본값 사용.
    pub fn from_env() -> Self {
        let level = std::env::var("RUST_LOG")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let format = std::env::var("LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        Self { level, format }
    }
}

/// 전역 subscriber를 설치합니다. 두 번째 호출은 에러를 돌려줍니다.
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_new(&config.level)?;

    let layer = match config.format {
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()?;

    tracing::debug!(format = ?config.format, filter = %config.level, "로깅 초기화");
    Ok(())
}

/// 환경변수 설정으로 로깅 초기화
pub fn init_logging_from_env() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LogConfig::from_env())
}

/// 종목 필드를 가진 동기화 span
#[macro_export]
macro_rules! sync_span {
    ($name:expr, $instrument:expr) => {
        tracing::info_span!($name, instrument = %$instrument)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!(" Json ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("COMPACT".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_filter_is_valid() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
