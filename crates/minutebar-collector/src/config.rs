//! 환경변수 기반 설정 모듈.

use std::path::PathBuf;
use std::time::Duration;

use minutebar_core::TimeValue;
use minutebar_exchange::UpbitConfig;

use crate::error::CollectorError;
use crate::Result;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 파티션 파일 루트 디렉토리
    pub database_root: PathBuf,
    /// Upbit API 설정
    pub upbit: UpbitSettings,
    /// 분봉 동기화 설정
    pub sync: SyncConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// Upbit API 설정
#[derive(Debug, Clone)]
pub struct UpbitSettings {
    /// API Base URL
    pub base_url: String,
    /// 페이지당 캔들 수 (최대 200)
    pub page_size: usize,
    /// 재시도 간격 (밀리초)
    pub retry_interval_ms: u64,
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
    /// HTTP 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

/// 분봉 동기화 설정
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// 기본 대상 종목의 호가 통화 (예: "KRW")
    pub quote_currency: String,
    /// 동시에 동기화할 종목 수
    pub concurrency: usize,
    /// 갭 채우기 / 과거 방향 확장 여부
    pub backfill: bool,
    /// 수집 시작 날짜 (YYYYMMDD 또는 YYMMDD)
    pub start_date: Option<String>,
    /// 수집 종료 날짜 (YYYYMMDD 또는 YYMMDD)
    pub end_date: Option<String>,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 워크플로우 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_root: std::env::var("DATABASE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./database")),
            upbit: UpbitSettings {
                base_url: std::env::var("UPBIT_BASE_URL")
                    .unwrap_or_else(|_| "https://api.upbit.com".to_string()),
                page_size: env_var_parse("UPBIT_PAGE_SIZE", 200),
                retry_interval_ms: env_var_parse("UPBIT_RETRY_INTERVAL_MS", 500),
                request_delay_ms: env_var_parse("UPBIT_REQUEST_DELAY_MS", 100),
                timeout_secs: env_var_parse("UPBIT_TIMEOUT_SECS", 30),
            },
            sync: SyncConfig {
                quote_currency: std::env::var("SYNC_QUOTE_CURRENCY")
                    .unwrap_or_else(|_| "KRW".to_string()),
                concurrency: env_var_parse("SYNC_CONCURRENCY", 1),
                backfill: env_var_bool("SYNC_BACKFILL", false),
                start_date: env_var_opt("SYNC_START_DATE"),
                end_date: env_var_opt("SYNC_END_DATE"),
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 10),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// 값 범위 검증
    pub fn validate(&self) -> Result<()> {
        if self.upbit.page_size == 0 || self.upbit.page_size > 200 {
            return Err(CollectorError::Config(format!(
                "UPBIT_PAGE_SIZE는 1~200 사이여야 합니다: {}",
                self.upbit.page_size
            )));
        }
        if self.sync.concurrency == 0 {
            return Err(CollectorError::Config(
                "SYNC_CONCURRENCY는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.daemon.interval_minutes == 0 {
            return Err(CollectorError::Config(
                "DAEMON_INTERVAL_MINUTES는 1 이상이어야 합니다".to_string(),
            ));
        }
        self.sync.time_range()?;
        Ok(())
    }
}

impl UpbitSettings {
    /// 거래소 클라이언트 설정으로 변환
    pub fn to_client_config(&self) -> UpbitConfig {
        UpbitConfig {
            base_url: self.base_url.clone(),
            page_size: self.page_size,
            retry_interval: Duration::from_millis(self.retry_interval_ms),
            request_delay: Duration::from_millis(self.request_delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl SyncConfig {
    /// 설정된 날짜 범위를 TimeValue로 변환 (미설정은 none)
    pub fn time_range(&self) -> Result<(TimeValue, TimeValue)> {
        Ok((
            parse_date(self.start_date.as_deref())?,
            parse_date(self.end_date.as_deref())?,
        ))
    }
}

impl DaemonConfig {
    /// 워크플로우 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// 날짜 문자열을 TimeValue로 파싱 (없으면 none)
pub fn parse_date(value: Option<&str>) -> Result<TimeValue> {
    match value {
        Some(s) => Ok(TimeValue::parse(s.trim())?),
        None => Ok(TimeValue::none()),
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

/// 비어 있지 않은 환경변수 값
fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CollectorConfig {
        CollectorConfig {
            database_root: PathBuf::from("./database"),
            upbit: UpbitSettings {
                base_url: "https://api.upbit.com".to_string(),
                page_size: 200,
                retry_interval_ms: 500,
                request_delay_ms: 100,
                timeout_secs: 30,
            },
            sync: SyncConfig {
                quote_currency: "KRW".to_string(),
                concurrency: 1,
                backfill: false,
                start_date: None,
                end_date: None,
            },
            daemon: DaemonConfig {
                interval_minutes: 10,
            },
        }
    }

    #[test]
    fn test_env_helpers() {
        std::env::set_var("MINUTEBAR_TEST_PARSE", "42");
        std::env::set_var("MINUTEBAR_TEST_BOOL", "1");
        std::env::set_var("MINUTEBAR_TEST_BLANK", "  ");

        assert_eq!(env_var_parse("MINUTEBAR_TEST_PARSE", 0u64), 42);
        assert_eq!(env_var_parse("MINUTEBAR_TEST_MISSING", 7u64), 7);
        assert!(env_var_bool("MINUTEBAR_TEST_BOOL", false));
        assert!(env_var_opt("MINUTEBAR_TEST_BLANK").is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = sample();
        assert!(config.validate().is_ok());

        config.upbit.page_size = 500;
        assert!(matches!(config.validate(), Err(CollectorError::Config(_))));

        let mut config = sample();
        config.sync.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = sample();
        config.sync.start_date = Some("2024-01-01".to_string());
        assert!(matches!(config.validate(), Err(CollectorError::Core(_))));
    }

    #[test]
    fn test_time_range() {
        let mut config = sample();
        config.sync.start_date = Some("240101".to_string());
        let (start, end) = config.sync.time_range().unwrap();
        assert_eq!(start.to_local_string().unwrap(), "2024-01-01 00:00:00");
        assert!(end.is_none());
    }

    #[test]
    fn test_client_config_conversion() {
        let client = sample().upbit.to_client_config();
        assert_eq!(client.retry_interval, Duration::from_millis(500));
        assert_eq!(client.timeout, Duration::from_secs(30));
    }
}
