//! Upbit 시세 API 클라이언트.
//!
//! 인증이 필요 없는 QUOTATION API만 사용합니다:
//! - `GET /v1/candles/minutes/1` — 1분봉 (최신순, 페이지당 최대 200개)
//! - `GET /v1/market/all?isDetails=true` — 마켓 카탈로그
//!
//! # 재시도 정책
//!
//! HTTP 429, 5xx, 연결 실패, 타임아웃은 고정 간격(`retry_interval`)으로 무한 재시도합니다.
//! 간격은 늘어나지 않고 횟수 제한도 없습니다. 그 외 에러는 즉시 반환합니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use minutebar_exchange::{UpbitClient, UpbitConfig};
//!
//! let client = UpbitClient::new(UpbitConfig::default())?;
//! let page = client.fetch_page("KRW-BTC", upto).await?;
//! let markets = client.fetch_markets().await?;
//! ```

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};

use minutebar_core::{
    Candle, CandleFetcher, CandleTable, CandleTime, MarketCaution, MarketInfo, MinutebarResult,
    TimeValue, SEOUL,
};

use crate::ExchangeError;

/// Upbit 분봉 API 페이지 최대 크기.
pub const MAX_PAGE_SIZE: usize = 200;

// ============================================================================
// 설정
// ============================================================================

/// Upbit 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct UpbitConfig {
    /// API Base URL
    pub base_url: String,
    /// 페이지당 캔들 수 (1..=200)
    pub page_size: usize,
    /// 재시도 전 대기 시간 (고정)
    pub retry_interval: Duration,
    /// 매 요청 전 대기 시간
    pub request_delay: Duration,
    /// 개별 HTTP 요청 타임아웃
    pub timeout: Duration,
}

impl Default for UpbitConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.upbit.com".to_string(),
            page_size: MAX_PAGE_SIZE,
            retry_interval: Duration::from_millis(500),
            request_delay: Duration::from_millis(100),
            timeout: Duration::from_secs(30),
        }
    }
}

// ============================================================================
// API 응답 타입
// ============================================================================

/// 1분봉 응답 항목. KST 필드는 UTC 필드로부터 다시 계산하므로 읽지 않습니다.
#[derive(Debug, Deserialize)]
struct UpbitMinuteCandle {
    candle_date_time_utc: String,
    opening_price: Decimal,
    high_price: Decimal,
    low_price: Decimal,
    trade_price: Decimal,
    candle_acc_trade_price: Decimal,
    candle_acc_trade_volume: Decimal,
}

impl UpbitMinuteCandle {
    fn into_candle(self) -> Result<Candle, ExchangeError> {
        let naive = NaiveDateTime::parse_from_str(&self.candle_date_time_utc, "%Y-%m-%dT%H:%M:%S")
            .map_err(|e| {
                ExchangeError::ParseError(format!(
                    "candle_date_time_utc {:?}: {}",
                    self.candle_date_time_utc, e
                ))
            })?;
        let time = Utc
            .from_utc_datetime(&naive)
            .with_timezone(&SEOUL)
            .fixed_offset();

        Ok(Candle {
            time,
            open: self.opening_price,
            high: self.high_price,
            low: self.low_price,
            close: self.trade_price,
            volume: self.candle_acc_trade_volume,
            trade_price: self.candle_acc_trade_price,
        })
    }
}

/// 마켓 카탈로그 응답 항목.
#[derive(Debug, Deserialize)]
struct UpbitMarket {
    market: String,
    korean_name: String,
    english_name: String,
    /// 구 버전 응답의 유의 종목 표시 ("NONE" / "CAUTION")
    #[serde(default)]
    market_warning: Option<String>,
    #[serde(default)]
    market_event: Option<UpbitMarketEvent>,
}

#[derive(Debug, Default, Deserialize)]
struct UpbitMarketEvent {
    #[serde(default)]
    warning: bool,
    #[serde(default)]
    caution: UpbitCaution,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct UpbitCaution {
    #[serde(default)]
    price_fluctuations: bool,
    #[serde(default)]
    trading_volume_soaring: bool,
    #[serde(default)]
    deposit_amount_soaring: bool,
    #[serde(default)]
    global_price_differences: bool,
    #[serde(default)]
    concentration_of_small_accounts: bool,
}

impl From<UpbitMarket> for MarketInfo {
    fn from(m: UpbitMarket) -> Self {
        let event = m.market_event.unwrap_or_default();
        let legacy_warning = m.market_warning.as_deref() == Some("CAUTION");
        MarketInfo {
            ticker: m.market,
            korean_name: m.korean_name,
            english_name: m.english_name,
            warning: event.warning || legacy_warning,
            caution: MarketCaution {
                price_fluctuations: event.caution.price_fluctuations,
                trading_volume_soaring: event.caution.trading_volume_soaring,
                deposit_amount_soaring: event.caution.deposit_amount_soaring,
                global_price_differences: event.caution.global_price_differences,
                concentration_of_small_accounts: event.caution.concentration_of_small_accounts,
            },
        }
    }
}

// ============================================================================
// Upbit 클라이언트
// ============================================================================

/// Upbit 시세 API 클라이언트.
#[derive(Clone)]
pub struct UpbitClient {
    client: Client,
    config: UpbitConfig,
}

impl UpbitClient {
    /// 설정으로 새 HTTP 클라이언트를 만들어 생성합니다.
    pub fn new(config: UpbitConfig) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExchangeError::Unknown(format!("HTTP 클라이언트 생성 실패: {}", e)))?;
        Ok(Self::with_client(client, config))
    }

    /// 외부에서 만든 HTTP 클라이언트를 공유하여 생성합니다.
    pub fn with_client(client: Client, mut config: UpbitConfig) -> Self {
        config.page_size = config.page_size.clamp(1, MAX_PAGE_SIZE);
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self { client, config }
    }

    pub fn config(&self) -> &UpbitConfig {
        &self.config
    }

    /// 마켓 카탈로그 전체를 조회합니다.
    pub async fn fetch_markets(&self) -> Result<Vec<MarketInfo>, ExchangeError> {
        let markets = self
            .with_retry("market/all", || self.request_markets())
            .await?;

        info!(count = markets.len(), "마켓 카탈로그 조회 완료");
        Ok(markets.into_iter().map(MarketInfo::from).collect())
    }

    async fn request_markets(&self) -> Result<Vec<UpbitMarket>, ExchangeError> {
        let url = format!("{}/v1/market/all", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("isDetails", "true")])
            .header("Accept", "application/json")
            .send()
            .await?;
        Self::parse_json(response).await
    }

    /// `to` 경계(UTC 문자열)로 1분봉 한 페이지를 요청합니다.
    async fn request_candles(
        &self,
        market: &str,
        to: &str,
    ) -> Result<Vec<UpbitMinuteCandle>, ExchangeError> {
        let url = format!("{}/v1/candles/minutes/1", self.config.base_url);
        let count = self.config.page_size.to_string();

        debug!(market = market, to = to, count = %count, "Upbit 분봉 요청");

        let response = self
            .client
            .get(&url)
            .query(&[("market", market), ("to", to), ("count", count.as_str())])
            .header("Accept", "application/json")
            .send()
            .await?;
        Self::parse_json(response).await
    }

    async fn parse_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, ExchangeError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::from_status(status.as_u16(), body));
        }
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::NetworkError(format!("응답 본문 수신 실패: {}", e)))?;
        Ok(serde_json::from_str(&body)?)
    }

    /// 재시도 가능한 에러가 나면 고정 간격으로 같은 요청을 반복합니다.
    async fn with_retry<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, ExchangeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ExchangeError>>,
    {
        let mut attempt: u64 = 0;
        loop {
            if !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    attempt += 1;
                    warn!(
                        request = label,
                        attempt = attempt,
                        error = %e,
                        retry_in_ms = self.config.retry_interval.as_millis() as u64,
                        "요청 실패, 재시도"
                    );
                    tokio::time::sleep(self.config.retry_interval).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl CandleFetcher for UpbitClient {
    /// `upto`(포함)까지의 1분봉 한 페이지를 조회합니다.
    ///
    /// API의 `to` 파라미터가 경계 분을 빠뜨리는 경우가 있어 1초를 더해 요청하고,
    /// 응답에서 `upto` 이후 행은 버립니다.
    async fn fetch_page(
        &self,
        instrument: &str,
        upto: CandleTime,
    ) -> MinutebarResult<CandleTable> {
        let mut boundary = TimeValue::from(upto);
        boundary.add_seconds(1)?;
        let to = boundary.to_utc_string()?;

        let raw = self
            .with_retry("candles/minutes/1", || self.request_candles(instrument, &to))
            .await?;

        let rows = raw
            .into_iter()
            .map(UpbitMinuteCandle::into_candle)
            .collect::<Result<Vec<_>, _>>()?;
        let mut table = CandleTable::from_rows(rows);
        table.retain_between(None, Some(upto));

        info!(
            instrument = instrument,
            upto = %upto,
            rows = table.len(),
            first = ?table.first_time(),
            "분봉 페이지 수집"
        );

        Ok(table)
    }
}
