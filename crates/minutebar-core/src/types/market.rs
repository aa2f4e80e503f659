//! 마켓(종목) 카탈로그 항목.

use serde::{Deserialize, Serialize};

/// 거래소가 종목별로 제공하는 시장 주의 플래그.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketCaution {
    /// 가격 급등락
    pub price_fluctuations: bool,
    /// 거래량 급등
    pub trading_volume_soaring: bool,
    /// 입금량 급등
    pub deposit_amount_soaring: bool,
    /// 글로벌 시세 차이
    pub global_price_differences: bool,
    /// 소수 계정 집중
    pub concentration_of_small_accounts: bool,
}

impl MarketCaution {
    /// 주의 플래그가 하나라도 켜져 있는지 확인합니다.
    pub fn any(&self) -> bool {
        self.price_fluctuations
            || self.trading_volume_soaring
            || self.deposit_amount_soaring
            || self.global_price_differences
            || self.concentration_of_small_accounts
    }
}

/// 카탈로그에 저장되는 종목 정보 (비시계열, 단일 파일 테이블).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfo {
    /// 마켓 코드 (예: "KRW-BTC")
    pub ticker: String,
    /// 한글 종목명
    pub korean_name: String,
    /// 영문 종목명
    pub english_name: String,
    /// 유의 종목 여부
    pub warning: bool,
    /// 시장 주의 세부 플래그
    #[serde(default)]
    pub caution: MarketCaution,
}

impl MarketInfo {
    /// 호가 통화 (예: "KRW-BTC" → "KRW").
    pub fn quote_currency(&self) -> &str {
        self.ticker.split('-').next().unwrap_or_default()
    }
}
