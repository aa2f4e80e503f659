//! 타임존을 가진 시각 래퍼.
//!
//! `TimeValue`는 "값 없음" 상태를 구체적인 시각과 구분되는 유효한 값으로
//! 취급합니다. 동기화 구간의 열린 경계(시작/종료 미지정)를 표현하는 데 쓰입니다.
//!
//! 필드 변경 연산(`set_minute`, `set_month` 등)은 달력 기준 자리올림을 수행합니다.
//! 예를 들어 `set_minute(75)`는 다음 시간의 15분으로, 1월에서 `set_month(0)`은
//! 전년도 12월로 이동합니다.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, FixedOffset, Months, NaiveDate, TimeDelta, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

use crate::error::{MinutebarError, MinutebarResult};

/// 캔들 인덱스와 파티션 경계에 사용하는 기본 타임존.
pub const SEOUL: Tz = chrono_tz::Asia::Seoul;

/// 외부 API 요청용 시각 문자열 형식.
const WIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 타임존을 가진 시각. 값이 없는 상태(`none`)를 허용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeValue {
    time: Option<DateTime<Tz>>,
}

impl TimeValue {
    /// 값이 없는 TimeValue.
    pub const fn none() -> Self {
        Self { time: None }
    }

    /// 현재 서울 시각.
    pub fn now() -> Self {
        Self::now_in(SEOUL)
    }

    /// 지정한 타임존의 현재 시각.
    pub fn now_in(tz: Tz) -> Self {
        Self {
            time: Some(Utc::now().with_timezone(&tz)),
        }
    }

    /// 날짜 문자열을 서울 자정 시각으로 파싱합니다.
    ///
    /// 허용 형식:
    /// - `YYYYMMDD` (8자리)
    /// - `YYMMDD` (6자리, 50 미만은 20xx, 그 외는 19xx)
    pub fn parse(input: &str) -> MinutebarResult<Self> {
        let s = input.trim();
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(MinutebarError::Format(format!(
                "날짜 문자열은 숫자만 허용됩니다: {:?}",
                input
            )));
        }

        let full = match s.len() {
            8 => s.to_string(),
            6 => {
                let yy: u32 = s[..2]
                    .parse()
                    .map_err(|_| MinutebarError::Format(format!("연도 파싱 실패: {:?}", input)))?;
                let century = if yy < 50 { "20" } else { "19" };
                format!("{}{}", century, s)
            }
            _ => {
                return Err(MinutebarError::Format(format!(
                    "지원하지 않는 날짜 길이 ({}자리): {:?}",
                    s.len(),
                    input
                )))
            }
        };

        let date = NaiveDate::parse_from_str(&full, "%Y%m%d")
            .map_err(|e| MinutebarError::Format(format!("{:?}: {}", input, e)))?;
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| MinutebarError::Format(format!("자정 계산 실패: {:?}", input)))?;
        let time = SEOUL
            .from_local_datetime(&midnight)
            .single()
            .ok_or_else(|| MinutebarError::Format(format!("모호한 현지 시각: {:?}", input)))?;

        Ok(Self { time: Some(time) })
    }

    /// 값이 없는지 확인합니다.
    pub fn is_none(&self) -> bool {
        self.time.is_none()
    }

    /// 구체적인 시각인지 확인합니다.
    pub fn is_some(&self) -> bool {
        self.time.is_some()
    }

    /// 내부 시각을 반환합니다.
    pub fn to_datetime(&self) -> Option<DateTime<Tz>> {
        self.time
    }

    /// 고정 오프셋 시각으로 변환합니다. 캔들 타임스탬프와 비교할 때 사용합니다.
    pub fn to_fixed(&self) -> MinutebarResult<DateTime<FixedOffset>> {
        Ok(self.require("to_fixed")?.fixed_offset())
    }

    /// 연결된 타임존.
    pub fn timezone(&self) -> Option<Tz> {
        self.time.map(|t| t.timezone())
    }

    /// 같은 시점을 다른 타임존으로 표현합니다.
    pub fn with_timezone(&self, tz: Tz) -> Self {
        Self {
            time: self.time.map(|t| t.with_timezone(&tz)),
        }
    }

    /// UTC로 표현한 사본.
    pub fn to_utc(&self) -> Self {
        self.with_timezone(chrono_tz::UTC)
    }

    /// 두 시각을 비교합니다. 어느 한쪽이라도 값이 없으면 에러입니다.
    pub fn try_cmp(&self, other: &TimeValue) -> MinutebarResult<Ordering> {
        match (self.time, other.time) {
            (Some(a), Some(b)) => Ok(a.cmp(&b)),
            _ => Err(MinutebarError::InvalidOperation(format!(
                "값이 없는 시각과는 비교할 수 없습니다: {} vs {}",
                self, other
            ))),
        }
    }

    /// `self < other`
    pub fn is_before(&self, other: &TimeValue) -> MinutebarResult<bool> {
        Ok(self.try_cmp(other)? == Ordering::Less)
    }

    /// `self <= other`
    pub fn is_at_or_before(&self, other: &TimeValue) -> MinutebarResult<bool> {
        Ok(self.try_cmp(other)? != Ordering::Greater)
    }

    /// `self > other`
    pub fn is_after(&self, other: &TimeValue) -> MinutebarResult<bool> {
        Ok(self.try_cmp(other)? == Ordering::Greater)
    }

    /// `self >= other`
    pub fn is_at_or_after(&self, other: &TimeValue) -> MinutebarResult<bool> {
        Ok(self.try_cmp(other)? != Ordering::Less)
    }

    pub fn year(&self) -> MinutebarResult<i32> {
        Ok(self.require("year")?.year())
    }

    pub fn month(&self) -> MinutebarResult<u32> {
        Ok(self.require("month")?.month())
    }

    pub fn day(&self) -> MinutebarResult<u32> {
        Ok(self.require("day")?.day())
    }

    pub fn hour(&self) -> MinutebarResult<u32> {
        Ok(self.require("hour")?.hour())
    }

    pub fn minute(&self) -> MinutebarResult<u32> {
        Ok(self.require("minute")?.minute())
    }

    pub fn second(&self) -> MinutebarResult<u32> {
        Ok(self.require("second")?.second())
    }

    /// 초 단위로 시각을 이동합니다 (음수 허용).
    pub fn add_seconds(&mut self, seconds: i64) -> MinutebarResult<()> {
        self.shift(TimeDelta::try_seconds(seconds), "add_seconds")
    }

    /// 초 필드를 설정합니다. 범위를 벗어나면 분으로 자리올림됩니다.
    pub fn set_second(&mut self, second: i64) -> MinutebarResult<()> {
        let current = self.require("set_second")?;
        self.shift(
            TimeDelta::try_seconds(second - i64::from(current.second())),
            "set_second",
        )
    }

    /// 분 필드를 설정합니다. 예: `set_minute(75)` → 다음 시간의 15분.
    pub fn set_minute(&mut self, minute: i64) -> MinutebarResult<()> {
        let current = self.require("set_minute")?;
        self.shift(
            TimeDelta::try_minutes(minute - i64::from(current.minute())),
            "set_minute",
        )
    }

    /// 시 필드를 설정합니다. 24 이상이면 다음 날로 자리올림됩니다.
    pub fn set_hour(&mut self, hour: i64) -> MinutebarResult<()> {
        let current = self.require("set_hour")?;
        self.shift(
            TimeDelta::try_hours(hour - i64::from(current.hour())),
            "set_hour",
        )
    }

    /// 일 필드를 설정합니다.
    ///
    /// 해당 월의 마지막 날보다 큰 값은 마지막 날로 고정되고,
    /// 0 이하의 값은 이전 달로 거슬러 올라갑니다 (0 → 전월 말일).
    pub fn set_day(&mut self, day: i64) -> MinutebarResult<()> {
        let current = self.require("set_day")?;
        let target = if day >= 1 {
            day.min(i64::from(self.last_day_of_month()?))
        } else {
            day
        };
        self.shift(
            TimeDelta::try_days(target - i64::from(current.day())),
            "set_day",
        )
    }

    /// 월 필드를 설정합니다.
    ///
    /// 범위를 벗어난 값은 연도로 자리올림됩니다 (1월에서 `set_month(0)` → 전년도 12월).
    /// 이동한 월에 현재 일자가 없으면 그 달의 마지막 날로 고정됩니다.
    pub fn set_month(&mut self, month: i64) -> MinutebarResult<()> {
        let current = self.require("set_month")?;
        self.shift_months(month - i64::from(current.month()))
    }

    /// 연도 필드를 설정합니다. 2월 29일은 평년에서 28일로 고정됩니다.
    pub fn set_year(&mut self, year: i32) -> MinutebarResult<()> {
        let current = self.require("set_year")?;
        self.shift_months((i64::from(year) - i64::from(current.year())) * 12)
    }

    /// 현재 월의 마지막 날짜.
    pub fn last_day_of_month(&self) -> MinutebarResult<u32> {
        let current = self.require("last_day_of_month")?;
        days_in_month(current.year(), current.month()).ok_or_else(|| {
            MinutebarError::InvalidOperation(format!("월 길이 계산 실패: {}", self))
        })
    }

    /// 같은 타임존 기준 현재 월의 1일 00:00:00.
    pub fn start_of_month(&self) -> MinutebarResult<TimeValue> {
        let current = self.require("start_of_month")?;
        let start = current
            .timezone()
            .with_ymd_and_hms(current.year(), current.month(), 1, 0, 0, 0)
            .single()
            .ok_or_else(|| {
                MinutebarError::InvalidOperation(format!("월 시작 시각 계산 실패: {}", self))
            })?;
        Ok(Self { time: Some(start) })
    }

    /// 현재 월의 마지막 초 (말일 23:59:59).
    pub fn end_of_month(&self) -> MinutebarResult<TimeValue> {
        let mut end = self.start_of_month()?;
        end.shift_months(1)?;
        end.add_seconds(-1)?;
        Ok(end)
    }

    /// 이전 월의 마지막 초. 월 단위 역방향 순회에 사용합니다.
    pub fn end_of_previous_month(&self) -> MinutebarResult<TimeValue> {
        let mut end = self.start_of_month()?;
        end.add_seconds(-1)?;
        Ok(end)
    }

    /// 외부 API 요청용 UTC 문자열 (`YYYY-MM-DD HH:MM:SS`).
    pub fn to_utc_string(&self) -> MinutebarResult<String> {
        let current = self.require("to_utc_string")?;
        Ok(current.with_timezone(&Utc).format(WIRE_FORMAT).to_string())
    }

    /// 연결된 타임존 기준 문자열 (`YYYY-MM-DD HH:MM:SS`).
    pub fn to_local_string(&self) -> MinutebarResult<String> {
        let current = self.require("to_local_string")?;
        Ok(current.format(WIRE_FORMAT).to_string())
    }

    fn require(&self, op: &str) -> MinutebarResult<DateTime<Tz>> {
        self.time.ok_or_else(|| {
            MinutebarError::InvalidOperation(format!("값이 없는 시각에 {} 호출", op))
        })
    }

    fn shift(&mut self, delta: Option<TimeDelta>, op: &str) -> MinutebarResult<()> {
        let current = self.require(op)?;
        let shifted = delta
            .and_then(|d| current.checked_add_signed(d))
            .ok_or_else(|| {
                MinutebarError::InvalidOperation(format!("{}: 시각 범위를 벗어났습니다", op))
            })?;
        self.time = Some(shifted);
        Ok(())
    }

    fn shift_months(&mut self, delta: i64) -> MinutebarResult<()> {
        let current = self.require("shift_months")?;
        let months = u32::try_from(delta.unsigned_abs()).ok().map(Months::new);
        let shifted = months
            .and_then(|m| {
                if delta >= 0 {
                    current.checked_add_months(m)
                } else {
                    current.checked_sub_months(m)
                }
            })
            .ok_or_else(|| {
                MinutebarError::InvalidOperation(format!("월 이동 실패: {} ({:+})", self, delta))
            })?;
        self.time = Some(shifted);
        Ok(())
    }
}

/// 주어진 연월의 일수.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.signed_duration_since(first).num_days() as u32)
}

impl PartialOrd for TimeValue {
    /// 값이 없는 시각은 구체적인 시각과 순서가 정의되지 않습니다.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.time, other.time) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            (None, None) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time {
            Some(t) => write!(f, "{}", t.format("%Y/%m/%d %H:%M:%S")),
            None => write!(f, "None"),
        }
    }
}

impl FromStr for TimeValue {
    type Err = MinutebarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<TimeValue> for bool {
    fn from(value: TimeValue) -> Self {
        value.is_some()
    }
}

impl From<DateTime<Tz>> for TimeValue {
    fn from(time: DateTime<Tz>) -> Self {
        Self { time: Some(time) }
    }
}

/// 고정 오프셋 시각은 서울 시각으로 변환됩니다.
impl From<DateTime<FixedOffset>> for TimeValue {
    fn from(time: DateTime<FixedOffset>) -> Self {
        Self {
            time: Some(time.with_timezone(&SEOUL)),
        }
    }
}

/// UTC 시각은 서울 시각으로 변환됩니다.
impl From<DateTime<Utc>> for TimeValue {
    fn from(time: DateTime<Utc>) -> Self {
        Self {
            time: Some(time.with_timezone(&SEOUL)),
        }
    }
}

impl<T: Into<TimeValue>> From<Option<T>> for TimeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seoul(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> TimeValue {
        TimeValue::from(SEOUL.with_ymd_and_hms(y, m, d, h, min, s).unwrap())
    }

    #[test]
    fn test_parse_eight_digits() {
        let t = TimeValue::parse("20240315").unwrap();
        assert_eq!(t, seoul(2024, 3, 15, 0, 0, 0));
        assert_eq!(t.timezone(), Some(SEOUL));
    }

    #[test]
    fn test_parse_six_digits_pivot() {
        assert_eq!(TimeValue::parse("241101").unwrap().year().unwrap(), 2024);
        assert_eq!(TimeValue::parse("491231").unwrap().year().unwrap(), 2049);
        assert_eq!(TimeValue::parse("500101").unwrap().year().unwrap(), 1950);
        assert_eq!(TimeValue::parse("991231").unwrap().year().unwrap(), 1999);
    }

    #[test]
    fn test_parse_rejects_other_formats() {
        for input in ["", "2024-03-15", "2024031", "202403150", "abcdefgh", "20241301", "240230"] {
            assert!(
                matches!(TimeValue::parse(input), Err(MinutebarError::Format(_))),
                "{:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_none_semantics() {
        let none = TimeValue::none();
        assert!(none.is_none());
        assert!(!bool::from(none));
        assert!(bool::from(seoul(2024, 1, 1, 0, 0, 0)));
        assert_eq!(none.to_string(), "None");
        assert_eq!(TimeValue::from(None::<DateTime<Utc>>), none);
    }

    #[test]
    fn test_compare_against_none_fails() {
        let t = seoul(2024, 1, 1, 0, 0, 0);
        let none = TimeValue::none();
        assert!(matches!(
            t.is_before(&none),
            Err(MinutebarError::InvalidOperation(_))
        ));
        assert!(matches!(
            none.try_cmp(&none),
            Err(MinutebarError::InvalidOperation(_))
        ));
        assert_eq!(t.partial_cmp(&none), None);
    }

    #[test]
    fn test_compare_across_timezones() {
        let seoul_nine = seoul(2024, 1, 1, 9, 0, 0);
        let utc_midnight = seoul_nine.to_utc();
        assert_eq!(seoul_nine.try_cmp(&utc_midnight).unwrap(), Ordering::Equal);
        assert_eq!(utc_midnight.hour().unwrap(), 0);

        let later = seoul(2024, 1, 1, 9, 1, 0);
        assert!(seoul_nine.is_before(&later).unwrap());
        assert!(later.is_after(&utc_midnight).unwrap());
        assert!(later.is_at_or_after(&later).unwrap());
        assert!(seoul_nine < later);
    }

    #[test]
    fn test_set_minute_rolls_into_next_hour() {
        let mut t = seoul(2024, 1, 1, 10, 30, 0);
        t.set_minute(75).unwrap();
        assert_eq!(t, seoul(2024, 1, 1, 11, 15, 0));

        t.set_minute(-1).unwrap();
        assert_eq!(t, seoul(2024, 1, 1, 10, 59, 0));
    }

    #[test]
    fn test_set_hour_and_second_carry() {
        let mut t = seoul(2024, 12, 31, 22, 0, 0);
        t.set_hour(25).unwrap();
        assert_eq!(t, seoul(2025, 1, 1, 1, 0, 0));

        t.set_second(61).unwrap();
        assert_eq!(t, seoul(2025, 1, 1, 1, 1, 1));
    }

    #[test]
    fn test_set_month_rolls_to_previous_year() {
        let mut t = seoul(2024, 1, 15, 12, 0, 0);
        t.set_month(0).unwrap();
        assert_eq!(t, seoul(2023, 12, 15, 12, 0, 0));

        t.set_month(14).unwrap();
        assert_eq!(t, seoul(2024, 2, 15, 12, 0, 0));
    }

    #[test]
    fn test_set_month_clamps_day() {
        let mut t = seoul(2024, 3, 31, 0, 0, 0);
        t.set_month(2).unwrap();
        assert_eq!(t, seoul(2024, 2, 29, 0, 0, 0));

        let mut t = seoul(2024, 2, 29, 0, 0, 0);
        t.set_year(2023).unwrap();
        assert_eq!(t, seoul(2023, 2, 28, 0, 0, 0));
    }

    #[test]
    fn test_set_day_clamps_and_rolls_back() {
        let mut t = seoul(2023, 2, 10, 8, 0, 0);
        t.set_day(31).unwrap();
        assert_eq!(t, seoul(2023, 2, 28, 8, 0, 0));

        t.set_day(0).unwrap();
        assert_eq!(t, seoul(2023, 1, 31, 8, 0, 0));
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(seoul(2024, 2, 1, 0, 0, 0).last_day_of_month().unwrap(), 29);
        assert_eq!(seoul(2023, 2, 1, 0, 0, 0).last_day_of_month().unwrap(), 28);
        assert_eq!(seoul(2023, 12, 5, 0, 0, 0).last_day_of_month().unwrap(), 31);
        assert_eq!(seoul(2023, 4, 5, 0, 0, 0).last_day_of_month().unwrap(), 30);
    }

    #[test]
    fn test_month_boundaries() {
        let t = seoul(2024, 3, 15, 13, 45, 10);
        assert_eq!(t.start_of_month().unwrap(), seoul(2024, 3, 1, 0, 0, 0));
        assert_eq!(t.end_of_month().unwrap(), seoul(2024, 3, 31, 23, 59, 59));
        assert_eq!(
            t.end_of_previous_month().unwrap(),
            seoul(2024, 2, 29, 23, 59, 59)
        );

        let january = seoul(2024, 1, 1, 0, 0, 0);
        assert_eq!(
            january.end_of_previous_month().unwrap(),
            seoul(2023, 12, 31, 23, 59, 59)
        );
    }

    #[test]
    fn test_wire_strings() {
        let t = seoul(2024, 1, 1, 9, 5, 0);
        assert_eq!(t.to_utc_string().unwrap(), "2024-01-01 00:05:00");
        assert_eq!(t.to_local_string().unwrap(), "2024-01-01 09:05:00");
        assert!(TimeValue::none().to_utc_string().is_err());
    }

    #[test]
    fn test_fixed_offset_round_trip() {
        let t = seoul(2024, 5, 6, 7, 8, 0);
        let fixed = t.to_fixed().unwrap();
        assert_eq!(fixed.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(TimeValue::from(fixed), t);
    }
}
