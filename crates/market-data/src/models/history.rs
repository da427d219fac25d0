use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One daily bar of historical data.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryBar {
    /// Trading date of the bar
    pub date: NaiveDate,

    /// Closing price
    pub close: Decimal,

    /// Trading volume, when the provider reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<i64>,
}

/// A historical series for one symbol, with the metadata the provider
/// reported alongside the bars.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSeries {
    /// Symbol the series belongs to
    pub symbol: String,

    /// Currency the provider reported for the series
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// The period that was requested
    pub period: HistoryPeriod,

    /// Daily bars, ordered by date ascending, one per date
    pub bars: Vec<HistoryBar>,
}

/// A provider-side lookback window for historical requests.
///
/// Providers take a named range rather than explicit dates; callers that
/// need a specific date window pick the smallest covering period with
/// [`HistoryPeriod::covering`] and filter the returned bars.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum HistoryPeriod {
    OneMonth,
    ThreeMonths,
    SixMonths,
    #[default]
    OneYear,
    TwoYears,
    FiveYears,
    Max,
}

impl HistoryPeriod {
    /// The wire form of the period (e.g. "1y").
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryPeriod::OneMonth => "1mo",
            HistoryPeriod::ThreeMonths => "3mo",
            HistoryPeriod::SixMonths => "6mo",
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::TwoYears => "2y",
            HistoryPeriod::FiveYears => "5y",
            HistoryPeriod::Max => "max",
        }
    }

    /// Approximate calendar days the period spans, or `None` for `Max`.
    pub fn approx_days(&self) -> Option<i64> {
        match self {
            HistoryPeriod::OneMonth => Some(31),
            HistoryPeriod::ThreeMonths => Some(93),
            HistoryPeriod::SixMonths => Some(186),
            HistoryPeriod::OneYear => Some(366),
            HistoryPeriod::TwoYears => Some(731),
            HistoryPeriod::FiveYears => Some(1827),
            HistoryPeriod::Max => None,
        }
    }

    /// The smallest period that spans from `start` up to `today`.
    ///
    /// Falls back to `Max` when even five years is not enough, and to the
    /// shortest period when `start` is not in the past.
    pub fn covering(start: NaiveDate, today: NaiveDate) -> HistoryPeriod {
        let days = (today - start).num_days();
        let candidates = [
            HistoryPeriod::OneMonth,
            HistoryPeriod::ThreeMonths,
            HistoryPeriod::SixMonths,
            HistoryPeriod::OneYear,
            HistoryPeriod::TwoYears,
            HistoryPeriod::FiveYears,
        ];
        for period in candidates {
            match period.approx_days() {
                Some(span) if span >= days => return period,
                _ => continue,
            }
        }
        HistoryPeriod::Max
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HistoryPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1mo" => Ok(HistoryPeriod::OneMonth),
            "3mo" => Ok(HistoryPeriod::ThreeMonths),
            "6mo" => Ok(HistoryPeriod::SixMonths),
            "1y" => Ok(HistoryPeriod::OneYear),
            "2y" => Ok(HistoryPeriod::TwoYears),
            "5y" => Ok(HistoryPeriod::FiveYears),
            "max" => Ok(HistoryPeriod::Max),
            other => Err(format!("unknown history period: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_round_trip() {
        for s in ["1mo", "3mo", "6mo", "1y", "2y", "5y", "max"] {
            let period: HistoryPeriod = s.parse().unwrap();
            assert_eq!(period.as_str(), s);
        }
    }

    #[test]
    fn test_period_parse_unknown() {
        assert!("10d".parse::<HistoryPeriod>().is_err());
    }

    #[test]
    fn test_covering_picks_smallest_period() {
        let today = date(2024, 6, 15);
        assert_eq!(
            HistoryPeriod::covering(date(2024, 6, 1), today),
            HistoryPeriod::OneMonth
        );
        assert_eq!(
            HistoryPeriod::covering(date(2024, 2, 1), today),
            HistoryPeriod::SixMonths
        );
        assert_eq!(
            HistoryPeriod::covering(date(2023, 6, 1), today),
            HistoryPeriod::OneYear
        );
        assert_eq!(
            HistoryPeriod::covering(date(2020, 1, 1), today),
            HistoryPeriod::FiveYears
        );
    }

    #[test]
    fn test_covering_falls_back_to_max() {
        let today = date(2024, 6, 15);
        assert_eq!(
            HistoryPeriod::covering(date(2010, 1, 1), today),
            HistoryPeriod::Max
        );
    }

    #[test]
    fn test_covering_future_start_uses_shortest() {
        let today = date(2024, 6, 15);
        assert_eq!(
            HistoryPeriod::covering(date(2024, 7, 1), today),
            HistoryPeriod::OneMonth
        );
    }
}
