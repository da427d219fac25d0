//! Yahoo Finance API response models.
//!
//! Wire shapes for the two endpoints this provider uses: the v7 quote
//! endpoint (current prices, multi-symbol) and the v8 chart endpoint
//! (daily history, single symbol).

use serde::Deserialize;

// ============================================================================
// v7/finance/quote
// ============================================================================

/// Top-level wrapper for the quote endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEnvelope {
    pub quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
pub struct QuoteResponse {
    #[serde(default)]
    pub result: Vec<QuoteRow>,
    pub error: Option<ApiError>,
}

/// One symbol's row from the quote endpoint.
///
/// Yahoo returns many more fields; only the ones we persist are mapped.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRow {
    pub symbol: String,
    pub regular_market_price: Option<f64>,
    pub regular_market_previous_close: Option<f64>,
    pub regular_market_change: Option<f64>,
    pub regular_market_change_percent: Option<f64>,
    pub market_state: Option<String>,
    pub currency: Option<String>,
    pub full_exchange_name: Option<String>,
    pub exchange: Option<String>,
}

// ============================================================================
// v8/finance/chart
// ============================================================================

/// Top-level wrapper for the chart endpoint.
#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartResponse,
}

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    /// Unix timestamps, one per bar. Absent when the range holds no data.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub currency: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<ChartQuoteBlock>,
}

/// Parallel arrays aligned with `timestamp`; entries are null on days
/// the exchange reported no trade.
#[derive(Debug, Deserialize)]
pub struct ChartQuoteBlock {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<i64>>,
}

/// Error payload shared by both endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_quote_response() {
        let json = r#"{
            "quoteResponse": {
                "result": [
                    {
                        "symbol": "AAPL",
                        "regularMarketPrice": 150.25,
                        "regularMarketPreviousClose": 148.0,
                        "regularMarketChange": 2.25,
                        "regularMarketChangePercent": 1.52,
                        "marketState": "REGULAR",
                        "currency": "USD",
                        "fullExchangeName": "NasdaqGS",
                        "exchange": "NMS"
                    }
                ],
                "error": null
            }
        }"#;
        let envelope: QuoteEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.quote_response.result.len(), 1);

        let row = &envelope.quote_response.result[0];
        assert_eq!(row.symbol, "AAPL");
        assert_eq!(row.regular_market_price, Some(150.25));
        assert_eq!(row.market_state.as_deref(), Some("REGULAR"));
        assert_eq!(row.full_exchange_name.as_deref(), Some("NasdaqGS"));
        assert!(envelope.quote_response.error.is_none());
    }

    #[test]
    fn test_deserialize_quote_row_missing_price() {
        // Halted or delisted symbols come back without a regular market price
        let json = r#"{
            "quoteResponse": {
                "result": [{"symbol": "DELISTED", "currency": "USD"}],
                "error": null
            }
        }"#;
        let envelope: QuoteEnvelope = serde_json::from_str(json).unwrap();
        let row = &envelope.quote_response.result[0];
        assert_eq!(row.symbol, "DELISTED");
        assert!(row.regular_market_price.is_none());
    }

    #[test]
    fn test_deserialize_quote_response_empty_result() {
        let json = r#"{"quoteResponse": {"result": [], "error": null}}"#;
        let envelope: QuoteEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.quote_response.result.is_empty());
    }

    #[test]
    fn test_deserialize_chart_response() {
        let json = r#"{
            "chart": {
                "result": [
                    {
                        "meta": {"currency": "USD", "symbol": "AAPL"},
                        "timestamp": [1704205800, 1704292200, 1704378600],
                        "indicators": {
                            "quote": [
                                {
                                    "close": [185.64, null, 184.25],
                                    "volume": [82488700, null, 58414500]
                                }
                            ]
                        }
                    }
                ],
                "error": null
            }
        }"#;
        let envelope: ChartEnvelope = serde_json::from_str(json).unwrap();
        let result = envelope.chart.result.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].timestamp.len(), 3);
        assert_eq!(result[0].indicators.quote[0].close[0], Some(185.64));
        assert_eq!(result[0].indicators.quote[0].close[1], None);
        assert_eq!(result[0].meta.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_deserialize_chart_error() {
        let json = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }"#;
        let envelope: ChartEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.chart.result.is_none());

        let error = envelope.chart.error.unwrap();
        assert_eq!(error.code.as_deref(), Some("Not Found"));
    }

    #[test]
    fn test_deserialize_chart_empty_range() {
        // A valid symbol with no bars in range has no timestamp array at all
        let json = r#"{
            "chart": {
                "result": [
                    {
                        "meta": {"currency": "USD", "symbol": "AAPL"},
                        "indicators": {"quote": [{}]}
                    }
                ],
                "error": null
            }
        }"#;
        let envelope: ChartEnvelope = serde_json::from_str(json).unwrap();
        let result = envelope.chart.result.unwrap();
        assert!(result[0].timestamp.is_empty());
        assert!(result[0].indicators.quote[0].close.is_empty());
    }
}
