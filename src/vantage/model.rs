use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 行情响应中日线数据所在的键，缺失视为拉取失败
pub const TIME_SERIES_KEY: &str = "Time Series (Daily)";

/// 单日行情记录，(symbol, date) 唯一
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// 解析行情接口返回的日线 JSON
///
/// 响应结构：顶层对象带 "Time Series (Daily)" 键，值是
/// 日期字符串 -> {"1. open": "..", "2. high": "..", ...} 的映射，
/// 字段顺序不保证。结果不排序不截断，由拉取阶段统一处理。
pub fn parse_daily_series(
    symbol: &str,
    data: &serde_json::Value,
) -> Result<Vec<PriceRecord>, AppError> {
    let series = data
        .get(TIME_SERIES_KEY)
        .and_then(|v| v.as_object())
        .ok_or_else(|| AppError::Fetch(format!("{} 响应缺少 {}", symbol, TIME_SERIES_KEY)))?;

    let mut records = Vec::with_capacity(series.len());
    for (date_str, fields) in series {
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| AppError::Fetch(format!("{} 日期非法 {}: {}", symbol, date_str, e)))?;
        records.push(PriceRecord {
            symbol: symbol.to_string(),
            date,
            open: num_field(symbol, fields, "1. open")?,
            high: num_field(symbol, fields, "2. high")?,
            low: num_field(symbol, fields, "3. low")?,
            close: num_field(symbol, fields, "4. close")?,
            volume: num_field(symbol, fields, "5. volume")? as i64,
        });
    }
    Ok(records)
}

fn num_field(symbol: &str, fields: &serde_json::Value, key: &str) -> Result<f64, AppError> {
    fields
        .get(key)
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| AppError::Fetch(format!("{} 字段缺失或非法: {}", symbol, key)))
}
