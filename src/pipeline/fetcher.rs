use tracing::info;

use crate::error::AppError;
use crate::vantage::{PriceRecord, QuoteSource};

/// 拉取最近一个回看窗口内的日线行情
///
/// 每只股票各自排序后按日期升序返回，只保留最近 window 天。
/// 任何一只股票拉取失败立即中止整个阶段，由下一次调度整体重试
/// （不做单只隔离，见 DESIGN.md）。
pub async fn fetch_price_records(
    source: &dyn QuoteSource,
    symbols: &[String],
    window: usize,
) -> Result<Vec<PriceRecord>, AppError> {
    if symbols.is_empty() {
        return Err(AppError::Config("股票代码列表为空".to_string()));
    }
    if window == 0 {
        return Err(AppError::Config("回看窗口必须大于0".to_string()));
    }

    let mut results = Vec::new();
    for symbol in symbols {
        let mut records = source.daily_series(symbol).await?;
        records.sort_by(|a, b| a.date.cmp(&b.date));
        // 只保留最近 window 天，仍按日期升序
        if records.len() > window {
            records.drain(..records.len() - window);
        }
        info!("拉取行情完成: symbol={}, 记录数={}", symbol, records.len());
        results.extend(records);
    }
    Ok(results)
}
