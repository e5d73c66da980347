use rbs::Value;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::app_config::pipeline::PipelineConfig;
use crate::error::AppError;
use crate::warehouse::{decode_rows, Warehouse};

/// 模型预测输出的一行
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ForecastRow {
    pub series: String,
    pub ts: String,
    pub forecast: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// 发布表的一行：actual 与 forecast/bounds 恰好一边有值
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublishedRow {
    pub symbol: String,
    pub date: String,
    pub actual: Option<f64>,
    pub forecast: Option<f64>,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

/// 历史行情中参与发布的列
#[derive(Serialize, Deserialize, Debug, Clone)]
struct HistoricalRow {
    symbol: String,
    date: String,
    close: f64,
}

/// 发布结果报告
#[derive(Debug)]
pub struct PublishReport {
    pub forecast_rows: usize,
    pub published_rows: usize,
}

/// 生成预测并发布历史+预测合并表
///
/// 1. CALL 模型生成预测，结果集是本次查询调用的显式返回值；
/// 2. 预测批次全量替换落入预测表；
/// 3. 读取历史行情，与预测批次逐行合并成统一 schema（系列标签去掉
///    引号后与 symbol 对齐；没有预测的系列仍保留历史行）；
/// 4. 发布表在一个事务内全量替换。任何一步失败中止发布，
///    旧的发布表保持不变。
pub async fn forecast_and_publish(
    warehouse: &dyn Warehouse,
    config: &PipelineConfig,
) -> Result<PublishReport, AppError> {
    // 1. 预测调用
    let forecast_sql = format!(
        "CALL {}!FORECAST(FORECASTING_PERIODS => {}, \
         CONFIG_OBJECT => {{'prediction_interval': {}}})",
        config.model_name, config.forecast_periods, config.prediction_interval
    );
    let result = warehouse
        .query(&forecast_sql, vec![])
        .await
        .map_err(|e| AppError::Publish(e.to_string()))?;
    let batch: Vec<ForecastRow> =
        decode_rows(&result).map_err(|e| AppError::Publish(e.to_string()))?;
    info!("预测完成: model={}, 行数={}", config.model_name, batch.len());

    // 2. 预测批次落表
    persist_forecast(warehouse, &config.forecast_table, &batch).await?;

    // 3. 读取历史行情
    let history_sql = format!("SELECT symbol, date, close FROM {}", config.price_table);
    let history_value = warehouse
        .query(&history_sql, vec![])
        .await
        .map_err(|e| AppError::Publish(e.to_string()))?;
    let historical: Vec<HistoricalRow> =
        decode_rows(&history_value).map_err(|e| AppError::Publish(e.to_string()))?;

    // 4. 合并
    let published = build_published_rows(&historical, &batch);

    // 5. 发布表全量替换
    persist_published(warehouse, &config.final_table, &published).await?;
    info!(
        "发布完成: table={}, 历史行={}, 预测行={}",
        config.final_table,
        historical.len(),
        batch.len()
    );
    Ok(PublishReport {
        forecast_rows: batch.len(),
        published_rows: published.len(),
    })
}

/// 历史行与预测行的逐行并集
fn build_published_rows(historical: &[HistoricalRow], batch: &[ForecastRow]) -> Vec<PublishedRow> {
    let mut rows = Vec::with_capacity(historical.len() + batch.len());
    for h in historical {
        rows.push(PublishedRow {
            symbol: h.symbol.clone(),
            date: h.date.clone(),
            actual: Some(h.close),
            forecast: None,
            lower_bound: None,
            upper_bound: None,
        });
    }
    for f in batch {
        rows.push(PublishedRow {
            // 模型输出的系列标签带引号，去掉后才能与 symbol 对齐
            symbol: f.series.replace('"', ""),
            date: f.ts.clone(),
            actual: None,
            forecast: Some(f.forecast),
            lower_bound: Some(f.lower_bound),
            upper_bound: Some(f.upper_bound),
        });
    }
    rows.sort_by(|a, b| (&a.symbol, &a.date).cmp(&(&b.symbol, &b.date)));
    rows
}

async fn persist_forecast(
    warehouse: &dyn Warehouse,
    forecast_table: &str,
    batch: &[ForecastRow],
) -> Result<(), AppError> {
    let mut tx = warehouse
        .begin()
        .await
        .map_err(|e| AppError::Publish(e.to_string()))?;

    let result: Result<(), AppError> = async {
        let create_sql = format!(
            "CREATE OR REPLACE TABLE {} (series string, ts datetime, \
             forecast float, lower_bound float, upper_bound float)",
            forecast_table
        );
        tx.exec(&create_sql, vec![]).await?;
        let insert_sql = format!(
            "INSERT INTO {} (series, ts, forecast, lower_bound, upper_bound) \
             VALUES (?, ?, ?, ?, ?)",
            forecast_table
        );
        for row in batch {
            let params: Vec<Value> = vec![
                row.series.clone().into(),
                row.ts.clone().into(),
                row.forecast.into(),
                row.lower_bound.into(),
                row.upper_bound.into(),
            ];
            tx.exec(&insert_sql, params).await?;
        }
        Ok(())
    }
    .await;

    match result {
        Ok(()) => tx
            .commit()
            .await
            .map_err(|e| AppError::Publish(e.to_string())),
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!("预测表回滚失败: {}", rollback_err);
            }
            Err(AppError::Publish(e.to_string()))
        }
    }
}

async fn persist_published(
    warehouse: &dyn Warehouse,
    final_table: &str,
    rows: &[PublishedRow],
) -> Result<(), AppError> {
    let mut tx = warehouse
        .begin()
        .await
        .map_err(|e| AppError::Publish(e.to_string()))?;

    let result: Result<(), AppError> = async {
        let create_sql = format!(
            "CREATE OR REPLACE TABLE {} (symbol string, date datetime, \
             actual float, forecast float, lower_bound float, upper_bound float)",
            final_table
        );
        tx.exec(&create_sql, vec![]).await?;
        let insert_sql = format!(
            "INSERT INTO {} (symbol, date, actual, forecast, lower_bound, upper_bound) \
             VALUES (?, ?, ?, ?, ?, ?)",
            final_table
        );
        for row in rows {
            let params: Vec<Value> = vec![
                row.symbol.clone().into(),
                row.date.clone().into(),
                option_value(row.actual),
                option_value(row.forecast),
                option_value(row.lower_bound),
                option_value(row.upper_bound),
            ];
            tx.exec(&insert_sql, params).await?;
        }
        Ok(())
    }
    .await;

    match result {
        Ok(()) => tx
            .commit()
            .await
            .map_err(|e| AppError::Publish(e.to_string())),
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!("发布表回滚失败: {}", rollback_err);
            }
            Err(AppError::Publish(e.to_string()))
        }
    }
}

fn option_value(value: Option<f64>) -> Value {
    match value {
        Some(v) => v.into(),
        None => Value::Null,
    }
}
