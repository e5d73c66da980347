use rbs::Value;
use tracing::{info, warn};

use crate::error::AppError;
use crate::warehouse::Warehouse;

/// 训练结果报告
///
/// metrics / feature_importance 拉取失败不影响训练成功，
/// 以 None 形式反馈给调用方（同时打 warn 日志）。
#[derive(Debug, Default)]
pub struct TrainReport {
    pub metrics: Option<Value>,
    pub feature_importance: Option<Value>,
}

/// 重建训练视图并（重）训练预测模型
///
/// 两条外部命令对调用方表现为一次原子训练：视图或模型创建失败都
/// 算训练失败；不可解析的特征行由模型侧 ON_ERROR: SKIP 策略跳过。
pub async fn train_forecast_model(
    warehouse: &dyn Warehouse,
    train_input_table: &str,
    train_view: &str,
    model_name: &str,
) -> Result<TrainReport, AppError> {
    let create_view_sql = format!(
        "CREATE OR REPLACE VIEW {} AS SELECT DATE, CLOSE, SYMBOL FROM {}",
        train_view, train_input_table
    );

    let create_model_sql = format!(
        "CREATE OR REPLACE SNOWFLAKE.ML.FORECAST {} (\
            INPUT_DATA => SYSTEM$REFERENCE('VIEW', '{}'), \
            SERIES_COLNAME => 'SYMBOL', \
            TIMESTAMP_COLNAME => 'DATE', \
            TARGET_COLNAME => 'CLOSE', \
            CONFIG_OBJECT => {{ 'ON_ERROR': 'SKIP' }}\
        )",
        model_name, train_view
    );

    warehouse
        .exec(&create_view_sql, vec![])
        .await
        .map_err(|e| AppError::Training(e.to_string()))?;
    warehouse
        .exec(&create_model_sql, vec![])
        .await
        .map_err(|e| AppError::Training(e.to_string()))?;
    info!("模型训练完成: model={}, view={}", model_name, train_view);

    // 训练后同步做一次指标检查，失败不作为训练失败
    let mut report = TrainReport::default();
    match warehouse
        .query(&format!("CALL {}!SHOW_EVALUATION_METRICS()", model_name), vec![])
        .await
    {
        Ok(metrics) => report.metrics = Some(metrics),
        Err(e) => warn!("获取评估指标失败: {}", e),
    }
    match warehouse
        .query(
            &format!("CALL {}!EXPLAIN_FEATURE_IMPORTANCE()", model_name),
            vec![],
        )
        .await
    {
        Ok(importance) => report.feature_importance = Some(importance),
        Err(e) => warn!("获取特征重要性失败: {}", e),
    }
    Ok(report)
}
