use std::env;

use crate::app_config::env::{env_or_default, env_parsed};
use crate::error::AppError;

/// 流水线运行参数
///
/// 全部来自外部配置（环境变量），表名/视图名/模型名属于可信配置，
/// 允许拼接进 SQL 语句；行数据一律走参数化占位符。
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 行情 API key
    pub vantage_api_key: String,
    /// 需要拉取的股票代码列表
    pub symbols: Vec<String>,
    /// 回看窗口（天）
    pub lookback_days: usize,
    /// 预测期数（天）
    pub forecast_periods: u32,
    /// 预测区间置信度，(0, 1)
    pub prediction_interval: f64,
    /// 原始价格表（训练输入表）
    pub price_table: String,
    /// 训练视图
    pub train_view: String,
    /// 预测结果表
    pub forecast_table: String,
    /// 预测模型名
    pub model_name: String,
    /// 最终发布表（历史+预测合并）
    pub final_table: String,
}

impl PipelineConfig {
    /// 从环境变量构建配置，缺省值与线上保持一致
    pub fn from_env() -> Result<Self, AppError> {
        let vantage_api_key = env::var("VANTAGE_API_KEY")
            .map_err(|_| AppError::Config("VANTAGE_API_KEY config is none".to_string()))?;

        let symbols: Vec<String> = env_or_default("STOCK_SYMBOLS", "AAPL,GOOGL")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let lookback_days: usize = env_parsed("LOOKBACK_DAYS", "90")?;
        let forecast_periods: u32 = env_parsed("FORECAST_PERIODS", "7")?;
        let prediction_interval: f64 = env_parsed("PREDICTION_INTERVAL", "0.95")?;

        let config = Self {
            vantage_api_key,
            symbols,
            lookback_days,
            forecast_periods,
            prediction_interval,
            price_table: env_or_default("PRICE_TABLE", "dev.raw_data.stock_table"),
            train_view: env_or_default("TRAIN_VIEW", "dev.analytics.stock_data_view"),
            forecast_table: env_or_default("FORECAST_TABLE", "dev.analytics.stock_data_forecast"),
            model_name: env_or_default("FORECAST_MODEL_NAME", "dev.analytics.predict_stock_price"),
            final_table: env_or_default("FINAL_TABLE", "dev.analytics.final_stock_data"),
        };
        config.validate()?;
        Ok(config)
    }

    /// 校验配置合法性
    pub fn validate(&self) -> Result<(), AppError> {
        if self.symbols.is_empty() {
            return Err(AppError::Config("股票代码列表为空".to_string()));
        }
        if self.lookback_days == 0 {
            return Err(AppError::Config("回看窗口必须大于0".to_string()));
        }
        if self.forecast_periods == 0 {
            return Err(AppError::Config("预测期数必须大于0".to_string()));
        }
        if !(self.prediction_interval > 0.0 && self.prediction_interval < 1.0) {
            return Err(AppError::Config(format!(
                "置信度必须位于(0,1): {}",
                self.prediction_interval
            )));
        }
        Ok(())
    }
}
