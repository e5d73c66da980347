//! 股价预测数据流水线
//!
//! 定时从外部行情接口拉取日线 OHLCV，全量刷新装载进数仓正式表，
//! 在数仓内训练按系列（股票代码）划分的预测模型，最后把历史实际值
//! 与带置信区间的预测值合并成统一的发布表供下游消费。

pub mod app;
pub mod app_config;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod vantage;
pub mod warehouse;
