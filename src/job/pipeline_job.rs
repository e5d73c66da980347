// 股价预测流水线任务

use anyhow::Result;

use crate::app_config::db::init_db;
use crate::app_config::pipeline::PipelineConfig;
use crate::pipeline::{self, RunReport};
use crate::vantage::VantageClient;
use crate::warehouse::RbatisWarehouse;

/// 流水线任务：由调度器按时触发，无额外入参
///
/// 每次运行独立建立数仓会话与行情客户端，运行结束随句柄释放；
/// 并发运行由外部调度器避免（同一时刻至多一次在途运行）。
pub struct PipelineJob {
    config: PipelineConfig,
}

impl PipelineJob {
    /// 从环境变量构建任务实例
    pub fn from_env() -> Result<Self> {
        let config = PipelineConfig::from_env()?;
        Ok(Self { config })
    }

    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// 日度全量运行：拉取 -> 装载 -> 训练 -> 预测发布
    pub async fn run(&self) -> Result<RunReport> {
        let db = init_db().await?;
        let warehouse = RbatisWarehouse::new(db);
        let source = VantageClient::new(self.config.vantage_api_key.clone());
        let report = pipeline::run_pipeline(&source, &warehouse, &self.config).await?;
        Ok(report)
    }

    /// 周度刷新：基于已装载数据重训模型并重新发布
    pub async fn run_refresh(&self) -> Result<RunReport> {
        let db = init_db().await?;
        let warehouse = RbatisWarehouse::new(db);
        let report = pipeline::run_refresh(&warehouse, &self.config).await?;
        Ok(report)
    }
}
