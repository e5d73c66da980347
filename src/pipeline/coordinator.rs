use tracing::info;

use crate::app_config::pipeline::PipelineConfig;
use crate::error::AppError;
use crate::pipeline::{fetcher, forecaster, loader, trainer};
use crate::vantage::QuoteSource;
use crate::warehouse::Warehouse;

/// 流水线状态机：严格线性，前一阶段成功后下一阶段才会执行；
/// 任何阶段出错即在该状态中止，下一次调度从头整体重试。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Fetched,
    Loaded,
    Trained,
    Published,
}

/// 单次运行报告
#[derive(Debug)]
pub struct RunReport {
    pub fetched: usize,
    pub loaded: u64,
    pub forecast_rows: usize,
    pub published_rows: usize,
}

/// 全量流水线：拉取 -> 装载 -> 训练 -> 预测发布
///
/// 阶段之间只消费前一阶段已提交的状态（表或模型），仅拉取与装载
/// 之间传递短生命周期的内存批次；阶段间不做补偿回滚。
pub async fn run_pipeline(
    source: &dyn QuoteSource,
    warehouse: &dyn Warehouse,
    config: &PipelineConfig,
) -> Result<RunReport, AppError> {
    config.validate()?;

    let records =
        fetcher::fetch_price_records(source, &config.symbols, config.lookback_days).await?;
    info!("阶段完成: {:?}, 记录数={}", PipelineStage::Fetched, records.len());

    let loaded = loader::load_price_records(warehouse, &config.price_table, &records).await?;
    info!("阶段完成: {:?}, 装载行数={}", PipelineStage::Loaded, loaded);

    trainer::train_forecast_model(
        warehouse,
        &config.price_table,
        &config.train_view,
        &config.model_name,
    )
    .await?;
    info!("阶段完成: {:?}", PipelineStage::Trained);

    let publish = forecaster::forecast_and_publish(warehouse, config).await?;
    info!(
        "阶段完成: {:?}, 发布行数={}",
        PipelineStage::Published,
        publish.published_rows
    );

    Ok(RunReport {
        fetched: records.len(),
        loaded,
        forecast_rows: publish.forecast_rows,
        published_rows: publish.published_rows,
    })
}

/// 周度刷新：基于已装载的正式表重训模型并重新发布，不重新拉取
pub async fn run_refresh(
    warehouse: &dyn Warehouse,
    config: &PipelineConfig,
) -> Result<RunReport, AppError> {
    config.validate()?;

    trainer::train_forecast_model(
        warehouse,
        &config.price_table,
        &config.train_view,
        &config.model_name,
    )
    .await?;
    info!("阶段完成: {:?}", PipelineStage::Trained);

    let publish = forecaster::forecast_and_publish(warehouse, config).await?;
    info!(
        "阶段完成: {:?}, 发布行数={}",
        PipelineStage::Published,
        publish.published_rows
    );

    Ok(RunReport {
        fetched: 0,
        loaded: 0,
        forecast_rows: publish.forecast_rows,
        published_rows: publish.published_rows,
    })
}
