use anyhow::anyhow;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use uuid::Uuid;

use crate::app_config::env::{env_is_true, env_or_default};
use crate::job::PipelineJob;

/// 应用入口总编排：注册调度任务 / 可选立即运行 / 信号与优雅关闭
pub async fn run() -> anyhow::Result<()> {
    // 本地调试：启动时立即跑一次全量流水线
    if env_is_true("IS_RUN_PIPELINE_NOW", false) {
        let job = PipelineJob::from_env()?;
        match job.run().await {
            Ok(report) => info!("流水线运行完成: {:?}", report),
            Err(e) => error!("流水线运行失败: {}", e),
        }
    }

    let mut scheduler = init_scheduler().await.map_err(|e| {
        error!("初始化任务调度器失败: {}", e);
        anyhow!("初始化任务调度器失败: {}", e)
    })?;

    // 等待退出信号
    let signal_name = setup_shutdown_signals().await;
    info!("接收到 {} 信号，开始优雅关闭...", signal_name);

    scheduler.shutdown().await?;
    info!("应用已优雅退出");
    Ok(())
}

/// 初始化调度器并注册流水线任务
///
/// 日度任务跑全量流水线，周度任务只做重训+发布刷新；
/// cron 表达式可由环境变量覆盖。
pub async fn init_scheduler() -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // 日度全量（默认每天 20:30）
    let daily_cron = env_or_default("PIPELINE_DAILY_CRON", "0 30 20 * * *");
    let daily_job = Job::new_async(daily_cron.as_str(), |uuid, _lock| {
        Box::pin(async move {
            info!("运行日度流水线任务: {}", uuid);
            run_daily_pipeline().await;
        })
    })?;
    let daily_id: Uuid = scheduler.add(daily_job).await?;
    info!("已注册日度流水线任务: id={}, cron={}", daily_id, daily_cron);

    // 周度刷新（默认周一 01:00）
    let weekly_cron = env_or_default("PIPELINE_WEEKLY_CRON", "0 0 1 * * Mon");
    let weekly_job = Job::new_async(weekly_cron.as_str(), |uuid, _lock| {
        Box::pin(async move {
            info!("运行周度刷新任务: {}", uuid);
            run_weekly_refresh().await;
        })
    })?;
    let weekly_id: Uuid = scheduler.add(weekly_job).await?;
    info!("已注册周度刷新任务: id={}, cron={}", weekly_id, weekly_cron);

    scheduler.start().await?;
    Ok(scheduler)
}

/// 每次触发时重新读取配置（支持热更新）
async fn run_daily_pipeline() {
    let job = match PipelineJob::from_env() {
        Ok(job) => job,
        Err(e) => {
            error!("流水线配置加载失败: {}", e);
            return;
        }
    };
    match job.run().await {
        Ok(report) => info!("日度流水线完成: {:?}", report),
        Err(e) => error!("日度流水线失败: {}", e),
    }
}

async fn run_weekly_refresh() {
    let job = match PipelineJob::from_env() {
        Ok(job) => job,
        Err(e) => {
            error!("流水线配置加载失败: {}", e);
            return;
        }
    };
    match job.run_refresh().await {
        Ok(report) => info!("周度刷新完成: {:?}", report),
        Err(e) => error!("周度刷新失败: {}", e),
    }
}

/// 设置多种退出信号处理
async fn setup_shutdown_signals() -> &'static str {
    use tokio::signal;

    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to register SIGTERM handler");
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
            .expect("Failed to register SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.expect("Failed to listen for ctrl-c");
        "CTRL+C"
    }
}
