use thiserror::Error;

/// 应用错误
///
/// 流水线各阶段的错误分类：任何一类错误都会中止当前运行，
/// 由外部调度器在下一次触发时整体重试。
#[derive(Error, Debug)]
pub enum AppError {
    /// 行情拉取错误（网络失败、响应缺少 Time Series 数据等）
    #[error("行情拉取失败: {0}")]
    Fetch(String),

    /// 装载事务错误（装载事务内任何一步失败，已回滚）
    #[error("装载事务失败: {0}")]
    LoadTransaction(String),

    /// 训练错误（创建视图或模型失败）
    #[error("模型训练失败: {0}")]
    Training(String),

    /// 发布错误（预测调用或结果落表失败，旧的发布表保持不变）
    #[error("预测发布失败: {0}")]
    Publish(String),

    /// 数仓命令执行错误
    #[error("数仓执行失败: {0}")]
    Warehouse(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Fetch(err.to_string())
    }
}

impl From<rbatis::Error> for AppError {
    fn from(err: rbatis::Error) -> Self {
        AppError::Warehouse(err.to_string())
    }
}
