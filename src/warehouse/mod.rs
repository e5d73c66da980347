pub mod rbatis_warehouse;

use async_trait::async_trait;
use rbs::Value;

use crate::error::AppError;

pub use rbatis_warehouse::RbatisWarehouse;

/// 数仓命令接口
///
/// 一次流水线运行持有一个会话，按引用传入各阶段；所有行数据
/// 走参数化占位符，语句中拼接的标识符只允许来自可信配置。
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// 执行 DDL/DML，返回影响行数
    async fn exec(&self, sql: &str, params: Vec<Value>) -> Result<u64, AppError>;

    /// 执行查询（含 CALL 模型调用），结果集作为显式返回值
    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Value, AppError>;

    /// 开启事务
    async fn begin(&self) -> Result<Box<dyn WarehouseTx>, AppError>;
}

/// 把查询结果集解码为行结构体列表
///
/// rbs::Value 经 serde 直接转码为 serde_json::Value 再反序列化，
/// 不走 Display 文本（字符串值里的引号不会被转义，比如模型输出
/// 带引号的系列标签）；空结果集返回空列表。
pub fn decode_rows<T: serde::de::DeserializeOwned>(value: &Value) -> Result<Vec<T>, AppError> {
    match value {
        Value::Null => return Ok(vec![]),
        Value::Array(rows) if rows.is_empty() => return Ok(vec![]),
        _ => {}
    }
    let json_value = serde_json::to_value(value)
        .map_err(|e| AppError::Warehouse(format!("结果集序列化失败: {}", e)))?;
    serde_json::from_value(json_value)
        .map_err(|e| AppError::Warehouse(format!("结果集解析失败: {}", e)))
}


/// 数仓事务
///
/// commit/rollback 之后事务不再可用；任何一条语句失败时
/// 由调用方显式回滚并重新抛出原始错误。
#[async_trait]
pub trait WarehouseTx: Send {
    async fn exec(&mut self, sql: &str, params: Vec<Value>) -> Result<u64, AppError>;

    async fn commit(&mut self) -> Result<(), AppError>;

    async fn rollback(&mut self) -> Result<(), AppError>;
}
