use rbs::Value;
use tracing::{error, info};

use crate::error::AppError;
use crate::vantage::PriceRecord;
use crate::warehouse::{Warehouse, WarehouseTx};

/// 全量刷新装载：目标表内容原子地替换为本批记录
///
/// 协议：BEGIN -> 重建表（date 主键 + OHLCV + symbol）-> 逐条参数化
/// INSERT -> COMMIT。任何一步失败显式回滚整个事务，目标表保持装载前
/// 状态（首次运行则保持不存在），原始错误重新抛给调用方；装载失败对
/// 本次运行是致命的，不在内部重试。同一批记录重复装载结果一致。
pub async fn load_price_records(
    warehouse: &dyn Warehouse,
    target_table: &str,
    records: &[PriceRecord],
) -> Result<u64, AppError> {
    let mut tx = warehouse.begin().await?;

    let result = write_batch(tx.as_mut(), target_table, records).await;
    match result {
        Ok(inserted) => {
            tx.commit()
                .await
                .map_err(|e| AppError::LoadTransaction(e.to_string()))?;
            info!("装载完成: table={}, 行数={}", target_table, inserted);
            Ok(inserted)
        }
        Err(e) => {
            // 回滚后重新抛出触发错误；回滚自身的失败只记录
            if let Err(rollback_err) = tx.rollback().await {
                error!("装载事务回滚失败: {}", rollback_err);
            }
            error!("装载失败，事务已回滚: {}", e);
            Err(AppError::LoadTransaction(e.to_string()))
        }
    }
}

async fn write_batch(
    tx: &mut dyn WarehouseTx,
    target_table: &str,
    records: &[PriceRecord],
) -> Result<u64, AppError> {
    let create_table_sql = format!(
        "CREATE OR REPLACE TABLE {} (date datetime primary key, \
         open float, high float, low float, close float, volume float, \
         symbol string)",
        target_table
    );
    tx.exec(&create_table_sql, vec![]).await?;

    // 行数据一律走占位符，避免符号里的引号等特殊字符破坏语句
    let insert_sql = format!(
        "INSERT INTO {} (date, open, high, low, close, volume, symbol) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        target_table
    );
    let mut inserted: u64 = 0;
    for record in records {
        let params: Vec<Value> = vec![
            record.date.format("%Y-%m-%d").to_string().into(),
            record.open.into(),
            record.high.into(),
            record.low.into(),
            record.close.into(),
            record.volume.into(),
            record.symbol.clone().into(),
        ];
        tx.exec(&insert_sql, params).await?;
        inserted += 1;
    }
    Ok(inserted)
}
