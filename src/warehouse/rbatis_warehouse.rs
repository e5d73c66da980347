use async_trait::async_trait;
use rbatis::executor::RBatisTxExecutor;
use rbatis::RBatis;
use rbs::Value;
use tracing::debug;

use crate::error::AppError;
use crate::warehouse::{Warehouse, WarehouseTx};

/// 基于 rbatis 的数仓会话实现
pub struct RbatisWarehouse {
    db: RBatis,
}

impl RbatisWarehouse {
    pub fn new(db: RBatis) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Warehouse for RbatisWarehouse {
    async fn exec(&self, sql: &str, params: Vec<Value>) -> Result<u64, AppError> {
        debug!("warehouse exec: {}", sql);
        let res = self.db.exec(sql, params).await?;
        Ok(res.rows_affected)
    }

    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Value, AppError> {
        debug!("warehouse query: {}", sql);
        let res = self.db.query(sql, params).await?;
        Ok(res)
    }

    async fn begin(&self) -> Result<Box<dyn WarehouseTx>, AppError> {
        let tx = self.db.acquire_begin().await?;
        Ok(Box::new(RbatisTx { tx }))
    }
}

struct RbatisTx {
    tx: RBatisTxExecutor,
}

#[async_trait]
impl WarehouseTx for RbatisTx {
    async fn exec(&mut self, sql: &str, params: Vec<Value>) -> Result<u64, AppError> {
        debug!("warehouse tx exec: {}", sql);
        let res = self.tx.exec(sql, params).await?;
        Ok(res.rows_affected)
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
