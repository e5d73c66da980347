use std::env;

use anyhow::Context;
use rbatis::RBatis;
use rbdc_mysql::MysqlDriver;

/// 建立数仓连接（MySQL 协议入口），返回独立的会话句柄
///
/// 一次流水线运行持有一个会话，按引用传入各阶段，运行结束随句柄
/// 释放连接；不使用全局静态句柄，避免并发运行之间共享游标。
pub async fn init_db() -> anyhow::Result<RBatis> {
    let db_host = env::var("DB_HOST").context("DB_HOST config is none")?;
    let rb = RBatis::new();
    rb.link(MysqlDriver {}, &db_host)
        .await
        .context("Failed to connect warehouse")?;
    Ok(rb)
}
