#![allow(dead_code)]

//! 测试支撑：内存数仓与静态行情源
//!
//! MemoryWarehouse 只解释流水线实际发出的几种语句形态
//! （建表/插入/查询/视图/模型/CALL），事务内的写入先暂存，
//! commit 时生效、rollback 时丢弃，并支持按序号注入插入失败。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rbs::value::map::ValueMap;
use rbs::Value;

use stock_forecast::app_config::pipeline::PipelineConfig;
use stock_forecast::error::AppError;
use stock_forecast::pipeline::forecaster::ForecastRow;
use stock_forecast::vantage::{PriceRecord, QuoteSource};
use stock_forecast::warehouse::{Warehouse, WarehouseTx};

/// 行：按插入列顺序保存 (列名, 值)
type Row = Vec<(String, Value)>;

#[derive(Default)]
struct MemState {
    tables: HashMap<String, Vec<Row>>,
    views: Vec<String>,
    models: Vec<String>,
    statements: Vec<String>,
    forecast_result: Option<Value>,
    metrics_result: Option<Value>,
    fail_forecast: bool,
    fail_metrics: bool,
    fail_model: bool,
    fail_on_insert: Option<usize>,
    insert_seen: usize,
}

pub struct MemoryWarehouse {
    state: Arc<Mutex<MemState>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemState::default())),
        }
    }

    /// 预置 CALL !FORECAST 的返回批次
    pub fn set_forecast_rows(&self, rows: &[ForecastRow]) {
        let array = rows
            .iter()
            .map(|r| {
                let mut map = ValueMap::new();
                map.insert("series".into(), r.series.clone().into());
                map.insert("ts".into(), r.ts.clone().into());
                map.insert("forecast".into(), r.forecast.into());
                map.insert("lower_bound".into(), r.lower_bound.into());
                map.insert("upper_bound".into(), r.upper_bound.into());
                Value::Map(map)
            })
            .collect();
        self.state.lock().unwrap().forecast_result = Some(Value::Array(array));
    }

    /// 预置评估指标结果
    pub fn set_metrics(&self, value: Value) {
        self.state.lock().unwrap().metrics_result = Some(value);
    }

    /// 让预测调用失败
    pub fn fail_forecast_call(&self) {
        self.state.lock().unwrap().fail_forecast = true;
    }

    /// 让指标/特征重要性查询失败
    pub fn fail_metrics_call(&self) {
        self.state.lock().unwrap().fail_metrics = true;
    }

    /// 让模型创建语句失败
    pub fn fail_model_create(&self) {
        self.state.lock().unwrap().fail_model = true;
    }

    /// 从现在起第 n 条 INSERT 语句失败（只触发一次）
    pub fn fail_on_insert(&self, n: usize) {
        let mut st = self.state.lock().unwrap();
        let target = st.insert_seen + n;
        st.fail_on_insert = Some(target);
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.state.lock().unwrap().tables.contains_key(name)
    }

    /// 表内容解码为行结构体列表（保持插入顺序）
    pub fn table_rows<T: serde::de::DeserializeOwned>(&self, name: &str) -> Vec<T> {
        let st = self.state.lock().unwrap();
        let rows = st
            .tables
            .get(name)
            .unwrap_or_else(|| panic!("表不存在: {}", name));
        rows.iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                for (col, value) in row {
                    obj.insert(col.clone(), rbs_to_json(value));
                }
                serde_json::from_value(serde_json::Value::Object(obj)).expect("行解码失败")
            })
            .collect()
    }

    pub fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }

    pub fn views(&self) -> Vec<String> {
        self.state.lock().unwrap().views.clone()
    }

    pub fn models(&self) -> Vec<String> {
        self.state.lock().unwrap().models.clone()
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn exec(&self, sql: &str, _params: Vec<Value>) -> Result<u64, AppError> {
        let mut st = self.state.lock().unwrap();
        st.statements.push(sql.to_string());
        if sql.contains("CREATE OR REPLACE VIEW") {
            let name = word_after(sql, "VIEW ").expect("视图名解析失败");
            st.views.push(name);
        } else if sql.contains("SNOWFLAKE.ML.FORECAST") {
            if st.fail_model {
                return Err(AppError::Warehouse("模拟模型创建失败".to_string()));
            }
            let name = word_after(sql, "SNOWFLAKE.ML.FORECAST ").expect("模型名解析失败");
            st.models.push(name);
        }
        Ok(0)
    }

    async fn query(&self, sql: &str, _params: Vec<Value>) -> Result<Value, AppError> {
        let mut st = self.state.lock().unwrap();
        st.statements.push(sql.to_string());

        if sql.contains("!FORECAST(") {
            if st.fail_forecast {
                return Err(AppError::Warehouse("模拟预测调用失败".to_string()));
            }
            return Ok(st
                .forecast_result
                .clone()
                .unwrap_or(Value::Array(vec![])));
        }
        if sql.contains("!SHOW_EVALUATION_METRICS") {
            if st.fail_metrics {
                return Err(AppError::Warehouse("模拟指标查询失败".to_string()));
            }
            return Ok(st.metrics_result.clone().unwrap_or(Value::Array(vec![])));
        }
        if sql.contains("!EXPLAIN_FEATURE_IMPORTANCE") {
            if st.fail_metrics {
                return Err(AppError::Warehouse("模拟指标查询失败".to_string()));
            }
            return Ok(Value::Array(vec![]));
        }
        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            return select_rows(&st, sql);
        }
        Err(AppError::Warehouse(format!("未识别的查询: {}", sql)))
    }

    async fn begin(&self) -> Result<Box<dyn WarehouseTx>, AppError> {
        Ok(Box::new(MemTx {
            state: Arc::clone(&self.state),
            staged: Vec::new(),
        }))
    }
}

enum Op {
    CreateTable(String),
    Insert(String, Row),
}

struct MemTx {
    state: Arc<Mutex<MemState>>,
    staged: Vec<Op>,
}

#[async_trait]
impl WarehouseTx for MemTx {
    async fn exec(&mut self, sql: &str, params: Vec<Value>) -> Result<u64, AppError> {
        let mut st = self.state.lock().unwrap();
        st.statements.push(sql.to_string());

        if sql.trim_start().starts_with("INSERT INTO") {
            st.insert_seen += 1;
            if st.fail_on_insert == Some(st.insert_seen) {
                st.fail_on_insert = None;
                return Err(AppError::Warehouse("模拟插入失败".to_string()));
            }
            let table = word_after(sql, "INSERT INTO ").expect("表名解析失败");
            let cols = paren_columns(sql).expect("插入列解析失败");
            assert_eq!(cols.len(), params.len(), "列数与参数个数不一致");
            let row: Row = cols.into_iter().zip(params).collect();
            self.staged.push(Op::Insert(table, row));
            return Ok(1);
        }
        if sql.contains("CREATE OR REPLACE TABLE") {
            let table = word_after(sql, "TABLE ").expect("表名解析失败");
            self.staged.push(Op::CreateTable(table));
            return Ok(0);
        }
        Ok(0)
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        let mut st = self.state.lock().unwrap();
        for op in self.staged.drain(..) {
            match op {
                Op::CreateTable(name) => {
                    st.tables.insert(name, Vec::new());
                }
                Op::Insert(name, row) => {
                    st.tables
                        .get_mut(&name)
                        .unwrap_or_else(|| panic!("插入前未建表: {}", name))
                        .push(row);
                }
            }
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), AppError> {
        self.staged.clear();
        Ok(())
    }
}

fn select_rows(st: &MemState, sql: &str) -> Result<Value, AppError> {
    let upper = sql.to_uppercase();
    let select_pos = upper.find("SELECT").unwrap() + "SELECT".len();
    let from_pos = upper
        .find(" FROM ")
        .ok_or_else(|| AppError::Warehouse(format!("缺少FROM: {}", sql)))?;
    let cols: Vec<String> = sql[select_pos..from_pos]
        .split(',')
        .map(|c| c.trim().to_string())
        .collect();
    let table = sql[from_pos + " FROM ".len()..]
        .trim()
        .split_whitespace()
        .next()
        .unwrap()
        .to_string();
    let rows = st
        .tables
        .get(&table)
        .ok_or_else(|| AppError::Warehouse(format!("表不存在: {}", table)))?;

    let mut array = Vec::with_capacity(rows.len());
    for row in rows {
        let mut map = ValueMap::new();
        for col in &cols {
            let value = row
                .iter()
                .find(|(name, _)| name == col)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null);
            map.insert(Value::String(col.clone()), value);
        }
        array.push(Value::Map(map));
    }
    Ok(Value::Array(array))
}

fn word_after(sql: &str, keyword: &str) -> Option<String> {
    let idx = sql.find(keyword)?;
    let rest = sql[idx + keyword.len()..].trim_start();
    rest.split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .map(|s| s.to_string())
}

fn paren_columns(sql: &str) -> Option<Vec<String>> {
    let open = sql.find('(')?;
    let close = sql[open..].find(')')? + open;
    Some(
        sql[open + 1..close]
            .split(',')
            .map(|c| c.trim().to_string())
            .collect(),
    )
}

fn rbs_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::I32(n) => serde_json::json!(n),
        Value::I64(n) => serde_json::json!(n),
        Value::U32(n) => serde_json::json!(n),
        Value::U64(n) => serde_json::json!(n),
        Value::F32(n) => serde_json::json!(n),
        Value::F64(n) => serde_json::json!(n),
        Value::String(s) => serde_json::Value::String(s.clone()),
        other => serde_json::Value::String(other.to_string()),
    }
}

/// 静态行情源：按 symbol 预置记录，可标记失败的 symbol
pub struct StaticQuotes {
    series: HashMap<String, Vec<PriceRecord>>,
    failing: Vec<String>,
}

impl StaticQuotes {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            failing: Vec::new(),
        }
    }

    pub fn insert(&mut self, symbol: &str, records: Vec<PriceRecord>) {
        self.series.insert(symbol.to_string(), records);
    }

    pub fn fail(&mut self, symbol: &str) {
        self.failing.push(symbol.to_string());
    }
}

#[async_trait]
impl QuoteSource for StaticQuotes {
    async fn daily_series(&self, symbol: &str) -> Result<Vec<PriceRecord>, AppError> {
        if self.failing.iter().any(|s| s == symbol) {
            return Err(AppError::Fetch(format!("{} 网络错误", symbol)));
        }
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| AppError::Fetch(format!("{} 无行情数据", symbol)))
    }
}

/// 构造一条测试记录，open/high/low 由 close 派生
pub fn record(symbol: &str, date: &str, close: f64) -> PriceRecord {
    PriceRecord {
        symbol: symbol.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

/// 从某个起始日开始生成连续 n 天的记录
pub fn record_run(symbol: &str, start: &str, n: usize) -> Vec<PriceRecord> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    (0..n)
        .map(|i| {
            let date = start + chrono::Duration::days(i as i64);
            record(symbol, &date.format("%Y-%m-%d").to_string(), 100.0 + i as f64)
        })
        .collect()
}

/// 测试配置（表名不带库前缀，便于断言）
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        vantage_api_key: "demo".to_string(),
        symbols: vec!["AAPL".to_string()],
        lookback_days: 90,
        forecast_periods: 7,
        prediction_interval: 0.95,
        price_table: "stock_table".to_string(),
        train_view: "stock_data_view".to_string(),
        forecast_table: "stock_data_forecast".to_string(),
        model_name: "predict_stock_price".to_string(),
        final_table: "final_stock_data".to_string(),
    }
}
