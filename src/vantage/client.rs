use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::AppError;
use crate::vantage::model::{parse_daily_series, PriceRecord};

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// 行情数据源
///
/// 拉取阶段只依赖该接口，便于测试时用内存实现替换真实 HTTP 调用。
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// 返回某只股票的全部日线记录（未排序、未截断）
    async fn daily_series(&self, symbol: &str) -> Result<Vec<PriceRecord>, AppError>;
}

/// Alpha Vantage 行情客户端
pub struct VantageClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl VantageClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// 指定接口地址（测试或代理场景）
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl QuoteSource for VantageClient {
    async fn daily_series(&self, symbol: &str) -> Result<Vec<PriceRecord>, AppError> {
        let url = format!(
            "{}/query?function=TIME_SERIES_DAILY&symbol={}&apikey={}",
            self.base_url, symbol, self.api_key
        );
        let response = self.client.get(&url).send().await?;
        let status_code = response.status();
        let response_body = response.text().await?;
        debug!("symbol: {}, vantage response {} bytes", symbol, response_body.len());

        if status_code != StatusCode::OK {
            return Err(AppError::Fetch(format!(
                "请求失败: {} http status {}",
                symbol, status_code
            )));
        }
        let data: serde_json::Value = serde_json::from_str(&response_body)
            .map_err(|e| AppError::Fetch(format!("{} 响应解析失败: {}", symbol, e)))?;
        parse_daily_series(symbol, &data)
    }
}
