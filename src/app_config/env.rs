use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::AppError;

/// 读取布尔型环境变量：true/1 视为真（大小写不敏感），未设置用默认值
pub fn env_is_true(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| {
            let v = v.trim();
            v.eq_ignore_ascii_case("true") || v == "1"
        })
        .unwrap_or(default)
}

/// 读取字符串环境变量，未设置时返回默认值
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// 读取并解析数值型环境变量，未设置时解析默认值文本
pub fn env_parsed<T>(key: &str, default: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| AppError::Config(format!("{} 非法: {}", key, e)))
}
