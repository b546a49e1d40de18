//! 通用 API 响应模型
//!
//! 定义统一的 API 响应格式

use serde::{Deserialize, Serialize};

/// 统一 API 响应结构
///
/// 所有接口返回统一格式，包含：
/// - code: 业务状态码（成功为 200）
/// - msg: 响应消息
/// - data: 响应数据（失败时为 null）
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// 业务状态码
    pub code: u16,
    /// 响应消息
    pub msg: String,
    /// 响应数据
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    ///
    /// # 参数
    /// - data: 响应数据
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            msg: "success".to_string(),
            data: Some(data),
        }
    }

    /// 创建错误响应
    ///
    /// # 参数
    /// - code: 业务状态码
    /// - msg: 错误信息
    pub fn error(code: u16, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}
