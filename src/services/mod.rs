//! 业务逻辑服务模块
//!
//! 封装数据获取和处理逻辑

pub mod oil_price; // 油价数据服务
