pub mod health;
pub mod oil_price;

use actix_web::{web, HttpResponse, Result};

use crate::models::ApiResponse;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(health::config)
            .configure(oil_price::config),
    );
}

/// 未匹配的路由统一返回 404 响应体
pub async fn not_found() -> Result<HttpResponse> {
    Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error(404, "Not Found")))
}
