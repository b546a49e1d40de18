use actix_web::{web, HttpResponse, Result};
use serde_json::json;

use crate::models::ApiResponse;
use crate::services::oil_price::OilPriceService;

/// 健康检查，附带价格数据是否已过期（过期数据会在下一次读取时重建）
pub async fn health_check(service: web::Data<OilPriceService>) -> Result<HttpResponse> {
    let response = ApiResponse::success(json!({
        "status": "ok",
        "stale": service.should_refresh(),
    }));
    Ok(HttpResponse::Ok().json(response))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
