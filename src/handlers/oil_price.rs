//! 油价接口处理器
//!
//! ## API 列表
//! - GET /oil-price/current?city= - 城市当前油价
//! - GET /oil-price/province/current?province= - 省份当前油价
//! - GET /oil-price/cities - 城市列表
//! - GET /oil-price/provinces - 省份列表（附带价格）
//! - GET /oil-price/cities/compare - 城市价格对比
//! - GET /oil-price/provinces/compare - 省份价格对比
//! - GET /oil-price/history?count= - 历史价格（兼容 days 参数）
//! - GET /oil-price/status - 缓存状态
//! - GET /oil-price/tips - 省钱小贴士
//!
//! 查询参数非法或重复时使用默认值，价格接口始终返回 200。

use actix_web::{web, HttpRequest, HttpResponse, Result};

use crate::models::{ApiResponse, HistoryQuery};
use crate::services::oil_price::OilPriceService;

/// 历史价格默认条数
const DEFAULT_HISTORY_COUNT: usize = 30;

/// 宽松解析的查询参数
///
/// `web::Query<T>` 遇到重复的键会直接返回 400，这里按键值对解析，
/// 同名参数取第一个，整体无法解析时视为没有参数。
#[derive(Debug, Default)]
struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    fn from_request(req: &HttpRequest) -> Self {
        web::Query::<Vec<(String, String)>>::from_query(req.query_string())
            .map(|q| Self(q.into_inner()))
            .unwrap_or_default()
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// 获取城市当前油价
///
/// GET /api/oil-price/current?city=上海
pub async fn get_current_prices(
    service: web::Data<OilPriceService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let params = QueryParams::from_request(&req);
    let city = params.get("city");
    log::debug!("收到获取当前油价请求: {:?}", city);
    let data = service.get_current_prices(city).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// 获取省份当前油价
///
/// GET /api/oil-price/province/current?province=上海市
pub async fn get_province_prices(
    service: web::Data<OilPriceService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let params = QueryParams::from_request(&req);
    let province = params.get("province");
    log::debug!("收到获取省份油价请求: {:?}", province);
    let data = service.get_province_prices(province).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// GET /api/oil-price/cities
pub async fn get_city_list(service: web::Data<OilPriceService>) -> Result<HttpResponse> {
    let data = service.get_city_list().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// GET /api/oil-price/provinces
pub async fn get_province_list(service: web::Data<OilPriceService>) -> Result<HttpResponse> {
    let data = service.get_province_list().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// GET /api/oil-price/cities/compare
pub async fn compare_cities(service: web::Data<OilPriceService>) -> Result<HttpResponse> {
    let data = service.get_all_city_prices().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// GET /api/oil-price/provinces/compare
pub async fn compare_provinces(service: web::Data<OilPriceService>) -> Result<HttpResponse> {
    let data = service.get_all_province_prices().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// 获取历史价格
///
/// GET /api/oil-price/history?count=30
pub async fn get_history(
    service: web::Data<OilPriceService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let params = QueryParams::from_request(&req);
    let query = HistoryQuery {
        count: params.get("count").map(str::to_string),
        days: params.get("days").map(str::to_string),
    };
    let count = query.resolve(DEFAULT_HISTORY_COUNT);
    let data = service.get_history_price(count).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// GET /api/oil-price/status
pub async fn get_status(service: web::Data<OilPriceService>) -> Result<HttpResponse> {
    let data = service.cache_status().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// GET /api/oil-price/tips
pub async fn get_tips(service: web::Data<OilPriceService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(service.tips())))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/oil-price")
            .route("/current", web::get().to(get_current_prices))
            .route("/province/current", web::get().to(get_province_prices))
            .route("/cities", web::get().to(get_city_list))
            .route("/cities/compare", web::get().to(compare_cities))
            .route("/provinces", web::get().to(get_province_list))
            .route("/provinces/compare", web::get().to(compare_provinces))
            .route("/history", web::get().to(get_history))
            .route("/status", web::get().to(get_status))
            .route("/tips", web::get().to(get_tips)),
    );
}
