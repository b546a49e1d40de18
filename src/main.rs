//! 油价查询后端服务
//!
//! 为小程序提供全国各城市、省份的油价数据 RESTful API
//! 数据来源：天行数据、聚合数据，未配置或不可用时使用模拟数据

mod config;   // 配置加载
mod handlers; // HTTP 请求处理器
mod models;   // 数据模型定义
mod services; // 业务逻辑服务

use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::Parser;
use env_logger::Env;

use crate::config::{AppConfig, ConfigSource};
use crate::services::oil_price::{OilPriceService, ProviderChain, ServiceSettings};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// 监听端口，覆盖配置文件
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// 配置文件路径（默认依次查找 config.json、config/config.json）
    #[arg(short, long, env = "OIL_PRICE_CONFIG")]
    config: Option<PathBuf>,
}

/// 跨域配置：回显请求的 Origin 并允许携带凭证
fn cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|_origin, _req| true)
        .supports_credentials()
        .allow_any_method()
        .allow_any_header()
        .max_age(86400)
}

/// 应用程序入口
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (mut config, source) = AppConfig::load(args.config.as_deref())?;
    config.apply_env();
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    match &source {
        ConfigSource::File(path) => log::info!("从 {} 加载配置成功", path.display()),
        ConfigSource::Default => log::info!("使用默认配置"),
    }

    let providers = ProviderChain::from_config(&config)?;
    let service = web::Data::new(
        OilPriceService::start(ServiceSettings::from_config(&config), providers).await,
    );

    let bind_addr = config.bind_addr();
    log::info!("启动油价查询服务: http://{}", bind_addr);

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(cors())                  // 跨域
            .wrap(Logger::default())       // 请求日志
            .app_data(service.clone())
            .configure(handlers::config)   // 配置路由
            .default_service(web::route().to(handlers::not_found))
    });

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_addr)
        .map_err(|e| anyhow::anyhow!("绑定地址 {} 失败: {}", bind_addr, e))?
        .run()
        .await?;

    Ok(())
}
