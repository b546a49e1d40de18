//! 第三方油价数据源
//!
//! 按配置顺序依次尝试，第一个返回有效省份价格表的数据源胜出。
//! 单个数据源失败只记录日志，不向上抛出；全部失败时由调用方回退到模拟数据。
//!
//! ## 数据源
//! - 天行数据：http://api.tianapi.com/oilprice/index
//! - 聚合数据：http://apis.juhe.cn/gnyj/query

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::catalog::match_province_label;
use crate::config::{AppConfig, ProviderConfig, ProviderKind};
use crate::models::{PricePoint, GRADE_RATIOS};

/// 天行数据油价接口
pub const TIANAPI_OIL_PRICE_URL: &str = "http://api.tianapi.com/oilprice/index";
/// 聚合数据国内油价接口
pub const JUHE_OIL_PRICE_URL: &str = "http://apis.juhe.cn/gnyj/query";

/// 省份价格表，键为省份全称
pub type ProvinceTable = HashMap<&'static str, PricePoint>;

/// 一次成功拉取的结果
#[derive(Debug, Clone)]
pub struct ProviderQuote {
    /// 数据源名称
    pub source: String,
    pub provinces: ProvinceTable,
}

/// 油价数据源
#[async_trait]
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// 是否已配置可用（如 API Key 非空）
    fn is_configured(&self) -> bool;

    async fn fetch(&self) -> Result<ProviderQuote>;
}

/// 数据源回退链
pub struct ProviderChain {
    providers: Vec<Box<dyn PriceProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Box<dyn PriceProvider>>) -> Self {
        Self { providers }
    }

    /// 不含任何数据源，始终使用模拟数据
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// 根据配置构建数据源链，所有数据源共用一个带超时的 HTTP 客户端
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .connect_timeout(Duration::from_secs(config.api.connect_timeout_secs))
            .gzip(true)
            .build()?;

        let providers = config
            .providers
            .iter()
            .filter(|p| p.enabled)
            .map(|p| build_provider(p, client.clone()))
            .collect();

        Ok(Self::new(providers))
    }

    /// 已配置 API Key 的数据源个数，未配置的数据源刷新时直接跳过
    pub fn configured_count(&self) -> usize {
        self.providers.iter().filter(|p| p.is_configured()).count()
    }

    /// 依次尝试各数据源，返回第一个成功的结果
    pub async fn fetch_first(&self) -> Option<ProviderQuote> {
        for provider in &self.providers {
            if !provider.is_configured() {
                log::debug!("数据源 {} 未配置 API Key，跳过", provider.name());
                continue;
            }

            match provider.fetch().await {
                Ok(quote) => {
                    log::info!(
                        "数据源 {} 返回 {} 个省份价格",
                        quote.source,
                        quote.provinces.len()
                    );
                    return Some(quote);
                }
                Err(e) => {
                    log::warn!("数据源 {} 获取失败: {}", provider.name(), e);
                }
            }
        }

        None
    }
}

fn build_provider(config: &ProviderConfig, client: Client) -> Box<dyn PriceProvider> {
    match config.kind {
        ProviderKind::Tianapi => Box::new(TianApiProvider {
            client,
            api_key: config.api_key.clone(),
            url: config
                .base_url
                .clone()
                .unwrap_or_else(|| TIANAPI_OIL_PRICE_URL.to_string()),
        }),
        ProviderKind::Juhe => Box::new(JuheProvider {
            client,
            api_key: config.api_key.clone(),
            url: config
                .base_url
                .clone()
                .unwrap_or_else(|| JUHE_OIL_PRICE_URL.to_string()),
        }),
    }
}

/// 天行数据
pub struct TianApiProvider {
    client: Client,
    api_key: String,
    url: String,
}

#[async_trait]
impl PriceProvider for TianApiProvider {
    fn name(&self) -> &str {
        "tianapi"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn fetch(&self) -> Result<ProviderQuote> {
        log::debug!("📡 请求天行数据油价 URL: {}", self.url);
        let json = get_json(&self.client, &self.url, &[("key", self.api_key.as_str())]).await?;
        Ok(ProviderQuote {
            source: self.name().to_string(),
            provinces: parse_tianapi(&json)?,
        })
    }
}

/// 聚合数据
pub struct JuheProvider {
    client: Client,
    api_key: String,
    url: String,
}

#[async_trait]
impl PriceProvider for JuheProvider {
    fn name(&self) -> &str {
        "juhe"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn fetch(&self) -> Result<ProviderQuote> {
        log::debug!("📡 请求聚合数据油价 URL: {}", self.url);
        let json = get_json(&self.client, &self.url, &[("key", self.api_key.as_str())]).await?;
        Ok(ProviderQuote {
            source: self.name().to_string(),
            provinces: parse_juhe(&json)?,
        })
    }
}

async fn get_json(client: &Client, url: &str, query: &[(&str, &str)]) -> Result<Value> {
    let response = client
        .get(url)
        .query(query)
        .header("User-Agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(anyhow!("HTTP 状态异常: {}", response.status()));
    }

    Ok(response.json().await?)
}

/// 解析价格字段，兼容字符串和数字，"-" 或空串视为缺失
fn parse_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (price.is_finite() && price > 0.0).then_some(price)
}

/// 由各油品字段组装价格，92 号缺失视为无效；其余油品缺失时按比例推算
fn assemble_point(item: &Value, fields: [&str; 4]) -> Option<PricePoint> {
    let gas92 = parse_price(&item[fields[0]])?;
    let mut values = [gas92; 4];
    for i in 1..4 {
        values[i] = parse_price(&item[fields[i]]).unwrap_or(gas92 * GRADE_RATIOS[i]);
    }
    Some(PricePoint::from_array(values))
}

/// 将数据源记录映射到参考省份，丢弃无法识别或越界的记录
fn collect_table<'a>(
    items: impl Iterator<Item = &'a Value>,
    label_field: &str,
    fields: [&str; 4],
) -> ProvinceTable {
    let mut table = ProvinceTable::new();

    for item in items {
        let label = item[label_field].as_str().unwrap_or("");
        let Some(province) = match_province_label(label) else {
            log::debug!("无法识别的地区名称: {:?}", label);
            continue;
        };
        let Some(point) = assemble_point(item, fields) else {
            log::debug!("{} 缺少 92 号汽油价格", province.name);
            continue;
        };
        if !point.is_within_bounds() {
            log::warn!("{} 价格超出合理区间，已忽略: {:?}", province.name, point);
            continue;
        }
        table.insert(province.name, point);
    }

    table
}

/// 解析天行数据响应
///
/// 格式: {"code":200,"msg":"success","newslist":[{"prov":"北京","p0":"7.56","p92":"7.89","p95":"8.40","p98":"9.40","time":"..."}]}
/// 新版接口把列表放在 result.list 中
pub fn parse_tianapi(json: &Value) -> Result<ProvinceTable> {
    let code = json["code"].as_i64().unwrap_or(-1);
    if code != 200 {
        return Err(anyhow!(
            "天行数据返回错误: code={} msg={}",
            code,
            json["msg"].as_str().unwrap_or("")
        ));
    }

    let list = json["newslist"]
        .as_array()
        .or_else(|| json["result"]["list"].as_array())
        .ok_or_else(|| anyhow!("天行数据响应缺少价格列表"))?;

    let table = collect_table(list.iter(), "prov", ["p92", "p95", "p98", "p0"]);
    if table.is_empty() {
        return Err(anyhow!("天行数据未返回有效省份价格"));
    }
    Ok(table)
}

/// 解析聚合数据响应
///
/// 格式: {"resultcode":"200","reason":"查询成功!","result":[{"city":"北京","92h":"7.89","95h":"8.40","98h":"9.40","0h":"7.56"}],"error_code":0}
pub fn parse_juhe(json: &Value) -> Result<ProvinceTable> {
    let error_code = json["error_code"].as_i64().unwrap_or(-1);
    if error_code != 0 {
        return Err(anyhow!(
            "聚合数据返回错误: error_code={} reason={}",
            error_code,
            json["reason"].as_str().unwrap_or("")
        ));
    }

    let list = json["result"]
        .as_array()
        .ok_or_else(|| anyhow!("聚合数据响应缺少价格列表"))?;

    let table = collect_table(list.iter(), "city", ["92h", "95h", "98h", "0h"]);
    if table.is_empty() {
        return Err(anyhow!("聚合数据未返回有效省份价格"));
    }
    Ok(table)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// 测试用数据源：返回固定结果并记录调用次数
    pub(crate) struct StubProvider {
        pub name: &'static str,
        pub configured: bool,
        pub result: Option<ProvinceTable>,
        pub calls: Arc<AtomicUsize>,
    }

    impl StubProvider {
        pub fn ok(name: &'static str, table: ProvinceTable) -> Self {
            Self { name, configured: true, result: Some(table), calls: Arc::default() }
        }

        pub fn failing(name: &'static str) -> Self {
            Self { name, configured: true, result: None, calls: Arc::default() }
        }
    }

    #[async_trait]
    impl PriceProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn fetch(&self) -> Result<ProviderQuote> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Some(table) => Ok(ProviderQuote {
                    source: self.name.to_string(),
                    provinces: table.clone(),
                }),
                None => Err(anyhow!("{} unavailable", self.name)),
            }
        }
    }

    pub(crate) fn sample_table() -> ProvinceTable {
        ProvinceTable::from([
            ("北京市", PricePoint::from_array([7.90, 8.41, 9.40, 7.58])),
            ("上海市", PricePoint::from_array([7.86, 8.37, 9.36, 7.52])),
            ("广东省", PricePoint::from_array([7.92, 8.58, 9.56, 7.57])),
        ])
    }

    #[test]
    fn test_parse_tianapi() {
        let json = json!({
            "code": 200,
            "msg": "success",
            "newslist": [
                { "prov": "北京", "p0": "7.56", "p92": "7.89", "p95": "8.40", "p98": "9.40", "time": "2026-10-18" },
                { "prov": "内蒙古", "p0": "7.40", "p92": "7.81", "p95": "8.33", "p98": "-", "time": "2026-10-18" },
                { "prov": "火星", "p0": "7.40", "p92": "7.81", "p95": "8.33", "p98": "9.10" },
                { "prov": "西藏", "p0": "8.80", "p92": "", "p95": "9.00", "p98": "9.90" },
                { "prov": "上海", "p0": "70.6", "p92": "78.9", "p95": "84.0", "p98": "94.0" }
            ]
        });

        let table = parse_tianapi(&json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table["北京市"], PricePoint::from_array([7.89, 8.40, 9.40, 7.56]));

        let inner_mongolia = table["内蒙古自治区"];
        assert_eq!(inner_mongolia.gas92, 7.81);
        assert!((inner_mongolia.gas98 - 7.81 * 1.16).abs() < 1e-9);
    }

    #[test]
    fn test_parse_tianapi_error_code() {
        let json = json!({ "code": 230, "msg": "key错误或为空" });
        let err = parse_tianapi(&json).unwrap_err();
        assert!(err.to_string().contains("230"));
    }

    #[test]
    fn test_parse_tianapi_result_list() {
        let json = json!({
            "code": 200,
            "result": { "list": [ { "prov": "广东", "p0": 7.57, "p92": 7.92, "p95": 8.58, "p98": 9.56 } ] }
        });
        let table = parse_tianapi(&json).unwrap();
        assert_eq!(table["广东省"].gas95, 8.58);
    }

    #[test]
    fn test_parse_juhe() {
        let json = json!({
            "resultcode": "200",
            "reason": "查询成功!",
            "result": [
                { "city": "黑龙江", "92h": "7.74", "95h": "8.27", "98h": "9.27", "0h": "7.37" },
                { "city": "新疆", "92h": "7.60", "95h": "8.10", "98h": "8.94", "0h": "7.20" }
            ],
            "error_code": 0
        });

        let table = parse_juhe(&json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table["黑龙江省"].diesel0, 7.37);
        assert_eq!(table["新疆维吾尔自治区"].gas92, 7.60);
    }

    #[test]
    fn test_parse_juhe_empty_result_is_error() {
        let json = json!({ "resultcode": "200", "result": [], "error_code": 0 });
        assert!(parse_juhe(&json).is_err());

        let json = json!({ "resultcode": "101", "reason": "错误的请求KEY", "error_code": 10001 });
        assert!(parse_juhe(&json).is_err());
    }

    #[tokio::test]
    async fn test_chain_falls_through_to_next_provider() {
        let failing = StubProvider::failing("first");
        let failing_calls = failing.calls.clone();
        let second = StubProvider::ok("second", sample_table());

        let chain = ProviderChain::new(vec![Box::new(failing), Box::new(second)]);
        let quote = chain.fetch_first().await.unwrap();

        assert_eq!(quote.source, "second");
        assert_eq!(quote.provinces.len(), 3);
        assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_chain_skips_unconfigured_provider() {
        let mut unconfigured = StubProvider::ok("nokey", sample_table());
        unconfigured.configured = false;
        let calls = unconfigured.calls.clone();

        let chain = ProviderChain::new(vec![Box::new(unconfigured)]);
        assert!(chain.fetch_first().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_chain_all_failing() {
        let chain = ProviderChain::new(vec![
            Box::new(StubProvider::failing("a")),
            Box::new(StubProvider::failing("b")),
        ]);
        assert!(chain.fetch_first().await.is_none());
        assert!(ProviderChain::empty().fetch_first().await.is_none());
    }

    #[test]
    fn test_keyless_providers_are_not_counted() {
        let config = AppConfig::default();
        let chain = ProviderChain::from_config(&config).unwrap();
        assert_eq!(chain.configured_count(), 0);

        let mut unconfigured = StubProvider::ok("nokey", sample_table());
        unconfigured.configured = false;
        let chain = ProviderChain::new(vec![
            Box::new(unconfigured),
            Box::new(StubProvider::failing("down")),
        ]);
        assert_eq!(chain.configured_count(), 1);
    }

    #[test]
    fn test_from_config_respects_enabled_flag() {
        let mut config = AppConfig::default();
        for provider in &mut config.providers {
            provider.api_key = "key".to_string();
        }
        config.providers[1].enabled = false;
        let chain = ProviderChain::from_config(&config).unwrap();
        assert_eq!(chain.configured_count(), 1);
    }
}
