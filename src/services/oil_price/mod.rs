//! 油价数据服务
//!
//! 提供当前油价、城市/省份对比、历史价格等数据。
//!
//! ## 刷新策略
//! - 所有读取接口先检查数据是否过期（`now > valid_until`）
//! - 过期时整体重建快照：先按顺序尝试第三方数据源，全部失败则使用模拟数据
//! - 重建过程由互斥锁串行化，新快照构建完成后一次性替换，读取方只会看到完整的快照

pub mod catalog;
pub mod generator;
pub mod provider;
pub mod snapshot;
pub mod tips;

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::config::AppConfig;

/// 刷新间隔上限（十年），超出时按上限处理
const MAX_REFRESH_INTERVAL_SECS: u64 = 10 * 365 * 24 * 3600;
use crate::models::{
    CacheStatus, City, CityPrice, HistoryEntry, PriceData, ProvinceItem, ProvincePrice, Tip,
};
pub use provider::ProviderChain;
pub use snapshot::{PriceSnapshot, SnapshotSettings};

/// 服务参数
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub snapshot: SnapshotSettings,
    /// 未知城市时的默认城市
    pub default_city: String,
    /// 未知省份时的默认省份
    pub default_province: String,
}

impl ServiceSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            snapshot: SnapshotSettings {
                ttl: refresh_ttl(config.cache.refresh_interval_secs),
                history_days: config.cache.history_days,
            },
            default_city: config.defaults.city.clone(),
            default_province: config.defaults.province.clone(),
        }
    }
}

fn refresh_ttl(secs: u64) -> Duration {
    let secs = secs.min(MAX_REFRESH_INTERVAL_SECS);
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}

/// 油价数据服务
pub struct OilPriceService {
    snapshot: RwLock<Arc<PriceSnapshot>>,
    refresh_lock: Mutex<()>,
    providers: ProviderChain,
    settings: ServiceSettings,
}

impl OilPriceService {
    /// 创建服务并生成首个快照
    pub async fn start(settings: ServiceSettings, providers: ProviderChain) -> Self {
        match providers.configured_count() {
            0 => log::info!("未配置第三方数据源 API Key，使用模拟数据"),
            n => log::info!("已启用 {} 个第三方数据源", n),
        }

        let initial = build_snapshot(&providers, &settings, None, Utc::now()).await;
        log::info!(
            "初始油价数据已生成，来源: {}，有效期至 {}",
            initial.source,
            initial.envelope.valid_until
        );

        Self {
            snapshot: RwLock::new(Arc::new(initial)),
            refresh_lock: Mutex::new(()),
            providers,
            settings,
        }
    }

    fn current(&self) -> Arc<PriceSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 当前数据是否已过期
    pub fn should_refresh(&self) -> bool {
        self.should_refresh_at(Utc::now())
    }

    pub fn should_refresh_at(&self, now: DateTime<Utc>) -> bool {
        self.current().envelope.is_stale(now)
    }

    /// 过期则重建快照，返回最新快照
    pub async fn refresh(&self) -> Arc<PriceSnapshot> {
        self.refresh_at(Utc::now()).await
    }

    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Arc<PriceSnapshot> {
        let current = self.current();
        if !current.envelope.is_stale(now) {
            return current;
        }

        let _guard = self.refresh_lock.lock().await;

        // 等锁期间可能已被其他请求刷新
        let current = self.current();
        if !current.envelope.is_stale(now) {
            return current;
        }

        log::info!(
            "油价数据已过期（有效期至 {}），重新生成",
            current.envelope.valid_until
        );
        let next = Arc::new(build_snapshot(&self.providers, &self.settings, Some(&current), now).await);

        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = next.clone();
        next
    }

    /// 获取指定城市的当前油价
    pub async fn get_current_prices(&self, city: Option<&str>) -> PriceData {
        self.refresh()
            .await
            .city_price_data(city, &self.settings.default_city)
    }

    /// 获取指定省份的当前油价
    pub async fn get_province_prices(&self, province: Option<&str>) -> PriceData {
        self.refresh()
            .await
            .province_price_data(province, &self.settings.default_province)
    }

    /// 获取所有城市列表
    pub async fn get_city_list(&self) -> Vec<City> {
        self.refresh().await;
        catalog::CITIES.to_vec()
    }

    /// 获取所有省份列表（附带当前价格）
    pub async fn get_province_list(&self) -> Vec<ProvinceItem> {
        self.refresh().await.province_items()
    }

    /// 获取所有城市的价格对比
    pub async fn get_all_city_prices(&self) -> Vec<CityPrice> {
        self.refresh().await.city_comparison()
    }

    /// 获取所有省份的价格对比
    pub async fn get_all_province_prices(&self) -> Vec<ProvincePrice> {
        self.refresh().await.province_comparison()
    }

    /// 获取历史价格数据，最多 `count` 条
    pub async fn get_history_price(&self, count: usize) -> Vec<HistoryEntry> {
        self.refresh().await.history(count).to_vec()
    }

    /// 缓存状态
    pub async fn cache_status(&self) -> CacheStatus {
        let snapshot = self.refresh().await;
        CacheStatus {
            envelope: snapshot.envelope.clone(),
            source: snapshot.source.clone(),
        }
    }

    /// 省钱小贴士
    pub fn tips(&self) -> &'static [Tip] {
        tips::TIPS
    }
}

async fn build_snapshot(
    providers: &ProviderChain,
    settings: &ServiceSettings,
    previous: Option<&PriceSnapshot>,
    now: DateTime<Utc>,
) -> PriceSnapshot {
    let quote = providers.fetch_first().await;
    if quote.is_none() && providers.configured_count() > 0 {
        log::warn!("所有数据源均不可用，回退到模拟数据");
    }

    let mut rng = rand::rng();
    PriceSnapshot::build(&mut rng, quote, previous, now, &settings.snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::oil_price::provider::tests::{sample_table, StubProvider};
    use std::sync::atomic::Ordering;

    fn settings(ttl_secs: i64) -> ServiceSettings {
        ServiceSettings {
            snapshot: SnapshotSettings {
                ttl: Duration::seconds(ttl_secs),
                history_days: 90,
            },
            default_city: "北京".to_string(),
            default_province: "北京市".to_string(),
        }
    }

    async fn synthetic_service() -> OilPriceService {
        OilPriceService::start(settings(3600), ProviderChain::empty()).await
    }

    #[tokio::test]
    async fn test_repeated_reads_within_window_are_identical() {
        let service = synthetic_service().await;

        let first = serde_json::to_string(&service.get_current_prices(Some("上海")).await).unwrap();
        let second = serde_json::to_string(&service.get_current_prices(Some("上海")).await).unwrap();
        assert_eq!(first, second);

        let a = serde_json::to_string(&service.get_all_province_prices().await).unwrap();
        let b = serde_json::to_string(&service.get_all_province_prices().await).unwrap();
        assert_eq!(a, b);

        assert_eq!(service.get_history_price(30).await, service.get_history_price(30).await);
        assert!(!service.should_refresh());
    }

    #[tokio::test]
    async fn test_expired_snapshot_is_rebuilt() {
        let service = synthetic_service().await;
        let before = service.refresh().await;

        let later = before.envelope.valid_until + Duration::seconds(1);
        assert!(service.should_refresh_at(later));

        let after = service.refresh_at(later).await;
        assert_eq!(after.envelope.last_update, later);
        assert_eq!(after.envelope.valid_until, later + Duration::seconds(3600));
        assert_eq!(after.previous_cities, before.cities);
        assert!(!service.should_refresh_at(later));
    }

    #[tokio::test]
    async fn test_not_stale_at_exact_expiry() {
        let service = synthetic_service().await;
        let snap = service.refresh().await;
        assert!(!service.should_refresh_at(snap.envelope.valid_until));

        let same = service.refresh_at(snap.envelope.valid_until).await;
        assert!(Arc::ptr_eq(&snap, &same));
    }

    #[tokio::test]
    async fn test_concurrent_refresh_rebuilds_once() {
        let provider = StubProvider::ok("stub", sample_table());
        let calls = provider.calls.clone();
        let service = Arc::new(
            OilPriceService::start(settings(60), ProviderChain::new(vec![Box::new(provider)])).await,
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let later = service.refresh().await.envelope.valid_until + Duration::seconds(5);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.refresh_at(later).await })
            })
            .collect();

        let mut snapshots = Vec::new();
        for handle in handles {
            snapshots.push(handle.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(snapshots.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_to_synthetic() {
        let chain = ProviderChain::new(vec![Box::new(StubProvider::failing("down"))]);
        let service = OilPriceService::start(settings(3600), chain).await;

        let status = service.cache_status().await;
        assert!(!status.envelope.prices_fetched);
        assert_eq!(status.source, snapshot::SYNTHETIC_SOURCE);
        assert_eq!(service.get_all_city_prices().await.len(), catalog::CITIES.len());
    }

    #[tokio::test]
    async fn test_provider_prices_are_served() {
        let chain = ProviderChain::new(vec![
            Box::new(StubProvider::failing("down")),
            Box::new(StubProvider::ok("backup", sample_table())),
        ]);
        let service = OilPriceService::start(settings(3600), chain).await;

        let status = service.cache_status().await;
        assert!(status.envelope.prices_fetched);
        assert_eq!(status.source, "backup");

        let shanghai = service.get_province_prices(Some("上海市")).await;
        assert_eq!(shanghai.current_prices[0].price, 7.86);
    }

    #[tokio::test]
    async fn test_unknown_city_uses_default() {
        let service = synthetic_service().await;
        let fallback = service.get_current_prices(Some("乌鲁木齐")).await;
        let beijing = service.get_current_prices(Some("北京")).await;
        assert_eq!(fallback, beijing);
        assert_eq!(service.get_current_prices(None).await, beijing);
    }

    #[tokio::test]
    async fn test_history_count_is_bounded() {
        let service = synthetic_service().await;
        for n in [0usize, 1, 7, 30, 90, 180, 10_000] {
            assert_eq!(service.get_history_price(n).await.len(), n.min(90));
        }
    }

    #[tokio::test]
    async fn test_huge_refresh_interval_is_capped() {
        let mut config = AppConfig::default();
        config.cache.refresh_interval_secs = u64::MAX;
        let settings = ServiceSettings::from_config(&config);
        assert_eq!(
            settings.snapshot.ttl,
            Duration::seconds(MAX_REFRESH_INTERVAL_SECS as i64)
        );

        let service = OilPriceService::start(settings, ProviderChain::empty()).await;
        let snap = service.refresh().await;
        assert!(snap.envelope.valid_until > snap.envelope.last_update);
        assert!(!service.should_refresh());
        assert!(Arc::ptr_eq(&snap, &service.refresh().await));
    }

    #[test]
    fn test_refresh_interval_passes_through() {
        assert_eq!(refresh_ttl(3600), Duration::hours(1));
        assert_eq!(refresh_ttl(0), Duration::zero());
    }

    #[tokio::test]
    async fn test_all_prices_within_bounds() {
        let service = synthetic_service().await;
        let snap = service.refresh().await;
        assert!(snap
            .provinces
            .values()
            .chain(snap.cities.values())
            .all(|p| p.is_within_bounds()));
        assert_eq!(service.get_city_list().await.len(), catalog::CITIES.len());
        assert_eq!(service.get_province_list().await.len(), catalog::PROVINCES.len());
        assert_eq!(service.tips().len(), 8);
    }
}
