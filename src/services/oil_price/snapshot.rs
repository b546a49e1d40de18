//! 价格快照
//!
//! 一次刷新生成的全部数据。快照构建完成后不再修改，读取接口只做派生计算，
//! 因此同一快照上的重复读取结果完全一致。

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Asia::Shanghai;
use rand::Rng;

use super::catalog::{find_city, find_province, CITIES, PROVINCES};
use super::generator::{self, NATIONAL_BASE};
use super::provider::ProviderQuote;
use crate::models::{
    round_to, CacheEnvelope, City, CityPrice, HistoryEntry, NextAdjustment, OilPrice, PriceData,
    PricePoint, Province, ProvinceItem, ProvincePrice, GRADE_NAMES,
};

/// 模拟数据的来源名称
pub const SYNTHETIC_SOURCE: &str = "synthetic";

/// 快照构建参数
#[derive(Debug, Clone)]
pub struct SnapshotSettings {
    /// 数据有效期
    pub ttl: Duration,
    /// 历史价格天数
    pub history_days: usize,
}

#[derive(Debug, Clone)]
pub struct PriceSnapshot {
    pub provinces: HashMap<&'static str, PricePoint>,
    pub cities: HashMap<&'static str, PricePoint>,
    /// 上一周期的省份价格
    pub previous_provinces: HashMap<&'static str, PricePoint>,
    /// 上一周期的城市价格
    pub previous_cities: HashMap<&'static str, PricePoint>,
    /// 全国均价
    pub national: PricePoint,
    /// 全国历史价格，最新在前
    pub history: Vec<HistoryEntry>,
    pub next_adjustment: NextAdjustment,
    pub envelope: CacheEnvelope,
    pub source: String,
}

impl PriceSnapshot {
    /// 构建完整快照
    ///
    /// - `quote`: 第三方数据源结果，None 表示使用模拟数据
    /// - `previous`: 上一个快照，用于计算涨跌；首次构建时由历史数据推算
    pub fn build<R: Rng>(
        rng: &mut R,
        quote: Option<ProviderQuote>,
        previous: Option<&PriceSnapshot>,
        now: DateTime<Utc>,
        settings: &SnapshotSettings,
    ) -> Self {
        let fetched = quote.as_ref().map(|q| &q.provinces);

        let national = fetched
            .and_then(|table| PricePoint::mean(table.values()))
            .unwrap_or(NATIONAL_BASE);

        let provinces: HashMap<&'static str, PricePoint> = PROVINCES
            .iter()
            .map(|p| {
                let price = fetched
                    .and_then(|table| table.get(p.name).copied())
                    .unwrap_or_else(|| generator::province_price(rng, p, national));
                (p.name, price)
            })
            .collect();

        let cities: HashMap<&'static str, PricePoint> = CITIES
            .iter()
            .map(|c| {
                let base = provinces.get(c.province).copied().unwrap_or(national);
                (c.name, generator::city_price(rng, base))
            })
            .collect();

        let today = now.with_timezone(&Shanghai).date_naive();
        let history = generator::history(rng, national.gas92, settings.history_days, today);
        let next_adjustment = generator::next_adjustment(&history, today);

        let (previous_provinces, previous_cities) = match previous {
            Some(prev) => (prev.provinces.clone(), prev.cities.clone()),
            None => {
                let last_change = history.first().map(|h| h.change).unwrap_or(0.0);
                (
                    shift_all(&provinces, last_change),
                    shift_all(&cities, last_change),
                )
            }
        };

        let source = quote
            .as_ref()
            .map(|q| q.source.clone())
            .unwrap_or_else(|| SYNTHETIC_SOURCE.to_string());

        Self {
            provinces,
            cities,
            previous_provinces,
            previous_cities,
            national,
            history,
            next_adjustment,
            envelope: CacheEnvelope {
                last_update: now,
                valid_until: now + settings.ttl,
                prices_fetched: quote.is_some(),
            },
            source,
        }
    }

    /// 指定城市的当前油价，未知城市回退到 `default_city`
    pub fn city_price_data(&self, city: Option<&str>, default_city: &str) -> PriceData {
        let info = resolve_city(city, default_city);
        self.price_data(
            self.cities.get(info.name),
            self.previous_cities.get(info.name),
            Some(info.name.to_string()),
            info.province.to_string(),
        )
    }

    /// 指定省份的当前油价，未知省份回退到 `default_province`
    pub fn province_price_data(&self, province: Option<&str>, default_province: &str) -> PriceData {
        let info = resolve_province(province, default_province);
        self.price_data(
            self.provinces.get(info.name),
            self.previous_provinces.get(info.name),
            None,
            info.name.to_string(),
        )
    }

    fn price_data(
        &self,
        current: Option<&PricePoint>,
        previous: Option<&PricePoint>,
        city_name: Option<String>,
        province_name: String,
    ) -> PriceData {
        let current = current.copied().unwrap_or(self.national);
        let previous = previous.copied().unwrap_or(current);

        let current_prices = GRADE_NAMES
            .iter()
            .zip(current.to_array())
            .zip(previous.to_array())
            .map(|((name, price), previous_price)| OilPrice {
                name: name.to_string(),
                price: round_to(price, 2),
                previous_price: round_to(previous_price, 2),
                change: round_to(price - previous_price, 2),
            })
            .collect();

        PriceData {
            current_prices,
            next_adjustment: self.next_adjustment.clone(),
            update_time: self.update_time(),
            city_name,
            province_name,
        }
    }

    /// 更新时间（北京时间）
    pub fn update_time(&self) -> String {
        self.envelope
            .last_update
            .with_timezone(&Shanghai)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }

    /// 全部城市价格对比，按 92 号汽油价格升序
    pub fn city_comparison(&self) -> Vec<CityPrice> {
        let mut rows: Vec<CityPrice> = CITIES
            .iter()
            .filter_map(|c| {
                let raw = self.cities.get(c.name)?;
                let price = raw.rounded(2);
                Some(CityPrice {
                    name: c.name.to_string(),
                    province: c.province.to_string(),
                    gas92: price.gas92,
                    gas95: price.gas95,
                    gas98: price.gas98,
                    diesel0: price.diesel0,
                    diff: self.diff(raw),
                })
            })
            .collect();
        rows.sort_by(|a, b| a.gas92.total_cmp(&b.gas92));
        rows
    }

    /// 全部省份价格对比，按 92 号汽油价格升序
    pub fn province_comparison(&self) -> Vec<ProvincePrice> {
        let mut rows: Vec<ProvincePrice> = PROVINCES
            .iter()
            .filter_map(|p| {
                let raw = self.provinces.get(p.name)?;
                let price = raw.rounded(2);
                Some(ProvincePrice {
                    name: p.name.to_string(),
                    gas92: price.gas92,
                    gas95: price.gas95,
                    gas98: price.gas98,
                    diesel0: price.diesel0,
                    diff: self.diff(raw),
                })
            })
            .collect();
        rows.sort_by(|a, b| a.gas92.total_cmp(&b.gas92));
        rows
    }

    /// 省份列表（参考数据顺序）
    pub fn province_items(&self) -> Vec<ProvinceItem> {
        PROVINCES
            .iter()
            .map(|p| {
                let price = self
                    .provinces
                    .get(p.name)
                    .copied()
                    .unwrap_or(self.national)
                    .rounded(2);
                ProvinceItem {
                    name: p.name.to_string(),
                    region: p.region,
                    level: p.level,
                    gas92: price.gas92,
                    gas95: price.gas95,
                    gas98: price.gas98,
                    diesel0: price.diesel0,
                }
            })
            .collect()
    }

    /// 最近 `count` 条历史记录（最新在前）
    pub fn history(&self, count: usize) -> &[HistoryEntry] {
        &self.history[..count.min(self.history.len())]
    }

    /// 与全国均价的差值，用未取整的价格计算
    fn diff(&self, price: &PricePoint) -> f64 {
        round_to(price.gas92 - self.national.gas92, 3)
    }
}

fn resolve_city(city: Option<&str>, default_city: &str) -> &'static City {
    city.and_then(find_city)
        .or_else(|| find_city(default_city))
        .unwrap_or(&CITIES[0])
}

fn resolve_province(province: Option<&str>, default_province: &str) -> &'static Province {
    province
        .and_then(find_province)
        .or_else(|| find_province(default_province))
        .unwrap_or(&PROVINCES[0])
}

/// 首次构建时按最近一次 92 号汽油变化推算上一周期价格
fn shift_all(
    table: &HashMap<&'static str, PricePoint>,
    change: f64,
) -> HashMap<&'static str, PricePoint> {
    table
        .iter()
        .map(|(name, price)| {
            let shifted = price.map(|value, ratio| value - change * ratio).clamped();
            (*name, shifted)
        })
        .collect()
}
