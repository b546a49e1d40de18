//! 模拟油价生成器
//!
//! 未配置第三方数据源或全部数据源失败时使用。
//! 省份价格 = 全国基准价 + 大区偏移 + 档位偏移 + 随机抖动，结果限制在合法区间内。
//! 所有函数接收外部传入的随机数生成器，测试中可使用固定种子。

use chrono::{Datelike, Duration, NaiveDate};
use rand::Rng;

use crate::models::{
    round_to, Direction, HistoryEntry, NextAdjustment, PricePoint, Province, Region,
    BASE_PRICE_MAX, BASE_PRICE_MIN,
};

/// 全国均价（基准）
pub const NATIONAL_BASE: PricePoint = PricePoint {
    gas92: 7.89,
    gas95: 8.37,
    gas98: 9.13,
    diesel0: 7.56,
};

/// 省份价格随机抖动幅度（±）
const PROVINCE_JITTER: f64 = 0.15;
/// 城市相对所在省份的抖动幅度（±）
const CITY_JITTER: f64 = 0.05;
/// 历史价格单日波动幅度（±）
const HISTORY_STEP: f64 = 0.1;
/// 历史价格向基准价回归的力度
const HISTORY_REVERSION: f64 = 0.1;
/// 调价周期（天）
pub const ADJUSTMENT_CYCLE_DAYS: u32 = 10;
/// 判断涨跌所用的最近历史天数
const TREND_WINDOW: usize = 5;
/// 涨跌判定阈值
const TREND_THRESHOLD: f64 = 0.02;

fn region_offset(region: Region) -> f64 {
    match region {
        Region::NorthChina => 0.0,
        Region::Northeast => -0.10,
        Region::EastChina => 0.05,
        Region::CentralChina => 0.0,
        Region::SouthChina => 0.08,
        Region::Southwest => 0.12,
        Region::Northwest => -0.05,
    }
}

fn level_offset(level: u8) -> f64 {
    match level {
        1 => 0.06,
        2 => 0.02,
        _ => -0.03,
    }
}

/// 省份相对全国基准的固定偏移
pub fn province_modifier(province: &Province) -> f64 {
    region_offset(province.region) + level_offset(province.level)
}

fn jitter<R: Rng>(rng: &mut R, amplitude: f64) -> f64 {
    rng.random_range(-amplitude..=amplitude)
}

/// 生成单个省份的价格
pub fn province_price<R: Rng>(rng: &mut R, province: &Province, base: PricePoint) -> PricePoint {
    let modifier = province_modifier(province);
    base.map(|value, ratio| value + modifier * ratio + jitter(rng, PROVINCE_JITTER))
        .clamped()
}

/// 在省份价格基础上生成城市价格
pub fn city_price<R: Rng>(rng: &mut R, province_price: PricePoint) -> PricePoint {
    province_price
        .map(|value, _| value + jitter(rng, CITY_JITTER))
        .clamped()
}

/// 生成最近 `days` 天的全国历史价格，最新在前
///
/// 以 `anchor_gas92` 作为今日价格向过去做均值回归的随机游走，
/// 每条记录的 `change` 为相对前一日（更早一条）的 92 号汽油变化。
pub fn history<R: Rng>(
    rng: &mut R,
    anchor_gas92: f64,
    days: usize,
    today: NaiveDate,
) -> Vec<HistoryEntry> {
    let mut entries = Vec::with_capacity(days);
    let mut price = anchor_gas92.clamp(BASE_PRICE_MIN, BASE_PRICE_MAX);

    for i in 0..days {
        let step = jitter(rng, HISTORY_STEP) + (price - NATIONAL_BASE.gas92) * HISTORY_REVERSION;
        let older = (price - step).clamp(BASE_PRICE_MIN, BASE_PRICE_MAX);
        let point = PricePoint::from_base(price).clamped().rounded(2);

        entries.push(HistoryEntry {
            date: (today - Duration::days(i as i64)).format("%Y-%m-%d").to_string(),
            gas92: point.gas92,
            gas95: point.gas95,
            gas98: point.gas98,
            diesel0: point.diesel0,
            change: round_to(price - older, 3),
        });
        price = older;
    }

    entries
}

/// 根据最近的历史走势预测下次调价
pub fn next_adjustment(history: &[HistoryEntry], today: NaiveDate) -> NextAdjustment {
    let recent: f64 = history.iter().take(TREND_WINDOW).map(|h| h.change).sum();
    let direction = if recent > TREND_THRESHOLD {
        Direction::Up
    } else if recent < -TREND_THRESHOLD {
        Direction::Down
    } else {
        Direction::Stable
    };

    let offset = today.num_days_from_ce().rem_euclid(ADJUSTMENT_CYCLE_DAYS as i32) as u32;
    let days_remaining = ADJUSTMENT_CYCLE_DAYS - offset;

    NextAdjustment {
        date: (today + Duration::days(days_remaining as i64))
            .format("%Y-%m-%d")
            .to_string(),
        direction,
        expected_change: round_to(recent.abs(), 2),
        days_remaining,
        trend: direction.trend().to_string(),
    }
}
