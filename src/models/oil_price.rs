//! 油价数据模型
//!
//! 定义城市、省份、油价、历史价格、缓存信封等数据结构。
//! 对外 JSON 字段统一使用 camelCase，与小程序端保持一致。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 基准油品（92号汽油）价格下限
pub const BASE_PRICE_MIN: f64 = 6.5;
/// 基准油品（92号汽油）价格上限
pub const BASE_PRICE_MAX: f64 = 9.5;

/// 区间判断的浮点容差（两位小数取整可能落在边界之外一个 ulp）
const BOUND_EPSILON: f64 = 1e-9;

/// 各油品相对 92 号汽油的价格比例：92 / 95 / 98 / 0号柴油
pub const GRADE_RATIOS: [f64; 4] = [1.0, 1.06, 1.16, 0.96];

/// 油品展示名称，顺序与 [`GRADE_RATIOS`] 一致
pub const GRADE_NAMES: [&str; 4] = ["92号汽油", "95号汽油", "98号汽油", "0号柴油"];

/// 四舍五入到指定小数位
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// 地理大区
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "华北")]
    NorthChina,
    #[serde(rename = "东北")]
    Northeast,
    #[serde(rename = "华东")]
    EastChina,
    #[serde(rename = "华中")]
    CentralChina,
    #[serde(rename = "华南")]
    SouthChina,
    #[serde(rename = "西南")]
    Southwest,
    #[serde(rename = "西北")]
    Northwest,
}

/// 城市（静态参考数据）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct City {
    /// 城市名称
    pub name: &'static str,
    /// 所属省份全称
    pub province: &'static str,
}

/// 省份（静态参考数据）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Province {
    /// 省份全称
    pub name: &'static str,
    /// 所属大区
    pub region: Region,
    /// 价格档位 1..=3
    pub level: u8,
}

/// 单个地区的四种油品单价（元/升）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub gas92: f64,
    pub gas95: f64,
    pub gas98: f64,
    pub diesel0: f64,
}

impl PricePoint {
    /// 以 92 号汽油价格按比例推算其余油品
    pub fn from_base(gas92: f64) -> Self {
        Self::from_array(GRADE_RATIOS.map(|ratio| gas92 * ratio))
    }

    pub fn from_array(values: [f64; 4]) -> Self {
        Self {
            gas92: values[0],
            gas95: values[1],
            gas98: values[2],
            diesel0: values[3],
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.gas92, self.gas95, self.gas98, self.diesel0]
    }

    /// 对每种油品分别套用 `f(价格, 档位比例)`
    pub fn map(self, mut f: impl FnMut(f64, f64) -> f64) -> Self {
        let values = self.to_array();
        let mut out = [0.0; 4];
        for (i, value) in values.iter().enumerate() {
            out[i] = f(*value, GRADE_RATIOS[i]);
        }
        Self::from_array(out)
    }

    /// 将每种油品限制在各自的合法区间内
    pub fn clamped(self) -> Self {
        self.map(|value, ratio| value.clamp(BASE_PRICE_MIN * ratio, BASE_PRICE_MAX * ratio))
    }

    pub fn rounded(self, places: i32) -> Self {
        self.map(|value, _| round_to(value, places))
    }

    /// 四种油品是否都落在合法区间内
    pub fn is_within_bounds(&self) -> bool {
        self.to_array()
            .iter()
            .zip(GRADE_RATIOS)
            .all(|(value, ratio)| {
                value.is_finite()
                    && *value >= BASE_PRICE_MIN * ratio - BOUND_EPSILON
                    && *value <= BASE_PRICE_MAX * ratio + BOUND_EPSILON
            })
    }

    /// 多个价格的算术平均，空输入返回 None
    pub fn mean<'a>(points: impl IntoIterator<Item = &'a PricePoint>) -> Option<Self> {
        let mut sum = [0.0; 4];
        let mut count = 0usize;
        for point in points {
            for (acc, value) in sum.iter_mut().zip(point.to_array()) {
                *acc += value;
            }
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(Self::from_array(sum.map(|v| v / count as f64)))
    }
}

/// 历史价格记录（全国均价）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 日期 YYYY-MM-DD
    pub date: String,
    pub gas92: f64,
    pub gas95: f64,
    pub gas98: f64,
    pub diesel0: f64,
    /// 92 号汽油相对前一日的变化
    pub change: f64,
}

/// 缓存信封：控制数据何时重新生成
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEnvelope {
    pub last_update: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    /// 数据是否来自第三方数据源
    pub prices_fetched: bool,
}

impl CacheEnvelope {
    /// `now` 超过有效期即视为过期
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }
}

/// 缓存状态（/status 接口）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    #[serde(flatten)]
    pub envelope: CacheEnvelope,
    /// 数据来源名称
    pub source: String,
}

/// 调价方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stable,
}

impl Direction {
    /// 中文走势描述
    pub fn trend(self) -> &'static str {
        match self {
            Direction::Up => "上涨",
            Direction::Down => "下跌",
            Direction::Stable => "持平",
        }
    }
}

/// 下次调价预测
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextAdjustment {
    pub date: String,
    pub direction: Direction,
    pub expected_change: f64,
    pub days_remaining: u32,
    pub trend: String,
}

/// 单个油品的展示数据
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OilPrice {
    pub name: String,
    pub price: f64,
    pub previous_price: f64,
    pub change: f64,
}

/// 首页当前油价
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceData {
    pub current_prices: Vec<OilPrice>,
    pub next_adjustment: NextAdjustment,
    /// 更新时间 YYYY-MM-DD HH:MM（北京时间）
    pub update_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    pub province_name: String,
}

/// 城市价格对比
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityPrice {
    pub name: String,
    pub province: String,
    pub gas92: f64,
    pub gas95: f64,
    pub gas98: f64,
    pub diesel0: f64,
    /// 92 号汽油与全国均价的差异
    pub diff: f64,
}

/// 省份价格对比
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvincePrice {
    pub name: String,
    pub gas92: f64,
    pub gas95: f64,
    pub gas98: f64,
    pub diesel0: f64,
    pub diff: f64,
}

/// 省份列表项（选择器使用，附带当前价格）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceItem {
    pub name: String,
    pub region: Region,
    pub level: u8,
    pub gas92: f64,
    pub gas95: f64,
    pub gas98: f64,
    pub diesel0: f64,
}

/// 省钱小贴士
#[derive(Debug, Clone, Serialize)]
pub struct Tip {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub tags: &'static [&'static str],
}

/// 历史价格查询参数
///
/// 小程序端传 `days`，也兼容 `count`。值以字符串接收，非法时使用默认值。
#[derive(Debug, Default)]
pub struct HistoryQuery {
    pub count: Option<String>,
    pub days: Option<String>,
}

impl HistoryQuery {
    /// 解析请求条数，缺省或非法时返回 `default`
    pub fn resolve(&self, default: usize) -> usize {
        let parse = |v: &Option<String>| v.as_deref().and_then(|v| v.trim().parse::<usize>().ok());
        parse(&self.count)
            .or_else(|| parse(&self.days))
            .unwrap_or(default)
    }
}
