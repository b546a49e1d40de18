//! 城市与省份参考数据

use crate::models::{City, Province, Region};

/// 支持查询的城市
pub const CITIES: &[City] = &[
    City { name: "北京", province: "北京市" },
    City { name: "上海", province: "上海市" },
    City { name: "广州", province: "广东省" },
    City { name: "深圳", province: "广东省" },
    City { name: "杭州", province: "浙江省" },
    City { name: "南京", province: "江苏省" },
    City { name: "苏州", province: "江苏省" },
    City { name: "成都", province: "四川省" },
    City { name: "重庆", province: "重庆市" },
    City { name: "天津", province: "天津市" },
    City { name: "武汉", province: "湖北省" },
    City { name: "长沙", province: "湖南省" },
    City { name: "郑州", province: "河南省" },
    City { name: "西安", province: "陕西省" },
    City { name: "青岛", province: "山东省" },
    City { name: "沈阳", province: "辽宁省" },
    City { name: "哈尔滨", province: "黑龙江省" },
    City { name: "昆明", province: "云南省" },
];

/// 省级行政区（不含港澳台）
pub const PROVINCES: &[Province] = &[
    Province { name: "北京市", region: Region::NorthChina, level: 1 },
    Province { name: "天津市", region: Region::NorthChina, level: 2 },
    Province { name: "河北省", region: Region::NorthChina, level: 2 },
    Province { name: "山西省", region: Region::NorthChina, level: 3 },
    Province { name: "内蒙古自治区", region: Region::NorthChina, level: 3 },
    Province { name: "辽宁省", region: Region::Northeast, level: 2 },
    Province { name: "吉林省", region: Region::Northeast, level: 3 },
    Province { name: "黑龙江省", region: Region::Northeast, level: 3 },
    Province { name: "上海市", region: Region::EastChina, level: 1 },
    Province { name: "江苏省", region: Region::EastChina, level: 1 },
    Province { name: "浙江省", region: Region::EastChina, level: 1 },
    Province { name: "安徽省", region: Region::EastChina, level: 2 },
    Province { name: "福建省", region: Region::EastChina, level: 2 },
    Province { name: "江西省", region: Region::EastChina, level: 3 },
    Province { name: "山东省", region: Region::EastChina, level: 2 },
    Province { name: "河南省", region: Region::CentralChina, level: 2 },
    Province { name: "湖北省", region: Region::CentralChina, level: 2 },
    Province { name: "湖南省", region: Region::CentralChina, level: 2 },
    Province { name: "广东省", region: Region::SouthChina, level: 1 },
    Province { name: "广西壮族自治区", region: Region::SouthChina, level: 3 },
    Province { name: "海南省", region: Region::SouthChina, level: 2 },
    Province { name: "重庆市", region: Region::Southwest, level: 2 },
    Province { name: "四川省", region: Region::Southwest, level: 2 },
    Province { name: "贵州省", region: Region::Southwest, level: 3 },
    Province { name: "云南省", region: Region::Southwest, level: 3 },
    Province { name: "西藏自治区", region: Region::Southwest, level: 3 },
    Province { name: "陕西省", region: Region::Northwest, level: 2 },
    Province { name: "甘肃省", region: Region::Northwest, level: 3 },
    Province { name: "青海省", region: Region::Northwest, level: 3 },
    Province { name: "宁夏回族自治区", region: Region::Northwest, level: 3 },
    Province { name: "新疆维吾尔自治区", region: Region::Northwest, level: 3 },
];

/// 按名称查找城市，兼容带“市”后缀的写法（如 “北京市”）
pub fn find_city(name: &str) -> Option<&'static City> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let short = name.strip_suffix('市').unwrap_or(name);
    CITIES.iter().find(|c| c.name == name || c.name == short)
}

/// 按名称查找省份
///
/// 先精确匹配全称，再按前缀匹配简称（“上海” → “上海市”，“内蒙古” → “内蒙古自治区”）
pub fn find_province(name: &str) -> Option<&'static Province> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    PROVINCES
        .iter()
        .find(|p| p.name == name)
        .or_else(|| PROVINCES.iter().find(|p| p.name.starts_with(name)))
}

/// 从第三方数据源的地区名称（如 “上海”、“内蒙古”、“黑龙江省”）匹配省份
pub fn match_province_label(label: &str) -> Option<&'static Province> {
    let label = label.trim();
    if label.chars().count() < 2 {
        return None;
    }
    find_province(label).or_else(|| {
        PROVINCES
            .iter()
            .find(|p| label.starts_with(p.name.trim_end_matches(['省', '市'])))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_city_has_a_province() {
        for city in CITIES {
            assert!(
                find_province(city.province).is_some(),
                "{} 的省份 {} 不在省份列表中",
                city.name,
                city.province
            );
        }
    }

    #[test]
    fn test_province_levels() {
        assert_eq!(PROVINCES.len(), 31);
        assert!(PROVINCES.iter().all(|p| (1..=3).contains(&p.level)));
    }

    #[test]
    fn test_find_city() {
        assert_eq!(find_city("上海").map(|c| c.province), Some("上海市"));
        assert_eq!(find_city("上海市").map(|c| c.name), Some("上海"));
        assert!(find_city("拉萨").is_none());
        assert!(find_city("").is_none());
    }

    #[test]
    fn test_find_province() {
        assert_eq!(find_province("广东省").map(|p| p.name), Some("广东省"));
        assert_eq!(find_province("内蒙古").map(|p| p.name), Some("内蒙古自治区"));
        assert_eq!(find_province(" 上海 ").map(|p| p.name), Some("上海市"));
        assert!(find_province("火星").is_none());
    }

    #[test]
    fn test_match_province_label() {
        assert_eq!(match_province_label("黑龙江").map(|p| p.name), Some("黑龙江省"));
        assert_eq!(match_province_label("新疆").map(|p| p.name), Some("新疆维吾尔自治区"));
        assert_eq!(match_province_label("北京").map(|p| p.name), Some("北京市"));
        assert!(match_province_label("京").is_none());
    }
}
