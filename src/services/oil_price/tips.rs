//! 加油省钱小贴士（静态数据）

use crate::models::Tip;

pub const TIPS: &[Tip] = &[
    Tip {
        icon: "⏰",
        title: "调价前加油",
        description: "在调价日当天10点之前加油，可以避免涨价带来的损失。通常油价调整会在工作日的24:00生效，提前安排好加油时间。",
        tags: &["必看", "省钱", "时效"],
    },
    Tip {
        icon: "📍",
        title: "对比加油站价格",
        description: "不同加油站的价格可能相差0.2-0.5元/升。建议使用加油APP对比附近加油站价格，选择最优惠的站点。",
        tags: &["对比", "实时", "省心"],
    },
    Tip {
        icon: "💳",
        title: "使用加油优惠卡",
        description: "办理加油站的会员卡或使用支付宝、微信的加油优惠券，通常可以享受每升0.1-0.3元的优惠。",
        tags: &["会员", "优惠", "积分"],
    },
    Tip {
        icon: "🌙",
        title: "避开早晚高峰加油",
        description: "早晚高峰期加油站排队时间长，部分站点会临时调价。建议在上午10点-下午4点之间加油，避开高峰。",
        tags: &["省时", "优惠", "从容"],
    },
    Tip {
        icon: "🔄",
        title: "混合加油策略",
        description: "根据调价方向决定加油时机。预计上涨时提前加满，预计下跌时等调价后再加，合理规划每次加油量。",
        tags: &["策略", "规划", "智能"],
    },
    Tip {
        icon: "🚗",
        title: "关注油价走势",
        description: "定期查看油价走势图，了解近期价格变化趋势。连续上涨时建议提前加满，连续下跌时可按需少量添加。",
        tags: &["趋势", "数据", "参考"],
    },
    Tip {
        icon: "🎯",
        title: "关注促销活动",
        description: "节假日或加油站周年庆时，经常会有促销活动。提前了解周边加油站的活动信息，抓住优惠时机。",
        tags: &["活动", "促销", "限时"],
    },
    Tip {
        icon: "📱",
        title: "使用智能提醒",
        description: "开启调价提醒功能，在调价前收到通知，及时安排加油计划。避免错过最佳加油时机。",
        tags: &["提醒", "便捷", "及时"],
    },
];
