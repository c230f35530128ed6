//! # 模型倍率定价
//!
//! 倍率计费模型：每 1K 输入 token 消耗 `group_ratio * model_ratio * 1000` 额度，
//! 输出 token 在此基础上再乘以 `completion_ratio`。
//! 模型倍率为 1 时对应每 1K 输入 token 0.002 美元。

use crate::error::{BridgeError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::ldebug;
use entity::ModelRatios;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::collections::HashMap;

/// 模型倍率为 1 时每 1K 输入 token 的美元价格
pub const BASE_PRICE_PER_1K_USD: f64 = 0.002;

/// 单个模型的倍率
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// 模型倍率
    pub model_ratio: f64,
    /// 补全倍率
    pub completion_ratio: f64,
}

impl ModelPricing {
    /// 构造模型倍率
    #[must_use]
    pub const fn new(model_ratio: f64, completion_ratio: f64) -> Self {
        Self {
            model_ratio,
            completion_ratio,
        }
    }

    /// 每 1K 输入 token 消耗的额度，四舍五入到整数
    ///
    /// 非有限值或非正值返回 0
    #[must_use]
    pub fn quota_per_1k_input(&self, group_ratio: f64) -> i64 {
        round_half_up(group_ratio * self.model_ratio * 1000.0)
    }

    /// 每 1K 输出 token 消耗的额度，输入额度乘补全倍率后截断
    #[must_use]
    pub fn quota_per_1k_output(&self, group_ratio: f64) -> i64 {
        let quota = self.quota_per_1k_input(group_ratio) as f64 * self.completion_ratio;
        if quota.is_finite() && quota > 0.0 {
            quota.trunc() as i64
        } else {
            0
        }
    }

    /// 每 1K 输入 token 的美元价格
    #[must_use]
    pub fn base_price_usd(&self) -> f64 {
        self.model_ratio * BASE_PRICE_PER_1K_USD
    }
}

fn round_half_up(value: f64) -> i64 {
    if value.is_finite() && value > 0.0 {
        (value + 0.5).floor() as i64
    } else {
        0
    }
}

/// 模型倍率查询接口
///
/// 只读查询，未知模型返回 None
pub trait PricingLookup: Send + Sync {
    /// 查询模型倍率
    fn lookup(&self, model: &str) -> Option<ModelPricing>;
}

/// 倍率表快照
#[derive(Debug, Clone, Default)]
pub struct RatioTable {
    entries: HashMap<String, ModelPricing>,
}

impl RatioTable {
    /// 创建空表
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个模型倍率
    #[must_use]
    pub fn with(mut self, model: &str, model_ratio: f64, completion_ratio: f64) -> Self {
        self.entries.insert(
            model.to_string(),
            ModelPricing::new(model_ratio, completion_ratio),
        );
        self
    }

    /// 从 `model_ratios` 表加载
    pub async fn load(db: &DatabaseConnection) -> Result<Self> {
        let rows = ModelRatios::find().all(db).await.map_err(|err| {
            BridgeError::configuration_with_source("模型倍率表读取失败", err)
        })?;

        let entries: HashMap<String, ModelPricing> = rows
            .into_iter()
            .map(|row| {
                (
                    row.model_name,
                    ModelPricing::new(row.model_ratio, row.completion_ratio),
                )
            })
            .collect();

        ldebug!(
            "system",
            LogStage::Db,
            LogComponent::Pricing,
            "load_ratio_table",
            &format!("加载模型倍率 {} 条", entries.len())
        );

        Ok(Self { entries })
    }

    /// 模型数量
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PricingLookup for RatioTable {
    fn lookup(&self, model: &str) -> Option<ModelPricing> {
        self.entries.get(model).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_test_db, insert_ratios};

    #[test]
    fn test_quota_per_1k_rounding() {
        assert_eq!(ModelPricing::new(0.5, 1.0).quota_per_1k_input(1.0), 500);
        assert_eq!(ModelPricing::new(15.0, 2.0).quota_per_1k_input(1.0), 15_000);
        // 0.0625 * 1000 = 62.5，五入
        assert_eq!(ModelPricing::new(0.0625, 4.0).quota_per_1k_input(1.0), 63);
        assert_eq!(ModelPricing::new(0.0004, 1.0).quota_per_1k_input(1.0), 0);
        assert_eq!(ModelPricing::new(-1.0, 1.0).quota_per_1k_input(1.0), 0);
        assert_eq!(ModelPricing::new(f64::NAN, 1.0).quota_per_1k_input(1.0), 0);
    }

    #[test]
    fn test_output_quota_and_price() {
        let pricing = ModelPricing::new(0.25, 3.0);
        assert_eq!(pricing.quota_per_1k_input(1.0), 250);
        assert_eq!(pricing.quota_per_1k_output(1.0), 750);
        // 63 * 1.5 = 94.5，截断
        assert_eq!(ModelPricing::new(0.0625, 1.5).quota_per_1k_output(1.0), 94);
        assert!((pricing.base_price_usd() - 0.0005).abs() < 1e-12);
        assert_eq!(pricing.quota_per_1k_input(2.0), 500);
    }

    #[test]
    fn test_ratio_table_lookup() {
        let table = RatioTable::new().with("gpt-4", 15.0, 2.0);
        assert_eq!(table.lookup("gpt-4"), Some(ModelPricing::new(15.0, 2.0)));
        assert_eq!(table.lookup("gpt-5"), None);
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_load_from_database() {
        let db = create_test_db().await;
        assert!(RatioTable::load(&db).await.unwrap().is_empty());

        insert_ratios(&db, &[("deepseek-chat", 0.135, 4.0), ("gpt-4", 15.0, 2.0)]).await;
        let table = RatioTable::load(&db).await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.lookup("deepseek-chat"),
            Some(ModelPricing::new(0.135, 4.0))
        );
    }
}
