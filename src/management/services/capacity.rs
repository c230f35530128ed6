//! # 余额容量估算
//!
//! 根据账户余额、已启用渠道提供的模型和模型倍率，估算余额可以支撑的每模型
//! 1K 输入 token 批次数。纯计算，不访问存储。

use indexmap::IndexSet;
use serde::Serialize;

use crate::channels::ChannelInfo;
use crate::pricing::{ModelPricing, PricingLookup};

/// 渠道查询失败错误码
pub const CHANNEL_QUERY_FAILED: &str = "CHANNEL_QUERY_FAILED";
/// 倍率查询失败错误码
pub const PRICING_QUERY_FAILED: &str = "PRICING_QUERY_FAILED";

/// 估算参数
#[derive(Debug, Clone, Copy)]
pub struct CapacityParams {
    pub group_ratio: f64,
    pub quota_per_unit: i64,
    /// 最多返回的模型数
    pub limit: usize,
}

/// 单个模型的可用容量
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelCapacity {
    pub model: String,
    /// 余额可支撑的 1K 输入 token 批次数
    pub input_tokens_1k: i64,
    pub model_ratio: f64,
    pub completion_ratio: f64,
    pub group_ratio: f64,
    pub base_price_usd: f64,
    pub quota_per_1k_input: i64,
    pub pricing_note: String,
    /// 是否为渠道测试模型
    pub is_default_model: bool,
}

/// 容量汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacitySummary {
    pub total_balance_usd: f64,
    pub total_quota: i64,
    pub quota_per_usd: i64,
    pub billing_formula: String,
    pub models_available: usize,
    pub note: String,
}

/// 容量估算失败信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityError {
    pub message: String,
    pub error_code: String,
}

/// 余额容量估算结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BalanceCapacity {
    pub models: Vec<ModelCapacity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CapacitySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CapacityError>,
}

impl BalanceCapacity {
    /// 依赖的渠道或倍率数据不可用时的结果
    #[must_use]
    pub fn unavailable(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            models: Vec::new(),
            summary: None,
            error: Some(CapacityError {
                message: message.into(),
                error_code: error_code.to_string(),
            }),
        }
    }
}

/// 按渠道顺序收集候选模型，测试模型优先
#[must_use]
pub fn candidate_models(channels: &[ChannelInfo]) -> (Vec<String>, IndexSet<String>) {
    let mut defaults = IndexSet::new();
    let mut others = IndexSet::new();

    for channel in channels {
        if let Some(test_model) = channel.test_model.as_deref().map(str::trim) {
            if !test_model.is_empty() {
                defaults.insert(test_model.to_string());
            }
        }
        for model in &channel.models {
            others.insert(model.clone());
        }
    }

    let ordered = defaults
        .iter()
        .cloned()
        .chain(others.into_iter().filter(|model| !defaults.contains(model)))
        .collect();
    (ordered, defaults)
}

/// 估算余额可支撑的各模型调用量
///
/// 余额不为正时直接返回空结果，不查询渠道和倍率
#[must_use]
pub fn estimate(
    balance: i64,
    channels: &[ChannelInfo],
    pricing: &dyn PricingLookup,
    params: CapacityParams,
) -> BalanceCapacity {
    if balance <= 0 {
        return BalanceCapacity::default();
    }

    let (ordered, defaults) = candidate_models(channels);
    let mut models = Vec::new();

    for model in ordered {
        if models.len() >= params.limit {
            break;
        }
        let Some(ratio) = pricing.lookup(&model) else {
            continue;
        };
        let Some(entry) = model_capacity(balance, &model, ratio, params, defaults.contains(&model))
        else {
            continue;
        };
        models.push(entry);
    }

    let summary = CapacitySummary {
        total_balance_usd: balance as f64 / params.quota_per_unit as f64,
        total_quota: balance,
        quota_per_usd: params.quota_per_unit,
        billing_formula: "quota = group_ratio * model_ratio * (prompt_tokens + completion_tokens * completion_ratio)".to_string(),
        models_available: models.len(),
        note: "容量按纯输入 token 估算，输出 token 按补全倍率额外计费".to_string(),
    };

    BalanceCapacity {
        models,
        summary: Some(summary),
        error: None,
    }
}

fn model_capacity(
    balance: i64,
    model: &str,
    ratio: ModelPricing,
    params: CapacityParams,
    is_default_model: bool,
) -> Option<ModelCapacity> {
    let quota_per_1k = ratio.quota_per_1k_input(params.group_ratio);
    if quota_per_1k <= 0 {
        return None;
    }
    let capacity = balance / quota_per_1k;
    if capacity <= 0 {
        return None;
    }

    Some(ModelCapacity {
        model: model.to_string(),
        input_tokens_1k: capacity,
        model_ratio: ratio.model_ratio,
        completion_ratio: ratio.completion_ratio,
        group_ratio: params.group_ratio,
        base_price_usd: ratio.base_price_usd(),
        quota_per_1k_input: quota_per_1k,
        pricing_note: format!(
            "输入：{quota_per_1k} quota/1K tokens，输出：{} quota/1K tokens",
            ratio.quota_per_1k_output(params.group_ratio)
        ),
        is_default_model,
    })
}
