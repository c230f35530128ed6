//! # Entity 模块
//!
//! 包含所有 Sea-ORM 实体定义

pub mod access_tokens;
pub mod accounts;
pub mod channels;
pub mod consumption_logs;
pub mod model_ratios;
pub mod payment_keys;
pub mod top_ups;

pub use access_tokens::Entity as AccessTokens;
pub use accounts::Entity as Accounts;
pub use channels::Entity as Channels;
pub use consumption_logs::Entity as ConsumptionLogs;
pub use model_ratios::Entity as ModelRatios;
pub use payment_keys::Entity as PaymentKeys;
pub use top_ups::Entity as TopUps;

#[cfg(test)]
mod tests;
