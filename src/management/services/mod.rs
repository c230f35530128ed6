//! # 管理端服务层
//!
//! 外部用户桥接的业务逻辑，供 HTTP handler 复用。
//! 各服务借用 `AppState` 中的数据库连接和计费配置，生命周期与单次请求一致。

pub mod accounts;
pub mod capacity;
pub mod consumption;
pub mod identity;
pub mod ledger;
pub mod shared;
pub mod stats;
pub mod tokens;

pub use capacity::{BalanceCapacity, CapacityParams, ModelCapacity, estimate};
pub use consumption::{ConsumptionLogQuery, LogEntry, LogPage, LogQuery};
pub use identity::{ExternalIdentity, IdentityReconciler, ReconcileOutcome};
pub use ledger::{CreditOutcome, CreditRequest, QuotaLedger};
pub use stats::{AccountStats, AccountStatsService, ModelCatalog};
pub use tokens::{IssueTokenRequest, IssuedToken, RevokeTokenRequest, RevokedToken, TokenIssuer};

pub use shared::{PaginationInfo, PaginationParams, build_page};
