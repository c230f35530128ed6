//! # 消费日志查询服务
//!
//! 按外部用户查询消费与充值记录，支持日期、用户名、模型过滤和分页，
//! 汇总数据覆盖全部过滤结果而不只是当前页。

use entity::{ConsumptionLogs, consumption_logs};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, sea_query::Expr,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::BillingConfig,
    error::{Context, Result},
    ldebug,
    logging::{LogComponent, LogStage},
    management::server::AppState,
    types::{TimezoneContext, timezone_utils},
};

use super::accounts::require_by_external_id;
use super::shared::{
    DateRangeFilter, PaginationInfo, PaginationParams, build_page, normalize_optional,
    resolve_date_range,
};

/// 默认每页条数
pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// 每页条数上限
pub const MAX_PAGE_SIZE: u64 = 100;

/// 日志查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub username: Option<String>,
    pub model_name: Option<String>,
    /// 是否包含错误日志
    #[serde(default)]
    pub include_errors: bool,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// 单条日志
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// 请求时区下的时间
    pub time: String,
    pub username: String,
    /// 输入与输出 token 之和
    pub tokens: i64,
    #[serde(rename = "type")]
    pub log_type: String,
    pub model: String,
    /// 花费（美元），充值记录为负数
    pub spend: f64,
}

/// 过滤结果汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LogSummary {
    pub total_tokens: i64,
    pub total_spend: f64,
}

/// 日志查询结果
#[derive(Debug, Clone, Serialize)]
pub struct LogPage {
    pub logs: Vec<LogEntry>,
    pub pagination: PaginationInfo,
    pub summary: LogSummary,
}

/// 日志类型的对外名称
#[must_use]
pub const fn log_type_name(log_type: i32) -> &'static str {
    match log_type {
        consumption_logs::LOG_TYPE_TOPUP => "topup",
        consumption_logs::LOG_TYPE_ERROR => "error",
        consumption_logs::LOG_TYPE_MANAGE => "manage",
        consumption_logs::LOG_TYPE_SYSTEM => "system",
        _ => "consume",
    }
}

/// 计算单条日志的花费，充值记录取负
#[must_use]
pub fn signed_spend(log_type: i32, quota: i64, quota_per_unit: i64) -> f64 {
    let spend = quota as f64 / quota_per_unit as f64;
    if log_type == consumption_logs::LOG_TYPE_TOPUP {
        -spend
    } else {
        spend
    }
}

/// 消费日志查询服务
pub struct ConsumptionLogQuery<'a> {
    db: &'a DatabaseConnection,
    billing: &'a BillingConfig,
}

impl<'a> ConsumptionLogQuery<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
            billing: &state.config.billing,
        }
    }

    /// 查询外部用户的日志
    pub async fn query(
        &self,
        request_id: &str,
        external_user_id: &str,
        query: &LogQuery,
        timezone: &TimezoneContext,
    ) -> Result<LogPage> {
        let account = require_by_external_id(self.db, external_user_id).await?;
        let range = resolve_date_range(
            query.start_date.as_deref(),
            query.end_date.as_deref(),
            &timezone.timezone,
        )?;
        let params = PaginationParams::new(query.page, query.page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);

        let total = self
            .filtered(account.id, query, range)
            .count(self.db)
            .await
            .context("统计日志数量失败")?;

        let rows = self
            .filtered(account.id, query, range)
            .order_by_desc(consumption_logs::Column::CreatedAt)
            .order_by_desc(consumption_logs::Column::Id)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await
            .context("查询日志失败")?;

        let summary = self.summarize(self.filtered(account.id, query, range)).await?;

        ldebug!(
            request_id,
            LogStage::Db,
            LogComponent::Consumption,
            "query_logs",
            "日志查询完成",
            account_id = account.id,
            total = total,
            page = params.page
        );

        Ok(LogPage {
            logs: rows
                .into_iter()
                .map(|row| self.to_entry(row, timezone))
                .collect(),
            pagination: build_page(total, params),
            summary,
        })
    }

    /// 最近的消费与充值记录
    pub async fn recent(
        &self,
        account_id: i32,
        limit: u64,
        timezone: &TimezoneContext,
    ) -> Result<Vec<LogEntry>> {
        let rows = self
            .filtered(account_id, &LogQuery::default(), DateRangeFilter::default())
            .order_by_desc(consumption_logs::Column::CreatedAt)
            .order_by_desc(consumption_logs::Column::Id)
            .limit(limit)
            .all(self.db)
            .await
            .context("查询最近日志失败")?;

        Ok(rows
            .into_iter()
            .map(|row| self.to_entry(row, timezone))
            .collect())
    }

    fn filtered(
        &self,
        account_id: i32,
        query: &LogQuery,
        range: DateRangeFilter,
    ) -> Select<ConsumptionLogs> {
        let mut types = vec![
            consumption_logs::LOG_TYPE_CONSUME,
            consumption_logs::LOG_TYPE_TOPUP,
        ];
        if query.include_errors {
            types.push(consumption_logs::LOG_TYPE_ERROR);
        }

        let mut select = ConsumptionLogs::find()
            .filter(consumption_logs::Column::AccountId.eq(account_id))
            .filter(consumption_logs::Column::LogType.is_in(types));

        if let Some(username) = normalize_optional(query.username.as_deref()) {
            select = select.filter(consumption_logs::Column::Username.eq(username));
        }
        if let Some(model_name) = normalize_optional(query.model_name.as_deref()) {
            // 区分大小写的字面子串匹配，不解释 LIKE 通配符
            select = select.filter(Expr::cust_with_values(
                "instr(\"consumption_logs\".\"model_name\", ?) > 0",
                [model_name],
            ));
        }
        if let Some(start) = range.start {
            select = select.filter(consumption_logs::Column::CreatedAt.gte(start));
        }
        if let Some(end) = range.end {
            select = select.filter(consumption_logs::Column::CreatedAt.lte(end));
        }

        select
    }

    /// 按日志类型聚合 token 与额度
    async fn summarize(&self, select: Select<ConsumptionLogs>) -> Result<LogSummary> {
        let rows: Vec<(i32, Option<i64>, Option<i64>, Option<i64>)> = select
            .select_only()
            .column(consumption_logs::Column::LogType)
            .column_as(
                Expr::col(consumption_logs::Column::PromptTokens).sum(),
                "prompt_tokens",
            )
            .column_as(
                Expr::col(consumption_logs::Column::CompletionTokens).sum(),
                "completion_tokens",
            )
            .column_as(Expr::col(consumption_logs::Column::Quota).sum(), "quota")
            .group_by(consumption_logs::Column::LogType)
            .into_tuple()
            .all(self.db)
            .await
            .context("汇总日志失败")?;

        Ok(rows.into_iter().fold(
            LogSummary::default(),
            |mut summary, (log_type, prompt, completion, quota)| {
                summary.total_tokens += prompt.unwrap_or(0) + completion.unwrap_or(0);
                summary.total_spend +=
                    signed_spend(log_type, quota.unwrap_or(0), self.billing.quota_per_unit);
                summary
            },
        ))
    }

    fn to_entry(&self, row: consumption_logs::Model, timezone: &TimezoneContext) -> LogEntry {
        LogEntry {
            time: timezone_utils::format_unix_for_response(row.created_at, &timezone.timezone),
            username: row.username,
            tokens: i64::from(row.prompt_tokens) + i64::from(row.completion_tokens),
            log_type: log_type_name(row.log_type).to_string(),
            model: row.model_name,
            spend: signed_spend(row.log_type, row.quota, self.billing.quota_per_unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{AccountFixture, LogFixture, create_test_db, test_state};
    use chrono_tz::Tz;
    use pretty_assertions::assert_eq;

    const DAY: i64 = 86_400;
    /// 2024-01-01 00:00:00 UTC
    const JAN_1: i64 = 1_704_067_200;

    fn utc() -> TimezoneContext {
        TimezoneContext::default()
    }

    #[tokio::test]
    async fn test_pagination_and_order() {
        let db = create_test_db().await;
        let account = AccountFixture::new("ext-1", "alice").insert(&db).await;
        for i in 0..45 {
            LogFixture::consume(JAN_1 + i, "gpt-4", 500)
                .insert(&db, &account)
                .await;
        }
        let state = test_state(db);
        let service = ConsumptionLogQuery::new(&state);

        let first = service
            .query("t", "ext-1", &LogQuery::default(), &utc())
            .await
            .unwrap();
        assert_eq!(first.pagination.total, 45);
        assert_eq!(first.pagination.total_page, 3);
        assert_eq!(first.pagination.page_size, 20);
        assert_eq!(first.logs.len(), 20);
        assert_eq!(first.logs[0].time, "2024-01-01 00:00:44");

        let last = service
            .query(
                "t",
                "ext-1",
                &LogQuery {
                    page: Some(3),
                    ..LogQuery::default()
                },
                &utc(),
            )
            .await
            .unwrap();
        assert_eq!(last.logs.len(), 5);
        assert_eq!(last.logs[4].time, "2024-01-01 00:00:00");

        // 汇总覆盖全部结果
        assert_eq!(last.summary.total_tokens, 45 * 150);
        assert!((last.summary.total_spend - 45.0 * 0.001).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_filters_and_topup_sign() {
        let db = create_test_db().await;
        let account = AccountFixture::new("ext-1", "alice").insert(&db).await;
        LogFixture::consume(JAN_1, "gpt-4o-mini", 1_000)
            .insert(&db, &account)
            .await;
        LogFixture::consume(JAN_1 + DAY, "deepseek-chat", 2_000)
            .insert(&db, &account)
            .await;
        LogFixture::topup(JAN_1 + 2 * DAY, 500_000)
            .insert(&db, &account)
            .await;
        let mut error = LogFixture::consume(JAN_1 + 2 * DAY, "gpt-4o", 0);
        error.log_type = consumption_logs::LOG_TYPE_ERROR;
        error.insert(&db, &account).await;
        let state = test_state(db);
        let service = ConsumptionLogQuery::new(&state);

        let all = service
            .query("t", "ext-1", &LogQuery::default(), &utc())
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 3);
        assert_eq!(all.logs[0].log_type, "topup");
        assert!((all.logs[0].spend + 1.0).abs() < 1e-12);

        let with_errors = service
            .query(
                "t",
                "ext-1",
                &LogQuery {
                    include_errors: true,
                    ..LogQuery::default()
                },
                &utc(),
            )
            .await
            .unwrap();
        assert_eq!(with_errors.pagination.total, 4);

        let by_model = service
            .query(
                "t",
                "ext-1",
                &LogQuery {
                    model_name: Some("gpt-4".to_string()),
                    include_errors: true,
                    ..LogQuery::default()
                },
                &utc(),
            )
            .await
            .unwrap();
        let models: Vec<_> = by_model.logs.iter().map(|l| l.model.as_str()).collect();
        assert_eq!(models, vec!["gpt-4o", "gpt-4o-mini"]);

        for (pattern, expected) in [("gpt_4", 0), ("%", 0), ("GPT", 0), ("-chat", 1), ("4o-", 1)] {
            let page = service
                .query(
                    "t",
                    "ext-1",
                    &LogQuery {
                        model_name: Some(pattern.to_string()),
                        include_errors: true,
                        ..LogQuery::default()
                    },
                    &utc(),
                )
                .await
                .unwrap();
            assert_eq!(page.pagination.total, expected, "model_name={pattern}");
        }

        let by_date = service
            .query(
                "t",
                "ext-1",
                &LogQuery {
                    start_date: Some("2024-01-02".to_string()),
                    end_date: Some("2024-01-02".to_string()),
                    ..LogQuery::default()
                },
                &utc(),
            )
            .await
            .unwrap();
        assert_eq!(by_date.logs.len(), 1);
        assert_eq!(by_date.logs[0].model, "deepseek-chat");

        let by_username = service
            .query(
                "t",
                "ext-1",
                &LogQuery {
                    username: Some("someone-else".to_string()),
                    ..LogQuery::default()
                },
                &utc(),
            )
            .await
            .unwrap();
        assert_eq!(by_username.pagination.total, 0);
        assert_eq!(by_username.pagination.total_page, 0);
    }

    #[tokio::test]
    async fn test_timezone_shifts_day_bounds() {
        let db = create_test_db().await;
        let account = AccountFixture::new("ext-1", "alice").insert(&db).await;
        // 2024-01-01 20:00 UTC = 2024-01-02 04:00 上海
        LogFixture::consume(JAN_1 + 20 * 3600, "gpt-4", 100)
            .insert(&db, &account)
            .await;
        let state = test_state(db);
        let query = LogQuery {
            start_date: Some("2024-01-02".to_string()),
            ..LogQuery::default()
        };
        let service = ConsumptionLogQuery::new(&state);

        let utc_page = service.query("t", "ext-1", &query, &utc()).await.unwrap();
        assert_eq!(utc_page.pagination.total, 0);

        let shanghai = TimezoneContext {
            timezone: Tz::Asia__Shanghai,
        };
        let local_page = service.query("t", "ext-1", &query, &shanghai).await.unwrap();
        assert_eq!(local_page.pagination.total, 1);
        assert_eq!(local_page.logs[0].time, "2024-01-02 04:00:00");
    }

    #[tokio::test]
    async fn test_malformed_date_and_missing_account() {
        let db = create_test_db().await;
        AccountFixture::new("ext-1", "alice").insert(&db).await;
        let state = test_state(db);
        let service = ConsumptionLogQuery::new(&state);

        let err = service
            .query(
                "t",
                "ext-1",
                &LogQuery {
                    end_date: Some("2024-02-30".to_string()),
                    ..LogQuery::default()
                },
                &utc(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("end_date"));

        let err = service
            .query("t", "ext-9", &LogQuery::default(), &utc())
            .await
            .unwrap_err();
        assert_eq!(err.to_http_response_parts().1, "RESOURCE_NOT_FOUND");
    }

    #[test]
    fn test_signed_spend() {
        assert!((signed_spend(consumption_logs::LOG_TYPE_CONSUME, 250_000, 500_000) - 0.5).abs() < 1e-12);
        assert!((signed_spend(consumption_logs::LOG_TYPE_TOPUP, 250_000, 500_000) + 0.5).abs() < 1e-12);
        assert_eq!(log_type_name(consumption_logs::LOG_TYPE_ERROR), "error");
        assert_eq!(log_type_name(consumption_logs::LOG_TYPE_CONSUME), "consume");
    }
}
