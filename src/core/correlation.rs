use std::future::Future;
use uuid::Uuid;

pub const CORRELATION_ID_HEADER: &str = "X-CorrelationId";

tokio::task_local! {
    static CURRENT_CORRELATION_ID: String;
}

/// Correlation id carried by the current task, if any.
pub struct CorrelationId;

impl CorrelationId {
    /// 在指定 correlation id 下執行 future，期間所有對外請求都帶同一個 id
    pub async fn scope<F>(id: impl Into<String>, future: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_CORRELATION_ID.scope(id.into(), future).await
    }

    pub fn current() -> Option<String> {
        CURRENT_CORRELATION_ID.try_with(|id| id.clone()).ok()
    }

    pub fn current_or_new() -> String {
        Self::current().unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}
