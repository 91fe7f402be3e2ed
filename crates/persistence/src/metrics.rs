//! Database and lending metrics.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record database query duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Record database connection pool metrics.
///
/// Called periodically by the lending gauges job.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Publish how many grants are outstanding in `status`.
pub fn record_outstanding_grants(status: &str, count: i64) {
    gauge!("lending_outstanding_grants", "status" => status.to_string()).set(count as f64);
}

/// Count a committed lending transition (`approve`, `acknowledge`, ...).
pub fn record_lending_transition(transition: &'static str) {
    counter!("lending_transitions_total", "transition" => transition).increment(1);
}

/// Count a lending transition the engines refused, by error code.
pub fn record_lending_refusal(transition: &'static str, code: &'static str) {
    counter!(
        "lending_refusals_total",
        "transition" => transition,
        "code" => code
    )
    .increment(1);
}

/// Times a database operation and records it under a query name.
///
/// ```ignore
/// let timer = QueryTimer::new("find_item_group_by_id");
/// let result = sqlx::query_as::<_, ItemGroupEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}
