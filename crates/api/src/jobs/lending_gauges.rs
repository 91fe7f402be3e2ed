//! Periodic gauges for the connection pool and outstanding grants.

use domain::models::ApprovalStatus;
use persistence::metrics::{record_outstanding_grants, record_pool_metrics};
use persistence::repositories::ApprovedItemRepository;
use sqlx::PgPool;

use super::scheduler::{Job, JobFrequency};

const GAUGE_FREQUENCY: JobFrequency = JobFrequency::Seconds(30);

/// Statuses published by the job, so a status that drops to zero rows is
/// reset instead of keeping its last value.
const OUTSTANDING: [ApprovalStatus; 2] = [ApprovalStatus::Pending, ApprovalStatus::Acknowledged];

/// Publishes pool saturation and how many grants are still out.
pub struct LendingGaugesJob {
    approvals: ApprovedItemRepository,
}

impl LendingGaugesJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            approvals: ApprovedItemRepository::new(pool),
        }
    }
}

/// Pairs every outstanding status with its count, defaulting to zero.
fn outstanding_counts(rows: &[(ApprovalStatus, i64)]) -> Vec<(ApprovalStatus, i64)> {
    OUTSTANDING
        .iter()
        .map(|status| {
            let count = rows
                .iter()
                .find(|(s, _)| s == status)
                .map_or(0, |(_, count)| *count);
            (*status, count)
        })
        .collect()
}

#[async_trait::async_trait]
impl Job for LendingGaugesJob {
    fn name(&self) -> &'static str {
        "lending_gauges"
    }

    fn frequency(&self) -> JobFrequency {
        GAUGE_FREQUENCY
    }

    async fn execute(&self) -> Result<(), String> {
        record_pool_metrics(self.approvals.pool());

        let rows: Vec<(ApprovalStatus, i64)> = self
            .approvals
            .outstanding_by_status()
            .await
            .map_err(|e| format!("Failed to count outstanding grants: {}", e))?
            .into_iter()
            .map(|row| (row.status.into(), row.count))
            .collect();

        for (status, count) in outstanding_counts(&rows) {
            record_outstanding_grants(&status.to_string(), count);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_statuses_read_as_zero() {
        let counts = outstanding_counts(&[(ApprovalStatus::Acknowledged, 4)]);
        assert_eq!(
            counts,
            vec![
                (ApprovalStatus::Pending, 0),
                (ApprovalStatus::Acknowledged, 4)
            ]
        );
    }

    #[test]
    fn test_returned_grants_are_not_published() {
        let counts = outstanding_counts(&[(ApprovalStatus::Returned, 9)]);
        assert!(counts.iter().all(|(status, count)| {
            *status != ApprovalStatus::Returned && *count == 0
        }));
    }
}
