use async_trait::async_trait;
use parking_lot::Mutex;

use ab_domain::activity::Activity;
use ab_domain::plan::PlanSnapshotItem;
use ab_domain::Result;

use crate::client::TrackerClient;

/// One call captured by [`RecordingTrackerClient`], in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Activity(Activity),
    PlanUpdate {
        session_id: String,
        plan: Vec<PlanSnapshotItem>,
    },
}

/// In-memory [`TrackerClient`] double that records every call instead of
/// issuing network requests, so engine tests can assert exactly which
/// activities and plan updates were produced.
#[derive(Default)]
pub struct RecordingTrackerClient {
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingTrackerClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn activities(&self) -> Vec<Activity> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Activity(a) => Some(a.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn plan_updates(&self) -> Vec<Vec<PlanSnapshotItem>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RecordedCall::PlanUpdate { plan, .. } => Some(plan.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl TrackerClient for RecordingTrackerClient {
    async fn create_activity(&self, activity: Activity) -> Result<()> {
        self.calls.lock().push(RecordedCall::Activity(activity));
        Ok(())
    }

    async fn update_session_plan(&self, session_id: &str, plan: Vec<PlanSnapshotItem>) -> Result<()> {
        self.calls.lock().push(RecordedCall::PlanUpdate {
            session_id: session_id.to_string(),
            plan,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ab_domain::activity::ActivityContent;

    #[tokio::test]
    async fn records_calls_in_order() {
        let client = RecordingTrackerClient::new();
        client
            .create_activity(Activity::new(
                "s1",
                ActivityContent::Response { body: "hi".into() },
            ))
            .await
            .unwrap();
        client
            .update_session_plan("s1", vec![PlanSnapshotItem { content: "A".into(), status: "pending".into() }])
            .await
            .unwrap();

        assert_eq!(client.activities().len(), 1);
        assert_eq!(client.plan_updates().len(), 1);
        assert_eq!(client.calls().len(), 2);
    }
}
