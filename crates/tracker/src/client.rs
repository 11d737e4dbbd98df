use async_trait::async_trait;
use serde::Serialize;

use ab_domain::activity::Activity;
use ab_domain::plan::PlanSnapshotItem;
use ab_domain::{Error, Result};

/// The two writes the engine ever issues against the tracker. Both are
/// rate-limited and failure-tolerant at the call site (see
/// `ab_engine::projector`); this trait only describes the wire shape.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    async fn create_activity(&self, activity: Activity) -> Result<()>;
    async fn update_session_plan(&self, session_id: &str, plan: Vec<PlanSnapshotItem>) -> Result<()>;
}

#[derive(Serialize)]
struct UpdatePlanBody {
    plan: Vec<PlanSnapshotItem>,
}

fn activities_url(base_url: &str) -> String {
    format!("{}/activities", base_url.trim_end_matches('/'))
}

fn plan_url(base_url: &str, session_id: &str) -> String {
    format!("{}/sessions/{session_id}/plan", base_url.trim_end_matches('/'))
}

/// `reqwest`-backed implementation, bearer-auth'd, JSON bodies.
pub struct ReqwestTrackerClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ReqwestTrackerClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: std::time::Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token,
        })
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl TrackerClient for ReqwestTrackerClient {
    async fn create_activity(&self, activity: Activity) -> Result<()> {
        let url = activities_url(&self.base_url);
        let response = self
            .authed(self.http.post(&url).json(&activity))
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "createActivity: HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn update_session_plan(&self, session_id: &str, plan: Vec<PlanSnapshotItem>) -> Result<()> {
        let url = plan_url(&self.base_url, session_id);
        let response = self
            .authed(self.http.post(&url).json(&UpdatePlanBody { plan }))
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "updateSessionPlan: HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}
