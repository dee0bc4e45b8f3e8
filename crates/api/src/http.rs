use std::time::Duration;

use async_trait::async_trait;
use env::Env;
use eyre::{eyre, Context as _, Result};
use log::{debug, warn};
use model::{
    attendance::AttendanceRecord,
    filter::FilterCriteria,
    session::Session,
    slot::{BlankSlot, LessonSlot, NewSlot, Teacher},
};
use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use time::range::DateRange;
use url::Url;

use crate::{
    query::{range_query, slots_query, Query},
    SchoolApi,
};

/// REST adapter for the school backend.
#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base: Url,
}

impl HttpApi {
    pub fn new(env: &Env) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = env.request_timeout_secs() {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to build http client")?;
        Self::with_client(client, env.api_url())
    }

    pub fn with_client(client: reqwest::Client, base: &str) -> Result<Self> {
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };
        let base = Url::parse(&base).with_context(|| format!("Invalid api url: {}", base))?;
        Ok(HttpApi { client, base })
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("Invalid api path: {}", path))
    }

    fn request(&self, session: &Session, method: Method, path: &str) -> Result<RequestBuilder> {
        debug!("{} {}", method, path);
        Ok(self
            .client
            .request(method, self.url(path)?)
            .bearer_auth(session.token()))
    }

    async fn get<T: DeserializeOwned>(&self, session: &Session, path: &str, query: &Query) -> Result<T> {
        let response = self
            .request(session, Method::GET, path)?
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {}", path))?;
        let response = check(Method::GET, path, response).await?;
        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to decode response of GET {}", path))
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        session: &Session,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Response> {
        let response = self
            .request(session, method.clone(), path)?
            .json(body)
            .send()
            .await
            .with_context(|| format!("{} {}", method, path))?;
        check(method, path, response).await
    }
}

async fn check(method: Method, path: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!("{} {} failed with {}: {}", method, path, status, body);
    Err(eyre!("{} {} failed with {}: {}", method, path, status, body))
}

#[async_trait]
impl SchoolApi for HttpApi {
    async fn list_slots(
        &self,
        session: &Session,
        range: DateRange,
        filter: &FilterCriteria,
    ) -> Result<Vec<LessonSlot>> {
        self.get(session, "slots", &slots_query(range, filter)).await
    }

    async fn get_slot(&self, session: &Session, id: &str) -> Result<LessonSlot> {
        self.get(session, &format!("slots/{}", id), &Query::new()).await
    }

    async fn list_blank_slots(
        &self,
        session: &Session,
        range: DateRange,
    ) -> Result<Vec<BlankSlot>> {
        self.get(session, "slots/blank", &range_query(range)).await
    }

    async fn cancel_slot(&self, session: &Session, id: &str, reason: &str) -> Result<()> {
        let body = json!({ "reason": reason });
        self.send(session, Method::PUT, &format!("slots/{}/cancel", id), &body)
            .await?;
        Ok(())
    }

    async fn create_replacement_slot(
        &self,
        session: &Session,
        slot: &NewSlot,
    ) -> Result<LessonSlot> {
        let response = self.send(session, Method::POST, "slots", slot).await?;
        response
            .json::<LessonSlot>()
            .await
            .context("Failed to decode created slot")
    }

    async fn get_attendance_status(
        &self,
        session: &Session,
        slot_id: &str,
    ) -> Result<Vec<AttendanceRecord>> {
        self.get(session, &format!("slots/{}/attendance", slot_id), &Query::new())
            .await
    }

    async fn update_attendance(
        &self,
        session: &Session,
        slot_id: &str,
        records: &[AttendanceRecord],
    ) -> Result<()> {
        self.send(
            session,
            Method::PUT,
            &format!("slots/{}/attendance", slot_id),
            records,
        )
        .await?;
        Ok(())
    }

    async fn list_available_teachers(
        &self,
        session: &Session,
        slot_id: &str,
    ) -> Result<Vec<Teacher>> {
        self.get(
            session,
            &format!("slots/{}/available-teachers", slot_id),
            &Query::new(),
        )
        .await
    }

    async fn reassign_teacher(
        &self,
        session: &Session,
        slot_id: &str,
        teacher_id: &str,
        reason: &str,
    ) -> Result<()> {
        let body = json!({ "teacherId": teacher_id, "reason": reason });
        self.send(session, Method::PUT, &format!("slots/{}/teacher", slot_id), &body)
            .await?;
        Ok(())
    }

    async fn get_cancel_reason_options(&self, session: &Session) -> Result<Vec<String>> {
        self.get(session, "slots/cancel-reasons", &Query::new()).await
    }
}
