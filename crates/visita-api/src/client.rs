// Hand-crafted async HTTP client for the Visita marketplace scheduling API.
//
// Base path: /api/v1/
// Auth: Authorization: Bearer <token> (injected by TransportConfig)

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;
use crate::types::{
    AvailabilityResponse, CreateVisitBody, OutcomeBody, PublishSlotsBody, RecipientRescheduleBody,
    RescheduleBody, SlotResponse, StatusBody, VisitRequestResponse,
};

// ── Error response shape from the backend ────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the scheduling endpoints of the marketplace backend.
///
/// Communicates via JSON REST endpoints under `/api/`. The backend is
/// the source of truth -- this client performs no validation or pruning
/// of its own; that is `visita-core`'s job.
#[derive(Clone)]
pub struct SchedulingClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SchedulingClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and transport config (bearer token included
    /// there as a default header).
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base URL ends with `/api/` so relative joins work.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;

        let path = url.path().trim_end_matches('/').to_owned();
        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"v1/slots/abc"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview = &body[..body.len().min(200)];
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let parsed: Option<ErrorResponse> = serde_json::from_str(&raw).ok();
        let message = parsed
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.clone()
                }
            });
        let code = parsed.and_then(|e| e.code);

        match status {
            reqwest::StatusCode::BAD_REQUEST => Error::Validation { message, code },
            reqwest::StatusCode::UNAUTHORIZED => Error::Authentication { message },
            reqwest::StatusCode::FORBIDDEN => Error::Forbidden { message },
            reqwest::StatusCode::NOT_FOUND => Error::NotFound { message },
            reqwest::StatusCode::CONFLICT => Error::Conflict { message },
            _ => Error::Api {
                message,
                code,
                status: status.as_u16(),
            },
        }
    }

    // ── Availability endpoints ───────────────────────────────────────

    /// `GET /v1/properties/{propertyId}/availability`
    pub async fn get_availability(&self, property_id: &str) -> Result<AvailabilityResponse, Error> {
        self.get(&format!("v1/properties/{property_id}/availability"))
            .await
    }

    /// `POST /v1/properties/{propertyId}/slots` -- batch-publish slots
    /// for one date. The backend validates lead time and rejects the
    /// whole batch on violation.
    pub async fn publish_slots(
        &self,
        property_id: &str,
        body: &PublishSlotsBody,
    ) -> Result<Vec<SlotResponse>, Error> {
        self.post(&format!("v1/properties/{property_id}/slots"), body)
            .await
    }

    /// `DELETE /v1/slots/{slotId}` -- remove exactly one slot.
    pub async fn delete_slot(&self, slot_id: &str) -> Result<(), Error> {
        self.delete(&format!("v1/slots/{slot_id}")).await
    }

    // ── Visit request endpoints ──────────────────────────────────────

    /// `POST /v1/visit-requests`
    pub async fn create_visit(&self, body: &CreateVisitBody) -> Result<VisitRequestResponse, Error> {
        self.post("v1/visit-requests", body).await
    }

    /// `PUT /v1/visit-requests/{id}/schedule` -- requester reschedule
    /// (pending only; status unchanged).
    pub async fn reschedule_visit(
        &self,
        id: &str,
        body: &RescheduleBody,
    ) -> Result<VisitRequestResponse, Error> {
        self.put(&format!("v1/visit-requests/{id}/schedule"), body)
            .await
    }

    /// `PUT /v1/visit-requests/{id}/recipient-schedule` -- recipient
    /// reschedule of an approved visit (status preserved).
    pub async fn recipient_reschedule(
        &self,
        id: &str,
        body: &RecipientRescheduleBody,
    ) -> Result<VisitRequestResponse, Error> {
        self.put(&format!("v1/visit-requests/{id}/recipient-schedule"), body)
            .await
    }

    /// `DELETE /v1/visit-requests/{id}` -- cancel (removes the request).
    pub async fn delete_visit(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("v1/visit-requests/{id}")).await
    }

    /// `PUT /v1/visit-requests/{id}/status` with `approved` or `rejected`.
    pub async fn set_status(&self, id: &str, status: &str) -> Result<VisitRequestResponse, Error> {
        self.put(
            &format!("v1/visit-requests/{id}/status"),
            &StatusBody {
                status: status.to_owned(),
            },
        )
        .await
    }

    /// `PUT /v1/visit-requests/{id}/outcome` with `visited` or `not visited`.
    pub async fn record_outcome(
        &self,
        id: &str,
        outcome: &str,
    ) -> Result<VisitRequestResponse, Error> {
        self.put(
            &format!("v1/visit-requests/{id}/outcome"),
            &OutcomeBody {
                outcome: outcome.to_owned(),
            },
        )
        .await
    }

    /// `GET /v1/visit-requests/mine[?status=]` -- requester view.
    pub async fn list_my_visits(
        &self,
        status: Option<&str>,
    ) -> Result<Vec<VisitRequestResponse>, Error> {
        match status {
            Some(s) => {
                self.get_with_params("v1/visit-requests/mine", &[("status", s.to_owned())])
                    .await
            }
            None => self.get("v1/visit-requests/mine").await,
        }
    }

    /// `GET /v1/visit-requests/assigned[?status=]` -- recipient view.
    pub async fn list_assigned_visits(
        &self,
        status: Option<&str>,
    ) -> Result<Vec<VisitRequestResponse>, Error> {
        match status {
            Some(s) => {
                self.get_with_params("v1/visit-requests/assigned", &[("status", s.to_owned())])
                    .await
            }
            None => self.get("v1/visit-requests/assigned").await,
        }
    }
}
