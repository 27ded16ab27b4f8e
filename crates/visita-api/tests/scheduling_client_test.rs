#![allow(clippy::unwrap_used)]
// Integration tests for `SchedulingClient` using wiremock.

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use visita_api::types::{CreateVisitBody, PublishSlotsBody, RescheduleBody};
use visita_api::{Error, SchedulingClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, SchedulingClient) {
    let server = MockServer::start().await;
    let client = SchedulingClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn visit_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "propertyId": "prop-1",
        "requesterId": "buyer-7",
        "recipientId": "agent-3",
        "scheduledAt": "2026-03-14T15:30:00",
        "note": "second viewing",
        "status": status,
        "createdAt": "2026-03-01T09:00:00",
        "updatedAt": "2026-03-01T09:00:00"
    })
}

// ── Availability tests ──────────────────────────────────────────────

#[tokio::test]
async fn get_availability_parses_slots() {
    let (server, client) = setup().await;

    let body = json!({
        "propertyId": "prop-1",
        "slots": [
            {
                "id": "slot-a",
                "propertyId": "prop-1",
                "date": "2026-03-14",
                "startTime": "10:00",
                "endTime": "10:30"
            },
            {
                "id": "slot-b",
                "propertyId": "prop-1",
                "date": "2026-03-14",
                "startTime": "10:30",
                "endTime": "11:00"
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/api/v1/properties/prop-1/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let availability = client.get_availability("prop-1").await.unwrap();

    assert_eq!(availability.property_id, "prop-1");
    assert_eq!(availability.slots.len(), 2);
    assert_eq!(availability.slots[0].start_time, "10:00");
    assert_eq!(
        availability.slots[1].date,
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    );
}

#[tokio::test]
async fn publish_slots_sends_date_and_times() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/properties/prop-1/slots"))
        .and(body_partial_json(json!({
            "date": "2026-03-15",
            "times": ["10:00", "10:30"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {
                "id": "slot-c",
                "propertyId": "prop-1",
                "date": "2026-03-15",
                "startTime": "10:00",
                "endTime": "10:30"
            },
            {
                "id": "slot-d",
                "propertyId": "prop-1",
                "date": "2026-03-15",
                "startTime": "10:30",
                "endTime": "11:00"
            }
        ])))
        .mount(&server)
        .await;

    let created = client
        .publish_slots(
            "prop-1",
            &PublishSlotsBody {
                date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
                times: vec!["10:00".into(), "10:30".into()],
            },
        )
        .await
        .unwrap();

    assert_eq!(created.len(), 2);
    assert_eq!(created[0].id, "slot-c");
}

#[tokio::test]
async fn publish_slots_maps_400_to_validation() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/properties/prop-1/slots"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "slot times must be at least 10 minutes in the future: 09:30",
            "code": "lead_time_violation"
        })))
        .mount(&server)
        .await;

    let result = client
        .publish_slots(
            "prop-1",
            &PublishSlotsBody {
                date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
                times: vec!["09:30".into()],
            },
        )
        .await;

    match result {
        Err(Error::Validation { message, code }) => {
            assert!(message.contains("09:30"));
            assert_eq!(code.as_deref(), Some("lead_time_violation"));
        }
        other => panic!("expected Validation error, got: {other:?}"),
    }
}

#[tokio::test]
async fn delete_slot_ok_on_204() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/slots/slot-a"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client.delete_slot("slot-a").await.unwrap();
}

#[tokio::test]
async fn delete_slot_maps_404_to_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/slots/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "slot not found"
        })))
        .mount(&server)
        .await;

    let result = client.delete_slot("gone").await;
    assert!(result.as_ref().unwrap_err().is_not_found(), "{result:?}");
}

// ── Visit request tests ─────────────────────────────────────────────

#[tokio::test]
async fn create_visit_round_trip() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/visit-requests"))
        .and(body_partial_json(json!({
            "propertyId": "prop-1",
            "scheduledAt": "2026-03-14T15:30:00"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(visit_json("vr-1", "pending")))
        .mount(&server)
        .await;

    let visit = client
        .create_visit(&CreateVisitBody {
            property_id: "prop-1".into(),
            scheduled_at: "2026-03-14T15:30:00".parse().unwrap(),
            note: Some("second viewing".into()),
        })
        .await
        .unwrap();

    assert_eq!(visit.id, "vr-1");
    assert_eq!(visit.status, "pending");
    assert_eq!(visit.requester_id, "buyer-7");
}

#[tokio::test]
async fn reschedule_conflict_maps_to_conflict() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/visit-requests/vr-1/schedule"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "visit request is no longer pending"
        })))
        .mount(&server)
        .await;

    let result = client
        .reschedule_visit(
            "vr-1",
            &RescheduleBody {
                scheduled_at: "2026-03-20T11:00:00".parse().unwrap(),
                note: None,
            },
        )
        .await;

    assert!(result.as_ref().unwrap_err().is_conflict(), "{result:?}");
}

#[tokio::test]
async fn set_status_returns_updated_visit() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/visit-requests/vr-1/status"))
        .and(body_partial_json(json!({"status": "approved"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(visit_json("vr-1", "approved")))
        .mount(&server)
        .await;

    let visit = client.set_status("vr-1", "approved").await.unwrap();
    assert_eq!(visit.status, "approved");
}

#[tokio::test]
async fn record_outcome_accepts_not_visited() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/visit-requests/vr-1/outcome"))
        .and(body_partial_json(json!({"outcome": "not visited"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(visit_json("vr-1", "not visited")))
        .mount(&server)
        .await;

    let visit = client.record_outcome("vr-1", "not visited").await.unwrap();
    assert_eq!(visit.status, "not visited");
}

#[tokio::test]
async fn list_my_visits_passes_status_filter() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/visit-requests/mine"))
        .and(query_param("status", "pending"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([visit_json("vr-1", "pending")])),
        )
        .mount(&server)
        .await;

    let visits = client.list_my_visits(Some("pending")).await.unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].status, "pending");
}

#[tokio::test]
async fn list_assigned_visits_maps_401_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/visit-requests/assigned"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "token expired"
        })))
        .mount(&server)
        .await;

    let result = client.list_assigned_visits(None).await;
    assert!(result.as_ref().unwrap_err().is_auth_expired(), "{result:?}");
}
