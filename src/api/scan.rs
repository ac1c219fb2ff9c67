use actix_web::{HttpResponse, Responder, error::InternalError, web};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use utoipa::ToSchema;

use crate::attendance::{AttendanceStateMachine, MySqlStore, ScanError, ScanOutcome, ScanStore};
use crate::model::scan_log::ScanAction;

/// Timestamp layout shared with the kiosk.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Absent is treated like blank.
    #[serde(default)]
    #[schema(example = "04A1B2C3")]
    pub rfid_uid: String,
}

/// Unreadable scan bodies get the same JSON 400 as a missing uid.
pub fn scan_json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        warn!(error = %err, "Rejected scan body");
        let reply = HttpResponse::BadRequest().json(json!({
            "error": "Missing rfid_uid"
        }));
        InternalError::from_response(err, reply).into()
    })
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScanResponse {
    pub success: bool,
    pub action: ScanAction,
    #[schema(example = "Welcome Jane Doe! Clocked in successfully.")]
    pub message: String,
    pub user: UserSummary,
    #[schema(example = "2026-03-02T09:00:00", format = "date-time")]
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnknownCardResponse {
    pub success: bool,
    #[schema(example = "RFID card not registered")]
    pub message: String,
    #[schema(example = "DEADBEEF")]
    pub rfid_uid: String,
}

/// Badge scan endpoint
#[utoipa::path(
    post,
    path = "/api/scan",
    request_body(
        content = ScanRequest,
        description = "Badge tapped at a kiosk",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Clocked in or out", body = ScanResponse),
        (status = 400, description = "Missing rfid_uid", body = Object, example = json!({
            "error": "Missing rfid_uid"
        })),
        (status = 404, description = "Card not registered", body = UnknownCardResponse),
        (status = 500, description = "Database operation failed")
    ),
    tag = "Scan"
)]
pub async fn scan(
    machine: web::Data<AttendanceStateMachine<MySqlStore>>,
    body: web::Json<ScanRequest>,
) -> impl Responder {
    let now = Local::now().naive_local();
    scan_response(machine.get_ref(), &body, now).await
}

/// Runs one scan through the state machine and shapes the HTTP reply.
pub async fn scan_response<S: ScanStore>(
    machine: &AttendanceStateMachine<S>,
    req: &ScanRequest,
    now: NaiveDateTime,
) -> HttpResponse {
    match machine.process_scan(&req.rfid_uid, now).await {
        Ok(ScanOutcome::Recorded {
            user,
            action,
            message,
            at,
        }) => HttpResponse::Ok().json(ScanResponse {
            success: true,
            action,
            message,
            user: UserSummary {
                name: user.name,
                department: user.department,
            },
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
        }),

        Ok(ScanOutcome::UnknownCard { rfid_uid }) => HttpResponse::NotFound().json(UnknownCardResponse {
            success: false,
            message: "RFID card not registered".to_string(),
            rfid_uid,
        }),

        Err(ScanError::EmptyUid) => HttpResponse::BadRequest().json(json!({
            "error": "Missing rfid_uid"
        })),

        Err(ScanError::Persistence(_)) => HttpResponse::InternalServerError().json(json!({
            "error": "Database operation failed"
        })),
    }
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = Object, example = json!({
            "status": "healthy",
            "timestamp": "2026-03-02T09:00:00"
        }))
    ),
    tag = "Scan"
)]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string()
    }))
}
