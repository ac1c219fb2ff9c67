use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, minutes_between};
use crate::model::user::{User, normalize_uid};

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "04A1B2C3")]
    pub rfid_uid: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane.doe@company.com")]
    pub email: Option<String>,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
}

/// Where a user stands today.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserStatus {
    #[schema(example = "Jane Doe")]
    pub name: String,
    /// `clocked_in`, `clocked_out` or `absent`
    #[schema(example = "clocked_in")]
    pub status: String,
    #[schema(example = "2026-03-02T09:00:00", format = "date-time", value_type = String, nullable = true)]
    pub clock_in: Option<NaiveDateTime>,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub clock_out: Option<NaiveDateTime>,
    #[schema(example = 125)]
    pub minutes_worked: Option<i32>,
}

impl UserStatus {
    pub fn summarize(user: &User, latest: Option<&AttendanceRecord>, now: NaiveDateTime) -> Self {
        match latest {
            None => Self {
                name: user.name.clone(),
                status: "absent".to_string(),
                clock_in: None,
                clock_out: None,
                minutes_worked: None,
            },
            Some(record) => Self {
                name: user.name.clone(),
                status: record.status.to_string(),
                clock_in: Some(record.clock_in),
                clock_out: record.clock_out,
                minutes_worked: if record.is_open() {
                    Some(minutes_between(record.clock_in, now))
                } else {
                    record.work_duration
                },
            },
        }
    }
}

/// Current status of a badge holder
#[utoipa::path(
    get,
    path = "/api/status/{rfid_uid}",
    params(("rfid_uid" = String, Path, description = "Badge identifier")),
    responses(
        (status = 200, description = "Status for today", body = UserStatus),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Users"
)]
pub async fn user_status(
    path: web::Path<String>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let rfid_uid = normalize_uid(&path.into_inner());
    let now = Local::now().naive_local();

    let user = sqlx::query_as::<_, User>(
        "SELECT id, rfid_uid, name, email, department, active FROM users WHERE rfid_uid = ?",
    )
    .bind(&rfid_uid)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, rfid_uid = %rfid_uid, "Status lookup failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(user) = user else {
        return Ok(HttpResponse::NotFound().json(json!({ "error": "User not found" })));
    };

    let latest = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, user_id, date, clock_in, clock_out, status, work_duration
        FROM attendance
        WHERE user_id = ? AND date = ?
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(user.id)
    .bind(now.date())
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = user.id, "Status lookup failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(UserStatus::summarize(&user, latest.as_ref(), now)))
}

/// List all badge holders
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = Vec<User>),
        (status = 500, description = "Internal server error")
    ),
    tag = "Users"
)]
pub async fn list_users(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, rfid_uid, name, email, department, active FROM users ORDER BY id",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Listing users failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(users))
}

/// Register a new badge holder
#[utoipa::path(
    post,
    path = "/api/users",
    request_body(content = CreateUser, content_type = "application/json"),
    responses(
        (status = 201, description = "User added", body = Object, example = json!({
            "success": true,
            "message": "User added successfully",
            "user_id": 12
        })),
        (status = 400, description = "Missing required fields"),
        (status = 409, description = "Badge already registered"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Users"
)]
pub async fn add_user(
    payload: web::Json<CreateUser>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let rfid_uid = normalize_uid(&payload.rfid_uid);
    let name = payload.name.trim();

    if rfid_uid.is_empty() || name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Missing required fields"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO users (rfid_uid, name, email, department)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&rfid_uid)
    .bind(name)
    .bind(payload.email.as_deref())
    .bind(payload.department.as_deref())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(done) => {
            tracing::info!(rfid_uid = %rfid_uid, user_id = done.last_insert_id(), "User added");
            Ok(HttpResponse::Created().json(json!({
                "success": true,
                "message": "User added successfully",
                "user_id": done.last_insert_id()
            })))
        }

        Err(e) => {
            // Duplicate badge
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "error": "RFID card already registered"
                    })));
                }
            }

            tracing::error!(error = %e, rfid_uid = %rfid_uid, "Adding user failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}
