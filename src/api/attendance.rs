use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceStatus;

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct TodayAttendance {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
    #[schema(example = "2026-03-02T09:00:00", format = "date-time", value_type = String)]
    pub clock_in: NaiveDateTime,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub clock_out: Option<NaiveDateTime>,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    #[schema(example = 480)]
    pub work_duration: Option<i32>,
}

/// Today's attendance, latest clock-in first
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Attendance records for today", body = Vec<TodayAttendance>),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn today_attendance(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let today = Local::now().date_naive();

    let records = sqlx::query_as::<_, TodayAttendance>(
        r#"
        SELECT u.name, u.department, a.clock_in, a.clock_out, a.status, a.work_duration
        FROM attendance a
        JOIN users u ON a.user_id = u.id
        WHERE a.date = ?
        ORDER BY a.clock_in DESC
        "#,
    )
    .bind(today)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Listing today's attendance failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(records))
}
