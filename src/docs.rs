use crate::api::attendance::TodayAttendance;
use crate::api::scan::{ScanRequest, ScanResponse, UnknownCardResponse, UserSummary};
use crate::api::users::{CreateUser, UserStatus};
use crate::model::attendance::AttendanceStatus;
use crate::model::scan_log::ScanAction;
use crate::model::user::User;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "RFID Attendance API",
        version = "1.0.0",
        description = r#"
## RFID Attendance Service

Turns badge taps from kiosk readers into clock-in / clock-out records.

### Key Features
- **Scan** - one call per accepted tap; the service decides clock-in or clock-out
- **Status** - where a badge holder stands today
- **Users** - list and register badge holders
- **Attendance** - today's records

Every scan, recognised or not, is written to the scan log in the same
transaction as its attendance change.
"#,
    ),
    paths(
        crate::api::scan::scan,
        crate::api::scan::health,

        crate::api::users::user_status,
        crate::api::users::list_users,
        crate::api::users::add_user,

        crate::api::attendance::today_attendance
    ),
    components(
        schemas(
            ScanRequest,
            ScanResponse,
            UnknownCardResponse,
            UserSummary,
            ScanAction,
            AttendanceStatus,
            User,
            CreateUser,
            UserStatus,
            TodayAttendance
        )
    ),
    tags(
        (name = "Scan", description = "Badge scan APIs"),
        (name = "Users", description = "Badge holder APIs"),
        (name = "Attendance", description = "Attendance record APIs"),
    )
)]
pub struct ApiDoc;
