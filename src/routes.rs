use crate::{
    api::{attendance, scan, users},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::{Result, anyhow};

pub type ScanLimiter = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-address limiter for the scan route.
pub fn scan_limiter(requests_per_min: u32) -> Result<ScanLimiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid scan rate limit: {requests_per_min}/min"))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiter: &ScanLimiter) {
    cfg.route("/health", web::get().to(scan::health));

    cfg.service(
        web::scope(&config.api_prefix)
            // /scan
            .service(
                web::resource("/scan")
                    .app_data(scan::scan_json_config())
                    .wrap(Governor::new(limiter))
                    .route(web::post().to(scan::scan)),
            )
            // /status/{rfid_uid}
            .service(web::resource("/status/{rfid_uid}").route(web::get().to(users::user_status)))
            // /users
            .service(
                web::resource("/users")
                    .route(web::get().to(users::list_users))
                    .route(web::post().to(users::add_user)),
            )
            // /attendance/today
            .service(
                web::resource("/attendance/today")
                    .route(web::get().to(attendance::today_attendance)),
            ),
    );
}
