use crate::{
    api::{attendance, employee},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes (register still requires an admin bearer token via its extractor)
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(employee::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/in").route(web::post().to(attendance::mark_in)),
                    )
                    .service(
                        web::resource("/out").route(web::post().to(attendance::mark_out)),
                    )
                    .service(
                        web::resource("/toggle").route(web::post().to(attendance::toggle)),
                    )
                    .service(
                        web::resource("/status").route(web::get().to(attendance::status)),
                    )
                    .service(web::resource("/logs").route(web::get().to(attendance::my_logs)))
                    .service(
                        web::resource("/summary").route(web::get().to(attendance::my_summary)),
                    ),
            )
            .service(
                web::scope("/admin")
                    .service(
                        web::resource("/employees")
                            .route(web::get().to(employee::list_employees)),
                    )
                    .service(
                        web::resource("/employees/{id}/attendance")
                            .route(web::get().to(employee::employee_attendance)),
                    )
                    .service(
                        web::resource("/attendance/logs")
                            .route(web::get().to(attendance::admin_logs)),
                    )
                    .service(
                        web::resource("/attendance/summary")
                            .route(web::get().to(attendance::admin_summaries)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
