use crate::{
    api::{attendance_report, specialization, task, worker},
    auth::middleware::api_token_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Helper to build the per-IP limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("limiter period and burst are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let limiter = build_limiter(config.rate_api_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(api_token_middleware))
            .wrap(limiter)
            .service(
                web::resource("/register-user").route(web::post().to(worker::register_user)),
            )
            // /workers/{id}
            .service(web::resource("/workers/{id}").route(web::delete().to(worker::delete_worker)))
            .service(
                web::resource("/specializations")
                    .route(web::get().to(specialization::get_specializations)),
            )
            .service(
                web::scope("/tasks")
                    // /tasks
                    .service(web::resource("").route(web::get().to(task::get_tasks)))
                    // /tasks/{id}
                    .service(web::resource("/{id}").route(web::delete().to(task::delete_task)))
                    // /tasks/{id}/brigades
                    .service(
                        web::resource("/{id}/brigades")
                            .route(web::post().to(task::assign_brigades)),
                    ),
            )
            .service(
                web::resource("/download-attendance-report")
                    .route(web::get().to(attendance_report::download_attendance_report)),
            ),
    );
}
