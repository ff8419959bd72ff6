// Route exports
pub mod channel;

use actix_web::web;

pub use channel::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(channel::configure),
    );
}
