// gateway-server/src/api/mod.rs
pub mod publish;

pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(
        actix_web::web::scope("/api/v1")
            .service(publish::api_index)
            .service(publish::publish)
    );
}
