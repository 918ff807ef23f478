pub mod auth;
pub mod users;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::refresh)
            .service(auth::logout),
    )
    .service(
        web::scope("/users")
            .service(users::me)
            .service(users::list_users),
    );
}
