pub mod auth;
pub mod health;
pub mod products;
pub mod tasks;

use actix_web::web;

/// Explicit route table for the `/api` scope. Register and login are the
/// only entries the auth middleware lets through without a token.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::register)
        .service(auth::login)
        .service(auth::logout)
        .service(
            web::scope("/tasks")
                .service(tasks::list_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task)
                .service(tasks::complete_task)
                .service(tasks::incomplete_task),
        )
        .service(
            web::scope("/products")
                .service(products::list_products)
                .service(products::create_product)
                .service(products::get_product)
                .service(products::update_product)
                .service(products::delete_product),
        );
}
