use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{rt, test, web, App, HttpServer};
use dotenv::dotenv;
use serde_json::json;
use sqlx::PgPool;
use std::net::TcpListener;
use storekeeper::auth::AuthMiddleware;
use storekeeper::routes;
use uuid::Uuid;

async fn test_pool() -> PgPool {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations on test DB");
    pool
}

async fn register_and_get_token(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
) -> String {
    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_json(&json!({
            "name": "Task Tester",
            "email": email,
            "password": "Password123!",
            "password_confirmation": "Password123!"
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    assert!(
        status.is_success(),
        "Setup: failed to register user. Body: {:?}",
        String::from_utf8_lossy(&body)
    );
    let auth: serde_json::Value = serde_json::from_slice(&body).unwrap();
    auth["token"].as_str().unwrap().to_string()
}

async fn cleanup_user(pool: &PgPool, email: &str) {
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

async fn cleanup_task(pool: &PgPool, id: i64) {
    let _ = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await;
}

macro_rules! authed {
    ($req:expr, $token:expr) => {
        $req.append_header(("Authorization", format!("Bearer {}", $token)))
    };
}

#[test_log::test(actix_rt::test)]
async fn test_task_crud_and_completion_flow() {
    let pool = test_pool().await;
    let email = format!("tasks+{}@example.com", Uuid::new_v4().simple());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await;

    let token = register_and_get_token(&app, &email).await;

    // Create
    let req = authed!(
        test::TestRequest::post().uri("/api/tasks").set_json(&json!({
            "title": "New Task",
            "description": "This is a new task.",
            "due_date": "2024-12-31T23:59:59Z",
            "is_completed": false
        })),
        token
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::CREATED,
        "Create task failed. Body: {:?}",
        String::from_utf8_lossy(&body)
    );
    let created: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let task_id = created["id"].as_i64().expect("task id missing");
    assert_eq!(created["title"].as_str(), Some("New Task"));
    assert_eq!(created["is_completed"].as_bool(), Some(false));

    // Show
    let req = authed!(
        test::TestRequest::get().uri(&format!("/api/tasks/{}", task_id)),
        token
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

    // Partial update: title only; due_date and completion flag untouched.
    let req = authed!(
        test::TestRequest::put()
            .uri(&format!("/api/tasks/{}", task_id))
            .set_json(&json!({ "title": "Updated Task" })),
        token
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let updated: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(updated["title"].as_str(), Some("Updated Task"));
    assert_eq!(updated["is_completed"].as_bool(), Some(false));
    assert_eq!(
        updated["description"].as_str(),
        Some("This is a new task.")
    );

    // PATCH performs the same partial update as PUT.
    let req = authed!(
        test::TestRequest::patch()
            .uri(&format!("/api/tasks/{}", task_id))
            .set_json(&json!({ "description": "Patched description." })),
        token
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        actix_web::http::StatusCode::OK,
        "PATCH update must be routed like PUT"
    );
    let patched: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(patched["description"].as_str(), Some("Patched description."));
    assert_eq!(patched["title"].as_str(), Some("Updated Task"));

    // Completion state machine: the last call wins, repeats are idempotent.
    let transitions = [
        ("complete", true),
        ("complete", true), // repeat is a no-op
        ("incomplete", false),
        ("incomplete", false),
        ("complete", true),
    ];
    for (action, expected) in transitions {
        let req = authed!(
            test::TestRequest::post().uri(&format!("/api/tasks/{}/{}", task_id, action)),
            token
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.status(),
            actix_web::http::StatusCode::OK,
            "{} transition failed",
            action
        );
        let body: serde_json::Value =
            serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(
            body["is_completed"].as_bool(),
            Some(expected),
            "after {} the flag must be {}",
            action,
            expected
        );
    }

    // Transition on a missing task is a 404.
    let req = authed!(
        test::TestRequest::post().uri("/api/tasks/999999999/complete"),
        token
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);

    // Delete, then show must 404.
    let req = authed!(
        test::TestRequest::delete().uri(&format!("/api/tasks/{}", task_id)),
        token
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NO_CONTENT);

    let req = authed!(
        test::TestRequest::get().uri(&format!("/api/tasks/{}", task_id)),
        token
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);

    let req = authed!(
        test::TestRequest::delete().uri(&format!("/api/tasks/{}", task_id)),
        token
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);

    cleanup_task(&pool, task_id).await;
    cleanup_user(&pool, &email).await;
}

#[test_log::test(actix_rt::test)]
async fn test_invalid_task_inputs() {
    let pool = test_pool().await;
    let email = format!("tasks-validation+{}@example.com", Uuid::new_v4().simple());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await;

    let token = register_and_get_token(&app, &email).await;

    let test_cases = vec![
        (
            json!({ "due_date": "2024-12-31T23:59:59Z", "is_completed": false }),
            actix_web::http::StatusCode::BAD_REQUEST,
            "missing title",
        ),
        (
            json!({ "title": "T", "is_completed": false }),
            actix_web::http::StatusCode::BAD_REQUEST,
            "missing due_date",
        ),
        (
            json!({ "title": "", "due_date": "2024-12-31T23:59:59Z", "is_completed": false }),
            actix_web::http::StatusCode::UNPROCESSABLE_ENTITY,
            "empty title",
        ),
        (
            json!({ "title": "a".repeat(256), "due_date": "2024-12-31T23:59:59Z", "is_completed": false }),
            actix_web::http::StatusCode::UNPROCESSABLE_ENTITY,
            "title too long",
        ),
        (
            json!({ "title": "T", "description": "b".repeat(1001), "due_date": "2024-12-31T23:59:59Z", "is_completed": false }),
            actix_web::http::StatusCode::UNPROCESSABLE_ENTITY,
            "description too long",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = authed!(
            test::TestRequest::post().uri("/api/tasks").set_json(&payload),
            token
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        assert_eq!(
            status,
            expected_status,
            "Test case failed: {}. Body: {:?}",
            description,
            String::from_utf8_lossy(&body)
        );
    }

    cleanup_user(&pool, &email).await;
}

#[test_log::test(actix_rt::test)]
async fn test_create_task_unauthorized_over_http() {
    let pool = test_pool().await;

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let server_pool = pool.clone();
    let _server_handle = rt::spawn(async move {
        HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(server_pool.clone()))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header()
                        .max_age(3600),
                )
                .wrap(Logger::default())
                .service(routes::health::health)
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware)
                        .configure(routes::config),
                )
        })
        .bind(("127.0.0.1", port))
        .unwrap_or_else(|_| panic!("Failed to bind to port {}", port))
        .run()
        .await
    });

    // Give the server a moment to start
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let client = reqwest::Client::new();
    let task_payload = json!({
        "title": "Unauthorized Task",
        "due_date": "2024-12-31T23:59:59Z",
        "is_completed": false
    });

    let request_url = format!("http://127.0.0.1:{}/api/tasks", port);

    let resp = client
        .post(&request_url)
        .json(&task_payload)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(
        resp.status(),
        reqwest::StatusCode::UNAUTHORIZED,
        "Expected 401 Unauthorized, got {}. Body: {:?}",
        resp.status(),
        resp.text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string())
    );

    // Health stays reachable without a token.
    let resp = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}
