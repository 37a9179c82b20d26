//! E2E tests: admin overrides, CORS and service endpoints.

use actix_web::http::{Method, header};
use actix_web::{App, test, web};
use horse_registry_lib::api;
use horse_registry_lib::auth::AdminKey;
use horse_registry_lib::error::AppError;
use horse_registry_lib::middleware::PermissiveCors;
use uuid::Uuid;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_admin_patch_requires_token() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env).await;
    let application = env.create_application("Starlight").await;
    let uri = format!("/api/applications/{}?status=complete", application.id);

    let req = test::TestRequest::patch().uri(&uri).to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(("X-ADMIN-TOKEN", "wrong"))
        .to_request();
    assert_eq!(call_status(&app, req).await, 401);

    assert_eq!(
        env.application_row(application.id).await.unwrap().status,
        "draft"
    );
}

#[actix_rt::test]
async fn test_admin_can_set_any_status() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env).await;
    let application = env.create_application("Starlight").await;
    let file = env
        .upload(application.id, "media", "a.png", b"a")
        .await
        .unwrap();

    let req = test::TestRequest::patch()
        .uri(&format!("/api/applications/{}?status=on_hold", application.id))
        .insert_header(("X-ADMIN-TOKEN", TEST_ADMIN_TOKEN))
        .to_request();
    assert_eq!(call_status(&app, req).await, 204);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/files/{}?status=needs_rescan", file.id))
        .insert_header(("X-ADMIN-TOKEN", TEST_ADMIN_TOKEN))
        .to_request();
    assert_eq!(call_status(&app, req).await, 204);

    assert_eq!(
        env.application_row(application.id).await.unwrap().status,
        "on_hold"
    );
    assert_eq!(env.file_row(file.id).await.unwrap().status, "needs_rescan");
}

#[actix_rt::test]
async fn test_admin_empty_status_rejected() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env).await;
    let application = env.create_application("Starlight").await;

    for uri in [
        format!("/api/applications/{}", application.id),
        format!("/api/applications/{}?status=", application.id),
    ] {
        let req = test::TestRequest::patch()
            .uri(&uri)
            .insert_header(("X-ADMIN-TOKEN", TEST_ADMIN_TOKEN))
            .to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, 400, "{}", uri);
        assert_eq!(body["error"], "INVALID_INPUT");
    }
}

#[actix_rt::test]
async fn test_admin_status_stored_verbatim() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env).await;
    let application = env.create_application("Starlight").await;

    let req = test::TestRequest::patch()
        .uri(&format!(
            "/api/applications/{}?status=%20complete%20",
            application.id
        ))
        .insert_header(("X-ADMIN-TOKEN", TEST_ADMIN_TOKEN))
        .to_request();
    assert_eq!(call_status(&app, req).await, 204);
    assert_eq!(
        env.application_row(application.id).await.unwrap().status,
        " complete "
    );

    let req = test::TestRequest::patch()
        .uri(&format!("/api/applications/{}?status=%20", application.id))
        .insert_header(("X-ADMIN-TOKEN", TEST_ADMIN_TOKEN))
        .to_request();
    assert_eq!(call_status(&app, req).await, 204);
    assert_eq!(
        env.application_row(application.id).await.unwrap().status,
        " "
    );
}

#[actix_rt::test]
async fn test_admin_status_update_of_unknown_id_is_noop() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/files/{}?status=sent", Uuid::new_v4()))
        .insert_header(("X-ADMIN-TOKEN", TEST_ADMIN_TOKEN))
        .to_request();
    assert_eq!(call_status(&app, req).await, 204);
}

#[actix_rt::test]
async fn test_admin_delete_ignores_status() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env).await;
    let application = env.create_application("Starlight").await;
    let file = env
        .upload(application.id, "media", "a.png", b"a")
        .await
        .unwrap();
    env.lifecycle.submit_application(application.id).await.unwrap();
    env.lifecycle
        .update_application_status(application.id, "complete")
        .await
        .unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/files/{}", file.id))
        .insert_header(("X-ADMIN-TOKEN", TEST_ADMIN_TOKEN))
        .to_request();
    assert_eq!(call_status(&app, req).await, 204);

    assert!(env.file_row(file.id).await.is_none());
    assert_eq!(env.stored_blob_count(application.id), 0);
}

#[actix_rt::test]
async fn test_delete_with_wrong_token_uses_user_rules() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env).await;
    let application = env.create_application("Starlight").await;
    let file = env
        .upload(application.id, "media", "a.png", b"a")
        .await
        .unwrap();
    env.lifecycle.submit_application(application.id).await.unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/files/{}", file.id))
        .insert_header(("X-ADMIN-TOKEN", "wrong"))
        .to_request();
    assert_eq!(call_status(&app, req).await, 400);
    assert!(env.file_row(file.id).await.is_some());
}

#[actix_rt::test]
async fn test_admin_delete_unknown_file_is_not_found() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/files/{}", Uuid::new_v4()))
        .insert_header(("X-ADMIN-TOKEN", TEST_ADMIN_TOKEN))
        .to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");

    let err = env
        .lifecycle
        .admin_delete_file(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_rt::test]
async fn test_unconfigured_admin_key_rejects_everyone() {
    let env = TestEnv::new().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(env.lifecycle.clone()))
            .app_data(web::Data::new(AdminKey::new(None)))
            .app_data(web::Data::new(env.limits))
            .service(web::scope("/api").configure(api::configure_api)),
    )
    .await;
    let application = env.create_application("Starlight").await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/applications/{}?status=complete", application.id))
        .insert_header(("X-ADMIN-TOKEN", ""))
        .to_request();
    assert_eq!(call_status(&app, req).await, 401);
}

#[actix_rt::test]
async fn test_cors_preflight_and_headers() {
    let env = TestEnv::new().await;
    let app = test::init_service(
        App::new()
            .wrap(PermissiveCors)
            .app_data(web::Data::new(env.pool.clone()))
            .app_data(web::Data::new(env.lifecycle.clone()))
            .app_data(web::Data::new(AdminKey::new(Some(
                TEST_ADMIN_TOKEN.to_string(),
            ))))
            .app_data(web::Data::new(env.limits))
            .service(web::scope("/api").configure(api::configure_api)),
    )
    .await;

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri(&format!("/api/files/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 204);
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap(),
        "GET, POST, PATCH, DELETE, OPTIONS"
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/applications/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .unwrap(),
        "Content-Type, X-ADMIN-TOKEN"
    );
}

#[actix_rt::test]
async fn test_health_ready_and_openapi() {
    let env = TestEnv::new().await;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");

    let req = test::TestRequest::get().uri("/api/ready").to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["database"], "connected");

    let req = test::TestRequest::get().uri("/api/openapi.json").to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, 200);
    assert!(body["paths"]["/api/applications/{id}/files"].is_object());
}
