use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use migration::MigratorTrait;
use serde_json::json;
use tower::Service;
use uuid::Uuid;

use server::routes::{self, auth};
use service::application::repo::seaorm::SeaOrmApplicationRepository;
use service::application::ApplicationService;
use service::storage::LocalBlobStore;

/// Build the router against a live database, or None when unreachable.
async fn build_app() -> Option<Router> {
    let db = match models::db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {}", e);
            return None;
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("skip: migrate up failed: {}", e);
        return None;
    }

    let upload_dir = std::env::temp_dir().join(format!("careerboard_uploads_{}", Uuid::new_v4()));
    let blobs = LocalBlobStore::new(upload_dir.clone(), "/uploads", 10 * 1024 * 1024)
        .await
        .expect("blob store init");
    let repo = Arc::new(SeaOrmApplicationRepository { db: db.clone() });
    let applications = Arc::new(ApplicationService::new(repo, blobs));

    let state = auth::ServerState {
        db,
        auth: auth::ServerAuthConfig { jwt_secret: "test-secret".into(), token_ttl_hours: 12 },
        applications,
    };
    Some(routes::build_router(state, tower_http::cors::CorsLayer::very_permissive(), upload_dir.to_str().unwrap()))
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, token: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token));
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Register a throwaway user and return their bearer token.
async fn register(app: &Router, name: &str) -> anyhow::Result<String> {
    let req = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&json!({
            "name": name,
            "email": format!("{}_{}@example.com", name, Uuid::new_v4()),
            "password": "S3curePass!"
        }))?))?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    Ok(body["token"].as_str().expect("token issued").to_string())
}

#[tokio::test]
async fn test_application_lifecycle() -> anyhow::Result<()> {
    let Some(app) = build_app().await else { return Ok(()) };
    let owner = register(&app, "owner").await?;
    let stranger = register(&app, "stranger").await?;

    // Create: default pipeline, status Applied
    let resp = app
        .clone()
        .call(request("POST", "/applications", &owner, Some(json!({"companyName": "Acme", "role": "Engineer"}))))
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["status"], "Applied");
    let rounds = created["rounds"].as_array().unwrap();
    assert_eq!(rounds.len(), 5);
    let names: Vec<&str> = rounds.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Screening", "OA", "Technical", "HR", "Offer"]);
    assert!(rounds.iter().all(|r| r["status"] == "Pending"));
    let app_id = created["id"].as_str().unwrap().to_string();

    // Missing company name is a validation failure
    let resp = app
        .clone()
        .call(request("POST", "/applications", &owner, Some(json!({"companyName": "", "role": "Engineer"}))))
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // List is owner-scoped
    let resp = app.clone().call(request("GET", "/applications", &owner, None)).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
    let resp = app.clone().call(request("GET", "/applications", &stranger, None)).await?;
    assert!(body_json(resp).await.as_array().unwrap().is_empty());

    // Foreign reads are forbidden, unknown ids are not found
    let uri = format!("/applications/{}", app_id);
    let resp = app.clone().call(request("GET", &uri, &stranger, None)).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = app
        .clone()
        .call(request("GET", &format!("/applications/{}", Uuid::new_v4()), &owner, None))
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Status: closed enum, then a real transition
    let resp = app
        .clone()
        .call(request("PATCH", &format!("{}/status", uri), &owner, Some(json!({"status": "Ghosted"}))))
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = app
        .clone()
        .call(request("PATCH", &format!("{}/status", uri), &owner, Some(json!({"status": "In Process"}))))
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "In Process");

    // Rounds: reject blank names, append, pass, delete
    let resp = app
        .clone()
        .call(request("POST", &format!("{}/rounds", uri), &owner, Some(json!({"name": "   "}))))
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .clone()
        .call(request("POST", &format!("{}/rounds", uri), &owner, Some(json!({"name": "System Design"}))))
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let with_round = body_json(resp).await;
    let rounds = with_round["rounds"].as_array().unwrap();
    assert_eq!(rounds.len(), 6);
    let round_id = rounds.last().unwrap()["id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .call(request("PATCH", &format!("{}/rounds/{}", uri, round_id), &owner, Some(json!({"status": "Passed"}))))
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    let passed = updated["rounds"].as_array().unwrap().iter().find(|r| r["id"] == round_id.as_str()).unwrap();
    assert_eq!(passed["status"], "Passed");

    let resp = app
        .clone()
        .call(request("DELETE", &format!("{}/rounds/{}", uri, Uuid::new_v4()), &owner, None))
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = app
        .clone()
        .call(request("DELETE", &format!("{}/rounds/{}", uri, round_id), &owner, None))
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["rounds"].as_array().unwrap().len(), 5);

    // Partial update merges fields without touching the rest
    let resp = app
        .clone()
        .call(request("PUT", &uri, &owner, Some(json!({"notes": "met the team"}))))
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    assert_eq!(updated["notes"], "met the team");
    assert_eq!(updated["companyName"], "Acme");

    // Delete, then the id is gone
    let resp = app.clone().call(request("DELETE", &uri, &owner, None)).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["message"], "Application deleted");
    let resp = app.clone().call(request("GET", &uri, &owner, None)).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_attachment_upload_and_delete() -> anyhow::Result<()> {
    let Some(app) = build_app().await else { return Ok(()) };
    let owner = register(&app, "uploader").await?;

    let resp = app
        .clone()
        .call(request("POST", "/applications", &owner, Some(json!({"companyName": "Acme", "role": "Engineer"}))))
        .await?;
    let created = body_json(resp).await;
    let app_id = created["id"].as_str().unwrap().to_string();

    // Multipart upload: type + file
    let boundary = "careerboard-test-boundary";
    let multipart_body = format!(
        "--{b}\r\ncontent-disposition: form-data; name=\"type\"\r\n\r\nresume\r\n--{b}\r\ncontent-disposition: form-data; name=\"file\"; filename=\"my resume.pdf\"\r\ncontent-type: application/pdf\r\n\r\n%PDF-1.4 fake\r\n--{b}--\r\n",
        b = boundary
    );
    let req = Request::builder()
        .method("POST")
        .uri(format!("/applications/{}/attachments", app_id))
        .header("authorization", format!("Bearer {}", owner))
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(multipart_body))?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let with_attachment = body_json(resp).await;
    let attachments = with_attachment["attachments"].as_array().unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0]["type"], "resume");
    let url = attachments[0]["url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/"));
    // multer-style sanitization: spaces became underscores
    assert!(attachments[0]["filename"].as_str().unwrap().ends_with("my_resume.pdf"));
    let attachment_id = attachments[0]["id"].as_str().unwrap().to_string();

    // Unknown type is rejected before anything is stored
    let bad_body = format!(
        "--{b}\r\ncontent-disposition: form-data; name=\"type\"\r\n\r\ncover_letter\r\n--{b}\r\ncontent-disposition: form-data; name=\"file\"; filename=\"x.pdf\"\r\n\r\nx\r\n--{b}--\r\n",
        b = boundary
    );
    let req = Request::builder()
        .method("POST")
        .uri(format!("/applications/{}/attachments", app_id))
        .header("authorization", format!("Bearer {}", owner))
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(bad_body))?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Delete the record; the application no longer lists it
    let resp = app
        .clone()
        .call(request("DELETE", &format!("/applications/{}/attachments/{}", app_id, attachment_id), &owner, None))
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["attachments"].as_array().unwrap().is_empty());
    Ok(())
}
