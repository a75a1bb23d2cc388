use base64::{Engine as _, engine::general_purpose};
use serde_json::Value;

use crate::helpers::TestApp;

fn document_form(data: &[u8], file_name: &str, document_type: &str, user_id: &str) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(data.to_vec())
        .file_name(file_name.to_string())
        .mime_str("application/pdf")
        .expect("valid mime");
    reqwest::multipart::Form::new()
        .part("file", part)
        .text("documentType", document_type.to_string())
        .text("userId", user_id.to_string())
}

#[tokio::test]
async fn upload_and_get_round_trips_base64_content() {
    let app = TestApp::spawn().await;
    let content = b"%PDF-1.4 fake aadhar".to_vec();

    let response = app
        .client
        .post(app.url("/api/v1/documents"))
        .multipart(document_form(&content, "aadhar.pdf", "aadhar_card", "user-7"))
        .send()
        .await
        .expect("upload request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("upload body");
    assert_eq!(body["success"], true);
    let id = body["document_id"].as_str().expect("document_id");
    assert_eq!(body["document_url"], format!("/api/v1/documents/{id}"));

    let fetched = app
        .client
        .get(app.url(&format!("/api/v1/documents/{id}")))
        .send()
        .await
        .expect("get request");
    assert_eq!(fetched.status(), 200);

    let doc: Value = fetched.json().await.expect("document body");
    assert_eq!(doc["file_name"], "aadhar.pdf");
    let decoded = general_purpose::STANDARD
        .decode(doc["file"].as_str().expect("file"))
        .expect("valid base64");
    assert_eq!(decoded, content);
}

#[tokio::test]
async fn unknown_document_type_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/v1/documents"))
        .multipart(document_form(b"x", "doc.pdf", "passport", "user-7"))
        .send()
        .await
        .expect("upload request");
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn get_unknown_document_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url(&format!("/api/v1/documents/{}", uuid::Uuid::now_v7())))
        .send()
        .await
        .expect("get request");
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn list_returns_only_the_users_documents() {
    let app = TestApp::spawn().await;

    for (doc_type, user) in [("aadhar_card", "alice"), ("pan_card", "alice"), ("voter_id", "bob")] {
        let response = app
            .client
            .post(app.url("/api/v1/documents"))
            .multipart(document_form(b"content", "doc.pdf", doc_type, user))
            .send()
            .await
            .expect("upload request");
        assert_eq!(response.status(), 201);
    }

    let listed = app
        .client
        .get(app.url("/api/v1/documents/user/alice"))
        .send()
        .await
        .expect("list request");
    assert_eq!(listed.status(), 200);

    let body: Value = listed.json().await.expect("list body");
    assert_eq!(body["total"], 2);
    let documents = body["documents"].as_array().expect("documents array");
    assert_eq!(documents.len(), 2);
    assert!(documents.iter().all(|d| d["user_id"] == "alice"));
    // Inline content stays out of the listing.
    assert!(documents.iter().all(|d| d.get("file").is_none()));
}

#[tokio::test]
async fn kyc_check_reports_missing_and_complete() {
    let app = TestApp::spawn().await;

    for doc_type in ["aadhar_card", "pan_card"] {
        let response = app
            .client
            .post(app.url("/api/v1/documents"))
            .multipart(document_form(b"content", "doc.pdf", doc_type, "carol"))
            .send()
            .await
            .expect("upload request");
        assert_eq!(response.status(), 201);
    }

    let partial = app
        .client
        .get(app.url("/api/v1/documents/check-kyc/carol"))
        .send()
        .await
        .expect("kyc request");
    let body: Value = partial.json().await.expect("kyc body");
    assert_eq!(body["has_all_documents"], false);
    assert_eq!(body["documents"]["aadhar"], true);
    assert_eq!(body["documents"]["pan"], true);
    assert_eq!(body["documents"]["voter_id"], false);
    assert_eq!(body["message"], "Missing some KYC documents");

    let response = app
        .client
        .post(app.url("/api/v1/documents"))
        .multipart(document_form(b"content", "doc.pdf", "voter_id", "carol"))
        .send()
        .await
        .expect("upload request");
    assert_eq!(response.status(), 201);

    let complete = app
        .client
        .get(app.url("/api/v1/documents/check-kyc/carol"))
        .send()
        .await
        .expect("kyc request");
    let body: Value = complete.json().await.expect("kyc body");
    assert_eq!(body["has_all_documents"], true);
    assert_eq!(body["message"], "All KYC documents are present");
}
