use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use uuid::Uuid;

use common::storage::BlobId;
use server::entity::video_record;

use crate::helpers::{TestApp, pattern, video_form};

#[tokio::test]
async fn upload_and_fetch_round_trip() {
    let app = TestApp::spawn().await;
    // Larger than two chunks so the download spans chunk boundaries.
    let data = pattern(600 * 1024);

    let response = app
        .client
        .post(app.url("/api/v1/videos"))
        .multipart(video_form(data.clone(), "exam.mp4", "session-1", "front"))
        .send()
        .await
        .expect("upload request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("upload body");
    assert_eq!(body["success"], true);
    assert_eq!(body["video_url"], "/api/v1/videos/session-1/front");
    assert!(Uuid::parse_str(body["video_id"].as_str().expect("video_id")).is_ok());
    assert!(Uuid::parse_str(body["file_id"].as_str().expect("file_id")).is_ok());

    let fetched = app
        .client
        .get(app.url("/api/v1/videos/session-1/front"))
        .send()
        .await
        .expect("fetch request");
    assert_eq!(fetched.status(), 200);
    assert_eq!(
        fetched
            .headers()
            .get("content-type")
            .expect("content-type")
            .to_str()
            .expect("content-type str"),
        "video/mp4"
    );
    assert_eq!(
        fetched
            .headers()
            .get("content-length")
            .expect("content-length")
            .to_str()
            .expect("content-length str"),
        data.len().to_string()
    );
    let disposition = fetched
        .headers()
        .get("content-disposition")
        .expect("content-disposition")
        .to_str()
        .expect("disposition str")
        .to_string();
    assert!(disposition.contains("attachment"));
    assert!(disposition.contains("exam.mp4"));
    assert!(fetched.headers().contains_key("etag"));

    let bytes = fetched.bytes().await.expect("fetch body");
    assert_eq!(bytes.as_ref(), data.as_slice());
}

#[tokio::test]
async fn etag_match_returns_not_modified() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/v1/videos"))
        .multipart(video_form(pattern(4096), "clip.mp4", "session-etag", "rear"))
        .send()
        .await
        .expect("upload request");
    assert_eq!(response.status(), 201);

    let first = app
        .client
        .get(app.url("/api/v1/videos/session-etag/rear"))
        .send()
        .await
        .expect("first fetch");
    let etag = first
        .headers()
        .get("etag")
        .expect("etag")
        .to_str()
        .expect("etag str")
        .to_string();

    let second = app
        .client
        .get(app.url("/api/v1/videos/session-etag/rear"))
        .header("if-none-match", etag)
        .send()
        .await
        .expect("conditional fetch");
    assert_eq!(second.status(), 304);
}

#[tokio::test]
async fn fetch_unknown_pair_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/api/v1/videos/no-such-session/front"))
        .send()
        .await
        .expect("fetch request");
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn invalid_camera_type_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/api/v1/videos/session-1/overhead"))
        .send()
        .await
        .expect("fetch request");
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let app = TestApp::spawn().await;

    let form = reqwest::multipart::Form::new()
        .text("sessionId", "session-1")
        .text("cameraType", "front")
        .text("userId", "user-1")
        .text("electionId", "election-1");
    let response = app
        .client
        .post(app.url("/api/v1/videos"))
        .multipart(form)
        .send()
        .await
        .expect("upload request");
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn non_completed_records_are_not_retrievable() {
    let app = TestApp::spawn().await;

    for status in ["recording", "failed"] {
        let row = video_record::ActiveModel {
            id: Set(Uuid::now_v7()),
            session_id: Set("session-stuck".into()),
            camera_type: Set("front".into()),
            user_id: Set("user-1".into()),
            election_id: Set("election-1".into()),
            file_name: Set("stuck.mp4".into()),
            file_id: Set(None),
            status: Set(status.into()),
            created_at: Set(Utc::now()),
        };
        row.insert(&app.db).await.expect("insert record");
    }

    let response = app
        .client
        .get(app.url("/api/v1/videos/session-stuck/front"))
        .send()
        .await
        .expect("fetch request");
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn duplicate_uploads_serve_the_newest() {
    let app = TestApp::spawn().await;
    let first = pattern(2048);
    let second: Vec<u8> = pattern(4096).into_iter().rev().collect();

    for data in [first, second.clone()] {
        let response = app
            .client
            .post(app.url("/api/v1/videos"))
            .multipart(video_form(data, "take.mp4", "session-dup", "front"))
            .send()
            .await
            .expect("upload request");
        assert_eq!(response.status(), 201);
        // created_at has millisecond precision; keep the two rows apart.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let fetched = app
        .client
        .get(app.url("/api/v1/videos/session-dup/front"))
        .send()
        .await
        .expect("fetch request");
    assert_eq!(fetched.status(), 200);
    let bytes = fetched.bytes().await.expect("fetch body");
    assert_eq!(bytes.as_ref(), second.as_slice());
}

#[tokio::test]
async fn duplicate_file_fields_are_rejected() {
    let app = TestApp::spawn().await;

    let first = reqwest::multipart::Part::bytes(pattern(512))
        .file_name("one.mp4")
        .mime_str("video/mp4")
        .expect("valid mime");
    let second = reqwest::multipart::Part::bytes(pattern(1024))
        .file_name("two.mp4")
        .mime_str("video/mp4")
        .expect("valid mime");
    let form = reqwest::multipart::Form::new()
        .part("file", first)
        .part("file", second)
        .text("sessionId", "session-twice")
        .text("cameraType", "front")
        .text("userId", "user-1")
        .text("electionId", "election-1");

    let response = app
        .client
        .post(app.url("/api/v1/videos"))
        .multipart(form)
        .send()
        .await
        .expect("upload request");
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // Nothing retrievable was left behind for the pair.
    let fetched = app
        .client
        .get(app.url("/api/v1/videos/session-twice/front"))
        .send()
        .await
        .expect("fetch request");
    assert_eq!(fetched.status(), 404);
}

#[tokio::test]
async fn created_at_ties_resolve_by_record_id() {
    let app = TestApp::spawn().await;
    let older_bytes = pattern(1024);
    let newer_bytes: Vec<u8> = pattern(2048).into_iter().rev().collect();

    let mut ids = [Uuid::now_v7(), Uuid::now_v7()];
    ids.sort();
    let created_at = Utc::now();

    for (id, data) in [(ids[0], &older_bytes), (ids[1], &newer_bytes)] {
        let mut upload = app
            .blob_store
            .open_upload_stream("tie.mp4", serde_json::json!({}), None)
            .await
            .expect("open upload");
        upload.write(data).await.expect("write blob");
        let file = upload.close().await.expect("close blob");

        let row = video_record::ActiveModel {
            id: Set(id),
            session_id: Set("session-tie".into()),
            camera_type: Set("front".into()),
            user_id: Set("user-1".into()),
            election_id: Set("election-1".into()),
            file_name: Set("tie.mp4".into()),
            file_id: Set(Some(file.id.to_string())),
            status: Set("completed".into()),
            created_at: Set(created_at),
        };
        row.insert(&app.db).await.expect("insert record");
    }

    let fetched = app
        .client
        .get(app.url("/api/v1/videos/session-tie/front"))
        .send()
        .await
        .expect("fetch request");
    assert_eq!(fetched.status(), 200);
    let bytes = fetched.bytes().await.expect("fetch body");
    assert_eq!(bytes.as_ref(), newer_bytes.as_slice());
}

#[tokio::test]
async fn missing_blob_is_an_integrity_error() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/v1/videos"))
        .multipart(video_form(pattern(1024), "gone.mp4", "session-gone", "front"))
        .send()
        .await
        .expect("upload request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("upload body");
    let file_id = BlobId::parse(body["file_id"].as_str().expect("file_id")).expect("blob id");

    // Rip the blob out from under the completed record.
    assert!(app.blob_store.delete(file_id).await.expect("delete blob"));

    let fetched = app
        .client
        .get(app.url("/api/v1/videos/session-gone/front"))
        .send()
        .await
        .expect("fetch request");
    assert_eq!(fetched.status(), 404);

    let error: Value = fetched.json().await.expect("error body");
    assert_eq!(error["code"], "INTEGRITY_ERROR");
}
