use sea_orm::EntityTrait;
use serde_json::Value;
use uuid::Uuid;

use server::entity::image;

use crate::common::{TestApp, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_stores_blob_and_metadata() {
        let app = TestApp::spawn().await;
        let data = vec![7u8; 500];

        let res = app.upload("cat.png", data.clone()).await;
        assert_eq!(res.status(), 201);

        let body: Value = res.json().await.unwrap();
        assert_eq!(body["name"].as_str().unwrap(), "cat.png");
        assert_eq!(body["extension"].as_str().unwrap(), "png");
        assert_eq!(body["size"].as_i64().unwrap(), 500);
        let uuid = body["uuid"].as_str().unwrap();
        Uuid::parse_str(uuid).expect("uuid field must be a valid UUID");
        assert!(body["created_at"].as_str().is_some());
        assert!(body["updated_at"].as_str().is_some());

        // The blob is on disk under a date directory, keyed by the uuid.
        let files = app.stored_files();
        assert_eq!(files.len(), 1);
        let file_name = files[0].file_name().unwrap().to_str().unwrap();
        assert_eq!(file_name, format!("{uuid}.png"));
        assert_eq!(std::fs::read(&files[0]).unwrap(), data);
    }

    #[tokio::test]
    async fn upload_rejects_disallowed_extension() {
        let app = TestApp::spawn().await;

        let res = app.upload("virus.exe", b"MZ".to_vec()).await;
        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["code"].as_str().unwrap(), "INVALID_EXTENSION");

        // Nothing written, nothing recorded.
        assert!(app.stored_files().is_empty());
        let records = image::Entity::find().all(&app.db).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_missing_extension() {
        let app = TestApp::spawn().await;

        let res = app.upload("noextension", b"data".to_vec()).await;
        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["code"].as_str().unwrap(), "INVALID_EXTENSION");
    }

    #[tokio::test]
    async fn upload_normalizes_extension_case() {
        let app = TestApp::spawn().await;

        let res = app.upload("photo.JPG", b"JPEG".to_vec()).await;
        assert_eq!(res.status(), 201);

        let body: Value = res.json().await.unwrap();
        assert_eq!(body["extension"].as_str().unwrap(), "jpg");
        // Original name is kept verbatim.
        assert_eq!(body["name"].as_str().unwrap(), "photo.JPG");
    }

    #[tokio::test]
    async fn duplicate_names_get_distinct_identifiers() {
        let app = TestApp::spawn().await;

        let res1 = app.upload("cat.png", b"first".to_vec()).await;
        let res2 = app.upload("cat.png", b"second".to_vec()).await;
        assert_eq!(res1.status(), 201);
        assert_eq!(res2.status(), 201);

        let body1: Value = res1.json().await.unwrap();
        let body2: Value = res2.json().await.unwrap();
        assert_ne!(
            body1["uuid"].as_str().unwrap(),
            body2["uuid"].as_str().unwrap()
        );
        assert_ne!(
            body1["path"].as_str().unwrap(),
            body2["path"].as_str().unwrap()
        );

        // Neither overwrote the other.
        assert_eq!(app.stored_files().len(), 2);
        let bytes1 = app
            .get(&routes::image(body1["uuid"].as_str().unwrap()))
            .await
            .bytes()
            .await
            .unwrap();
        let bytes2 = app
            .get(&routes::image(body2["uuid"].as_str().unwrap()))
            .await
            .bytes()
            .await
            .unwrap();
        assert_eq!(bytes1.as_ref(), b"first");
        assert_eq!(bytes2.as_ref(), b"second");
    }

    #[tokio::test]
    async fn upload_without_file_field_is_rejected() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new().text("note", "no file here");
        let res = app
            .client
            .post(app.url(routes::IMAGES))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["code"].as_str().unwrap(), "VALIDATION_ERROR");
    }
}

mod download {
    use super::*;

    #[tokio::test]
    async fn download_round_trips_uploaded_bytes() {
        let app = TestApp::spawn().await;
        let data = vec![42u8; 500];

        let uploaded: Value = app.upload("cat.png", data.clone()).await.json().await.unwrap();
        let uuid = uploaded["uuid"].as_str().unwrap();

        let res = app.get(&routes::image(uuid)).await;
        assert_eq!(res.status(), 200);
        assert_eq!(
            res.headers()["content-type"].to_str().unwrap(),
            "image/png"
        );
        assert_eq!(res.headers()["content-length"].to_str().unwrap(), "500");
        let disposition = res.headers()["content-disposition"].to_str().unwrap();
        assert!(disposition.contains("filename=\"cat.png\""));

        let bytes = res.bytes().await.unwrap();
        assert_eq!(bytes.as_ref(), data.as_slice());
    }

    #[tokio::test]
    async fn download_unknown_uuid_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::image(&Uuid::new_v4().to_string())).await;
        assert_eq!(res.status(), 404);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["code"].as_str().unwrap(), "IMAGE_NOT_FOUND");
    }

    #[tokio::test]
    async fn download_malformed_uuid_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::image("not-a-uuid")).await;
        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["code"].as_str().unwrap(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn missing_stored_file_is_an_integrity_error() {
        let app = TestApp::spawn().await;

        let uploaded: Value = app.upload("cat.png", b"bytes".to_vec()).await.json().await.unwrap();
        let uuid = uploaded["uuid"].as_str().unwrap();

        // Delete the blob behind the record's back.
        for file in app.stored_files() {
            std::fs::remove_file(file).unwrap();
        }

        let res = app.get(&routes::image(uuid)).await;
        assert_eq!(res.status(), 500);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["code"].as_str().unwrap(), "STORED_FILE_MISSING");
    }
}

mod info {
    use super::*;

    #[tokio::test]
    async fn info_returns_metadata_without_bytes() {
        let app = TestApp::spawn().await;

        let uploaded: Value = app.upload("cat.png", vec![1u8; 64]).await.json().await.unwrap();
        let uuid = uploaded["uuid"].as_str().unwrap();

        let res = app.get(&routes::image_info(uuid)).await;
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["uuid"].as_str().unwrap(), uuid);
        assert_eq!(body["name"].as_str().unwrap(), "cat.png");
        assert_eq!(body["size"].as_i64().unwrap(), 64);
        assert_eq!(body["extension"].as_str().unwrap(), "png");
    }

    #[tokio::test]
    async fn info_unknown_uuid_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::image_info(&Uuid::new_v4().to_string())).await;
        assert_eq!(res.status(), 404);
    }
}
