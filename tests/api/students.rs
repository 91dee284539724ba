use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::helpers::{spawn_app, spawn_app_without_database};

#[tokio::test]
async fn dashboard_lists_registered_students() {
    let app = spawn_app().await;
    app.api_scan("MARIA CLARA 2023100001 BSCS").await;

    let response = app.client.get(app.url("/dashboard")).send().await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("MARIA CLARA"));
    assert!(body.contains("2023100001"));
    assert!(body.contains("Page 1 of 1"));
}

#[tokio::test]
async fn manual_add_derives_the_card_link() {
    let app = spawn_app().await;

    let response = app.post_student("JOHN SMITH DOE", "2024000001", "BSIT").await;

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await.unwrap().contains("Student added successfully"));
    let student: Value = app.api_student("2024000001").await.json().await.unwrap();
    assert_eq!(
        student["digital_card_link"].as_str().unwrap(),
        format!("{}/card/2024000001", app.address)
    );
}

#[tokio::test]
async fn manual_add_with_a_taken_school_id_surfaces_the_storage_error() {
    let app = spawn_app().await;
    app.post_student("FIRST", "2024000001", "BSIT").await;

    let response = app.post_student("SECOND", "2024000001", "BSIT").await;

    assert_eq!(response.status().as_u16(), 502);
    let body = response.text().await.unwrap();
    assert!(body.contains("Error adding student"));
    assert!(body.contains("duplicate key value violates unique constraint"));

    let student: Value = app.api_student("2024000001").await.json().await.unwrap();
    assert_eq!(student["full_name"], "FIRST");
}

#[tokio::test]
async fn manual_add_rejects_a_malformed_school_id() {
    let app = spawn_app().await;

    let response = app.post_student("JOHN", "20240", "BSIT").await;

    assert_eq!(response.status().as_u16(), 422);
    assert_eq!(app.api_list("").await["pagination"]["total"], 0);
}

#[tokio::test]
async fn editing_updates_fields_but_keeps_the_stored_link() {
    let app = spawn_app().await;
    let created: Value = app.api_scan("JANE DOE 1234567890 BSIT").await.json().await.unwrap();
    let id = created["id"].as_str().unwrap();

    let edit_page = app
        .client
        .get(app.url(&format!("/students/{id}/edit")))
        .send()
        .await
        .unwrap();
    assert_eq!(edit_page.status().as_u16(), 200);
    assert!(edit_page.text().await.unwrap().contains(r#"value="JANE DOE""#));

    let response = app
        .client
        .post(app.url(&format!("/students/{id}/edit")))
        .form(&[
            ("full_name", "JANE Q. DOE"),
            ("school_id", "1234567899"),
            ("program", "BSCS"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let edited: Value = app.api_student("1234567899").await.json().await.unwrap();
    assert_eq!(edited["full_name"], "JANE Q. DOE");
    assert_eq!(edited["program"], "BSCS");
    assert_eq!(edited["created_at"], created["created_at"]);
    assert_eq!(
        edited["digital_card_link"].as_str().unwrap(),
        format!("{}/card/1234567890", app.address)
    );
    assert_eq!(app.api_student("1234567890").await.status().as_u16(), 404);
}

#[tokio::test]
async fn editing_an_unknown_student_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url(&format!("/students/{}/edit", uuid::Uuid::nil())))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body = response.text().await.unwrap();
    assert!(body.contains("message-error"));
    assert!(body.contains("Student not found"));
}

#[tokio::test]
async fn edit_page_storage_failure_is_an_html_page() {
    let app = spawn_app_without_database().await;

    let response = app
        .client
        .get(app.url(&format!("/students/{}/edit", uuid::Uuid::new_v4())))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 502);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_owned();
    assert!(content_type.starts_with("text/html"), "got {content_type}");
    assert!(response.text().await.unwrap().contains("message-error"));
}

#[tokio::test]
async fn deleting_removes_the_student_from_the_listing_and_its_card() {
    let app = spawn_app().await;
    let created: Value = app.api_scan("JANE DOE 1234567890 BSIT").await.json().await.unwrap();
    let id = created["id"].as_str().unwrap();
    assert_eq!(app.get_card("1234567890").await.status().as_u16(), 200);

    let response = app
        .client
        .post(app.url(&format!("/students/{id}/delete")))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await.unwrap().contains("deleted successfully"));
    assert_eq!(app.api_list("").await["pagination"]["total"], 0);
    assert_eq!(app.get_card("1234567890").await.status().as_u16(), 404);
}

#[tokio::test]
async fn api_delete_returns_no_content_then_not_found() {
    let app = spawn_app().await;
    let created: Value = app.api_scan("JANE DOE 1234567890 BSIT").await.json().await.unwrap();
    let url = app.url(&format!("/api/students/{}", created["id"].as_str().unwrap()));

    let first = app.client.delete(&url).send().await.unwrap();
    let second = app.client.delete(&url).send().await.unwrap();

    assert_eq!(first.status().as_u16(), 204);
    assert_eq!(second.status().as_u16(), 404);
}

#[tokio::test]
async fn api_listing_is_newest_first_and_paginated() {
    let app = spawn_app().await;
    for (name, id) in [("A", "1000000001"), ("B", "1000000002"), ("C", "1000000003")] {
        app.api_scan(&format!("{name} {id} BSIT")).await;
    }

    let page = app.api_list("?page=2&per_page=2").await;

    assert_eq!(page["pagination"]["page"], 2);
    assert_eq!(page["pagination"]["total_pages"], 2);
    assert_eq!(page["students"].as_array().unwrap().len(), 1);
    assert_eq!(page["students"][0]["full_name"], "A");

    let first = app.api_list("?per_page=2").await;
    let names: Vec<&str> = first["students"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["full_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["C", "B"]);
}
