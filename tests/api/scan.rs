use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::helpers::spawn_app;

#[tokio::test]
async fn scanning_a_valid_line_shows_the_extracted_fields_without_saving() {
    let app = spawn_app().await;

    let response = app.post_scan("NOEL JHUMEL G. BLANCO 2024300617 BSIT").await;

    assert_eq!(response.status().as_u16(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Extracted Data"));
    assert!(body.contains("NOEL JHUMEL G. BLANCO"));
    assert!(body.contains(r#"name="school_id" value="2024300617""#));
    assert!(body.contains(r#"name="program" value="BSIT""#));

    assert_eq!(app.api_list("").await["pagination"]["total"], 0);
}

#[tokio::test]
async fn scanning_an_unparseable_line_reports_an_error() {
    let app = spawn_app().await;

    for raw in ["JANE DOE 1234567890", "no id here", ""] {
        let response = app.post_scan(raw).await;

        assert_eq!(response.status().as_u16(), 422, "input {raw:?}");
        let body = response.text().await.unwrap();
        assert!(body.contains("Could not extract student data"));
    }
    assert_eq!(app.api_list("").await["pagination"]["total"], 0);
}

#[tokio::test]
async fn saving_a_reviewed_scan_stores_it_with_its_card_link() {
    let app = spawn_app().await;

    let response = app.post_save("NOEL JHUMEL G. BLANCO", "2024300617", "BSIT").await;
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await.unwrap().contains("Student saved successfully"));

    let student: Value = app.api_student("2024300617").await.json().await.unwrap();
    assert_eq!(student["full_name"], "NOEL JHUMEL G. BLANCO");
    assert_eq!(student["program"], "BSIT");
    assert_eq!(
        student["digital_card_link"].as_str().unwrap(),
        format!("{}/card/2024300617", app.address)
    );
}

#[tokio::test]
async fn saving_the_same_school_id_twice_keeps_one_record() {
    let app = spawn_app().await;

    let first: Value = app.api_scan("JANE DOE 1234567890 BSIT").await.json().await.unwrap();
    let second: Value = app
        .api_scan("JANE ANNE DOE 1234567890 BSCS")
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(first["id"], second["id"]);
    let listing = app.api_list("").await;
    assert_eq!(listing["pagination"]["total"], 1);
    assert_eq!(listing["students"][0]["full_name"], "JANE ANNE DOE");
    assert_eq!(listing["students"][0]["program"], "BSCS");
}

#[tokio::test]
async fn api_scan_rejects_unparseable_text() {
    let app = spawn_app().await;

    let response = app.api_scan("JANE DOE 1234567890").await;

    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Could not extract student data"));
}

#[tokio::test]
async fn api_parse_returns_the_split_without_storing() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/parse"))
        .json(&serde_json::json!({ "raw_text": "  Juan Dela Cruz 2022000123 bsit " }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "full_name": "Juan Dela Cruz",
            "school_id": "2022000123",
            "program": "bsit",
        })
    );
    assert_eq!(app.api_list("").await["pagination"]["total"], 0);
}

#[tokio::test]
async fn tampered_review_form_is_validated() {
    let app = spawn_app().await;

    let response = app.post_save("JANE DOE", "12345", "BSIT").await;

    assert_eq!(response.status().as_u16(), 422);
    assert!(response.text().await.unwrap().contains("Error saving student"));
    assert_eq!(app.api_list("").await["pagination"]["total"], 0);
}
