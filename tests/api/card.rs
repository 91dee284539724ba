use serde_json::Value;

use crate::helpers::spawn_app;

#[tokio::test]
async fn card_page_shows_the_member_and_a_qr_code() {
    let app = spawn_app().await;
    app.api_scan("NOEL JHUMEL G. BLANCO 2024300617 BSIT").await;

    let response = app.get_card("2024300617").await;

    assert_eq!(response.status().as_u16(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("NOEL JHUMEL G. BLANCO"));
    assert!(body.contains("2024300617"));
    assert!(body.contains("BSIT"));
    assert!(body.contains("<svg"));
    assert!(body.contains("Scan for verification"));
}

#[tokio::test]
async fn card_qr_code_encodes_the_stored_card_link() {
    let app = spawn_app().await;
    let student: Value = app
        .api_scan("NOEL JHUMEL G. BLANCO 2024300617 BSIT")
        .await
        .json()
        .await
        .unwrap();
    let link = student["digital_card_link"].as_str().unwrap();
    assert_eq!(link, format!("{}/card/2024300617", app.address));

    let body = app.get_card("2024300617").await.text().await.unwrap();

    let expected = membercard::card::qr_svg(link).unwrap();
    assert!(body.contains(&expected), "card page does not embed the QR code of {link}");
}

#[tokio::test]
async fn card_page_reflects_edits_made_after_it_was_viewed() {
    let app = spawn_app().await;
    let student: Value = app
        .api_scan("ANA REYES 2021555444 BSIT")
        .await
        .json()
        .await
        .unwrap();
    assert!(app.get_card("2021555444").await.text().await.unwrap().contains("ANA REYES"));
    // Viewed twice so the second read can come from the card cache.
    assert!(app.get_card("2021555444").await.text().await.unwrap().contains("ANA REYES"));

    let response = app
        .client
        .post(app.url(&format!("/students/{}/edit", student["id"].as_str().unwrap())))
        .form(&[
            ("full_name", "ANA M. REYES"),
            ("school_id", "2021555444"),
            ("program", "BSCS"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body = app.get_card("2021555444").await.text().await.unwrap();
    assert!(body.contains("ANA M. REYES"));
    assert!(body.contains("BSCS"));
}

#[tokio::test]
async fn unknown_card_renders_the_not_found_page() {
    let app = spawn_app().await;

    let response = app.get_card("9999999999").await;

    assert_eq!(response.status().as_u16(), 404);
    assert!(response.text().await.unwrap().contains("Card Not Found"));
}

#[tokio::test]
async fn card_page_is_public_and_needs_no_navigation() {
    let app = spawn_app().await;
    app.api_scan("ANA REYES 2021555444 BSIT").await;

    let body = app.get_card("2021555444").await.text().await.unwrap();

    assert!(!body.contains("href=\"/dashboard\""));
}
