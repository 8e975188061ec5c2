//! Integration tests for the card and design API surface.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use card_core::{BaseLayer, DesignerDocument, ImageLayer, Layer, LayerId, TextAlign, TextLayer};

use common::{create_card, empty_request, json_request, raw_request, send, test_app, tiny_png};

fn sample_design(image_src: &str) -> serde_json::Value {
    let mut design = DesignerDocument::new();
    design.faces.front.layers.push(Layer::Text(TextLayer {
        base: BaseLayer::at(LayerId::from("t1"), 100.0, 120.0),
        text: "Happy Birthday".to_string(),
        font_family: "serif".to_string(),
        font_size: 96.0,
        color: "#aa2233".to_string(),
        align: TextAlign::Center,
        font_weight: Some(700),
        line_height: None,
        letter_spacing: None,
        shadow_color: None,
        shadow_blur: None,
        shadow_offset_x: None,
        shadow_offset_y: None,
        stroke_color: None,
        stroke_width: None,
    }));
    design.faces.inside_left.layers.push(Layer::Image(ImageLayer {
        base: BaseLayer::at(LayerId::from("i1"), 200.0, 300.0),
        src: image_src.to_string(),
        width: Some(600.0),
        height: Some(400.0),
        crop: None,
    }));
    serde_json::to_value(design).expect("design value")
}

#[tokio::test]
async fn test_requests_without_user_are_unauthorized() {
    let app = test_app();
    let (status, _) = send(
        &app.router,
        json_request("POST", "/api/cards", None, &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, empty_request("GET", "/api/cards", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_card_seeds_empty_design() {
    let app = test_app();
    let card_id = create_card(&app, "u1", "First Card").await;

    let (status, design) = send(
        &app.router,
        empty_request("GET", &format!("/api/cards/{card_id}/design"), Some("u1")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(design["meta"]["version"], 1);
    assert_eq!(design["meta"]["width"], 1536);
    assert_eq!(design["meta"]["height"], 2048);
    for face in ["front", "inside_left", "inside_right"] {
        assert_eq!(design["faces"][face]["layers"], json!([]));
    }
}

#[tokio::test]
async fn test_create_card_defaults_title() {
    let app = test_app();
    let (status, card) = send(
        &app.router,
        json_request("POST", "/api/cards", Some("u1"), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(card["title"].as_str(), Some("Untitled Card"));
}

#[tokio::test]
async fn test_design_round_trip() {
    let app = test_app();
    let card_id = create_card(&app, "u1", "Round Trip").await;
    let design = sample_design("cards/u1/c1/assets/photo.png");

    let (status, body) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/cards/{card_id}/design"),
            Some("u1"),
            &design,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "save failed: {body}");

    let (status, stored) = send(
        &app.router,
        empty_request("GET", &format!("/api/cards/{card_id}/design"), Some("u1")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Replaced wholesale: stored value equals what was sent.
    assert_eq!(stored, design);
}

#[tokio::test]
async fn test_unknown_version_is_rejected() {
    let app = test_app();
    let card_id = create_card(&app, "u1", "Future").await;

    let mut design = sample_design("cards/u1/c1/assets/photo.png");
    design["meta"]["version"] = json!(99);

    let (status, body) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/cards/{card_id}/design"),
            Some("u1"),
            &design,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        body["error"]
            .as_str()
            .expect("error message")
            .contains("version"),
        "unexpected error: {body}"
    );

    // Nothing was written: the stored design is still the empty v1 one.
    let (_, stored) = send(
        &app.router,
        empty_request("GET", &format!("/api/cards/{card_id}/design"), Some("u1")),
    )
    .await;
    assert_eq!(stored["faces"]["front"]["layers"], json!([]));
}

#[tokio::test]
async fn test_signed_url_src_is_rejected() {
    let app = test_app();
    let card_id = create_card(&app, "u1", "Leaky").await;
    let design = sample_design("https://cdn.example.com/sign/photo.png?token=secret");

    let (status, _) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/cards/{card_id}/design"),
            Some("u1"),
            &design,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_foreign_design_reads_are_not_found() {
    let app = test_app();
    let card_id = create_card(&app, "u1", "Private").await;

    let (status, body) = send(
        &app.router,
        empty_request("GET", &format!("/api/cards/{card_id}/design"), Some("u2")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn test_asset_upload_returns_stable_path() {
    let app = test_app();
    let card_id = create_card(&app, "u1", "With Asset").await;

    let (status, body) = send(
        &app.router,
        raw_request(
            "POST",
            &format!("/api/cards/{card_id}/assets?ext=png"),
            Some("u1"),
            tiny_png(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "upload failed: {body}");

    let path = body["path"].as_str().expect("path");
    assert!(path.starts_with(&format!("cards/u1/{card_id}/assets/")));
    assert!(path.ends_with(".png"));
}

#[tokio::test]
async fn test_asset_upload_rejects_bad_extension() {
    let app = test_app();
    let card_id = create_card(&app, "u1", "Sketchy").await;

    let (status, _) = send(
        &app.router,
        raw_request(
            "POST",
            &format!("/api/cards/{card_id}/assets?ext=exe"),
            Some("u1"),
            vec![0; 16],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_design_export_flow() {
    let app = test_app();
    let card_id = create_card(&app, "u1", "Full Flow").await;

    // Upload a real asset and reference it from the design.
    let (_, upload) = send(
        &app.router,
        raw_request(
            "POST",
            &format!("/api/cards/{card_id}/assets?ext=png"),
            Some("u1"),
            tiny_png(),
        ),
    )
    .await;
    let asset_path = upload["path"].as_str().expect("path").to_string();

    let design = sample_design(&asset_path);
    let (status, _) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/cards/{card_id}/design"),
            Some("u1"),
            &design,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, record) = send(
        &app.router,
        empty_request("POST", &format!("/api/cards/{card_id}/export"), Some("u1")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "export failed: {record}");

    for (field, face) in [
        ("front_url", "front"),
        ("inside_left_url", "inside_left"),
        ("inside_right_url", "inside_right"),
    ] {
        assert_eq!(
            record[field].as_str().expect("face path"),
            format!("cards/u1/{card_id}/faces/{face}.png")
        );
    }
}

#[tokio::test]
async fn test_list_cards_newest_first() {
    let app = test_app();
    create_card(&app, "u1", "One").await;
    create_card(&app, "u1", "Two").await;
    create_card(&app, "u2", "Other").await;

    let (status, body) = send(&app.router, empty_request("GET", "/api/cards", Some("u1"))).await;
    assert_eq!(status, StatusCode::OK);
    let cards = body.as_array().expect("array");
    assert_eq!(cards.len(), 2);
}

#[tokio::test]
async fn test_health_probes() {
    let app = test_app();
    let (status, _) = send(&app.router, empty_request("GET", "/health/live", None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app.router, empty_request("GET", "/health/ready", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"].as_str(), Some("healthy"));
}
