//! Route tests driving the router in-process.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use qti_preview_core::{FsItemResolver, PreviewConfig, StaticLabelResolver};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use qti_preview_server::{create_router, AppState};

fn package() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for id in ["i1", "i2", "i3"] {
        std::fs::write(
            dir.path().join(format!("{id}.json")),
            json!({
                "type": "qti",
                "data": { "identifier": id, "body": format!("<p>{id}</p>") },
                "assets": {}
            })
            .to_string(),
        )
        .unwrap();
    }
    dir
}

fn app(package: &TempDir) -> Router {
    let config = PreviewConfig::from_yaml_str(concat!(
        "categoryPresets:\n",
        "  - optionId: endTestWarning\n",
        "    categoryId: x-tao-option-endTestWarning\n",
    ))
    .unwrap();
    let labels = StaticLabelResolver::new().with_label("http://bank/i1", "Item one");
    let items = Arc::new(FsItemResolver::new(package.path()));
    create_router(AppState::new(config, labels, items))
}

fn document() -> Value {
    let entry = |item: &str, section: &str, part: &str| {
        let categories: Vec<&str> = if item == "i3" {
            vec!["x-tao-option-endTestWarning"]
        } else {
            Vec::new()
        };
        json!({
            "itemRef": {
                "identifier": item,
                "href": format!("http://bank/{item}"),
                "categories": categories
            },
            "section": { "identifier": section, "title": format!("Section {section}") },
            "part": { "identifier": part, "navigationMode": "nonlinear" }
        })
    };
    json!({
        "test": { "identifier": "test-1", "title": "Biology" },
        "route": [
            entry("i1", "s1", "p1"),
            entry("i2", "s1", "p1"),
            entry("i3", "s2", "p2"),
        ]
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn open_preview(app: &Router) -> (String, Value) {
    let (status, body) = send(app, "POST", "/api/previews", Some(document())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let session_id = body["data"]["sessionId"].as_str().unwrap().to_string();
    (session_id, body["data"].clone())
}

#[tokio::test]
async fn health_check() {
    let package = package();
    let (status, body) = send(&app(&package), "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], "OK");
}

#[tokio::test]
async fn create_preview_returns_map_and_context() {
    let package = package();
    let app = app(&package);
    let (_, data) = open_preview(&app).await;

    assert_eq!(data["testContext"]["itemIdentifier"], "i1");
    assert_eq!(data["testContext"]["itemPosition"], 0);
    assert_eq!(data["testContext"]["state"], 1);
    assert_eq!(data["testMap"]["scope"], "test");
    assert_eq!(data["testMap"]["stats"]["total"], 3);
    assert_eq!(
        data["testMap"]["parts"]["p1"]["sections"]["s1"]["items"]["i1"]["label"],
        "Item one"
    );
    assert_eq!(
        data["testMap"]["parts"]["p1"]["sections"]["s1"]["items"]["i2"]["label"],
        ""
    );
}

#[tokio::test]
async fn malformed_route_is_rejected() {
    let package = package();
    let app = app(&package);
    let mut document = document();
    document["route"][1]["itemRef"]
        .as_object_mut()
        .unwrap()
        .remove("href");

    let (status, body) = send(&app, "POST", "/api/previews", Some(document)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("href"));

    let (_, listing) = send(&app, "GET", "/api/previews", None).await;
    assert_eq!(listing["data"], json!([]));
}

#[tokio::test]
async fn items_are_served_from_the_package() {
    let package = package();
    let app = app(&package);
    let (id, _) = open_preview(&app).await;

    let (status, body) = send(&app, "GET", &format!("/api/previews/{id}/items/i2"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["itemData"]["type"], "qti");
    assert_eq!(body["data"]["itemData"]["data"]["identifier"], "i2");

    let (status, _) = send(&app, "GET", &format!("/api/previews/{id}/items/ghost"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn every_occurrence_of_a_repeated_item_is_served() {
    let package = package();
    let app = app(&package);
    let mut document = document();
    let repeat = document["route"][2].clone();
    document["route"].as_array_mut().unwrap().push(repeat);

    let (status, body) = send(&app, "POST", "/api/previews", Some(document)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["data"]["sessionId"].as_str().unwrap();
    let items = &body["data"]["testMap"]["parts"]["p2"]["sections"]["s2"]["items"];
    assert_eq!(items["i3.1"]["occurrence"], 1);

    for item in ["i3", "i3.1"] {
        let uri = format!("/api/previews/{id}/items/{item}");
        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK, "{item}: {body}");
        assert_eq!(body["data"]["itemData"]["data"]["identifier"], "i3");
    }
}

#[tokio::test]
async fn actions_navigate_and_warn_before_the_end() {
    let package = package();
    let app = app(&package);
    let (id, _) = open_preview(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/previews/{id}/items/i1/action"),
        Some(json!({
            "action": "move",
            "direction": "next",
            "scope": "testPart",
            "itemState": { "RESPONSE": { "base": null } }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let data = &body["data"];
    assert_eq!(data["testContext"]["itemIdentifier"], "i3");
    assert_eq!(data["testContext"]["testPartId"], "p2");
    assert_eq!(data["testContext"]["options"]["endTestWarning"], true);
    assert_eq!(data["warning"]["scope"], "test");
    assert_eq!(data["warning"]["unanswered"], 3);

    let (_, position) = send(
        &app,
        "GET",
        &format!("/api/previews/{id}/context/getCurrentPosition"),
        None,
    )
    .await;
    assert_eq!(position["data"], 2);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/previews/{id}/items/i3/action"),
        Some(json!({ "direction": "next" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["testContext"]["state"], 4);
    assert_eq!(body["data"]["testContext"]["itemPosition"], 2);
}

#[tokio::test]
async fn out_of_range_jump_is_a_bad_request() {
    let package = package();
    let app = app(&package);
    let (id, _) = open_preview(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/previews/{id}/items/i1/action"),
        Some(json!({ "direction": "jump", "ref": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("out of range"));

    let (_, body) = send(&app, "GET", &format!("/api/previews/{id}"), None).await;
    assert_eq!(body["data"]["testContext"]["itemPosition"], 0);
}

#[tokio::test]
async fn context_methods_by_host_name() {
    let package = package();
    let app = app(&package);
    let (id, _) = open_preview(&app).await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/previews/{id}/context/isAdaptive"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], false);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/previews/{id}/context/getCatEngine"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], Value::Null);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/previews/{id}/context/launchRocket"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn destroyed_preview_is_gone() {
    let package = package();
    let app = app(&package);
    let (id, _) = open_preview(&app).await;

    let (status, _) = send(&app, "DELETE", &format!("/api/previews/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/previews/{id}/items/i1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/api/previews/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
