use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{energy, ledger, meals, profile};

pub fn build_app(state: AppState) -> Router {
    let max_upload = state.config.max_upload_bytes;
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(profile::router())
                .merge(energy::router())
                .merge(ledger::router())
                .merge(meals::router(max_upload))
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod app_tests {
    use super::*;
    use crate::errors::{TrackerError, TrackerResult};
    use crate::estimation::{CalorieEstimationDraft, EstimationClient, FoodItemBreakdown};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use bytes::Bytes;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct FixedEstimator;

    #[async_trait]
    impl EstimationClient for FixedEstimator {
        async fn estimate_from_text(&self, description: &str) -> TrackerResult<CalorieEstimationDraft> {
            if description == "offline" {
                return Err(TrackerError::ServiceUnavailable("not configured".into()));
            }
            Ok(CalorieEstimationDraft {
                description: format!("Estimated: {}", description),
                total_calories: 420,
                breakdown: vec![FoodItemBreakdown { item: description.into(), calories: 420 }],
            })
        }

        async fn estimate_from_image(
            &self,
            _bytes: Bytes,
            _mime_type: &str,
        ) -> TrackerResult<CalorieEstimationDraft> {
            Ok(CalorieEstimationDraft {
                description: "Photo meal".into(),
                total_calories: 600,
                breakdown: vec![],
            })
        }
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn app() -> Router {
        build_app(AppState::fake(Arc::new(FixedEstimator)))
    }

    #[tokio::test]
    async fn onboarding_then_activity_sets_burned() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/api/v1/onboarding", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "required");

        let (status, _) = call(&app, Method::POST, "/api/v1/activity", Some(json!({"level": "Sedentary"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let profile = json!({"name": "Alex", "age": 30, "gender": "male", "weight": 75.0, "height": 180.0});
        let (status, _) = call(&app, Method::PUT, "/api/v1/profile", Some(profile)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&app, Method::GET, "/api/v1/onboarding", None).await;
        assert_eq!(body["status"], "complete");

        let (status, body) =
            call(&app, Method::POST, "/api/v1/activity", Some(json!({"level": "VeryActive"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["caloriesBurned"], 2984);
        assert_eq!(body["balance"], -2984);
        assert_eq!(body["balanceStatus"]["kind"], "deficit");
    }

    #[tokio::test]
    async fn invalid_profile_is_bad_request() {
        let app = app();
        let profile = json!({"name": "", "age": 30, "gender": "female", "weight": 60.0, "height": 165.0});
        let (status, body) = call(&app, Method::PUT, "/api/v1/profile", Some(profile)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn estimate_edit_commit_flow() {
        let app = app();
        let (status, _) = call(&app, Method::PUT, "/api/v1/meals/input/text", Some(json!({"content": "pizza"}))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, Method::POST, "/api/v1/meals/estimate", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "pendingConfirmation");
        assert_eq!(body["draft"]["totalCalories"], 420);

        let (status, body) =
            call(&app, Method::PATCH, "/api/v1/meals/draft", Some(json!({"totalCalories": 0}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalCalories"], 0);

        let (status, _) = call(&app, Method::POST, "/api/v1/meals/draft/commit", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        call(&app, Method::PATCH, "/api/v1/meals/draft", Some(json!({"totalCalories": 500, "description": "Pizza slice"}))).await;
        let (status, body) = call(&app, Method::POST, "/api/v1/meals/draft/commit", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["caloriesConsumed"], 500);
        assert_eq!(body["foodEntries"][0]["description"], "Pizza slice");
        assert!(body["balance"].is_null());

        let (_, body) = call(&app, Method::GET, "/api/v1/days/today", None).await;
        assert_eq!(body["caloriesConsumed"], 500);
        let (_, body) = call(&app, Method::GET, "/api/v1/meals/draft", None).await;
        assert_eq!(body["phase"], "idle");
        assert!(body["input"].is_null());
    }

    #[tokio::test]
    async fn unavailable_service_keeps_input() {
        let app = app();
        call(&app, Method::PUT, "/api/v1/meals/input/text", Some(json!({"content": "offline"}))).await;
        let (status, body) = call(&app, Method::POST, "/api/v1/meals/estimate", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "service_unavailable");

        let (_, body) = call(&app, Method::GET, "/api/v1/meals/draft", None).await;
        assert_eq!(body["phase"], "idle");
        assert_eq!(body["text"], "offline");
    }

    #[tokio::test]
    async fn image_upload_replaces_text() {
        let app = app();
        call(&app, Method::PUT, "/api/v1/meals/input/text", Some(json!({"content": "soup"}))).await;

        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"meal.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nJPEGDATA\r\n--{b}--\r\n",
            b = boundary
        );
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/meals/input/image")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let snap: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(snap["input"], "image");
        assert_eq!(snap["image"]["mimeType"], "image/jpeg");
        assert_eq!(snap["image"]["size"], 8);
        assert!(snap["text"].is_null());

        let (_, body) = call(&app, Method::POST, "/api/v1/meals/estimate", None).await;
        assert_eq!(body["draft"]["description"], "Photo meal");
    }

    #[tokio::test]
    async fn bad_date_and_history_views() {
        let app = app();
        let (status, _) = call(&app, Method::GET, "/api/v1/days/not-a-date", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, Method::GET, "/api/v1/days/2024-01-02", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["date"], "2024-01-02");
        assert!(body["caloriesBurned"].is_null());

        let (status, body) = call(&app, Method::GET, "/api/v1/history?view=monthly", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());

        let (_, body) = call(&app, Method::GET, "/api/v1/activity-levels", None).await;
        assert_eq!(body.as_array().unwrap().len(), 5);
        assert_eq!(body[4]["multiplier"], 1.9);
    }
}
