//! OncoLens Inference Server
//!
//! HTTP API for multi-cancer image classification. Fetches the model
//! checkpoint at startup if it is not on disk, loads it once, and serves
//! predictions for uploaded images.

mod fetch;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oncolens::backend::{backend_name, default_device, DefaultBackend};
use oncolens::inference::Predictor;

use crate::state::{AppState, ServerConfig};

/// OncoLens Inference Server
#[derive(Parser, Debug)]
#[command(name = "oncolens-server")]
#[command(version)]
#[command(about = "HTTP inference server for multi-cancer image classification")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8001")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Path to the model checkpoint
    #[arg(long, env = "ONCOLENS_MODEL_PATH", default_value = "models/cancer_classifier.mpk")]
    model_path: PathBuf,

    /// URL to fetch the model from if it is not on disk
    #[arg(long, env = "ONCOLENS_MODEL_URL")]
    model_url: Option<String>,

    /// Maximum upload size in megabytes
    #[arg(long, default_value = "20")]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let config = ServerConfig {
        model_path: cli.model_path,
        model_url: cli.model_url,
        max_upload_bytes: cli.max_upload_mb * 1024 * 1024,
    };

    info!("OncoLens Inference Server v{}", env!("CARGO_PKG_VERSION"));
    info!("  Backend:    {}", backend_name());
    info!("  Model path: {:?}", config.model_path);

    // Fetch the checkpoint if it is missing, then load it exactly once
    fetch::ensure_model(&config.model_path, config.model_url.as_deref()).await?;

    info!("Loading model...");
    let device = default_device();
    let predictor = Predictor::<DefaultBackend>::load(&config.model_path, device)?;
    info!("Model loaded");

    let max_upload = config.max_upload_bytes;
    let state = Arc::new(AppState::new(config, predictor));

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/predict", post(routes::predict::predict))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use oncolens::CancerClassifierConfig;
    use tower::util::ServiceExt;

    fn test_app() -> Router {
        let device = default_device();
        let model_config = CancerClassifierConfig::new().with_base_filters(4);
        let model = oncolens::CancerClassifier::new(&model_config, &device);
        let predictor = Predictor::from_model(model, device).with_image_size(32);

        let state = Arc::new(AppState::new(ServerConfig::default(), predictor));
        Router::new()
            .route("/health", get(routes::health::health_check))
            .route("/predict", post(routes::predict::predict))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app();

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
    }

    #[tokio::test]
    async fn test_predict_without_file_part() {
        let app = test_app();

        let body = "--boundary\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--boundary--\r\n";
        let response = app
            .oneshot(
                Request::post("/predict")
                    .header("content-type", "multipart/form-data; boundary=boundary")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "No file part");
    }

    #[tokio::test]
    async fn test_predict_with_invalid_image() {
        let app = test_app();

        let body = "--boundary\r\nContent-Disposition: form-data; name=\"file\"; filename=\"x.jpg\"\r\n\r\nnot an image\r\n--boundary--\r\n";
        let response = app
            .oneshot(
                Request::post("/predict")
                    .header("content-type", "multipart/form-data; boundary=boundary")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_predict_with_valid_image() {
        let app = test_app();

        let img = image::RgbImage::from_pixel(32, 32, image::Rgb([100, 150, 200]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let mut body = Vec::new();
        body.extend_from_slice(
            b"--boundary\r\nContent-Disposition: form-data; name=\"file\"; filename=\"scan.png\"\r\nContent-Type: image/png\r\n\r\n",
        );
        body.extend_from_slice(&png);
        body.extend_from_slice(b"\r\n--boundary--\r\n");

        let response = app
            .oneshot(
                Request::post("/predict")
                    .header("content-type", "multipart/form-data; boundary=boundary")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["prediction"].is_string());
        assert!(json["description"].is_string());
        let confidence = json["confidence"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&confidence));
    }
}
