//! Read-only JSON endpoints for a browser map page.

use actix_web::{get, http::StatusCode, web, App, HttpResponse, HttpServer, ResponseError};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    export,
    filter::{format_time_input, TimeWindow, ValidationError},
    sample::Sample,
    store::Trajectory,
};

impl ResponseError for ValidationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::BadRequest().json(json!({
            "error": {
                "reason": self.reason(),
                "message": self.to_string(),
                "code": 400,
            }
        }))
    }
}

#[derive(Debug, Deserialize)]
struct FilterQuery {
    start: Option<String>,
    end: Option<String>,
}

fn samples_response(trajectory: &Trajectory, visible: &[Sample]) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "stats": trajectory.stats(visible),
        "samples": visible,
    }))
}

#[get("/v1/trajectory")]
async fn trajectory_service(trajectory: web::Data<Trajectory>) -> HttpResponse {
    samples_response(&trajectory, trajectory.get_all())
}

#[get("/v1/trajectory/filter")]
async fn filter_service(
    trajectory: web::Data<Trajectory>,
    query: web::Query<FilterQuery>,
) -> Result<HttpResponse, ValidationError> {
    let window = TimeWindow::from_inputs(query.start.as_deref(), query.end.as_deref())?;
    let visible = trajectory.filter_by_time_range(Some(window.start), Some(window.end));
    Ok(samples_response(&trajectory, visible))
}

#[get("/v1/trajectory.geojson")]
async fn geojson_service(trajectory: web::Data<Trajectory>) -> actix_web::Result<HttpResponse> {
    let body = serde_json::to_string(&export::feature_collection(trajectory.get_all()))?;
    Ok(HttpResponse::Ok()
        .content_type("application/geo+json")
        .body(body))
}

#[get("/v1/range")]
async fn range_service(trajectory: web::Data<Trajectory>) -> HttpResponse {
    let range = trajectory.get_time_range();
    HttpResponse::Ok().json(json!({
        "min": range.min,
        "max": range.max,
        "min_input": format_time_input(&range.min),
        "max_input": format_time_input(&range.max),
    }))
}

#[get("/v1/bounds")]
async fn bounds_service(trajectory: web::Data<Trajectory>) -> HttpResponse {
    HttpResponse::Ok().json(trajectory.get_bounds())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(trajectory_service)
        .service(filter_service)
        .service(geojson_service)
        .service(range_service)
        .service(bounds_service);
}

pub async fn run(trajectory: Trajectory, port: u16) -> Result<()> {
    let trajectory = web::Data::new(trajectory);
    info!(port, points = trajectory.len(), "serving trajectory");

    HttpServer::new(move || App::new().app_data(trajectory.clone()).configure(configure))
        .bind(("0.0.0.0", port))
        .with_context(|| format!("Failed to bind port {port}"))?
        .run()
        .await?;
    Ok(())
}
