//! Tests du routeur HTTP sans base de données
//!
//! Les chemins de validation échouent avant tout accès à la base; la carte est
//! testée contre de faux services vecteur et raster servis en local.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use landcover::YearRange;
use parcel_pg::store::{create_pool, DatabaseConfig};
use parcel_pg::{create_router, AppState, Settings};

const RASTER_PUBLIC: &str = "https://maps.example.com/raster";
const VECTOR_PUBLIC: &str = "https://maps.example.com/vector";

fn app(settings: Settings) -> Router {
    // Pool paresseux: aucune connexion n'est ouverte par ces tests
    let pool = create_pool(&DatabaseConfig::default()).unwrap();
    create_router(AppState::new(pool, settings).unwrap())
}

fn offline_settings() -> Settings {
    Settings {
        raster_endpoint: "http://127.0.0.1:9".into(),
        vector_endpoint: "http://127.0.0.1:9".into(),
        ..Settings::default()
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn post_parcels(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/parcels")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn detail(body: &str) -> String {
    let value: Value = serde_json::from_str(body).unwrap();
    value["detail"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_service_info() {
    let (status, body) = send(app(offline_settings()), get_request("/")).await;

    assert_eq!(status, StatusCode::OK);
    let info: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(info["title"], "parcel-pg");
    assert!(info["version"].is_string());
}

#[tokio::test]
async fn test_malformed_json_is_unprocessable() {
    let (status, body) = send(app(offline_settings()), post_parcels("{not json")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!detail(&body).is_empty());
}

#[tokio::test]
async fn test_point_geometry_is_rejected() {
    let feature = json!({
        "type": "Feature",
        "properties": {"id": "p1"},
        "geometry": {"type": "Point", "coordinates": [-93.2, 44.9]}
    });
    let (status, body) = send(app(offline_settings()), post_parcels(&feature.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(detail(&body).contains("Point"));
}

#[tokio::test]
async fn test_missing_id_is_rejected() {
    let feature = json!({
        "type": "Feature",
        "properties": {},
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[-93.2, 44.9], [-93.1, 44.9], [-93.1, 45.0], [-93.2, 44.9]]]
        }
    });
    let (status, _) = send(app(offline_settings()), post_parcels(&feature.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bare_geometry_is_rejected() {
    let geometry = json!({
        "type": "Polygon",
        "coordinates": [[[-93.2, 44.9], [-93.1, 44.9], [-93.1, 45.0], [-93.2, 44.9]]]
    });
    let (status, _) = send(app(offline_settings()), post_parcels(&geometry.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_collection_returns_no_ids() {
    let collection = json!({"type": "FeatureCollection", "features": []});
    let (status, body) = send(app(offline_settings()), post_parcels(&collection.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<String> = serde_json::from_str(&body).unwrap();
    assert!(ids.is_empty());
}

#[tokio::test]
async fn test_summary_rejects_unknown_units() {
    let (status, _) = send(
        app(offline_settings()),
        get_request("/parcels/p1/landcover_summary?year=2023&units=furlongs"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_summary_rejects_non_numeric_year() {
    let (status, _) = send(
        app(offline_settings()),
        get_request("/parcels/p1/landcover_summary?year=latest"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Carte
// ============================================================================

#[derive(Clone)]
struct Upstream {
    base: String,
}

async fn bind() -> (tokio::net::TcpListener, String) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, format!("http://{}", addr))
}

async fn collection(Path(collection): Path<String>) -> Json<Value> {
    Json(json!({
        "id": collection,
        "extent": {"spatial": {"bbox": [[-93.5, 44.9, -93.1, 45.2]]}}
    }))
}

async fn vector_tilejson(
    State(upstream): State<Upstream>,
    Path(collection): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Value> {
    let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    Json(json!({
        "tilejson": "3.0.0",
        "tiles": [format!(
            "{}/collections/{}/tiles/WebMercatorQuad/{{z}}/{{x}}/{{y}}?{}",
            upstream.base,
            collection,
            query.join("&")
        )]
    }))
}

async fn item(Path((_collection, item_id)): Path<(String, String)>) -> Json<Value> {
    Json(json!({
        "type": "Feature",
        "id": item_id,
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[-93.3, 44.95], [-93.2, 44.95], [-93.2, 45.0], [-93.3, 45.0], [-93.3, 44.95]]]
        },
        "properties": {}
    }))
}

async fn fake_vector() -> String {
    let (listener, base) = bind().await;
    let app = Router::new()
        .route("/collections/:collection", get(collection))
        .route(
            "/collections/:collection/WebMercatorQuad/tilejson.json",
            get(vector_tilejson),
        )
        .route("/collections/:collection/items/:item", get(item))
        .with_state(Upstream { base: base.clone() });
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    base
}

async fn info(Path(collection): Path<String>) -> Json<Value> {
    Json(json!({
        "id": collection,
        "search": {"metadata": {"defaults": {"landcover": {
            "assets": ["supercell"],
            "colormap": {"1": "#419bdf", "2": "#397d49"},
            "nodata": 0
        }}}}
    }))
}

async fn register(Json(body): Json<Value>) -> Json<Value> {
    let year = body["datetime"]
        .as_str()
        .and_then(|d| d.get(0..4))
        .unwrap_or("0000")
        .to_string();
    Json(json!({ "id": format!("search-{}", year) }))
}

async fn raster_tilejson(
    State(upstream): State<Upstream>,
    Path(search_id): Path<String>,
) -> Json<Value> {
    Json(json!({
        "tiles": [format!("{}/searches/{}/tiles/WebMercatorQuad/{{z}}/{{x}}/{{y}}", upstream.base, search_id)]
    }))
}

async fn fake_raster() -> String {
    let (listener, base) = bind().await;
    let app = Router::new()
        .route("/collections/:collection/info", get(info))
        .route("/searches/register", post(register))
        .route(
            "/searches/:id/WebMercatorQuad/tilejson.json",
            get(raster_tilejson),
        )
        .with_state(Upstream { base: base.clone() });
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    base
}

async fn map_settings() -> (Settings, String, String) {
    let raster = fake_raster().await;
    let vector = fake_vector().await;
    let settings = Settings {
        raster_endpoint: raster.clone(),
        vector_endpoint: vector.clone(),
        raster_public_endpoint: Some(RASTER_PUBLIC.into()),
        vector_public_endpoint: Some(VECTOR_PUBLIC.into()),
        years: YearRange::new(2017, 2018).unwrap(),
        ..Settings::default()
    };
    (settings, raster, vector)
}

#[tokio::test]
async fn test_map_all_parcels() {
    let (settings, raster, vector) = map_settings().await;
    let (status, html) = send(app(settings), get_request("/map")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<title>all parcels</title>"));
    assert!(html.contains("https://maps.example.com/vector/collections/business.parcel/tiles/"));
    assert!(html.contains("https://maps.example.com/raster/searches/search-2017/tiles/"));
    assert!(html.contains("https://maps.example.com/raster/searches/search-2018/tiles/"));
    assert!(html.contains("\"2017 land cover\""));
    assert!(html.contains("map.fitBounds([[44.9, -93.5], [45.2, -93.1]])"));
    assert!(!html.contains(&raster));
    assert!(!html.contains(&vector));
}

#[tokio::test]
async fn test_map_single_parcel() {
    let (settings, _, _) = map_settings().await;
    let (status, html) = send(app(settings), get_request("/map?id=p1")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<title>parcel_id = p1</title>"));
    assert!(html.contains("ids=p1"));
    assert!(html.contains("map.fitBounds([[44.95, -93.3], [45, -93.2]])"));
}

#[tokio::test]
async fn test_map_forest_disturbance() {
    let (settings, _, _) = map_settings().await;
    let (status, html) = send(
        app(settings),
        get_request("/map?start_year=2017&end_year=2023&area_threshold=5000"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(
        "parcels with forest disturbances over 5000 square meters between 2017 and 2023"
    ));
    assert!(html.contains("collections/pg_temp.forest_disturbance/tiles/"));
    assert!(html.contains("start_year=2017"));
}

#[tokio::test]
async fn test_map_upstream_failure_is_bad_gateway() {
    let raster = fake_raster().await;
    // Le faux raster ne connaît pas les collections vecteur: 404
    let settings = Settings {
        raster_endpoint: raster.clone(),
        vector_endpoint: raster.clone(),
        ..Settings::default()
    };
    let (status, body) = send(app(settings), get_request("/map")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(detail(&body).contains("404"));
}
