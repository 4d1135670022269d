use std::fs;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use super::*;

const CACHE: &str = "\
country_region_code,country_region,sub_region_1,sub_region_2,metro_area,iso_3166_2_code,census_fips_code,place_id,date,retail_and_recreation_percent_change_from_baseline,grocery_and_pharmacy_percent_change_from_baseline,parks_percent_change_from_baseline,transit_stations_percent_change_from_baseline,workplaces_percent_change_from_baseline,residential_percent_change_from_baseline
GB,United Kingdom,,,,,,place-gb,2020-02-15,-12.0,-7.0,-35.0,-12.0,-4.0,2.0
GB,United Kingdom,England,,,,,place-en,2020-02-15,-11.0,-6.0,-30.0,-10.0,-4.0,2.0
GB,United Kingdom,Wales,Cardiff,,GB-CRF,,place-crf,2020-02-15,-10.0,,-20.0,-8.0,-3.0,1.0
";

fn settings_for(dir: &std::path::Path) -> Settings {
    Settings {
        data_dir: dir.to_path_buf(),
        ..Settings::default()
    }
}

#[tokio::test]
async fn app_serves_series_loaded_from_data_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = settings_for(dir.path());
    fs::write(settings.cache_path(), CACHE).expect("cache");
    fs::write(
        settings.mapping_path(),
        "sub_region_1,Nation\nScotland,Scotland\nWales,Wales\n",
    )
    .expect("mapping");

    let app = build_app(&settings).await.expect("app");
    let request = Request::get("/api/series?region_1=Wales&region_2=Cardiff&rolling=false")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let series: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(series["title"], "Google Movement Data for Wales");
    assert_eq!(series["series"][0]["points"][0]["value"], -10.0);
    assert!(series["series"][1]["points"][0]["value"].is_null());
}

#[tokio::test]
async fn missing_cache_fails_startup_without_refresh() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = settings_for(dir.path());
    fs::write(settings.mapping_path(), "sub_region_1,Nation\n").expect("mapping");

    let error = build_app(&settings).await.expect_err("no cache");
    assert!(error.to_string().contains("Google Movements GB.csv"), "{error}");
}
