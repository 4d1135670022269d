use super::*;

const SOURCE: &str = "\
country_region_code,country_region,sub_region_1,sub_region_2,metro_area,iso_3166_2_code,census_fips_code,place_id,date,retail_and_recreation_percent_change_from_baseline,grocery_and_pharmacy_percent_change_from_baseline,parks_percent_change_from_baseline,transit_stations_percent_change_from_baseline,workplaces_percent_change_from_baseline,residential_percent_change_from_baseline
GB,United Kingdom,,,,,,ChIJqZHHQhE7WgIReiWIMkOg-MQ,2020-02-15,-12.0,-7.0,-35.0,-12.0,-4.0,2.0
GB,United Kingdom,Wales,Cardiff,,GB-CRF,,ChIJ9VPsNNQCbkgRDmeGZdsGNBQ,2020-02-15,-10.0,,-20.0,-8.0,-3.0,1.0
FR,France,,,,,,ChIJMVd4MymgVA0R99lHx5Y__Ws,2020-02-15,3.0,2.0,1.0,0.0,-1.0,-2.0
GB,United Kingdom,Scotland,,,GB-SCT,,ChIJhwNDsAjFdkgRDHmO2BoR0zY,2020-02-16 00:00:00,-5.5,NA,4.0,-6.0,-2.0,1.0
";

#[test]
fn reads_every_row_and_fills_nothing_yet() {
    let table = RawTable::read(SOURCE.as_bytes()).expect("table");
    assert_eq!(table.len(), 4);

    let observations = table.observations().expect("observations");
    assert_eq!(observations[0].sub_region_1, None);
    assert_eq!(observations[0].sub_region_2, None);
    assert_eq!(observations[1].sub_region_1.as_deref(), Some("Wales"));
    assert_eq!(observations[1].sub_region_2.as_deref(), Some("Cardiff"));
    assert_eq!(observations[0].country.as_deref(), Some("United Kingdom"));
}

#[test]
fn keeps_only_target_country() {
    let table = RawTable::read_country(SOURCE.as_bytes(), "GB").expect("table");
    assert_eq!(table.len(), 3);
    let observations = table.observations().expect("observations");
    assert!(observations.iter().all(|row| row.country_code == "GB"));
}

#[test]
fn missing_and_non_numeric_metrics_are_none() {
    let observations = RawTable::read(SOURCE.as_bytes())
        .expect("table")
        .observations()
        .expect("observations");
    assert_eq!(observations[1].metrics.get(Metric::GroceryAndPharmacy), None);
    assert_eq!(observations[3].metrics.get(Metric::GroceryAndPharmacy), None);
    assert_eq!(observations[3].metrics.get(Metric::RetailAndRecreation), Some(-5.5));
}

#[test]
fn accepts_dates_with_time_suffix() {
    let observations = RawTable::read(SOURCE.as_bytes())
        .expect("table")
        .observations()
        .expect("observations");
    assert_eq!(
        observations[3].date,
        NaiveDate::from_ymd_opt(2020, 2, 16).expect("date")
    );
}

#[test]
fn rejects_invalid_dates() {
    let source = SOURCE.replace("2020-02-15,-12.0", "yesterday,-12.0");
    let error = RawTable::read(source.as_bytes())
        .expect("table")
        .observations()
        .expect_err("bad date");
    assert!(matches!(error, ParseError::InvalidDate { line: 2, .. }), "{error}");
}

#[test]
fn rejects_files_without_required_columns() {
    let error = RawTable::read("country_region_code,sub_region_1\nGB,Wales\n".as_bytes())
        .expect_err("missing columns");
    assert!(matches!(error, ParseError::MissingColumn(_)));
}

#[test]
fn written_cache_keeps_all_source_columns() {
    let table = RawTable::read_country(SOURCE.as_bytes(), "GB").expect("table");
    let mut written = Vec::new();
    table.write(&mut written).expect("write");

    let text = String::from_utf8(written).expect("utf8");
    let header = text.lines().next().expect("header");
    assert!(header.contains("place_id"));
    assert!(header.contains("metro_area"));
    assert!(!text.contains("France"));

    let reread = RawTable::read(text.as_bytes()).expect("reread");
    assert_eq!(
        reread.observations().expect("observations"),
        table.observations().expect("observations")
    );
}

#[test]
fn missing_cache_is_data_unavailable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let error = read_cache(&dir.path().join("absent.csv")).expect_err("missing");
    assert!(matches!(error, DatasetError::DataUnavailable { .. }));
}

#[tokio::test]
async fn load_without_refresh_never_downloads() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = LoaderConfig {
        cache_path: dir.path().join("absent.csv"),
        mapping_path: dir.path().join("regions.csv"),
        source_url: "http://127.0.0.1:9/unreachable.csv".to_string(),
        country_code: "GB".to_string(),
    };
    let error = load(&config, false).await.expect_err("missing cache");
    assert!(matches!(error, DatasetError::DataUnavailable { .. }), "{error}");
}

#[test]
fn chunk_reader_joins_rows_split_across_chunks() {
    let (chunks, receiver) = mpsc::channel(64);
    let text = SOURCE.as_bytes();
    for piece in text.chunks(37) {
        chunks.blocking_send(piece.to_vec()).expect("send");
    }
    drop(chunks);

    let table = RawTable::read_country(ChunkReader::new(receiver), "GB").expect("table");
    assert_eq!(table.len(), 3);
    assert_eq!(
        table.observations().expect("observations"),
        RawTable::read_country(SOURCE.as_bytes(), "GB")
            .expect("table")
            .observations()
            .expect("observations")
    );
}
