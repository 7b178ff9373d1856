use std::{path::Path, path::PathBuf};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use bank::{
    SpeciesBank,
    species::{Bank, SpeciesEntry},
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use pelagica::{
    config::Config,
    favourites::FavouriteStore,
    router,
    scoring::ScoringConfig,
    state::State,
    window::{Window, previous_hour, previous_week},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

fn entry(name: &str, common: &str, wiki: bool, depth: (f64, f64)) -> SpeciesEntry {
    let (genus, species) = name.split_once(' ').unwrap();

    SpeciesEntry {
        genus: genus.into(),
        species: species.into(),
        common_name: Some(common.into()),
        has_wiki_page: wiki,
        length_cm: Some(50.0),
        depth_shallow: Some(depth.0),
        depth_deep: Some(depth.1),
        kingdom: Some("Animalia".into()),
        phylum: Some("Chordata".into()),
        class: Some("Actinopterygii".into()),
        order: Some("Salmoniformes".into()),
        family: Some("Salmonidae".into()),
        saltwater: true,
        database: 1,
        ..Default::default()
    }
}

fn bank() -> SpeciesBank {
    let mut orca = entry("Orcinus orca", "Killer whale", true, (20.0, 150.0));
    orca.class = Some("Mammalia".into());
    orca.order = Some("Artiodactyla".into());
    orca.family = Some("Delphinidae".into());
    orca.database = 2;

    let mut cod = entry("Gadus morhua", "Atlantic cod", true, (100.0, 600.0));
    cod.order = Some("Gadiformes".into());
    cod.family = Some("Gadidae".into());

    SpeciesBank::from_bank(Bank {
        species: vec![
            orca,
            entry("Salmo trutta", "Brown trout", true, (0.0, 10.0)),
            cod,
            entry("Oncorhynchus mykiss", "Rainbow trout", true, (0.0, 200.0)),
            entry("Oncorhynchus nerka", "Sockeye salmon", true, (0.0, 250.0)),
            entry("Thunnus thynnus", "Atlantic bluefin tuna", false, (0.0, 985.0)),
        ],
    })
}

fn app(dir: &Path) -> Router {
    app_with(dir, ScoringConfig::default())
}

fn app_with(dir: &Path, scoring: ScoringConfig) -> Router {
    let config = Config {
        port: 0,
        bank_path: PathBuf::new(),
        bank_url: None,
        data_dir: dir.to_path_buf(),
        fav_cooldown: Duration::seconds(30),
        scoring,
    };

    router(State::from_parts(bank(), config).unwrap())
}

fn store(dir: &Path) -> FavouriteStore {
    FavouriteStore::new(dir, Duration::seconds(30)).unwrap()
}

/// Favourites dated mid-way through the previous calendar week.
fn favourite_last_week(dir: &Path, favourites: &[(&str, &str)]) {
    let store = store(dir);
    let at = previous_week(Utc::now()).start + Duration::days(2);

    for (sid, species) in favourites {
        store.toggle(sid, species, true, at).unwrap();
    }
}

fn leaderboard_species(weekly: &Value) -> Vec<String> {
    weekly["leaderboard"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["species"].as_str().unwrap().to_string())
        .collect()
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    read(response).await
}

async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::post(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_genera_and_species() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, genera) = get(&app, "/genera").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(genera, json!(["Gadus", "Oncorhynchus", "Orcinus", "Salmo"]));

    let (_, options) = get(&app, "/species?genus=Oncorhynchus").await;
    assert_eq!(options, json!({ "options": ["mykiss", "nerka"], "selected": null }));

    let (_, options) = get(&app, "/species?genus=Salmo").await;
    assert_eq!(options, json!({ "options": ["trutta"], "selected": "trutta" }));
}

#[tokio::test]
async fn test_search_and_random() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (_, hits) = get(&app, "/search?q=trout").await;
    let values: Vec<&str> = hits
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["value"].as_str().unwrap())
        .collect();
    assert_eq!(values, vec!["Salmo trutta", "Oncorhynchus mykiss"]);

    let (status, random) = get(&app, "/random").await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(random["name"], json!("Thunnus thynnus"));
}

#[tokio::test]
async fn test_panel() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, panel) = get(&app, "/panel?name=Salmo%20%20trutta").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(panel["label"], json!("Brown trout (Salmo trutta)"));
    assert_eq!(panel["depth"]["deep_ft"], json!(32.8));
    assert_eq!(panel["zones"], json!(["saltwater"]));

    let (status, body) = get(&app, "/panel?name=Salmo%20salar").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], json!(false));

    let (status, body) = get(&app, "/panel?name=Salmo").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err"], json!("bad-args"));
}

#[tokio::test]
async fn test_tree() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, tree) = get(&app, "/tree?name=Salmo%20trutta").await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        tree["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .any(|node| node["species"] == json!("Salmo trutta"))
    );

    let (status, tree) = get(&app, "/tree?name=Salmo%20salar").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree["nodes"], json!([]));
}

#[tokio::test]
async fn test_dive_is_sorted_and_reproducible() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, first) = get(&app, "/dive?seed=7").await;
    assert_eq!(status, StatusCode::OK);

    let (_, second) = get(&app, "/dive?seed=7").await;
    assert_eq!(first, second);

    let placed = first["species"].as_array().unwrap();
    assert_eq!(placed.len(), 6);

    let depths: Vec<f64> = placed
        .iter()
        .map(|row| row["depth"].as_f64().unwrap())
        .collect();
    assert!(depths.windows(2).all(|pair| pair[0] <= pair[1]));

    let orca = placed
        .iter()
        .find(|row| row["species"] == json!("Orcinus orca"))
        .unwrap();
    assert!(orca["depth"].as_f64().unwrap() <= 5.0);

    let (_, wiki) = get(&app, "/dive?seed=7&wiki_only=true&min_depth_m=100").await;
    assert!(
        wiki["species"]
            .as_array()
            .unwrap()
            .iter()
            .all(|row| row["species"] != json!("Thunnus thynnus")
                && row["depth"].as_f64().unwrap() >= 100.0)
    );
}

#[tokio::test]
async fn test_dive_step() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (_, dive) = get(&app, "/dive?seed=3").await;
    let order = dive["species"].as_array().unwrap();

    let (_, shallowest) = get(&app, "/dive/step?seed=3&direction=shallowest").await;
    assert_eq!(shallowest, order[0]);

    let (_, from_nothing) = get(&app, "/dive/step?seed=3&direction=next").await;
    assert_eq!(from_nothing, order[0]);

    let current = order[0]["species"].as_str().unwrap().replace(' ', "%20");
    let (_, next) = get(
        &app,
        &format!("/dive/step?seed=3&direction=next&current={current}"),
    )
    .await;
    assert_eq!(next, order[1]);

    let last = order[order.len() - 1]["species"]
        .as_str()
        .unwrap()
        .replace(' ', "%20");
    let (_, clamped) = get(
        &app,
        &format!("/dive/step?seed=3&direction=next&current={last}"),
    )
    .await;
    assert_eq!(clamped, order[order.len() - 1]);
}

#[tokio::test]
async fn test_favourite_toggles() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, body) = post(
        &app,
        "/fav/toggle",
        r#"{"sid":"s1","species":"Salmo trutta","state":1}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (_, body) = post(
        &app,
        "/fav/toggle",
        r#"{"sid":"s1","species":"Salmo trutta","state":1}"#,
    )
    .await;
    assert_eq!(body, json!({ "ok": true, "idempotent": true }));

    let (status, body) = post(
        &app,
        "/fav/toggle",
        r#"{"sid":"s1","species":"Salmo trutta","state":0}"#,
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body, json!({ "ok": false, "err": "too-fast" }));

    let (_, favourites) = get(&app, "/fav?sid=s1").await;
    assert_eq!(favourites, json!(["Salmo trutta"]));

    let (_, favourites) = get(&app, "/fav?sid=s2").await;
    assert_eq!(favourites, json!([]));

    let (_, dive) = get(&app, "/dive?seed=1&favourites_of=s1").await;
    assert_eq!(dive["species"].as_array().unwrap().len(), 1);
    assert_eq!(dive["species"][0]["species"], json!("Salmo trutta"));
}

#[tokio::test]
async fn test_toggle_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    let (status, body) = post(&app, "/fav/toggle", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err"], json!("bad-json"));

    let (status, body) = post(&app, "/fav/toggle", r#"{"species":"Salmo trutta"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err"], json!("bad-args"));

    let (status, _) = post(
        &app,
        "/fav/toggle",
        r#"{"sid":"s1","species":"Salmo salar","state":1}"#,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(
        std::fs::read_to_string(dir.path().join("fav_events.jsonl"))
            .unwrap_or_default()
            .is_empty()
    );
}

#[tokio::test]
async fn test_weekly_without_history() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    post(
        &app,
        "/fav/toggle",
        r#"{"sid":"s1","species":"Gadus morhua","state":1}"#,
    )
    .await;

    // Toggles from this week only count once the week is over.
    let (status, weekly) = get(&app, "/fav/weekly").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(weekly["winner"], Value::Null);
    assert_eq!(weekly["recorded"], json!(false));
    assert_eq!(weekly["leaderboard"], json!([]));
    assert!(weekly["refresh_at"].as_str().unwrap() > weekly["week_start"].as_str().unwrap());
}

#[tokio::test]
async fn test_weekly_records_and_reports_same_winner() {
    let dir = TempDir::new().unwrap();
    favourite_last_week(
        dir.path(),
        &[
            ("s1", "Salmo trutta"),
            ("s2", "Salmo trutta"),
            ("s3", "Salmo trutta"),
            ("s4", "Gadus morhua"),
            ("s5", "Gadus morhua"),
        ],
    );
    let app = app(dir.path());

    let (status, first) = get(&app, "/fav/weekly").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["recorded"], json!(true));
    assert_eq!(first["winner"], json!("Salmo trutta"));
    assert_eq!(
        leaderboard_species(&first),
        vec!["Salmo trutta", "Gadus morhua"]
    );
    assert_eq!(first["leaderboard"][0]["multiplier"], json!(1.0));
    assert_eq!(first["leaderboard"][0]["past_wins"], json!(0));

    let winners = store(dir.path()).winners().unwrap();
    assert_eq!(winners.len(), 1);
    assert_eq!(json!(winners[0].species), first["winner"]);
    assert_eq!(json!(winners[0].week_start_utc), first["week_start"]);

    let (_, second) = get(&app, "/fav/weekly").await;
    assert_eq!(second["recorded"], json!(false));
    assert_eq!(second["winner"], first["winner"]);
    assert_eq!(second["leaderboard"], first["leaderboard"]);
    assert_eq!(store(dir.path()).winners().unwrap().len(), 1);
}

#[tokio::test]
async fn test_weekly_prefers_logged_winner() {
    let dir = TempDir::new().unwrap();
    favourite_last_week(
        dir.path(),
        &[("s1", "Salmo trutta"), ("s2", "Salmo trutta")],
    );
    let week_start = previous_week(Utc::now()).start;
    store(dir.path())
        .record_winner(week_start, "Gadus morhua")
        .unwrap();
    let app = app(dir.path());

    let (_, weekly) = get(&app, "/fav/weekly").await;
    assert_eq!(weekly["recorded"], json!(false));
    assert_eq!(weekly["winner"], json!("Gadus morhua"));
    assert_eq!(leaderboard_species(&weekly), vec!["Salmo trutta"]);
}

#[tokio::test]
async fn test_debug_window_leaves_winners_log_alone() {
    let dir = TempDir::new().unwrap();
    let hour = previous_hour(Utc::now());
    let store = store(dir.path());
    store
        .toggle("s1", "Orcinus orca", true, hour.start + Duration::minutes(10))
        .unwrap();

    let app = app_with(
        dir.path(),
        ScoringConfig {
            window: Window::PreviousHour,
            ..ScoringConfig::default()
        },
    );

    let (status, weekly) = get(&app, "/fav/weekly").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(weekly["winner"], json!("Orcinus orca"));
    assert_eq!(weekly["week_start"], json!(hour.start));

    // Only calendar weeks are ever logged.
    let week_start = previous_week(Utc::now()).start;
    assert!(
        store
            .winners()
            .unwrap()
            .iter()
            .all(|row| row.week_start_utc == week_start)
    );
}

#[tokio::test]
async fn test_bad_query_strings_get_json_errors() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());

    for uri in [
        "/dive",
        "/dive?seed=deep",
        "/dive/step?seed=1",
        "/dive/step?seed=1&direction=sideways",
        "/panel",
        "/fav",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, json!({ "ok": false, "err": "bad-args" }), "{uri}");
    }
}
