use std::{collections::HashSet, sync::Arc};

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    depth::{DepthOrder, Direction, Placed, SpeciesFilter, sample_species},
    error::AppError,
    favourites::Toggle,
    scoring::{Aggregation, ScoredSpecies, leaderboard, record_winner_if_missing, recorded_winner},
    search::{DEFAULT_LIMIT, SpeciesOption, search},
    state::State as AppState,
    taxonomy::{TaxonomyTree, build_tree},
    utils::{SpeciesPanel, normalize_name, panel},
    window::Window,
};

type Shared = State<Arc<AppState>>;

/// Query string that answers with a `bad-args` body instead of axum's plain-text rejection.
type Params<T> = Result<Query<T>, QueryRejection>;

#[derive(Deserialize)]
pub struct GenusQuery {
    genus: String,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct NameQuery {
    name: String,
}

#[derive(Deserialize)]
pub struct DiveQuery {
    seed: u32,
}

#[derive(Deserialize)]
pub struct StepQuery {
    seed: u32,
    direction: Direction,
    current: Option<String>,
}

#[derive(Deserialize)]
pub struct SessionQuery {
    sid: String,
}

#[derive(Deserialize)]
struct TogglePayload {
    sid: Option<String>,
    species: Option<String>,
    #[serde(default)]
    state: Value,
}

#[derive(Serialize)]
pub struct SpeciesOptions {
    options: Vec<String>,
    /// Set when the genus has a single species.
    selected: Option<String>,
}

#[derive(Serialize)]
pub struct DiveResponse {
    seed: u32,
    species: Vec<Placed>,
}

#[derive(Serialize)]
pub struct WeeklyResponse {
    winner: Option<String>,
    week_start: DateTime<Utc>,
    refresh_at: DateTime<Utc>,
    window: Window,
    aggregation: Aggregation,
    recorded: bool,
    leaderboard: Vec<ScoredSpecies>,
}

pub async fn genera_handler(State(state): Shared) -> Json<Vec<String>> {
    Json(state.bank.genera().into_iter().map(String::from).collect())
}

pub async fn species_handler(
    State(state): Shared,
    query: Params<GenusQuery>,
) -> Result<Json<SpeciesOptions>, AppError> {
    let Query(query) = query?;
    let options: Vec<String> = state
        .bank
        .epithets(query.genus.trim())
        .into_iter()
        .map(String::from)
        .collect();

    let selected = match options.as_slice() {
        [only] => Some(only.clone()),
        _ => None,
    };

    Ok(Json(SpeciesOptions { options, selected }))
}

pub async fn search_handler(
    State(state): Shared,
    query: Params<SearchQuery>,
) -> Result<Json<Vec<SpeciesOption>>, AppError> {
    let Query(query) = query?;

    Ok(Json(search(
        &state.bank,
        &query.q,
        query.limit.unwrap_or(DEFAULT_LIMIT),
    )))
}

fn random_species(state: &AppState) -> Option<String> {
    let candidates: Vec<&str> = state
        .bank
        .with_wiki()
        .map(|species| species.name.as_str())
        .collect();

    candidates.choose(&mut rand::rng()).map(|name| name.to_string())
}

pub async fn random_handler(State(state): Shared) -> Result<Json<Value>, AppError> {
    let name = random_species(&state).ok_or_else(|| AppError::SpeciesNotFound("any".into()))?;

    Ok(Json(json!({ "name": name })))
}

pub async fn panel_handler(
    State(state): Shared,
    query: Params<NameQuery>,
) -> Result<Json<SpeciesPanel>, AppError> {
    let Query(query) = query?;
    let name = normalize_name(&query.name)?;
    let species = state
        .bank
        .get(&name)
        .ok_or(AppError::SpeciesNotFound(name.clone()))?;

    Ok(Json(panel(species)))
}

pub async fn tree_handler(
    State(state): Shared,
    query: Params<NameQuery>,
) -> Result<Json<TaxonomyTree>, AppError> {
    let Query(query) = query?;
    let name = normalize_name(&query.name)?;

    Ok(Json(build_tree(&state.bank, &name)))
}

/// Species admitted by the favourite-based parts of the filter, `None` when there are none.
fn allowed_species(
    state: &AppState,
    filter: &SpeciesFilter,
) -> Result<Option<HashSet<String>>, AppError> {
    let mut allowed: Option<HashSet<String>> = None;

    if let Some(sid) = &filter.favourites_of {
        allowed = Some(state.favourites.favourites_of(sid)?.into_iter().collect());
    }

    if let Some(min) = filter.min_favourites.filter(|&min| min > 0) {
        let popular: HashSet<String> = state
            .favourites
            .favourite_counts()?
            .into_iter()
            .filter(|&(_, count)| count >= min)
            .map(|(species, _)| species)
            .collect();

        allowed = Some(match allowed {
            Some(allowed) => allowed.intersection(&popular).cloned().collect(),
            None => popular,
        });
    }

    Ok(allowed)
}

fn depth_order(state: &AppState, seed: u32, filter: &SpeciesFilter) -> Result<DepthOrder, AppError> {
    let allowed = if filter.uses_favourites() {
        allowed_species(state, filter)?
    } else {
        None
    };

    Ok(DepthOrder::build(
        state.bank.iter(),
        seed,
        filter,
        allowed.as_ref(),
    ))
}

pub async fn dive_handler(
    State(state): Shared,
    query: Params<DiveQuery>,
    filter: Params<SpeciesFilter>,
) -> Result<Json<DiveResponse>, AppError> {
    let (Query(query), Query(filter)) = (query?, filter?);
    let order = depth_order(&state, query.seed, &filter)?;
    debug!("Dive for seed {}: {} species", query.seed, order.len());

    Ok(Json(DiveResponse {
        seed: query.seed,
        species: order.entries().to_vec(),
    }))
}

pub async fn step_handler(
    State(state): Shared,
    query: Params<StepQuery>,
    filter: Params<SpeciesFilter>,
) -> Result<Json<Option<Placed>>, AppError> {
    let (Query(query), Query(filter)) = (query?, filter?);
    let order = depth_order(&state, query.seed, &filter)?;

    let current = match query.current.as_deref() {
        Some(raw) => Some(normalize_name(raw)?),
        None => None,
    };

    let placed_current = current.as_deref().and_then(|name| {
        order
            .depth_of(name)
            .or_else(|| {
                state
                    .bank
                    .get(name)
                    .and_then(|species| sample_species(species, query.seed))
            })
            .map(|depth| (name, depth))
    });

    Ok(Json(order.step(placed_current, query.direction).cloned()))
}

fn parse_state(value: &Value) -> bool {
    match value {
        Value::Bool(state) => *state,
        Value::Number(state) => state.as_i64() == Some(1),
        Value::String(state) => state.trim() == "1",
        _ => false,
    }
}

pub async fn toggle_handler(State(state): Shared, body: Bytes) -> Result<Json<Value>, AppError> {
    let payload: TogglePayload =
        serde_json::from_slice(&body).map_err(|_| AppError::MalformedPayload)?;

    let (Some(sid), Some(species)) = (
        payload.sid.filter(|sid| !sid.trim().is_empty()),
        payload.species,
    ) else {
        return Err(AppError::BadArgs);
    };

    let species = normalize_name(&species)?;
    if state.bank.get(&species).is_none() {
        return Err(AppError::SpeciesNotFound(species));
    }

    let response = match state
        .favourites
        .toggle(&sid, &species, parse_state(&payload.state), Utc::now())?
    {
        Toggle::Applied => json!({ "ok": true }),
        Toggle::Idempotent => json!({ "ok": true, "idempotent": true }),
    };

    Ok(Json(response))
}

pub async fn favourites_handler(
    State(state): Shared,
    query: Params<SessionQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let Query(query) = query?;

    Ok(Json(state.favourites.favourites_of(&query.sid)?))
}

pub async fn weekly_handler(State(state): Shared) -> Result<Json<WeeklyResponse>, AppError> {
    let now = Utc::now();
    let config = &state.config.scoring;

    let recorded = record_winner_if_missing(&state.favourites, now, config)?;

    let events = state.favourites.events()?;
    let winners = state.favourites.winners()?;
    let board = leaderboard(&events, &winners, now, config);

    let winner = recorded_winner(&winners, now, config)
        .or_else(|| board.first().map(|top| top.species.clone()));

    Ok(Json(WeeklyResponse {
        winner,
        week_start: config.window.span(now).start,
        refresh_at: config.window.next_refresh(now),
        window: config.window,
        aggregation: config.aggregation,
        recorded,
        leaderboard: board,
    }))
}
