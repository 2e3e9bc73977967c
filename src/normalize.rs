//! Converts raw catalog payloads into the typed detail and credit shapes.
//!
//! Every function here is total: missing, null or mistyped fields fall back to
//! zero, the empty string or an empty list.

use serde_json::Value;

use crate::models::{CastMember, CreditSet, CrewMember, MovieDetails, ProductionCompany};

pub const DEFAULT_TOP_CAST: usize = 5;
const UNRANKED_ORDER: i64 = 999;

pub fn normalize_details(raw: &Value) -> MovieDetails {
    MovieDetails {
        title: text(raw, "title"),
        release_date: text(raw, "release_date"),
        summary: text(raw, "overview"),
        runtime_minutes: integer(raw, "runtime"),
        budget: integer(raw, "budget"),
        revenue: integer(raw, "revenue"),
        rating: number(raw, "vote_average").or_else(|| number(raw, "rating")).unwrap_or(0.0),
        genres: list(raw, "genres")
            .iter()
            .filter_map(|g| g.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        poster_path: text(raw, "poster_path"),
        production_companies: list(raw, "production_companies")
            .iter()
            .filter(|p| p.is_object())
            .map(|p| ProductionCompany {
                name: text(p, "name"),
                logo_path: text(p, "logo_path"),
            })
            .collect(),
        original_language: text(raw, "original_language"),
        origin_countries: list(raw, "origin_country")
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    }
}

pub fn normalize_credits(raw: &Value, top_n: usize) -> CreditSet {
    let crew: Vec<CrewMember> = named_entries(raw, "crew")
        .map(|m| CrewMember {
            name: text(m, "name"),
            job: text(m, "job"),
            department: text(m, "department"),
        })
        .collect();

    let mut actors: Vec<CastMember> = named_entries(raw, "cast")
        .map(|c| CastMember {
            name: text(c, "name"),
            character: text(c, "character"),
            billing_order: c
                .get("order")
                .and_then(Value::as_i64)
                .unwrap_or(UNRANKED_ORDER),
        })
        .collect();
    actors.sort_by_key(|a| a.billing_order);
    actors.truncate(top_n);

    CreditSet {
        directors: filter_crew(&crew, "directing", Some("director")),
        writers: filter_crew(&crew, "writing", None),
        actors,
    }
}

fn filter_crew(crew: &[CrewMember], department: &str, job: Option<&str>) -> Vec<CrewMember> {
    crew.iter()
        .filter(|m| m.department.to_lowercase().contains(department))
        .filter(|m| job.map_or(true, |j| m.job.to_lowercase().contains(j)))
        .cloned()
        .collect()
}

/// Object entries with a non-null `name`. A present but null `name` is dropped
/// too, so a nameless crew or cast row never reaches the output.
fn named_entries<'a>(raw: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    list(raw, key)
        .iter()
        .filter(|v| v.get("name").is_some_and(|n| !n.is_null()))
}

fn text(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn integer(raw: &Value, key: &str) -> i64 {
    raw.get(key)
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(0)
}

fn number(raw: &Value, key: &str) -> Option<f64> {
    raw.get(key).and_then(Value::as_f64)
}

fn list<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
    raw.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
