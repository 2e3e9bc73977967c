use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

/// Value of the `Own` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Ownership {
    Owned,
    NotOwned,
}

impl Ownership {
    /// Blank or unrecognised cells count as not owned.
    pub fn from_cell(cell: &str) -> Self {
        if cell.trim().eq_ignore_ascii_case("yes") {
            Ownership::Owned
        } else {
            Ownership::NotOwned
        }
    }

    pub fn as_cell(&self) -> &'static str {
        match self {
            Ownership::Owned => "Yes",
            Ownership::NotOwned => "No",
        }
    }
}

impl From<bool> for Ownership {
    fn from(owned: bool) -> Self {
        if owned {
            Ownership::Owned
        } else {
            Ownership::NotOwned
        }
    }
}

/// One row of the movie list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieRecord {
    pub title: String,
    pub year: i32,
    #[serde(rename = "own", serialize_with = "serialize_own")]
    pub owned: Ownership,
}

fn serialize_own<S: serde::Serializer>(owned: &Ownership, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(owned.as_cell())
}

impl MovieRecord {
    pub fn new(title: impl Into<String>, year: i32, owned: Ownership) -> Self {
        Self {
            title: title.into(),
            year,
            owned,
        }
    }

    /// Key comparison: exact year, title trimmed and case-folded on both sides.
    pub fn matches(&self, title: &str, year: i32) -> bool {
        self.year == year && self.title.trim().to_lowercase() == title.trim().to_lowercase()
    }
}

/// One entry of a catalog search page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchCandidate {
    pub id: i64,
    pub title: String,
    pub release_date: String,
}

impl SearchCandidate {
    pub fn release_year(&self) -> Option<i32> {
        NaiveDate::parse_from_str(&self.release_date, "%Y-%m-%d")
            .ok()
            .map(|d| d.year())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductionCompany {
    pub name: String,
    pub logo_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovieDetails {
    pub title: String,
    pub release_date: String,
    pub summary: String,
    pub runtime_minutes: i64,
    pub budget: i64,
    pub revenue: i64,
    pub rating: f64,
    pub genres: Vec<String>,
    pub poster_path: String,
    pub production_companies: Vec<ProductionCompany>,
    pub original_language: String,
    pub origin_countries: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrewMember {
    pub name: String,
    pub job: String,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CastMember {
    pub name: String,
    pub character: String,
    pub billing_order: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreditSet {
    pub directors: Vec<CrewMember>,
    pub writers: Vec<CrewMember>,
    pub actors: Vec<CastMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieLookup {
    pub details: MovieDetails,
    pub poster: String,
    pub credits: CreditSet,
}

pub const LOOKUP_NOT_FOUND: &str = "Results not found.";

/// Outcome of a title lookup. A found result always carries details and credits,
/// a failed one always carries a message.
#[derive(Debug, Clone, PartialEq)]
pub enum MovieLookupResult {
    Found(Box<MovieLookup>),
    NotFound,
    Unavailable(String),
}

impl MovieLookupResult {
    pub fn success(&self) -> bool {
        matches!(self, MovieLookupResult::Found(_))
    }

    pub fn error(&self) -> Option<String> {
        match self {
            MovieLookupResult::Found(_) => None,
            MovieLookupResult::NotFound => Some(LOOKUP_NOT_FOUND.to_string()),
            MovieLookupResult::Unavailable(reason) => Some(reason.clone()),
        }
    }

    pub fn found(&self) -> Option<&MovieLookup> {
        match self {
            MovieLookupResult::Found(lookup) => Some(lookup.as_ref()),
            _ => None,
        }
    }
}

/// Flat wire shape of a lookup result.
#[derive(Debug, Serialize)]
pub struct LookupPayload<'a> {
    pub success: bool,
    pub details: Option<&'a MovieDetails>,
    pub poster: &'a str,
    pub credits: Option<&'a CreditSet>,
    pub error: String,
}

impl<'a> From<&'a MovieLookupResult> for LookupPayload<'a> {
    fn from(result: &'a MovieLookupResult) -> Self {
        let found = result.found();
        LookupPayload {
            success: result.success(),
            details: found.map(|f| &f.details),
            poster: found.map(|f| f.poster.as_str()).unwrap_or(""),
            credits: found.map(|f| &f.credits),
            error: result.error().unwrap_or_default(),
        }
    }
}

/// Result of a set-ownership request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipOutcome {
    NotFound { title: String, year: i32 },
    Unchanged { title: String, year: i32, state: Ownership },
    Updated { title: String, year: i32, state: Ownership },
}

impl OwnershipOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            OwnershipOutcome::NotFound { .. } => "not_found",
            OwnershipOutcome::Unchanged { .. } => "unchanged",
            OwnershipOutcome::Updated { .. } => "updated",
        }
    }
}

impl fmt::Display for OwnershipOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnershipOutcome::NotFound { title, year } => {
                write!(f, "ℹ️ Information: Could not find {title} ({year})")
            }
            OwnershipOutcome::Unchanged {
                title,
                year,
                state: Ownership::Owned,
            } => write!(f, "ℹ️ Already own {title} ({year})."),
            OwnershipOutcome::Unchanged {
                title,
                year,
                state: Ownership::NotOwned,
            } => write!(f, "ℹ️ Did not own {title} ({year})."),
            OwnershipOutcome::Updated {
                title,
                year,
                state: Ownership::Owned,
            } => write!(f, "✅ Update: {title} ({year}) marked as owned."),
            OwnershipOutcome::Updated {
                title,
                year,
                state: Ownership::NotOwned,
            } => write!(f, "✅ Update: {title} ({year}) marked as not owned."),
        }
    }
}
