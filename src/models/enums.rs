//! Shared domain enums

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

use crate::error::AppError;

/// Text-backed enums stored as VARCHAR columns
macro_rules! text_column {
    ($ty:ty) => {
        impl sqlx::Type<Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $ty {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $ty {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Librarian,
    Patrons,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Librarian => "librarian",
            Role::Patrons => "patrons",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "librarian" => Ok(Role::Librarian),
            "patrons" => Ok(Role::Patrons),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

text_column!(Role);

// ---------------------------------------------------------------------------
// Genre
// ---------------------------------------------------------------------------

/// Closed set of genres a reader can mark as favorite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    Fiction,
    NonFiction,
    Mystery,
    Thriller,
    Romance,
    ScienceFiction,
    Fantasy,
    Horror,
    Biography,
    History,
    Science,
    Technology,
    Business,
    SelfHelp,
    Poetry,
    Drama,
    Children,
    Comics,
    Philosophy,
    Religion,
    Travel,
    Cooking,
    Art,
    Other,
}

impl Genre {
    pub const ALL: [Genre; 24] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::Mystery,
        Genre::Thriller,
        Genre::Romance,
        Genre::ScienceFiction,
        Genre::Fantasy,
        Genre::Horror,
        Genre::Biography,
        Genre::History,
        Genre::Science,
        Genre::Technology,
        Genre::Business,
        Genre::SelfHelp,
        Genre::Poetry,
        Genre::Drama,
        Genre::Children,
        Genre::Comics,
        Genre::Philosophy,
        Genre::Religion,
        Genre::Travel,
        Genre::Cooking,
        Genre::Art,
        Genre::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Fiction => "fiction",
            Genre::NonFiction => "non_fiction",
            Genre::Mystery => "mystery",
            Genre::Thriller => "thriller",
            Genre::Romance => "romance",
            Genre::ScienceFiction => "science_fiction",
            Genre::Fantasy => "fantasy",
            Genre::Horror => "horror",
            Genre::Biography => "biography",
            Genre::History => "history",
            Genre::Science => "science",
            Genre::Technology => "technology",
            Genre::Business => "business",
            Genre::SelfHelp => "self_help",
            Genre::Poetry => "poetry",
            Genre::Drama => "drama",
            Genre::Children => "children",
            Genre::Comics => "comics",
            Genre::Philosophy => "philosophy",
            Genre::Religion => "religion",
            Genre::Travel => "travel",
            Genre::Cooking => "cooking",
            Genre::Art => "art",
            Genre::Other => "other",
        }
    }

    /// Maps a free-text genre, as stored by older clients or returned by the
    /// external catalog, onto the closed set. Unrecognised text becomes `Other`.
    pub fn from_legacy(raw: &str) -> Genre {
        if let Ok(genre) = raw.parse() {
            return genre;
        }

        let key: String = raw
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match key.as_str() {
            "novel" | "novels" | "literaryfiction" | "literature" => Genre::Fiction,
            "nonfiction" => Genre::NonFiction,
            "crime" | "detective" | "mysteries" => Genre::Mystery,
            "suspense" | "thrillers" => Genre::Thriller,
            "love" | "romantic" => Genre::Romance,
            "scifi" | "sciencefiction" | "sf" => Genre::ScienceFiction,
            "magic" | "fairytales" => Genre::Fantasy,
            "autobiography" | "biographyautobiography" | "memoir" | "memoirs" => Genre::Biography,
            "historical" => Genre::History,
            "physics" | "mathematics" | "biology" | "chemistry" => Genre::Science,
            "computers" | "computerscience" | "programming" | "engineering" => Genre::Technology,
            "businesseconomics" | "economics" | "finance" => Genre::Business,
            "selfimprovement" | "personaldevelopment" | "psychology" => Genre::SelfHelp,
            "poems" | "verse" => Genre::Poetry,
            "plays" | "theatre" | "theater" => Genre::Drama,
            "kids" | "juvenilefiction" | "juvenilenonfiction" | "youngadultfiction" => Genre::Children,
            "comicsgraphicnovels" | "graphicnovels" | "manga" => Genre::Comics,
            "spirituality" | "bodymindspirit" => Genre::Religion,
            "cookbooks" | "food" => Genre::Cooking,
            "arts" | "music" | "photography" | "design" => Genre::Art,
            _ => Genre::ALL
                .iter()
                .copied()
                .find(|g| g.as_str().replace('_', "") == key)
                .unwrap_or(Genre::Other),
        }
    }
}

impl std::str::FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Genre::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == lower)
            .ok_or_else(|| format!("Invalid genre: {}", s))
    }
}

text_column!(Genre);

// ---------------------------------------------------------------------------
// CheckoutState
// ---------------------------------------------------------------------------

/// Lifecycle of a checkout ticket. `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    Reserved,
    CheckedOut,
    Returned,
}

impl CheckoutState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Reserved => "reserved",
            CheckoutState::CheckedOut => "checked_out",
            CheckoutState::Returned => "returned",
        }
    }

    /// Open tickets hold a copy of the book
    pub fn is_open(&self) -> bool {
        !matches!(self, CheckoutState::Returned)
    }

    /// Checks `self -> next` and returns the state to store.
    /// Staying in the same state is allowed so plain field edits go through.
    pub fn transition(self, next: CheckoutState) -> Result<CheckoutState, AppError> {
        use CheckoutState::*;

        match (self, next) {
            (from, to) if from == to => Ok(to),
            (Reserved, CheckedOut) | (Reserved, Returned) | (CheckedOut, Returned) => Ok(next),
            (from, to) => Err(AppError::InvalidTransition(format!(
                "cannot move checkout ticket from {} to {}",
                from, to
            ))),
        }
    }
}

impl std::str::FromStr for CheckoutState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved" => Ok(CheckoutState::Reserved),
            "checked_out" => Ok(CheckoutState::CheckedOut),
            "returned" => Ok(CheckoutState::Returned),
            _ => Err(format!("Invalid checkout state: {}", s)),
        }
    }
}

text_column!(CheckoutState);
