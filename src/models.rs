use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "MOVIE")]
    Movie,
    #[serde(rename = "TV")]
    Tv,
}

impl MediaType {
    /// Name used when persisting favorites.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "MOVIE",
            MediaType::Tv => "TV",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            _ => Err(anyhow::anyhow!("media type must be 'movie' or 'tv'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentCategory {
    #[serde(rename = "FILME")]
    Film,
    #[serde(rename = "SERIE")]
    Series,
    #[serde(rename = "NOVELA")]
    Soap,
}

impl ContentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Film => "FILME",
            ContentCategory::Series => "SERIE",
            ContentCategory::Soap => "NOVELA",
        }
    }
}

impl FromStr for ContentCategory {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "FILME" => Ok(ContentCategory::Film),
            "SERIE" => Ok(ContentCategory::Series),
            "NOVELA" => Ok(ContentCategory::Soap),
            other => Err(anyhow::anyhow!("unknown content category '{}'", other)),
        }
    }
}

/// A catalog entry. Movies and TV shows share the numeric id space on TMDB,
/// so identity is `(id, media_type)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: f64,
    pub media_type: MediaType,
    pub category: ContentCategory,
    pub is_from_globo: bool,
}

impl Movie {
    pub fn key(&self) -> (i32, MediaType) {
        (self.id, self.media_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub movie: Movie,
    pub original_title: Option<String>,
    pub genres: Vec<String>,
    pub runtime_minutes: Option<i32>,
    pub trailer_key: Option<String>,
    pub season_count: Option<i32>,
    pub episode_count: Option<i32>,
    pub recommendations: Vec<Movie>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSection {
    pub id: String,
    pub title: String,
    pub movies: Vec<Movie>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedMovies {
    pub page: u32,
    pub total_pages: u32,
    pub results: Vec<Movie>,
}

/// Keeps the first occurrence of every key, preserving order.
pub(crate) fn dedup_by<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}
