use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::env;
use tracing::debug;

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3/";
pub const LANGUAGE: &str = "pt-BR";

/// Failures raised by [`TmdbClient`]. They travel inside `anyhow::Error`, so
/// callers that care can `downcast_ref` them.
#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("TMDB API key is not configured")]
    MissingApiKey,
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} -> {status}: {body}")]
    Http {
        path: String,
        status: StatusCode,
        body: String,
    },
    #[error("unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TmdbError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TmdbError::Http { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverTvParams {
    pub sort_by: Option<String>,
    pub with_networks: Option<String>,
    pub with_genres: Option<String>,
    pub without_genres: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverMovieParams {
    pub sort_by: Option<String>,
    pub with_companies: Option<String>,
}

#[async_trait]
pub trait TmdbApi: Send + Sync {
    /// Whether an API key is available. Callers check this before fanning out.
    fn is_configured(&self) -> bool;
    async fn trending_movies(&self, page: u32) -> Result<MovieListResponse>;
    async fn trending_tv(&self, page: u32) -> Result<MovieListResponse>;
    async fn popular_movies(&self, page: u32) -> Result<MovieListResponse>;
    async fn popular_tv(&self, page: u32) -> Result<MovieListResponse>;
    async fn top_rated_movies(&self, page: u32) -> Result<MovieListResponse>;
    async fn upcoming_movies(&self, page: u32) -> Result<MovieListResponse>;
    async fn discover_tv(&self, page: u32, params: &DiscoverTvParams) -> Result<MovieListResponse>;
    async fn discover_movies(
        &self,
        page: u32,
        params: &DiscoverMovieParams,
    ) -> Result<MovieListResponse>;
    async fn movie_details(&self, id: i32, append_to_response: &str) -> Result<MovieDetailDto>;
    async fn tv_details(&self, id: i32, append_to_response: &str) -> Result<TvDetailDto>;
    async fn movie_videos(&self, id: i32) -> Result<VideoResponse>;
    async fn search_movies(&self, query: &str, page: u32) -> Result<MovieListResponse>;
    async fn search_tv(&self, query: &str, page: u32) -> Result<MovieListResponse>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, TMDB_BASE)
    }

    /// Points the client at another host (wiremock in tests, a proxy in prod).
    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Result<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .with_context(|| format!("invalid TMDB base URL '{}'", base_url))?;
        Ok(Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url,
        })
    }

    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        match env::var("TMDB_BASE_URL") {
            Ok(base) if !base.trim().is_empty() => Self::with_base_url(api_key, base.trim()),
            _ => Self::new(api_key),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        if !self.is_configured() {
            return Err(TmdbError::MissingApiKey.into());
        }
        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("invalid TMDB path '{}'", path))?;
        debug!(path = %path, params = ?params, "TMDB request");

        let res = self
            .client
            .get(url)
            .query(&[("language", LANGUAGE), ("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|source| TmdbError::Transport {
                path: path.to_string(),
                source,
            })?;
        let status = res.status();
        let text = res.text().await.map_err(|source| TmdbError::Transport {
            path: path.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(TmdbError::Http {
                path: path.to_string(),
                status,
                body: text,
            }
            .into());
        }
        let parsed = serde_json::from_str(&text).map_err(|source| TmdbError::Decode {
            path: path.to_string(),
            source,
        })?;
        Ok(parsed)
    }

    async fn get_list(&self, path: &str, page: u32) -> Result<MovieListResponse> {
        self.get_json(path, &[("page", page.to_string())]).await
    }
}

fn push_opt(params: &mut Vec<(&'static str, String)>, key: &'static str, value: &Option<String>) {
    if let Some(v) = value {
        params.push((key, v.clone()));
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn trending_movies(&self, page: u32) -> Result<MovieListResponse> {
        self.get_list("trending/movie/week", page).await
    }

    async fn trending_tv(&self, page: u32) -> Result<MovieListResponse> {
        self.get_list("trending/tv/week", page).await
    }

    async fn popular_movies(&self, page: u32) -> Result<MovieListResponse> {
        self.get_list("movie/popular", page).await
    }

    async fn popular_tv(&self, page: u32) -> Result<MovieListResponse> {
        self.get_list("tv/popular", page).await
    }

    async fn top_rated_movies(&self, page: u32) -> Result<MovieListResponse> {
        self.get_list("movie/top_rated", page).await
    }

    async fn upcoming_movies(&self, page: u32) -> Result<MovieListResponse> {
        self.get_list("movie/upcoming", page).await
    }

    async fn discover_tv(&self, page: u32, params: &DiscoverTvParams) -> Result<MovieListResponse> {
        let mut query = vec![("page", page.to_string())];
        push_opt(&mut query, "sort_by", &params.sort_by);
        push_opt(&mut query, "with_networks", &params.with_networks);
        push_opt(&mut query, "with_genres", &params.with_genres);
        push_opt(&mut query, "without_genres", &params.without_genres);
        self.get_json("discover/tv", &query).await
    }

    async fn discover_movies(
        &self,
        page: u32,
        params: &DiscoverMovieParams,
    ) -> Result<MovieListResponse> {
        let mut query = vec![("page", page.to_string())];
        push_opt(&mut query, "sort_by", &params.sort_by);
        push_opt(&mut query, "with_companies", &params.with_companies);
        self.get_json("discover/movie", &query).await
    }

    async fn movie_details(&self, id: i32, append_to_response: &str) -> Result<MovieDetailDto> {
        self.get_json(
            &format!("movie/{id}"),
            &[("append_to_response", append_to_response.to_string())],
        )
        .await
    }

    async fn tv_details(&self, id: i32, append_to_response: &str) -> Result<TvDetailDto> {
        self.get_json(
            &format!("tv/{id}"),
            &[("append_to_response", append_to_response.to_string())],
        )
        .await
    }

    async fn movie_videos(&self, id: i32) -> Result<VideoResponse> {
        self.get_json(&format!("movie/{id}/videos"), &[]).await
    }

    async fn search_movies(&self, query: &str, page: u32) -> Result<MovieListResponse> {
        self.get_json(
            "search/movie",
            &[("query", query.to_string()), ("page", page.to_string())],
        )
        .await
    }

    async fn search_tv(&self, query: &str, page: u32) -> Result<MovieListResponse> {
        self.get_json(
            "search/tv",
            &[("query", query.to_string()), ("page", page.to_string())],
        )
        .await
    }
}

fn first_page() -> u32 {
    1
}

/// One entry of any TMDB list endpoint. Movies carry `title`/`release_date`,
/// TV shows `name`/`first_air_date`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MovieDto {
    pub id: i32,
    pub title: Option<String>,
    pub name: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MovieListResponse {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<MovieDto>,
    pub total_pages: Option<u32>,
    pub total_results: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenreDto {
    pub id: i32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompanyDto {
    pub id: i32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NetworkDto {
    pub id: i32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VideoDto {
    #[serde(default)]
    pub id: String,
    pub name: Option<String>,
    pub site: Option<String>,
    #[serde(rename = "type")]
    pub video_type: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VideoResponse {
    pub id: Option<i32>,
    #[serde(default)]
    pub results: Vec<VideoDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MovieDetailDto {
    pub id: i32,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genres: Vec<GenreDto>,
    #[serde(default)]
    pub production_companies: Vec<CompanyDto>,
    pub videos: Option<VideoResponse>,
    pub recommendations: Option<MovieListResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TvDetailDto {
    pub id: i32,
    pub name: Option<String>,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub episode_run_time: Vec<i32>,
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genres: Vec<GenreDto>,
    pub number_of_seasons: Option<i32>,
    pub number_of_episodes: Option<i32>,
    #[serde(default)]
    pub networks: Vec<NetworkDto>,
    pub videos: Option<VideoResponse>,
    pub recommendations: Option<MovieListResponse>,
}
