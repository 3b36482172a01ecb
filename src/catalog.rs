//! Aggregation over TMDB: home sections, search and details, each item tagged
//! as Globo content from cached id sets.

use std::collections::HashSet;
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

use crate::classification::{ClassificationCache, ClassificationSnapshot, IdSet};
use crate::error::CatalogError;
use crate::favorites::FavoriteStore;
use crate::mapper;
use crate::models::{
    dedup_by, ContentCategory, MediaType, Movie, MovieDetail, MovieSection, PagedMovies,
};
use crate::tmdb::{DiscoverMovieParams, DiscoverTvParams, MovieDto, TmdbApi};

pub const GLOBO_NETWORK_ID: i32 = 25;
pub const GLOBO_SOAP_GENRE_ID: &str = "10766";
pub const GLOBO_COMPANY_IDS: [i32; 3] = [828, 1257, 3380];
const SORT_BY_POPULARITY: &str = "popularity.desc";
const DETAIL_APPEND: &str = "videos,recommendations";
const HOME_PAGE: u32 = 1;
/// Trimmed queries shorter than this return no results without a provider call.
pub const MIN_QUERY_CHARS: usize = 3;

pub const SOAPS_SECTION_ID: &str = "novelas";
pub const SERIES_SECTION_ID: &str = "series";
pub const CINEMA_SECTION_ID: &str = "cinema";

fn soap_opera_filter() -> DiscoverTvParams {
    DiscoverTvParams {
        sort_by: Some(SORT_BY_POPULARITY.to_string()),
        with_networks: Some(GLOBO_NETWORK_ID.to_string()),
        with_genres: Some(GLOBO_SOAP_GENRE_ID.to_string()),
        without_genres: None,
    }
}

fn globo_series_filter() -> DiscoverTvParams {
    DiscoverTvParams {
        sort_by: Some(SORT_BY_POPULARITY.to_string()),
        with_networks: Some(GLOBO_NETWORK_ID.to_string()),
        with_genres: None,
        without_genres: Some(GLOBO_SOAP_GENRE_ID.to_string()),
    }
}

fn globo_movie_filter() -> DiscoverMovieParams {
    DiscoverMovieParams {
        sort_by: Some(SORT_BY_POPULARITY.to_string()),
        with_companies: Some(
            GLOBO_COMPANY_IDS
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}

fn ids(dtos: &[MovieDto]) -> HashSet<i32> {
    dtos.iter().map(|d| d.id).collect()
}

fn tv_to_movie(dto: &MovieDto, caches: &ClassificationSnapshot) -> Movie {
    let category = if caches.is_soap(dto.id) {
        ContentCategory::Soap
    } else {
        ContentCategory::Series
    };
    mapper::to_movie(dto, MediaType::Tv, category, caches.is_globo_tv(dto.id))
}

/// Raw inputs of the home screen, one list per provider call.
#[derive(Debug, Clone, Default)]
pub struct HomeFeeds {
    pub soaps: Vec<MovieDto>,
    pub globo_series: Vec<MovieDto>,
    pub popular_tv: Vec<MovieDto>,
    pub globo_movies: Vec<MovieDto>,
    pub popular_movies: Vec<MovieDto>,
}

impl HomeFeeds {
    /// Id sets implied by the Globo-only feeds.
    pub fn classification(&self) -> ClassificationSnapshot {
        ClassificationSnapshot {
            movies: Some(ids(&self.globo_movies)),
            series: Some(ids(&self.globo_series)),
            soaps: Some(ids(&self.soaps)),
        }
    }
}

/// Builds the fixed-order sections (novelas, series, cinema). Items without a
/// poster are dropped, then empty sections.
pub fn build_home_sections(
    feeds: &HomeFeeds,
    caches: &ClassificationSnapshot,
) -> Vec<MovieSection> {
    let soaps = mapper::to_domain_list(&feeds.soaps, MediaType::Tv, ContentCategory::Soap, |_| {
        true
    });

    let series_dtos: Vec<MovieDto> = dedup_by(
        feeds
            .globo_series
            .iter()
            .chain(feeds.popular_tv.iter())
            .filter(|dto| !caches.is_soap(dto.id))
            .cloned(),
        |dto| dto.id,
    );
    let series = mapper::to_domain_list(
        &series_dtos,
        MediaType::Tv,
        ContentCategory::Series,
        |dto| caches.is_globo_series(dto.id),
    );

    let movie_dtos: Vec<MovieDto> = dedup_by(
        feeds
            .globo_movies
            .iter()
            .chain(feeds.popular_movies.iter())
            .cloned(),
        |dto| dto.id,
    );
    let cinema = mapper::to_domain_list(
        &movie_dtos,
        MediaType::Movie,
        ContentCategory::Film,
        |dto| caches.is_globo_movie(dto.id),
    );

    [
        (SOAPS_SECTION_ID, "Novelas", soaps),
        (SERIES_SECTION_ID, "Séries", series),
        (CINEMA_SECTION_ID, "Cinema", cinema),
    ]
    .into_iter()
    .map(|(id, title, movies)| MovieSection {
        id: id.to_string(),
        title: title.to_string(),
        movies: movies
            .into_iter()
            .filter(|m| m.poster_url.is_some())
            .collect(),
    })
    .filter(|section| !section.movies.is_empty())
    .collect()
}

/// Keeps only Globo items in every section, then drops sections left empty.
pub fn only_globo_sections(sections: Vec<MovieSection>) -> Vec<MovieSection> {
    sections
        .into_iter()
        .map(|section| MovieSection {
            movies: only_globo(section.movies),
            ..section
        })
        .filter(|section| !section.movies.is_empty())
        .collect()
}

pub fn only_globo(movies: Vec<Movie>) -> Vec<Movie> {
    movies.into_iter().filter(|m| m.is_from_globo).collect()
}

/// Merges movie and TV hits, drops duplicate `(id, media_type)` pairs and
/// sorts by title, ignoring case. The sort is stable.
pub fn merge_search_results(movies: Vec<Movie>, shows: Vec<Movie>) -> Vec<Movie> {
    let mut combined = dedup_by(movies.into_iter().chain(shows), Movie::key);
    combined.sort_by_cached_key(|m| m.title.to_lowercase());
    combined
}

pub struct Catalog {
    tmdb: Arc<dyn TmdbApi>,
    favorites: Arc<FavoriteStore>,
    caches: Arc<ClassificationCache>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("tmdb_configured", &self.tmdb.is_configured())
            .field("caches", &self.caches)
            .finish()
    }
}

impl Catalog {
    pub fn new(tmdb: Arc<dyn TmdbApi>, favorites: Arc<FavoriteStore>) -> Self {
        Self::with_caches(tmdb, favorites, Arc::new(ClassificationCache::new()))
    }

    pub fn with_caches(
        tmdb: Arc<dyn TmdbApi>,
        favorites: Arc<FavoriteStore>,
        caches: Arc<ClassificationCache>,
    ) -> Self {
        Self {
            tmdb,
            favorites,
            caches,
        }
    }

    pub fn caches(&self) -> &ClassificationCache {
        &self.caches
    }

    fn require_api_key(&self) -> Result<(), CatalogError> {
        if self.tmdb.is_configured() {
            Ok(())
        } else {
            Err(CatalogError::missing_api_key())
        }
    }

    /// Loads the three home sections and rewrites every classification cache
    /// from the fetched lists.
    pub async fn home_sections(&self) -> Result<Vec<MovieSection>, CatalogError> {
        self.require_api_key()?;
        info!("Loading home sections");

        let soap_filter = soap_opera_filter();
        let series_filter = globo_series_filter();
        let movie_filter = globo_movie_filter();
        let (soaps, globo_series, popular_tv, globo_movies, popular_movies) = tokio::try_join!(
            self.tmdb.discover_tv(HOME_PAGE, &soap_filter),
            self.tmdb.discover_tv(HOME_PAGE, &series_filter),
            self.tmdb.popular_tv(HOME_PAGE),
            self.tmdb.discover_movies(HOME_PAGE, &movie_filter),
            self.tmdb.popular_movies(HOME_PAGE),
        )?;

        let feeds = HomeFeeds {
            soaps: soaps.results,
            globo_series: globo_series.results,
            popular_tv: popular_tv.results,
            globo_movies: globo_movies.results,
            popular_movies: popular_movies.results,
        };
        let classification = feeds.classification();
        self.caches.replace_all(classification.clone());
        let sections = build_home_sections(&feeds, &classification);
        info!(
            "Home loaded: {}",
            sections
                .iter()
                .map(|s| format!("{}={}", s.id, s.movies.len()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(sections)
    }

    /// Populates whichever classification sets are still empty. Series and
    /// soap ids are always fetched and stored as a pair.
    pub async fn ensure_classification_caches(&self) -> Result<(), CatalogError> {
        self.require_api_key()?;

        if !self.caches.is_populated(IdSet::Movies) {
            debug!("Populating Globo movie cache");
            let movies = self
                .tmdb
                .discover_movies(HOME_PAGE, &globo_movie_filter())
                .await?;
            self.caches.set(IdSet::Movies, ids(&movies.results));
        }

        if !self.caches.is_populated(IdSet::Series) || !self.caches.is_populated(IdSet::Soaps) {
            debug!("Populating Globo series and soap caches");
            let soap_filter = soap_opera_filter();
            let series_filter = globo_series_filter();
            let (soaps, series) = tokio::try_join!(
                self.tmdb.discover_tv(HOME_PAGE, &soap_filter),
                self.tmdb.discover_tv(HOME_PAGE, &series_filter),
            )?;
            self.caches
                .set_tv(ids(&series.results), ids(&soaps.results));
        }

        Ok(())
    }

    pub async fn search_content(&self, query: &str, page: u32) -> Result<PagedMovies, CatalogError> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            debug!("Query '{}' is too short, not searching", query);
            return Ok(PagedMovies {
                page,
                total_pages: 1,
                results: Vec::new(),
            });
        }
        self.require_api_key()?;
        self.ensure_classification_caches().await?;
        info!("Searching '{}' (page {})", query, page);

        let (movie_hits, tv_hits) = tokio::try_join!(
            self.tmdb.search_movies(query, page),
            self.tmdb.search_tv(query, page),
        )?;

        let caches = self.caches.snapshot();
        let movies = mapper::to_domain_list(
            &movie_hits.results,
            MediaType::Movie,
            ContentCategory::Film,
            |dto| caches.is_globo_movie(dto.id),
        );
        let shows = tv_hits
            .results
            .iter()
            .map(|dto| tv_to_movie(dto, &caches))
            .collect();

        Ok(PagedMovies {
            page: movie_hits.page.min(tv_hits.page),
            total_pages: movie_hits
                .total_pages
                .unwrap_or(1)
                .max(tv_hits.total_pages.unwrap_or(1)),
            results: merge_search_results(movies, shows),
        })
    }

    pub async fn content_details(
        &self,
        id: i32,
        media_type: MediaType,
    ) -> Result<MovieDetail, CatalogError> {
        self.require_api_key()?;
        self.ensure_classification_caches().await?;
        info!("Loading details for {} {}", media_type, id);

        match media_type {
            MediaType::Movie => self.movie_details(id).await,
            MediaType::Tv => self.tv_details(id).await,
        }
    }

    async fn movie_details(&self, id: i32) -> Result<MovieDetail, CatalogError> {
        let dto = self.tmdb.movie_details(id, DETAIL_APPEND).await?;
        let caches = self.caches.snapshot();
        let recommendations = dto
            .recommendations
            .as_ref()
            .map(|r| {
                mapper::to_domain_list(
                    &r.results,
                    MediaType::Movie,
                    ContentCategory::Film,
                    |rec| caches.is_globo_movie(rec.id),
                )
            })
            .unwrap_or_default();
        // Production companies are authoritative for the item itself.
        let is_from_globo = dto
            .production_companies
            .iter()
            .any(|c| GLOBO_COMPANY_IDS.contains(&c.id));
        Ok(mapper::to_movie_detail(
            &dto,
            ContentCategory::Film,
            is_from_globo,
            recommendations,
        ))
    }

    async fn tv_details(&self, id: i32) -> Result<MovieDetail, CatalogError> {
        let dto = self.tmdb.tv_details(id, DETAIL_APPEND).await?;
        let caches = self.caches.snapshot();
        let recommendations: Vec<Movie> = dto
            .recommendations
            .as_ref()
            .map(|r| {
                r.results
                    .iter()
                    .map(|rec| tv_to_movie(rec, &caches))
                    .collect()
            })
            .unwrap_or_default();
        let is_from_globo = dto.networks.iter().any(|n| n.id == GLOBO_NETWORK_ID);
        // TV details carry no soap marker, so the category comes from the cache.
        let category = if caches.is_soap(id) {
            ContentCategory::Soap
        } else {
            ContentCategory::Series
        };
        Ok(mapper::to_tv_detail(
            &dto,
            category,
            is_from_globo,
            recommendations,
        ))
    }

    pub fn observe_favorites(&self) -> WatchStream<Vec<Movie>> {
        self.favorites.observe()
    }

    pub fn favorites(&self) -> Vec<Movie> {
        self.favorites.snapshot()
    }

    pub fn is_favorite(&self, id: i32, media_type: MediaType) -> bool {
        self.favorites.is_favorite(id, media_type)
    }

    pub async fn toggle_favorite(&self, movie: &Movie) -> Result<Vec<Movie>, CatalogError> {
        self.favorites
            .toggle(movie)
            .await
            .map_err(|e| CatalogError::Storage(format!("{:#}", e)))
    }

    pub async fn replace_favorites(&self, movies: Vec<Movie>) -> Result<(), CatalogError> {
        self.favorites
            .replace_all(movies)
            .await
            .map_err(|e| CatalogError::Storage(format!("{:#}", e)))
    }
}
