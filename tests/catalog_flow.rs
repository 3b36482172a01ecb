use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use globocatalog::app::{build_router, AppState};
use globocatalog::catalog::{Catalog, CINEMA_SECTION_ID, SERIES_SECTION_ID, SOAPS_SECTION_ID};
use globocatalog::classification::IdSet;
use globocatalog::error::CatalogError;
use globocatalog::favorites::{FavoriteStore, MemoryPreferences};
use globocatalog::models::{ContentCategory, MediaType, Movie};
use globocatalog::tmdb::{
    CompanyDto, DiscoverMovieParams, DiscoverTvParams, MovieDetailDto, MovieDto,
    MovieListResponse, NetworkDto, TmdbApi, TmdbError, TvDetailDto, VideoDto, VideoResponse,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

#[derive(Default)]
struct FakeTmdb {
    configured: bool,
    calls: Mutex<Vec<String>>,
    soaps: Vec<MovieDto>,
    globo_series: Vec<MovieDto>,
    popular_tv: Vec<MovieDto>,
    globo_movies: Vec<MovieDto>,
    popular_movies: Vec<MovieDto>,
    movie_search: MovieListResponse,
    tv_search: MovieListResponse,
    movie_detail: Option<MovieDetailDto>,
    tv_detail: Option<TvDetailDto>,
    fail_popular_movies: bool,
}

impl FakeTmdb {
    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }
}

fn list(results: Vec<MovieDto>) -> MovieListResponse {
    MovieListResponse {
        page: 1,
        results,
        total_pages: Some(1),
        total_results: None,
    }
}

#[async_trait::async_trait]
impl TmdbApi for FakeTmdb {
    fn is_configured(&self) -> bool {
        self.configured
    }
    async fn trending_movies(&self, _page: u32) -> anyhow::Result<MovieListResponse> {
        self.record("trending_movies");
        Ok(list(Vec::new()))
    }
    async fn trending_tv(&self, _page: u32) -> anyhow::Result<MovieListResponse> {
        self.record("trending_tv");
        Ok(list(Vec::new()))
    }
    async fn popular_movies(&self, _page: u32) -> anyhow::Result<MovieListResponse> {
        self.record("popular_movies");
        if self.fail_popular_movies {
            anyhow::bail!("connection reset by peer");
        }
        Ok(list(self.popular_movies.clone()))
    }
    async fn popular_tv(&self, _page: u32) -> anyhow::Result<MovieListResponse> {
        self.record("popular_tv");
        Ok(list(self.popular_tv.clone()))
    }
    async fn top_rated_movies(&self, _page: u32) -> anyhow::Result<MovieListResponse> {
        self.record("top_rated_movies");
        Ok(list(Vec::new()))
    }
    async fn upcoming_movies(&self, _page: u32) -> anyhow::Result<MovieListResponse> {
        self.record("upcoming_movies");
        Ok(list(Vec::new()))
    }
    async fn discover_tv(
        &self,
        _page: u32,
        params: &DiscoverTvParams,
    ) -> anyhow::Result<MovieListResponse> {
        assert_eq!(params.with_networks.as_deref(), Some("25"));
        if params.with_genres.as_deref() == Some("10766") {
            assert_eq!(params.without_genres, None);
            self.record("discover_soaps");
            Ok(list(self.soaps.clone()))
        } else {
            assert_eq!(params.without_genres.as_deref(), Some("10766"));
            self.record("discover_series");
            Ok(list(self.globo_series.clone()))
        }
    }
    async fn discover_movies(
        &self,
        _page: u32,
        params: &DiscoverMovieParams,
    ) -> anyhow::Result<MovieListResponse> {
        assert_eq!(params.with_companies.as_deref(), Some("828,1257,3380"));
        self.record("discover_movies");
        Ok(list(self.globo_movies.clone()))
    }
    async fn movie_details(
        &self,
        id: i32,
        append_to_response: &str,
    ) -> anyhow::Result<MovieDetailDto> {
        assert_eq!(append_to_response, "videos,recommendations");
        self.record("movie_details");
        match &self.movie_detail {
            Some(d) if d.id == id => Ok(d.clone()),
            _ => Err(TmdbError::Http {
                path: format!("movie/{id}"),
                status: reqwest::StatusCode::NOT_FOUND,
                body: "The resource you requested could not be found.".to_string(),
            }
            .into()),
        }
    }
    async fn tv_details(&self, id: i32, append_to_response: &str) -> anyhow::Result<TvDetailDto> {
        assert_eq!(append_to_response, "videos,recommendations");
        self.record("tv_details");
        match &self.tv_detail {
            Some(d) if d.id == id => Ok(d.clone()),
            _ => anyhow::bail!("unexpected tv id {}", id),
        }
    }
    async fn movie_videos(&self, _id: i32) -> anyhow::Result<VideoResponse> {
        self.record("movie_videos");
        Ok(VideoResponse::default())
    }
    async fn search_movies(&self, query: &str, page: u32) -> anyhow::Result<MovieListResponse> {
        assert_eq!(query, "brasil");
        self.record("search_movies");
        let mut res = self.movie_search.clone();
        res.page = page;
        Ok(res)
    }
    async fn search_tv(&self, query: &str, _page: u32) -> anyhow::Result<MovieListResponse> {
        assert_eq!(query, "brasil");
        self.record("search_tv");
        Ok(self.tv_search.clone())
    }
}

fn movie_dto(id: i32, title: &str) -> MovieDto {
    MovieDto {
        id,
        title: Some(title.to_string()),
        poster_path: Some(format!("/movie-{id}.jpg")),
        release_date: Some("2020-01-01".to_string()),
        vote_average: Some(7.0),
        ..Default::default()
    }
}

fn tv_dto(id: i32, name: &str) -> MovieDto {
    MovieDto {
        id,
        name: Some(name.to_string()),
        poster_path: Some(format!("/tv-{id}.jpg")),
        first_air_date: Some("2012-03-26".to_string()),
        ..Default::default()
    }
}

fn id_set(values: &[i32]) -> HashSet<i32> {
    values.iter().copied().collect()
}

fn seeded_tmdb() -> FakeTmdb {
    FakeTmdb {
        configured: true,
        soaps: vec![tv_dto(1, "Avenida Brasil"), tv_dto(2, "Mulheres Apaixonadas")],
        globo_series: vec![tv_dto(2, "Mulheres Apaixonadas"), tv_dto(3, "Sob Pressão")],
        popular_tv: vec![tv_dto(3, "Sob Pressão"), tv_dto(4, "Popular Show")],
        globo_movies: vec![movie_dto(10, "Central do Brasil"), movie_dto(11, "Cidade de Deus")],
        popular_movies: vec![movie_dto(11, "Cidade de Deus"), movie_dto(12, "Popular Movie")],
        ..Default::default()
    }
}

async fn catalog_with(tmdb: Arc<FakeTmdb>) -> Catalog {
    let favorites = Arc::new(FavoriteStore::load(Arc::new(MemoryPreferences::new())).await);
    Catalog::new(tmdb, favorites)
}

fn sample_movie(id: i32, media_type: MediaType) -> Movie {
    Movie {
        id,
        title: "Tropa de Elite".to_string(),
        overview: "Capitão Nascimento".to_string(),
        poster_url: Some("https://image.tmdb.org/t/p/w500/tropa.jpg".to_string()),
        backdrop_url: None,
        release_date: Some("2007-10-05".to_string()),
        vote_average: 8.0,
        media_type,
        category: ContentCategory::Film,
        is_from_globo: true,
    }
}

#[tokio::test]
async fn blank_api_key_fails_every_operation_without_network_calls() {
    let tmdb = Arc::new(FakeTmdb::default());
    let catalog = catalog_with(tmdb.clone()).await;

    assert!(matches!(
        catalog.home_sections().await,
        Err(CatalogError::Configuration(_))
    ));
    assert!(matches!(
        catalog.search_content("brasil", 1).await,
        Err(CatalogError::Configuration(_))
    ));
    assert!(matches!(
        catalog.content_details(10, MediaType::Movie).await,
        Err(CatalogError::Configuration(_))
    ));
    assert!(tmdb.calls().is_empty());
}

#[tokio::test]
async fn home_sections_fan_out_and_rewrite_caches() {
    let tmdb = Arc::new(seeded_tmdb());
    let catalog = catalog_with(tmdb.clone()).await;

    let sections = catalog.home_sections().await.expect("home sections");

    assert_eq!(tmdb.calls().len(), 5);
    for call in [
        "discover_soaps",
        "discover_series",
        "popular_tv",
        "discover_movies",
        "popular_movies",
    ] {
        assert_eq!(tmdb.count(call), 1, "{call}");
    }

    // Overlapping id 2 stays in both TV caches; the caches do not enforce
    // exclusivity, only the section filtering does.
    assert_eq!(catalog.caches().get(IdSet::Series), Some(id_set(&[2, 3])));
    assert_eq!(catalog.caches().get(IdSet::Soaps), Some(id_set(&[1, 2])));
    assert_eq!(catalog.caches().get(IdSet::Movies), Some(id_set(&[10, 11])));

    let ids: Vec<&str> = sections.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec![SOAPS_SECTION_ID, SERIES_SECTION_ID, CINEMA_SECTION_ID]);
    assert_eq!(sections[0].title, "Novelas");
    assert_eq!(sections[1].title, "Séries");

    let series_ids: Vec<i32> = sections[1].movies.iter().map(|m| m.id).collect();
    assert_eq!(series_ids, vec![3, 4]);
    assert!(sections[1].movies[0].is_from_globo);
    assert!(!sections[1].movies[1].is_from_globo);

    let cinema_ids: Vec<i32> = sections[2].movies.iter().map(|m| m.id).collect();
    assert_eq!(cinema_ids, vec![10, 11, 12]);
    assert_eq!(
        sections[2].movies[0].poster_url.as_deref(),
        Some("https://image.tmdb.org/t/p/w500/movie-10.jpg")
    );
}

#[tokio::test]
async fn home_sections_fail_as_a_whole_when_one_fetch_fails() {
    let tmdb = Arc::new(FakeTmdb {
        fail_popular_movies: true,
        ..seeded_tmdb()
    });
    let catalog = catalog_with(tmdb.clone()).await;

    match catalog.home_sections().await {
        Err(CatalogError::Provider(msg)) => assert!(msg.contains("connection reset")),
        other => panic!("expected provider error, got {:?}", other),
    }
    assert!(!catalog.caches().is_populated(IdSet::Movies));
    assert!(!catalog.caches().is_populated(IdSet::Soaps));
}

#[tokio::test]
async fn search_populates_caches_lazily_once_and_classifies_hits() {
    let tmdb = Arc::new(FakeTmdb {
        movie_search: MovieListResponse {
            page: 1,
            results: vec![movie_dto(11, "Zeta"), movie_dto(99, "alpha")],
            total_pages: Some(3),
            total_results: Some(50),
        },
        tv_search: MovieListResponse {
            page: 1,
            results: vec![tv_dto(1, "Beta"), tv_dto(3, "gamma"), tv_dto(77, "Delta")],
            total_pages: None,
            total_results: None,
        },
        ..seeded_tmdb()
    });
    let catalog = catalog_with(tmdb.clone()).await;

    let page = catalog.search_content("brasil", 1).await.expect("search");
    assert_eq!(tmdb.count("discover_movies"), 1);
    assert_eq!(tmdb.count("discover_soaps"), 1);
    assert_eq!(tmdb.count("discover_series"), 1);

    assert_eq!(page.page, 1);
    assert_eq!(page.total_pages, 3);
    let titles: Vec<&str> = page.results.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["alpha", "Beta", "Delta", "gamma", "Zeta"]);

    let by_title = |t: &str| page.results.iter().find(|m| m.title == t).unwrap();
    assert!(by_title("Zeta").is_from_globo);
    assert_eq!(by_title("Zeta").category, ContentCategory::Film);
    assert!(!by_title("alpha").is_from_globo);
    assert_eq!(by_title("Beta").category, ContentCategory::Soap);
    assert!(by_title("Beta").is_from_globo);
    assert_eq!(by_title("gamma").category, ContentCategory::Series);
    assert!(by_title("gamma").is_from_globo);
    assert_eq!(by_title("Delta").category, ContentCategory::Series);
    assert!(!by_title("Delta").is_from_globo);

    catalog.search_content("brasil", 1).await.expect("second search");
    assert_eq!(tmdb.count("discover_movies"), 1);
    assert_eq!(tmdb.count("discover_soaps"), 1);
    assert_eq!(tmdb.count("search_movies"), 2);
    assert_eq!(tmdb.count("search_tv"), 2);
}

#[tokio::test]
async fn search_reports_min_page_and_max_total_pages() {
    let tmdb = Arc::new(FakeTmdb {
        movie_search: MovieListResponse {
            page: 2,
            results: Vec::new(),
            total_pages: None,
            total_results: None,
        },
        tv_search: MovieListResponse {
            page: 1,
            results: Vec::new(),
            total_pages: Some(4),
            total_results: None,
        },
        ..seeded_tmdb()
    });
    let catalog = catalog_with(tmdb).await;

    let page = catalog.search_content("brasil", 2).await.expect("search");
    assert_eq!(page.page, 1);
    assert_eq!(page.total_pages, 4);
    assert!(page.results.is_empty());
}

#[tokio::test]
async fn search_after_home_reuses_home_caches() {
    let tmdb = Arc::new(seeded_tmdb());
    let catalog = catalog_with(tmdb.clone()).await;

    catalog.home_sections().await.expect("home");
    catalog.search_content("brasil", 1).await.expect("search");

    assert_eq!(tmdb.count("discover_movies"), 1);
    assert_eq!(tmdb.count("discover_soaps"), 1);
    assert_eq!(tmdb.count("discover_series"), 1);
}

#[tokio::test]
async fn movie_details_use_production_companies_and_movie_cache() {
    let tmdb = Arc::new(FakeTmdb {
        movie_detail: Some(MovieDetailDto {
            id: 500,
            title: Some("O Auto da Compadecida".to_string()),
            original_title: Some("O Auto da Compadecida".to_string()),
            runtime: Some(104),
            production_companies: vec![CompanyDto {
                id: 1257,
                name: "Globo Filmes".to_string(),
            }],
            videos: Some(VideoResponse {
                id: Some(500),
                results: vec![
                    VideoDto {
                        id: "a".to_string(),
                        site: Some("YouTube".to_string()),
                        video_type: Some("Featurette".to_string()),
                        key: Some("feat".to_string()),
                        ..Default::default()
                    },
                    VideoDto {
                        id: "b".to_string(),
                        site: Some("YouTube".to_string()),
                        video_type: Some("Trailer".to_string()),
                        key: Some("abc".to_string()),
                        ..Default::default()
                    },
                ],
            }),
            recommendations: Some(list(vec![movie_dto(10, "Globo rec"), movie_dto(12, "Other rec")])),
            ..Default::default()
        }),
        ..seeded_tmdb()
    });
    let catalog = catalog_with(tmdb).await;

    let detail = catalog
        .content_details(500, MediaType::Movie)
        .await
        .expect("movie detail");
    assert!(detail.movie.is_from_globo);
    assert_eq!(detail.movie.category, ContentCategory::Film);
    assert_eq!(detail.movie.media_type, MediaType::Movie);
    assert_eq!(detail.trailer_key.as_deref(), Some("abc"));
    assert_eq!(detail.runtime_minutes, Some(104));
    assert_eq!(detail.recommendations.len(), 2);
    assert!(detail.recommendations[0].is_from_globo);
    assert!(!detail.recommendations[1].is_from_globo);
}

#[tokio::test]
async fn tv_details_take_category_from_soap_cache_and_globo_flag_from_networks() {
    let tmdb = Arc::new(FakeTmdb {
        tv_detail: Some(TvDetailDto {
            id: 1,
            name: Some("Avenida Brasil".to_string()),
            networks: vec![NetworkDto {
                id: 25,
                name: "TV Globo".to_string(),
            }],
            number_of_seasons: Some(1),
            number_of_episodes: Some(179),
            episode_run_time: vec![50],
            recommendations: Some(list(vec![
                tv_dto(2, "Soap rec"),
                tv_dto(3, "Series rec"),
                tv_dto(4, "Foreign rec"),
            ])),
            ..Default::default()
        }),
        ..seeded_tmdb()
    });
    let catalog = catalog_with(tmdb).await;

    let detail = catalog
        .content_details(1, MediaType::Tv)
        .await
        .expect("tv detail");
    assert_eq!(detail.movie.category, ContentCategory::Soap);
    assert!(detail.movie.is_from_globo);
    assert_eq!(detail.movie.media_type, MediaType::Tv);
    assert_eq!(detail.season_count, Some(1));
    assert_eq!(detail.episode_count, Some(179));

    let recs: Vec<(i32, ContentCategory, bool)> = detail
        .recommendations
        .iter()
        .map(|m| (m.id, m.category, m.is_from_globo))
        .collect();
    assert_eq!(
        recs,
        vec![
            (2, ContentCategory::Soap, true),
            (3, ContentCategory::Series, true),
            (4, ContentCategory::Series, false),
        ]
    );
}

#[tokio::test]
async fn missing_movie_surfaces_as_not_found() {
    let tmdb = Arc::new(seeded_tmdb());
    let catalog = catalog_with(tmdb).await;

    let err = catalog
        .content_details(404, MediaType::Movie)
        .await
        .expect_err("unknown id");
    assert!(matches!(err, CatalogError::NotFound(_)));
}

#[tokio::test]
async fn short_queries_return_nothing_without_provider_calls() {
    let tmdb = Arc::new(seeded_tmdb());
    let catalog = catalog_with(tmdb.clone()).await;

    for query in ["", "ab", "  ab  ", "é"] {
        let page = catalog.search_content(query, 2).await.expect("short query");
        assert!(page.results.is_empty(), "{query:?}");
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 1);
    }
    assert!(tmdb.calls().is_empty());

    let unconfigured = catalog_with(Arc::new(FakeTmdb::default())).await;
    assert!(unconfigured.search_content("ab", 1).await.is_ok());
}

#[tokio::test]
async fn search_trims_the_query_before_calling_the_provider() {
    let tmdb = Arc::new(seeded_tmdb());
    let catalog = catalog_with(tmdb.clone()).await;
    catalog.search_content("  brasil  ", 1).await.expect("search");
    assert_eq!(tmdb.count("search_movies"), 1);
    assert_eq!(tmdb.count("search_tv"), 1);
}

#[tokio::test]
async fn toggling_favorite_twice_restores_the_list() {
    let catalog = catalog_with(Arc::new(FakeTmdb::default())).await;
    catalog
        .toggle_favorite(&sample_movie(1, MediaType::Tv))
        .await
        .expect("seed");
    let before = catalog.favorites();

    let movie = sample_movie(1, MediaType::Movie);
    catalog.toggle_favorite(&movie).await.expect("add");
    assert!(catalog.is_favorite(1, MediaType::Movie));
    catalog.toggle_favorite(&movie).await.expect("remove");

    assert_eq!(catalog.favorites(), before);
    assert!(!catalog.is_favorite(1, MediaType::Movie));
    assert!(catalog.is_favorite(1, MediaType::Tv));
}

async fn app(tmdb: FakeTmdb) -> Router {
    app_with(Arc::new(tmdb)).await
}

async fn app_with(tmdb: Arc<FakeTmdb>) -> Router {
    let catalog = catalog_with(tmdb).await;
    build_router(AppState {
        catalog: Arc::new(catalog),
    })
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn router_reports_health() {
    let app = app(FakeTmdb::default()).await;
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn router_maps_missing_key_to_service_unavailable() {
    let app = app(FakeTmdb::default()).await;
    let (status, body) = send(&app, get("/home")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("TMDB_API_KEY"));
}

#[tokio::test]
async fn router_serves_home_sections_as_json() {
    let app = app(seeded_tmdb()).await;
    let (status, body) = send(&app, get("/home")).await;
    assert_eq!(status, StatusCode::OK);
    let sections = body.as_array().expect("array");
    assert_eq!(sections.len(), 3);
    assert_eq!(sections[0]["id"], "novelas");
    assert_eq!(sections[0]["movies"][0]["category"], "NOVELA");
    assert_eq!(sections[0]["movies"][0]["media_type"], "TV");
}

#[tokio::test]
async fn router_rejects_bad_input() {
    let app = app(seeded_tmdb()).await;
    let (status, _) = send(&app, get("/search?query=%20%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = send(&app, get("/content/podcast/1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("movie"));
}

#[tokio::test]
async fn router_maps_unknown_detail_to_not_found() {
    let app = app(seeded_tmdb()).await;
    let (status, _) = send(&app, get("/content/movie/404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn router_toggles_and_reports_favorites() {
    let app = app(FakeTmdb::default()).await;
    let movie = serde_json::to_string(&sample_movie(42, MediaType::Movie)).unwrap();
    let toggle = || {
        Request::builder()
            .method("POST")
            .uri("/favorites/toggle")
            .header("content-type", "application/json")
            .body(Body::from(movie.clone()))
            .unwrap()
    };

    let (status, body) = send(&app, toggle()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (_, body) = send(&app, get("/favorites/movie/42")).await;
    assert_eq!(body["favorite"], json!(true));
    let (_, body) = send(&app, get("/favorites/tv/42")).await;
    assert_eq!(body["favorite"], json!(false));

    let (_, body) = send(&app, toggle()).await;
    assert_eq!(body, json!([]));
    let (_, body) = send(&app, get("/favorites")).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn router_replaces_favorites() {
    let app = app(FakeTmdb::default()).await;
    let movies = json!([sample_movie(1, MediaType::Movie), sample_movie(2, MediaType::Tv)]);
    let req = Request::builder()
        .method("PUT")
        .uri("/favorites")
        .header("content-type", "application/json")
        .body(Body::from(movies.to_string()))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    assert_eq!(body[1]["media_type"], "TV");
}

#[tokio::test]
async fn router_filters_home_to_globo_content_on_request() {
    let app = app(seeded_tmdb()).await;
    let (status, body) = send(&app, get("/home?globo_only=true")).await;
    assert_eq!(status, StatusCode::OK);
    let sections = body.as_array().expect("array");
    let ids: Vec<Vec<i64>> = sections
        .iter()
        .map(|s| {
            s["movies"]
                .as_array()
                .unwrap()
                .iter()
                .map(|m| m["id"].as_i64().unwrap())
                .collect()
        })
        .collect();
    assert_eq!(ids, vec![vec![1, 2], vec![3], vec![10, 11]]);
    assert!(sections
        .iter()
        .flat_map(|s| s["movies"].as_array().unwrap())
        .all(|m| m["is_from_globo"] == json!(true)));
}

#[tokio::test]
async fn router_filters_search_to_globo_content_on_request() {
    let app = app(FakeTmdb {
        movie_search: list(vec![
            movie_dto(10, "Central do Brasil"),
            movie_dto(99, "Brasil Abroad"),
        ]),
        tv_search: list(vec![
            tv_dto(1, "Avenida Brasil"),
            tv_dto(77, "Brasil Show"),
        ]),
        ..seeded_tmdb()
    })
    .await;

    let (status, body) = send(&app, get("/search?query=brasil")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(4));

    let (status, body) = send(&app, get("/search?query=brasil&globo_only=true")).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Avenida Brasil", "Central do Brasil"]);
}

#[tokio::test]
async fn router_answers_short_search_with_an_empty_page() {
    let tmdb = Arc::new(seeded_tmdb());
    let app = app_with(tmdb.clone()).await;
    let (status, body) = send(&app, get("/search?query=ab")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));
    assert!(tmdb.calls().is_empty());
}

#[tokio::test]
async fn router_rejects_non_numeric_ids_with_json_errors() {
    let app = app(seeded_tmdb()).await;
    for uri in ["/content/movie/abc", "/favorites/tv/xyz"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(
            body["error"].as_str().unwrap().contains("id must be an integer"),
            "{uri}: {body}"
        );
    }
}

#[tokio::test]
async fn router_collapses_repeated_favorites_on_replace() {
    let app = app(FakeTmdb::default()).await;
    let movies = json!([
        sample_movie(1, MediaType::Movie),
        sample_movie(2, MediaType::Tv),
        sample_movie(1, MediaType::Movie),
    ]);
    let req = Request::builder()
        .method("PUT")
        .uri("/favorites")
        .header("content-type", "application/json")
        .body(Body::from(movies.to_string()))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let toggle = Request::builder()
        .method("POST")
        .uri("/favorites/toggle")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&sample_movie(1, MediaType::Movie)).unwrap(),
        ))
        .unwrap();
    send(&app, toggle).await;
    let (_, body) = send(&app, get("/favorites/movie/1")).await;
    assert_eq!(body["favorite"], json!(false));
}
