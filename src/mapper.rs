//! Conversions from TMDB response shapes into catalog entities. Everything here
//! is pure and total: missing fields fall back to defaults, never to errors.

use crate::models::{ContentCategory, MediaType, Movie, MovieDetail};
use crate::tmdb::{MovieDetailDto, MovieDto, TvDetailDto, VideoDto, VideoResponse};

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/";
const POSTER_SIZE: &str = "w500";
const BACKDROP_SIZE: &str = "w780";

fn image_url(path: Option<&str>, size: &str) -> Option<String> {
    path.map(|p| format!("{IMAGE_BASE}{size}{p}"))
}

pub fn poster_url(path: Option<&str>) -> Option<String> {
    image_url(path, POSTER_SIZE)
}

pub fn backdrop_url(path: Option<&str>) -> Option<String> {
    image_url(path, BACKDROP_SIZE)
}

pub fn to_movie(
    dto: &MovieDto,
    media_type: MediaType,
    category: ContentCategory,
    is_from_globo: bool,
) -> Movie {
    Movie {
        id: dto.id,
        title: dto
            .title
            .clone()
            .or_else(|| dto.name.clone())
            .unwrap_or_default(),
        overview: dto.overview.clone().unwrap_or_default(),
        poster_url: poster_url(dto.poster_path.as_deref()),
        backdrop_url: backdrop_url(dto.backdrop_path.as_deref()),
        release_date: dto
            .release_date
            .clone()
            .or_else(|| dto.first_air_date.clone()),
        vote_average: dto.vote_average.unwrap_or(0.0),
        media_type,
        category,
        is_from_globo,
    }
}

/// Maps a whole result list; `is_from_globo` decides membership per item.
pub fn to_domain_list<F>(
    dtos: &[MovieDto],
    media_type: MediaType,
    category: ContentCategory,
    is_from_globo: F,
) -> Vec<Movie>
where
    F: Fn(&MovieDto) -> bool,
{
    dtos.iter()
        .map(|dto| to_movie(dto, media_type, category, is_from_globo(dto)))
        .collect()
}

pub fn to_movie_detail(
    dto: &MovieDetailDto,
    category: ContentCategory,
    is_from_globo: bool,
    recommendations: Vec<Movie>,
) -> MovieDetail {
    MovieDetail {
        movie: Movie {
            id: dto.id,
            title: dto.title.clone().unwrap_or_default(),
            overview: dto.overview.clone().unwrap_or_default(),
            poster_url: poster_url(dto.poster_path.as_deref()),
            backdrop_url: backdrop_url(dto.backdrop_path.as_deref()),
            release_date: dto.release_date.clone(),
            vote_average: dto.vote_average.unwrap_or(0.0),
            media_type: MediaType::Movie,
            category,
            is_from_globo,
        },
        original_title: dto.original_title.clone(),
        genres: dto.genres.iter().map(|g| g.name.clone()).collect(),
        runtime_minutes: dto.runtime,
        trailer_key: select_trailer(dto.videos.as_ref()),
        season_count: None,
        episode_count: None,
        recommendations,
    }
}

pub fn to_tv_detail(
    dto: &TvDetailDto,
    category: ContentCategory,
    is_from_globo: bool,
    recommendations: Vec<Movie>,
) -> MovieDetail {
    MovieDetail {
        movie: Movie {
            id: dto.id,
            title: dto.name.clone().unwrap_or_default(),
            overview: dto.overview.clone().unwrap_or_default(),
            poster_url: poster_url(dto.poster_path.as_deref()),
            backdrop_url: backdrop_url(dto.backdrop_path.as_deref()),
            release_date: dto.first_air_date.clone(),
            vote_average: dto.vote_average.unwrap_or(0.0),
            media_type: MediaType::Tv,
            category,
            is_from_globo,
        },
        original_title: dto.original_name.clone(),
        genres: dto.genres.iter().map(|g| g.name.clone()).collect(),
        runtime_minutes: dto.episode_run_time.first().copied(),
        trailer_key: select_trailer(dto.videos.as_ref()),
        season_count: dto.number_of_seasons,
        episode_count: dto.number_of_episodes,
        recommendations,
    }
}

/// First YouTube trailer with a usable key, in provider order.
pub fn select_trailer(videos: Option<&VideoResponse>) -> Option<String> {
    videos?
        .results
        .iter()
        .find(|v| is_youtube_trailer(v))
        .and_then(|v| v.key.clone())
}

fn is_youtube_trailer(video: &VideoDto) -> bool {
    let is_trailer = video
        .video_type
        .as_deref()
        .is_some_and(|t| t.eq_ignore_ascii_case("Trailer"));
    let on_youtube = video
        .site
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("YouTube"));
    let has_key = video.key.as_deref().is_some_and(|k| !k.trim().is_empty());
    is_trailer && on_youtube && has_key
}
