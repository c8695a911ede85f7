use serde::{Deserialize, Serialize};

/// TMDB movie identifier
pub type TmdbId = u64;

/// A movie as returned by the TMDB list and search endpoints.
///
/// Field names follow TMDB's snake_case wire format so catalog responses can be
/// passed through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: TmdbId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

impl Movie {
    /// Release year parsed from the `YYYY-MM-DD` release date
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .and_then(|year| year.parse().ok())
    }
}

/// One page of a paginated TMDB listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoviePage {
    pub page: u32,
    #[serde(default)]
    pub results: Vec<Movie>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

impl MoviePage {
    pub fn empty(page: u32) -> Self {
        Self {
            page,
            results: Vec::new(),
            total_pages: 0,
            total_results: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub video_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Videos {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SimilarMovies {
    #[serde(default)]
    pub results: Vec<Movie>,
}

/// Full movie record from `/movie/{id}?append_to_response=credits,videos,similar`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub credits: Credits,
    #[serde(default)]
    pub videos: Videos,
    #[serde(default)]
    pub similar: SimilarMovies,
}

impl MovieDetails {
    /// First YouTube trailer, if TMDB lists one
    pub fn trailer(&self) -> Option<&Video> {
        self.videos
            .results
            .iter()
            .find(|video| video.site == "YouTube" && video.video_type == "Trailer")
    }
}
