use serde::{Deserialize, Serialize};

use super::CandidateItem;

// ============================================================================
// TMDb API Types
// ============================================================================

/// One page of `/discover/movie`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbDiscoverPage {
    pub page: u32,
    pub total_pages: u32,
    pub results: Vec<TmdbMovieSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbMovieSummary {
    pub id: u64,
}

/// `/movie/{id}` with `append_to_response=keywords,credits`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub genres: Vec<TmdbNamed>,
    #[serde(default)]
    pub keywords: TmdbKeywords,
    #[serde(default)]
    pub credits: TmdbCredits,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbNamed {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TmdbKeywords {
    #[serde(default)]
    pub keywords: Vec<TmdbNamed>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbCrewMember {
    pub name: String,
    pub job: String,
}

impl From<TmdbMovieDetails> for CandidateItem {
    fn from(details: TmdbMovieDetails) -> Self {
        let director = details
            .credits
            .crew
            .into_iter()
            .find(|member| member.job == "Director")
            .map(|member| member.name);

        CandidateItem {
            id: details.id,
            title: details.title,
            overview: details.overview.unwrap_or_default(),
            tagline: details.tagline.unwrap_or_default(),
            genres: details.genres.into_iter().map(|g| g.name).collect(),
            keywords: details
                .keywords
                .keywords
                .into_iter()
                .map(|k| k.name)
                .collect(),
            director,
            vote_average: details.vote_average,
            vote_count: details.vote_count,
            popularity: details.popularity,
        }
    }
}
