//! Report aggregation over a drained simulation

use crate::error::Result;
use crate::simulation::MatchHistory;
use crate::store::RatingStore;
use crate::types::{CompetitorId, CompetitorSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Rating statistics of a population
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub highest_rating: i32,
    pub highest_rating_competitor: Option<CompetitorId>,
    pub lowest_rating: i32,
    pub lowest_rating_competitor: Option<CompetitorId>,
    /// Ceiling of the arithmetic mean
    pub average_rating: i32,
    /// At or below average, up to a third of the way to the top, above that
    pub rating_brackets: [u64; 3],
}

/// Ceiling of `sum / count` for a positive count
fn ceil_div(sum: i64, count: i64) -> i64 {
    -((-sum).div_euclid(count))
}

/// Compute rating statistics; ties on highest or lowest go to the lowest id
pub fn summarize_ratings(competitors: &[CompetitorSnapshot]) -> RatingSummary {
    if competitors.is_empty() {
        return RatingSummary::default();
    }

    let mut highest = &competitors[0];
    let mut lowest = &competitors[0];
    let mut sum: i64 = 0;
    for competitor in competitors {
        sum += i64::from(competitor.rating);
        if competitor.rating > highest.rating
            || (competitor.rating == highest.rating && competitor.id < highest.id)
        {
            highest = competitor;
        }
        if competitor.rating < lowest.rating
            || (competitor.rating == lowest.rating && competitor.id < lowest.id)
        {
            lowest = competitor;
        }
    }

    let average = ceil_div(sum, competitors.len() as i64);
    let upper_threshold = average + (i64::from(highest.rating) - average) / 3;

    let mut rating_brackets = [0u64; 3];
    for competitor in competitors {
        let rating = i64::from(competitor.rating);
        let bracket = if rating <= average {
            0
        } else if rating <= upper_threshold {
            1
        } else {
            2
        };
        rating_brackets[bracket] += 1;
    }

    RatingSummary {
        highest_rating: highest.rating,
        highest_rating_competitor: Some(highest.id),
        lowest_rating: lowest.rating,
        lowest_rating_competitor: Some(lowest.id),
        // The mean of i32 values always fits back into i32
        average_rating: average as i32,
        rating_brackets,
    }
}

/// Final report of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EloSimReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub total_competitors: u64,
    pub total_matches: u64,
    pub failed_matches: u64,
    pub unique_matches: u64,
    pub highest_rating: i32,
    pub highest_rating_competitor: Option<CompetitorId>,
    pub lowest_rating: i32,
    pub lowest_rating_competitor: Option<CompetitorId>,
    pub average_rating: i32,
    pub rating_brackets: [u64; 3],
}

impl EloSimReport {
    /// Serialize the report as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn competitor_label(id: Option<CompetitorId>) -> String {
    match id {
        Some(id) => format!("competitor {}", id),
        None => "no competitors".to_string(),
    }
}

impl fmt::Display for EloSimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let duration = self.ended_at - self.started_at;

        writeln!(f, "Elo simulation report {}", self.run_id)?;
        writeln!(f, "  Started:         {}", self.started_at.to_rfc3339())?;
        writeln!(f, "  Ended:           {}", self.ended_at.to_rfc3339())?;
        writeln!(f, "  Duration:        {}ms", duration.num_milliseconds())?;
        writeln!(f, "  Competitors:     {}", self.total_competitors)?;
        writeln!(f, "  Matches:         {}", self.total_matches)?;
        writeln!(f, "  Failed matches:  {}", self.failed_matches)?;
        writeln!(f, "  Unique pairings: {}", self.unique_matches)?;
        writeln!(
            f,
            "  Highest rating:  {} ({})",
            self.highest_rating,
            competitor_label(self.highest_rating_competitor)
        )?;
        writeln!(
            f,
            "  Lowest rating:   {} ({})",
            self.lowest_rating,
            competitor_label(self.lowest_rating_competitor)
        )?;
        writeln!(f, "  Average rating:  {}", self.average_rating)?;
        write!(
            f,
            "  Brackets:        {} at or below average, {} above, {} top",
            self.rating_brackets[0], self.rating_brackets[1], self.rating_brackets[2]
        )
    }
}

/// Builds reports from the rating store and match history
pub struct ReportAggregator {
    store: RatingStore,
    history: Arc<MatchHistory>,
}

impl ReportAggregator {
    pub fn new(store: RatingStore, history: Arc<MatchHistory>) -> Self {
        Self { store, history }
    }

    /// Generate the report for a drained run
    ///
    /// Only reads state, so calling it repeatedly after the run has drained
    /// returns identical reports.
    pub async fn generate(
        &self,
        run_id: Uuid,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        failed_matches: u64,
    ) -> Result<EloSimReport> {
        let competitors = self.store.snapshot_all().await?;
        let summary = summarize_ratings(&competitors);

        Ok(EloSimReport {
            run_id,
            started_at,
            ended_at,
            total_competitors: competitors.len() as u64,
            total_matches: self.history.total_matches().await,
            failed_matches,
            unique_matches: self.history.unique_pairings().await,
            highest_rating: summary.highest_rating,
            highest_rating_competitor: summary.highest_rating_competitor,
            lowest_rating: summary.lowest_rating,
            lowest_rating_competitor: summary.lowest_rating_competitor,
            average_rating: summary.average_rating,
            rating_brackets: summary.rating_brackets,
        })
    }
}
