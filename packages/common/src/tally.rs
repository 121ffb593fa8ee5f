use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

/// One candidate's line in an election tally.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct CandidateTally {
    pub candidate_id: Uuid,
    #[schema(example = "Jane Smith")]
    pub candidate_name: String,
    #[schema(example = 623)]
    pub vote_count: u64,
    /// Share of all votes cast, rounded to one decimal place.
    #[schema(example = 50.0)]
    pub percentage: f64,
}

/// Per-candidate counts for one election, ranked for display.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct Tally {
    /// Ordered by vote count descending, then candidate id ascending.
    pub candidates: Vec<CandidateTally>,
    #[schema(example = 1245)]
    pub total_votes: u64,
    /// First ranked candidate, or `None` when no votes were cast.
    pub winner: Option<Uuid>,
    /// True when the top two candidates have the same non-zero count.
    pub is_tie: bool,
}

impl Tally {
    /// Build a tally from the candidate list and the grouped vote counts.
    ///
    /// Every candidate appears in the output; candidates without a count row get zero.
    /// Count rows for ids outside the candidate list are ignored.
    pub fn from_counts<C, V>(candidates: C, counts: V) -> Self
    where
        C: IntoIterator<Item = (Uuid, String)>,
        V: IntoIterator<Item = (Uuid, u64)>,
    {
        let counts: HashMap<Uuid, u64> = counts.into_iter().collect();

        let mut rows: Vec<(Uuid, String, u64)> = candidates
            .into_iter()
            .map(|(id, name)| {
                let count = counts.get(&id).copied().unwrap_or(0);
                (id, name, count)
            })
            .collect();

        rows.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));

        let total_votes: u64 = rows.iter().map(|r| r.2).sum();

        let winner = if total_votes > 0 {
            rows.first().map(|r| r.0)
        } else {
            None
        };
        let is_tie = total_votes > 0 && rows.len() > 1 && rows[0].2 == rows[1].2;

        let candidates = rows
            .into_iter()
            .map(|(candidate_id, candidate_name, vote_count)| CandidateTally {
                candidate_id,
                candidate_name,
                vote_count,
                percentage: percentage(vote_count, total_votes),
            })
            .collect();

        Self {
            candidates,
            total_votes,
            winner,
            is_tie,
        }
    }

    /// Name of the winning candidate, if any.
    pub fn winner_name(&self) -> Option<&str> {
        let winner = self.winner?;
        self.candidates
            .iter()
            .find(|c| c.candidate_id == winner)
            .map(|c| c.candidate_name.as_str())
    }
}

/// `part / whole` as a percentage rounded to one decimal place. Zero when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / whole as f64).round() / 10.0
}

/// Turnout as a whole-number percentage capped at 100, or `None` when nobody is eligible.
pub fn turnout_percentage(voters: u64, eligible: u64) -> Option<u32> {
    if eligible == 0 {
        return None;
    }
    Some((voters.min(eligible) as f64 / eligible as f64 * 100.0).round() as u32)
}
