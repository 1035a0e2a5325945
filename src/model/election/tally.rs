//! On-demand tallying.
//!
//! Results are always recomputed from the ballot ledger at read time and
//! never cached, so they are correct immediately after an admin resets the
//! voting of a position. Reads race benignly with concurrent writers.

use std::collections::HashMap;

use crate::model::{common::BallotType, db::ballot::BallotAction, mongodb::Id};

/// The tallied standing of one candidate for one position.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTally {
    pub member_id: Id,
    pub name: String,
    pub nominations: u64,
    pub votes: u64,
    /// Share of the position's votes, 0 when nobody has voted yet.
    pub percentage: f64,
}

/// The tallied results of one position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionTally {
    pub position: String,
    pub total_nominations: u64,
    pub total_votes: u64,
    /// Candidates with at least one nomination or vote, ordered by
    /// (votes desc, nominations desc, member id asc). The id tail makes
    /// the ordering deterministic under ties.
    pub results: Vec<CandidateTally>,
}

impl PositionTally {
    /// The leading candidate, provided they have at least one vote.
    pub fn winner(&self) -> Option<&CandidateTally> {
        self.results.first().filter(|leader| leader.votes > 0)
    }
}

/// Tally one position from the instance's ledger rows.
///
/// `names` maps member ids to display names, usually from the candidate
/// snapshot; ids missing from the map fall back to their hex form.
pub fn tally_position(
    position: &str,
    rows: &[BallotAction],
    names: &HashMap<Id, String>,
) -> PositionTally {
    let mut counts: HashMap<Id, (u64, u64)> = HashMap::new();
    for row in rows.iter().filter(|row| row.position == position) {
        let entry = counts.entry(row.candidate_id).or_default();
        match row.action {
            BallotType::Nomination => entry.0 += 1,
            BallotType::Vote => entry.1 += 1,
        }
    }

    let total_nominations: u64 = counts.values().map(|(noms, _)| noms).sum();
    let total_votes: u64 = counts.values().map(|(_, votes)| votes).sum();

    let mut results: Vec<CandidateTally> = counts
        .into_iter()
        .map(|(member_id, (nominations, votes))| CandidateTally {
            member_id,
            name: names
                .get(&member_id)
                .cloned()
                .unwrap_or_else(|| member_id.to_string()),
            nominations,
            votes,
            percentage: if total_votes > 0 {
                votes as f64 / total_votes as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect();

    results.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then(b.nominations.cmp(&a.nominations))
            .then(a.member_id.cmp(&b.member_id))
    });

    PositionTally {
        position: position.to_string(),
        total_nominations,
        total_votes,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSITION: &str = "Elder";

    fn nomination(candidate: Id) -> BallotAction {
        BallotAction::new(Id::new(), Id::new(), POSITION, candidate, BallotType::Nomination)
    }

    fn vote(candidate: Id) -> BallotAction {
        BallotAction::new(Id::new(), Id::new(), POSITION, candidate, BallotType::Vote)
    }

    #[test]
    fn counts_and_percentages() {
        let (a, b) = (Id::new(), Id::new());
        let rows = vec![
            nomination(a),
            nomination(a),
            nomination(b),
            vote(a),
            vote(a),
            vote(a),
            vote(b),
        ];
        let names = HashMap::from([(a, "Ana".to_string()), (b, "Bruno".to_string())]);

        let tally = tally_position(POSITION, &rows, &names);

        assert_eq!(tally.total_votes, 4);
        assert_eq!(tally.total_nominations, 3);
        assert_eq!(tally.results.len(), 2);

        let leader = &tally.results[0];
        assert_eq!(leader.name, "Ana");
        assert_eq!(leader.nominations, 2);
        assert_eq!(leader.votes, 3);
        assert_eq!(leader.percentage, 75.0);

        let percent_sum: f64 = tally.results.iter().map(|r| r.percentage).sum();
        assert!((percent_sum - 100.0).abs() < 1e-9);

        assert_eq!(tally.winner().unwrap().name, "Ana");
    }

    #[test]
    fn no_votes_means_zero_percentages_and_no_winner() {
        let a = Id::new();
        let rows = vec![nomination(a)];
        let tally = tally_position(POSITION, &rows, &HashMap::new());

        assert_eq!(tally.total_votes, 0);
        assert_eq!(tally.results[0].percentage, 0.0);
        assert!(tally.winner().is_none());
    }

    #[test]
    fn vote_ties_break_on_nominations_then_id() {
        let (a, b) = (Id::new(), Id::new());
        let rows = vec![nomination(a), nomination(a), nomination(b), vote(a), vote(b)];

        let tally = tally_position(POSITION, &rows, &HashMap::new());
        assert_eq!(tally.results[0].member_id, a);

        // Full tie: ordered by member id, so repeated tallies agree.
        let (c, d) = (Id::new(), Id::new());
        let rows = vec![nomination(c), nomination(d), vote(c), vote(d)];
        let first = tally_position(POSITION, &rows, &HashMap::new());
        let second = tally_position(POSITION, &rows, &HashMap::new());
        assert_eq!(first.results[0].member_id, first.results[0].member_id.min(first.results[1].member_id));
        assert_eq!(first, second);
    }

    #[test]
    fn other_positions_do_not_bleed_in() {
        let a = Id::new();
        let mut other = vote(a);
        other.position = "Deacon".to_string();
        let rows = vec![vote(a), other];

        let tally = tally_position(POSITION, &rows, &HashMap::new());
        assert_eq!(tally.total_votes, 1);
    }

    #[test]
    fn single_vote_scenario() {
        // One vote for one candidate: 100% and the win.
        let a = Id::new();
        let rows = vec![nomination(a), vote(a)];
        let names = HashMap::from([(a, "Ana".to_string())]);

        let tally = tally_position(POSITION, &rows, &names);
        assert_eq!(tally.results[0].votes, 1);
        assert_eq!(tally.results[0].percentage, 100.0);
        assert_eq!(tally.winner().unwrap().member_id, a);

        // Dropping the vote rows (what reset-voting does) zeroes the votes
        // but keeps the nomination standing.
        let rows: Vec<BallotAction> = rows
            .into_iter()
            .filter(|row| row.action != BallotType::Vote)
            .collect();
        let tally = tally_position(POSITION, &rows, &names);
        assert_eq!(tally.results[0].votes, 0);
        assert_eq!(tally.results[0].nominations, 1);
        assert!(tally.winner().is_none());
    }
}
