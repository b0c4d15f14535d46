use std::collections::HashMap;

use super::models::{Game, GameSummary, Role};

/// Scores a game from its role map and vote ledger. Pure: the game is not modified.
///
/// - CITIZEN: +1 if more than half of the citizens voted for the insider,
///   +1 if the citizens answered correctly.
/// - INSIDER: +1 if the citizens answered correctly, +1 if strictly fewer
///   than half of the citizens voted for them.
/// - MASTER: +1 always, +1 if the insider is among the most voted.
pub fn compute_summary(game: &Game, citizens_answered_correctly: bool) -> GameSummary {
    let vote_tally = game.vote_tally();
    let most_voted = most_voted(&vote_tally);
    let insider_id = game.insider_id();
    let master_id = game.master_id();

    let insider_caught = insider_id
        .as_ref()
        .is_some_and(|insider| most_voted.contains(insider));

    let citizens: Vec<&String> = game
        .roles
        .iter()
        .filter(|(_, role)| **role == Role::Citizen)
        .map(|(id, _)| id)
        .collect();
    let citizen_count = citizens.len();

    let citizen_votes_for_insider = match &insider_id {
        Some(insider) => citizens
            .iter()
            .filter(|citizen| game.votes.get(citizen.as_str()) == Some(insider))
            .count(),
        None => 0,
    };

    // Integer forms of `votes > n / 2` and `votes < n / 2`
    let majority_found_insider = 2 * citizen_votes_for_insider > citizen_count;
    let insider_escaped = 2 * citizen_votes_for_insider < citizen_count;

    let mut scores: HashMap<String, i32> = game.roles.keys().map(|id| (id.clone(), 0)).collect();

    for (id, role) in &game.roles {
        let points = match role {
            Role::Citizen => {
                i32::from(majority_found_insider) + i32::from(citizens_answered_correctly)
            }
            Role::Insider => i32::from(citizens_answered_correctly) + i32::from(insider_escaped),
            Role::Master => 1 + i32::from(insider_caught),
        };
        if let Some(score) = scores.get_mut(id) {
            *score += points;
        }
    }

    GameSummary {
        scores,
        vote_tally,
        most_voted,
        insider_caught,
        citizens_answered_correctly,
        insider_id,
        master_id,
        word: game.word.clone(),
    }
}

/// All targets sharing the highest count, sorted for stable output
fn most_voted(tally: &HashMap<String, u32>) -> Vec<String> {
    let Some(max) = tally.values().copied().max() else {
        return Vec::new();
    };

    let mut leaders: Vec<String> = tally
        .iter()
        .filter(|(_, count)| **count == max)
        .map(|(id, _)| id.clone())
        .collect();
    leaders.sort();
    leaders
}
