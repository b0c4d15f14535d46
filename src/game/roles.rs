use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

use super::models::Role;

/// Shuffles the participants and deals roles: the first becomes MASTER,
/// the second INSIDER, everyone else CITIZEN.
pub fn assign_roles<R: Rng + ?Sized>(
    participant_ids: &[String],
    rng: &mut R,
) -> HashMap<String, Role> {
    let mut shuffled = participant_ids.to_vec();
    shuffled.shuffle(rng);

    shuffled
        .into_iter()
        .enumerate()
        .map(|(index, id)| {
            let role = match index {
                0 => Role::Master,
                1 => Role::Insider,
                _ => Role::Citizen,
            };
            (id, role)
        })
        .collect()
}
