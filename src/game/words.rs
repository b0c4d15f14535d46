use rand::seq::IndexedRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A category doubles as the secret word of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: u32,
    #[serde(rename = "categoryName")]
    pub name: String,
    pub image_url: String,
}

/// Read-only source of candidate words
pub trait WordSource: Send + Sync {
    fn categories(&self) -> Vec<Category>;

    /// Picks a random word not in `used`; once every word has been used the
    /// whole list is eligible again. `None` only when the source is empty.
    fn pick_word(&self, used: &HashSet<String>, rng: &mut dyn RngCore) -> Option<String> {
        let categories = self.categories();
        let fresh: Vec<&Category> = categories
            .iter()
            .filter(|c| !used.contains(&c.name))
            .collect();

        let pool: Vec<&Category> = if fresh.is_empty() {
            categories.iter().collect()
        } else {
            fresh
        };

        pool.choose(rng).map(|c| c.name.clone())
    }
}

const BUILT_IN_WORDS: &[&str] = &[
    "Giraffe",
    "Lighthouse",
    "Volcano",
    "Submarine",
    "Pineapple",
    "Telescope",
    "Penguin",
    "Umbrella",
    "Pyramid",
    "Saxophone",
    "Cactus",
    "Snowman",
    "Helicopter",
    "Octopus",
    "Library",
    "Rainbow",
    "Dinosaur",
    "Compass",
    "Waterfall",
    "Robot",
];

/// Fixed in-memory category list
pub struct StaticWordList {
    categories: Vec<Category>,
}

impl StaticWordList {
    pub fn new(words: &[&str]) -> Self {
        let categories = words
            .iter()
            .enumerate()
            .map(|(index, word)| Category {
                id: index as u32 + 1,
                name: word.to_string(),
                image_url: format!("/images/categories/{}.png", word.to_lowercase()),
            })
            .collect();
        Self { categories }
    }

    pub fn built_in() -> Self {
        Self::new(BUILT_IN_WORDS)
    }
}

impl Default for StaticWordList {
    fn default() -> Self {
        Self::built_in()
    }
}

impl WordSource for StaticWordList {
    fn categories(&self) -> Vec<Category> {
        self.categories.clone()
    }
}

/// Convenience wrapper that draws from the thread-local generator
pub fn pick_fresh_word(source: &dyn WordSource, used: &HashSet<String>) -> Option<String> {
    source.pick_word(used, &mut rand::rng())
}
