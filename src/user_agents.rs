//! Bundled User-Agent pool.

use rand::seq::SliceRandom;
use rand::Rng;

/// Fallback User-Agent when the bundled list is empty.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.131 Safari/537.36";

const USER_AGENTS_FILE: &str = include_str!("../data/user_agents.txt");

/// Returns the bundled User-Agent strings, one per non-blank line.
pub fn user_agents() -> Vec<&'static str> {
    let agents: Vec<&'static str> = USER_AGENTS_FILE
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if agents.is_empty() {
        vec![USER_AGENT]
    } else {
        agents
    }
}

/// Picks a User-Agent from the bundled pool using the given random source.
pub fn random_user_agent<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    user_agents().choose(rng).copied().unwrap_or(USER_AGENT)
}
