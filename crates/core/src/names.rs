// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Random city names for worktrees.
//!
//! Names are short and memorable. A new worktree gets a random unused name
//! from the list; once the project has burned through five random attempts
//! the picker falls back to numeric suffixes so creation never spins.

use rand::Rng;

/// Fixed name pool. Order is irrelevant; picks are random.
pub const CITY_NAMES: &[&str] = &[
    "tokyo", "paris", "london", "berlin", "madrid", "lisbon", "dublin", "oslo", "vienna", "prague",
    "warsaw", "athens", "rome", "milan", "zurich", "geneva", "brussels", "amsterdam", "helsinki",
    "stockholm", "copenhagen", "reykjavik", "moscow", "kyiv", "istanbul", "cairo", "nairobi",
    "lagos", "accra", "tunis", "casablanca", "capetown", "mumbai", "delhi", "chennai", "dhaka",
    "karachi", "kabul", "tehran", "baghdad", "riyadh", "doha", "dubai", "muscat", "seoul",
    "busan", "osaka", "kyoto", "sapporo", "taipei", "manila", "jakarta", "bangkok", "hanoi",
    "saigon", "singapore", "sydney", "melbourne", "auckland", "suva", "honolulu", "anchorage",
    "vancouver", "seattle", "portland", "denver", "austin", "houston", "chicago", "detroit",
    "boston", "toronto", "montreal", "havana", "kingston", "bogota", "quito", "lima", "santiago",
    "montevideo",
];

const MAX_RANDOM_ATTEMPTS: usize = 5;

/// Pick a worktree name not already taken in the project.
///
/// `taken` reports whether a candidate name is in use (archived names count
/// as taken). Falls back to `<name>-2`, `<name>-3`, … when random picks
/// keep colliding.
pub fn pick_worktree_name(taken: impl Fn(&str) -> bool) -> String {
    let mut rng = rand::rng();
    for _ in 0..MAX_RANDOM_ATTEMPTS {
        let candidate = CITY_NAMES[rng.random_range(0..CITY_NAMES.len())];
        if !taken(candidate) {
            return candidate.to_string();
        }
    }

    // Suffix fallback: first free name from a random base
    let base = CITY_NAMES[rng.random_range(0..CITY_NAMES.len())];
    if !taken(base) {
        return base.to_string();
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod tests;
