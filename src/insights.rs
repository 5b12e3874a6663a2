//! "AI insight" phrases: a random pick from a fixed catalog.

use rand::seq::SliceRandom;
use rand::Rng;

// ---

pub const CATALOG: [&str; 8] = [
    "AI predicts 72% chance of high turbidity in next 2 hours",
    "pH levels trending downward across all nodes",
    "Flow rate stability expected for next 6 hours",
    "Temperature spike detected - monitoring recommended",
    "All parameters within normal range",
    "Unusual turbidity pattern detected in Node B",
    "Predictive maintenance suggested for Node A",
    "Water quality improving across factory",
];

pub const PICK_COUNT: usize = 3;

/// Three distinct catalog phrases in random order.
pub fn select_insights<R: Rng + ?Sized>(rng: &mut R) -> Vec<&'static str> {
    // ---
    let mut picked: Vec<&'static str> = CATALOG.choose_multiple(rng, PICK_COUNT).copied().collect();
    // choose_multiple does not randomise order
    picked.shuffle(rng);
    picked
}
