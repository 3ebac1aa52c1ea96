use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Characters per word when converting character counts into words per minute.
pub const CHARS_PER_WORD: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    Correct,
    Incorrect,
    Pending,
}

/// A single rendered cell: the character to draw and how it was typed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    pub class: CharClass,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum RateUnit {
    #[default]
    #[strum(serialize = "cpm")]
    Cpm,
    #[strum(serialize = "wpm")]
    Wpm,
}

impl RateUnit {
    fn units(&self, chars: usize) -> f64 {
        match self {
            RateUnit::Cpm => chars as f64,
            RateUnit::Wpm => chars as f64 / CHARS_PER_WORD,
        }
    }
}

/// Mismatched positions in the overlap plus every typed position past the end
/// of the target.
pub fn error_count(target: &str, input: &str) -> usize {
    let mismatches = target
        .chars()
        .zip(input.chars())
        .filter(|(expected, typed)| expected != typed)
        .count();
    let excess = input
        .chars()
        .count()
        .saturating_sub(target.chars().count());

    mismatches + excess
}

/// Percentage of typed characters that were right, 100 when nothing was typed.
pub fn accuracy(typed: usize, errors: usize) -> u32 {
    if typed == 0 {
        return 100;
    }
    let correct = typed.saturating_sub(errors);
    (100.0 * correct as f64 / typed as f64).round() as u32
}

/// Classify every target character, then append excess input as incorrect.
pub fn classify(target: &str, input: &str) -> Vec<Glyph> {
    let mut typed = input.chars();
    let mut glyphs: Vec<Glyph> = target
        .chars()
        .map(|expected| {
            let class = match typed.next() {
                Some(c) if c == expected => CharClass::Correct,
                Some(_) => CharClass::Incorrect,
                None => CharClass::Pending,
            };
            Glyph { ch: expected, class }
        })
        .collect();

    glyphs.extend(typed.map(|ch| Glyph {
        ch,
        class: CharClass::Incorrect,
    }));

    glyphs
}

/// Rate shown while typing. Zero during the first second.
pub fn live_rate(chars: usize, elapsed_secs: u64, unit: RateUnit) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }
    (unit.units(chars) / (elapsed_secs as f64 / 60.0)).round() as u32
}

/// Rate for a finished page or session; elapsed time is floored at one second.
pub fn final_rate(chars: usize, elapsed: Duration, unit: RateUnit) -> u32 {
    let secs = elapsed.as_secs_f64().max(1.0);
    (unit.units(chars) / (secs / 60.0)).round() as u32
}
