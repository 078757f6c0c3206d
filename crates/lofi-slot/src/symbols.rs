//! Symbol alphabet, reels and the reel generator

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};

/// Number of reels in play
pub const REEL_COUNT: usize = 3;

/// Size of the symbol alphabet (and therefore of every reel)
pub const SYMBOL_COUNT: usize = 12;

const GLYPHS: [&str; SYMBOL_COUNT] = [
    "🍒", "🍋", "🔔", "⭐", "🍀", "7️⃣", "🍇", "💎", "🍉", "🥥", "🍓", "👑",
];

const NAMES: [&str; SYMBOL_COUNT] = [
    "cherry",
    "lemon",
    "bell",
    "star",
    "clover",
    "seven",
    "grapes",
    "diamond",
    "melon",
    "coconut",
    "strawberry",
    "crown",
];

/// One entry of the fixed alphabet. Every symbol is equally likely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Symbol(u8);

impl Symbol {
    /// The full alphabet in reference order
    pub const ALL: [Symbol; SYMBOL_COUNT] = {
        let mut all = [Symbol(0); SYMBOL_COUNT];
        let mut i = 0;
        while i < SYMBOL_COUNT {
            all[i] = Symbol(i as u8);
            i += 1;
        }
        all
    };

    pub fn from_id(id: u32) -> Option<Self> {
        (id < SYMBOL_COUNT as u32).then_some(Symbol(id as u8))
    }

    pub fn id(self) -> u32 {
        self.0 as u32
    }

    /// Display glyph (emoji)
    pub fn glyph(self) -> &'static str {
        GLYPHS[self.0 as usize]
    }

    /// ASCII name for logs and plain terminals
    pub fn name(self) -> &'static str {
        NAMES[self.0 as usize]
    }
}

impl TryFrom<u8> for Symbol {
    type Error = SlotError;

    fn try_from(id: u8) -> SlotResult<Self> {
        Self::from_id(u32::from(id)).ok_or(SlotError::InvalidSymbol(u32::from(id)))
    }
}

impl From<Symbol> for u8 {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.glyph())
    }
}

/// Wrap `position + offset` onto a circular strip of `len` cells
pub fn wrap_position(position: usize, offset: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (position as i64 + offset).rem_euclid(len as i64) as usize
}

/// A circular reel holding every symbol exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reel {
    symbols: Vec<Symbol>,
}

impl Reel {
    /// Build a reel from an explicit order, rejecting anything that is not
    /// a permutation of the alphabet
    pub fn from_symbols(symbols: Vec<Symbol>) -> SlotResult<Self> {
        let reel = Self { symbols };
        if !reel.is_permutation() {
            return Err(SlotError::Config(format!(
                "reel must contain each of the {SYMBOL_COUNT} symbols exactly once"
            )));
        }
        Ok(reel)
    }

    /// Reel in alphabet order
    pub fn ordered() -> Self {
        Self {
            symbols: Symbol::ALL.to_vec(),
        }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbol `offset` rows away from `position` (wraps around)
    pub fn symbol_at(&self, position: usize, offset: i64) -> Symbol {
        self.symbols[wrap_position(position, offset, self.symbols.len())]
    }

    /// Visible cells (top, mid, bottom) when `position` is in the middle
    pub fn window(&self, position: usize) -> [Symbol; 3] {
        [
            self.symbol_at(position, -1),
            self.symbol_at(position, 0),
            self.symbol_at(position, 1),
        ]
    }

    /// Same length as the alphabet, every symbol present once
    pub fn is_permutation(&self) -> bool {
        if self.symbols.len() != SYMBOL_COUNT {
            return false;
        }
        let mut seen = [false; SYMBOL_COUNT];
        for symbol in &self.symbols {
            let slot = &mut seen[symbol.0 as usize];
            if *slot {
                return false;
            }
            *slot = true;
        }
        true
    }
}

impl Default for Reel {
    fn default() -> Self {
        Self::ordered()
    }
}

/// The three reels in play
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReelSet {
    reels: [Reel; REEL_COUNT],
}

impl ReelSet {
    pub fn new(reels: [Reel; REEL_COUNT]) -> Self {
        Self { reels }
    }

    pub fn reel(&self, index: usize) -> Option<&Reel> {
        self.reels.get(index)
    }

    pub fn reels(&self) -> &[Reel; REEL_COUNT] {
        &self.reels
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reel> {
        self.reels.iter()
    }
}

/// Produces freshly shuffled reels
#[derive(Debug, Clone, Copy, Default)]
pub struct ReelGenerator;

impl ReelGenerator {
    /// Uniform random permutation of the alphabet (Fisher–Yates, last to first)
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Reel {
        let mut symbols = Symbol::ALL.to_vec();
        for i in (1..symbols.len()).rev() {
            let j = rng.random_range(0..=i);
            symbols.swap(i, j);
        }
        Reel { symbols }
    }

    /// Three independent reels
    pub fn generate_set<R: Rng + ?Sized>(rng: &mut R) -> ReelSet {
        ReelSet::new([
            Self::generate(rng),
            Self::generate(rng),
            Self::generate(rng),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_alphabet() {
        assert_eq!(Symbol::ALL.len(), 12);
        assert_eq!(Symbol::ALL[0].glyph(), "🍒");
        assert_eq!(Symbol::ALL[11].name(), "crown");
        assert_eq!(Symbol::from_id(5).map(Symbol::name), Some("seven"));
        assert_eq!(Symbol::from_id(12), None);
    }

    #[test]
    fn test_symbol_serde_rejects_unknown_ids() {
        assert_eq!(serde_json::to_string(&Symbol::ALL[7]).unwrap(), "7");
        assert_eq!(serde_json::from_str::<Symbol>("11").unwrap(), Symbol::ALL[11]);
        assert!(serde_json::from_str::<Symbol>("12").is_err());
        assert!(serde_json::from_str::<Symbol>("99").is_err());
        assert!(matches!(Symbol::try_from(200u8), Err(SlotError::InvalidSymbol(200))));
    }

    #[test]
    fn test_reel_wrap() {
        let reel = Reel::ordered();
        assert_eq!(reel.symbol_at(0, -1), Symbol::ALL[11]);
        assert_eq!(reel.symbol_at(11, 1), Symbol::ALL[0]);
        assert_eq!(reel.symbol_at(30, 0), Symbol::ALL[6]);
        assert_eq!(
            reel.window(0),
            [Symbol::ALL[11], Symbol::ALL[0], Symbol::ALL[1]]
        );
    }

    #[test]
    fn test_from_symbols_rejects_duplicates() {
        let mut symbols = Symbol::ALL.to_vec();
        symbols[3] = symbols[4];
        assert!(Reel::from_symbols(symbols).is_err());

        assert!(Reel::from_symbols(Symbol::ALL[..3].to_vec()).is_err());
        assert!(Reel::from_symbols(Symbol::ALL.to_vec()).is_ok());
    }

    #[test]
    fn test_generated_reels_are_permutations() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let set = ReelGenerator::generate_set(&mut rng);
            assert!(set.iter().all(Reel::is_permutation));
        }
    }

    #[test]
    fn test_generator_actually_shuffles() {
        let mut rng = StdRng::seed_from_u64(42);
        let distinct = (0..20)
            .map(|_| ReelGenerator::generate(&mut rng))
            .filter(|reel| *reel != Reel::ordered())
            .count();
        assert!(distinct > 15);
    }

    #[test]
    fn test_first_cell_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(1234);
        let mut counts = [0u32; SYMBOL_COUNT];
        let rounds = 12_000;
        for _ in 0..rounds {
            let reel = ReelGenerator::generate(&mut rng);
            counts[reel.symbol_at(0, 0).id() as usize] += 1;
        }
        // expected 1000 each
        assert!(counts.iter().all(|&c| (800..1200).contains(&c)), "{counts:?}");
    }
}
