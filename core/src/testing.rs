use alloc::vec::Vec;
use core::convert::Infallible;
use rand::TryRng;

use crate::{Coord, Coord2};

/// Generator that replays chosen words, wrapping around at the end.
///
/// Words are picked so that `random_range(0..bound)` on a `Coord` range lands
/// on the requested value without a second draw.
#[derive(Clone, Debug)]
pub(crate) struct ScriptedRng {
    words: Vec<u32>,
    cursor: usize,
}

impl ScriptedRng {
    /// Draws `(x, y)` for each entry in turn, as mine placement does.
    pub(crate) fn mines((width, height): Coord2, picks: &[Coord2]) -> Self {
        let words = picks
            .iter()
            .flat_map(|&(x, y)| [word(x, width), word(y, height)])
            .collect::<Vec<_>>();
        assert!(!words.is_empty());
        Self { words, cursor: 0 }
    }

    fn next_word(&mut self) -> u32 {
        let word = self.words[self.cursor % self.words.len()];
        self.cursor += 1;
        word
    }
}

/// Smallest word whose widening multiply by `bound` has `value` in the high half.
fn word(value: Coord, bound: Coord) -> u32 {
    assert!(value < bound);
    (u64::from(value) << 32).div_ceil(u64::from(bound)) as u32
}

impl TryRng for ScriptedRng {
    type Error = Infallible;

    fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
        Ok(self.next_word())
    }

    fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
        Ok((u64::from(self.next_word()) << 32) | u64::from(self.next_word()))
    }

    fn try_fill_bytes(&mut self, dst: &mut [u8]) -> Result<(), Self::Error> {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngExt;

    #[test]
    fn scripted_picks_come_back_from_random_range() {
        let picks = [(0, 0), (4, 2), (8, 8), (5, 7)];
        let mut rng = ScriptedRng::mines((9, 9), &picks);
        for (x, y) in picks {
            assert_eq!(rng.random_range(0..9u8), x);
            assert_eq!(rng.random_range(0..9u8), y);
        }
    }

    #[test]
    fn scripted_picks_respect_each_axis_bound() {
        let mut rng = ScriptedRng::mines((30, 16), &[(29, 15), (1, 0)]);
        assert_eq!(rng.random_range(0..30u8), 29);
        assert_eq!(rng.random_range(0..16u8), 15);
        assert_eq!(rng.random_range(0..30u8), 1);
        assert_eq!(rng.random_range(0..16u8), 0);
    }
}
