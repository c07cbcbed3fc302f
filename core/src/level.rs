use serde::{Deserialize, Serialize};

use crate::GameConfig;

/// Preset difficulties offered by the level selector.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    #[default]
    Easy,
    Normal,
    Hard,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Easy, Level::Normal, Level::Hard];

    pub const fn game_config(self) -> GameConfig {
        use Level::*;
        match self {
            Easy => GameConfig::new_unchecked((9, 9), 10),
            Normal => GameConfig::new_unchecked((16, 16), 40),
            Hard => GameConfig::new_unchecked((30, 16), 99),
        }
    }

    pub const fn caption(self) -> &'static str {
        use Level::*;
        match self {
            Easy => "Easy",
            Normal => "Normal",
            Hard => "Hard",
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid_configs() {
        for level in Level::ALL {
            assert_eq!(level.game_config().validate(), Ok(()));
        }
        assert_eq!(Level::Hard.game_config().size, (30, 16));
        assert_eq!(Level::Normal.game_config().mines, 40);
    }

    #[test]
    fn from_index_matches_selector_order() {
        assert_eq!(Level::from_index(0), Some(Level::Easy));
        assert_eq!(Level::from_index(2), Some(Level::Hard));
        assert_eq!(Level::from_index(3), None);
    }
}
