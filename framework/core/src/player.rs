use std::fmt;

/// Player slot whose outcome decides whether a scenario passes.
///
/// The discriminant is the engine's numeric player code and is what appears in its log lines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerColor {
    #[default]
    Red = 0,
    Blue = 1,
    Green = 2,
}

impl PlayerColor {
    /// Numeric code the engine uses for this player.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Lowercase name the engine uses for this player.
    pub fn name(self) -> &'static str {
        match self {
            PlayerColor::Red => "red",
            PlayerColor::Blue => "blue",
            PlayerColor::Green => "green",
        }
    }

    /// Suffix the AI writes to the client log when this player loses.
    pub fn loss_marker(self) -> String {
        format!(
            "VCAI: Player {} ({}) lost. It's me. What a disappointment! :(",
            self.code(),
            self.name()
        )
    }

    /// Suffix the AI writes to the client log when this player wins.
    pub fn win_marker(self) -> String {
        format!(
            "VCAI: Player {} ({}) won. I won! Incredible!",
            self.code(),
            self.name()
        )
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.name())
    }
}
