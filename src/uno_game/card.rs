use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Wild,
}

impl Color {
    /// The four colors a player may name after a wild card.
    pub const CHOOSABLE: [Color; 4] = [Color::Red, Color::Blue, Color::Green, Color::Yellow];

    pub fn is_choosable(self) -> bool {
        self != Color::Wild
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Wild => "wild",
        };
        f.write_str(name)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "red" => Ok(Color::Red),
            "blue" => Ok(Color::Blue),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "wild" => Ok(Color::Wild),
            other => Err(format!("unknown color '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Number(u8),
    Skip,
    Reverse,
    #[serde(rename = "draw2")]
    DrawTwo,
    Wild,
    #[serde(rename = "wild_draw4")]
    WildDrawFour,
}

impl CardType {
    pub fn is_wild(self) -> bool {
        matches!(self, CardType::Wild | CardType::WildDrawFour)
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardType::Number(n) => write!(f, "{n}"),
            CardType::Skip => f.write_str("skip"),
            CardType::Reverse => f.write_str("reverse"),
            CardType::DrawTwo => f.write_str("draw2"),
            CardType::Wild => f.write_str("wild"),
            CardType::WildDrawFour => f.write_str("wild_draw4"),
        }
    }
}

/// Stable identity of one physical card within a 108-card deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u8);

/// A single card. Only the color of a played wild is ever rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub color: Color,
    #[serde(rename = "value")]
    pub card_type: CardType,
}

impl Card {
    pub fn new(id: CardId, color: Color, card_type: CardType) -> Self {
        Self {
            id,
            color,
            card_type,
        }
    }

    pub fn is_wild(&self) -> bool {
        self.card_type.is_wild()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wild() && self.color == Color::Wild {
            write!(f, "{}", self.card_type)
        } else {
            write!(f, "{} {}", self.color, self.card_type)
        }
    }
}
