use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Field position of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Attacker,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Attacker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GOALKEEPER",
            Position::Defender => "DEFENDER",
            Position::Midfielder => "MIDFIELDER",
            Position::Attacker => "ATTACKER",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GOALKEEPER" => Ok(Position::Goalkeeper),
            "DEFENDER" => Ok(Position::Defender),
            "MIDFIELDER" => Ok(Position::Midfielder),
            "ATTACKER" => Ok(Position::Attacker),
            other => Err(format!("Unknown position: {}", other)),
        }
    }
}
