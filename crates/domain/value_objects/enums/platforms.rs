use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Store through which a subscription was bought.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Platform {
    #[default]
    None,
    Apple,
    Google,
    Stripe,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::None => "none",
            Platform::Apple => "apple",
            Platform::Google => "google",
            Platform::Stripe => "stripe",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "none" => Ok(Platform::None),
            "apple" => Ok(Platform::Apple),
            "google" => Ok(Platform::Google),
            "stripe" => Ok(Platform::Stripe),
            other => Err(format!("Unsupported platform: {}", other)),
        }
    }
}
