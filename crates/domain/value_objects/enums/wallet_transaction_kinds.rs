use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WalletTransactionKind {
    TopUp,
    Sale,
}

impl WalletTransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletTransactionKind::TopUp => "top_up",
            WalletTransactionKind::Sale => "sale",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "top_up" => Some(WalletTransactionKind::TopUp),
            "sale" => Some(WalletTransactionKind::Sale),
            _ => None,
        }
    }
}

impl Display for WalletTransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
