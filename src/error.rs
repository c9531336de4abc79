// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger error types

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{entity} #{id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        available: Decimal,
        requested: Decimal,
    },

    #[error("Amount {amount} is below the minimum of {minimum}")]
    BelowMinimum { amount: Decimal, minimum: Decimal },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Invalid {crypto} address '{address}'")]
    InvalidAddress { crypto: String, address: String },

    #[error("User #{0} is not active")]
    InactiveUser(i64),

    #[error("Investment plan #{0} is not available")]
    InactivePlan(i64),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Balance of user #{0} kept changing underneath the update")]
    Contention(i64),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
