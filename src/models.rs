// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

/// Enums persisted as lowercase TEXT columns.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(LedgerError::Parse(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|_| FromSqlError::InvalidType)
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Pending,
    Suspended,
}

text_enum!(UserStatus {
    Active => "active",
    Pending => "pending",
    Suspended => "suspended",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentStatus {
    Active,
    Completed,
}

text_enum!(InvestmentStatus {
    Active => "active",
    Completed => "completed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Deposit,
    Withdrawal,
    Roi,
}

text_enum!(TxKind {
    Deposit => "deposit",
    Withdrawal => "withdrawal",
    Roi => "roi",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Completed,
    Failed,
}

text_enum!(TxStatus {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cryptocurrency {
    Btc,
    Eth,
    Sol,
}

text_enum!(Cryptocurrency {
    Btc => "btc",
    Eth => "eth",
    Sol => "sol",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub country: String,
    pub gender: String,
    pub balance: Decimal,
    pub status: UserStatus,
    pub is_verified: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub country: String,
    pub gender: String,
    pub is_verified: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentPlan {
    pub id: i64,
    pub name: String,
    pub daily_roi: Decimal, // percent, 3 means 3%
    pub duration_days: u32,
    pub min_investment: Decimal,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    pub amount: Decimal,
    pub daily_roi: Decimal,
    pub duration_days: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: InvestmentStatus,
    pub total_profit: Decimal,
    pub last_accrual_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub user_id: i64,
    pub plan_id: i64,
    pub amount: Decimal,
    pub daily_roi: Decimal,
    pub duration_days: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: TxKind,
    pub amount: Decimal,
    pub cryptocurrency: Option<Cryptocurrency>,
    pub wallet_address: Option<String>,
    pub status: TxStatus,
    pub note: Option<String>,
    pub plan_id: Option<i64>,
    pub investment_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: i64,
    pub kind: TxKind,
    pub amount: Decimal,
    pub cryptocurrency: Option<Cryptocurrency>,
    pub wallet_address: Option<String>,
    pub status: TxStatus,
    pub note: Option<String>,
    pub plan_id: Option<i64>,
    pub investment_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    pub fn new(user_id: i64, kind: TxKind, amount: Decimal, status: TxStatus) -> Self {
        Self {
            user_id,
            kind,
            amount,
            cryptocurrency: None,
            wallet_address: None,
            status,
            note: None,
            plan_id: None,
            investment_id: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub user_id: i64,
    pub cryptocurrency: Cryptocurrency,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

pub(crate) fn decimal_at(r: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) const USER_COLUMNS: &str = "id, full_name, email, country, gender, balance, status, \
     is_verified, is_admin, created_at, updated_at";

impl User {
    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: r.get(0)?,
            full_name: r.get(1)?,
            email: r.get(2)?,
            country: r.get(3)?,
            gender: r.get(4)?,
            balance: decimal_at(r, 5)?,
            status: r.get(6)?,
            is_verified: r.get(7)?,
            is_admin: r.get(8)?,
            created_at: r.get(9)?,
            updated_at: r.get(10)?,
        })
    }
}

pub(crate) const PLAN_COLUMNS: &str =
    "id, name, daily_roi, duration_days, min_investment, is_active";

impl InvestmentPlan {
    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(InvestmentPlan {
            id: r.get(0)?,
            name: r.get(1)?,
            daily_roi: decimal_at(r, 2)?,
            duration_days: r.get(3)?,
            min_investment: decimal_at(r, 4)?,
            is_active: r.get(5)?,
        })
    }
}

pub(crate) const INVESTMENT_COLUMNS: &str = "id, user_id, plan_id, amount, daily_roi, \
     duration_days, start_date, end_date, status, total_profit, last_accrual_at, created_at";

impl Investment {
    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Investment {
            id: r.get(0)?,
            user_id: r.get(1)?,
            plan_id: r.get(2)?,
            amount: decimal_at(r, 3)?,
            daily_roi: decimal_at(r, 4)?,
            duration_days: r.get(5)?,
            start_date: r.get(6)?,
            end_date: r.get(7)?,
            status: r.get(8)?,
            total_profit: decimal_at(r, 9)?,
            last_accrual_at: r.get(10)?,
            created_at: r.get(11)?,
        })
    }
}

pub(crate) const TRANSACTION_COLUMNS: &str = "id, user_id, type, amount, cryptocurrency, \
     wallet_address, status, note, plan_id, investment_id, created_at, updated_at";

impl Transaction {
    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Transaction {
            id: r.get(0)?,
            user_id: r.get(1)?,
            kind: r.get(2)?,
            amount: decimal_at(r, 3)?,
            cryptocurrency: r.get(4)?,
            wallet_address: r.get(5)?,
            status: r.get(6)?,
            note: r.get(7)?,
            plan_id: r.get(8)?,
            investment_id: r.get(9)?,
            created_at: r.get(10)?,
            updated_at: r.get(11)?,
        })
    }
}

pub(crate) const WALLET_COLUMNS: &str = "id, user_id, cryptocurrency, address, created_at";

impl Wallet {
    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Wallet {
            id: r.get(0)?,
            user_id: r.get(1)?,
            cryptocurrency: r.get(2)?,
            address: r.get(3)?,
            created_at: r.get(4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_parse_case_insensitively() {
        assert_eq!("Completed".parse::<TxStatus>().unwrap(), TxStatus::Completed);
        assert_eq!(" SOL ".parse::<Cryptocurrency>().unwrap(), Cryptocurrency::Sol);
        assert!("cancelled".parse::<InvestmentStatus>().is_err());
    }
}
