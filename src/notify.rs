// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Outbound user notifications. Delivery is best-effort: callers log failures
//! and carry on.

use log::info;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Delivery to {to} failed: {reason}")]
    Delivery { to: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositNotice {
    pub email: String,
    pub name: String,
    pub amount: Decimal,
    pub plan_name: String,
}

pub trait Notifier: Send + Sync {
    fn deposit_confirmed(&self, notice: &DepositNotice) -> Result<(), NotifyError>;
}

/// Writes the message to the log instead of sending mail.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deposit_confirmed(&self, notice: &DepositNotice) -> Result<(), NotifyError> {
        info!(
            "deposit confirmation for {} <{}>: ${:.2} credited, {} plan",
            notice.name, notice.email, notice.amount, notice.plan_name
        );
        Ok(())
    }
}
