// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accrual;
pub mod cadence;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod plans;
pub mod scheduler;
pub mod settlement;
pub mod store;
pub mod utils;
pub mod wallets;
