// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod admin;
pub mod deposits;
pub mod doctor;
pub mod exporter;
pub mod investments;
pub mod jobs;
pub mod plans;
pub mod reports;
pub mod settings;
pub mod transactions;
pub mod users;
pub mod withdrawals;
