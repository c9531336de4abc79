// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use grailcap::cli;
use grailcap::commands::transactions;
use grailcap::models::{TxKind, TxStatus};

#[test]
fn tx_list_filters_come_from_flags() {
    let matches = cli::build_cli().get_matches_from([
        "grailcap", "tx", "list", "--user", "4", "--type", "roi", "--status", "completed",
        "--limit", "2",
    ]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    let Some(("list", list_m)) = tx_m.subcommand() else {
        panic!("no list subcommand");
    };
    let filter = transactions::filter_from_args(list_m).unwrap();
    assert_eq!(filter.user_id, Some(4));
    assert_eq!(filter.kind, Some(TxKind::Roi));
    assert_eq!(filter.status, Some(TxStatus::Completed));
    assert_eq!(filter.limit, Some(2));
}

#[test]
fn withdraw_requires_a_known_cryptocurrency() {
    let ok = cli::build_cli().try_get_matches_from([
        "grailcap",
        "withdraw",
        "--user",
        "1",
        "--amount",
        "25",
        "--crypto",
        "eth",
        "--address",
        "0x52908400098527886E0F7030069857D2E4169EE7",
    ]);
    assert!(ok.is_ok());

    let doge = cli::build_cli().try_get_matches_from([
        "grailcap", "withdraw", "--user", "1", "--amount", "25", "--crypto", "doge", "--address",
        "D8vFz4p1L37jdg47HXKtSHA5uYLYxbGgPD",
    ]);
    assert!(doge.is_err());
}

#[test]
fn json_flags_conflict() {
    let res = cli::build_cli().try_get_matches_from(["grailcap", "user", "list", "--json", "--jsonl"]);
    assert!(res.is_err());
}
