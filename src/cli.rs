// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn id_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .required(true)
        .value_parser(value_parser!(i64))
        .help(help)
}

fn crypto_arg() -> Arg {
    Arg::new("crypto")
        .long("crypto")
        .required(true)
        .value_parser(["btc", "eth", "sol"])
        .help("Cryptocurrency")
}

pub fn build_cli() -> Command {
    Command::new("grailcap")
        .version(crate_version!())
        .about("Simulated crypto investment ledger: deposits, daily ROI, withdrawals")
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the database and seed the plan catalog"))
        .subcommand(
            Command::new("plan")
                .about("Investment plan catalog")
                .subcommand(json_flags(Command::new("list").about("List plans"))),
        )
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand(
                    Command::new("add")
                        .about("Register a user")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("email").long("email").required(true))
                        .arg(Arg::new("country").long("country").required(true))
                        .arg(
                            Arg::new("gender")
                                .long("gender")
                                .default_value("prefer-not-to-say"),
                        )
                        .arg(
                            Arg::new("admin")
                                .long("admin")
                                .action(ArgAction::SetTrue)
                                .help("Grant admin rights"),
                        )
                        .arg(
                            Arg::new("verified")
                                .long("verified")
                                .action(ArgAction::SetTrue)
                                .help("Mark the user as identity-verified"),
                        ),
                )
                .subcommand(json_flags(Command::new("list").about("List users")))
                .subcommand(
                    json_flags(Command::new("show").about("Show one user"))
                        .arg(id_arg("id", "User id")),
                )
                .subcommand(
                    Command::new("suspend")
                        .about("Suspend a user")
                        .arg(id_arg("id", "User id")),
                )
                .subcommand(
                    Command::new("activate")
                        .about("Re-activate a user")
                        .arg(id_arg("id", "User id")),
                ),
        )
        .subcommand(
            Command::new("deposit")
                .about("Deposits")
                .subcommand(
                    Command::new("request")
                        .about("Generate a deposit address and record a pending deposit")
                        .arg(id_arg("user", "Depositing user id"))
                        .arg(id_arg("plan", "Plan to enroll in once confirmed"))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(crypto_arg()),
                )
                .subcommand(
                    json_flags(Command::new("list").about("List deposits")).arg(
                        Arg::new("pending")
                            .long("pending")
                            .action(ArgAction::SetTrue)
                            .help("Only pending deposits"),
                    ),
                )
                .subcommand(
                    Command::new("reject")
                        .about("Mark a pending deposit as failed")
                        .arg(id_arg("id", "Deposit transaction id"))
                        .arg(Arg::new("note").long("note")),
                ),
        )
        .subcommand(
            Command::new("withdraw")
                .about("Withdraw from a user's balance")
                .arg(id_arg("user", "User id"))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(crypto_arg())
                .arg(
                    Arg::new("address")
                        .long("address")
                        .required(true)
                        .help("Destination wallet address"),
                ),
        )
        .subcommand(
            Command::new("tx").about("Ledger entries").subcommand(
                json_flags(Command::new("list").about("List transactions"))
                    .arg(
                        Arg::new("user")
                            .long("user")
                            .value_parser(value_parser!(i64)),
                    )
                    .arg(
                        Arg::new("type")
                            .long("type")
                            .value_parser(["deposit", "withdrawal", "roi"]),
                    )
                    .arg(
                        Arg::new("status")
                            .long("status")
                            .value_parser(["pending", "completed", "failed"]),
                    )
                    .arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(value_parser!(usize)),
                    ),
            ),
        )
        .subcommand(
            Command::new("invest").about("Investments").subcommand(
                json_flags(Command::new("list").about("List investments"))
                    .arg(
                        Arg::new("user")
                            .long("user")
                            .value_parser(value_parser!(i64)),
                    )
                    .arg(
                        Arg::new("active")
                            .long("active")
                            .action(ArgAction::SetTrue),
                    ),
            ),
        )
        .subcommand(
            json_flags(Command::new("dashboard").about("A user's balance and plan progress"))
                .arg(id_arg("user", "User id")),
        )
        .subcommand(
            Command::new("admin")
                .about("Admin console")
                .subcommand(json_flags(Command::new("stats").about("Platform totals"))),
        )
        .subcommand(
            Command::new("jobs")
                .about("Background jobs")
                .subcommand(
                    Command::new("accrue")
                        .about("Run one ROI sweep now")
                        .arg(
                            Arg::new("as-of")
                                .long("as-of")
                                .help("RFC 3339 timestamp or YYYY-MM-DD (default: now)"),
                        ),
                )
                .subcommand(
                    Command::new("settle")
                        .about("Settle pending deposits now")
                        .arg(
                            Arg::new("now")
                                .long("now")
                                .help("RFC 3339 timestamp or YYYY-MM-DD (default: now)"),
                        ),
                )
                .subcommand(
                    Command::new("catch-up").about("Replay missed ticks for both jobs and exit"),
                )
                .subcommand(Command::new("run").about("Run the scheduler in the foreground"))
                .subcommand(Command::new("status").about("Show job watermarks")),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("transactions")
                    .about("Export all transactions")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv or json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(json_flags(
            Command::new("doctor").about("Reconcile balances against the ledger"),
        ))
        .subcommand(
            Command::new("config")
                .about("Scheduler and settlement policy")
                .subcommand(Command::new("show").about("Show effective settings"))
                .subcommand(
                    Command::new("set")
                        .about("Change a setting; running workers pick it up on their next tick")
                        .arg(Arg::new("key").long("key").required(true))
                        .arg(Arg::new("value").long("value").required(true)),
                ),
        )
}
