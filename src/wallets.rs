// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Display-only deposit addresses. Nothing here touches a real chain and no
//! key material is produced.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::error::{LedgerError, Result};
use crate::models::Cryptocurrency;

const HEX: &[u8] = b"0123456789abcdef";

static BTC_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:bc1|tb1)[0-9a-z]{8,87}|[13mn][0-9A-Za-z]{25,39})$").expect("valid regex")
});
static ETH_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid regex"));
static SOL_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z]{32,44}$").expect("valid regex"));

fn random_hex<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
        .collect()
}

/// Testnet-looking address for `crypto`: `n` + 33 hex for btc, `0x` + 40 hex
/// for eth, 44 hex for sol.
pub fn generate_address<R: Rng + ?Sized>(crypto: Cryptocurrency, rng: &mut R) -> String {
    match crypto {
        Cryptocurrency::Btc => format!("n{}", random_hex(rng, 33)),
        Cryptocurrency::Eth => format!("0x{}", random_hex(rng, 40)),
        Cryptocurrency::Sol => random_hex(rng, 44),
    }
}

/// Format check for withdrawal destinations.
pub fn validate_address(crypto: Cryptocurrency, address: &str) -> Result<()> {
    let re = match crypto {
        Cryptocurrency::Btc => &*BTC_ADDRESS,
        Cryptocurrency::Eth => &*ETH_ADDRESS,
        Cryptocurrency::Sol => &*SOL_ADDRESS,
    };
    if re.is_match(address.trim()) {
        Ok(())
    } else {
        Err(LedgerError::InvalidAddress {
            crypto: crypto.to_string(),
            address: address.to_string(),
        })
    }
}
