//! Test utilities for integration tests

use nymcred_wallet::{CredentialSet, CredentialSetConfig, NymParameters, Passphrase};

pub const WALLET_PASSPHRASE: &str = "wallet passphrase";

/// Install a log subscriber once; `RUST_LOG` controls the output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn wallet_passphrase() -> Passphrase {
    Passphrase::new(WALLET_PASSPHRASE)
}

/// A freshly generated set under the wallet passphrase
pub fn fresh_set() -> CredentialSet {
    init_tracing();
    CredentialSet::generate(
        &NymParameters::default(),
        &wallet_passphrase(),
        CredentialSetConfig::default(),
    )
    .unwrap()
}
