//! CLI command implementations.

pub mod cart;
pub mod contact;
pub mod products;
pub mod session;

use std::sync::Arc;

use campus_market_storefront::config::StorefrontConfig;
use campus_market_storefront::error::Result;
use campus_market_storefront::notify::CartNotice;
use campus_market_storefront::state::Storefront;
use campus_market_storefront::storage::{DurableStorage, FileStorage};

/// Build the storefront runtime, printing absorbed cart failures to stderr.
pub fn open(config: StorefrontConfig) -> Result<Storefront> {
    let storage: Arc<dyn DurableStorage> = Arc::new(FileStorage::new(config.storage_dir.clone()));
    Storefront::new(config, storage, report_notice)
}

#[allow(clippy::print_stderr)]
fn report_notice(notice: &CartNotice) {
    eprintln!("warning: {notice}");
}
