use std::sync::Arc;

use colored::*;
use seekr_common::config::Config;
use seekr_core::cache::{ResultCache, TomlFileStore};

use crate::terminal::{colors, print};

pub fn cache(cfg: &Config, quiet: bool) -> anyhow::Result<()> {
    let store = Arc::new(TomlFileStore::new(&cfg.cache_file));
    let path = store.path().display().to_string();
    let cached = ResultCache::new(store).get();

    if quiet {
        if let Some(address) = cached {
            print::print(address.as_str());
        }
        return Ok(());
    }

    print::header("cached host", quiet);
    print::aligned_line("File", path);
    match cached {
        Some(address) => print::aligned_line("Address", address.to_string().color(colors::ALIVE)),
        None => print::aligned_line("Address", "none".color(colors::SEPARATOR)),
    }
    Ok(())
}
