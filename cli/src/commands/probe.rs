use std::process::ExitCode;
use std::time::Instant;

use colored::*;
use seekr_common::config::Config;
use seekr_common::network::address::Address;
use seekr_core::liveness::{HttpLivenessChecker, LivenessChecker};

use crate::terminal::{colors, print};

pub async fn probe(cfg: &Config, address: &Address, quiet: bool) -> anyhow::Result<ExitCode> {
    let checker = HttpLivenessChecker::new(cfg)?;

    print::header("liveness probe", quiet);
    if !quiet {
        print::aligned_line("URL", checker.url_for(address));
    }

    let start_time = Instant::now();
    let result = checker.probe(address).await;
    let elapsed = format!("{} ms", start_time.elapsed().as_millis());

    let alive = match result {
        Ok(true) => {
            print::aligned_line("Status", "alive".color(colors::ALIVE).bold());
            true
        }
        Ok(false) => {
            print::aligned_line("Status", "not alive".color(colors::DEAD).bold());
            print::aligned_line("Reason", "answered without the alive marker");
            false
        }
        Err(e) => {
            print::aligned_line("Status", "not alive".color(colors::DEAD).bold());
            print::aligned_line("Error", e.kind().color(colors::ACCENT));
            print::aligned_line("Detail", e.to_string());
            false
        }
    };
    print::aligned_line("Elapsed", elapsed);

    Ok(if alive {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
