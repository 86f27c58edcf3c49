//! Log setup for the progression service.
//!
//! Event targets emitted by this crate:
//! - `xp_progression`: startup, config loading, grants, level ups and lost levels
//! - `ledger`: appends and reversals, with user id, entry id and running total
//! - `levels`: level table seeding and live replacement
//!
//! `LOG_LEVEL` takes an EnvFilter directive string ("ledger=debug,levels=warn").
//! `LOG_FORMAT=json` switches to one JSON object per event; anything else is the
//! human-readable formatter.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,xp_progression=debug,ledger=info,levels=info,tower_http=info,axum=info";

fn progression_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing() {
    let directives = std::env::var("LOG_LEVEL").ok();
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(progression_filter(directives.as_deref()))
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_or_broken_log_level_keeps_crate_targets() {
        for directives in [None, Some("ledger=notalevel")] {
            let rendered = progression_filter(directives).to_string();
            assert!(rendered.contains("xp_progression=debug"), "{rendered}");
            assert!(rendered.contains("ledger=info"), "{rendered}");
        }
    }

    #[test]
    fn log_level_overrides_defaults() {
        let rendered = progression_filter(Some("ledger=debug")).to_string();
        assert!(rendered.contains("ledger=debug"));
        assert!(!rendered.contains("xp_progression"));
    }
}
