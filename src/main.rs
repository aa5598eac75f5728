// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Ledgerlens replay CLI.
//!
//! Replays a recorded transcript (`{sessionId?, messages[], analyses[]}`) through the message
//! store and the aggregator and prints the resulting visualization state as JSON on stdout.
//! Analyses that fail validation are logged to stderr.

use std::error::Error;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ledgerlens::aggregate::{aggregate, fold_results};
use ledgerlens::config::ClientConfig;
use ledgerlens::model::SessionId;
use ledgerlens::normalize::Normalizer;
use ledgerlens::store::{InsertOutcome, MessageStore};

const DEFAULT_LOG_FILTER: &str = "ledgerlens=info";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} <transcript.json> [--pretty]\n\nThe transcript is a JSON object with `messages` and `analyses` arrays.\n--pretty indents the printed visualization state.\n\nLogging follows RUST_LOG (default `{DEFAULT_LOG_FILTER}`); tunables follow the LEDGERLENS_* variables."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    transcript: Option<String>,
    pretty: bool,
}

fn parse_options(args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    for arg in args {
        match arg.as_str() {
            "--pretty" => {
                if options.pretty {
                    return Err(());
                }
                options.pretty = true;
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.transcript.is_some() {
                    return Err(());
                }
                options.transcript = Some(arg);
            }
        }
    }

    if options.transcript.is_none() {
        return Err(());
    }
    Ok(options)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn list<'a>(transcript: &'a Value, key: &str) -> &'a [Value] {
    transcript
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "ledgerlens".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };
        init_logging();

        let config = ClientConfig::from_env()?;
        let normalizer = Normalizer::from_config(&config);
        let path = options.transcript.unwrap_or_default();
        let transcript: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;

        let session_id = match transcript.get("sessionId").and_then(Value::as_str) {
            Some(id) => SessionId::new(id)?,
            None => SessionId::new("replay")?,
        };
        let now = Utc::now();

        let mut store = MessageStore::new();
        let mut duplicates = 0usize;
        for (index, raw) in list(&transcript, "messages").iter().enumerate() {
            match normalizer.message_from_wire(&session_id, raw, now) {
                Ok(ingested) => {
                    if store.insert(ingested.message) == InsertOutcome::Duplicate {
                        duplicates += 1;
                    }
                }
                Err(err) => warn!(index, error = %err, "skipping unreadable message"),
            }
        }

        let (ledger, issues) = fold_results(&normalizer, list(&transcript, "analyses"), now);
        for issue in &issues {
            warn!(index = issue.index, "{}", issue.system_text());
        }

        let messages = store.sorted();
        let state = aggregate(&messages, &ledger);
        info!(
            messages = messages.len(),
            duplicates,
            analyses = ledger.len(),
            rejected = issues.len(),
            source = ?state.source,
            "transcript replayed"
        );

        let rendered = if options.pretty {
            serde_json::to_string_pretty(&state)?
        } else {
            serde_json::to_string(&state)?
        };
        println!("{rendered}");
        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{parse_options, CliOptions};

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|v| (*v).to_owned())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[rstest]
    #[case::plain(&["t.json"], false)]
    #[case::pretty_after(&["t.json", "--pretty"], true)]
    #[case::pretty_before(&["--pretty", "t.json"], true)]
    fn accepts_transcript_with_optional_pretty(#[case] raw: &[&str], #[case] pretty: bool) {
        assert_eq!(
            parse_options(args(raw)),
            Ok(CliOptions {
                transcript: Some("t.json".to_owned()),
                pretty,
            })
        );
    }

    #[rstest]
    #[case::missing(&[])]
    #[case::two_paths(&["a.json", "b.json"])]
    #[case::unknown_flag(&["a.json", "--verbose"])]
    #[case::repeated_flag(&["a.json", "--pretty", "--pretty"])]
    fn rejects_bad_invocations(#[case] raw: &[&str]) {
        assert_eq!(parse_options(args(raw)), Err(()));
    }
}
