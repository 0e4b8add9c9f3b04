use anyhow::{Context, Result};
use clap::Parser;
use gift_exchange::{
    config::{CliArgs, Command, Config},
    error::GroupError,
    group::{Assignment, Group},
    logging::init_logging,
    service::GroupService,
    view::{ErrorEnvelope, GroupView},
};
use std::sync::Arc;

fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = Config::from_args(&args)?;
    init_logging(config.log_format)?;

    let db = sled::open(&config.db_path)
        .with_context(|| format!("failed to open database at {:?}", config.db_path))?;
    let service = GroupService::with_sled(Arc::new(db));

    let outcome = match args.command {
        Command::Create { name, admin_email } => service.create_group(&name, &admin_email),
        Command::Show { key } => service.get_group(&key),
        Command::Members {
            key,
            version,
            users,
        } => service.update_members(&key, &version, &users),
        Command::Assign {
            key,
            version,
            pairs,
        } => {
            let assignments = parse_pairs(&pairs)?;
            service.record_assignments(&key, version, assignments)
        }
    };

    print_outcome(outcome)
}

fn parse_pairs(pairs: &[String]) -> Result<Vec<Assignment>> {
    pairs
        .iter()
        .map(|pair| {
            let (giver, receiver) = pair
                .split_once('=')
                .with_context(|| format!("expected GIVER=RECEIVER, got {pair:?}"))?;
            Ok(Assignment::new(giver.trim(), receiver.trim())?)
        })
        .collect()
}

fn print_outcome(outcome: Result<Group, GroupError>) -> Result<()> {
    match outcome {
        Ok(group) => {
            println!("{}", serde_json::to_string_pretty(&GroupView::from(&group))?);
            Ok(())
        }
        Err(err) if err.is_expected() => {
            println!("{}", serde_json::to_string_pretty(&ErrorEnvelope::new(err.to_string()))?);
            std::process::exit(1);
        }
        Err(err) => Err(err).context("group operation failed"),
    }
}
