//! Command-line front end for the roster core.
//!
//! # Responsibility
//! - Log in with the supplied admin credentials for every invocation.
//! - Run one facade call and print its envelope as JSON.
//!
//! # Invariants
//! - Exit code is 0 only when the call returned a 2xx envelope.
//! - Exported CSV on stdout is never interleaved with the envelope, which
//!   then goes to stderr.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::debug;
use roster_core::{
    init_logging_from_config, ApiResponse, AppConfig, PageRequest, RosterApi, StudentDraft,
    StudentQuery, Token,
};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

mod args;
use args::{Cli, Commands};

const DEFAULT_DB_FILE: &str = "roster.db";

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }
    if config.db_path.is_none() {
        config.db_path = Some(PathBuf::from(DEFAULT_DB_FILE));
    }
    init_logging_from_config(&config).context("failed to initialize logging")?;

    let api = RosterApi::open(&config).context("failed to open roster store")?;

    let (Some(user), Some(password)) = (cli.user.as_deref(), cli.password.as_deref()) else {
        bail!("admin credentials required: pass --user/--password or set ROSTER_USER/ROSTER_PASSWORD");
    };
    let login = api.login(user, password);
    let Some(token) = login.body.clone() else {
        return print_envelope(&login);
    };
    debug!("event=cli_login module=cli status=ok username={user}");

    dispatch(&api, &token, cli.command)
}

fn dispatch(api: &RosterApi, token: &Token, command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Register { username, password } => {
            print_envelope(&api.register(token, &username, &password))
        }
        Commands::List {
            term,
            level,
            page,
            size,
            all,
        } => {
            let query = StudentQuery {
                term,
                level,
                page: Some(if all {
                    PageRequest::unpaged()
                } else {
                    PageRequest::of(page, size)
                }),
            };
            print_envelope(&api.list_students(token, &query))
        }
        Commands::Get { id } => print_envelope(&api.get_student(token, id)),
        Commands::Create { username, level } => {
            print_envelope(&api.create_student(token, &StudentDraft::new(username, level)))
        }
        Commands::Update {
            id,
            username,
            level,
        } => print_envelope(&api.update_student(token, id, &StudentDraft::new(username, level))),
        Commands::Delete { id } => print_envelope(&api.delete_student(token, id)),
        Commands::Export { out: Some(path) } => {
            let file = File::create(&path)
                .with_context(|| format!("failed to create `{}`", path.display()))?;
            print_envelope(&api.export_students(token, BufWriter::new(file)))
        }
        Commands::Export { out: None } => {
            let response = api.export_students(token, io::stdout().lock());
            let rendered = serde_json::to_string_pretty(&response)?;
            eprintln!("{rendered}");
            Ok(exit_code(&response))
        }
        Commands::Import { file } => {
            let reader = File::open(&file)
                .with_context(|| format!("failed to open `{}`", file.display()))?;
            print_envelope(&api.import_students(token, BufReader::new(reader)))
        }
    }
}

fn print_envelope<T: Serialize>(response: &ApiResponse<T>) -> Result<ExitCode> {
    let rendered = serde_json::to_string_pretty(response)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(exit_code(response))
}

fn exit_code<T>(response: &ApiResponse<T>) -> ExitCode {
    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
