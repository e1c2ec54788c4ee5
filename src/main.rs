use std::io;

use color_eyre::{eyre::WrapErr, Result};
use minsh::{config::Config, input::LineSource, state::State};
use tracing_subscriber::prelude::*;

#[macro_use]
extern crate tracing;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().wrap_err("failed to load configuration")?;

    // written synchronously so the shell never runs a second thread while forking
    let writer = config
        .log
        .appender()
        .wrap_err("failed to set up logging")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_error::ErrorLayer::default())
        .init();

    color_eyre::install()?;

    let stdin = io::stdin();
    let show_prompt = config.prompt.enabled(termion::is_tty(&stdin));
    trace!(prompt = %config.prompt, show_prompt, "starting shell");

    let mut state = State::new(show_prompt);
    let mut input = LineSource::new(stdin.lock());

    state
        .run(&mut input, &mut io::stdout().lock())
        .wrap_err("failed to run shell")?;

    trace!("input finished, exiting");

    Ok(())
}
