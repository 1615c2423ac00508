mod collect;
mod config;
mod decode;
mod dns;
mod error;
mod interfaces;
mod kv;
mod logging;
mod probe;
mod render;
mod report;
mod routes;
mod source;

use std::io::{self, Write};
use std::process::ExitCode;

use config::{Config, Mode};
use error::{AppError, AppResult};
use interfaces::InterfaceFilter;
use probe::Prober;
use render::Style;
use source::SystemCommands;

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            let err = AppError::Config(format!("{:#}", e));
            eprintln!("{}\n{}", err, err.user_message());
            return ExitCode::from(err.exit_code());
        }
    };

    logging::init(config.log_level);

    if config.clear {
        if let Err(e) = console::Term::stdout().clear_screen() {
            tracing::warn!("Could not clear the screen: {}", e);
        }
    }

    if config.mode == Mode::Version {
        println!("netcheck version {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("{}", e);
            tracing::error!("{}", e.user_message());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(config: &Config) -> AppResult<()> {
    let source = SystemCommands;
    let style = if config.barebones {
        Style::Barebones
    } else {
        Style::Boxed
    };

    match config.mode {
        Mode::Test => {
            let results = Prober::new(&source, &config.probes, !config.json).run();

            let mut out = io::stdout().lock();
            if config.json {
                writeln!(out, "{}", report::tests_json(&results)?)?;
            } else {
                report::test_table(&results).render(&mut out, style)?;
            }
        }
        Mode::Inventory => {
            let filter = InterfaceFilter {
                up_only: config.up_only,
            };
            let snapshot = collect::collect(&source, filter)?;

            let mut out = io::stdout().lock();
            if config.json {
                writeln!(out, "{}", report::inventory_json(&snapshot)?)?;
            } else {
                report::write_inventory(&mut out, &snapshot, config.tables, config.summary, style)?;
            }
        }
        Mode::Version => {}
    }

    Ok(())
}
