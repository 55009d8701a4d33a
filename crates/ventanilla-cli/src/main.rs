// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use runtime::HttpRuntime;
use std::env;
use std::path::PathBuf;
use ventanilla_app::{AppState, Menu, MenuAction, MenuEntry};
use ventanilla_tui::UiOptions;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `ventanilla --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let client = ventanilla_api::Client::new(config.base_url(), config.timeout()?).with_context(
        || {
            format!(
                "invalid [server] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        },
    )?;
    let ui_options = UiOptions {
        poll_interval: config.poll_interval()?,
        show_toasts: config.show_toasts(),
    };
    if options.check_only {
        return Ok(());
    }

    let mut state = AppState::default();
    let mut runtime = HttpRuntime::new(client, config.csrf_token().map(str::to_owned));
    ventanilla_tui::run_app(&mut state, site_menus(), ui_options, &mut runtime)
}

/// The navigation bar as the site renders it for a signed-in user.
fn site_menus() -> Vec<Menu> {
    vec![
        Menu {
            label: "Trabajos".to_owned(),
            trigger: MenuAction::Placeholder,
            entries: vec![
                entry("Buscar trabajos", "/jobs/search"),
                entry("Mis postulaciones", "/jobs/applications"),
                entry("Publicar trabajo", "/jobs/new"),
            ],
        },
        Menu {
            label: "Catálogo".to_owned(),
            trigger: MenuAction::Placeholder,
            entries: vec![
                entry("Servicios", "/catalog/services"),
                entry("Profesionales", "/catalog/professionals"),
            ],
        },
        Menu {
            label: "Cuenta".to_owned(),
            trigger: MenuAction::Navigate("/account".to_owned()),
            entries: vec![
                entry("Perfil", "/account/profile"),
                entry("Notificaciones", "/notifications/"),
                entry("Salir", "/auth/logout"),
            ],
        },
    ]
}

fn entry(label: &str, target: &str) -> MenuEntry {
    MenuEntry {
        label: label.to_owned(),
        action: MenuAction::Navigate(target.to_owned()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("ventanilla");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and client setup");
    println!("  --help                   Show this help");
}
