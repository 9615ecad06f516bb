// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manual argument parsing for the `atmd` binary (§6). No CLI-parsing crate
//! is pulled in for this: the surface is small and fixed.

pub const USAGE: &str = "\
atmd - Android trajectory manager daemon

USAGE:
    atmd <MODE> [OPTIONS]

MODES:
    coordinator          run the coordinator and its registered workers, no HTTP server
    worker <KIND>         run a single worker standalone (KIND: env|proxy|reward)
    api                   run the full HTTP API server (default mode)
    demo                   run the HTTP API server against default configuration

OPTIONS:
    --config <PATH>        path to a TOML config file (default: atmd.toml)
    --host <HOST>           override server.host
    --port <PORT>           override server.port
    --print-config          print the effective configuration as TOML and exit
    -h, --help              print this message and exit
    -V, --version           print the version and exit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Coordinator,
    Worker(WorkerKind),
    Api,
    Demo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerKind {
    Env,
    Proxy,
    Reward,
}

#[derive(Debug, Clone)]
pub struct Cli {
    pub mode: Mode,
    pub config_path: std::path::PathBuf,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
}

#[derive(Debug, Clone)]
pub enum ParsedArgs {
    Run(Cli),
    Help,
    Version,
}

pub fn parse(args: &[String]) -> Result<ParsedArgs, String> {
    let mut iter = args.iter().peekable();

    let mut mode = Mode::Api;
    let mut config_path = std::path::PathBuf::from("atmd.toml");
    let mut host = None;
    let mut port = None;
    let mut print_config = false;
    let mut mode_set = false;

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(ParsedArgs::Help),
            "-V" | "--version" => return Ok(ParsedArgs::Version),
            "--print-config" => print_config = true,
            "--config" => {
                let path = iter.next().ok_or("--config requires a value")?;
                config_path = std::path::PathBuf::from(path);
            }
            "--host" => {
                host = Some(iter.next().ok_or("--host requires a value")?.clone());
            }
            "--port" => {
                let value = iter.next().ok_or("--port requires a value")?;
                port = Some(value.parse::<u16>().map_err(|_| format!("invalid port: {value}"))?);
            }
            "coordinator" if !mode_set => {
                mode = Mode::Coordinator;
                mode_set = true;
            }
            "api" if !mode_set => {
                mode = Mode::Api;
                mode_set = true;
            }
            "demo" if !mode_set => {
                mode = Mode::Demo;
                mode_set = true;
            }
            "worker" if !mode_set => {
                let kind = iter.next().ok_or("worker mode requires a KIND (env|proxy|reward)")?;
                let kind = match kind.as_str() {
                    "env" => WorkerKind::Env,
                    "proxy" => WorkerKind::Proxy,
                    "reward" => WorkerKind::Reward,
                    other => return Err(format!("unknown worker kind: {other}")),
                };
                mode = Mode::Worker(kind);
                mode_set = true;
            }
            other => return Err(format!("unexpected argument: {other}")),
        }
    }

    Ok(ParsedArgs::Run(Cli {
        mode,
        config_path,
        host,
        port,
        print_config,
    }))
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
