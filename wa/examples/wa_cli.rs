// Copyright (c) 2024 wa-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line front end:
//!
//! ```text
//! wa_cli --number <num> --secret <base64> [--verbose] [--debug] \
//!     [interactive | login | lastseen <num> | message <num> [text] | image <num> <path> | location <num> <lat> <lng>]
//! ```

use std::env::args;
use std::error::Error as StdError;
use std::process::exit;

use chrono::Local;
use tokio_wa::Secret;
use wa::callbacks::{self, MessageFilter};
use wa::ClientBuilder;

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {} --number <num> --secret <base64> [--verbose] [--debug] \
         [interactive | login | lastseen <num> | message <num> [text] | image <num> <path> | location <num> <lat> <lng>]",
        program
    );
    exit(2);
}

struct Options {
    number: String,
    secret: String,
    verbose: bool,
    command: Vec<String>,
}

fn parse_options() -> Options {
    let argv: Vec<String> = args().collect();
    let program = argv[0].clone();

    let mut number = None;
    let mut secret = None;
    let mut verbose = false;
    let mut debug = false;
    let mut command = Vec::new();

    let mut iter = argv.into_iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--number" => number = iter.next(),
            "--secret" => secret = iter.next(),
            "-v" | "--verbose" => verbose = true,
            "-d" | "--debug" => debug = true,
            _ => command.push(arg),
        }
    }

    let level = if debug {
        log::LevelFilter::Debug
    } else if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match (number, secret) {
        (Some(number), Some(secret)) => Options {
            number,
            secret,
            verbose: verbose || debug,
            command,
        },
        _ => usage(&program),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn StdError>> {
    let options = parse_options();
    let program = args().next().unwrap_or_else(|| String::from("wa_cli"));

    let secret = Secret::from_base64(options.secret.trim())?;
    let mut agent = ClientBuilder::new(&options.number, secret)
        .set_nickname(&options.number)
        .build()
        .await?;

    if options.verbose {
        let info = agent.account_info();
        println!("Account Type:    {}", info.kind().unwrap_or("?"));
        println!("Account Status:  {}", info.status().unwrap_or("?"));
        println!("Account Created: {}", info.creation().unwrap_or("?"));
        println!("Account Expires: {}", info.expiration().unwrap_or("?"));
    }

    let command = options.command.first().map(String::as_str).unwrap_or("interactive");
    match (command, &options.command[1..]) {
        ("login", []) => {
            println!("Logged in as {}.", options.number);
        }
        ("lastseen", [number]) => {
            let seconds = agent.last_seen(number).await?;
            let when = Local::now() - chrono::Duration::seconds(seconds as i64);
            println!(
                "Last seen {} at {} ({} hours ago)",
                number,
                when.format("%Y-%m-%d %H:%M"),
                seconds / 3600
            );
        }
        ("message", [number, text]) => {
            let id = agent.message(number, text).await?;
            println!("{}", id);
        }
        ("message", [number]) => {
            eprintln!("Please enter the message to send");
            let mut text = String::new();
            std::io::stdin().read_line(&mut text)?;
            let id = agent.message(number, text.trim()).await?;
            println!("{}", id);
        }
        ("image", [_number, _path]) => {
            // Media uploads happen over HTTP out of band; only
            // already-uploaded URLs can be announced (Agent::image).
            eprintln!("image: local file upload is not supported");
            exit(1);
        }
        ("location", [number, lat, lng]) => {
            let id = agent.location(number, lat.parse()?, lng.parse()?).await?;
            println!("{}", id);
        }
        ("interactive", []) => {
            let all = MessageFilter {
                single: true,
                group: true,
                offline: true,
            };
            agent.register_with_action(callbacks::text_message(all), |stanza| {
                let from = stanza.attr("from").unwrap_or("?");
                let body = stanza.child("body").map(|body| body.text()).unwrap_or_default();
                println!("{}: {}", from, body);
                Ok(stanza.clone())
            });
            agent.service_loop().await?;
        }
        _ => usage(&program),
    }

    Ok(())
}
