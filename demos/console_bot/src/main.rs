//! Console Bot Example
//!
//! An interactive bot on stdin/stdout. Address it by name:
//!
//! ```text
//! > @Robot ping
//! @shell pong
//! > Robot: echo hello there
//! hello there
//! > @Robot remind me in 5 seconds to stretch
//! @shell ok, in 5s
//! @shell stretch
//! > @Robot help
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --name Hal --prompt "> "
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use parley::prelude::*;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "console-bot", about = "Talk to a Parley robot on the console")]
struct Args {
    /// Configuration file (defaults to ./parley.toml if present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile.
    #[arg(long)]
    profile: Option<String>,

    /// Rename the robot after loading configuration.
    #[arg(short, long)]
    name: Option<String>,

    /// Prompt shown before each line.
    #[arg(long)]
    prompt: Option<String>,
}

// ============================================================================
// Plugins
// ============================================================================

fn ping(robot: &Robot) -> CoreResult<()> {
    HelpBook::of(robot).help("ping", "Reply with pong");
    robot.on(EventKind::Mention, r"(?i)\bping\b", |ctx| {
        ctx.robot().reply("pong", ctx.fields())
    })?;
    Ok(())
}

fn echo(robot: &Robot) -> CoreResult<()> {
    HelpBook::of(robot).help("echo <text>", "Say <text> back");
    robot.on(EventKind::Mention, r"(?i)\becho\s+(.+)$", |ctx| {
        let text = ctx.capture(1).unwrap_or_default().to_string();
        ctx.robot().say(&text, ctx.fields())
    })?;
    Ok(())
}

fn rename(robot: &Robot) -> CoreResult<()> {
    HelpBook::of(robot).help("your name is <name>", "Change my name");
    robot.on(EventKind::Mention, r"(?i)\byour name is (\w+)", |ctx| -> HandlerResult {
        let name = ctx.capture(1).unwrap_or_default().to_string();
        ctx.robot().set_name(&name)?;
        ctx.robot().reply(&format!("call me {name}"), ctx.fields())
    })?;
    robot.on_any(EventKind::Name, |ctx| {
        info!(
            name = ctx.message(),
            previous = ctx.get_str("previous").unwrap_or_default(),
            "Robot renamed"
        );
    });
    Ok(())
}

fn remind(robot: &Robot) -> CoreResult<()> {
    HelpBook::of(robot).help(
        "remind me in <n> seconds to <task>",
        "Reply with <task> after <n> seconds",
    );
    robot.on(
        EventKind::Mention,
        r"(?i)\bremind me in (\d+) seconds? to (.+)$",
        |ctx| -> HandlerResult {
            let secs: u64 = ctx.capture(1).unwrap_or_default().parse()?;
            let task = ctx.capture(2).unwrap_or_default().to_string();
            let fields = ctx.fields().clone();

            let Some(timers) = Timers::of(ctx.robot()) else {
                return ctx.robot().reply("I can't keep time here", ctx.fields());
            };
            timers.after(Duration::from_secs(secs), move |robot| {
                if let Err(e) = robot.reply(&task, &fields) {
                    warn!(error = %e, "Reminder could not be delivered");
                }
            })?;
            ctx.robot().reply(&format!("ok, in {secs}s"), ctx.fields())
        },
    )?;
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = ParleyRuntime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile);
    }
    let mut runtime = builder.build()?;

    if let Some(name) = &args.name {
        runtime.robot().set_name(name)?;
    }

    runtime
        .use_plugin(HelpPlugin::new())?
        .use_plugin(ping)?
        .use_plugin(echo)?
        .use_plugin(rename)?
        .use_plugin(remind)?;

    let mut console = runtime.config().console.clone();
    if args.prompt.is_some() {
        console.prompt = args.prompt;
    }
    runtime.register_adapter(ConsoleAdapter::new(console));

    info!(
        robot = %runtime.robot().name(),
        address = %runtime.robot().mention_prefix(None),
        "Console bot ready"
    );
    runtime.run().await?;

    Ok(())
}
