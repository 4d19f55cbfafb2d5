//! Interactive planning session
//!
//! Reads commands from stdin while requests run in the background. Every
//! planner transition is rendered from its snapshot, so a slow plan that was
//! overtaken by a newer target never reaches the screen. Input may be piped:
//! the session exits once every submitted request has been rendered.

use std::sync::Arc;

use anyhow::Result;
use pare_core::{
    AnalysisTicket, Config, Phase, PlanTicket, Request, RetryTicket, SavingsPlanner,
    SavingsTarget, ServiceClient, Snapshot, Stage, TargetPreset,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use super::{format_currency, print_analysis, print_plan, print_targets};

/// One line of session input
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Anything that is not a keyword is treated as a target amount
    Target(String),
    Preset(TargetPreset),
    Months(u32),
    Retry,
    Show,
    Targets,
    QuickWins,
    Help,
    Quit,
    Empty,
}

pub fn parse_session_line(line: &str) -> std::result::Result<SessionCommand, String> {
    let line = line.trim();
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(SessionCommand::Empty);
    };
    let arg = parts.next();

    match head.to_lowercase().as_str() {
        "quit" | "exit" | "q" => Ok(SessionCommand::Quit),
        "retry" | "r" => Ok(SessionCommand::Retry),
        "show" => Ok(SessionCommand::Show),
        "targets" => Ok(SessionCommand::Targets),
        "wins" | "quick-wins" => Ok(SessionCommand::QuickWins),
        "help" | "?" => Ok(SessionCommand::Help),
        "preset" => {
            let name = arg.ok_or("usage: preset <economical|default|moderate|ambitious>")?;
            name.parse().map(SessionCommand::Preset)
        }
        "months" => {
            let n = arg.ok_or("usage: months <n>")?;
            match n.parse::<u32>() {
                Ok(n) if n > 0 => Ok(SessionCommand::Months(n)),
                _ => Err(format!("months must be a positive whole number, got {:?}", n)),
            }
        }
        _ => Ok(SessionCommand::Target(line.to_string())),
    }
}

type Planner = SavingsPlanner<ServiceClient>;

pub async fn cmd_session(service: ServiceClient, config: &Config, months: u32) -> Result<()> {
    let planner = Arc::new(SavingsPlanner::new(service, months));
    println!("💰 Pare session. Type a monthly savings goal, or 'help'.");
    run_session(&planner, BufReader::new(tokio::io::stdin()), config, months).await
}

/// Load the analysis for `months`, then drive the session from `input`
/// until `quit` or end of input
///
/// Each request is numbered on this loop before it is spawned, so responses
/// are ordered by submission even when they complete out of order. At end
/// of input the outstanding requests are awaited and their final state is
/// rendered before returning.
pub async fn run_session<R>(
    planner: &Arc<Planner>,
    input: R,
    config: &Config,
    months: u32,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let currency = config.currency.clone();
    let pie_limit = config.pie_limit;

    let (stop_tx, stop_rx) = oneshot::channel();
    let renderer = spawn_renderer(planner.subscribe(), stop_rx, currency.clone(), pie_limit);
    let mut pending = vec![spawn_analysis(planner, planner.begin_analysis(months))];

    let mut quit = false;
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_session_line(&line) {
            Ok(c) => c,
            Err(e) => {
                println!("   ⚠️  {}", e);
                continue;
            }
        };

        pending.retain(|h| !h.is_finished());
        match command {
            SessionCommand::Quit => {
                quit = true;
                break;
            }
            SessionCommand::Empty => {}
            SessionCommand::Help => print_session_help(),
            SessionCommand::Target(text) => match text.parse::<SavingsTarget>() {
                // Rejected here so no request is ever made for bad input
                Ok(target) => pending.push(spawn_plan(planner, planner.begin_plan(target))),
                Err(e) => println!("   ⚠️  {}", e),
            },
            SessionCommand::Preset(preset) => match planner.target_for_preset(preset) {
                Ok(target) => pending.push(spawn_plan(planner, planner.begin_plan(target))),
                Err(e) => println!("   ⚠️  {}", e),
            },
            SessionCommand::Months(n) => {
                pending.push(spawn_analysis(planner, planner.begin_analysis(n)))
            }
            SessionCommand::Retry => match planner.begin_retry() {
                Some(RetryTicket::Analysis(ticket)) => {
                    pending.push(spawn_analysis(planner, ticket))
                }
                Some(RetryTicket::Plan(ticket)) => pending.push(spawn_plan(planner, ticket)),
                None => println!("   Nothing to retry."),
            },
            SessionCommand::Show => {
                let snap = planner.snapshot();
                println!(
                    "   State: {} (updated {})",
                    snap.phase.as_str(),
                    snap.updated_at.format("%H:%M:%S UTC")
                );
                if snap.phase.is_loading() {
                    println!("   A request is still in flight.");
                }
                render_full(&snap, &currency, pie_limit);
            }
            SessionCommand::Targets => match planner.snapshot().analysis {
                Some(analysis) => print_targets(&analysis, &currency),
                None => println!("   No analysis loaded yet."),
            },
            SessionCommand::QuickWins => {
                let planner = planner.clone();
                let currency = currency.clone();
                pending.push(tokio::spawn(async move {
                    match planner.quick_wins().await {
                        Ok(wins) => {
                            for win in &wins.quick_wins {
                                let savings = win
                                    .potential_monthly_savings
                                    .map(|s| format_currency(s, &currency))
                                    .unwrap_or_else(|| "varies".into());
                                println!("   ⚡ {} ({})", win.suggestion, savings);
                            }
                        }
                        Err(e) => println!("   ⚠️  {}", e.user_message()),
                    }
                }));
            }
        }
    }

    if quit {
        for handle in pending.drain(..) {
            handle.abort();
        }
    } else {
        for handle in pending.drain(..) {
            let _ = handle.await;
        }
    }

    let _ = stop_tx.send(());
    let _ = renderer.await;
    Ok(())
}

/// Print every transition until stopped; the latest state is flushed on stop
fn spawn_renderer(
    mut rx: watch::Receiver<Snapshot>,
    mut stop: oneshot::Receiver<()>,
    currency: String,
    pie_limit: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snap = rx.borrow_and_update().clone();
                    render_transition(&snap, &currency, pie_limit);
                }
                _ = &mut stop => {
                    if rx.has_changed().unwrap_or(false) {
                        let snap = rx.borrow_and_update().clone();
                        render_transition(&snap, &currency, pie_limit);
                    }
                    break;
                }
            }
        }
    })
}

fn spawn_analysis(planner: &Arc<Planner>, ticket: AnalysisTicket) -> JoinHandle<()> {
    let planner = planner.clone();
    // Request failures are rendered from the error snapshot
    tokio::spawn(async move {
        let _ = planner.resolve_analysis(ticket).await;
    })
}

fn spawn_plan(planner: &Arc<Planner>, ticket: PlanTicket) -> JoinHandle<()> {
    let planner = planner.clone();
    tokio::spawn(async move {
        let _ = planner.resolve_plan(ticket).await;
    })
}

fn render_transition(snap: &Snapshot, currency: &str, pie_limit: usize) {
    match &snap.phase {
        Phase::Idle => {}
        Phase::Loading(Request::Analysis { months }) => {
            println!("   ⏳ Analyzing the last {} months...", months);
        }
        Phase::Loading(Request::Plan { target }) => {
            println!(
                "   ⏳ Building a plan for {}/month...",
                format_currency(target.amount(), currency)
            );
        }
        Phase::Ready(_) => render_full(snap, currency, pie_limit),
        Phase::Error { message, .. } => {
            println!("   ⚠️  {}", message);
            println!("      Type 'retry' to try again.");
        }
    }
}

fn render_full(snap: &Snapshot, currency: &str, pie_limit: usize) {
    match snap.phase {
        Phase::Ready(Stage::Plan) => {
            if let Some(plan) = &snap.plan {
                print_plan(plan, currency);
            }
        }
        _ => {
            if let Some(analysis) = &snap.analysis {
                print_analysis(analysis, snap.months, currency, pie_limit);
            }
            if let Some(plan) = &snap.plan {
                print_plan(plan, currency);
            }
        }
    }
}

fn print_session_help() {
    println!("   <amount>          request a plan for a monthly savings goal");
    println!("   preset <name>     economical, default, moderate or ambitious");
    println!("   months <n>        analyze a different period");
    println!("   targets           show suggested goals");
    println!("   wins              show quick wins");
    println!("   show              show the current analysis and plan");
    println!("   retry             repeat the request that failed");
    println!("   quit              leave the session");
}
