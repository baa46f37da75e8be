//! The command loop. A [`Session`] parses one command per line, runs it against its
//! [`Controller`], and writes the outcome. Rejected commands are reported and the loop goes on.

use std::io::{BufRead, Write};

use anyhow::Context;
use itertools::Itertools;
use log::debug;
use sdnroute_core::{Controller, FlowState, RerouteReport, Snapshot};

use crate::command::{Command, ParseError, USAGE};

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOpts {
    /// Lowercase every command before parsing, so that `A` and `a` name the same node.
    pub fold_case: bool,
    /// Render `visualize` as JSON.
    pub json: bool,
    /// Print a prompt before reading each command.
    pub prompt: bool,
}

#[derive(Debug)]
pub struct Session<W> {
    controller: Controller,
    out: W,
    opts: SessionOpts,
}

/// Whether the loop should keep reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Exit,
}

impl<W: Write> Session<W> {
    pub fn new(controller: Controller, out: W, opts: SessionOpts) -> Self {
        Self {
            controller,
            out,
            opts,
        }
    }

    /// Runs commands from `input` until it is exhausted or an exit command is read.
    pub fn run(&mut self, input: impl BufRead) -> anyhow::Result<()> {
        self.prompt()?;
        for line in input.lines() {
            let line = line.context("failed to read command")?;
            if self.handle_line(&line)? == Step::Exit {
                break;
            }
            self.prompt()?;
        }
        Ok(())
    }

    /// Handles a single line of input. Only I/O failures are returned as errors.
    pub fn handle_line(&mut self, line: &str) -> anyhow::Result<Step> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Step::Continue);
        }
        let line = if self.opts.fold_case {
            line.to_lowercase()
        } else {
            line.to_owned()
        };
        debug!("command: {line}");
        let output = match line.parse::<Command>() {
            Ok(Command::Exit) => return Ok(Step::Exit),
            Ok(cmd) => self.execute(cmd),
            Err(e) => render_parse_error(&e),
        };
        writeln!(self.out, "{output}").context("failed to write output")?;
        Ok(Step::Continue)
    }

    /// Runs a command and renders its outcome, successful or not.
    pub fn execute(&mut self, cmd: Command) -> String {
        let json = self.opts.json;
        let c = &mut self.controller;
        let res = match cmd {
            Command::AddNode(id) => c.add_node(id.clone()).map(|()| format!("node {id} added")),
            Command::AddLink {
                a,
                b,
                weight,
                capacity,
            } => c
                .add_link_with_defaults(&a, &b, weight, capacity)
                .map(|()| format!("link {a}-{b} added")),
            Command::RemoveNode(id) => c
                .remove_node(&id)
                .map(|r| with_report(format!("node {id} removed"), c, &r)),
            Command::RemoveLink(a, b) => c
                .remove_link(&a, &b)
                .map(|r| with_report(format!("link {a}-{b} removed"), c, &r)),
            Command::InjectTraffic {
                src,
                dst,
                traffic,
                volume,
            } => c
                .inject(&src, &dst, traffic, volume)
                .map(|f| match f.route() {
                    Some(route) => format!("flow {} routed via {route}", f.id),
                    None => format!("flow {} dropped: no path from {src} to {dst}", f.id),
                }),
            Command::SimulateLinkFailure(a, b) => c
                .simulate_link_failure(&a, &b)
                .map(|r| with_report(format!("link {a}-{b} failed"), c, &r)),
            Command::SimulateNodeFailure(id) => c
                .simulate_node_failure(&id)
                .map(|r| with_report(format!("node {id} failed"), c, &r)),
            Command::QueryRouting(src, dst) => c
                .query_routing(&src, &dst)
                .map(|route| format!("routing from {src} to {dst}: {route}")),
            Command::Route { src, dst, traffic } => c
                .compute_path(&src, &dst, traffic)
                .map(|route| format!("{traffic} route from {src} to {dst}: {route}")),
            Command::ClearFlow(id) => c.clear_flow(id).map(|_| format!("flow {id} cleared")),
            Command::ClearDropped => Ok(format!("{} dropped flows cleared", c.clear_dropped())),
            Command::Flows => Ok(render_flows(&c.snapshot())),
            Command::Visualize => Ok(render_snapshot(&c.snapshot(), json)),
            Command::Help => Ok(USAGE.iter().join("\n")),
            Command::Exit => Ok(String::new()),
        };
        res.unwrap_or_else(|e| format!("error [{}]: {e}", e.kind()))
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn prompt(&mut self) -> anyhow::Result<()> {
        if self.opts.prompt {
            write!(self.out, "SDN > ")?;
            self.out.flush()?;
        }
        Ok(())
    }
}

fn with_report(headline: String, c: &Controller, report: &RerouteReport) -> String {
    let mut lines = vec![headline];
    for &id in &report.rerouted {
        if let Some(route) = c.flow(id).and_then(|f| f.route()) {
            lines.push(format!("flow {id} rerouted via {route}"));
        }
    }
    for &id in &report.dropped {
        lines.push(format!("flow {id} dropped: no backup path"));
    }
    lines.join("\n")
}

fn render_parse_error(e: &ParseError) -> String {
    match e.kind() {
        Some(kind) => format!("error [{kind}]: {e}"),
        None => e.to_string(),
    }
}

fn render_flows(snapshot: &Snapshot) -> String {
    if snapshot.flows.is_empty() {
        return "no flows".to_owned();
    }
    snapshot
        .flows
        .iter()
        .map(|f| {
            let path = if f.state.is_active() {
                f.path.iter().join(" -> ")
            } else {
                "-".to_owned()
            };
            format!(
                "flow {} {}->{} {} {} {} {path}",
                f.id,
                f.src,
                f.dst,
                f.traffic,
                f.volume,
                state_name(f.state)
            )
        })
        .join("\n")
}

/// Renders the topology and flow table as JSON or as plain text.
fn render_snapshot(snapshot: &Snapshot, json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(snapshot)
            .unwrap_or_else(|e| format!("error: failed to encode snapshot: {e}"));
    }
    let mut lines = Vec::new();
    lines.push(format!(
        "nodes: {}",
        snapshot.nodes.iter().map(|n| &n.id).join(" ")
    ));
    lines.push("links:".to_owned());
    for l in &snapshot.links {
        let status = if l.active { "up" } else { "down" };
        lines.push(format!(
            "  {}-{} weight {} load {}/{} ({:.0}%) {status}",
            l.a,
            l.b,
            l.weight,
            l.utilization,
            l.capacity,
            l.ratio * 100.0
        ));
    }
    lines.push("flows:".to_owned());
    lines.push(render_flows(snapshot));
    lines.join("\n")
}

fn state_name(state: FlowState) -> &'static str {
    match state {
        FlowState::Pending => "pending",
        FlowState::Routed => "routed",
        FlowState::Rerouted => "rerouted",
        FlowState::Dropped => "dropped",
    }
}
