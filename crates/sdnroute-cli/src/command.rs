//! Parsing of operator commands. Every command maps onto exactly one controller operation.

use std::str::FromStr;

use sdnroute_core::{ErrorKind, FlowId, NodeId, TrafficType, UnknownTrafficType, Volume, Weight};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddNode(NodeId),
    AddLink {
        a: NodeId,
        b: NodeId,
        weight: Option<Weight>,
        capacity: Option<Volume>,
    },
    RemoveNode(NodeId),
    RemoveLink(NodeId, NodeId),
    InjectTraffic {
        src: NodeId,
        dst: NodeId,
        traffic: TrafficType,
        volume: Volume,
    },
    SimulateLinkFailure(NodeId, NodeId),
    SimulateNodeFailure(NodeId),
    QueryRouting(NodeId, NodeId),
    /// Preview the path a new flow would take.
    Route {
        src: NodeId,
        dst: NodeId,
        traffic: TrafficType,
    },
    ClearFlow(FlowId),
    ClearDropped,
    Flows,
    Visualize,
    Help,
    Exit,
}

pub const USAGE: &[&str] = &[
    "add node <id>",
    "add link <a> <b> [weight] [capacity]",
    "remove node <id>",
    "remove link <a> <b>",
    "inject traffic <src> <dst> <alerts|voice|video|data> <volume>",
    "simulate link failure <a> <b>",
    "simulate node failure <id>",
    "query routing <src> <dst>",
    "route <src> <dst> [type]",
    "clear flow <id>",
    "clear dropped",
    "flows",
    "visualize",
    "help",
    "exit",
];

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        let cmd = match tokens.as_slice() {
            [] => return Err(ParseError::Empty),
            ["add", "node", n] => Command::AddNode(id(n)),
            ["add", "node", ..] => return Err(ParseError::Usage(USAGE[0])),
            ["add", "link", a, b, rest @ ..] if rest.len() <= 2 => Command::AddLink {
                a: id(a),
                b: id(b),
                weight: rest.first().map(|w| number("weight", w)).transpose()?,
                capacity: rest.get(1).map(|c| number("capacity", c)).transpose()?,
            },
            ["add", "link", ..] => return Err(ParseError::Usage(USAGE[1])),
            ["remove", "node", n] => Command::RemoveNode(id(n)),
            ["remove", "node", ..] => return Err(ParseError::Usage(USAGE[2])),
            ["remove", "link", a, b] => Command::RemoveLink(id(a), id(b)),
            ["remove", "link", ..] => return Err(ParseError::Usage(USAGE[3])),
            ["inject", "traffic", src, dst, ty, vol] => Command::InjectTraffic {
                src: id(src),
                dst: id(dst),
                traffic: ty.parse()?,
                volume: number("volume", vol)?,
            },
            ["inject", ..] => return Err(ParseError::Usage(USAGE[4])),
            ["simulate", "link", "failure", a, b] => Command::SimulateLinkFailure(id(a), id(b)),
            ["simulate", "link", ..] => return Err(ParseError::Usage(USAGE[5])),
            ["simulate", "node", "failure", n] => Command::SimulateNodeFailure(id(n)),
            ["simulate", "node", ..] => return Err(ParseError::Usage(USAGE[6])),
            ["query", "routing", src, dst] => Command::QueryRouting(id(src), id(dst)),
            ["query", ..] => return Err(ParseError::Usage(USAGE[7])),
            ["route", src, dst] => Command::Route {
                src: id(src),
                dst: id(dst),
                traffic: TrafficType::Data,
            },
            ["route", src, dst, ty] => Command::Route {
                src: id(src),
                dst: id(dst),
                traffic: ty.parse()?,
            },
            ["route", ..] => return Err(ParseError::Usage(USAGE[8])),
            ["clear", "flow", f] => Command::ClearFlow(number("flow id", f)?),
            ["clear", "dropped"] => Command::ClearDropped,
            ["clear", ..] => return Err(ParseError::Usage("clear flow <id> | clear dropped")),
            ["flows"] => Command::Flows,
            ["visualize"] => Command::Visualize,
            ["help"] => Command::Help,
            ["exit" | "quit" | "q"] => Command::Exit,
            [first, ..] => return Err(ParseError::Unknown(first.to_string())),
        };
        Ok(cmd)
    }
}

fn id(s: &str) -> NodeId {
    NodeId::new(s)
}

fn number<T: FromStr>(what: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        what,
        value: value.to_owned(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid {what} `{value}`")]
    InvalidNumber { what: &'static str, value: String },

    #[error(transparent)]
    Traffic(#[from] UnknownTrafficType),
}

impl ParseError {
    /// Malformed arguments belong to the controller's error taxonomy. Other parse failures
    /// never reach the controller.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ParseError::InvalidNumber { .. } | ParseError::Traffic(..) => {
                Some(ErrorKind::InvalidArgument)
            }
            _ => None,
        }
    }
}
