use std::io::Write;

use anyhow::Context;
use sdnroute_core::{ControllerOpts, ErrorKind, FlowState, NodeId, Volume, Weight};
use sdnroute_utils::{read_controller, read_topology_spec, Error};

const DIAMOND: &str = r#"{
    "nodes": ["A", "B", "C", "D"],
    "links": [
        { "a": "A", "b": "B" },
        { "a": "B", "b": "C" },
        { "a": "C", "b": "D", "capacity": 40 },
        { "a": "A", "b": "D", "weight": 5 }
    ],
    "flows": [
        { "src": "A", "dst": "D", "traffic": "voice", "volume": 10 }
    ]
}"#;

fn write_spec(contents: &str, suffix: &str) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .context("failed to create spec file")?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

#[test]
fn json_spec_builds_controller() -> anyhow::Result<()> {
    let file = write_spec(DIAMOND, ".json")?;
    let controller = read_controller(file.path(), None)?;
    assert_eq!(controller.topology().nr_nodes(), 4);
    assert_eq!(controller.topology().nr_links(), 4);

    let cd = controller
        .link(&NodeId::new("C"), &NodeId::new("D"))
        .context("missing C-D")?;
    assert_eq!(cd.capacity, Volume::new(40));
    assert_eq!(cd.weight, Weight::ONE);
    assert_eq!(cd.utilization, Volume::new(10));

    let flow = controller.flows().next().context("missing flow")?;
    assert_eq!(flow.state(), FlowState::Routed);
    Ok(())
}

#[test]
fn caller_opts_override_spec_defaults() -> anyhow::Result<()> {
    let spec = r#"{
        "defaults": { "default_capacity": 7 },
        "nodes": ["x", "y"],
        "links": [{ "a": "x", "b": "y" }]
    }"#;
    let file = write_spec(spec, ".json")?;
    let controller = read_controller(file.path(), None)?;
    let link = controller
        .link(&NodeId::new("x"), &NodeId::new("y"))
        .context("missing link")?;
    assert_eq!(link.capacity, Volume::new(7));
    assert_eq!(link.weight, Weight::ONE);

    // Caller-supplied defaults win over the file's.
    let opts = ControllerOpts::builder()
        .default_capacity(Volume::new(9))
        .build();
    let controller = read_controller(file.path(), Some(opts))?;
    let link = controller
        .link(&NodeId::new("x"), &NodeId::new("y"))
        .context("missing link")?;
    assert_eq!(link.capacity, Volume::new(9));
    Ok(())
}

#[test]
fn unknown_extension_fails() -> anyhow::Result<()> {
    let file = write_spec(DIAMOND, ".yaml")?;
    let res = read_topology_spec(file.path());
    assert!(matches!(res, Err(Error::UnknownFileType(..))));
    Ok(())
}

#[test]
fn malformed_json_fails() -> anyhow::Result<()> {
    let file = write_spec("{ \"nodes\": [", ".json")?;
    assert!(matches!(read_topology_spec(file.path()), Err(Error::Json(..))));
    Ok(())
}

#[test]
fn invalid_topology_is_rejected() -> anyhow::Result<()> {
    let spec = r#"{ "nodes": ["A"], "links": [{ "a": "A", "b": "Q" }] }"#;
    let file = write_spec(spec, ".json")?;
    match read_controller(file.path(), None) {
        Err(Error::Controller(e)) => assert_eq!(e.kind(), ErrorKind::NodeNotFound),
        other => anyhow::bail!("expected a controller error, got {other:?}"),
    }
    Ok(())
}
