//! BDD step definitions for CLI behaviour.
//!
//! Steps map `tests/features/pytransform_cli.feature` onto in-process CLI
//! runs against a fake transformation server.

use std::cell::RefCell;
use std::process::ExitCode;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

use super::support::cli::CliWorld;
use super::support::fake_worker::{FakeWorker, Reply};

#[fixture]
fn world() -> RefCell<CliWorld> {
    RefCell::new(CliWorld::new().expect("create CLI world"))
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches('"')
}

#[given("no transformation server is listening")]
fn given_no_server(world: &RefCell<CliWorld>) {
    assert!(world.borrow().worker.is_none());
}

#[given("a transformation server answering {field} with {code}")]
fn given_server_answering(world: &RefCell<CliWorld>, field: String, code: String) {
    let mut body = json!({
        "validation": {"is_valid": true, "errors": []},
        "explanations": []
    });
    body[unquote(&field)] = Value::from(unquote(&code));
    let worker = FakeWorker::spawn(vec![Reply::json(&body)]).expect("spawn fake worker");
    world.borrow_mut().attach(worker);
}

#[given("a transformation server failing with {message}")]
fn given_server_failing(world: &RefCell<CliWorld>, message: String) {
    let body = json!({"status": "error", "message": unquote(&message)}).to_string();
    let worker = FakeWorker::spawn(vec![Reply::status(500, body)]).expect("spawn fake worker");
    world.borrow_mut().attach(worker);
}

#[given("a source file {name} containing {content}")]
fn given_source_file(world: &RefCell<CliWorld>, name: String, content: String) {
    world
        .borrow()
        .write_file(unquote(&name), unquote(&content))
        .expect("write source file");
}

#[given("the operator will answer {answer}")]
fn given_answer(world: &RefCell<CliWorld>, answer: String) {
    world.borrow_mut().input = format!("{}\n", unquote(&answer));
}

#[when("the operator runs {command}")]
fn when_operator_runs(world: &RefCell<CliWorld>, command: String) {
    world.borrow_mut().run(unquote(&command));
}

#[then("the command succeeds")]
fn then_succeeds(world: &RefCell<CliWorld>) {
    let world = world.borrow();
    assert_eq!(
        world.exit_code,
        Some(ExitCode::SUCCESS),
        "stderr: {}",
        world.stderr.text()
    );
}

#[then("the command fails")]
fn then_fails(world: &RefCell<CliWorld>) {
    assert_eq!(world.borrow().exit_code, Some(ExitCode::FAILURE));
}

#[then("the operator was asked to start the server")]
fn then_asked_to_start(world: &RefCell<CliWorld>) {
    assert!(world.borrow().stderr.text().contains("Would you like to start it now? [y/N]"));
}

#[then("stderr mentions {text}")]
fn then_stderr_mentions(world: &RefCell<CliWorld>, text: String) {
    let stderr = world.borrow().stderr.text();
    assert!(
        stderr.contains(unquote(&text)),
        "expected {text} in stderr: {stderr}"
    );
}

#[then("the file {name} contains {content}")]
fn then_file_contains(world: &RefCell<CliWorld>, name: String, content: String) {
    let actual = world
        .borrow()
        .read_file(unquote(&name))
        .expect("read source file");
    assert_eq!(actual, unquote(&content));
}

#[then("the server received {code} for {operation}")]
fn then_server_received(world: &RefCell<CliWorld>, code: String, operation: String) {
    let requests = world
        .borrow()
        .worker
        .as_ref()
        .map(FakeWorker::json_requests)
        .transpose()
        .expect("parse requests")
        .unwrap_or_default();
    assert_eq!(
        requests,
        vec![json!({"code": unquote(&code), "operation": unquote(&operation)})]
    );
}

#[then("the server received no requests")]
fn then_no_requests(world: &RefCell<CliWorld>) {
    assert!(world.borrow().requests().is_empty());
}

#[scenario(path = "tests/features/pytransform_cli.feature")]
fn pytransform_cli_behaviour(world: RefCell<CliWorld>) {
    let _ = world;
}
