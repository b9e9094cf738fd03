use super::*;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("testdeck").chain(args.iter().copied()))
}

#[test]
fn watch_rejects_zero_max_events() {
    let err = parse(&["watch", "--task-id", "1", "--max-events", "0"]).expect_err("zero events");
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}

#[test]
fn watch_accepts_positive_max_events() {
    let cli = parse(&["watch", "--task-id", "1", "--max-events", "1"]).expect("one event");
    let Command::Watch(args) = cli.command else {
        panic!("expected watch, got {:?}", cli.command);
    };
    assert_eq!(args.task_id, 1);
    assert_eq!(args.max_events, Some(1));
}

#[test]
fn watch_without_limit_runs_until_stopped() {
    let cli = parse(&["watch", "--task-id", "7"]).expect("no limit");
    let Command::Watch(args) = cli.command else {
        panic!("expected watch, got {:?}", cli.command);
    };
    assert_eq!(args.max_events, None);
}
