//! Library integration tests.

use kettle::KettleError;

#[test]
fn error_types_are_public() {
    let err = KettleError::StepNotFound {
        name: "S09.sh".into(),
    };
    assert!(err.to_string().contains("S09.sh"));
    assert_eq!(err.code(), "UNKNOWN_STEP");
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> kettle::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn aborted_failures_carry_kind_and_payload() {
    let err = KettleError::MissingSteps {
        steps: vec!["S9".to_string(), "S10".to_string()],
    };
    let failure = err.to_failure();

    assert_eq!(failure.kind, "ABORTED");
    assert_eq!(failure.code, "MISSING_STEP");
    assert_eq!(failure.data["steps"][1], "S10");
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use kettle::cli::{Cli, Commands};

    let cli = Cli::parse_from(["kettle", "status", "--json"]);
    if let Some(Commands::Status(args)) = cli.command {
        assert!(args.json);
    } else {
        panic!("Expected Status command");
    }
}

#[test]
fn project_round_trips_through_definition_file() {
    use kettle::config::{write_definition, ProjectDefinition, StepDefinition};
    use kettle::project::{Project, StepStatus};

    let temp = tempfile::TempDir::new().unwrap();
    let definition = ProjectDefinition {
        name: "weather".to_string(),
        steps: vec![
            StepDefinition::named("S01-load.sh"),
            StepDefinition::named("S02-plot.sh"),
        ],
        ..Default::default()
    };
    write_definition(temp.path(), &definition).unwrap();

    let mut project = Project::open(temp.path()).unwrap();
    assert_eq!(project.step_names(), vec!["S01-load.sh", "S02-plot.sh"]);
    assert!(project
        .steps
        .iter()
        .all(|s| s.status == StepStatus::NeverRun));

    project.write().unwrap();
    assert!(project.state_file().exists());
}
