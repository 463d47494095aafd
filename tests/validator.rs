// tests/validator.rs

mod common;
use crate::common::builders::{PlanBuilder, StepBuilder};

use planwave::plan::{
    validate_plan, ExperimentMode, ExperimentSpec, Priority, StepKind, SynthesisMode,
    SynthesizeSpec, ValidationCode,
};

#[test]
fn well_formed_plan_is_valid() {
    let plan = PlanBuilder::new("ok")
        .requirement("R1", Priority::Must)
        .hypothesis("H1")
        .step(StepBuilder::research("S1").requirements(&["R1"]))
        .step(
            StepBuilder::experiment("S2", ExperimentMode::Confirmatory)
                .after(&["S1"])
                .hypotheses(&["H1"]),
        )
        .build();

    let report = validate_plan(&plan);
    assert!(report.valid, "unexpected issues: {}", report.summary());
    assert!(report.errors.is_empty());
}

#[test]
fn self_dependency_is_a_cycle() {
    let plan = PlanBuilder::new("self")
        .step(StepBuilder::research("S1").after(&["S1"]))
        .build();

    let report = validate_plan(&plan);
    assert!(!report.valid);
    let cycle: Vec<_> = report
        .issues_with_code(ValidationCode::CycleDetected)
        .collect();
    assert_eq!(cycle.len(), 1);
    assert_eq!(cycle[0].step_id.as_deref(), Some("S1"));
}

#[test]
fn longer_cycle_is_detected() {
    let plan = PlanBuilder::new("loop")
        .step(StepBuilder::research("A").after(&["C"]))
        .step(StepBuilder::research("B").after(&["A"]))
        .step(StepBuilder::research("C").after(&["B"]))
        .step(StepBuilder::research("D"))
        .build();

    let report = validate_plan(&plan);
    assert!(report.has_code(ValidationCode::CycleDetected));
    assert!(!report.has_code(ValidationCode::UnknownDependency));
}

#[test]
fn accumulates_every_problem() {
    let bad_synth = StepBuilder::with_kind(
        "S4",
        StepKind::Synthesize(SynthesizeSpec {
            mode: Some(SynthesisMode::Evaluate),
            evaluate_against: Vec::new(),
        }),
    )
    .after(&["S1"]);

    let plan = PlanBuilder::new("messy")
        .step(StepBuilder::research("S1"))
        .step(StepBuilder::research("S1"))
        .step(StepBuilder::develop("S2").after(&["ghost"]))
        .step(
            StepBuilder::research("S3")
                .requirements(&["R9"])
                .hypotheses(&["H9"]),
        )
        .step(bad_synth)
        .step(StepBuilder::with_kind(
            "S5",
            StepKind::Experiment(ExperimentSpec {
                mode: Some(ExperimentMode::Confirmatory),
                ..ExperimentSpec::default()
            }),
        ))
        .build();

    let report = validate_plan(&plan);
    assert!(!report.valid);

    let codes: Vec<_> = report.errors.iter().map(|e| e.code).collect();
    assert_eq!(
        codes,
        vec![
            ValidationCode::DuplicateStepId,
            ValidationCode::UnknownDependency,
            ValidationCode::UnknownRequirement,
            ValidationCode::UnknownHypothesis,
            ValidationCode::MissingRequiredField,
            ValidationCode::MissingRequiredField,
        ]
    );
    assert_eq!(report.errors[1].step_id.as_deref(), Some("S2"));
    assert!(report.errors[4].message.contains("evaluateAgainst"));
    assert!(report.errors[5].message.contains("preregisteredCommitments"));
}

#[test]
fn cross_reference_issues_still_invalidate() {
    let plan = PlanBuilder::new("refs")
        .step(StepBuilder::research("S1").requirements(&["R1"]))
        .build();

    let report = validate_plan(&plan);
    assert!(!report.valid);
    assert!(report.errors.iter().all(|e| !e.code.is_structural()));
}

#[test]
fn report_serializes_codes_in_screaming_case() {
    let plan = PlanBuilder::new("dup")
        .step(StepBuilder::research("S1"))
        .step(StepBuilder::research("S1"))
        .build();

    let json = serde_json::to_value(validate_plan(&plan)).unwrap();
    assert_eq!(json["valid"], false);
    assert_eq!(json["errors"][0]["code"], "DUPLICATE_STEP_ID");
    assert_eq!(json["errors"][0]["stepId"], "S1");
}
