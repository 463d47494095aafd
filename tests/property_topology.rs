// tests/property_topology.rs

mod common;
use crate::common::builders::{PlanBuilder, StepBuilder};

use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;

use planwave::dag::{analyze, DagGraph, Scheduler, StepCompletion};
use planwave::plan::{validate_plan, Plan};
use planwave::types::DependencyFailurePolicy;

// Acyclic by construction: step i may only depend on steps 0..i.
fn acyclic_plan_strategy(max_steps: usize) -> impl Strategy<Value = Plan> {
    (1..=max_steps).prop_flat_map(|num_steps| {
        let deps = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..4),
            num_steps,
        );
        let concurrent = proptest::collection::vec(any::<bool>(), num_steps);
        let shuffle = Just((0..num_steps).collect::<Vec<_>>()).prop_shuffle();

        (deps, concurrent, shuffle).prop_map(move |(raw_deps, concurrent, order)| {
            let name = |i: usize| format!("S{i:02}");
            let mut slots: Vec<Option<StepBuilder>> = raw_deps
                .into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    let picked: BTreeSet<usize> = if i == 0 {
                        BTreeSet::new()
                    } else {
                        potential.into_iter().map(|d| d % i).collect()
                    };
                    let dep_names: Vec<String> = picked.into_iter().map(name).collect();
                    let dep_refs: Vec<&str> = dep_names.iter().map(String::as_str).collect();
                    Some(
                        StepBuilder::research(&name(i))
                            .after(&dep_refs)
                            .concurrent(concurrent[i]),
                    )
                })
                .collect();

            // Declaration order must not matter.
            let mut builder = PlanBuilder::new("random");
            for i in order {
                if let Some(step) = slots[i].take() {
                    builder = builder.step(step);
                }
            }
            builder.build()
        })
    })
}

proptest! {
    #[test]
    fn generated_plans_are_valid(plan in acyclic_plan_strategy(12)) {
        prop_assert!(validate_plan(&plan).valid);
        prop_assert!(!DagGraph::from_plan(&plan).has_cycle());
    }

    #[test]
    fn topological_order_respects_every_edge(plan in acyclic_plan_strategy(12)) {
        let topo = analyze(&plan);
        prop_assert_eq!(topo.topological_order.len(), plan.steps.len());

        let position: HashMap<&str, usize> = topo
            .topological_order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        for step in &plan.steps {
            for dep in &step.dependency_ids {
                prop_assert!(position[dep.as_str()] < position[step.id.as_str()]);
            }
        }
    }

    #[test]
    fn parallel_groups_partition_steps(plan in acyclic_plan_strategy(12)) {
        let topo = analyze(&plan);
        let mut seen = BTreeSet::new();
        for (i, group) in topo.parallel_groups.iter().enumerate() {
            prop_assert_eq!(group.depth, i);
            for id in &group.step_ids {
                prop_assert!(seen.insert(id.clone()), "{} appears twice", id);
            }
            for id in &group.parallelizable_step_ids {
                prop_assert!(group.step_ids.contains(id));
            }
        }
        prop_assert_eq!(seen.len(), plan.steps.len());

        // A step sits strictly deeper than each of its dependencies.
        for step in &plan.steps {
            let depth = topo.depth_of(&step.id).unwrap();
            for dep in &step.dependency_ids {
                prop_assert!(topo.depth_of(dep).unwrap() < depth);
            }
        }
    }

    #[test]
    fn critical_path_is_a_longest_chain(plan in acyclic_plan_strategy(12)) {
        let topo = analyze(&plan);
        let path = &topo.critical_path;

        prop_assert!(path.len() <= plan.steps.len());
        // The longest chain has one step per wave.
        prop_assert_eq!(path.len(), topo.parallel_groups.len());
        prop_assert!(topo.entry_points.contains(&path[0]));
        prop_assert!(topo.exit_points.contains(path.last().unwrap()));
        for pair in path.windows(2) {
            let next = plan.step(&pair[1]).unwrap();
            prop_assert!(next.dependency_ids.contains(&pair[0]));
        }
    }

    #[test]
    fn analysis_is_deterministic(plan in acyclic_plan_strategy(12)) {
        prop_assert_eq!(analyze(&plan), analyze(&plan));
    }

    #[test]
    fn scheduler_never_starts_a_step_before_its_dependencies(
        plan in acyclic_plan_strategy(12),
        failing in proptest::collection::vec(any::<bool>(), 12),
        skip in any::<bool>(),
    ) {
        let topo = analyze(&plan);
        let policy = if skip {
            DependencyFailurePolicy::Skip
        } else {
            DependencyFailurePolicy::Run
        };
        let mut scheduler = Scheduler::new(&plan, &topo, policy);
        let mut finished: BTreeSet<String> = BTreeSet::new();

        while let Some(wave) = scheduler.next_wave().unwrap() {
            for id in wave.dispatch.iter().chain(wave.skipped.iter().map(|s| &s.id)) {
                let step = plan.step(id).unwrap();
                for dep in &step.dependency_ids {
                    prop_assert!(finished.contains(dep), "{} started before {}", id, dep);
                }
            }
            for id in &wave.dispatch {
                let index: usize = id[1..].parse().unwrap();
                let completion = if failing[index] {
                    StepCompletion::Failed
                } else {
                    StepCompletion::Success
                };
                scheduler.record_completion(id, completion).unwrap();
            }
            finished.extend(wave.dispatch.iter().cloned());
            finished.extend(wave.skipped.iter().map(|s| s.id.clone()));
        }

        prop_assert!(scheduler.all_terminal());
        prop_assert_eq!(finished.len(), plan.steps.len());
    }
}
