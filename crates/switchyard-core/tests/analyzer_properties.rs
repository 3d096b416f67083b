//! Property-based tests for dependency analysis
//!
//! Random acyclic task sets are generated by only letting a task depend on
//! tasks with a lower index; the input order is then shuffled.

use proptest::prelude::*;
use switchyard_core::{
    dependency_depth, detect_cycles, topological_sort, DependencyAnalyzer, ResourceRecord,
    ResourceRegistry, ResourceType, Task,
};

// Strategy for an acyclic task set in arbitrary input order
fn dag_strategy() -> impl Strategy<Value = Vec<Task>> {
    (1usize..16)
        .prop_flat_map(|n| {
            let edges = prop::collection::vec(
                prop::collection::vec(any::<prop::sample::Index>(), 0..4),
                n,
            );
            (Just(n), edges)
        })
        .prop_map(|(n, edges)| {
            (0..n)
                .map(|i| {
                    let deps: Vec<String> = if i == 0 {
                        Vec::new()
                    } else {
                        edges[i].iter().map(|idx| format!("t{}", idx.index(i))).collect()
                    };
                    Task::new(format!("t{i}")).with_dependencies(deps)
                })
                .collect::<Vec<_>>()
        })
        .prop_shuffle()
}

proptest! {
    /// Property: levels partition the task set
    #[test]
    fn prop_levels_partition_every_task(tasks in dag_strategy()) {
        let graph = DependencyAnalyzer::new().build_graph(&tasks);
        let levels = topological_sort(&graph);

        let mut seen: Vec<String> = levels.iter().flatten().cloned().collect();
        seen.sort();
        let mut expected: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
        expected.sort();
        prop_assert_eq!(seen, expected);
        prop_assert!(levels.iter().all(|level| !level.is_empty()));
    }

    /// Property: every dependency sits in a strictly earlier level
    #[test]
    fn prop_dependencies_precede_dependents(tasks in dag_strategy()) {
        let graph = DependencyAnalyzer::new().build_graph(&tasks);
        let levels = topological_sort(&graph);
        let level_of = |id: &str| levels.iter().position(|l| l.iter().any(|n| n == id));

        for task in &tasks {
            let own = level_of(&task.id).unwrap();
            for dep in graph.dependencies(&task.id) {
                prop_assert!(level_of(dep).unwrap() < own);
            }
        }
    }

    /// Property: depth equals level index and no cycle is reported
    #[test]
    fn prop_depth_matches_level(tasks in dag_strategy()) {
        let graph = DependencyAnalyzer::new().build_graph(&tasks);
        prop_assert!(detect_cycles(&graph).is_empty());

        for (index, level) in topological_sort(&graph).iter().enumerate() {
            for id in level {
                prop_assert_eq!(dependency_depth(&graph, id).unwrap(), index);
            }
        }
    }

    /// Property: adding a back edge always yields a reported cycle
    #[test]
    fn prop_back_edge_is_detected(tasks in dag_strategy()) {
        let mut tasks = tasks;
        let analyzer = DependencyAnalyzer::new();

        // D -> X where X depends on D; a self edge when nothing has dependencies
        let back_edge = tasks
            .iter()
            .find_map(|t| t.dependencies.as_ref()?.first().map(|d| (d.clone(), t.id.clone())))
            .unwrap_or_else(|| (tasks[0].id.clone(), tasks[0].id.clone()));
        let (from, to) = back_edge;
        let task = tasks.iter_mut().find(|t| t.id == from).unwrap();
        task.dependencies.get_or_insert_with(Vec::new).push(to.clone());

        let graph = analyzer.build_graph(&tasks);
        let cycles = detect_cycles(&graph);
        prop_assert!(cycles.iter().any(|c| c.contains(&from) && c.contains(&to)));
        prop_assert!(analyzer.group_parallel_tasks(&tasks).unwrap_err().is_cycle());
        prop_assert!(dependency_depth(&graph, &to).is_err());
    }

    /// Property: resolve_dependencies is idempotent and dependency-first
    #[test]
    fn prop_resolve_dependencies_idempotent(tasks in dag_strategy()) {
        let mut registry = ResourceRegistry::new();
        for task in &tasks {
            let deps = task
                .dependencies
                .clone()
                .unwrap_or_default()
                .into_iter()
                .map(|d| format!("skill:{d}"));
            registry
                .register(ResourceRecord::new(ResourceType::Skill, &task.id).with_dependencies(deps))
                .unwrap();
        }

        for task in &tasks {
            let namespace = format!("skill:{}", task.id);
            let first = registry.resolve_dependencies(&namespace).unwrap();
            let second = registry.resolve_dependencies(&namespace).unwrap();
            prop_assert_eq!(&first, &second);

            for (pos, dep) in first.iter().enumerate() {
                prop_assert!(!first[pos + 1..].contains(dep));
                for inner in &registry.get(dep).unwrap().dependencies {
                    let inner_pos = first.iter().position(|d| d == inner).unwrap();
                    prop_assert!(inner_pos < pos);
                }
            }
        }
    }
}
