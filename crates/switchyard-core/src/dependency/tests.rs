use super::*;
use crate::resource::{ResourceRecord, ResourceType};
use serde_json::json;

fn task(id: &str, deps: &[&str]) -> Task {
    Task::new(id).with_dependencies(deps.iter().copied())
}

fn chain() -> Vec<Task> {
    vec![
        task("A", &["B"]),
        task("B", &["C"]),
        task("C", &["D"]),
        task("D", &[]),
    ]
}

fn diamond() -> Vec<Task> {
    vec![
        task("G", &["E", "F"]),
        task("E", &["A", "B"]),
        task("F", &["C", "D"]),
        task("A", &[]),
        task("B", &[]),
        task("C", &[]),
        task("D", &[]),
    ]
}

fn sorted(level: &[String]) -> Vec<String> {
    let mut level = level.to_vec();
    level.sort();
    level
}

#[test]
fn test_build_graph_includes_every_task() {
    let tasks = vec![task("a", &[]), task("b", &["a", "a"])];
    let graph = DependencyAnalyzer::new().build_graph(&tasks);

    assert_eq!(graph.len(), 2);
    assert!(graph.dependencies("a").is_empty());
    assert_eq!(graph.dependencies("b"), ["a".to_string()]);
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_build_graph_consults_registry_for_undeclared() {
    let mut registry = ResourceRegistry::new();
    registry
        .register(ResourceRecord::new(ResourceType::Skill, "deploy").with_dependency("skill:build"))
        .unwrap();

    let tasks = vec![
        Task::new("skill:deploy"),
        Task::new("skill:build"),
        // explicit declaration wins over the registry
        task("skill:other", &[]),
    ];

    let graph = DependencyAnalyzer::with_registry(&registry).build_graph(&tasks);
    assert_eq!(graph.dependencies("skill:deploy"), ["skill:build".to_string()]);
    assert!(graph.dependencies("skill:other").is_empty());

    let without = DependencyAnalyzer::new().build_graph(&tasks);
    assert!(without.dependencies("skill:deploy").is_empty());
}

#[test]
fn test_chain_depths_and_order() {
    let analyzer = DependencyAnalyzer::new();
    let tasks = chain();
    let graph = analyzer.build_graph(&tasks);

    assert_eq!(dependency_depth(&graph, "D").unwrap(), 0);
    assert_eq!(dependency_depth(&graph, "C").unwrap(), 1);
    assert_eq!(dependency_depth(&graph, "B").unwrap(), 2);
    assert_eq!(dependency_depth(&graph, "A").unwrap(), 3);

    assert_eq!(analyzer.execution_order(&tasks).unwrap(), ["D", "C", "B", "A"]);
}

#[test]
fn test_diamond_levels() {
    let tasks = diamond();
    let graph = DependencyAnalyzer::new().build_graph(&tasks);
    let levels = topological_sort(&graph);

    assert_eq!(levels.len(), 3);
    assert_eq!(sorted(&levels[0]), ["A", "B", "C", "D"]);
    assert_eq!(sorted(&levels[1]), ["E", "F"]);
    assert_eq!(levels[2], ["G"]);
    assert_eq!(dependency_depth(&graph, "G").unwrap(), 2);
}

#[test]
fn test_group_parallel_tasks_returns_task_objects() {
    let tasks = vec![
        task("fetch", &[]).with_payload(json!({"url": "x"})),
        task("parse", &["fetch"]),
    ];
    let levels = DependencyAnalyzer::new().group_parallel_tasks(&tasks).unwrap();

    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0][0].id, "fetch");
    assert_eq!(levels[0][0].payload, json!({"url": "x"}));
    assert_eq!(levels[1][0].id, "parse");
}

#[test]
fn test_group_parallel_tasks_rejects_cycle() {
    let tasks = vec![task("a", &["b"]), task("b", &["a"]), task("c", &[])];
    let err = DependencyAnalyzer::new().group_parallel_tasks(&tasks).unwrap_err();

    match err {
        Error::CyclicDependency { cycle } => {
            assert!(cycle.contains(&"a".to_string()));
            assert!(cycle.contains(&"b".to_string()));
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
}

#[test]
fn test_group_parallel_tasks_rejects_duplicate_ids() {
    let tasks = vec![task("a", &[]), task("a", &[])];
    let result = DependencyAnalyzer::new().group_parallel_tasks(&tasks);
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[test]
fn test_self_dependency_is_one_node_cycle() {
    let graph = DependencyGraph::from_edges([("a", vec!["a"])]);
    let cycles = detect_cycles(&graph);

    assert_eq!(cycles, vec![vec!["a".to_string()]]);
    assert!(topological_sort(&graph).is_empty());
    assert!(dependency_depth(&graph, "a").unwrap_err().is_cycle());
}

#[test]
fn test_detect_cycles_reports_each_cycle_once() {
    let graph = DependencyGraph::from_edges([
        ("a", vec!["b"]),
        ("b", vec!["c"]),
        ("c", vec!["a"]),
        ("d", vec!["c"]),
        ("e", vec!["f"]),
        ("f", vec!["e"]),
    ]);
    let cycles = detect_cycles(&graph);

    assert_eq!(cycles.len(), 2);
    assert_eq!(cycles[0], ["a", "b", "c"]);
    assert_eq!(cycles[1], ["e", "f"]);
}

#[test]
fn test_acyclic_graph_has_no_cycles() {
    let graph = DependencyAnalyzer::new().build_graph(&diamond());
    assert!(detect_cycles(&graph).is_empty());
}

#[test]
fn test_topological_sort_stops_at_cycle() {
    let graph = DependencyGraph::from_edges([
        ("root", vec![]),
        ("a", vec!["root", "b"]),
        ("b", vec!["a"]),
    ]);
    let levels = topological_sort(&graph);

    assert_eq!(levels, vec![vec!["root".to_string()]]);
}

#[test]
fn test_dangling_edges_are_ignored_for_ordering() {
    let tasks = vec![task("a", &["ghost"]), task("b", &["a"])];
    let analyzer = DependencyAnalyzer::new();

    assert_eq!(analyzer.execution_order(&tasks).unwrap(), ["a", "b"]);
    assert_eq!(analyzer.independent_tasks(&tasks), ["a"]);
    assert_eq!(
        analyzer.validate_dependencies(&tasks),
        ["a depends on missing 'ghost'"]
    );
}

#[test]
fn test_dependency_depth_unknown_task() {
    let graph = DependencyGraph::from_edges([("a", Vec::<&str>::new())]);
    assert!(matches!(
        dependency_depth(&graph, "zzz"),
        Err(Error::UnknownTask(_))
    ));
}

#[test]
fn test_depth_on_wide_shared_graph() {
    // Each layer depends on every node of the layer below; memoization keeps
    // this linear in edges.
    let width = 6;
    let layers = 40;
    let mut tasks = Vec::new();
    for layer in 0..layers {
        for i in 0..width {
            let id = format!("n{layer}_{i}");
            let deps: Vec<String> = if layer == 0 {
                Vec::new()
            } else {
                (0..width).map(|j| format!("n{}_{j}", layer - 1)).collect()
            };
            tasks.push(Task::new(id).with_dependencies(deps));
        }
    }

    let graph = DependencyAnalyzer::new().build_graph(&tasks);
    let top = format!("n{}_0", layers - 1);
    assert_eq!(dependency_depth(&graph, &top).unwrap(), layers - 1);
}

fn long_chain(len: usize) -> Vec<Task> {
    (0..len)
        .map(|i| {
            let deps: Vec<String> = if i + 1 < len {
                vec![format!("n{}", i + 1)]
            } else {
                Vec::new()
            };
            Task::new(format!("n{i}")).with_dependencies(deps)
        })
        .collect()
}

#[test]
fn test_deep_chain_does_not_exhaust_the_stack() {
    let len = 200_000;
    let tasks = long_chain(len);
    let analyzer = DependencyAnalyzer::new();
    let graph = analyzer.build_graph(&tasks);

    assert!(detect_cycles(&graph).is_empty());
    assert_eq!(dependency_depth(&graph, "n0").unwrap(), len - 1);
    assert_eq!(analyzer.analyze(&tasks).max_depth, Some(len - 1));
}

#[test]
fn test_deep_cycle_is_reported_whole() {
    let len = 100_000;
    let mut tasks = long_chain(len);
    tasks[len - 1] = task(&format!("n{}", len - 1), &["n0"]);
    let graph = DependencyAnalyzer::new().build_graph(&tasks);

    let cycles = detect_cycles(&graph);
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].len(), len);
    assert_eq!(cycles[0][0], "n0");

    match dependency_depth(&graph, "n0") {
        Err(Error::CyclicDependency { cycle }) => assert_eq!(cycle.len(), len + 1),
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn test_independent_tasks() {
    let tasks = diamond();
    assert_eq!(
        DependencyAnalyzer::new().independent_tasks(&tasks),
        ["A", "B", "C", "D"]
    );
}

#[test]
fn test_independent_tasks_on_cyclic_graph() {
    let tasks = vec![task("a", &["b"]), task("b", &["a"]), task("c", &[])];
    assert_eq!(DependencyAnalyzer::new().independent_tasks(&tasks), ["c"]);
}

#[test]
fn test_empty_input() {
    let analyzer = DependencyAnalyzer::new();
    let tasks: Vec<Task> = Vec::new();

    assert!(analyzer.build_graph(&tasks).is_empty());
    assert!(analyzer.group_parallel_tasks(&tasks).unwrap().is_empty());
    assert!(analyzer.execution_order(&tasks).unwrap().is_empty());
    assert!(analyzer.independent_tasks(&tasks).is_empty());
    assert!(analyzer.validate_dependencies(&tasks).is_empty());
    assert!(topological_sort(&DependencyGraph::new()).is_empty());
}

#[test]
fn test_analyze_stats() {
    let stats = DependencyAnalyzer::new().analyze(&diamond());
    assert_eq!(
        stats,
        DependencyStats {
            total_tasks: 7,
            total_edges: 6,
            max_depth: Some(2),
            independent_count: 4,
            has_cycles: false,
        }
    );
}

#[test]
fn test_analyze_cyclic_stats() {
    let tasks = vec![task("a", &["b"]), task("b", &["a"])];
    let stats = DependencyAnalyzer::new().analyze(&tasks);

    assert!(stats.has_cycles);
    assert_eq!(stats.max_depth, None);
    assert_eq!(stats.independent_count, 0);
}

#[test]
fn test_task_deserializes_from_yaml() {
    let yaml = r#"
- id: build
- id: test
  dependencies: [build]
  payload: { retries: 2 }
"#;
    let tasks: Vec<Task> = serde_yaml::from_str(yaml).unwrap();
    assert!(tasks[0].dependencies.is_none());
    assert_eq!(tasks[1].dependencies.as_deref(), Some(&["build".to_string()][..]));
    assert_eq!(tasks[1].payload, json!({"retries": 2}));
}
