use super::*;

#[test]
fn table_has_every_console_screen_in_order() {
    let names: Vec<&str> = routes().iter().map(|route| route.name).collect();
    assert_eq!(
        names,
        vec![
            "home",
            "test-scripts",
            "test-plans",
            "test-tasks",
            "test-results",
            "test-reports",
            "test-report-detail",
            "execution-nodes",
        ]
    );
}

#[test]
fn plans_path_resolves_to_plan_management() {
    let matched = resolve("/plans").expect("route");
    assert_eq!(matched.view, View::TestPlans);
    assert_eq!(matched.route.component, "TestPlanManagement");
    assert!(matched.params.is_empty());
}

#[test]
fn root_path_resolves_to_home() {
    assert_eq!(resolve("/").expect("route").view, View::Home);
}

#[test]
fn results_path_captures_task_id() {
    let matched = resolve("/results/42").expect("route");
    assert_eq!(matched.view, View::TestResults { task_id: 42 });
    assert_eq!(matched.param("taskId"), Some("42"));
    assert_eq!(matched.route.component, "TestResultView");
}

#[test]
fn reports_list_and_detail_do_not_shadow_each_other() {
    assert_eq!(resolve("/reports").expect("list").view, View::TestReports);
    let detail = resolve("/reports/7").expect("detail");
    assert_eq!(detail.view, View::TestReportDetail { id: 7 });
    assert_eq!(detail.route.name, "test-report-detail");
}

#[test]
fn trailing_slash_query_and_fragment_are_ignored() {
    assert_eq!(resolve("/execution-nodes/").expect("route").view, View::ExecutionNodes);
    assert_eq!(resolve("/scripts?page=2").expect("route").view, View::TestScripts);
    assert_eq!(resolve("/tasks#top").expect("route").view, View::TestTasks);
}

#[test]
fn unknown_or_partial_paths_do_not_match() {
    assert!(resolve("/results").is_none());
    assert!(resolve("/reports/7/export").is_none());
    assert!(resolve("/nodes").is_none());
    assert!(resolve("/Plans").is_none());
}

#[test]
fn non_numeric_ids_do_not_match() {
    assert!(resolve("/results/latest").is_none());
    assert!(resolve("/reports/abc").is_none());
}

#[test]
fn empty_segments_do_not_collapse() {
    assert!(resolve("/results//42").is_none());
    assert!(resolve("//reports").is_none());
    assert!(resolve("/reports/7//").is_none());
    assert!(resolve("//").is_none());
    assert_eq!(resolve("/reports/7/").expect("route").view, View::TestReportDetail { id: 7 });
}

#[test]
fn signed_ids_do_not_match() {
    assert!(resolve("/results/+42").is_none());
    assert!(resolve("/results/-42").is_none());
    assert!(resolve("/reports/ 7").is_none());
}

#[test]
fn href_round_trips_through_resolve() {
    let views = [
        View::Home,
        View::TestScripts,
        View::TestPlans,
        View::TestTasks,
        View::TestResults { task_id: 3 },
        View::TestReports,
        View::TestReportDetail { id: 11 },
        View::ExecutionNodes,
    ];
    for view in views {
        let matched = resolve(&view.href()).expect("href should resolve");
        assert_eq!(matched.view, view);
        assert_eq!(matched.route.name, view.name());
    }
}

#[test]
fn find_by_name_returns_pattern() {
    assert_eq!(find_by_name("test-results").map(|r| r.path), Some("/results/:taskId"));
    assert!(find_by_name("missing").is_none());
}

#[test]
fn view_route_points_back_to_table_entry() {
    assert_eq!(View::TestReportDetail { id: 1 }.route().path, "/reports/:id");
    assert_eq!(View::ExecutionNodes.title(), "Execution Nodes");
}
