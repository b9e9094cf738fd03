//! Route table: URL paths to the screens of the test-management console.
//!
//! DESIGN
//! ======
//! The table is static and ordered. Resolution walks it top to bottom and
//! the first pattern whose segments all match wins, so `/reports` and
//! `/reports/:id` never shadow each other. Matching yields a typed [`View`]
//! whose parameters are already parsed; [`View::href`] is the inverse.

// =============================================================================
// TABLE
// =============================================================================

/// One entry in the route table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    /// Pattern with `:param` placeholders, e.g. `/results/:taskId`.
    pub path: &'static str,
    /// Stable route name.
    pub name: &'static str,
    /// Screen rendered for this route.
    pub component: &'static str,
}

static ROUTES: [Route; 8] = [
    Route { path: "/", name: "home", component: "HomeView" },
    Route { path: "/scripts", name: "test-scripts", component: "TestScriptManagement" },
    Route { path: "/plans", name: "test-plans", component: "TestPlanManagement" },
    Route { path: "/tasks", name: "test-tasks", component: "TestExecutionTaskManagement" },
    Route { path: "/results/:taskId", name: "test-results", component: "TestResultView" },
    Route { path: "/reports", name: "test-reports", component: "TestReportManagement" },
    Route { path: "/reports/:id", name: "test-report-detail", component: "TestReportDetail" },
    Route { path: "/execution-nodes", name: "execution-nodes", component: "ExecutionNodeManagement" },
];

/// The full route table in resolution order.
#[must_use]
pub fn routes() -> &'static [Route] {
    &ROUTES
}

/// Look up a route by its name.
#[must_use]
pub fn find_by_name(name: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|route| route.name == name)
}

// =============================================================================
// VIEW
// =============================================================================

/// A resolved screen with its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Home,
    TestScripts,
    TestPlans,
    TestTasks,
    TestResults { task_id: i64 },
    TestReports,
    TestReportDetail { id: i64 },
    ExecutionNodes,
}

impl View {
    /// Route name this view is registered under.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::TestScripts => "test-scripts",
            Self::TestPlans => "test-plans",
            Self::TestTasks => "test-tasks",
            Self::TestResults { .. } => "test-results",
            Self::TestReports => "test-reports",
            Self::TestReportDetail { .. } => "test-report-detail",
            Self::ExecutionNodes => "execution-nodes",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::TestScripts => "Test Scripts",
            Self::TestPlans => "Test Plans",
            Self::TestTasks => "Execution Tasks",
            Self::TestResults { .. } => "Test Results",
            Self::TestReports => "Test Reports",
            Self::TestReportDetail { .. } => "Test Report",
            Self::ExecutionNodes => "Execution Nodes",
        }
    }

    /// Table entry for this view.
    #[must_use]
    pub fn route(self) -> &'static Route {
        // Every variant's name is present in ROUTES.
        find_by_name(self.name()).unwrap_or(&ROUTES[0])
    }

    /// Concrete path that resolves back to this view.
    #[must_use]
    pub fn href(self) -> String {
        match self {
            Self::TestResults { task_id } => format!("/results/{task_id}"),
            Self::TestReportDetail { id } => format!("/reports/{id}"),
            other => other.route().path.to_owned(),
        }
    }

    fn from_route(route: &Route, params: &[(&'static str, String)]) -> Option<Self> {
        let id_param = |key: &str| {
            params
                .iter()
                .find(|(name, _)| *name == key)
                .filter(|(_, value)| !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|(_, value)| value.parse::<i64>().ok())
        };
        let view = match route.name {
            "home" => Self::Home,
            "test-scripts" => Self::TestScripts,
            "test-plans" => Self::TestPlans,
            "test-tasks" => Self::TestTasks,
            "test-results" => Self::TestResults { task_id: id_param("taskId")? },
            "test-reports" => Self::TestReports,
            "test-report-detail" => Self::TestReportDetail { id: id_param("id")? },
            "execution-nodes" => Self::ExecutionNodes,
            _ => return None,
        };
        Some(view)
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Outcome of resolving a concrete path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: &'static Route,
    /// Captured `:param` values keyed by placeholder name, in pattern order.
    pub params: Vec<(&'static str, String)>,
    pub view: View,
}

impl RouteMatch {
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Resolve a concrete path such as `/results/42` against the table.
///
/// Query strings, fragments and a single trailing slash are ignored. Empty
/// segments elsewhere never match. Id parameters must be plain digits.
#[must_use]
pub fn resolve(path: &str) -> Option<RouteMatch> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments = split_segments(path);

    ROUTES.iter().find_map(|route| {
        let params = match_pattern(route.path, &segments)?;
        let view = View::from_route(route, &params)?;
        Some(RouteMatch { route, params, view })
    })
}

/// Segments after the leading slash. One trailing slash is dropped; any
/// other empty segment is kept so it fails to match.
fn split_segments(path: &str) -> Vec<&str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    };
    if path.is_empty() { Vec::new() } else { path.split('/').collect() }
}

fn match_pattern(pattern: &'static str, segments: &[&str]) -> Option<Vec<(&'static str, String)>> {
    let expected = split_segments(pattern);
    if expected.len() != segments.len() {
        return None;
    }

    let mut params = Vec::new();
    for (want, got) in expected.into_iter().zip(segments) {
        if let Some(name) = want.strip_prefix(':') {
            params.push((name, (*got).to_owned()));
        } else if want != *got {
            return None;
        }
    }
    Some(params)
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
