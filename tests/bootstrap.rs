mod common;

use common::{Article, Directory, Employee, EmployeeController, Formatter};
use component_sdk::{
    AppState, Component, ConfigError, Dependency, Envelope, Gateway, HandlerGroup, Inject, Registry, Route,
    Tag, TypeEntry, Verb,
};

fn bootstrap_err(registry: Registry) -> ConfigError {
    match AppState::bootstrap(registry, "") {
        Ok(_) => panic!("bootstrap unexpectedly succeeded"),
        Err(e) => e,
    }
}

#[test]
fn fixture_wires_every_dependency() {
    let state = common::app();
    assert_eq!(state.router.routes().len(), 9);
    assert!(state.router.routes().get(Verb::Put, "/employees/change").is_some());
    assert!(state.router.routes().get(Verb::Get, "/articles").is_some());

    let directory = state.container.get::<Directory>().unwrap();
    assert!(directory.formatter.is_wired());
    assert!(directory.employees.is_wired());
    let controller = state.container.get::<EmployeeController>().unwrap();
    assert!(controller.directory.is_wired());
    assert!(state.container.get::<Gateway<Article>>().is_some());
}

#[derive(Default)]
struct Auditor {
    controller: Inject<EmployeeController>,
}

impl Component for Auditor {
    fn dependencies(&self) -> Vec<Dependency<'_>> {
        vec![Dependency::on("controller", &self.controller)]
    }
}

#[test]
fn service_depending_on_handler_group_names_the_field() {
    let err = bootstrap_err(common::registry().service::<Auditor>());
    match err {
        ConfigError::IllegalDependency { component, field, target, .. } => {
            assert!(component.ends_with("Auditor"));
            assert_eq!(field, "controller");
            assert!(target.ends_with("EmployeeController"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[derive(Default)]
struct Narcissist {
    me: Inject<Narcissist>,
}

impl Component for Narcissist {
    fn dependencies(&self) -> Vec<Dependency<'_>> {
        vec![Dependency::on("me", &self.me)]
    }
}

#[test]
fn service_cannot_depend_on_itself() {
    let err = bootstrap_err(Registry::new().service::<Narcissist>());
    assert!(matches!(err, ConfigError::IllegalDependency { ref field, .. } if field == "me"));
}

#[derive(Default)]
struct Chatty {
    formatter: Inject<Formatter>,
}

impl Component for Chatty {
    fn dependencies(&self) -> Vec<Dependency<'_>> {
        vec![Dependency::on("formatter", &self.formatter)]
    }
}

#[test]
fn helpers_are_leaves() {
    let err = bootstrap_err(Registry::new().helper::<Formatter>().helper::<Chatty>());
    assert!(matches!(err, ConfigError::IllegalDependency { ref component, .. } if component.ends_with("Chatty")));
}

#[test]
fn missing_helper_is_unresolved() {
    let registry = Registry::new()
        .record::<Employee>()
        .gateway::<Employee>()
        .service::<Directory>();
    let err = bootstrap_err(registry);
    assert!(matches!(err, ConfigError::UnresolvedDependency { ref field, .. } if field == "formatter"));
}

#[derive(Default)]
struct Shadow;

impl Component for Shadow {}

impl HandlerGroup for Shadow {
    const BASE_PATH: &'static str = "/employees";

    fn routes() -> Vec<Route<Self>> {
        vec![Route::get("/all", |_: &Shadow| Envelope::ok())]
    }
}

#[test]
fn duplicate_route_is_fatal() {
    let err = bootstrap_err(common::registry().handler_group::<Shadow>());
    assert_eq!(
        err,
        ConfigError::DuplicateRoute {
            verb: "GET".into(),
            path: "/employees/all".into()
        }
    );
}

#[derive(Default)]
struct Silent;

impl Component for Silent {}

impl HandlerGroup for Silent {
    const BASE_PATH: &'static str = "/silent";

    fn routes() -> Vec<Route<Self>> {
        vec![Route::get("/nothing", |_: &Silent| {})]
    }
}

#[test]
fn get_handler_must_return_an_envelope() {
    let err = bootstrap_err(Registry::new().handler_group::<Silent>());
    assert!(matches!(err, ConfigError::InvalidHandlerReturn { ref verb, .. } if verb == "GET"));
}

#[derive(Default)]
struct Meddler {
    formatter: Inject<Formatter>,
}

impl Component for Meddler {
    fn dependencies(&self) -> Vec<Dependency<'_>> {
        vec![Dependency::on("formatter", &self.formatter)]
    }
}

impl HandlerGroup for Meddler {
    const BASE_PATH: &'static str = "/meddler";

    fn routes() -> Vec<Route<Self>> {
        Vec::new()
    }
}

#[test]
fn handler_group_cannot_take_a_helper() {
    let err = bootstrap_err(Registry::new().helper::<Formatter>().handler_group::<Meddler>());
    assert!(matches!(err, ConfigError::IllegalDependency { ref field, .. } if field == "formatter"));
}

#[derive(Default)]
struct Boss {
    controller: Inject<EmployeeController>,
}

impl Component for Boss {
    fn dependencies(&self) -> Vec<Dependency<'_>> {
        vec![Dependency::on("controller", &self.controller)]
    }
}

impl HandlerGroup for Boss {
    const BASE_PATH: &'static str = "/boss";

    fn routes() -> Vec<Route<Self>> {
        Vec::new()
    }
}

#[test]
fn handler_group_cannot_take_another_handler_group() {
    let err = bootstrap_err(common::registry().handler_group::<Boss>());
    assert!(matches!(err, ConfigError::IllegalDependency { ref component, .. } if component.ends_with("Boss")));
}

#[test]
fn gateway_without_table_is_fatal() {
    let err = bootstrap_err(Registry::new().gateway::<Employee>());
    assert!(matches!(err, ConfigError::UnknownRecord { .. }));
}

#[test]
fn second_gateway_for_a_record_is_fatal() {
    let registry = Registry::new()
        .record::<Employee>()
        .gateway::<Employee>()
        .gateway_named::<Employee>("staff");
    assert!(matches!(bootstrap_err(registry), ConfigError::DuplicateGateway { .. }));
}

#[test]
fn tag_without_matching_declaration_is_unresolvable() {
    let registry = Registry::new().entry(TypeEntry::untagged("legacy::Reports").with_tag(Tag::HandlerGroup));
    assert!(matches!(
        bootstrap_err(registry),
        ConfigError::Unresolvable { role: "handler-group", .. }
    ));
}

#[test]
fn root_namespace_excludes_foreign_types() {
    // Auditor lives outside `bootstrap::common` and would otherwise abort startup.
    let state = AppState::bootstrap(common::registry().service::<Auditor>(), common::root()).unwrap();
    assert!(state.container.get::<Auditor>().is_none());
}

#[derive(Default)]
struct Inspector {
    shadow: Inject<Shadow>,
}

impl Component for Inspector {
    fn dependencies(&self) -> Vec<Dependency<'_>> {
        vec![Dependency::on_handler_group("shadow", &self.shadow)]
    }
}

#[test]
fn unregistered_handler_group_dependency_is_still_illegal() {
    let err = bootstrap_err(Registry::new().service::<Inspector>());
    match err {
        ConfigError::IllegalDependency { field, target, reason, .. } => {
            assert_eq!(field, "shadow");
            assert!(target.ends_with("Shadow"));
            assert_eq!(reason, "services cannot depend on handler-groups");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[derive(Default)]
struct Mirror {
    shadow: Inject<Shadow>,
}

impl Component for Mirror {
    fn dependencies(&self) -> Vec<Dependency<'_>> {
        vec![Dependency::on_handler_group("shadow", &self.shadow)]
    }
}

impl HandlerGroup for Mirror {
    const BASE_PATH: &'static str = "/mirror";

    fn routes() -> Vec<Route<Self>> {
        vec![Route::get("", |_: &Mirror| Envelope::ok())]
    }
}

#[test]
fn handler_group_on_unregistered_handler_group_is_illegal() {
    let err = bootstrap_err(Registry::new().handler_group::<Mirror>());
    assert!(matches!(
        err,
        ConfigError::IllegalDependency { ref reason, .. } if *reason == "handler-groups cannot depend on handler-groups"
    ));
}
