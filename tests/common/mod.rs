//! Shared fixture domain for integration tests.
#![allow(dead_code)]

use component_sdk::{
    AppError, AppState, Body, Component, Dependency, Envelope, Gateway, HandlerGroup, Id, Inject, Registry, Route,
};

component_sdk::record! {
    pub struct Employee in "employees" {
        #[id] id: Long,
        name: String,
        email: String,
    }
}

component_sdk::record! {
    pub struct Article in "articles" {
        #[id] id: Long,
        title: String,
        pages: Integer,
        published: Boolean,
        rating: Float,
    }
}

#[derive(Default)]
pub struct Formatter;

impl Component for Formatter {}

impl Formatter {
    pub fn tidy(&self, s: &str) -> String {
        s.trim().to_string()
    }
}

#[derive(Default)]
pub struct Directory {
    pub formatter: Inject<Formatter>,
    pub employees: Inject<Gateway<Employee>>,
}

impl Component for Directory {
    fn dependencies(&self) -> Vec<Dependency<'_>> {
        vec![
            Dependency::on("formatter", &self.formatter),
            Dependency::on("employees", &self.employees),
        ]
    }
}

impl Directory {
    pub fn hire(&self, mut employee: Employee) -> Result<i64, AppError> {
        employee.name = self.formatter.tidy(&employee.name);
        self.employees.add(&employee)
    }
}

#[derive(Default)]
pub struct EmployeeController {
    pub directory: Inject<Directory>,
    pub employees: Inject<Gateway<Employee>>,
}

impl Component for EmployeeController {
    fn dependencies(&self) -> Vec<Dependency<'_>> {
        vec![
            Dependency::on("directory", &self.directory),
            Dependency::on("employees", &self.employees),
        ]
    }
}

impl HandlerGroup for EmployeeController {
    const BASE_PATH: &'static str = "/employees";

    fn routes() -> Vec<Route<Self>> {
        vec![
            Route::post("/add", Self::add),
            Route::get("/all", Self::all),
            Route::get("/one", Self::one),
            Route::put("/change", Self::change),
            Route::delete("/remove", Self::remove),
        ]
    }
}

impl EmployeeController {
    fn add(&self, Body(employee): Body<Employee>) -> Result<(), AppError> {
        self.directory.hire(employee).map(|_| ())
    }

    fn all(&self) -> Result<Envelope, AppError> {
        Ok(Envelope::json(&self.employees.get_all()?))
    }

    fn one(&self, Id(id): Id) -> Result<Envelope, AppError> {
        self.employees
            .get(id)?
            .map(|e| Envelope::json(&e))
            .ok_or_else(|| AppError::NotFound(format!("employee {}", id)))
    }

    fn change(&self, Id(id): Id, Body(employee): Body<Employee>) -> Result<(), AppError> {
        self.employees.update(id, &employee)
    }

    fn remove(&self, Id(id): Id) -> Result<(), AppError> {
        self.employees.delete(id)
    }
}

#[derive(Default)]
pub struct ArticleController {
    pub articles: Inject<Gateway<Article>>,
}

impl Component for ArticleController {
    fn dependencies(&self) -> Vec<Dependency<'_>> {
        vec![Dependency::on("articles", &self.articles)]
    }
}

impl HandlerGroup for ArticleController {
    const BASE_PATH: &'static str = "/articles";

    fn routes() -> Vec<Route<Self>> {
        vec![
            Route::get("", Self::all),
            Route::post("", Self::add),
            // illegal for GET, rejected when requested
            Route::get("/by-body", Self::by_body),
            Route::get("/explode", Self::explode),
        ]
    }
}

impl ArticleController {
    fn all(&self) -> Result<Envelope, AppError> {
        Ok(Envelope::json(&self.articles.get_all()?))
    }

    fn add(&self, Body(article): Body<Article>) -> Result<(), AppError> {
        self.articles.add(&article).map(|_| ())
    }

    fn by_body(&self, Body(article): Body<Article>) -> Envelope {
        Envelope::json(&article)
    }

    fn explode(&self) -> Envelope {
        panic!("article index corrupted")
    }
}

pub fn registry() -> Registry {
    Registry::new()
        .record::<Employee>()
        .record::<Article>()
        .gateway::<Employee>()
        .gateway::<Article>()
        .helper::<Formatter>()
        .service::<Directory>()
        .handler_group::<EmployeeController>()
        .handler_group::<ArticleController>()
}

/// Root namespace covering every fixture type of the calling test binary.
pub fn root() -> &'static str {
    module_path!()
}

pub fn app() -> AppState {
    match AppState::bootstrap(registry(), root()) {
        Ok(state) => state,
        Err(e) => panic!("fixture failed to bootstrap: {}", e),
    }
}
