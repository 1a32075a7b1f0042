//! Playground domain: employees and articles.

use component_sdk::{
    AppError, Body, Component, Dependency, Envelope, Gateway, HandlerGroup, Id, Inject, Registry, Route,
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
    }
}

pub fn registry() -> Registry {
    Registry::new()
        .record::<Employee>()
        .record::<Article>()
        .gateway::<Employee>()
        .gateway::<Article>()
        .helper::<AgeCheck>()
        .service::<EmployeeService>()
        .handler_group::<EmployeeController>()
        .handler_group::<ArticleController>()
}

#[derive(Default)]
pub struct AgeCheck;

impl Component for AgeCheck {}

impl AgeCheck {
    pub fn is_odd(&self, age: i32) -> bool {
        age % 2 != 0
    }
}

pub struct EmployeeService {
    greeter: String,
    age: i32,
    age_check: Inject<AgeCheck>,
}

impl Default for EmployeeService {
    fn default() -> Self {
        EmployeeService {
            greeter: "Janko".into(),
            age: 31,
            age_check: Inject::default(),
        }
    }
}

impl Component for EmployeeService {
    fn dependencies(&self) -> Vec<Dependency<'_>> {
        vec![Dependency::on("age_check", &self.age_check)]
    }
}

impl EmployeeService {
    pub fn welcome(&self, employee: &Employee) {
        tracing::info!(
            greeter = %self.greeter,
            age = self.age,
            odd_age = self.age_check.is_odd(self.age),
            employee = %employee.name,
            "welcomed new employee"
        );
    }
}

#[derive(Default)]
pub struct EmployeeController {
    employees: Inject<Gateway<Employee>>,
    service: Inject<EmployeeService>,
}

impl Component for EmployeeController {
    fn dependencies(&self) -> Vec<Dependency<'_>> {
        vec![
            Dependency::on("employees", &self.employees),
            Dependency::on("service", &self.service),
        ]
    }
}

impl HandlerGroup for EmployeeController {
    const BASE_PATH: &'static str = "/employees";

    fn routes() -> Vec<Route<Self>> {
        vec![
            Route::post("/add", Self::add_employee),
            Route::get("/getAllEmployees", Self::get_all_employees),
            Route::get("/getOneEmployee", Self::get_one_employee),
            Route::delete("/deleteEmployee", Self::delete_employee),
            Route::put("/changeEmployee", Self::change_employee),
        ]
    }
}

impl EmployeeController {
    fn add_employee(&self, Body(employee): Body<Employee>) -> Result<(), AppError> {
        self.employees.add(&employee)?;
        self.service.welcome(&employee);
        Ok(())
    }

    fn get_all_employees(&self) -> Result<Envelope, AppError> {
        Ok(Envelope::json(&self.employees.get_all()?))
    }

    fn get_one_employee(&self, Id(id): Id) -> Result<Envelope, AppError> {
        match self.employees.get(id)? {
            Some(employee) => Ok(Envelope::json(&employee)),
            None => Err(AppError::NotFound(format!("employee {}", id))),
        }
    }

    fn delete_employee(&self, Id(id): Id) -> Result<(), AppError> {
        self.employees.delete(id)
    }

    fn change_employee(&self, Id(id): Id, Body(employee): Body<Employee>) -> Result<(), AppError> {
        self.employees.update(id, &employee)
    }
}

#[derive(Default)]
pub struct ArticleController {
    articles: Inject<Gateway<Article>>,
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
            Route::get("/all", Self::get_all_articles),
            Route::post("", Self::add_article),
        ]
    }
}

impl ArticleController {
    fn get_all_articles(&self) -> Result<Envelope, AppError> {
        Ok(Envelope::json(&self.articles.get_all()?))
    }

    fn add_article(&self, Body(article): Body<Article>) -> Result<(), AppError> {
        self.articles.add(&article).map(|_| ())
    }
}
