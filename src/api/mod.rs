use rocket::Route;

mod admin;
mod common;
mod dashboard;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(voting::routes());
    routes.extend(dashboard::routes());
    routes
}
