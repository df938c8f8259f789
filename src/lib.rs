pub mod api;
pub mod capture;
pub mod flow;
pub mod model3d;
pub mod models;
pub mod ui;
pub mod xray;
