//! Unit tests against the public API

mod capture;
mod report_render;
