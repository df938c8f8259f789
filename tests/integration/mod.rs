//! Integration tests: HTTP client against a mock server, workflow against a mock backend

mod api_client;
mod session_flow;
