mod connection;
mod documents;
mod session_flow;
mod settings_persistence;
