mod admin;
mod ballot;
mod common;
mod results;
