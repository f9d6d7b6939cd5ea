mod common;
mod interpreter;
mod properties;
