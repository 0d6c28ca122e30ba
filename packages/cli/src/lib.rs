// ABOUTME: Library side of the appsettings command line tool
// ABOUTME: Example settings type and the command implementations used by the binary

pub mod commands;
pub mod my_settings;

pub use my_settings::{Color, MyAppSettings};

#[cfg(test)]
mod tests;
