/// Interfaces Layer - External Entry Points
///
/// ## Modules
/// - `cli`: command-line interface (main.rs logic)
/// - `tools`: seeded order-flow simulation

pub mod cli;
pub mod tools;
