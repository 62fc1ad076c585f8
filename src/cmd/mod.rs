/*!
Command machinery.

  spec.rs     - parameter / command descriptors + describe() help mining
  binder.rs   - CommandSpec -> clap parser; access to parsed values
  registry.rs - closed name -> CommandEntry mapping
  ops.rs      - the chirp commands (programmatic functions + entries)
  render.rs   - Reply values and the indented output renderer
*/

pub mod binder;
pub mod ops;
pub mod registry;
pub mod render;
pub mod spec;
