mod model;
mod select;

pub use model::{SetModelCommand, UpdateModelCommand};
pub use select::{ElementSelection, SelectAllCommand, SelectCommand};

use crate::errors::RegistryError;
use crate::registry::ActionHandlerRegistry;

/// Register the built-in model and selection commands
pub fn register_default_commands(registry: &mut ActionHandlerRegistry) -> Result<(), RegistryError> {
    registry.register_command::<SetModelCommand>()?;
    registry.register_command::<UpdateModelCommand>()?;
    registry.register_command::<SelectCommand>()?;
    registry.register_command::<SelectAllCommand>()?;
    Ok(())
}
