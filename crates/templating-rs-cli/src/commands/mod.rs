//! Built-in commands.
//!
//! Each command implements the
//! [`ManagementCommand`](crate::command::ManagementCommand) trait.

pub mod check;
pub mod evaluate;
pub mod render;

pub use check::CheckCommand;
pub use evaluate::EvaluateCommand;
pub use render::RenderCommand;

use std::path::{Path, PathBuf};

use templating_rs_core::TemplatingResult;

use crate::command::CommandRegistry;

/// Registers all built-in commands into the given registry.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(EvaluateCommand));
    registry.register(Box::new(RenderCommand));
    registry.register(Box::new(CheckCommand));
}

/// Resolves a command-line path against the current directory.
pub(crate) fn resolve_path(path: &Path) -> TemplatingResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_builtin_commands() {
        let mut registry = CommandRegistry::new();
        register_builtin_commands(&mut registry);
        assert_eq!(registry.list_commands(), vec!["check", "evaluate", "render"]);
    }

    #[test]
    fn test_resolve_absolute_unchanged() {
        let path = std::env::temp_dir().join("a.py");
        assert_eq!(resolve_path(&path).unwrap(), path);
    }

    #[test]
    fn test_resolve_relative_joins_cwd() {
        let resolved = resolve_path(Path::new("pkg/a.py")).unwrap();
        assert_eq!(resolved, std::env::current_dir().unwrap().join("pkg/a.py"));
    }
}
