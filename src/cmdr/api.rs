//! The invoker facade.
//!
//! [`CmdrApp`] owns one [`CommandRegistry`] and drives a full invocation:
//! parse the raw argv against the registry, then dispatch to the resolved
//! command's entry point. Registration happens up front through
//! [`CmdrApp::registry_mut`]; parsing assumes the registration phase is
//! complete. The registry is an explicit value rather than process-global
//! state, so tests can run fully isolated apps.

use crate::error::Result;
use crate::parser::ArgumentsParser;
use crate::registry::CommandRegistry;

#[derive(Debug, Default)]
pub struct CmdrApp {
    registry: CommandRegistry,
}

impl CmdrApp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Mutable registry access for the registration phase.
    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    /// Parse `argv` and invoke the resolved command's entry point.
    pub fn run_command(&self, argv: &[String]) -> Result<()> {
        let args = ArgumentsParser::new(&self.registry, argv).parse()?;
        args.command().run(&args)
    }

    /// Clear all registered commands; with `clear_external_cache` the
    /// registry also fires its installed cache-invalidation hook.
    pub fn reset(&mut self, clear_external_cache: bool) {
        self.registry.reset(clear_external_cache);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::Arguments;
    use crate::error::CmdrError;
    use crate::registry::{HandlerId, HandlerName, MethodName};
    use crate::value::Value;

    const H: HandlerId = HandlerId("AppFixture");

    fn ok(_: &Arguments<'_>) -> Result<()> {
        Ok(())
    }

    fn failing(args: &Arguments<'_>) -> Result<()> {
        Err(CmdrError::App(format!(
            "refusing {}",
            args.command().command().describe()
        )))
    }

    fn check_sum(args: &Arguments<'_>) -> Result<()> {
        assert_eq!(args.positional(0), Some(&Value::Num(2.0)));
        Ok(())
    }

    #[test]
    fn run_command_dispatches_to_the_resolved_entry() {
        use crate::option::CommandOption;
        use crate::types::TypeMask;

        let mut app = CmdrApp::new();
        app.registry_mut()
            .register_method(MethodName::Default, None, vec![], H, ok)
            .unwrap();
        app.registry_mut()
            .register_method(
                MethodName::Named("sum".to_string()),
                None,
                vec![CommandOption::positional(TypeMask::NUMBER).with_name("lhs")],
                H,
                check_sum,
            )
            .unwrap();
        app.registry_mut()
            .register_method(MethodName::Named("bad".to_string()), None, vec![], H, failing)
            .unwrap();
        app.registry_mut()
            .register_handler(HandlerName::Default, None, H)
            .unwrap();

        assert!(app.registry().resolve_command("sum").is_some());
        assert!(app.run_command(&[]).is_ok());
        assert!(app
            .run_command(&["sum".to_string(), "2".to_string()])
            .is_ok());

        let err = app.run_command(&["bad".to_string()]).unwrap_err();
        assert!(matches!(err, CmdrError::App(_)));

        let err = app.run_command(&["missing".to_string()]).unwrap_err();
        assert!(matches!(err, CmdrError::UnknownCommand(_)));
    }

    #[test]
    fn reset_forgets_registered_commands() {
        let mut app = CmdrApp::new();
        app.registry_mut()
            .register_method(MethodName::Default, None, vec![], H, ok)
            .unwrap();
        app.registry_mut()
            .register_handler(HandlerName::Default, None, H)
            .unwrap();
        assert!(app.run_command(&[]).is_ok());

        app.reset(false);
        let err = app.run_command(&[]).unwrap_err();
        assert!(matches!(err, CmdrError::NoDefaultCommand));
    }
}
