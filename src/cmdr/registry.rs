//! Command registry: staged registration and the compiled routing table.
//!
//! Registration is a two-phase commit. Method declarations are staged with
//! [`CommandRegistry::register_method`] (no cross-checks yet, since the
//! owning handler may not exist at that point), then
//! [`CommandRegistry::register_handler`] claims everything in the pending
//! set, validates the batch, composes the final route keys, and inserts them
//! into the routing table in a single atomic pass. Nothing is ever silently
//! overwritten: any key collision is a registration error.
//!
//! Route composition:
//!
//! | handler     | method      | route            | alias                     |
//! |-------------|-------------|------------------|---------------------------|
//! | default     | default     | `""`             | none                      |
//! | default     | `"name"`    | `"name"`         | method alias              |
//! | `"handler"` | default     | `"handler"`      | handler alias             |
//! | `"handler"` | `"name"`    | `"handler-name"` | handler alias + method alias |
//! | `"handler"` | fallback    | error            |                           |

use std::collections::HashMap;
use std::fmt;

use crate::arguments::Arguments;
use crate::error::{CmdrError, Result};
use crate::option::CommandOption;
use crate::types::{is_command_name, TypeMask};

/// Handler entry point invoked with the parse result.
pub type CommandFn = fn(&Arguments<'_>) -> Result<()>;

/// Opaque identity tying staged methods to the handler that owns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub &'static str);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Name under which a method is declared within its handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodName {
    /// The handler's unnamed entry point.
    Default,
    /// Catch-all, only legal under the default handler.
    Fallback,
    Named(String),
}

impl MethodName {
    pub fn describe(&self) -> &str {
        match self {
            MethodName::Default => "[default]",
            MethodName::Fallback => "[fallback]",
            MethodName::Named(name) => name,
        }
    }
}

/// Name under which a handler groups its methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerName {
    Default,
    Named(String),
}

impl HandlerName {
    pub fn describe(&self) -> &str {
        match self {
            HandlerName::Default => "[default]",
            HandlerName::Named(name) => name,
        }
    }
}

/// One finalized command method: declaration plus its entry point.
#[derive(Debug, Clone)]
pub struct CommandMethod {
    command: MethodName,
    alias: Option<String>,
    options: Vec<CommandOption>,
    handler_id: HandlerId,
    run: CommandFn,
}

impl CommandMethod {
    pub fn command(&self) -> &MethodName {
        &self.command
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn options(&self) -> &[CommandOption] {
        &self.options
    }

    pub fn handler_id(&self) -> HandlerId {
        self.handler_id
    }

    /// Invoke the method's entry point.
    pub fn run(&self, args: &Arguments<'_>) -> Result<()> {
        (self.run)(args)
    }
}

/// Grouping unit owning one or more command methods.
#[derive(Debug)]
pub struct Handler {
    command: HandlerName,
    alias: Option<String>,
    id: HandlerId,
    methods: Vec<usize>,
}

impl Handler {
    pub fn command(&self) -> &HandlerName {
        &self.command
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

/// Process-wide store of registered commands and the compiled routing table.
///
/// One instance per process is the expected lifecycle, but the registry is an
/// explicit value (not a global), so tests can run isolated instances.
#[derive(Default)]
pub struct CommandRegistry {
    pending: Vec<CommandMethod>,
    handlers: Vec<Handler>,
    methods: Vec<CommandMethod>,
    routes: HashMap<String, usize>,
    fallback: Option<usize>,
    cache_hook: Option<Box<dyn FnMut()>>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("pending", &self.pending.len())
            .field("handlers", &self.handlers.len())
            .field("methods", &self.methods.len())
            .field("routes", &self.routes.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a command method. Cross-references to the owning handler are not
    /// checked here; that happens when the handler commits.
    pub fn register_method(
        &mut self,
        command: MethodName,
        alias: Option<&str>,
        options: Vec<CommandOption>,
        handler_id: HandlerId,
        run: CommandFn,
    ) -> Result<()> {
        if let MethodName::Named(name) = &command {
            if !is_command_name(name) {
                return Err(CmdrError::InvalidCommandName(name.clone()));
            }
        }
        let alias = validate_alias(alias, &command)?;

        for option in &options {
            option.validate()?;
        }
        // an args collector swallows everything after "--", so nothing may
        // be declared behind it
        for (i, option) in options.iter().enumerate() {
            if option.type_mask.contains(TypeMask::ARGS) && i + 1 != options.len() {
                return Err(CmdrError::InvalidOption(format!(
                    "args collector '{}' must be the last declared option",
                    option.describe()
                )));
            }
        }

        self.pending.push(CommandMethod {
            command,
            alias,
            options,
            handler_id,
            run,
        });
        Ok(())
    }

    /// Commit a handler: claim all pending methods, validate the batch, and
    /// insert the composed routes. Either everything is inserted or nothing.
    pub fn register_handler(
        &mut self,
        name: HandlerName,
        alias: Option<&str>,
        id: HandlerId,
    ) -> Result<()> {
        if self.has_handler(id) {
            return Err(CmdrError::DuplicateHandler(id.0.to_string()));
        }
        if let HandlerName::Named(n) = &name {
            if !is_command_name(n) {
                return Err(CmdrError::InvalidCommandName(n.clone()));
            }
        }
        let handler_alias = match (&name, alias) {
            (_, None) => None,
            (HandlerName::Default, Some(a)) => {
                return Err(CmdrError::InvalidAlias {
                    alias: a.to_string(),
                    reason: "the default handler cannot take an alias",
                });
            }
            (HandlerName::Named(n), Some(a)) => {
                if !is_command_name(a) {
                    return Err(CmdrError::InvalidAlias {
                        alias: a.to_string(),
                        reason: "not a valid command name",
                    });
                }
                if a == n {
                    return Err(CmdrError::InvalidAlias {
                        alias: a.to_string(),
                        reason: "same as the command name",
                    });
                }
                Some(a.to_string())
            }
        };

        if self.pending.is_empty() {
            return Err(CmdrError::EmptyHandler(id.0.to_string()));
        }
        for method in &self.pending {
            if method.handler_id != id {
                return Err(CmdrError::ForeignCommand {
                    command: method.command.describe().to_string(),
                    handler: id.0.to_string(),
                });
            }
        }
        for (i, a) in self.pending.iter().enumerate() {
            for b in &self.pending[i + 1..] {
                if a.command == b.command {
                    return Err(CmdrError::DuplicateCommand {
                        command: a.command.describe().to_string(),
                        handler: name.describe().to_string(),
                    });
                }
            }
        }

        // compose all keys up front so a collision mid-batch cannot leave a
        // partially inserted table behind
        let mut staged: Vec<(Option<String>, Option<String>)> = Vec::new();
        let mut batch_fallback = false;
        for method in &self.pending {
            let (route, route_alias) = match (&name, &method.command) {
                (HandlerName::Default, MethodName::Fallback) => {
                    if self.fallback.is_some() || batch_fallback {
                        return Err(CmdrError::DuplicateFallback);
                    }
                    batch_fallback = true;
                    staged.push((None, None));
                    continue;
                }
                (HandlerName::Named(_), MethodName::Fallback) => {
                    return Err(CmdrError::MisplacedFallback);
                }
                (HandlerName::Default, MethodName::Default) => (String::new(), None),
                (HandlerName::Default, MethodName::Named(m)) => (m.clone(), method.alias.clone()),
                (HandlerName::Named(h), MethodName::Default) => (h.clone(), handler_alias.clone()),
                (HandlerName::Named(h), MethodName::Named(m)) => {
                    let alias = handler_alias.as_ref().map(|ha| match &method.alias {
                        Some(ma) => format!("{ha}{ma}"),
                        None => ha.clone(),
                    });
                    (format!("{h}-{m}"), alias)
                }
            };

            let taken = |key: &str| {
                self.routes.contains_key(key)
                    || staged.iter().any(|(r, a)| {
                        r.as_deref() == Some(key) || a.as_deref() == Some(key)
                    })
            };
            if taken(&route) {
                return Err(CmdrError::DuplicateRoute(display_route(&route)));
            }
            if let Some(a) = &route_alias {
                if a == &route || taken(a) {
                    return Err(CmdrError::DuplicateAlias(a.clone()));
                }
            }
            staged.push((Some(route), route_alias));
        }

        // commit
        let base = self.methods.len();
        let claimed: Vec<CommandMethod> = self.pending.drain(..).collect();
        let mut method_indices = Vec::with_capacity(claimed.len());
        for (i, ((route, route_alias), method)) in
            staged.into_iter().zip(claimed).enumerate()
        {
            let index = base + i;
            let is_fallback = matches!(method.command, MethodName::Fallback);
            self.methods.push(method);
            method_indices.push(index);
            if is_fallback {
                self.fallback = Some(index);
                continue;
            }
            if let Some(route) = route {
                self.routes.insert(route, index);
            }
            if let Some(alias) = route_alias {
                self.routes.insert(alias, index);
            }
        }

        self.handlers.push(Handler {
            command: name,
            alias: handler_alias,
            id,
            methods: method_indices,
        });
        Ok(())
    }

    pub fn has_handler(&self, id: HandlerId) -> bool {
        self.handlers.iter().any(|h| h.id == id)
    }

    /// Pure routing-table lookup; `""` keys the global default command.
    pub fn resolve_command(&self, token: &str) -> Option<&CommandMethod> {
        self.routes.get(token).map(|&i| &self.methods[i])
    }

    /// The registered catch-all method, if any. The registry never routes to
    /// it by itself; the invoker decides fallback behavior.
    pub fn fallback(&self) -> Option<&CommandMethod> {
        self.fallback.map(|i| &self.methods[i])
    }

    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    /// Iterate over every route and alias key with its resolved method.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &CommandMethod)> {
        self.routes
            .iter()
            .map(move |(k, &i)| (k.as_str(), &self.methods[i]))
    }

    /// Install the collaborator hook invoked by `reset(true)`. The registry
    /// itself never touches the external command-module cache.
    pub fn set_cache_invalidator(&mut self, hook: impl FnMut() + 'static) {
        self.cache_hook = Some(Box::new(hook));
    }

    /// Clear all registry state. When `clear_external_cache` is set, the
    /// installed cache invalidation hook fires as well.
    pub fn reset(&mut self, clear_external_cache: bool) {
        self.pending.clear();
        self.handlers.clear();
        self.methods.clear();
        self.routes.clear();
        self.fallback = None;
        if clear_external_cache {
            if let Some(hook) = &mut self.cache_hook {
                hook();
            }
        }
    }
}

fn validate_alias(alias: Option<&str>, command: &MethodName) -> Result<Option<String>> {
    let Some(alias) = alias else { return Ok(None) };
    match command {
        MethodName::Named(name) => {
            if !is_command_name(alias) {
                return Err(CmdrError::InvalidAlias {
                    alias: alias.to_string(),
                    reason: "not a valid command name",
                });
            }
            if alias == name {
                return Err(CmdrError::InvalidAlias {
                    alias: alias.to_string(),
                    reason: "same as the command name",
                });
            }
            Ok(Some(alias.to_string()))
        }
        MethodName::Default | MethodName::Fallback => Err(CmdrError::InvalidAlias {
            alias: alias.to_string(),
            reason: "only named commands can take an alias",
        }),
    }
}

fn display_route(route: &str) -> String {
    if route.is_empty() {
        "[default]".to_string()
    } else {
        route.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn noop(_: &Arguments<'_>) -> Result<()> {
        Ok(())
    }

    fn named(s: &str) -> MethodName {
        MethodName::Named(s.to_string())
    }

    const H1: HandlerId = HandlerId("HandlerOne");
    const H2: HandlerId = HandlerId("HandlerTwo");

    #[test]
    fn default_handler_default_method_routes_empty() {
        let mut reg = CommandRegistry::new();
        reg.register_method(MethodName::Default, None, vec![], H1, noop)
            .unwrap();
        reg.register_handler(HandlerName::Default, None, H1).unwrap();

        assert!(reg.resolve_command("").is_some());
        assert!(reg.resolve_command("anything").is_none());
    }

    #[test]
    fn route_composition_concatenates_names_and_aliases() {
        let mut reg = CommandRegistry::new();
        reg.register_method(named("component"), Some("c"), vec![], H1, noop)
            .unwrap();
        reg.register_handler(HandlerName::Named("create".into()), Some("c"), H1)
            .unwrap();

        // create/c × component/c → create-component / cc
        let method = reg.resolve_command("create-component").unwrap();
        assert_eq!(method.command(), &named("component"));
        let by_alias = reg.resolve_command("cc").unwrap();
        assert_eq!(by_alias.command(), &named("component"));
    }

    #[test]
    fn routes_iterates_every_key() {
        let mut reg = CommandRegistry::new();
        reg.register_method(named("component"), Some("c"), vec![], H1, noop)
            .unwrap();
        reg.register_handler(HandlerName::Named("create".into()), Some("c"), H1)
            .unwrap();

        let mut keys: Vec<&str> = reg.routes().map(|(k, _)| k).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["cc", "create-component"]);
        assert!(reg.routes().all(|(_, m)| m.command() == &named("component")));
        assert_eq!(reg.handlers()[0].method_count(), 1);
    }

    #[test]
    fn named_handler_default_method_takes_handler_route() {
        let mut reg = CommandRegistry::new();
        reg.register_method(MethodName::Default, None, vec![], H1, noop)
            .unwrap();
        reg.register_handler(HandlerName::Named("serve".into()), Some("sv"), H1)
            .unwrap();

        assert!(reg.resolve_command("serve").is_some());
        assert!(reg.resolve_command("sv").is_some());
        assert!(reg.resolve_command("").is_none());
    }

    #[test]
    fn handler_alias_without_method_alias_is_used_alone() {
        let mut reg = CommandRegistry::new();
        reg.register_method(named("build"), None, vec![], H1, noop).unwrap();
        reg.register_handler(HandlerName::Named("app".into()), Some("a"), H1)
            .unwrap();

        assert!(reg.resolve_command("app-build").is_some());
        assert!(reg.resolve_command("a").is_some());
    }

    #[test]
    fn no_handler_alias_means_no_alias_route() {
        let mut reg = CommandRegistry::new();
        reg.register_method(named("build"), Some("b"), vec![], H1, noop)
            .unwrap();
        reg.register_handler(HandlerName::Named("app".into()), None, H1)
            .unwrap();

        assert!(reg.resolve_command("app-build").is_some());
        assert!(reg.resolve_command("b").is_none());
        assert!(reg.resolve_command("appb").is_none());
    }

    #[test]
    fn duplicate_route_fails_regardless_of_order() {
        // a literal "create-component" method under the default handler
        // collides with create × component
        let mut reg = CommandRegistry::new();
        reg.register_method(named("create-component"), None, vec![], H1, noop)
            .unwrap();
        reg.register_handler(HandlerName::Default, None, H1).unwrap();
        reg.register_method(named("component"), None, vec![], H2, noop)
            .unwrap();
        let err = reg
            .register_handler(HandlerName::Named("create".into()), None, H2)
            .unwrap_err();
        assert!(matches!(err, CmdrError::DuplicateRoute(_)));

        let mut reg = CommandRegistry::new();
        reg.register_method(named("component"), None, vec![], H2, noop)
            .unwrap();
        reg.register_handler(HandlerName::Named("create".into()), None, H2)
            .unwrap();
        reg.register_method(named("create-component"), None, vec![], H1, noop)
            .unwrap();
        let err = reg
            .register_handler(HandlerName::Default, None, H1)
            .unwrap_err();
        assert!(matches!(err, CmdrError::DuplicateRoute(_)));
    }

    #[test]
    fn alias_collision_with_route_fails() {
        let mut reg = CommandRegistry::new();
        reg.register_method(named("st"), None, vec![], H1, noop).unwrap();
        reg.register_handler(HandlerName::Default, None, H1).unwrap();

        // "st" is taken as a route; an alias may not shadow it
        reg.register_method(named("stop"), Some("st"), vec![], H2, noop)
            .unwrap();
        let err = reg
            .register_handler(HandlerName::Default, None, H2)
            .unwrap_err();
        assert!(matches!(err, CmdrError::DuplicateAlias(_)));
    }

    #[test]
    fn collision_does_not_partially_commit() {
        let mut reg = CommandRegistry::new();
        reg.register_method(named("one"), None, vec![], H1, noop).unwrap();
        reg.register_handler(HandlerName::Default, None, H1).unwrap();

        reg.register_method(named("two"), None, vec![], H2, noop).unwrap();
        reg.register_method(named("one"), None, vec![], H2, noop).unwrap();
        let err = reg
            .register_handler(HandlerName::Default, None, H2)
            .unwrap_err();
        assert!(matches!(err, CmdrError::DuplicateRoute(_)));

        // nothing from the failed batch may be visible
        assert!(reg.resolve_command("two").is_none());
        assert_eq!(reg.handlers().len(), 1);
    }

    #[test]
    fn handler_without_methods_fails() {
        let mut reg = CommandRegistry::new();
        let err = reg.register_handler(HandlerName::Default, None, H1).unwrap_err();
        assert!(matches!(err, CmdrError::EmptyHandler(_)));
    }

    #[test]
    fn pending_methods_of_another_handler_fail_the_commit() {
        let mut reg = CommandRegistry::new();
        reg.register_method(named("one"), None, vec![], H1, noop).unwrap();
        let err = reg.register_handler(HandlerName::Default, None, H2).unwrap_err();
        assert!(matches!(err, CmdrError::ForeignCommand { .. }));
    }

    #[test]
    fn duplicate_method_name_within_handler_fails() {
        let mut reg = CommandRegistry::new();
        reg.register_method(named("one"), None, vec![], H1, noop).unwrap();
        reg.register_method(named("one"), None, vec![], H1, noop).unwrap();
        let err = reg.register_handler(HandlerName::Default, None, H1).unwrap_err();
        assert!(matches!(err, CmdrError::DuplicateCommand { .. }));
    }

    #[test]
    fn duplicate_handler_id_fails() {
        let mut reg = CommandRegistry::new();
        reg.register_method(named("one"), None, vec![], H1, noop).unwrap();
        reg.register_handler(HandlerName::Default, None, H1).unwrap();
        reg.register_method(named("two"), None, vec![], H1, noop).unwrap();
        let err = reg
            .register_handler(HandlerName::Named("x".into()), None, H1)
            .unwrap_err();
        assert!(matches!(err, CmdrError::DuplicateHandler(_)));
    }

    #[test]
    fn fallback_only_under_default_handler() {
        let mut reg = CommandRegistry::new();
        reg.register_method(MethodName::Fallback, None, vec![], H1, noop)
            .unwrap();
        let err = reg
            .register_handler(HandlerName::Named("x".into()), None, H1)
            .unwrap_err();
        assert!(matches!(err, CmdrError::MisplacedFallback));

        let mut reg = CommandRegistry::new();
        reg.register_method(MethodName::Fallback, None, vec![], H1, noop)
            .unwrap();
        reg.register_handler(HandlerName::Default, None, H1).unwrap();
        assert!(reg.fallback().is_some());
        // the fallback never appears in the routing table
        assert!(reg.resolve_command("").is_none());
    }

    #[test]
    fn invalid_names_and_aliases_are_rejected() {
        let mut reg = CommandRegistry::new();
        assert!(reg
            .register_method(named("Bad"), None, vec![], H1, noop)
            .is_err());
        assert!(reg
            .register_method(named("ok"), Some("ok"), vec![], H1, noop)
            .is_err());
        assert!(reg
            .register_method(MethodName::Default, Some("d"), vec![], H1, noop)
            .is_err());

        reg.register_method(named("ok"), None, vec![], H1, noop).unwrap();
        assert!(reg
            .register_handler(HandlerName::Named("Bad".into()), None, H1)
            .is_err());
        assert!(reg
            .register_handler(HandlerName::Named("x".into()), Some("x"), H1)
            .is_err());
        assert!(reg
            .register_handler(HandlerName::Default, Some("d"), H1)
            .is_err());
    }

    #[test]
    fn args_collector_must_be_last() {
        let mut reg = CommandRegistry::new();
        let options = vec![
            CommandOption::args_collector("rest"),
            CommandOption::named("force"),
        ];
        assert!(reg
            .register_method(named("x"), None, options, H1, noop)
            .is_err());

        let options = vec![
            CommandOption::named("force"),
            CommandOption::args_collector("rest"),
        ];
        assert!(reg
            .register_method(named("x"), None, options, H1, noop)
            .is_ok());
    }

    #[test]
    fn reset_clears_everything_and_fires_hook() {
        let mut reg = CommandRegistry::new();
        let fired = Rc::new(Cell::new(0));
        let probe = Rc::clone(&fired);
        reg.set_cache_invalidator(move || probe.set(probe.get() + 1));

        reg.register_method(MethodName::Default, None, vec![], H1, noop)
            .unwrap();
        reg.register_handler(HandlerName::Default, None, H1).unwrap();
        assert!(reg.resolve_command("").is_some());

        reg.reset(false);
        assert!(reg.resolve_command("").is_none());
        assert_eq!(reg.handlers().len(), 0);
        assert_eq!(fired.get(), 0);

        reg.reset(true);
        assert_eq!(fired.get(), 1);

        // the same handler id may register again after a reset
        reg.register_method(MethodName::Default, None, vec![], H1, noop)
            .unwrap();
        reg.register_handler(HandlerName::Default, None, H1).unwrap();
        assert!(reg.resolve_command("").is_some());
    }
}
