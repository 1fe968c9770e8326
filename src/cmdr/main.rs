use cmdr::api::CmdrApp;
use cmdr::arguments::Arguments;
use cmdr::error::{CmdrError, Result};
use cmdr::option::CommandOption;
use cmdr::registry::{CommandRegistry, HandlerId, HandlerName, MethodName};
use cmdr::types::TypeMask;
use cmdr::value::Value;
use colored::Colorize;

const ROOT: HandlerId = HandlerId("RootCommands");
const CREATE: HandlerId = HandlerId("CreateCommands");

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut app = CmdrApp::new();
    register_commands(app.registry_mut())?;

    let argv: Vec<String> = std::env::args().skip(1).collect();
    app.run_command(&argv)
}

fn register_commands(reg: &mut CommandRegistry) -> Result<()> {
    reg.register_method(MethodName::Default, None, vec![], ROOT, cmd_default)?;
    reg.register_method(
        MethodName::Named("sum".to_string()),
        Some("s"),
        vec![
            CommandOption::positional(TypeMask::NUMBER).with_name("lhs"),
            CommandOption::positional(TypeMask::NUMBER).with_name("rhs"),
        ],
        ROOT,
        cmd_sum,
    )?;
    reg.register_method(
        MethodName::Named("greet".to_string()),
        Some("g"),
        vec![
            CommandOption::positional(TypeMask::STRING).with_name("name"),
            CommandOption::named("loud").with_flag('l'),
        ],
        ROOT,
        cmd_greet,
    )?;
    reg.register_method(
        MethodName::Named("echo".to_string()),
        None,
        vec![
            CommandOption::named("upper").with_flag('u'),
            CommandOption::args_collector("rest"),
        ],
        ROOT,
        cmd_echo,
    )?;
    reg.register_handler(HandlerName::Default, None, ROOT)?;

    reg.register_method(
        MethodName::Named("component".to_string()),
        Some("c"),
        vec![
            CommandOption::positional(TypeMask::STRING).with_name("name"),
            CommandOption::named("dir").with_alias("d").with_type(TypeMask::STRING),
            CommandOption::named("exported").with_flag('e'),
        ],
        CREATE,
        cmd_create_component,
    )?;
    reg.register_handler(HandlerName::Named("create".to_string()), Some("c"), CREATE)?;
    Ok(())
}

/// No command given: dump the parse snapshot so callers can see what the
/// engine resolved.
fn cmd_default(args: &Arguments<'_>) -> Result<()> {
    println!("{}", args.to_json());
    Ok(())
}

fn cmd_sum(args: &Arguments<'_>) -> Result<()> {
    let lhs = num_positional(args, 0)?;
    let rhs = num_positional(args, 1)?;
    println!("{}", lhs + rhs);
    Ok(())
}

fn num_positional(args: &Arguments<'_>, index: usize) -> Result<f64> {
    args.positional(index)
        .and_then(Value::as_num)
        .ok_or_else(|| CmdrError::App(format!("sum needs a number at position {index}")))
}

fn cmd_greet(args: &Arguments<'_>) -> Result<()> {
    let name = args
        .option("name")
        .and_then(Value::as_str)
        .unwrap_or("world");
    if args.has_flag('l') {
        println!("{}!", format!("hello, {name}").to_uppercase());
    } else {
        println!("hello, {name}");
    }
    Ok(())
}

fn cmd_echo(args: &Arguments<'_>) -> Result<()> {
    let rest = args.option("rest").and_then(Value::as_args).unwrap_or(&[]);
    let line = rest.join(" ");
    if args.has_flag('u') {
        println!("{}", line.to_uppercase());
    } else {
        println!("{line}");
    }
    Ok(())
}

fn cmd_create_component(args: &Arguments<'_>) -> Result<()> {
    let name = args
        .option("name")
        .and_then(Value::as_str)
        .ok_or_else(|| CmdrError::App("component name is required".to_string()))?;
    let dir = args
        .option("dir")
        .and_then(Value::as_str)
        .unwrap_or("./components");
    let exported = args
        .option("exported")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    println!(
        "creating component {} in {} ({})",
        name.bold(),
        dir,
        if exported { "exported" } else { "private" }
    );
    Ok(())
}
