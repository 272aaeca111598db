use std::env;
use std::process;

use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use pagestyle::config::Settings;
use pagestyle::{
    Command, FieldName, FieldSet, JsonFileStore, Outcome, Session, StyleError, StylesheetSurface,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const LOG_ENV: &str = "PAGESTYLE_LOG";

fn print_help() {
    println!("pagestyle {} - Theme manager for the 4thewords editor page", VERSION);
    println!();
    println!("USAGE:");
    println!("    pagestyle <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    compile [FIELD=VALUE...]   Print the CSS for the given fields");
    println!("    apply [FIELD=VALUE...]     Update form fields, then apply the form");
    println!("    set <FIELD> <VALUE>        Update one form field without applying");
    println!("    form                       Print the current form fields");
    println!("    clear                      Blank every field and remove the patch");
    println!("    themes                     List saved themes");
    println!("    create <NAME>              Save the form as a theme");
    println!("    load <NAME>                Load a theme into the form and apply it");
    println!("    overwrite <NAME>           Replace a theme with the form");
    println!("    rename <OLD> <NEW>         Rename a theme");
    println!("    delete <NAME>              Delete a theme");
    println!("    export [FILE]              Write all themes to a JSON file");
    println!("    import <FILE>              Replace all themes with a JSON file");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help                 Print help information");
    println!("    -v, --version              Print version information");
    println!();
    println!("FIELDS:");
    let names: Vec<&str> = FieldName::ALL.iter().map(|f| f.as_str()).collect();
    println!("    {}", names.join(", "));
}

fn print_version() {
    println!("pagestyle {}", VERSION);
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parses `field=value` arguments; a value may be empty.
fn parse_assignments(args: &[String]) -> Result<Vec<(FieldName, String)>, String> {
    args.iter()
        .map(|arg| -> Result<(FieldName, String), String> {
            let (name, value) = arg
                .split_once('=')
                .ok_or_else(|| format!("Expected FIELD=VALUE, got {:?}", arg))?;
            Ok((name.parse::<FieldName>()?, value.to_string()))
        })
        .collect()
}

fn expect_args<'a>(args: &'a [String], count: usize, usage: &str) -> Result<&'a [String], String> {
    expect_args_between(args, count, count, usage)
}

fn expect_args_between<'a>(
    args: &'a [String],
    min: usize,
    max: usize,
    usage: &str,
) -> Result<&'a [String], String> {
    if args.len() < min || args.len() > max {
        return Err(format!("Usage: pagestyle {}", usage));
    }
    Ok(args)
}

fn default_export_file() -> String {
    format!("pagestyle-themes-{}.json", chrono::Local::now().format("%Y%m%d"))
}

fn print_form(fields: &FieldSet) {
    for field in FieldName::ALL {
        println!("{}={}", field, fields.get(field));
    }
}

fn print_themes(names: &[String], selected: Option<&str>) {
    for name in names {
        let marker = if Some(name.as_str()) == selected { "*" } else { " " };
        println!("{} {}", marker, name);
    }
}

async fn run(settings: &Settings, command: &str, args: &[String]) -> Result<(), String> {
    let err = |e: StyleError| e.to_string();

    if command == "compile" {
        let fields = FieldSet::from_pairs(parse_assignments(args)?);
        let compiler = pagestyle::CssCompiler::new(settings.compile_policy());
        print!("{}", compiler.compile(&fields));
        return Ok(());
    }

    let store = JsonFileStore::open(settings.storage_file())
        .await
        .map_err(|e| e.to_string())?;
    let mut session = Session::open(store, settings.compile_policy())
        .await
        .map_err(err)?;
    let mut surface = StylesheetSurface::open(settings.stylesheet_file())
        .await
        .map_err(|e| e.to_string())?;

    let command = match command {
        "apply" => {
            for (field, value) in parse_assignments(args)? {
                session.remember_input(field, &value).await.map_err(err)?;
            }
            Command::Submit(session.form().clone())
        }
        "set" => {
            let args = expect_args(args, 2, "set <FIELD> <VALUE>")?;
            Command::RememberInput {
                field: args[0].parse()?,
                value: args[1].clone(),
            }
        }
        "form" => {
            print_form(session.form());
            return Ok(());
        }
        "clear" => {
            session.clear_form().await.map_err(err)?;
            Command::Submit(FieldSet::new())
        }
        "themes" => {
            print_themes(&session.theme_names(), session.selected());
            return Ok(());
        }
        "create" => Command::CreateTheme(expect_args(args, 1, "create <NAME>")?[0].clone()),
        "load" => Command::LoadTheme(expect_args(args, 1, "load <NAME>")?[0].clone()),
        "overwrite" => Command::OverwriteTheme(expect_args(args, 1, "overwrite <NAME>")?[0].clone()),
        "rename" => {
            let args = expect_args(args, 2, "rename <OLD> <NEW>")?;
            Command::RenameTheme {
                from: args[0].clone(),
                to: args[1].clone(),
            }
        }
        "delete" => Command::DeleteTheme(expect_args(args, 1, "delete <NAME>")?[0].clone()),
        "export" => {
            expect_args_between(args, 0, 1, "export [FILE]")?;
            Command::Export
        }
        "import" => {
            let path = &expect_args(args, 1, "import <FILE>")?[0];
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| format!("Failed to read {}: {}", path, e))?;
            Command::Import(text)
        }
        other => {
            return Err(format!(
                "Unknown command: {}\nUse --help for usage information",
                other
            ))
        }
    };

    match session.dispatch(&mut surface, command).await.map_err(err)? {
        Outcome::Applied(css) => {
            tracing::info!(bytes = css.as_str().len(), path = %surface.path().display(), "applied patch");
        }
        Outcome::Themes(names) => print_themes(&names, session.selected()),
        Outcome::Exported(document) => {
            let path = args.first().cloned().unwrap_or_else(default_export_file);
            tokio::fs::write(&path, document)
                .await
                .map_err(|e| format!("Failed to write {}: {}", path, e))?;
            println!("Exported {} theme(s) to {}", session.themes().len(), path);
        }
        Outcome::Done => {}
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_help();
        return;
    }
    match args[1].as_str() {
        "-h" | "--help" => {
            print_help();
            return;
        }
        "-v" | "--version" => {
            print_version();
            return;
        }
        _ => {}
    }

    let settings = match Settings::load_with_error() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Warning: {}", e);
            Settings::default()
        }
    };
    init_tracing(&settings);

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(run(&settings, &args[1], &args[2..])) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
