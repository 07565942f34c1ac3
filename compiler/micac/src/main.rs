//! Mica compiler CLI.

use micac::{tracing_setup, Workspace, WorkspaceOptions};

fn main() {
    tracing_setup::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        std::process::exit(1);
    }

    let mut options = WorkspaceOptions::default();
    let mut root = String::from(".");
    let mut module_name = String::from("main");
    let mut files = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--root" => match iter.next() {
                Some(value) => root = value.clone(),
                None => {
                    eprintln!("error: '--root' expects a directory");
                    std::process::exit(1);
                }
            },
            "--module" => match iter.next() {
                Some(value) => module_name = value.clone(),
                None => {
                    eprintln!("error: '--module' expects a name");
                    std::process::exit(1);
                }
            },
            "--entry" => match iter.next() {
                Some(value) => options.entry_name = Some(value.clone()),
                None => {
                    eprintln!("error: '--entry' expects a function name");
                    std::process::exit(1);
                }
            },
            "--dump-ast" => options.dump_ast = true,
            "--dump-scopes" => options.dump_scopes = true,
            "--check" => options.check_only = true,
            "help" | "--help" | "-h" => {
                print_usage();
                return;
            }
            "version" | "--version" | "-V" => {
                println!("Mica Compiler 0.1.0");
                return;
            }
            other if other.starts_with('-') => {
                eprintln!("error: unknown option '{other}'");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
            file => files.push(file.to_string()),
        }
    }

    if files.is_empty() {
        eprintln!("error: no input files");
        std::process::exit(1);
    }

    let mut workspace = Workspace::new(root, &module_name, options);
    for file in files {
        workspace.add_source_file(file);
    }

    let ok = workspace.compile();
    workspace.report();
    if !ok {
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("Mica Compiler");
    println!();
    println!("Usage: micac [options] <file.mica>...");
    println!();
    println!("Options:");
    println!("  --root <dir>     Workspace root directory (default: .)");
    println!("  --module <name>  Module name (default: main)");
    println!("  --entry <name>   Entry-point function name (default: main)");
    println!("  --dump-ast       Print parsed source units and stop");
    println!("  --dump-scopes    Print the scope tree after resolution");
    println!("  --check          Stop after type checking");
    println!("  help             Show this help message");
    println!("  version          Show version information");
    println!();
    println!("Exit code is 0 when no error diagnostics were reported.");
}
