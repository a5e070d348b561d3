use std::env;
use std::path::{Path, PathBuf};
use std::process::exit;

//
// cargo run -- print labels/7day_return_warning.bmp 2
//
use tsp_label::{labels, registry, AppConfig, Printer};

fn print_usage() {
    println!("Usage: tsp-label <COMMAND> [ARGS]");
    println!();
    println!("Commands:");
    println!("  list                 List installed queues and serial ports");
    println!("  status               Show the configured printer and whether it answers");
    println!("  test                 Probe the configured port");
    println!("  print <file> [n]     Print a label file, n copies (default 1)");
    println!("  feed <mm>            Advance the paper by <mm> millimeters");
    println!("  labels [dir]         List label files in a directory (default: Labels)");
    println!("  sample <file>        Write a calibration label to <file>");
    println!();
    println!("Configuration is read from tsp-label.json (override with");
    println!("the TSP_LABEL_CONFIG environment variable).");
}

fn config_path() -> PathBuf {
    env::var_os("TSP_LABEL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tsp-label.json"))
}

fn main() {
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{}:{}] {} - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.level(),
                record.args()
            )
        })
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let config = match AppConfig::load(config_path()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: could not read {}: {}", config_path().display(), err);
            exit(1);
        }
    };
    let printer = Printer::new(config.printer.clone());

    match args[1].as_str() {
        "list" => {
            let printers = registry::detect_available_printers();
            if printers.is_empty() {
                println!("No printers or serial ports found.");
            }
            for info in printers {
                println!("{:<30} {:<40} {}", info.name, info.port_name, info.status);
            }
        }
        "status" => println!("{}", printer.status_line()),
        "test" => {
            if printer.test_connection() {
                println!("{} ({}) is reachable", printer.port(), printer.kind());
            } else {
                eprintln!("{} ({}) is not reachable", printer.port(), printer.kind());
                exit(1);
            }
        }
        "print" => {
            if args.len() < 3 {
                eprintln!("Error: print needs a label file");
                print_usage();
                exit(2);
            }
            let copies: u16 = match args.get(3).map(|s| s.parse()) {
                None => 1,
                Some(Ok(n)) => n,
                Some(Err(_)) => {
                    eprintln!("Error: copy count must be a number");
                    exit(2);
                }
            };
            if let Err(err) = printer.print(Path::new(&args[2]), copies) {
                eprintln!("Error: {}", err);
                exit(1);
            }
            println!("Printed {} ({} copies)", args[2], copies);
        }
        "feed" => {
            if args.len() < 3 {
                eprintln!("Error: feed needs a distance in millimeters");
                exit(2);
            }
            let mm: f32 = match args[2].parse() {
                Ok(mm) => mm,
                Err(_) => {
                    eprintln!("Error: feed distance must be a number");
                    exit(2);
                }
            };
            if let Err(err) = printer.feed(mm) {
                eprintln!("Error: {}", err);
                exit(1);
            }
            println!("Fed {} mm", mm);
        }
        "labels" => {
            let dir = args.get(2).map(String::as_str).unwrap_or("Labels");
            let found = labels::discover(Path::new(dir));
            if found.is_empty() {
                println!("No label files in {}", dir);
            }
            for label in found {
                println!("{:<30} {}", label.file_name, label.display_name);
            }
        }
        "sample" => {
            if args.len() < 3 {
                eprintln!("Error: sample needs an output file");
                exit(2);
            }
            if let Err(err) = labels::write_sample_label(&args[2]) {
                eprintln!("Error: {}", err);
                exit(1);
            }
            println!("Wrote sample label to {}", args[2]);
        }
        "--help" | "-h" | "help" => print_usage(),
        other => {
            eprintln!("Error: unknown command '{}'", other);
            print_usage();
            exit(2);
        }
    }
}
