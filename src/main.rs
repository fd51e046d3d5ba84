use std::path::PathBuf;

fn main() {
    if handle_cli_flags() {
        return;
    }

    if let Err(err) = reelix::run() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags() -> bool {
    let mut saw_flag = false;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("Reelix {}", reelix::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "Reelix — Browse movies & TV from the terminal.\n\n  --version, -V          Show version and exit\n  --help,    -h          Show this help message\n  --export-csv [PATH]    Export the watchlist as CSV and exit\n  --export-report [PATH] Export the watchlist HTML report and exit"
                );
                saw_flag = true;
            }
            "--export-csv" => {
                saw_flag = true;
                let path = args.next().map(PathBuf::from);
                match reelix::app::export_csv(path) {
                    Ok(path) => println!("Watchlist exported to {}", path.display()),
                    Err(err) => {
                        eprintln!("Export failed: {err:?}");
                        std::process::exit(1);
                    }
                }
            }
            "--export-report" => {
                saw_flag = true;
                let path = args.next().map(PathBuf::from);
                match reelix::app::export_report(path) {
                    Ok(path) => println!("Report exported to {}", path.display()),
                    Err(err) => {
                        eprintln!("Export failed: {err:?}");
                        std::process::exit(1);
                    }
                }
            }
            _ => {}
        }
    }
    saw_flag
}
