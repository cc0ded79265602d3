/// Interactive memory card console application

use mcdmanager::*;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::path::Path;
use std::process::ExitCode;

/// Command completer for the REPL
struct CommandCompleter {
    commands: Vec<&'static str>,
}

impl CommandCompleter {
    fn new() -> Self {
        Self {
            commands: vec![
                "create", "dir", "exit", "export", "help", "import", "info", "ls", "map", "open",
                "quit", "read", "save", "split", "stat",
            ],
        }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Only complete the first word (command name)
        let line_to_cursor = &line[..pos];
        if line_to_cursor.contains(' ') {
            return Ok((pos, vec![]));
        }

        let prefix = line_to_cursor.to_lowercase();
        let matches: Vec<Pair> = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(&prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Get the path to the history file
fn history_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".mcdmanager_history");
        p
    })
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return run_batch(&args);
    }

    run_console();
    ExitCode::SUCCESS
}

/// Non-interactive mode: `mcd split DIRECTORY FILE...`
fn run_batch(args: &[String]) -> ExitCode {
    match args[0].as_str() {
        "split" if args.len() >= 3 => {
            let base = Path::new(&args[1]);
            match split_files(base, &args[2..], &SplitOptions::default()) {
                Ok(written) => {
                    for path in written {
                        println!("{}", path.display());
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        _ => {
            eprintln!("Usage: mcd [split DIRECTORY FILE...]");
            eprintln!("Run without arguments for the interactive console.");
            ExitCode::from(2)
        }
    }
}

fn run_console() {
    println!("=== MCDManager ===");
    println!("Interactive console for exploring PlayStation memory card images.");
    println!("Type 'help' for available commands\n");

    let mut rl = match Editor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to create editor: {}", e);
            return;
        }
    };
    rl.set_helper(Some(CommandCompleter::new()));

    if let Some(history_path) = history_path() {
        let _ = rl.load_history(&history_path);
    }

    let mut card: Option<CardReader> = None;

    loop {
        let input = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let _ = rl.add_history_entry(input);

        let parts = parse_command_line(input);
        if parts.is_empty() {
            continue;
        }
        let command = parts[0].to_lowercase();

        match command.as_str() {
            "help" => print_help(),
            "quit" | "exit" => break,
            "open" => {
                if parts.len() < 2 {
                    println!("Usage: open <path>");
                    continue;
                }
                if !is_mcd_file(&parts[1]) {
                    println!("Warning: {} does not have a .mcd or .mcr extension", parts[1]);
                }
                match CardReader::open_path(&parts[1]) {
                    Ok(reader) => {
                        println!("Opened: {} ({} files)", parts[1], reader.files().len());
                        card = Some(reader);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "create" => {
                card = Some(CardReader::new(MemoryCard::blank()));
                println!("Created new blank memory card");
            }
            "info" => match card {
                Some(ref reader) => print_info(reader),
                None => println!("No card loaded. Use 'open <path>' or 'create' first."),
            },
            "ls" | "dir" => match card {
                Some(ref reader) => {
                    let path = parts.get(1).map(String::as_str).unwrap_or(".");
                    list_dir(reader, path);
                }
                None => println!("No card loaded."),
            },
            "stat" => match card {
                Some(ref reader) => {
                    if parts.len() < 2 {
                        println!("Usage: stat <path>");
                        continue;
                    }
                    match reader.stat(&parts[1]) {
                        Ok(meta) => {
                            println!("Name: {}", meta.name);
                            println!("Size: {} bytes", meta.size);
                            println!("Mode: {}", meta.mode);
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                }
                None => println!("No card loaded."),
            },
            "read" => match card {
                Some(ref reader) => {
                    if parts.len() < 2 {
                        println!("Usage: read <name>");
                        continue;
                    }
                    match reader.read_file(&parts[1]) {
                        Ok(data) => {
                            println!("File: {} ({} bytes)", parts[1], data.len());
                            print_hex_dump(&data, 256);
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                }
                None => println!("No card loaded."),
            },
            "export" => match card {
                Some(ref reader) => {
                    if parts.len() < 2 {
                        println!("Usage: export <name> [output_path]");
                        continue;
                    }
                    let output = parts.get(2).unwrap_or(&parts[1]);
                    match reader.read_file(&parts[1]) {
                        Ok(data) => match std::fs::write(output, &data) {
                            Ok(_) => println!("Exported {} bytes to: {}", data.len(), output),
                            Err(e) => println!("Error: {}", e),
                        },
                        Err(e) => println!("Error: {}", e),
                    }
                }
                None => println!("No card loaded."),
            },
            "import" => match card {
                Some(ref reader) => {
                    if parts.len() < 2 {
                        println!("Usage: import <path>");
                        continue;
                    }
                    match import_file(reader, &parts[1]) {
                        Ok(updated) => {
                            println!("Imported: {} ({} files)", parts[1], updated.files().len());
                            card = Some(updated);
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                }
                None => println!("No card loaded."),
            },
            "map" => match card {
                Some(ref reader) => draw_block_map(reader.card()),
                None => println!("No card loaded."),
            },
            "split" => match card {
                Some(ref reader) => {
                    if parts.len() < 2 {
                        println!("Usage: split <directory>");
                        continue;
                    }
                    match split_to_directory(Path::new(&parts[1]), reader, &SplitOptions::default()) {
                        Ok(written) => {
                            for path in written {
                                println!("Wrote: {}", path.display());
                            }
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                }
                None => println!("No card loaded."),
            },
            "save" => match card {
                Some(ref reader) => {
                    if parts.len() < 2 {
                        println!("Usage: save <path>");
                        continue;
                    }
                    match reader.card().save(&parts[1]) {
                        Ok(_) => println!("Saved to: {}", parts[1]),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                None => println!("No card loaded."),
            },
            _ => println!("Unknown command: {}. Type 'help' for available commands.", command),
        }
    }

    if let Some(history_path) = history_path() {
        let _ = rl.save_history(&history_path);
    }
    println!("Goodbye!");
}

/// Rebuild the card with one more save file taken from a host file
fn import_file(reader: &CardReader, path: &str) -> Result<CardReader> {
    let data = std::fs::read(path)?;
    let writer = CardWriter::new();

    for file in reader.files() {
        let mut source = reader.open_file(file)?;
        let mut dest = writer.create_file()?;
        std::io::copy(&mut source, &mut dest)?;
        dest.close()?;
    }

    writer.add_file(&data)?;
    CardReader::from_bytes(&writer.finish()?)
}

fn parse_command_line(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    parts.push(current.clone());
                    current.clear();
                }
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

fn print_help() {
    println!("Available commands:");
    println!("  open <path>              - Open a memory card image (use quotes for paths with spaces)");
    println!("  create                   - Create a new blank memory card");
    println!("  info                     - Show card information");
    println!("  ls, dir [path]           - List files on the card");
    println!("  stat <path>              - Show file or directory metadata");
    println!("  read <name>              - Read and hex dump a file");
    println!("  export <name> [output]   - Export a file to the host filesystem");
    println!("  import <path>            - Add a save file (directory frame + blocks) to the card");
    println!("  map                      - Visual block map");
    println!("  split <directory>        - Split the card into one card per product code");
    println!("  save <path>              - Save card to file (use quotes for paths with spaces)");
    println!("  help                     - Show this help");
    println!("  quit, exit               - Exit");
}

fn print_info(reader: &CardReader) {
    let info = reader.info();
    println!("Filesystem: {}", info.fs_type);
    println!("Block size: {} bytes", info.block_size);
    println!("Total blocks: {}", info.total_blocks);
    println!("Free blocks: {}", info.free_blocks);
    println!("Files: {}", info.file_count);
    println!("Valid: {}", if reader.card().is_valid() { "Yes" } else { "No" });
}

fn list_dir(reader: &CardReader, path: &str) {
    match reader.read_dir(path) {
        Ok(entries) => {
            if entries.is_empty() {
                println!("No files found.");
                return;
            }

            println!("{:<10} {:>7} {:<3} {}", "Mode", "Size", "Dup", "Name");
            println!("{}", "-".repeat(48));

            for entry in entries {
                let mode = match entry.metadata() {
                    Ok(meta) => meta.mode.to_string(),
                    Err(_) => "?".repeat(10),
                };
                println!(
                    "{:<10} {:>7} {:<3} {}",
                    mode,
                    entry.size,
                    if entry.duplicate { "Yes" } else { "" },
                    entry.name
                );
            }
        }
        Err(e) => println!("Error: {}", e),
    }
}

fn print_hex_dump(data: &[u8], max_bytes: usize) {
    let len = data.len().min(max_bytes);

    for (i, chunk) in data[..len].chunks(16).enumerate() {
        print!("{:04X}: ", i * 16);

        for (j, byte) in chunk.iter().enumerate() {
            print!("{:02X} ", byte);
            if j == 7 {
                print!(" ");
            }
        }

        // Pad if less than 16 bytes
        for j in chunk.len()..16 {
            print!("   ");
            if j == 7 {
                print!(" ");
            }
        }

        print!(" |");

        for byte in chunk {
            let c = if (32..127).contains(byte) {
                *byte as char
            } else {
                '.'
            };
            print!("{}", c);
        }

        println!("|");
    }

    if data.len() > max_bytes {
        println!("... ({} more bytes)", data.len() - max_bytes);
    }
}
