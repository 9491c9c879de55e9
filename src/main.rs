//! cadenza — compile and play textual music compositions.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use cadenza::dsl::Compiler;
use cadenza::midi;
use cadenza::player::Player;

#[derive(Parser)]
#[command(name = "cadenza", version, about = "Compile compositions to Standard MIDI Files")]
struct Cli {
    /// Composition source file
    source: Option<PathBuf>,

    /// Write the compiled Standard MIDI File to this path
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Print the parsed composition before compiling
    #[arg(short, long)]
    verbose: bool,

    /// Compile without playing
    #[arg(short, long)]
    quiet: bool,

    /// MIDI output port to play through (substring match)
    #[arg(short, long)]
    port: Option<String>,

    /// List available MIDI output ports and exit
    #[arg(long)]
    list_ports: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("cadenza: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.list_ports {
        for name in Player::ports()? {
            println!("{name}");
        }
        return Ok(());
    }

    let Some(source_path) = &cli.source else {
        return Err("no composition file given".into());
    };
    let source = fs::read_to_string(source_path)?;
    let composition = Compiler::parse(&source)?;

    if cli.verbose {
        print!("{composition}");
    }

    if let Some(out) = &cli.out {
        let bytes = midi::render(&composition)?;
        fs::write(out, bytes)?;
        println!("wrote {}", out.display());
    }

    if !cli.quiet {
        let mut player = Player::connect(cli.port.as_deref())?;
        player.play(&composition)?;
    }
    Ok(())
}
